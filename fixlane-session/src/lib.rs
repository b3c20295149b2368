/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 17/10/26
******************************************************************************/

//! # fixlane Session
//!
//! Sequence recovery for FIX sessions.
//!
//! This crate provides:
//! - **Resynchronization**: sequence corrections recovered from Reject and
//!   Logout diagnostic text
//! - **Sequence management**: atomic live counters behind the
//!   [`SequenceTarget`] seam
//! - **Send lock**: the critical section corrections are applied under
//! - **Identifiers**: owned ClOrdID/ExecID/TestReqID generators
//!
//! The session state machine itself (logon, heartbeats, persistence) lives
//! in the engine that embeds this crate.

pub mod config;
pub mod ids;
pub mod lock;
pub mod resync;
pub mod sequence;

pub use config::ResyncConfig;
pub use ids::IdGenerator;
pub use lock::{SendGuard, SendLock};
pub use resync::{
    CorrectionKind, CorrectionProposal, Corrections, ResyncState, SequenceResynchronizer,
};
pub use sequence::{SequenceManager, SequenceTarget};
