/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 17/10/26
******************************************************************************/

//! # fixlane Core
//!
//! Core types and error definitions shared by every fixlane crate.
//!
//! This crate provides:
//! - **Error types**: The fault taxonomy (framing, tokenization, schema,
//!   coercion, extraction) built with `thiserror`
//! - **Field types**: `FieldTag`, `RawField`, and the typed `FieldValue`
//! - **Message tree**: `MessageTree`, `Composite`, `Leaf`, and `RepeatedGroup`
//! - **Core types**: `MsgType`, `SeqNum`, `Timestamp`, `TimePrecision`
//!
//! ## Borrowed and Owned Data
//!
//! Tokenized fields borrow from the framed message buffer; the message tree
//! owns its values so it can outlive the read buffer and cross threads.

pub mod error;
pub mod field;
pub mod message;
pub mod tags;
pub mod tree;
pub mod types;

pub use error::{
    CoercionError, DecodeError, EncodeError, ExtractionError, FixError, FramingError, Result,
    SchemaError, TokenizeError, ValidationKind,
};
pub use field::{FieldTag, FieldValue, RawField};
pub use message::MsgType;
pub use tree::{Composite, Leaf, MessageTree, Node, RepeatedGroup, Slot};
pub use types::{SeqNum, TimePrecision, Timestamp};
