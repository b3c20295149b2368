/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 17/10/26
******************************************************************************/

//! # fixlane Transport
//!
//! Byte-stream adapter for the fixlane codec.
//!
//! This crate provides:
//! - **Codec**: a `tokio_util` codec that frames, decodes and encodes FIX
//!   messages, surfacing faults as stream items
//!
//! Sockets, TLS and reconnect policy belong to the embedding engine.

pub mod codec;

pub use codec::{CodecError, FixMessageCodec, Inbound};
