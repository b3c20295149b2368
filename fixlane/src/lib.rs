/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 17/10/26
******************************************************************************/

//! # fixlane
//!
//! Dictionary-driven FIX framing, structural codec and sequence recovery.
//!
//! fixlane turns a raw byte stream into typed, validated message trees and
//! back, and recovers sequence numbers from counterparty diagnostics. It is
//! the codec core a session engine plugs into: sockets, logon and
//! heartbeats stay with the engine.
//!
//! ## Features
//!
//! - **Restartable framing**: partial reads never move the cursor, corrupt
//!   frames are skipped up to the next BeginString
//! - **Structural codec**: nested repeating groups, header/trailer routing,
//!   typed values, embedded XML documents
//! - **Validation**: required fields, enumerations and group counts
//! - **Sequence recovery**: configurable patterns with built-in fallbacks
//!
//! ## Quick Start
//!
//! ```rust
//! use fixlane::prelude::*;
//! use std::sync::Arc;
//!
//! let dictionary = Arc::new(fixlane::dictionary::embedded::fix44().unwrap());
//! let config = CodecConfig::default();
//! let encoder = StructuralEncoder::new(Arc::clone(&dictionary), config.clone()).unwrap();
//! let decoder = StructuralDecoder::new(dictionary, config).unwrap();
//!
//! let mut tree = MessageTree::new("FIX.4.4", "0");
//! let header = tree.header_mut();
//! header.set_field("SenderCompID", 49, "A");
//! header.set_field("TargetCompID", 56, "B");
//! header.set_field("MsgSeqNum", 34, 1i64);
//! header.set_field("SendingTime", 52, Timestamp::from_millis(0));
//!
//! let bytes = encoder.encode(&tree).unwrap();
//! let decoded = decoder.decode(&bytes).unwrap();
//! assert_eq!(decoded.into_tree(), Some(tree));
//! ```
//!
//! ## Crate Organization
//!
//! - [`core`]: message tree, value types and the error taxonomy
//! - [`dictionary`]: schema model and the embedded FIX 4.4 subset
//! - [`tagvalue`]: scanner, tokenizer, decoder, validator and encoder
//! - [`session`]: sequence resynchronization
//! - [`transport`]: tokio codec

pub mod core {
    //! Message tree, value types and the error taxonomy.
    pub use fixlane_core::*;
}

pub mod dictionary {
    //! Schema model and the embedded FIX 4.4 subset.
    pub use fixlane_dictionary::*;
}

pub mod tagvalue {
    //! Tag=value framing, decoding, validation and encoding.
    pub use fixlane_tagvalue::*;
}

pub mod session {
    //! Sequence resynchronization.
    pub use fixlane_session::*;
}

pub mod transport {
    //! Tokio codec.
    pub use fixlane_transport::*;
}

/// Prelude module for convenient imports.
pub mod prelude {
    // Core types
    pub use fixlane_core::{
        CoercionError, Composite, DecodeError, EncodeError, ExtractionError, FieldValue, FixError,
        FramingError, Leaf, MessageTree, MsgType, Node, RepeatedGroup, Result, SchemaError,
        SeqNum, TimePrecision, Timestamp,
    };

    // Dictionary
    pub use fixlane_dictionary::{Dictionary, DictionaryBuilder, FieldDef, FieldType, Version};

    // Tag-value codec
    pub use fixlane_tagvalue::{
        CodecConfig, DecodeFailure, DecodedMessage, FrameScanner, FramingFault, RawForm,
        StructuralDecoder, StructuralEncoder, Validator, calculate_checksum,
    };

    // Session
    pub use fixlane_session::{
        CorrectionKind, ResyncConfig, ResyncState, SendLock, SequenceManager,
        SequenceResynchronizer, SequenceTarget,
    };

    // Transport
    pub use fixlane_transport::{CodecError, FixMessageCodec, Inbound};
}
