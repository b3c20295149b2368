/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 17/10/26
******************************************************************************/

//! # fixlane Dictionary
//!
//! Immutable FIX dictionary model for the fixlane codec.
//!
//! This crate provides:
//! - **Schema definitions**: Field, message, component and group definitions
//! - **Layouts**: Component-free member lists with precomputed required sets
//! - **Builder validation**: Unresolved tags, unknown or cyclic components and
//!   misplaced group delimiters are rejected when the dictionary is built
//! - **Embedded dictionary**: A FIX 4.4 subset for session and order flow
//!
//! A built [`Dictionary`] never changes and is shared behind an `Arc`.

pub mod dictionary;
pub mod embedded;
pub mod error;
pub mod layout;
pub mod schema;

pub use dictionary::{Dictionary, DictionaryBuilder, MessageSchema};
pub use error::DictionaryError;
pub use layout::{GroupLayout, Layout, LayoutEntry};
pub use schema::{
    ComponentDef, EnumValue, FieldDef, FieldType, GroupDef, Member, MessageCategory, MessageDef,
    Primitive, Version,
};
