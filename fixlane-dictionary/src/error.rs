/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 17/10/26
******************************************************************************/

//! Dictionary construction errors.

use thiserror::Error;

/// Errors raised while building a [`crate::Dictionary`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DictionaryError {
    /// A member references a tag with no field definition.
    #[error("tag {tag} referenced by {context} has no field definition")]
    UnresolvedTag {
        /// The unresolved tag.
        tag: u32,
        /// Message, component or group that references it.
        context: String,
    },

    /// A member references a component that is not defined.
    #[error("component '{name}' referenced by {context} is not defined")]
    UnknownComponent {
        /// The missing component name.
        name: String,
        /// Message, component or group that references it.
        context: String,
    },

    /// Components reference each other in a cycle.
    #[error("component '{name}' includes itself")]
    ComponentCycle {
        /// A component on the cycle.
        name: String,
    },

    /// The first member of a group entry is not its delimiter.
    #[error("group {count_tag} must start with delimiter tag {delimiter_tag}")]
    InvalidGroupDelimiter {
        /// Count tag of the offending group.
        count_tag: u32,
        /// Declared delimiter tag.
        delimiter_tag: u32,
    },

    /// A tag appears twice at the same nesting level.
    #[error("tag {tag} appears more than once in {context}")]
    DuplicateMember {
        /// The repeated tag.
        tag: u32,
        /// Message, component or group that repeats it.
        context: String,
    },

    /// Two field definitions share a tag.
    #[error("field tag {0} is defined more than once")]
    DuplicateField(u32),

    /// Two field definitions share a name.
    #[error("field name '{0}' is defined more than once")]
    DuplicateFieldName(String),

    /// Two message definitions share a message type.
    #[error("message type '{0}' is defined more than once")]
    DuplicateMessage(String),
}
