/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 17/10/26
******************************************************************************/

//! Message type classification.
//!
//! The codec needs to recognize the session messages without consulting a
//! dictionary: raw-mode output and freshly built trees carry an admin flag,
//! and sequence recovery reacts to Reject and Logout. Every other code is an
//! application message and is kept verbatim.

use serde::{Deserialize, Serialize};
use std::fmt;

/// FIX message type (tag 35), split into session and application codes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MsgType {
    /// Heartbeat (0).
    Heartbeat,
    /// TestRequest (1).
    TestRequest,
    /// ResendRequest (2).
    ResendRequest,
    /// Reject (3).
    Reject,
    /// SequenceReset (4).
    SequenceReset,
    /// Logout (5).
    Logout,
    /// Logon (A).
    Logon,
    /// Any other code.
    Application(String),
}

impl MsgType {
    /// Classifies a wire code.
    #[must_use]
    pub fn classify(code: &str) -> Self {
        match code {
            "0" => Self::Heartbeat,
            "1" => Self::TestRequest,
            "2" => Self::ResendRequest,
            "3" => Self::Reject,
            "4" => Self::SequenceReset,
            "5" => Self::Logout,
            "A" => Self::Logon,
            other => Self::Application(other.to_string()),
        }
    }

    /// Returns true when `code` names a session message.
    #[inline]
    #[must_use]
    pub fn is_admin_code(code: &str) -> bool {
        matches!(code, "0" | "1" | "2" | "3" | "4" | "5" | "A")
    }

    /// Returns the wire code.
    #[must_use]
    pub fn code(&self) -> &str {
        match self {
            Self::Heartbeat => "0",
            Self::TestRequest => "1",
            Self::ResendRequest => "2",
            Self::Reject => "3",
            Self::SequenceReset => "4",
            Self::Logout => "5",
            Self::Logon => "A",
            Self::Application(code) => code,
        }
    }

    /// Returns true for session messages.
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        !matches!(self, Self::Application(_))
    }

    /// Returns true for messages whose Text (58) may carry sequence hints.
    #[must_use]
    pub const fn carries_sequence_hint(&self) -> bool {
        matches!(self, Self::Reject | Self::Logout)
    }
}

impl fmt::Display for MsgType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_session_codes() {
        assert_eq!(MsgType::classify("0"), MsgType::Heartbeat);
        assert_eq!(MsgType::classify("A"), MsgType::Logon);
        assert!(MsgType::classify("5").is_admin());
        assert!(MsgType::is_admin_code("3"));
        assert!(!MsgType::is_admin_code("D"));
    }

    #[test]
    fn test_application_code_kept_verbatim() {
        let msg_type = MsgType::classify("UX");
        assert_eq!(msg_type, MsgType::Application("UX".to_string()));
        assert_eq!(msg_type.to_string(), "UX");
        assert!(!msg_type.is_admin());
    }

    #[test]
    fn test_sequence_hint_carriers() {
        assert!(MsgType::Reject.carries_sequence_hint());
        assert!(MsgType::Logout.carries_sequence_hint());
        assert!(!MsgType::Heartbeat.carries_sequence_hint());
    }
}
