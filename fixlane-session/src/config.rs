/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 17/10/26
******************************************************************************/

//! Resynchronizer configuration.

use serde::{Deserialize, Serialize};

/// Configuration for [`SequenceResynchronizer`](crate::SequenceResynchronizer).
///
/// Patterns are regular expressions. A pattern yields the sender sequence
/// number through capture group 1, or either side through the named groups
/// `sender` and `target`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResyncConfig {
    /// Pattern applied to Reject text before the built-in phrasings.
    pub sequence_reject_pattern: Option<String>,
    /// Pattern applied to Logout text before the built-in phrasings.
    pub sequence_logout_pattern: Option<String>,
    /// Added to numbers captured by a configured pattern.
    pub pattern_adjustment: i64,
    /// Added to numbers found by the built-in phrasings.
    pub fallback_adjustment: i64,
}

impl ResyncConfig {
    /// Creates a configuration with no patterns and no adjustment.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the Reject text pattern.
    ///
    /// # Arguments
    /// * `pattern` - Regular expression with at least one capture group
    #[must_use]
    pub fn with_reject_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.sequence_reject_pattern = Some(pattern.into());
        self
    }

    /// Sets the Logout text pattern.
    ///
    /// # Arguments
    /// * `pattern` - Regular expression with at least one capture group
    #[must_use]
    pub fn with_logout_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.sequence_logout_pattern = Some(pattern.into());
        self
    }

    /// Sets the adjustment applied to pattern captures.
    #[must_use]
    pub const fn with_pattern_adjustment(mut self, delta: i64) -> Self {
        self.pattern_adjustment = delta;
        self
    }

    /// Sets the adjustment applied to built-in phrasing matches.
    #[must_use]
    pub const fn with_fallback_adjustment(mut self, delta: i64) -> Self {
        self.fallback_adjustment = delta;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ResyncConfig::default();
        assert!(config.sequence_reject_pattern.is_none());
        assert!(config.sequence_logout_pattern.is_none());
        assert_eq!(config.pattern_adjustment, 0);
        assert_eq!(config.fallback_adjustment, 0);
    }

    #[test]
    fn test_builder() {
        let config = ResyncConfig::new()
            .with_reject_pattern(r"expected (\d+)")
            .with_pattern_adjustment(-1);
        assert_eq!(config.sequence_reject_pattern.as_deref(), Some(r"expected (\d+)"));
        assert_eq!(config.pattern_adjustment, -1);
    }
}
