/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 17/10/26
******************************************************************************/

//! Sequence resynchronization from counterparty diagnostic text.
//!
//! Reject and Logout messages often explain a sequence mismatch in free
//! text. The resynchronizer extracts the expected sequence number in two
//! tiers:
//!
//! 1. the configured regular expression for that message type
//! 2. a fixed list of known vendor phrasings
//!
//! A match becomes a pending correction. Pending corrections are applied to
//! the live counters only through [`SequenceResynchronizer::apply_pending`],
//! which requires the session's send guard. Extraction failures are
//! reported and logged but never change state.

use crate::config::ResyncConfig;
use crate::lock::SendGuard;
use crate::sequence::SequenceTarget;
use fixlane_core::{ExtractionError, FieldValue, MessageTree, MsgType, SeqNum, tags};
use regex::{Captures, Regex};
use smallvec::SmallVec;
use std::fmt;
use tracing::{debug, info, warn};

/// Phrasings naming the sequence number the counterparty expects from us.
const SENDER_PHRASES: &[&str] = &[
    "expecting ",
    "expected: ",
    "expected sequence number ",
    "nextexpectedmsgseqnum=",
];

/// Logout phrasings naming the counterparty's own next outgoing number.
const TARGET_PHRASES: &[&str] = &[
    "next outgoing sequence number ",
    "outgoing msgseqnum ",
    "will send sequence number ",
];

/// Corrections produced by one diagnostic.
pub type Corrections = SmallVec<[CorrectionProposal; 2]>;

/// Which counter a correction applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CorrectionKind {
    /// Our next outgoing sequence number.
    Sender,
    /// The next incoming sequence number we expect.
    Target,
}

impl fmt::Display for CorrectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sender => f.write_str("sender"),
            Self::Target => f.write_str("target"),
        }
    }
}

/// A proposed sequence correction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CorrectionProposal {
    /// Counter to correct.
    pub kind: CorrectionKind,
    /// Value the counter should take.
    pub value: SeqNum,
}

/// Resynchronization state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResyncState {
    /// No correction pending.
    Synchronized,
    /// A sender correction is pending.
    PendingSenderCorrection,
    /// A target correction is pending.
    PendingTargetCorrection,
    /// Both corrections are pending.
    PendingBothCorrections,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Trigger {
    Reject,
    Logout,
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reject => f.write_str("reject"),
            Self::Logout => f.write_str("logout"),
        }
    }
}

/// Per-session sequence resynchronizer.
#[derive(Debug, Clone)]
pub struct SequenceResynchronizer {
    reject_pattern: Option<Regex>,
    logout_pattern: Option<Regex>,
    pattern_adjustment: i64,
    fallback_adjustment: i64,
    pending_sender: Option<SeqNum>,
    pending_target: Option<SeqNum>,
}

impl SequenceResynchronizer {
    /// Creates a resynchronizer in the synchronized state.
    ///
    /// # Errors
    /// Returns `ExtractionError::InvalidPattern` if a configured pattern does
    /// not compile or has no capture group.
    pub fn new(config: ResyncConfig) -> Result<Self, ExtractionError> {
        Ok(Self {
            reject_pattern: compile(config.sequence_reject_pattern.as_deref())?,
            logout_pattern: compile(config.sequence_logout_pattern.as_deref())?,
            pattern_adjustment: config.pattern_adjustment,
            fallback_adjustment: config.fallback_adjustment,
            pending_sender: None,
            pending_target: None,
        })
    }

    /// Inspects the text of a Reject message.
    ///
    /// # Errors
    /// Returns an [`ExtractionError`] when no sequence number could be
    /// recovered; the state is left unchanged.
    pub fn on_reject_text(&mut self, text: &str) -> Result<Corrections, ExtractionError> {
        let proposals = self.propose(text, Trigger::Reject);
        self.record(proposals, Trigger::Reject)
    }

    /// Inspects the text of a Logout message.
    ///
    /// Depending on the phrasing, the sender correction, the target
    /// correction, or both become pending.
    ///
    /// # Errors
    /// Returns an [`ExtractionError`] when no sequence number could be
    /// recovered; the state is left unchanged.
    pub fn on_logout_text(&mut self, text: &str) -> Result<Corrections, ExtractionError> {
        let proposals = self.propose(text, Trigger::Logout);
        self.record(proposals, Trigger::Logout)
    }

    /// Inspects a decoded message.
    ///
    /// Only Reject and Logout are considered; any other message yields no
    /// corrections.
    ///
    /// # Errors
    /// Returns `ExtractionError::NoText` when a Reject or Logout carries no
    /// Text field, or any error of [`Self::on_reject_text`].
    pub fn observe(&mut self, message: &MessageTree) -> Result<Corrections, ExtractionError> {
        let trigger = match message.msg_type().map(MsgType::classify) {
            Some(MsgType::Reject) => Trigger::Reject,
            Some(MsgType::Logout) => Trigger::Logout,
            _ => return Ok(Corrections::new()),
        };
        let text = message
            .body()
            .value(tags::TEXT)
            .and_then(FieldValue::as_str)
            .unwrap_or_default();
        let proposals = self.propose(text, trigger);
        self.record(proposals, trigger)
    }

    /// Returns the current state.
    #[must_use]
    pub const fn state(&self) -> ResyncState {
        match (self.pending_sender, self.pending_target) {
            (None, None) => ResyncState::Synchronized,
            (Some(_), None) => ResyncState::PendingSenderCorrection,
            (None, Some(_)) => ResyncState::PendingTargetCorrection,
            (Some(_), Some(_)) => ResyncState::PendingBothCorrections,
        }
    }

    /// Returns true if any correction is pending.
    #[must_use]
    pub const fn has_pending(&self) -> bool {
        self.pending_sender.is_some() || self.pending_target.is_some()
    }

    /// Returns the pending sender correction.
    #[must_use]
    pub const fn pending_sender(&self) -> Option<SeqNum> {
        self.pending_sender
    }

    /// Returns the pending target correction.
    #[must_use]
    pub const fn pending_target(&self) -> Option<SeqNum> {
        self.pending_target
    }

    /// Discards pending corrections without applying them.
    pub fn clear(&mut self) {
        self.pending_sender = None;
        self.pending_target = None;
    }

    /// Applies pending corrections to the live counters and clears them.
    ///
    /// The send guard proves no outgoing message is being stamped while the
    /// counters change.
    pub fn apply_pending(
        &mut self,
        _guard: &SendGuard<'_>,
        counters: &impl SequenceTarget,
    ) -> Corrections {
        let mut applied = Corrections::new();
        if let Some(value) = self.pending_sender.take() {
            counters.set_next_sender(value);
            applied.push(CorrectionProposal {
                kind: CorrectionKind::Sender,
                value,
            });
        }
        if let Some(value) = self.pending_target.take() {
            counters.set_next_target(value);
            applied.push(CorrectionProposal {
                kind: CorrectionKind::Target,
                value,
            });
        }
        for correction in &applied {
            info!(kind = %correction.kind, value = correction.value.value(), "sequence correction applied");
        }
        applied
    }

    fn propose(&self, text: &str, trigger: Trigger) -> Result<Corrections, ExtractionError> {
        if text.trim().is_empty() {
            return Err(ExtractionError::NoText);
        }
        let pattern = match trigger {
            Trigger::Reject => self.reject_pattern.as_ref(),
            Trigger::Logout => self.logout_pattern.as_ref(),
        };
        if let Some(captures) = pattern.and_then(|pattern| pattern.captures(text)) {
            return self.from_captures(&captures);
        }
        self.from_phrases(text, trigger)
    }

    fn from_captures(&self, captures: &Captures<'_>) -> Result<Corrections, ExtractionError> {
        let mut found = Corrections::new();
        for (name, kind) in [
            ("sender", CorrectionKind::Sender),
            ("target", CorrectionKind::Target),
        ] {
            if let Some(m) = captures.name(name) {
                found.push(proposal(kind, m.as_str(), self.pattern_adjustment)?);
            }
        }
        if found.is_empty()
            && let Some(m) = captures.get(1)
        {
            found.push(proposal(
                CorrectionKind::Sender,
                m.as_str(),
                self.pattern_adjustment,
            )?);
        }
        if found.is_empty() {
            return Err(ExtractionError::InvalidNumber {
                value: captures
                    .get(0)
                    .map(|m| m.as_str().to_string())
                    .unwrap_or_default(),
            });
        }
        Ok(found)
    }

    fn from_phrases(&self, text: &str, trigger: Trigger) -> Result<Corrections, ExtractionError> {
        let lower = text.to_ascii_lowercase();
        let mut found = Corrections::new();
        if let Some(digits) = number_after(&lower, text, SENDER_PHRASES) {
            found.push(proposal(
                CorrectionKind::Sender,
                digits,
                self.fallback_adjustment,
            )?);
        }
        if trigger == Trigger::Logout
            && let Some(digits) = number_after(&lower, text, TARGET_PHRASES)
        {
            found.push(proposal(
                CorrectionKind::Target,
                digits,
                self.fallback_adjustment,
            )?);
        }
        if found.is_empty() {
            return Err(ExtractionError::NoMatch {
                text: text.to_string(),
            });
        }
        Ok(found)
    }

    fn record(
        &mut self,
        proposals: Result<Corrections, ExtractionError>,
        trigger: Trigger,
    ) -> Result<Corrections, ExtractionError> {
        match &proposals {
            Ok(corrections) => {
                for correction in corrections {
                    match correction.kind {
                        CorrectionKind::Sender => self.pending_sender = Some(correction.value),
                        CorrectionKind::Target => self.pending_target = Some(correction.value),
                    }
                    info!(
                        %trigger,
                        kind = %correction.kind,
                        value = correction.value.value(),
                        "sequence correction proposed"
                    );
                }
            }
            Err(ExtractionError::NoText) => {
                debug!(%trigger, "no diagnostic text");
            }
            Err(err) => {
                warn!(%trigger, %err, "sequence number not recovered");
            }
        }
        proposals
    }
}

fn compile(pattern: Option<&str>) -> Result<Option<Regex>, ExtractionError> {
    let Some(pattern) = pattern else {
        return Ok(None);
    };
    let invalid = |reason: String| ExtractionError::InvalidPattern {
        pattern: pattern.to_string(),
        reason,
    };
    let regex = Regex::new(pattern).map_err(|e| invalid(e.to_string()))?;
    if regex.captures_len() < 2 {
        return Err(invalid("pattern has no capture group".to_string()));
    }
    Ok(Some(regex))
}

/// Finds the digits following the first matching phrase.
///
/// `lower` is the ASCII-lowercased `text`, so byte offsets agree.
fn number_after<'t>(lower: &str, text: &'t str, phrases: &[&str]) -> Option<&'t str> {
    phrases.iter().find_map(|phrase| {
        let start = lower.find(phrase)? + phrase.len();
        let rest = text[start..].trim_start();
        let end = rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(rest.len());
        (end > 0).then(|| &rest[..end])
    })
}

fn proposal(
    kind: CorrectionKind,
    digits: &str,
    adjustment: i64,
) -> Result<CorrectionProposal, ExtractionError> {
    let value = digits
        .trim()
        .parse::<u64>()
        .ok()
        .and_then(|n| SeqNum::new(n).adjusted(adjustment))
        .ok_or_else(|| ExtractionError::InvalidNumber {
            value: digits.to_string(),
        })?;
    Ok(CorrectionProposal { kind, value })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lock::SendLock;
    use crate::sequence::SequenceManager;

    fn resync(config: ResyncConfig) -> SequenceResynchronizer {
        SequenceResynchronizer::new(config).unwrap()
    }

    #[test]
    fn test_reject_fallback_phrase() {
        let mut resync = resync(ResyncConfig::default());
        let corrections = resync
            .on_reject_text("MsgSeqNum too low, expecting 42 but received 40")
            .unwrap();
        assert_eq!(corrections.len(), 1);
        assert_eq!(resync.state(), ResyncState::PendingSenderCorrection);
        assert_eq!(resync.pending_sender(), Some(SeqNum::new(42)));
        assert_eq!(resync.pending_target(), None);
    }

    #[test]
    fn test_expected_colon_phrase() {
        let mut resync = resync(ResyncConfig::default());
        resync.on_reject_text("Sequence error. Expected: 1207").unwrap();
        assert_eq!(resync.pending_sender(), Some(SeqNum::new(1207)));
    }

    #[test]
    fn test_configured_pattern_takes_precedence() {
        let config = ResyncConfig::new()
            .with_reject_pattern(r"want=(\d+)")
            .with_pattern_adjustment(-1);
        let mut resync = resync(config);
        resync.on_reject_text("want=50, expecting 42").unwrap();
        assert_eq!(resync.pending_sender(), Some(SeqNum::new(49)));
    }

    #[test]
    fn test_pattern_miss_falls_back() {
        let config = ResyncConfig::new()
            .with_reject_pattern(r"want=(\d+)")
            .with_fallback_adjustment(0)
            .with_pattern_adjustment(-1);
        let mut resync = resync(config);
        resync.on_reject_text("too low, expecting 42").unwrap();
        assert_eq!(resync.pending_sender(), Some(SeqNum::new(42)));
    }

    #[test]
    fn test_logout_named_groups() {
        let config = ResyncConfig::new()
            .with_logout_pattern(r"ours (?P<sender>\d+) theirs (?P<target>\d+)");
        let mut resync = resync(config);
        let corrections = resync.on_logout_text("ours 10 theirs 20").unwrap();
        assert_eq!(corrections.len(), 2);
        assert_eq!(resync.state(), ResyncState::PendingBothCorrections);
        assert_eq!(resync.pending_sender(), Some(SeqNum::new(10)));
        assert_eq!(resync.pending_target(), Some(SeqNum::new(20)));
    }

    #[test]
    fn test_logout_target_phrase() {
        let mut resync = resync(ResyncConfig::default());
        resync
            .on_logout_text("Resetting: next outgoing sequence number 77")
            .unwrap();
        assert_eq!(resync.state(), ResyncState::PendingTargetCorrection);
        assert_eq!(resync.pending_target(), Some(SeqNum::new(77)));
    }

    #[test]
    fn test_reject_ignores_target_phrases() {
        let mut resync = resync(ResyncConfig::default());
        let err = resync
            .on_reject_text("next outgoing sequence number 77")
            .unwrap_err();
        assert!(matches!(err, ExtractionError::NoMatch { .. }));
        assert_eq!(resync.state(), ResyncState::Synchronized);
    }

    #[test]
    fn test_failures_leave_state_unchanged() {
        let mut resync = resync(ResyncConfig::default());
        resync.on_reject_text("expecting 5").unwrap();

        assert_eq!(resync.on_reject_text("   "), Err(ExtractionError::NoText));
        assert!(matches!(
            resync.on_reject_text("invalid price"),
            Err(ExtractionError::NoMatch { .. })
        ));
        assert!(matches!(
            resync.on_reject_text("expecting 99999999999999999999999"),
            Err(ExtractionError::InvalidNumber { .. })
        ));
        assert!(matches!(
            resync.on_reject_text("expecting 0"),
            Err(ExtractionError::InvalidNumber { .. })
        ));
        assert_eq!(resync.pending_sender(), Some(SeqNum::new(5)));
    }

    #[test]
    fn test_invalid_patterns() {
        let bad = SequenceResynchronizer::new(ResyncConfig::new().with_reject_pattern("("));
        assert!(matches!(bad, Err(ExtractionError::InvalidPattern { .. })));

        let no_group =
            SequenceResynchronizer::new(ResyncConfig::new().with_logout_pattern(r"\d+"));
        assert!(matches!(no_group, Err(ExtractionError::InvalidPattern { .. })));
    }

    #[test]
    fn test_observe_messages() {
        let mut resync = resync(ResyncConfig::default());

        let mut reject = MessageTree::new("FIX.4.4", "3");
        reject.body_mut().set_field("RefSeqNum", 45, 3i64);
        reject
            .body_mut()
            .set_field("Text", 58, "MsgSeqNum too low, expecting 8 but received 3");
        assert_eq!(resync.observe(&reject).unwrap().len(), 1);
        assert_eq!(resync.pending_sender(), Some(SeqNum::new(8)));

        let heartbeat = MessageTree::new("FIX.4.4", "0");
        assert!(resync.observe(&heartbeat).unwrap().is_empty());

        let logout = MessageTree::new("FIX.4.4", "5");
        assert_eq!(resync.observe(&logout), Err(ExtractionError::NoText));
    }

    #[test]
    fn test_apply_pending_under_send_lock() {
        let mut resync = resync(ResyncConfig::default());
        resync
            .on_logout_text("expected: 12, next outgoing sequence number 30")
            .unwrap();

        let counters = SequenceManager::new();
        let lock = SendLock::new();
        let applied = lock.with(|guard| resync.apply_pending(guard, &counters));

        assert_eq!(applied.len(), 2);
        assert_eq!(counters.next_sender_seq(), SeqNum::new(12));
        assert_eq!(counters.next_target_seq(), SeqNum::new(30));
        assert!(!resync.has_pending());
        assert!(!lock.is_locked());
    }

    #[test]
    fn test_clear() {
        let mut resync = resync(ResyncConfig::default());
        resync.on_reject_text("expecting 9").unwrap();
        resync.clear();
        assert_eq!(resync.state(), ResyncState::Synchronized);
    }
}
