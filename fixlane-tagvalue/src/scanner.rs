/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 17/10/26
******************************************************************************/

//! Frame scanner.
//!
//! Carves complete messages out of a continuous byte stream. The scanner
//! keeps no state between calls: the caller owns the buffer and the read
//! cursor, and an incomplete message never moves the cursor, so the same
//! call can be retried after more bytes arrive.
//!
//! A frame is accepted only when:
//! - it starts with the `8=FIX` marker
//! - BodyLength (9) is the second field
//! - the declared body length equals the measured distance between the end
//!   of the length field and the start of the `10=` field
//! - the CheckSum field is three digits followed by a separator and, when
//!   enabled, matches the computed sum

use crate::checksum::{calculate_checksum, parse_checksum};
use crate::config::{CodecConfig, DEFAULT_MAX_MESSAGE_SIZE};
use crate::error::{ConfigError, FramingFault};
use crate::separator::Separator;
use fixlane_core::FramingError;
use memchr::memmem;
use smallvec::SmallVec;
use tracing::warn;

/// BeginString marker that opens every message.
pub const BEGIN_MARKER: &[u8] = b"8=FIX";

const LENGTH_PREFIX: &[u8] = b"9=";
const CHECKSUM_PREFIX: &[u8] = b"10=";

/// Where the checksum field sits inside a candidate window.
enum ChecksumSlot {
    /// `10=` and its trailing separator are present.
    Complete {
        field_start: usize,
        value_start: usize,
        value_end: usize,
        frame_end: usize,
    },
    /// `10=` is present but the next message starts before its separator.
    Glued { next_start: usize },
    /// Not enough bytes yet.
    Absent,
}

/// Stateless frame scanner over a caller-owned buffer.
#[derive(Debug, Clone)]
pub struct FrameScanner {
    separator: Separator,
    validate_checksum: bool,
    max_message_size: usize,
    next_marker: SmallVec<[u8; 8]>,
    checksum_marker: SmallVec<[u8; 8]>,
}

impl FrameScanner {
    /// Creates a scanner for the given separator with checksum validation.
    #[must_use]
    pub fn new(separator: Separator) -> Self {
        let mut next_marker = SmallVec::from_slice(separator.as_bytes());
        next_marker.extend_from_slice(BEGIN_MARKER);
        let mut checksum_marker = SmallVec::from_slice(separator.as_bytes());
        checksum_marker.extend_from_slice(CHECKSUM_PREFIX);
        Self {
            separator,
            validate_checksum: true,
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
            next_marker,
            checksum_marker,
        }
    }

    /// Creates a scanner from codec configuration.
    ///
    /// # Errors
    /// Returns `ConfigError` if the separator is invalid.
    pub fn from_config(config: &CodecConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(config.separator()?)
            .with_checksum_validation(config.validate_checksum)
            .with_max_message_size(config.max_message_size))
    }

    /// Sets whether the declared checksum is compared with the computed one.
    #[must_use]
    pub const fn with_checksum_validation(mut self, validate: bool) -> Self {
        self.validate_checksum = validate;
        self
    }

    /// Sets the maximum frame size.
    #[must_use]
    pub const fn with_max_message_size(mut self, size: usize) -> Self {
        self.max_message_size = size;
        self
    }

    /// Returns the separator.
    #[must_use]
    pub const fn separator(&self) -> &Separator {
        &self.separator
    }

    /// Extracts the next complete frame starting at `cursor`.
    ///
    /// # Returns
    /// - `Ok(Some(frame))`: one complete message; `cursor` moved past it
    /// - `Ok(None)`: more bytes are needed; `cursor` unchanged
    ///
    /// # Errors
    /// Returns a [`FramingFault`] when the bytes at `cursor` cannot be a
    /// valid message. The cursor is moved past the rejected bytes, to the
    /// next BeginString marker when one is known, so the stream recovers on
    /// the next call.
    pub fn next_frame<'a>(
        &self,
        buffer: &'a [u8],
        cursor: &mut usize,
    ) -> Result<Option<&'a [u8]>, FramingFault> {
        let start = *cursor;
        let Some(data) = buffer.get(start..) else {
            return Ok(None);
        };
        if data.is_empty() {
            return Ok(None);
        }

        let Some(marker) = memmem::find(data, BEGIN_MARKER) else {
            // Keep a tail that may hold the start of a split marker.
            let skipped = data.len().saturating_sub(BEGIN_MARKER.len() - 1);
            if data.len() <= self.max_message_size || skipped == 0 {
                return Ok(None);
            }
            warn!(offset = start, skipped, "no begin string within size limit");
            return Err(self.reject(
                cursor,
                start,
                skipped,
                FramingError::GarbageBeforeBeginString { skipped },
            ));
        };
        if marker > 0 {
            warn!(offset = start, skipped = marker, "garbage before begin string");
            return Err(self.reject(
                cursor,
                start,
                marker,
                FramingError::GarbageBeforeBeginString { skipped: marker },
            ));
        }

        let next_start = memmem::find(&data[1..], &self.next_marker)
            .map(|pos| 1 + pos + self.separator.len());
        let window = &data[..next_start.unwrap_or(data.len())];

        match self.locate_checksum(window, data) {
            ChecksumSlot::Complete {
                field_start,
                value_start,
                value_end,
                frame_end,
            } => {
                let frame = &data[..frame_end];
                match self.verify(frame, field_start, &frame[value_start..value_end]) {
                    Ok(()) => {
                        *cursor = start + frame_end;
                        Ok(Some(frame))
                    }
                    Err(cause) => {
                        warn!(offset = start, len = frame_end, %cause, "rejected frame");
                        Err(self.reject(cursor, start, frame_end, cause))
                    }
                }
            }
            ChecksumSlot::Glued { next_start } => {
                warn!(offset = start, "checksum field runs into next message");
                Err(self.reject(cursor, start, next_start, FramingError::MissingChecksum))
            }
            ChecksumSlot::Absent => match next_start {
                Some(next_start) => {
                    warn!(offset = start, "checksum field missing before next message");
                    Err(self.reject(cursor, start, next_start, FramingError::MissingChecksum))
                }
                None if window.len() > self.max_message_size => {
                    let cause = FramingError::MessageTooLarge {
                        size: window.len(),
                        max_size: self.max_message_size,
                    };
                    warn!(offset = start, %cause, "discarding oversized partial frame");
                    Err(self.reject(cursor, start, window.len(), cause))
                }
                None => Ok(None),
            },
        }
    }

    /// Finds the checksum field in `window`; `data` is the whole remaining
    /// buffer, used to detect a message glued onto an unterminated checksum.
    fn locate_checksum(&self, window: &[u8], data: &[u8]) -> ChecksumSlot {
        let Some(pos) = memmem::find(window, &self.checksum_marker) else {
            return ChecksumSlot::Absent;
        };
        let field_start = pos + self.separator.len();
        let value_start = field_start + CHECKSUM_PREFIX.len();
        let tail = &data[value_start..];
        let sep = self.separator.find(tail);
        let glued = memmem::find(tail, BEGIN_MARKER);

        match (sep, glued) {
            (Some(sep), Some(marker)) if marker < sep => ChecksumSlot::Glued {
                next_start: value_start + marker,
            },
            (Some(sep), _) => ChecksumSlot::Complete {
                field_start,
                value_start,
                value_end: value_start + sep,
                frame_end: value_start + sep + self.separator.len(),
            },
            (None, Some(marker)) => ChecksumSlot::Glued {
                next_start: value_start + marker,
            },
            (None, None) => ChecksumSlot::Absent,
        }
    }

    /// Validates the length and checksum fields of a bounded frame.
    fn verify(
        &self,
        frame: &[u8],
        checksum_start: usize,
        checksum_value: &[u8],
    ) -> Result<(), FramingError> {
        if frame.len() > self.max_message_size {
            return Err(FramingError::MessageTooLarge {
                size: frame.len(),
                max_size: self.max_message_size,
            });
        }

        let first_sep = self
            .separator
            .find(frame)
            .ok_or(FramingError::LengthFieldMisplaced)?;
        let length_start = first_sep + self.separator.len();
        if !frame[length_start..].starts_with(LENGTH_PREFIX) {
            return Err(FramingError::LengthFieldMisplaced);
        }
        let value_start = length_start + LENGTH_PREFIX.len();
        let value_len = self
            .separator
            .find(&frame[value_start..])
            .ok_or(FramingError::LengthFieldMisplaced)?;
        let length_value = &frame[value_start..value_start + value_len];
        let length_end = value_start + value_len + self.separator.len();

        let declared = parse_length(length_value).ok_or_else(|| {
            FramingError::InvalidBodyLength(String::from_utf8_lossy(length_value).into_owned())
        })?;
        let measured = checksum_start.saturating_sub(length_end);
        if length_end > checksum_start || declared != measured {
            return Err(FramingError::BodyLengthMismatch { declared, measured });
        }

        let declared_checksum = parse_checksum(checksum_value).ok_or_else(|| {
            FramingError::InvalidChecksum(String::from_utf8_lossy(checksum_value).into_owned())
        })?;
        if self.validate_checksum {
            let calculated = calculate_checksum(&frame[..checksum_start]);
            if calculated != declared_checksum {
                return Err(FramingError::ChecksumMismatch {
                    calculated,
                    declared: declared_checksum,
                });
            }
        }
        Ok(())
    }

    fn reject(
        &self,
        cursor: &mut usize,
        offset: usize,
        discarded: usize,
        cause: FramingError,
    ) -> FramingFault {
        *cursor = offset + discarded;
        FramingFault {
            offset,
            discarded,
            cause,
        }
    }
}

impl Default for FrameScanner {
    fn default() -> Self {
        Self::new(Separator::soh())
    }
}

/// Parses an unsigned decimal length.
fn parse_length(bytes: &[u8]) -> Option<usize> {
    if bytes.is_empty() || bytes.len() > 10 {
        return None;
    }
    bytes.iter().try_fold(0usize, |acc, &b| {
        if b.is_ascii_digit() {
            acc.checked_mul(10)?.checked_add(usize::from(b - b'0'))
        } else {
            None
        }
    })
}
