/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 17/10/26
******************************************************************************/

//! Identifier generation for ClOrdID, ExecID and TestReqID values.

use std::sync::atomic::{AtomicU64, Ordering};

/// Prefixed, monotonically increasing identifier source.
///
/// Each generator is owned by the component that needs it; there is no
/// process-wide counter.
#[derive(Debug)]
pub struct IdGenerator {
    prefix: String,
    next: AtomicU64,
}

impl IdGenerator {
    /// Creates a generator starting at 1.
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        Self::starting_at(prefix, 1)
    }

    /// Creates a generator starting at `first`.
    ///
    /// # Arguments
    /// * `prefix` - Text placed before every number
    /// * `first` - Number used by the first call to [`IdGenerator::next_id`]
    #[must_use]
    pub fn starting_at(prefix: impl Into<String>, first: u64) -> Self {
        Self {
            prefix: prefix.into(),
            next: AtomicU64::new(first),
        }
    }

    /// Returns the next identifier.
    pub fn next_id(&self) -> String {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        let mut buf = itoa::Buffer::new();
        let digits = buf.format(n);
        let mut id = String::with_capacity(self.prefix.len() + digits.len());
        id.push_str(&self.prefix);
        id.push_str(digits);
        id
    }

    /// Returns the number the next identifier will carry.
    #[must_use]
    pub fn peek(&self) -> u64 {
        self.next.load(Ordering::Relaxed)
    }

    /// Returns the prefix.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}
