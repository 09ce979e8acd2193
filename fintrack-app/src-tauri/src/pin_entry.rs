//! PIN length policy and keypad entry buffer.
//!
//! The app uses exactly one PIN length. The keypad submits when that many
//! digits are in, never earlier, so there is no guessing between 4 and 6.

use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::Zeroizing;

use fintrack_crypto::Pin;

/// Supported PIN lengths.
pub const SUPPORTED_PIN_LENGTHS: [usize; 2] = [4, 6];

/// Fixed-length numeric PIN rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PinPolicy {
    pub length: usize,
}

impl Default for PinPolicy {
    fn default() -> Self {
        Self { length: 4 }
    }
}

impl PinPolicy {
    /// Policy for `length` digits, if supported.
    pub fn new(length: usize) -> Option<Self> {
        SUPPORTED_PIN_LENGTHS
            .contains(&length)
            .then_some(Self { length })
    }

    /// Exactly `length` ASCII digits.
    pub fn accepts(&self, pin: &Pin) -> bool {
        let raw = pin.expose();
        raw.len() == self.length && raw.bytes().all(|b| b.is_ascii_digit())
    }
}

/// Effect of a keypad press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryProgress {
    /// Digit accepted; this many entered so far.
    Partial(usize),
    /// Last digit entered; the PIN is ready to submit.
    Complete,
    /// Not a digit, or the buffer is already full.
    Ignored,
}

/// Keypad input buffer.
pub struct PinEntry {
    policy: PinPolicy,
    digits: Zeroizing<String>,
}

impl fmt::Debug for PinEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PinEntry")
            .field("policy", &self.policy)
            .field("entered", &self.digits.len())
            .finish()
    }
}

impl PinEntry {
    /// Empty buffer for `policy`.
    pub fn new(policy: PinPolicy) -> Self {
        Self {
            policy,
            digits: Zeroizing::new(String::with_capacity(policy.length)),
        }
    }

    /// Digits entered so far (for the dot indicator).
    pub fn len(&self) -> usize {
        self.digits.len()
    }

    /// Whether nothing has been entered.
    pub fn is_empty(&self) -> bool {
        self.digits.is_empty()
    }

    /// Whether the buffer holds a full PIN.
    pub fn is_complete(&self) -> bool {
        self.digits.len() == self.policy.length
    }

    /// Append a keypad press.
    pub fn push(&mut self, key: char) -> EntryProgress {
        if !key.is_ascii_digit() || self.is_complete() {
            return EntryProgress::Ignored;
        }
        self.digits.push(key);
        if self.is_complete() {
            EntryProgress::Complete
        } else {
            EntryProgress::Partial(self.digits.len())
        }
    }

    /// Delete the last digit.
    pub fn pop(&mut self) {
        self.digits.pop();
    }

    /// Drop everything entered.
    pub fn clear(&mut self) {
        self.digits.clear();
    }

    /// Hand out the full PIN and reset. `None` until complete.
    pub fn take(&mut self) -> Option<Pin> {
        if !self.is_complete() {
            return None;
        }
        let pin = Pin::new(self.digits.as_str());
        self.digits.clear();
        Some(pin)
    }
}
