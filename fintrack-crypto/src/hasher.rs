//! PIN hashing.
//!
//! The stored credential is `hex(SHA-256(pin))`. There is no per-user or
//! per-installation salt: identical PINs hash identically everywhere, and a
//! leaked digest of a 4-6 digit PIN falls to exhaustive search instantly.
//! The verification contract (deterministic digest, byte-equal compare) is
//! what existing installations depend on, so it is kept as is.

use sha2::{Digest, Sha256};
use std::fmt;
use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Length of a hex-encoded SHA-256 digest.
pub const DIGEST_HEX_LEN: usize = 64;

/// Sensitive PIN holder that zeroizes on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct Pin(String);

impl Pin {
    /// Wrap a raw PIN.
    pub fn new(pin: impl Into<String>) -> Self {
        Self(pin.into())
    }

    /// Borrow the raw PIN.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Number of characters entered.
    pub fn len(&self) -> usize {
        self.0.chars().count()
    }

    /// Whether nothing has been entered.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Pin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Pin(***)")
    }
}

/// One-way mapping from a PIN to its stored string form.
pub trait CredentialHasher: Send + Sync {
    /// Digest a PIN. Must be deterministic.
    fn hash(&self, pin: &Pin) -> String;

    /// Check a PIN against a stored digest.
    fn verify(&self, pin: &Pin, expected: &str) -> bool {
        digest_eq(&self.hash(pin), expected)
    }
}

/// Unsalted SHA-256, lowercase hex.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256PinHasher;

impl CredentialHasher for Sha256PinHasher {
    fn hash(&self, pin: &Pin) -> String {
        hex::encode(Sha256::digest(pin.expose().as_bytes()))
    }
}

/// Constant-time comparison of two stored digests.
///
/// Different lengths compare unequal.
pub fn digest_eq(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_deterministic() {
        let hasher = Sha256PinHasher;
        assert_eq!(hasher.hash(&Pin::new("1234")), hasher.hash(&Pin::new("1234")));
    }

    #[test]
    fn test_hash_different_pins() {
        let hasher = Sha256PinHasher;
        assert_ne!(hasher.hash(&Pin::new("1234")), hasher.hash(&Pin::new("5678")));
        assert_ne!(hasher.hash(&Pin::new("1234")), hasher.hash(&Pin::new("123456")));
    }

    #[test]
    fn test_hash_known_vector() {
        // Digests written by earlier app versions must keep verifying.
        let hash = Sha256PinHasher.hash(&Pin::new("1234"));
        assert_eq!(
            hash,
            "03ac674216f3e15c761ee1a5e255f067953623c8b388b4459e13f978d7c846f4"
        );
        assert_eq!(hash.len(), DIGEST_HEX_LEN);
    }

    #[test]
    fn test_verify() {
        let hasher = Sha256PinHasher;
        let stored = hasher.hash(&Pin::new("2580"));

        assert!(hasher.verify(&Pin::new("2580"), &stored));
        assert!(!hasher.verify(&Pin::new("0852"), &stored));
        assert!(!hasher.verify(&Pin::new(""), &stored));
    }

    #[test]
    fn test_digest_eq_length_mismatch() {
        assert!(digest_eq("abcd", "abcd"));
        assert!(!digest_eq("abcd", "abc"));
        assert!(!digest_eq("", "a"));
    }

    #[test]
    fn test_pin_debug_is_redacted() {
        let pin = Pin::new("9999");
        assert_eq!(format!("{:?}", pin), "Pin(***)");
        assert_eq!(pin.len(), 4);
        assert!(!pin.is_empty());
    }
}
