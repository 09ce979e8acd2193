//! # FinTrack Crypto
//!
//! PIN digest primitives for the FinTrack app lock.
//!
//! - **SHA-256** one-way digest of the PIN, hex encoded for storage
//! - **Constant-time** digest comparison
//! - **Zeroizing** PIN holder so raw PINs do not linger in memory
//!
//! ## Safety
//!
//! This crate forbids all unsafe code.
//!
//! ## Example
//!
//! ```rust
//! use fintrack_crypto::{CredentialHasher, Pin, Sha256PinHasher};
//!
//! let hasher = Sha256PinHasher;
//! let stored = hasher.hash(&Pin::new("1234"));
//!
//! assert!(hasher.verify(&Pin::new("1234"), &stored));
//! assert!(!hasher.verify(&Pin::new("4321"), &stored));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod hasher;

pub use hasher::{digest_eq, CredentialHasher, Pin, Sha256PinHasher, DIGEST_HEX_LEN};
