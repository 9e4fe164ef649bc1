//! Cryptographic primitives for the key rotator.
//!
//! This module provides:
//! - RSA-2048 key generation and self-signed certificate minting
//! - Subject common-name extraction from PEM certificates
//! - Cryptographically secure certificate serial numbers

pub mod certificate;
pub mod keys;
pub mod random;

pub use certificate::common_name;
pub use keys::{KeyMaterial, KeyMinter, RsaKeyMinter};
