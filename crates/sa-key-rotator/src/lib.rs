//! sa-key-rotator: rotation of user-managed service account keys.
//!
//! Keeps at most one current key carrying the owner label per service
//! account, replaces it before it expires, removes expired keys, and
//! publishes the private key of every new key as a credentials document
//! in a storage bucket.

pub mod client;
pub mod credentials;
pub mod crypto;
pub mod error;
pub mod identity;
pub mod logging;
pub mod memory;
pub mod rotation;
pub mod time;

// Re-export primary types
pub use client::{ArtifactStore, Endpoints, IdentityRegistry, LabelIndex};
pub use credentials::CredentialsDocument;
pub use crypto::{KeyMaterial, KeyMinter, RsaKeyMinter};
pub use error::{RemoteService, Result, RotatorError};
pub use identity::{Identity, Key, KeyName, KeyType};
pub use rotation::{
    plan, CreateReason, DeleteReason, Deletion, RotationConfig, RotationPlan, RotationReport,
    Rotator, UploadedKey, DEFAULT_EXPIRY_DAYS, DEFAULT_LABEL, DEFAULT_RENEWAL_WINDOW_DAYS,
};
pub use crate::time::{Clock, FixedClock, SystemClock};

pub use tokio_util::sync::CancellationToken;
