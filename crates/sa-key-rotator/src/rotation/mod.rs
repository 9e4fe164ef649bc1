//! Key rotation for a single service account.
//!
//! [`plan`] decides, [`Rotator`] carries the decision out against the
//! remote services: upload first, then delete.

pub mod config;
pub mod engine;
pub mod plan;

pub use config::{RotationConfig, DEFAULT_EXPIRY_DAYS, DEFAULT_LABEL, DEFAULT_RENEWAL_WINDOW_DAYS};
pub use engine::{RotationReport, Rotator, UploadedKey};
pub use plan::{plan, CreateReason, DeleteReason, Deletion, RotationPlan};
