//! Per-invocation rotation settings.

use crate::error::{Result, RotatorError};

/// Label stamped on keys this rotator owns.
pub const DEFAULT_LABEL: &str = "sa-key-rotator";

/// Default lifetime of a minted key, in days.
pub const DEFAULT_EXPIRY_DAYS: i64 = 90;

/// Default span at the end of a key's lifetime in which it gets replaced.
pub const DEFAULT_RENEWAL_WINDOW_DAYS: i64 = 15;

/// What to rotate, and how aggressively.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotationConfig {
    pub identity_email: String,
    /// Common name marking keys as ours.
    pub label: String,
    /// Bucket receiving the credentials documents.
    pub bucket: String,
    pub expiry_days: i64,
    pub renewal_window_days: i64,
    /// Upload a new key even if a fresh one exists.
    pub force_create: bool,
    /// Delete every owned key, expired or not.
    pub force_delete: bool,
}

impl RotationConfig {
    pub fn new(identity_email: impl Into<String>, bucket: impl Into<String>) -> Self {
        Self {
            identity_email: identity_email.into(),
            label: DEFAULT_LABEL.to_string(),
            bucket: bucket.into(),
            expiry_days: DEFAULT_EXPIRY_DAYS,
            renewal_window_days: DEFAULT_RENEWAL_WINDOW_DAYS,
            force_create: false,
            force_delete: false,
        }
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn expiry_days(mut self, days: i64) -> Self {
        self.expiry_days = days;
        self
    }

    pub fn renewal_window_days(mut self, days: i64) -> Self {
        self.renewal_window_days = days;
        self
    }

    pub fn force_create(mut self, force: bool) -> Self {
        self.force_create = force;
        self
    }

    pub fn force_delete(mut self, force: bool) -> Self {
        self.force_delete = force;
        self
    }

    /// Check the settings before anything touches a remote service.
    pub fn validate(&self) -> Result<()> {
        if self.identity_email.trim().is_empty() {
            return Err(RotatorError::Validation(
                "service account cannot be empty".to_string(),
            ));
        }
        if self.bucket.trim().is_empty() {
            return Err(RotatorError::Validation("bucket cannot be empty".to_string()));
        }
        if self.label.trim().is_empty() {
            return Err(RotatorError::Validation("name cannot be empty".to_string()));
        }
        if self.expiry_days < 2 {
            return Err(RotatorError::Validation(
                "days cannot be smaller than 2".to_string(),
            ));
        }
        if self.renewal_window_days < 1 {
            return Err(RotatorError::Validation(
                "window cannot be smaller than 1".to_string(),
            ));
        }
        if self.renewal_window_days >= self.expiry_days {
            return Err(RotatorError::Validation(
                "window should be smaller than days".to_string(),
            ));
        }
        if u32::try_from(self.expiry_days).is_err() {
            return Err(RotatorError::Validation("days is too large".to_string()));
        }
        Ok(())
    }

    pub(crate) fn expiry(&self) -> u32 {
        u32::try_from(self.expiry_days).unwrap_or(u32::MAX)
    }

    pub(crate) fn window(&self) -> u32 {
        u32::try_from(self.renewal_window_days).unwrap_or(u32::MAX)
    }
}
