//! Request body of the rotation endpoint.

use serde::{Deserialize, Serialize};

use sa_key_rotator::RotationConfig;

/// One service account to rotate.
///
/// Missing fields default to empty or zero and are then reported by
/// [`RotationRequest::problems`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RotationRequest {
    #[serde(default)]
    pub service_account: String,
    #[serde(default)]
    pub bucket: String,
    #[serde(default)]
    pub days: i64,
    #[serde(default)]
    pub renewal_window: i64,
}

impl RotationRequest {
    /// Every reason this request cannot be rotated; empty when it is valid.
    pub fn problems(&self) -> Vec<&'static str> {
        let mut problems = Vec::new();
        if self.service_account.trim().is_empty() {
            problems.push("service_account field is missing");
        }
        if self.bucket.trim().is_empty() {
            problems.push("bucket field is missing");
        }
        if self.days < 2 {
            problems.push("days cannot be smaller than 2");
        }
        if self.renewal_window < 1 {
            problems.push("renewal_window cannot be smaller than 1");
        }
        if self.renewal_window >= self.days {
            problems.push("renewal_window should be smaller than days");
        }
        problems
    }

    /// Rotation settings for this request: default label, no forcing.
    pub fn to_config(&self) -> RotationConfig {
        RotationConfig::new(self.service_account.trim(), self.bucket.trim())
            .expiry_days(self.days)
            .renewal_window_days(self.renewal_window)
    }
}

/// Decode a request body: a JSON array of requests.
pub fn parse_body(body: &[u8]) -> serde_json::Result<Vec<RotationRequest>> {
    serde_json::from_slice(body)
}
