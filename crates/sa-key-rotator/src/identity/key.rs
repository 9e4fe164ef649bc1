//! Keys bound to a service account.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, RotatorError};
use crate::time::parse_rfc3339;

/// Who manages a key's private half.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum KeyType {
    UserManaged,
    SystemManaged,
    #[serde(other)]
    Unspecified,
}

/// A key registered against a service account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Key {
    /// `projects/{project}/serviceAccounts/{email}/keys/{key_id}`
    pub name: String,
    /// RFC 3339 end of validity.
    pub valid_before_time: String,
    #[serde(default)]
    pub valid_after_time: Option<String>,
    #[serde(default = "default_key_type")]
    pub key_type: KeyType,
}

fn default_key_type() -> KeyType {
    KeyType::Unspecified
}

impl Key {
    pub fn key_name(&self) -> Result<KeyName> {
        KeyName::parse(&self.name)
    }

    pub fn valid_before(&self) -> Result<DateTime<Utc>> {
        parse_rfc3339(&self.valid_before_time)
    }
}

/// The segments of a key resource name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyName {
    pub project_id: String,
    pub client_email: String,
    pub key_id: String,
}

impl KeyName {
    pub fn parse(name: &str) -> Result<Self> {
        let segments: Vec<&str> = name.split('/').collect();
        if segments.len() < 6 || segments[5].is_empty() {
            return Err(RotatorError::Parse(format!("malformed key name '{name}'")));
        }
        Ok(Self {
            project_id: segments[1].to_string(),
            client_email: segments[3].to_string(),
            key_id: segments[5].to_string(),
        })
    }
}
