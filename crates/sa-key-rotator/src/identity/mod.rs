//! Service account identities and the keys registered against them.

mod key;

pub use key::{Key, KeyName, KeyType};

use serde::Deserialize;

/// A service account principal, as reported by the identity service.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    /// Resource name, `projects/{project}/serviceAccounts/{email}`.
    pub name: String,
    /// Opaque numeric identifier, used as the OAuth client id.
    #[serde(default)]
    pub unique_id: String,
    pub email: String,
}

/// Resource path addressing a service account by email in any project.
pub fn resource_path(email: &str) -> String {
    format!("projects/-/serviceAccounts/{email}")
}
