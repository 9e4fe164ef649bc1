//! Service account credentials documents.
//!
//! The document published for each new key is the same JSON that
//! `gcloud iam service-accounts keys create` would hand out, so downstream
//! consumers can load it with any Google client library.

use serde::{Deserialize, Serialize};

use crate::error::{Result, RotatorError};
use crate::identity::{Identity, KeyName};

pub const AUTH_URI: &str = "https://accounts.google.com/o/oauth2/auth";
pub const TOKEN_URI: &str = "https://accounts.google.com/o/oauth2/token";
pub const AUTH_PROVIDER_CERT_URL: &str = "https://www.googleapis.com/oauth2/v1/certs";
pub const CLIENT_CERT_URL_PREFIX: &str = "https://www.googleapis.com/robot/v1/metadata/x509/";

/// A `service_account` credentials file.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialsDocument {
    #[serde(rename = "type")]
    pub kind: String,
    pub project_id: String,
    pub private_key_id: String,
    pub private_key: String,
    pub client_email: String,
    pub client_id: String,
    pub auth_uri: String,
    pub token_uri: String,
    pub auth_provider_x509_cert_url: String,
    pub client_x509_cert_url: String,
}

impl std::fmt::Debug for CredentialsDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialsDocument")
            .field("project_id", &self.project_id)
            .field("private_key_id", &self.private_key_id)
            .field("client_email", &self.client_email)
            .finish_non_exhaustive()
    }
}

impl CredentialsDocument {
    /// Bind a private key to the identity it was uploaded for.
    ///
    /// `key_name` is the resource name the identity service assigned to the
    /// uploaded key; it must belong to `identity`.
    pub fn assemble(
        identity: &Identity,
        key_name: &KeyName,
        private_key_pem: &str,
    ) -> Result<Self> {
        if key_name.client_email != identity.email {
            return Err(RotatorError::Parse(format!(
                "key {} belongs to {}, not {}",
                key_name.key_id, key_name.client_email, identity.email
            )));
        }

        Ok(Self {
            kind: "service_account".to_string(),
            project_id: key_name.project_id.clone(),
            private_key_id: key_name.key_id.clone(),
            private_key: private_key_pem.to_string(),
            client_email: identity.email.clone(),
            client_id: identity.unique_id.clone(),
            auth_uri: AUTH_URI.to_string(),
            token_uri: TOKEN_URI.to_string(),
            auth_provider_x509_cert_url: AUTH_PROVIDER_CERT_URL.to_string(),
            client_x509_cert_url: format!("{CLIENT_CERT_URL_PREFIX}{}", identity.email),
        })
    }

    pub fn to_json(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self)
            .map_err(|e| RotatorError::Crypto(format!("encoding credentials document: {e}")))
    }
}
