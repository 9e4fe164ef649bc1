//! Label recovery through a service account's public certificate bundle.
//!
//! The identity service stores no user metadata per key. The common name a
//! key was minted with is only visible in the certificate published at
//! `robot/v1/metadata/x509/{email}`. Freshly uploaded keys can take a while
//! to show up there.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::client::{cancellable, check_status, http_client, LabelIndex};
use crate::crypto::common_name;
use crate::error::{RemoteService, Result, RotatorError};

/// Per-request timeout for bundle fetches.
pub const BUNDLE_TIMEOUT: Duration = Duration::from_secs(5);

const SERVICE: RemoteService = RemoteService::BundleFetch;

/// Reads the public x509 bundle; no credentials required.
pub struct CertificateBundleReader {
    http: reqwest::Client,
    base_url: String,
}

impl CertificateBundleReader {
    pub fn new(base_url: &str) -> Result<Self> {
        Ok(Self {
            http: http_client(SERVICE, Some(BUNDLE_TIMEOUT))?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

/// Replace every PEM certificate in `bundle` by its subject common name.
pub fn labels_from_bundle(bundle: HashMap<String, String>) -> Result<HashMap<String, String>> {
    bundle
        .into_iter()
        .map(|(key_id, pem)| {
            match common_name(&pem) {
                Ok(label) => Ok((key_id, label)),
                Err(RotatorError::Parse(msg)) => Err(RotatorError::Parse(format!(
                    "certificate of key {key_id}: {msg}"
                ))),
                Err(e) => Err(e),
            }
        })
        .collect()
}

#[async_trait]
impl LabelIndex for CertificateBundleReader {
    async fn labels_for(
        &self,
        email: &str,
        cancel: &CancellationToken,
    ) -> Result<HashMap<String, String>> {
        cancellable(cancel, async {
            let url = format!("{}/{}", self.base_url, email);
            let response = self
                .http
                .get(&url)
                .send()
                .await
                .map_err(|e| RotatorError::remote(SERVICE, e))?;
            let bundle: HashMap<String, String> = check_status(SERVICE, response)
                .await?
                .json()
                .await
                .map_err(|e| RotatorError::Parse(format!("certificate bundle of {email}: {e}")))?;
            labels_from_bundle(bundle)
        })
        .await
    }
}
