//! Adapters over the remote services the rotator depends on.
//!
//! Each collaborator is a trait so the rotation engine can run against the
//! Google APIs in production and against in-memory doubles in tests. Every
//! call takes a cancellation token; a cancelled call fails with
//! [`RotatorError::Cancelled`] and leaves any remote side effect in place.

pub mod auth;
pub mod bundle;
pub mod iam;
pub mod storage;

use std::collections::HashMap;
use std::future::Future;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::{RemoteService, Result, RotatorError};
use crate::identity::{Identity, Key};

pub use auth::{MetadataTokenSource, StaticTokenSource, TokenSource};
pub use bundle::CertificateBundleReader;
pub use iam::IamClient;
pub use storage::CloudStorageClient;

/// Read/write access to service accounts and their keys.
#[async_trait]
pub trait IdentityRegistry: Send + Sync {
    async fn get_identity(&self, resource_path: &str, cancel: &CancellationToken)
        -> Result<Identity>;

    /// Keys of type user-managed only.
    async fn list_user_managed_keys(
        &self,
        resource_path: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<Key>>;

    /// Register an externally generated key from its PEM certificate.
    async fn upload_key(
        &self,
        identity_name: &str,
        certificate_pem: &str,
        cancel: &CancellationToken,
    ) -> Result<Key>;

    /// Remove a key. Removing a key that no longer exists succeeds.
    async fn delete_key(&self, key_name: &str, cancel: &CancellationToken) -> Result<()>;
}

/// Recovers key labels (certificate common names) for a service account.
#[async_trait]
pub trait LabelIndex: Send + Sync {
    /// Mapping from key id to subject common name.
    async fn labels_for(
        &self,
        email: &str,
        cancel: &CancellationToken,
    ) -> Result<HashMap<String, String>>;
}

/// Blob storage the credentials documents are published to.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Write `bytes` under `object_name`, overwriting any existing object.
    async fn put(
        &self,
        bucket: &str,
        object_name: &str,
        bytes: Vec<u8>,
        cancel: &CancellationToken,
    ) -> Result<()>;
}

/// Base URLs of the Google APIs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub iam: String,
    pub storage_upload: String,
    pub certificate_bundle: String,
    pub metadata: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            iam: "https://iam.googleapis.com/v1".to_string(),
            storage_upload: "https://storage.googleapis.com/upload/storage/v1".to_string(),
            certificate_bundle: "https://www.googleapis.com/robot/v1/metadata/x509".to_string(),
            metadata: "http://metadata.google.internal".to_string(),
        }
    }
}

impl Endpoints {
    /// Defaults, with the metadata server overridden by `GCE_METADATA_HOST`.
    pub fn from_env() -> Self {
        let mut endpoints = Self::default();
        if let Ok(host) = std::env::var("GCE_METADATA_HOST") {
            if !host.trim().is_empty() {
                endpoints.metadata = format!("http://{}", host.trim());
            }
        }
        endpoints
    }
}

/// Race `fut` against `cancel`.
pub(crate) async fn cancellable<T, F>(cancel: &CancellationToken, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(RotatorError::Cancelled),
        result = fut => result,
    }
}

/// Turn a non-success HTTP response into a remote error carrying its body.
pub(crate) async fn check_status(
    service: RemoteService,
    response: reqwest::Response,
) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let url = response.url().clone();
    let body = response.text().await.unwrap_or_default();
    Err(RotatorError::remote(
        service,
        format!("{status} from {url}: {}", body.trim()),
    ))
}

pub(crate) fn http_client(
    service: RemoteService,
    timeout: Option<std::time::Duration>,
) -> Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder().user_agent(concat!(
        env!("CARGO_PKG_NAME"),
        "/",
        env!("CARGO_PKG_VERSION")
    ));
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    builder
        .build()
        .map_err(|e| RotatorError::remote(service, format!("building HTTP client: {e}")))
}
