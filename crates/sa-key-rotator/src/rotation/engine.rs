//! Executes rotation plans.

use std::sync::Arc;

use chrono::{DateTime, FixedOffset};
use tokio_util::sync::CancellationToken;

use crate::client::auth::default_token_source;
use crate::client::{
    ArtifactStore, CertificateBundleReader, CloudStorageClient, Endpoints, IamClient,
    IdentityRegistry, LabelIndex,
};
use crate::credentials::CredentialsDocument;
use crate::crypto::{KeyMinter, RsaKeyMinter};
use crate::error::{Result, RotatorError};
use crate::identity::{resource_path, Identity};
use crate::rotation::plan::{plan, CreateReason, DeleteReason};
use crate::rotation::RotationConfig;
use crate::time::{add_days, artifact_date, Clock, SystemClock};

/// Characters of the key id used in artifact names.
const OBJECT_KEY_ID_CHARS: usize = 10;

/// A key uploaded during a rotation, and where its credentials went.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedKey {
    pub key_name: String,
    pub key_id: String,
    pub object_name: String,
    pub valid_after: DateTime<FixedOffset>,
    pub valid_before: DateTime<FixedOffset>,
}

/// What a rotation did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RotationReport {
    pub uploaded: Option<UploadedKey>,
    /// Key names removed.
    pub deleted: Vec<String>,
    /// Key names whose removal failed; retried by the next rotation.
    pub failed_deletions: Vec<String>,
}

impl RotationReport {
    /// True when nothing was uploaded and nothing needed deleting.
    pub fn is_noop(&self) -> bool {
        self.uploaded.is_none() && self.deleted.is_empty() && self.failed_deletions.is_empty()
    }
}

/// Name of the object a key's credentials document is stored under.
pub fn object_name(not_before: &DateTime<FixedOffset>, key_id: &str) -> String {
    let prefix: String = key_id.chars().take(OBJECT_KEY_ID_CHARS).collect();
    format!("{}-{}.json", artifact_date(not_before), prefix)
}

/// Reconciles the keys of one service account per call.
///
/// Holds no state between calls; clones share the underlying clients.
#[derive(Clone)]
pub struct Rotator {
    registry: Arc<dyn IdentityRegistry>,
    labels: Arc<dyn LabelIndex>,
    store: Arc<dyn ArtifactStore>,
    minter: Arc<dyn KeyMinter>,
    clock: Arc<dyn Clock>,
}

impl Rotator {
    pub fn new(
        registry: Arc<dyn IdentityRegistry>,
        labels: Arc<dyn LabelIndex>,
        store: Arc<dyn ArtifactStore>,
    ) -> Self {
        Self {
            registry,
            labels,
            store,
            minter: Arc::new(RsaKeyMinter),
            clock: Arc::new(SystemClock),
        }
    }

    /// Rotator wired to the Google APIs at `endpoints`.
    pub fn google(endpoints: &Endpoints) -> Result<Self> {
        let tokens = default_token_source(endpoints)?;
        Ok(Self::new(
            Arc::new(IamClient::new(&endpoints.iam, Arc::clone(&tokens))?),
            Arc::new(CertificateBundleReader::new(&endpoints.certificate_bundle)?),
            Arc::new(CloudStorageClient::new(&endpoints.storage_upload, tokens)?),
        ))
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_minter(mut self, minter: Arc<dyn KeyMinter>) -> Self {
        self.minter = minter;
        self
    }

    /// Bring the keys of `cfg.identity_email` in line with `cfg`.
    ///
    /// Failures before the delete step abort the rotation, leaving whatever
    /// was already uploaded or stored in place. Failed deletions are logged
    /// and reported but do not fail the rotation.
    pub async fn rotate(
        &self,
        cfg: &RotationConfig,
        cancel: &CancellationToken,
    ) -> Result<RotationReport> {
        cfg.validate()?;

        let email = cfg.identity_email.as_str();
        tracing::info!(service_account = email, "checking keys for service account");

        let resource = resource_path(email);
        let now = self.clock.today();
        let not_before = now;
        let not_after = add_days(now, cfg.expiry())?;

        let identity = self
            .registry
            .get_identity(&resource, cancel)
            .await
            .map_err(|e| context(e, format!("failed to get service account {email}")))?;

        let existing = self
            .registry
            .list_user_managed_keys(&resource, cancel)
            .await
            .map_err(|e| context(e, format!("failed to get service account keys {email}")))?;

        let mut report = RotationReport::default();

        if existing.is_empty() {
            tracing::info!(service_account = email, "no keys found, uploading a new one");
            let uploaded = self
                .upload_new_key(&identity, cfg, not_before, not_after, cancel)
                .await?;
            report.uploaded = Some(uploaded);
            return Ok(report);
        }

        let labels = self.labels.labels_for(&identity.email, cancel).await?;
        let plan = plan(&existing, &labels, now, cfg)?;

        if let Some(reason) = plan.create {
            match reason {
                CreateReason::Forced => tracing::info!(
                    service_account = email,
                    "creating and uploading a new key (forced)"
                ),
                _ => tracing::info!(
                    service_account = email,
                    "current key is about to expire, uploading a new one"
                ),
            }
            let uploaded = self
                .upload_new_key(&identity, cfg, not_before, not_after, cancel)
                .await?;
            report.uploaded = Some(uploaded);
        }

        for deletion in &plan.delete {
            let key = deletion.key_name.as_str();
            match self.registry.delete_key(key, cancel).await {
                Ok(()) => {
                    match deletion.reason {
                        DeleteReason::Forced => tracing::info!(
                            service_account = email,
                            key_id = key,
                            "deleted existing key (forced)"
                        ),
                        DeleteReason::Expired => tracing::info!(
                            service_account = email,
                            key_id = key,
                            "deleted expired key"
                        ),
                    }
                    report.deleted.push(deletion.key_name.clone());
                }
                Err(RotatorError::Cancelled) => return Err(RotatorError::Cancelled),
                Err(err) => {
                    tracing::warn!(
                        service_account = email,
                        key_id = key,
                        err = %err,
                        "failed to delete key"
                    );
                    report.failed_deletions.push(deletion.key_name.clone());
                }
            }
        }

        if plan.is_noop() {
            tracing::info!(service_account = email, "nothing to do, everything is fine!");
        }

        Ok(report)
    }

    /// Mint, upload, and publish one new key valid over
    /// `[not_before, not_after]`.
    async fn upload_new_key(
        &self,
        identity: &Identity,
        cfg: &RotationConfig,
        not_before: DateTime<FixedOffset>,
        not_after: DateTime<FixedOffset>,
        cancel: &CancellationToken,
    ) -> Result<UploadedKey> {
        let minter = Arc::clone(&self.minter);
        let label = cfg.label.clone();
        let material =
            tokio::task::spawn_blocking(move || minter.mint(&label, not_before, not_after))
                .await
                .map_err(|e| RotatorError::Crypto(format!("minting task failed: {e}")))??;

        let key = self
            .registry
            .upload_key(&identity.name, &material.certificate_pem, cancel)
            .await?;
        let key_name = key.key_name()?;

        let document =
            CredentialsDocument::assemble(identity, &key_name, &material.private_key_pem)?;
        let object = object_name(&not_before, &key_name.key_id);

        self.store
            .put(&cfg.bucket, &object, document.to_json()?, cancel)
            .await
            .map_err(|e| {
                context(
                    e,
                    format!("failed to store service account key in bucket {}", cfg.bucket),
                )
            })?;

        tracing::info!(
            service_account = %identity.email,
            key_id = %key_name.key_id,
            bucket = %cfg.bucket,
            object = %object,
            valid_from = %not_before.to_rfc3339(),
            valid_to = %not_after.to_rfc3339(),
            "uploaded a new key"
        );

        Ok(UploadedKey {
            key_name: key.name,
            key_id: key_name.key_id,
            object_name: object,
            valid_after: not_before,
            valid_before: not_after,
        })
    }
}

/// Prefix a remote error's message; other kinds pass through.
fn context(err: RotatorError, what: String) -> RotatorError {
    match err {
        RotatorError::Remote { service, message } => RotatorError::Remote {
            service,
            message: format!("{what}: {message}"),
        },
        other => other,
    }
}
