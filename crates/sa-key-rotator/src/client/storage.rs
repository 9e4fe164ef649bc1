//! Cloud Storage media uploads.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::client::{cancellable, check_status, http_client, ArtifactStore, TokenSource};
use crate::error::{RemoteService, Result, RotatorError};

const SERVICE: RemoteService = RemoteService::StorageService;

/// Writes objects through the `storage/v1` simple upload endpoint.
pub struct CloudStorageClient {
    http: reqwest::Client,
    base_url: String,
    tokens: Arc<dyn TokenSource>,
}

impl CloudStorageClient {
    pub fn new(base_url: &str, tokens: Arc<dyn TokenSource>) -> Result<Self> {
        Ok(Self {
            http: http_client(SERVICE, None)?,
            base_url: base_url.trim_end_matches('/').to_string(),
            tokens,
        })
    }
}

fn content_type(object_name: &str) -> &'static str {
    if object_name.ends_with(".json") {
        "application/json"
    } else {
        "application/octet-stream"
    }
}

#[async_trait]
impl ArtifactStore for CloudStorageClient {
    async fn put(
        &self,
        bucket: &str,
        object_name: &str,
        bytes: Vec<u8>,
        cancel: &CancellationToken,
    ) -> Result<()> {
        cancellable(cancel, async {
            let token = self.tokens.access_token().await?;
            let response = self
                .http
                .post(format!("{}/b/{}/o", self.base_url, bucket))
                .query(&[("uploadType", "media"), ("name", object_name)])
                .header(reqwest::header::CONTENT_TYPE, content_type(object_name))
                .bearer_auth(token)
                .body(bytes)
                .send()
                .await
                .map_err(|e| {
                    RotatorError::remote(SERVICE, format!("storing {object_name} in {bucket}: {e}"))
                })?;
            check_status(SERVICE, response).await.map(|_| ())
        })
        .await
    }
}
