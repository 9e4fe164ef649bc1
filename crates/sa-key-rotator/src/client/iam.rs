//! IAM REST client for service accounts and their keys.

use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::client::{cancellable, check_status, http_client, IdentityRegistry, TokenSource};
use crate::error::{RemoteService, Result, RotatorError};
use crate::identity::{Identity, Key, KeyType};

const SERVICE: RemoteService = RemoteService::IdentityService;

#[derive(Deserialize)]
struct ListKeysResponse {
    #[serde(default)]
    keys: Vec<Key>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UploadKeyRequest {
    public_key_data: String,
}

/// Talks to `iam.googleapis.com`.
pub struct IamClient {
    http: reqwest::Client,
    base_url: String,
    tokens: Arc<dyn TokenSource>,
}

impl IamClient {
    pub fn new(base_url: &str, tokens: Arc<dyn TokenSource>) -> Result<Self> {
        Ok(Self {
            http: http_client(SERVICE, None)?,
            base_url: base_url.trim_end_matches('/').to_string(),
            tokens,
        })
    }

    fn url(&self, resource: &str) -> String {
        format!("{}/{}", self.base_url, resource)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response> {
        let token = self.tokens.access_token().await?;
        request
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| RotatorError::remote(SERVICE, e))
    }

    async fn decode<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        check_status(SERVICE, response)
            .await?
            .json::<T>()
            .await
            .map_err(|e| RotatorError::remote(SERVICE, format!("decoding response: {e}")))
    }
}

#[async_trait]
impl IdentityRegistry for IamClient {
    async fn get_identity(
        &self,
        resource_path: &str,
        cancel: &CancellationToken,
    ) -> Result<Identity> {
        cancellable(cancel, async {
            let response = self.send(self.http.get(self.url(resource_path))).await?;
            Self::decode(response).await
        })
        .await
    }

    async fn list_user_managed_keys(
        &self,
        resource_path: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<Key>> {
        cancellable(cancel, async {
            let request = self
                .http
                .get(self.url(&format!("{resource_path}/keys")))
                .query(&[("keyTypes", "USER_MANAGED")]);
            let listed: ListKeysResponse = Self::decode(self.send(request).await?).await?;
            Ok(listed
                .keys
                .into_iter()
                .filter(|k| k.key_type == KeyType::UserManaged)
                .collect())
        })
        .await
    }

    async fn upload_key(
        &self,
        identity_name: &str,
        certificate_pem: &str,
        cancel: &CancellationToken,
    ) -> Result<Key> {
        cancellable(cancel, async {
            let body = UploadKeyRequest {
                public_key_data: base64::engine::general_purpose::STANDARD
                    .encode(certificate_pem.as_bytes()),
            };
            let request = self
                .http
                .post(self.url(&format!("{identity_name}/keys:upload")))
                .json(&body);
            Self::decode(self.send(request).await?).await
        })
        .await
    }

    async fn delete_key(&self, key_name: &str, cancel: &CancellationToken) -> Result<()> {
        cancellable(cancel, async {
            let response = self.send(self.http.delete(self.url(key_name))).await?;
            if response.status() == StatusCode::NOT_FOUND {
                tracing::debug!(key = key_name, "key already gone");
                return Ok(());
            }
            check_status(SERVICE, response).await.map(|_| ())
        })
        .await
    }
}
