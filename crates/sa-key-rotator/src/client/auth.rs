//! OAuth access tokens for the Google APIs.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::client::{check_status, http_client, Endpoints};
use crate::error::{RemoteService, Result, RotatorError};

/// Environment variable holding a ready-made bearer token.
pub const ACCESS_TOKEN_ENV: &str = "GOOGLE_OAUTH_ACCESS_TOKEN";

/// Tokens are refreshed this long before they expire.
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// Supplies bearer tokens for authenticated requests.
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn access_token(&self) -> Result<String>;
}

/// A fixed token, typically from `GOOGLE_OAUTH_ACCESS_TOKEN`.
pub struct StaticTokenSource {
    token: String,
}

impl StaticTokenSource {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl TokenSource for StaticTokenSource {
    async fn access_token(&self) -> Result<String> {
        Ok(self.token.clone())
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

struct CachedToken {
    token: String,
    refresh_at: Instant,
}

/// Tokens of the compute instance's attached service account.
pub struct MetadataTokenSource {
    http: reqwest::Client,
    url: String,
    cached: Mutex<Option<CachedToken>>,
}

impl MetadataTokenSource {
    pub fn new(metadata_base: &str) -> Result<Self> {
        Ok(Self {
            http: http_client(RemoteService::TokenSource, Some(Duration::from_secs(5)))?,
            url: format!(
                "{}/computeMetadata/v1/instance/service-accounts/default/token",
                metadata_base.trim_end_matches('/')
            ),
            cached: Mutex::new(None),
        })
    }

    async fn fetch(&self) -> Result<TokenResponse> {
        let response = self
            .http
            .get(&self.url)
            .header("Metadata-Flavor", "Google")
            .send()
            .await
            .map_err(|e| RotatorError::remote(RemoteService::TokenSource, e))?;
        check_status(RemoteService::TokenSource, response)
            .await?
            .json::<TokenResponse>()
            .await
            .map_err(|e| RotatorError::Parse(format!("metadata token response: {e}")))
    }
}

#[async_trait]
impl TokenSource for MetadataTokenSource {
    async fn access_token(&self) -> Result<String> {
        let mut cached = self.cached.lock().await;
        if let Some(entry) = cached.as_ref() {
            if Instant::now() < entry.refresh_at {
                return Ok(entry.token.clone());
            }
        }

        let fresh = self.fetch().await?;
        let lifetime = Duration::from_secs(fresh.expires_in).saturating_sub(EXPIRY_MARGIN);
        tracing::debug!(expires_in = fresh.expires_in, "fetched metadata access token");
        *cached = Some(CachedToken {
            token: fresh.access_token.clone(),
            refresh_at: Instant::now() + lifetime,
        });
        Ok(fresh.access_token)
    }
}

/// `GOOGLE_OAUTH_ACCESS_TOKEN` when set, the metadata server otherwise.
pub fn default_token_source(endpoints: &Endpoints) -> Result<Arc<dyn TokenSource>> {
    match std::env::var(ACCESS_TOKEN_ENV) {
        Ok(token) if !token.trim().is_empty() => {
            Ok(Arc::new(StaticTokenSource::new(token.trim())))
        }
        _ => Ok(Arc::new(MetadataTokenSource::new(&endpoints.metadata)?)),
    }
}
