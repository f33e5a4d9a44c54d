//! Secret store access.

use crate::{SecretError, SecretResult};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Default Secret Manager REST endpoint.
pub const DEFAULT_SECRET_MANAGER_URL: &str = "https://secretmanager.googleapis.com/v1";

/// Default metadata-server endpoint for the runtime service account token.
pub const DEFAULT_METADATA_TOKEN_URL: &str =
    "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// A named secret scoped to a project/namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretRef {
    pub project_id: String,
    pub secret_id: String,
}

impl SecretRef {
    pub fn new(project_id: impl Into<String>, secret_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            secret_id: secret_id.into(),
        }
    }

    /// Resource path of the latest version.
    pub fn latest_version_path(&self) -> String {
        format!(
            "projects/{}/secrets/{}/versions/latest",
            self.project_id, self.secret_id
        )
    }
}

impl fmt::Display for SecretRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.project_id, self.secret_id)
    }
}

/// Trait for secret store backends.
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Fetch the latest version of a secret as text.
    async fn access_latest(&self, secret: &SecretRef) -> SecretResult<String>;
}

/// Source of bearer tokens for the secret store.
#[async_trait]
pub trait AccessTokenSource: Send + Sync {
    async fn access_token(&self) -> SecretResult<String>;
}

#[derive(Deserialize)]
struct MetadataToken {
    access_token: String,
}

/// Fetches the runtime service account's token from the metadata server.
pub struct MetadataTokenSource {
    http_client: reqwest::Client,
    url: String,
}

impl MetadataTokenSource {
    pub fn new(http_client: reqwest::Client) -> Self {
        Self::with_url(http_client, DEFAULT_METADATA_TOKEN_URL)
    }

    pub fn with_url(http_client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            http_client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl AccessTokenSource for MetadataTokenSource {
    async fn access_token(&self) -> SecretResult<String> {
        let response = self
            .http_client
            .get(&self.url)
            .header("Metadata-Flavor", "Google")
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SecretError::Token(format!(
                "metadata server returned {}",
                response.status()
            )));
        }

        let token: MetadataToken = response.json().await?;
        Ok(token.access_token)
    }
}

#[derive(Debug, Deserialize)]
struct AccessSecretVersionResponse {
    payload: SecretPayload,
}

#[derive(Debug, Deserialize)]
struct SecretPayload {
    data: String,
}

/// Secret Manager REST client.
pub struct SecretManagerStore {
    http_client: reqwest::Client,
    base_url: String,
    tokens: Arc<dyn AccessTokenSource>,
}

impl SecretManagerStore {
    pub fn new(http_client: reqwest::Client, tokens: Arc<dyn AccessTokenSource>) -> Self {
        Self::with_base_url(http_client, DEFAULT_SECRET_MANAGER_URL, tokens)
    }

    pub fn with_base_url(
        http_client: reqwest::Client,
        base_url: impl Into<String>,
        tokens: Arc<dyn AccessTokenSource>,
    ) -> Self {
        Self {
            http_client,
            base_url: base_url.into(),
            tokens,
        }
    }

    fn access_url(&self, secret: &SecretRef) -> String {
        format!(
            "{}/{}:access",
            self.base_url.trim_end_matches('/'),
            secret.latest_version_path()
        )
    }
}

#[async_trait]
impl SecretStore for SecretManagerStore {
    async fn access_latest(&self, secret: &SecretRef) -> SecretResult<String> {
        let token = self.tokens.access_token().await?;
        let url = self.access_url(secret);
        debug!(secret = %secret, "Fetching latest secret version");

        let response = self
            .http_client
            .get(&url)
            .bearer_auth(token)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SecretError::Status {
                status: response.status().as_u16(),
                secret: secret.to_string(),
            });
        }

        let body: AccessSecretVersionResponse = response.json().await?;
        decode_payload(&body.payload)
    }
}

fn decode_payload(payload: &SecretPayload) -> SecretResult<String> {
    let bytes = STANDARD
        .decode(payload.data.as_bytes())
        .map_err(|e| SecretError::Decode(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| SecretError::Decode(e.to_string()))
}
