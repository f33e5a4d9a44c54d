//! Thin client for the downstream image generation service.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;
use url::Url;

const IMAGE_SIZE: &str = "1024x1024";

/// Error codes that describe the prompt rather than our account or request.
const USER_ATTRIBUTABLE_CODES: &[&str] = &["content_policy_violation"];
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Why an image could not be produced.
#[derive(Debug, Error)]
pub enum ImageError {
    /// The service refused the prompt. The user's problem.
    #[error("prompt rejected: {0}")]
    Rejected(String),

    /// The service is throttling us. The user's problem; try later.
    #[error("rate limited by image service")]
    RateLimited,

    /// The service answered but the image could not be decoded.
    #[error("malformed image response: {0}")]
    Malformed(String),

    /// The service turned the request down for a reason the user cannot fix
    /// (billing, bad parameters).
    #[error("image service refused request ({status}): {message}")]
    Refused {
        status: u16,
        code: Option<String>,
        message: String,
    },

    #[error("image service returned {0}")]
    Status(u16),

    #[error("HTTP error: {0}")]
    Transport(#[from] reqwest::Error),
}

pub const RATE_LIMITED_MESSAGE: &str =
    "The image service is busy right now. Please try again in a minute.";

impl ImageError {
    /// What to tell the user when the failure is theirs to deal with.
    /// `None` means the operator should hear about it.
    pub fn user_message(&self) -> Option<String> {
        match self {
            Self::Rejected(reason) => Some(format!(
                "The image service declined that prompt: {reason}"
            )),
            Self::RateLimited => Some(RATE_LIMITED_MESSAGE.to_string()),
            _ => None,
        }
    }
}

/// Anything that turns a prompt into PNG bytes.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<Vec<u8>, ImageError>;
}

#[derive(Serialize)]
struct GenerationRequest<'a> {
    prompt: &'a str,
    n: u8,
    size: &'a str,
    response_format: &'a str,
}

#[derive(Deserialize)]
struct GenerationResponse {
    data: Vec<GeneratedImage>,
}

#[derive(Deserialize)]
struct GeneratedImage {
    b64_json: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    code: Option<String>,
}

/// Image client authenticated with the key fetched from the secret store.
pub struct ImageClient {
    http_client: reqwest::Client,
    endpoint: Url,
    api_key: String,
}

impl ImageClient {
    pub fn new(http_client: reqwest::Client, endpoint: Url, api_key: impl Into<String>) -> Self {
        Self {
            http_client,
            endpoint,
            api_key: api_key.into(),
        }
    }
}

#[async_trait]
impl ImageGenerator for ImageClient {
    async fn generate(&self, prompt: &str) -> Result<Vec<u8>, ImageError> {
        debug!(prompt_len = prompt.len(), "Requesting image");
        let response = self
            .http_client
            .post(self.endpoint.clone())
            .bearer_auth(&self.api_key)
            .timeout(REQUEST_TIMEOUT)
            .json(&GenerationRequest {
                prompt,
                n: 1,
                size: IMAGE_SIZE,
                response_format: "b64_json",
            })
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;
        classify(status, &body)
    }
}

/// Map a raw service answer onto PNG bytes or a classified error.
fn classify(status: StatusCode, body: &[u8]) -> Result<Vec<u8>, ImageError> {
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(ImageError::RateLimited);
    }
    if status == StatusCode::BAD_REQUEST {
        if let Ok(ErrorEnvelope { error }) = serde_json::from_slice::<ErrorEnvelope>(body) {
            let user_attributable = error
                .code
                .as_deref()
                .is_some_and(|code| USER_ATTRIBUTABLE_CODES.contains(&code));
            if user_attributable {
                return Err(ImageError::Rejected(error.message));
            }
            return Err(ImageError::Refused {
                status: status.as_u16(),
                code: error.code,
                message: error.message,
            });
        }
        return Err(ImageError::Status(status.as_u16()));
    }
    if !status.is_success() {
        return Err(ImageError::Status(status.as_u16()));
    }

    let parsed: GenerationResponse =
        serde_json::from_slice(body).map_err(|e| ImageError::Malformed(e.to_string()))?;
    let encoded = parsed
        .data
        .into_iter()
        .next()
        .and_then(|image| image.b64_json)
        .ok_or_else(|| ImageError::Malformed("no image in response".to_string()))?;
    STANDARD
        .decode(encoded.as_bytes())
        .map_err(|e| ImageError::Malformed(e.to_string()))
}
