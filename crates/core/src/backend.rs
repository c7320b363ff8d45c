//! Remote Game Backend
//!
//! The orchestrator consumes the image-generation and detection endpoints
//! through the [`GameBackend`] trait; [`HttpGameBackend`] is the production
//! implementation over plain JSON-over-HTTP. Payload field names follow the
//! wire contract (`imageBase64`), and image payloads are checked to be
//! decodable base64 so a malformed response surfaces as a failed request
//! instead of a broken grid.

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// The ways a remote call can fail. The orchestrator treats them all the
/// same; the split only matters for logging.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("backend returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("transport error: {0}")]
    Transport(String),
    #[error("malformed backend response: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        BackendError::Transport(err.to_string())
    }
}

/// A single generated image as returned by the generation endpoint.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedImage {
    pub prompt: String,
    pub image_base64: String,
}

/// Response of the generation endpoint: a (possibly empty) image batch.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct GeneratedImages {
    pub images: Vec<GeneratedImage>,
}

/// Response of the detection endpoint: how confidently the detector matched
/// the image to the prompt, plus the image it analysed.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Detection {
    pub prompt: String,
    pub score: f64,
    pub image_base64: String,
}

/// The remote operations the game consumes, as an opaque contract.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GameBackend: Send + Sync {
    /// Requests a batch of candidate images for a prompt.
    async fn generate(&self, prompt: &str) -> Result<GeneratedImages, BackendError>;

    /// Asks the detector to score how well `image` matches `prompt`.
    ///
    /// `image` may be raw base64 or a `data:` URL. Scores outside 0-100 are
    /// passed through untouched; the scoring engine clamps them.
    async fn detect(&self, prompt: &str, image: &str) -> Result<Detection, BackendError>;
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    prompt: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DetectRequest<'a> {
    prompt: &'a str,
    image_base64: &'a str,
}

/// Checks that an image payload is decodable base64, tolerating a
/// `data:` URL prefix.
fn ensure_decodable(label: &str, payload: &str) -> Result<(), BackendError> {
    let raw = payload.rsplit(',').next().unwrap_or(payload);
    BASE64
        .decode(raw)
        .map(|_| ())
        .map_err(|err| BackendError::Malformed(format!("{label} is not valid base64: {err}")))
}

/// Production implementation of [`GameBackend`].
pub struct HttpGameBackend {
    client: reqwest::Client,
    base_url: String,
}

impl HttpGameBackend {
    /// Creates a backend client for the service rooted at `base_url`.
    ///
    /// Timeouts and connection policy belong to the `reqwest::Client` the
    /// caller hands in.
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    async fn read_failure(response: reqwest::Response) -> BackendError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        BackendError::Status { status, body }
    }
}

#[async_trait]
impl GameBackend for HttpGameBackend {
    async fn generate(&self, prompt: &str) -> Result<GeneratedImages, BackendError> {
        let url = format!("{}/generate", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&GenerateRequest { prompt })
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Self::read_failure(response).await);
        }

        let payload: GeneratedImages = response
            .json()
            .await
            .map_err(|err| BackendError::Malformed(err.to_string()))?;
        for image in &payload.images {
            ensure_decodable("generated image", &image.image_base64)?;
        }
        debug!(images = payload.images.len(), "generation response decoded");
        Ok(payload)
    }

    async fn detect(&self, prompt: &str, image: &str) -> Result<Detection, BackendError> {
        let url = format!("{}/detect", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&DetectRequest {
                prompt,
                image_base64: image,
            })
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Self::read_failure(response).await);
        }

        let payload: Detection = response
            .json()
            .await
            .map_err(|err| BackendError::Malformed(err.to_string()))?;
        ensure_decodable("detected image", &payload.image_base64)?;
        debug!(score = payload.score, "detection response decoded");
        Ok(payload)
    }
}
