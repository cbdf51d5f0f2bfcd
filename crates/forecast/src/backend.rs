//! Inference backend abstraction.
//!
//! The orchestrator only talks to an [`InferenceBackend`]. [`HttpBackend`] is
//! the production implementation speaking the wire contract in
//! [`crate::protocol`]; tests substitute scripted backends.

use runtime::BoxFuture;

use crate::error::InferenceError;
use crate::geojson::Feature;
use crate::protocol::{INFER_PATH, InferRequest, decode_infer_response};

/// Trait for forecast inference services.
///
/// Implementations must be `Send + Sync` for use across async tasks.
/// Methods return boxed futures for dyn-compatibility.
pub trait InferenceBackend: Send + Sync {
    /// Run inference for one grid cell.
    ///
    /// Dropping the returned future must abandon the request.
    fn infer(&self, request: InferRequest) -> BoxFuture<'_, Result<Vec<Feature>, InferenceError>>;
}

/// HTTP inference backend (`POST {api_base}/api/ai/infer`).
pub struct HttpBackend {
    endpoint: String,
    client: reqwest::Client,
}

impl HttpBackend {
    pub fn new(api_base: &str) -> Self {
        Self::with_client(api_base, reqwest::Client::new())
    }

    pub fn with_client(api_base: &str, client: reqwest::Client) -> Self {
        Self {
            endpoint: format!("{}{}", api_base.trim_end_matches('/'), INFER_PATH),
            client,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl InferenceBackend for HttpBackend {
    fn infer(&self, request: InferRequest) -> BoxFuture<'_, Result<Vec<Feature>, InferenceError>> {
        Box::pin(async move {
            let resp = self
                .client
                .post(&self.endpoint)
                .json(&request)
                .send()
                .await?;

            let status = resp.status();
            if !status.is_success() {
                let body = resp.text().await.unwrap_or_default();
                let message = if body.trim().is_empty() {
                    status.canonical_reason().unwrap_or("request failed").to_string()
                } else {
                    body
                };
                return Err(InferenceError::Status {
                    status: status.as_u16(),
                    message,
                });
            }

            let bytes = resp.bytes().await?;
            Ok(decode_infer_response(&bytes)?)
        })
    }
}
