use std::time::Duration;

use thiserror::Error;

use crate::disaster::RequestKey;

/// Failure of a single grid-cell inference request.
///
/// Every variant is recovered at the cell level by the orchestrator; none of
/// them aborts a cycle.
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("inference backend returned HTTP {status}: {message}")]
    Status { status: u16, message: String },
    #[error("inference request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("inference response could not be decoded: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("inference request timed out after {0:?}")]
    Timeout(Duration),
    #[error("inference request {0} was aborted")]
    Aborted(RequestKey),
}

impl InferenceError {
    /// True for intentional cancellation, which is not reported as a failure.
    pub fn is_abort(&self) -> bool {
        matches!(self, InferenceError::Aborted(_))
    }

    /// HTTP-like status code, when the failure carries one.
    pub fn status(&self) -> Option<u16> {
        match self {
            InferenceError::Status { status, .. } => Some(*status),
            InferenceError::Transport(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
