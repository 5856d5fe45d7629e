//! HTTP Error Types

use checkout_core::ServiceError;
use thiserror::Error;

/// Transport-level failures talking to the payment service
#[derive(Error, Debug)]
pub enum HttpError {
    #[error("Network error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Payment service returned HTTP {0}")]
    Status(u16),
}

impl From<HttpError> for ServiceError {
    fn from(err: HttpError) -> Self {
        Self::Transport(err.to_string())
    }
}
