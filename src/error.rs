use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use rust_decimal::Decimal;
use std::time::Duration;
use thiserror::Error;

use crate::models::ErrorBody;
use crate::validation::ValidationError;

// Every failure a balance check can end in. Each variant maps to one HTTP
// status and one `category` in the error envelope.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    InvalidRequest(String),

    #[error("Too many requests. Please wait before trying again.")]
    RateLimited { retry_after: Duration },

    #[error("Insufficient token balance: {balance} held, {minimum} required.")]
    InsufficientBalance { balance: Decimal, minimum: Decimal },

    #[error("Unexpected response from RPC provider: {0}")]
    ProviderFormat(String),

    #[error("RPC provider returned error {code}: {message}")]
    ProviderRpc { code: i64, message: String },

    #[error("Could not reach RPC provider: {0}")]
    Network(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AppError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            AppError::InsufficientBalance { .. } => StatusCode::FORBIDDEN,
            AppError::ProviderFormat(_)
            | AppError::ProviderRpc { .. }
            | AppError::Network(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn category(&self) -> &'static str {
        match self {
            AppError::InvalidRequest(_) => "invalid_request",
            AppError::RateLimited { .. } => "rate_limited",
            AppError::InsufficientBalance { .. } => "insufficient_balance",
            AppError::ProviderFormat(_) | AppError::ProviderRpc { .. } => "upstream_format",
            AppError::Network(_) => "upstream_unavailable",
        }
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::InvalidRequest(err.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AppError::Network("request timed out".to_string())
        } else {
            AppError::Network(err.to_string())
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorBody {
            success: false,
            category: self.category(),
            error: self.to_string(),
        };
        let mut response = (status, Json(body)).into_response();

        if let AppError::RateLimited { retry_after } = self {
            // round up so clients never retry into the same window
            let secs = retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0);
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(secs.max(1)));
        }
        response
    }
}

// Startup failures, kept apart from per-request errors.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to initialize logging: {0}")]
    Logging(String),

    #[error("invalid RPC url {url:?}: {reason}")]
    InvalidRpcUrl { url: String, reason: String },

    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
