//! Error types for the cache layer
//!
//! Cache misses are never errors; these variants cover programmer errors,
//! configuration problems and the diagnostics API.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache layer.
#[derive(Error, Debug)]
pub enum CacheError {
    /// A local cache set was merged into a master it was not created from
    #[error("Local cache set does not belong to this master cache set")]
    MasterMismatch,

    /// The cache has been closed
    #[error("Cache closed: {0}")]
    Closed(String),

    /// Unknown cache domain name
    #[error("Unknown cache domain: {0}")]
    UnknownDomain(String),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::UnknownDomain(_) => StatusCode::NOT_FOUND,
            CacheError::InvalidRequest(_) | CacheError::InvalidConfig(_) => {
                StatusCode::BAD_REQUEST
            }
            CacheError::Closed(_) => StatusCode::SERVICE_UNAVAILABLE,
            CacheError::MasterMismatch => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache layer.
pub type Result<T> = std::result::Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_codes() {
        let response = CacheError::UnknownDomain("nope".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = CacheError::Closed("utxo".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let response = CacheError::MasterMismatch.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_error_messages() {
        let err = CacheError::InvalidConfig("tier".to_string());
        assert_eq!(err.to_string(), "Invalid configuration: tier");
    }
}
