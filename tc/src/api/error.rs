//! Backend API error types

use thiserror::Error;

/// Errors that can occur when talking to the backend
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Backend returned status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Service error: {0}")]
    Service(String),

    #[error("Invalid payload: {0}")]
    Invalid(String),

    #[error("JSON decode error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ApiError {
    /// Check if this error is a transport-level failure (connection refused,
    /// timeout, non-success HTTP status) as opposed to a payload-level one
    pub fn is_transport(&self) -> bool {
        matches!(self, ApiError::Network(_) | ApiError::Status { .. })
    }

    /// Check if this is a request timeout
    pub fn is_timeout(&self) -> bool {
        match self {
            ApiError::Network(e) => e.is_timeout(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_transport() {
        assert!(
            ApiError::Status {
                status: 502,
                message: "Bad gateway".to_string()
            }
            .is_transport()
        );

        assert!(!ApiError::Service("Location not found".to_string()).is_transport());
        assert!(!ApiError::Invalid("missing coordinates".to_string()).is_transport());
    }

    #[test]
    fn test_display_includes_detail() {
        let err = ApiError::Service("Error fetching weather data".to_string());
        assert!(err.to_string().contains("Error fetching weather data"));

        let err = ApiError::Status {
            status: 500,
            message: "oops".to_string(),
        };
        assert!(err.to_string().contains("500"));
    }
}
