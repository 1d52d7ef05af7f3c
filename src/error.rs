use crate::config::Provider;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Everything that can go wrong between a caller and one provider.
///
/// An upstream reply without usable text is not an error; adapters turn it
/// into a placeholder completion instead.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Credential absent at startup; no request was attempted
    #[error("{0} not set")]
    MissingCredential(String),

    #[error("{0}")]
    InvalidRequest(String),

    #[error("unknown provider: {0}")]
    UnknownProvider(String),

    #[error("request to {provider} timed out after {secs}s")]
    Timeout { provider: Provider, secs: u64 },

    #[error("request to {provider} failed: {source}")]
    Transport {
        provider: Provider,
        #[source]
        source: reqwest::Error,
    },

    /// Provider answered with a non-success status
    #[error("{provider} returned {status}: {message}")]
    Upstream {
        provider: Provider,
        status: reqwest::StatusCode,
        message: String,
    },

    #[error("failed to decode {provider} response: {message}")]
    Decode { provider: Provider, message: String },

    #[error("internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::UnknownProvider(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.to_string(),
        };
        (self.status_code(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use serde_json::Value;

    #[test]
    fn test_missing_credential_message() {
        let err = GatewayError::MissingCredential("GEMINI_API_KEY".to_string());
        assert_eq!(err.to_string(), "GEMINI_API_KEY not set");
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_upstream_message() {
        let err = GatewayError::Upstream {
            provider: Provider::Groq,
            status: reqwest::StatusCode::UNAUTHORIZED,
            message: "Invalid API Key".to_string(),
        };
        assert_eq!(err.to_string(), "groq returned 401 Unauthorized: Invalid API Key");
    }

    #[tokio::test]
    async fn test_into_response_shape() {
        let resp = GatewayError::InvalidRequest("prompt is required".to_string()).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body_bytes = resp.into_body().collect().await.unwrap().to_bytes();
        let json_body: Value = serde_json::from_slice(&body_bytes).unwrap();
        assert_eq!(json_body["error"], "prompt is required");
    }
}
