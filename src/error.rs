use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

/// Failures on the request path. Every variant renders as
/// `{ "success": false, "error": ..., "details"?: ... }`.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("{0}")]
    MissingField(&'static str),

    #[error("Invalid request body")]
    InvalidBody(#[source] serde_json::Error),

    #[error("Too many requests, please try again later.")]
    RateLimited,

    #[error("Server configuration error: OpenAI API key not set")]
    NotConfigured,

    #[error("OpenAI API error: {}", .status.as_u16())]
    Upstream {
        status: StatusCode,
        body: String,
        /// Whether the upstream body is echoed back as `details`.
        expose_body: bool,
    },

    #[error("Invalid response from OpenAI")]
    InvalidUpstream,

    #[error("Server error processing request")]
    Transport(#[from] reqwest::Error),

    #[error("Failed to parse nutrition data")]
    Unparseable { raw: String },
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    success: bool,
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl RelayError {
    pub fn status(&self) -> StatusCode {
        match self {
            RelayError::MissingField(_) | RelayError::InvalidBody(_) => StatusCode::BAD_REQUEST,
            RelayError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            RelayError::Upstream { status, .. } => *status,
            RelayError::NotConfigured
            | RelayError::InvalidUpstream
            | RelayError::Transport(_)
            | RelayError::Unparseable { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Routes that return raw documents also return the upstream error body.
    pub fn with_upstream_details(self) -> Self {
        match self {
            RelayError::Upstream { status, body, .. } => RelayError::Upstream {
                status,
                body,
                expose_body: true,
            },
            other => other,
        }
    }

    fn details(&self) -> Option<String> {
        match self {
            RelayError::Upstream {
                body,
                expose_body: true,
                ..
            } => Some(body.clone()),
            _ => None,
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            RelayError::Upstream { body, .. } => {
                log::error!("❌ {} body: {}", self, body)
            }
            RelayError::Unparseable { raw } => {
                log::error!("❌ {}: {}", self, crate::nutrition::parser::truncate(raw, 200))
            }
            RelayError::Transport(err) => log::error!("❌ Upstream request failed: {}", err),
            RelayError::InvalidBody(err) => log::warn!("⚠️ Invalid request body: {}", err),
            _ => log::warn!("⚠️ {} ({})", self, status),
        }

        let body = ErrorBody {
            success: false,
            error: self.to_string(),
            details: self.details(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            RelayError::MissingField("Food name is required").status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(RelayError::RateLimited.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(RelayError::NotConfigured.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let upstream = RelayError::Upstream {
            status: StatusCode::UNAUTHORIZED,
            body: "bad key".to_string(),
            expose_body: false,
        };
        assert_eq!(upstream.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(upstream.to_string(), "OpenAI API error: 401");
    }

    #[test]
    fn test_upstream_details_are_opt_in() {
        let upstream = RelayError::Upstream {
            status: StatusCode::TOO_MANY_REQUESTS,
            body: "quota exceeded".to_string(),
            expose_body: false,
        };
        assert_eq!(upstream.details(), None);
        assert_eq!(
            upstream.with_upstream_details().details().as_deref(),
            Some("quota exceeded")
        );
        assert_eq!(RelayError::InvalidUpstream.with_upstream_details().details(), None);
    }

    #[test]
    fn test_transport_failures_stay_generic() {
        let err = reqwest::Client::new()
            .get("not a url")
            .build()
            .expect_err("relative URL must not build");
        let transport = RelayError::from(err).with_upstream_details();

        assert_eq!(transport.to_string(), "Server error processing request");
        assert_eq!(transport.details(), None);
        assert_eq!(transport.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
