//! API error type with IntoResponse
//!
//! Every failure becomes `{"error": {"code": ..., "message": ...}}`.
//! Internal faults are logged here and answered with an opaque message.

use std::time::Duration;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use reviewctl_core::ValidationError;
use serde_json::json;

use crate::error::ReviewError;

/// API error type with automatic HTTP status mapping
#[derive(Debug)]
pub enum ApiError {
    /// Malformed body, bad query or invalid identifier (400)
    InvalidRequest { message: String },

    /// Entity absent (404)
    NotFound { message: String },

    /// Team name taken (400)
    TeamExists { message: String },

    /// Pull request ID taken (409)
    PrExists { message: String },

    /// Reassignment on a merged pull request (409)
    PrMerged { message: String },

    /// Old reviewer not on the pull request (409)
    NotAssigned { message: String },

    /// Nobody left to assign (409)
    NoCandidate { message: String },

    /// Handler did not finish within the request timeout (408)
    Timeout { limit: Duration },

    /// Storage or other internal fault (500, logged)
    Internal { detail: String },
}

impl ApiError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidRequest { .. } | Self::TeamExists { .. } => StatusCode::BAD_REQUEST,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::PrExists { .. }
            | Self::PrMerged { .. }
            | Self::NotAssigned { .. }
            | Self::NoCandidate { .. } => StatusCode::CONFLICT,
            Self::Timeout { .. } => StatusCode::REQUEST_TIMEOUT,
            Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidRequest { .. } => "INVALID_REQUEST",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::TeamExists { .. } => "TEAM_EXISTS",
            Self::PrExists { .. } => "PR_EXISTS",
            Self::PrMerged { .. } => "PR_MERGED",
            Self::NotAssigned { .. } => "NOT_ASSIGNED",
            Self::NoCandidate { .. } => "NO_CANDIDATE",
            Self::Timeout { .. } => "REQUEST_TIMEOUT",
            Self::Internal { .. } => "INTERNAL_ERROR",
        }
    }

    fn message(&self) -> String {
        match self {
            Self::InvalidRequest { message }
            | Self::NotFound { message }
            | Self::TeamExists { message }
            | Self::PrExists { message }
            | Self::PrMerged { message }
            | Self::NotAssigned { message }
            | Self::NoCandidate { message } => message.clone(),
            Self::Timeout { limit } => format!("request exceeded {}s", limit.as_secs()),
            Self::Internal { .. } => "internal server error".to_owned(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let Self::Internal { detail } = &self {
            // Log the actual error, return generic message
            tracing::error!("Internal error: {}", detail);
        }

        let body = json!({
            "error": {
                "code": self.code(),
                "message": self.message(),
            }
        });

        (self.status(), Json(body)).into_response()
    }
}

impl From<ValidationError> for ApiError {
    fn from(e: ValidationError) -> Self {
        Self::invalid(e.to_string())
    }
}

impl From<ReviewError> for ApiError {
    fn from(e: ReviewError) -> Self {
        let message = e.to_string();
        match e {
            ReviewError::NotFound { .. } => Self::NotFound { message },
            ReviewError::TeamExists(_) => Self::TeamExists { message },
            ReviewError::PrExists(_) => Self::PrExists { message },
            ReviewError::PrMerged(_) => Self::PrMerged { message },
            ReviewError::NotAssigned { .. } => Self::NotAssigned { message },
            ReviewError::NoCandidate(_) => Self::NoCandidate { message },
            ReviewError::Database(_) | ReviewError::InvalidData(_) => {
                Self::Internal { detail: message }
            }
        }
    }
}
