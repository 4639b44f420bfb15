use crate::models::{AnalysisKind, ResultStatus};
use crate::validation::ValidationError;
use actix_web::http::{header, StatusCode};
use actix_web::{HttpResponse, ResponseError};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

/// Public error taxonomy of the orchestration layer
///
/// Messages are stable and carry no predictor internals; failure details are
/// logged where the error is created.
#[derive(Debug, Error)]
pub enum OrchestrationError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Unsupported analysis kind: {0}")]
    UnsupportedKind(AnalysisKind),

    #[error("{kind} prediction timed out after {}ms", .timeout.as_millis())]
    Timeout { kind: AnalysisKind, timeout: Duration },

    #[error("{kind} prediction failed")]
    Predictor { kind: AnalysisKind },
}

impl OrchestrationError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_error",
            Self::UnsupportedKind(_) => "unsupported_kind",
            Self::Timeout { .. } => "timeout",
            Self::Predictor { .. } => "predictor_error",
        }
    }

    pub fn kind(&self) -> Option<AnalysisKind> {
        match self {
            Self::Validation(_) => None,
            Self::UnsupportedKind(kind) | Self::Timeout { kind, .. } | Self::Predictor { kind } => {
                Some(*kind)
            }
        }
    }

    /// Whether a descriptor-level retry policy may try again
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::Predictor { .. })
    }

    /// Log error with appropriate level
    pub fn log(&self) {
        match self {
            Self::Validation(_) | Self::UnsupportedKind(_) => {
                tracing::debug!(error = %self, code = self.code(), "Client error");
            }
            Self::Timeout { .. } => {
                tracing::warn!(error = %self, code = self.code(), "Predictor timed out");
            }
            Self::Predictor { .. } => {
                tracing::error!(error = %self, code = self.code(), "Predictor failure");
            }
        }
    }
}

impl ResponseError for OrchestrationError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::UnsupportedKind(_) => StatusCode::NOT_FOUND,
            Self::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            Self::Predictor { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let reason = match self {
            Self::Validation(err) => Some(err.reason()),
            _ => None,
        };

        HttpResponse::build(self.status_code()).json(ErrorEnvelope::new(
            self.kind(),
            self.code(),
            reason,
            self.to_string(),
        ))
    }
}

/// Credential failures raised by the auth gate before the core is reached
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Missing Authorization header")]
    MissingCredentials,

    #[error("Authorization header must use the Bearer scheme")]
    InvalidScheme,

    #[error("Token has expired")]
    Expired,

    #[error("Invalid token")]
    InvalidToken,
}

impl AuthError {
    pub fn reason(&self) -> &'static str {
        match self {
            Self::MissingCredentials => "missing_credentials",
            Self::InvalidScheme => "invalid_scheme",
            Self::Expired => "token_expired",
            Self::InvalidToken => "invalid_token",
        }
    }
}

impl ResponseError for AuthError {
    fn status_code(&self) -> StatusCode {
        StatusCode::UNAUTHORIZED
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::Unauthorized()
            .insert_header((header::WWW_AUTHENTICATE, "Bearer"))
            .json(ErrorEnvelope::new(
                None,
                "auth_error",
                Some(self.reason()),
                self.to_string(),
            ))
    }
}

/// Error body returned for every failed request
#[derive(Debug, Serialize)]
pub struct ErrorEnvelope {
    pub status: ResultStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<AnalysisKind>,
    pub error: ErrorDetail,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<&'static str>,
    pub message: String,
}

impl ErrorEnvelope {
    pub fn new(
        kind: Option<AnalysisKind>,
        code: &'static str,
        reason: Option<&'static str>,
        message: String,
    ) -> Self {
        Self {
            status: ResultStatus::Failure,
            kind,
            error: ErrorDetail {
                code,
                reason,
                message,
            },
            generated_at: Utc::now(),
        }
    }
}
