//! # Application Errors
//!
//! `AppError` wraps engine errors and adds the failures only the binary can
//! hit: configuration, file I/O, malformed requests.

use atomspace_core::AtomSpaceError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Store(#[from] AtomSpaceError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Stable machine-readable error kind.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Store(e) => match e {
                AtomSpaceError::NotFound(_) => "not_found",
                AtomSpaceError::ReferentialIntegrityViolation { .. } => {
                    "referential_integrity_violation"
                }
                AtomSpaceError::UnboundVariable(_) => "unbound_variable",
                AtomSpaceError::TypeUndeclared(_) => "type_undeclared",
                AtomSpaceError::TypeConflict { .. } => "type_conflict",
                AtomSpaceError::InvalidAtom(_) => "invalid_atom",
                AtomSpaceError::InvalidTruthValue { .. } => "invalid_truth_value",
                AtomSpaceError::InvalidPattern(_) => "invalid_pattern",
            },
            Self::Config(_) => "config",
            Self::Io(_) => "io",
            Self::InvalidRequest(_) => "invalid_request",
            Self::Internal(_) => "internal",
        }
    }

    /// HTTP status for this error.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Store(AtomSpaceError::NotFound(_)) => StatusCode::NOT_FOUND,
            Self::Store(
                AtomSpaceError::ReferentialIntegrityViolation { .. }
                | AtomSpaceError::TypeConflict { .. },
            ) => StatusCode::CONFLICT,
            Self::Store(_) | Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::Config(_) | Self::Io(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// JSON body of every error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    /// Referencing links, for refused removals.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub referrers: Vec<u64>,
}

impl From<&AppError> for ErrorResponse {
    fn from(err: &AppError) -> Self {
        let referrers = match err {
            AppError::Store(AtomSpaceError::ReferentialIntegrityViolation { referrers, .. }) => {
                referrers.iter().map(|h| h.value()).collect()
            }
            _ => Vec::new(),
        };
        Self {
            error: err.kind().to_string(),
            message: err.to_string(),
            referrers,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, "request rejected");
        }
        (status, Json(ErrorResponse::from(&self))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use atomspace_core::Handle;

    #[test]
    fn status_mapping() {
        assert_eq!(
            AppError::from(AtomSpaceError::NotFound(Handle(1))).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::from(AtomSpaceError::ReferentialIntegrityViolation {
                handle: Handle(1),
                referrers: vec![Handle(2)],
            })
            .status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::from(AtomSpaceError::UnboundVariable("$X".into())).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Config("bad".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn error_body_lists_referrers() {
        let err = AppError::from(AtomSpaceError::ReferentialIntegrityViolation {
            handle: Handle(1),
            referrers: vec![Handle(2), Handle(3)],
        });
        let body = ErrorResponse::from(&err);
        assert_eq!(body.error, "referential_integrity_violation");
        assert_eq!(body.referrers, vec![2, 3]);
    }
}
