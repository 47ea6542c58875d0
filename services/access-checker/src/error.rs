//! Error types for access checks and their HTTP mapping

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

/// Upstream failure carried as the source of a lookup error
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors raised by an identity-group lookup
#[derive(Debug, Error)]
pub enum IdentityLookupError {
    /// The identity provider has no such user
    #[error("user not found: {0}")]
    UserNotFound(String),

    /// Resolving the user failed upstream
    #[error("user not found: {email}: {source}")]
    UserLookupFailed {
        email: String,
        #[source]
        source: BoxError,
    },

    /// A membership query for one group failed
    #[error("failed to check {group} access: {source}")]
    MembershipQueryFailed {
        group: String,
        #[source]
        source: BoxError,
    },
}

/// Errors raised by a cloud-identity lookup
#[derive(Debug, Error)]
pub enum CloudLookupError {
    /// Credentials or profile configuration could not be loaded
    #[error("failed to load AWS config: {0}")]
    ConfigLoadFailed(String),

    /// The caller identity query failed
    #[error("failed to get AWS caller identity: {0}")]
    IdentityQueryFailed(String),
}

/// Errors surfaced by the access aggregator
#[derive(Debug, Error)]
pub enum AccessCheckError {
    /// Malformed or missing request input
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Identity(#[from] IdentityLookupError),

    #[error(transparent)]
    Cloud(#[from] CloudLookupError),
}

impl AccessCheckError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AccessCheckError::Validation(_) => StatusCode::BAD_REQUEST,
            AccessCheckError::Identity(_) | AccessCheckError::Cloud(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AccessCheckError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let payload = Json(ErrorResponse {
            error: self.to_string(),
        });

        (status, payload).into_response()
    }
}
