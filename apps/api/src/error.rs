//! # API Error Type
//!
//! Unified error type for HTTP handlers.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Tienda                                 │
//! │                                                                         │
//! │  Handler: ApiResult<T>                                                  │
//! │     │                                                                   │
//! │     ├── GateError::{Unauthenticated, Forbidden} ─► 403 {message}       │
//! │     ├── GateError::InvalidCredential ────────────► 401 {error}         │
//! │     ├── DbError::NotFound ───────────────────────► 404 {error}         │
//! │     ├── DbError::UniqueViolation, CoreError,                            │
//! │     │   JSON rejection ──────────────────────────► 400 {error}         │
//! │     ├── DbError::Referenced ─────────────────────► 409 {error}         │
//! │     └── anything else ───────────────────────────► 500 {error}         │
//! │         (details logged, generic message returned)                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tienda_core::{CoreError, ValidationError};
use tienda_db::DbError;
use tracing::error;

use crate::auth::GateError;

/// Body returned for every permission failure.
pub const FORBIDDEN_MESSAGE: &str = "You don't have permissions to perform this action.";

/// Error returned from HTTP handlers.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// No credential, or the credential lacks the required permission (403)
    #[error("{}", FORBIDDEN_MESSAGE)]
    Forbidden,

    /// Credential present but undecodable or expired (401)
    #[error("Invalid authorization token")]
    InvalidCredential,

    /// Entity name, e.g. "Client" (404)
    #[error("{0} not found")]
    NotFound(String),

    /// Input validation failed (400)
    #[error("{0}")]
    Validation(String),

    /// Delete blocked by existing references (409)
    #[error("{0}")]
    Conflict(String),

    /// Unexpected fault surfaced with its message (500)
    #[error("{0}")]
    Unexpected(String),

    /// Unexpected fault with details kept in the logs (500)
    #[error("Database operation failed")]
    Internal,
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    /// Maps a failure from recording a transaction.
    ///
    /// Expected failures map as usual; any other fault keeps its message in
    /// the response body instead of the generic one.
    pub fn from_recording(err: DbError) -> Self {
        let message = err.to_string();
        match ApiError::from(err) {
            ApiError::Internal => ApiError::Unexpected(message),
            other => other,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::InvalidCredential => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Unexpected(_) | ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Builds a fresh 403 response.
pub fn forbidden() -> Response {
    (
        StatusCode::FORBIDDEN,
        Json(json!({ "message": FORBIDDEN_MESSAGE })),
    )
        .into_response()
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Forbidden => forbidden(),
            other => (other.status(), Json(json!({ "error": other.to_string() }))).into_response(),
        }
    }
}

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, .. } => ApiError::NotFound(entity),
            e @ DbError::UniqueViolation { .. } => ApiError::Validation(e.to_string()),
            DbError::Referenced { entity, .. } => {
                ApiError::Conflict(format!("{} is referenced by existing transactions", entity))
            }
            DbError::ForeignKeyViolation { message } => {
                error!("Foreign key violation: {}", message);
                ApiError::Validation("Invalid reference".to_string())
            }
            DbError::Core(e) => ApiError::from(e),
            e @ (DbError::ConnectionFailed(_)
            | DbError::MigrationFailed(_)
            | DbError::QueryFailed(_)
            | DbError::PoolExhausted
            | DbError::Internal(_)) => {
                // Log the actual error but return a generic message
                error!("Database operation failed: {}", e);
                ApiError::Internal
            }
        }
    }
}

/// Every core error is caused by the request payload.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        ApiError::Validation(err.to_string())
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::Validation(err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl From<GateError> for ApiError {
    fn from(err: GateError) -> Self {
        match err {
            GateError::Unauthenticated | GateError::Forbidden { .. } => ApiError::Forbidden,
            GateError::InvalidCredential => ApiError::InvalidCredential,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use tienda_core::Permission;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_forbidden_body_is_identical_for_every_cause() {
        let missing = ApiError::from(GateError::Unauthenticated).into_response();
        let lacking = ApiError::from(GateError::Forbidden {
            user: "ana".to_string(),
            permission: Permission::DeleteClient,
        })
        .into_response();

        assert_eq!(missing.status(), StatusCode::FORBIDDEN);
        assert_eq!(lacking.status(), StatusCode::FORBIDDEN);
        let expected = json!({ "message": FORBIDDEN_MESSAGE });
        assert_eq!(body_json(missing).await, expected);
        assert_eq!(body_json(lacking).await, expected);
    }

    #[tokio::test]
    async fn test_db_errors_map_to_statuses() {
        let not_found = ApiError::from(DbError::not_found("Product", "P9")).into_response();
        assert_eq!(not_found.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(not_found).await, json!({ "error": "Product not found" }));

        let duplicate = ApiError::from(DbError::UniqueViolation {
            field: "email".to_string(),
        });
        assert_eq!(duplicate.status(), StatusCode::BAD_REQUEST);
        assert_eq!(duplicate.to_string(), "email already exists");

        let referenced = ApiError::from(DbError::Referenced {
            entity: "Client".to_string(),
            id: "123".to_string(),
        });
        assert_eq!(referenced.status(), StatusCode::CONFLICT);

        let internal = ApiError::from(DbError::QueryFailed("disk I/O error".to_string()));
        assert_eq!(internal.to_string(), "Database operation failed");
    }

    #[test]
    fn test_recording_faults_keep_their_message() {
        let err = ApiError::from_recording(DbError::PoolExhausted);
        assert!(matches!(err, ApiError::Unexpected(ref m) if m == "Connection pool exhausted"));

        let err = ApiError::from_recording(DbError::not_found("Client", "1"));
        assert!(matches!(err, ApiError::NotFound(ref e) if e == "Client"));
    }
}
