//! # Permission Gate
//!
//! JWT credential decoding and per-route permission checks.
//!
//! ## Request Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Request ──► require_permission (middleware, keyed by Resource)        │
//! │                 │                                                       │
//! │                 ├── method ──► Verb ──► required_permission(res, verb) │
//! │                 │                                                       │
//! │                 ├── no `authorization` header ──► 403                  │
//! │                 ├── decode fails ───────────────► 401                  │
//! │                 ├── permission missing ─────────► 403                  │
//! │                 │                                                       │
//! │                 └── granted: Caller in extensions ──► handler          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Tokens are issued elsewhere; this module only verifies them.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use tienda_core::permissions::{parse_permissions, required_permission, Resource, Verb};
use tienda_core::Permission;
use tracing::{debug, info};

use crate::error::{forbidden, ApiError};
use crate::state::AppState;

// =============================================================================
// Credentials
// =============================================================================

/// JWT claims structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Acting user, used for audit logging
    pub user: String,

    /// Permission names such as `CREATE_TRANSACTION`
    #[serde(default)]
    pub permissions: Vec<String>,

    /// Expiration (Unix timestamp)
    pub exp: i64,
}

/// A decoded credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub user: String,
    pub permissions: Vec<Permission>,
}

/// Turns a raw `authorization` header value into a credential.
pub trait CredentialDecoder: Send + Sync {
    fn decode(&self, raw: &str) -> Result<Credential, GateError>;
}

/// HS256 JWT decoder with `exp` validation.
pub struct JwtDecoder {
    key: DecodingKey,
    validation: Validation,
}

impl JwtDecoder {
    pub fn new(secret: &str) -> Self {
        JwtDecoder {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }
}

impl CredentialDecoder for JwtDecoder {
    fn decode(&self, raw: &str) -> Result<Credential, GateError> {
        let token = raw.strip_prefix("Bearer ").unwrap_or(raw).trim();

        let data = decode::<Claims>(token, &self.key, &self.validation).map_err(|e| {
            debug!(error = %e, "Rejected authorization token");
            GateError::InvalidCredential
        })?;

        Ok(Credential {
            user: data.claims.user,
            // Unknown names are ignored
            permissions: parse_permissions(&data.claims.permissions),
        })
    }
}

// =============================================================================
// Gate
// =============================================================================

/// Why a request was not let through.
#[derive(Debug, thiserror::Error)]
pub enum GateError {
    #[error("Missing authorization header")]
    Unauthenticated,

    #[error("Invalid authorization token")]
    InvalidCredential,

    #[error("User {user} lacks {permission}")]
    Forbidden { user: String, permission: Permission },
}

/// The authenticated user of a request, set by [`require_permission`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub user: String,
}

/// Checks credentials against the permission an operation requires.
#[derive(Clone)]
pub struct PermissionGate {
    decoder: Arc<dyn CredentialDecoder>,
}

impl PermissionGate {
    pub fn new(decoder: Arc<dyn CredentialDecoder>) -> Self {
        PermissionGate { decoder }
    }

    /// Authorizes a request for `required`.
    ///
    /// ## Errors
    /// - `Unauthenticated` when there is no `authorization` header
    /// - `InvalidCredential` when the header cannot be decoded
    /// - `Forbidden` when the credential lacks `required`
    pub fn authorize(&self, headers: &HeaderMap, required: Permission) -> Result<Caller, GateError> {
        let Some(value) = headers.get(AUTHORIZATION) else {
            info!(permission = %required, "Permission denied: no authorization header");
            return Err(GateError::Unauthenticated);
        };

        let credential = value
            .to_str()
            .map_err(|_| GateError::InvalidCredential)
            .and_then(|raw| self.decoder.decode(raw))
            .map_err(|err| {
                info!(
                    permission = %required,
                    error = %err,
                    "Permission denied: unreadable credential"
                );
                err
            })?;

        if !credential.permissions.contains(&required) {
            info!(user = %credential.user, permission = %required, "Permission denied");
            return Err(GateError::Forbidden {
                user: credential.user,
                permission: required,
            });
        }

        info!(user = %credential.user, permission = %required, "Permission granted");
        Ok(Caller {
            user: credential.user,
        })
    }
}

/// Middleware enforcing the policy table for one resource.
///
/// ```rust,ignore
/// router.route_layer(middleware::from_fn_with_state(
///     (state.clone(), Resource::Client),
///     require_permission,
/// ))
/// ```
pub async fn require_permission(
    State((state, resource)): State<(Arc<AppState>, Resource)>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(verb) = Verb::from_http_method(request.method().as_str()) else {
        info!(
            method = %request.method(),
            resource = %resource,
            "Permission denied: unsupported method"
        );
        return forbidden();
    };
    let required = required_permission(resource, verb);

    match state.gate.authorize(request.headers(), required) {
        Ok(caller) => {
            request.extensions_mut().insert(caller);
            next.run(request).await
        }
        Err(err) => ApiError::from(err).into_response(),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{mint_token, TEST_SECRET};
    use axum::http::HeaderValue;

    fn gate() -> PermissionGate {
        PermissionGate::new(Arc::new(JwtDecoder::new(TEST_SECRET)))
    }

    /// Shared buffer the fmt subscriber writes into.
    #[derive(Clone, Default)]
    struct LogBuffer(Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    /// Runs `f` under an info-level subscriber and returns what it logged.
    fn capture_logs<T>(f: impl FnOnce() -> T) -> (T, String) {
        let buffer = LogBuffer::default();
        let writer = buffer.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();

        let result = tracing::subscriber::with_default(subscriber, f);
        let logs = String::from_utf8_lossy(&buffer.0.lock().unwrap()).into_owned();
        (result, logs)
    }

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_missing_header_is_unauthenticated() {
        let result = gate().authorize(&HeaderMap::new(), Permission::ViewClient);
        assert!(matches!(result, Err(GateError::Unauthenticated)));
    }

    #[test]
    fn test_grants_with_and_without_bearer_prefix() {
        let token = mint_token("ana", &["VIEW_CLIENT"]);

        let caller = gate()
            .authorize(&headers(&token), Permission::ViewClient)
            .unwrap();
        assert_eq!(caller.user, "ana");

        let caller = gate()
            .authorize(&headers(&format!("Bearer {}", token)), Permission::ViewClient)
            .unwrap();
        assert_eq!(caller.user, "ana");
    }

    #[test]
    fn test_missing_permission_is_forbidden() {
        let token = mint_token("ana", &["VIEW_CLIENT", "NOT_A_PERMISSION"]);
        let result = gate().authorize(&headers(&token), Permission::DeleteClient);
        assert!(matches!(
            result,
            Err(GateError::Forbidden { ref user, permission: Permission::DeleteClient }) if user == "ana"
        ));
    }

    #[test]
    fn test_bad_tokens_are_invalid_credentials() {
        assert!(matches!(
            gate().authorize(&headers("not-a-jwt"), Permission::ViewClient),
            Err(GateError::InvalidCredential)
        ));

        let foreign = PermissionGate::new(Arc::new(JwtDecoder::new("another-secret")));
        let token = mint_token("ana", &["VIEW_CLIENT"]);
        assert!(matches!(
            foreign.authorize(&headers(&token), Permission::ViewClient),
            Err(GateError::InvalidCredential)
        ));
    }

    #[test]
    fn test_non_utf8_header_is_invalid_and_logged() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_bytes(b"Bearer \xff\xfe").unwrap());

        let (result, logs) = capture_logs(|| gate().authorize(&headers, Permission::ViewClient));

        assert!(matches!(result, Err(GateError::InvalidCredential)));
        assert!(logs.contains("Permission denied: unreadable credential"), "{}", logs);
        assert!(logs.contains("VIEW_CLIENT"), "{}", logs);
    }

    #[test]
    fn test_every_denial_is_logged_at_info() {
        let token = mint_token("ana", &["VIEW_CLIENT"]);

        let (_, logs) = capture_logs(|| gate().authorize(&headers("not-a-jwt"), Permission::ViewClient));
        assert!(logs.contains("INFO"), "{}", logs);
        assert!(logs.contains("Permission denied: unreadable credential"), "{}", logs);

        let (_, logs) = capture_logs(|| gate().authorize(&HeaderMap::new(), Permission::ViewClient));
        assert!(logs.contains("Permission denied: no authorization header"), "{}", logs);

        let (_, logs) = capture_logs(|| gate().authorize(&headers(&token), Permission::DeleteClient));
        assert!(logs.contains("Permission denied"), "{}", logs);
        assert!(logs.contains("DELETE_CLIENT"), "{}", logs);
    }

    #[test]
    fn test_expired_token_is_invalid() {
        let claims = Claims {
            user: "ana".to_string(),
            permissions: vec!["VIEW_CLIENT".to_string()],
            exp: chrono::Utc::now().timestamp() - 3600,
        };
        let token = jsonwebtoken::encode(
            &jsonwebtoken::Header::default(),
            &claims,
            &jsonwebtoken::EncodingKey::from_secret(TEST_SECRET.as_bytes()),
        )
        .unwrap();

        assert!(matches!(
            gate().authorize(&headers(&token), Permission::ViewClient),
            Err(GateError::InvalidCredential)
        ));
    }
}
