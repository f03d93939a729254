//! # Tienda API
//!
//! REST back-office for clients, products and sales transactions.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         API Components                                  │
//! │                                                                         │
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────────────────┐│
//! │  │ PermissionGate │  │    Routes      │  │  NotificationDispatcher    ││
//! │  │                │  │                │  │                            ││
//! │  │ • JwtDecoder   │─►│ • clients      │─►│ • LogTransport             ││
//! │  │ • policy table │  │ • products     │  │ • HttpRelayTransport       ││
//! │  │   (middleware) │  │ • transactions │  │                            ││
//! │  └────────────────┘  └────────────────┘  └────────────────────────────┘│
//! │                              │                                          │
//! │                 ┌────────────┴───────────┐                              │
//! │                 ▼                        ▼                              │
//! │        ┌────────────────┐       ┌────────────────┐                      │
//! │        │  tienda-db     │       │  PdfRenderer   │                      │
//! │        │  (SQLite)      │       │  sales report  │                      │
//! │        └────────────────┘       └────────────────┘                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration
//! See [`ApiConfig`](crate::config::ApiConfig). Environment variables:
//! - `TIENDA__SERVER__HOST` / `TIENDA__SERVER__PORT` - listen address (default: 0.0.0.0:8000)
//! - `TIENDA__DATABASE__PATH` - SQLite file (default: ./tienda.db)
//! - `TIENDA__AUTH__JWT_SECRET` - HS256 secret (required)
//! - `TIENDA__MAIL__RELAY_URL` - mail relay endpoint (optional; emails are logged otherwise)

use std::sync::Arc;

use axum::Router;

pub mod auth;
pub mod config;
pub mod error;
pub mod notify;
pub mod pdf;
pub mod routes;
pub mod state;

// Re-exports
pub use crate::config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use state::AppState;

/// Builds the full application router.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(routes::clients::router(state.clone()))
        .merge(routes::products::router(state.clone()))
        .merge(routes::transactions::router(state.clone()))
        .with_state(state)
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{HeaderMap, Method, Request, StatusCode};
    use axum::Router;
    use chrono::Utc;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use tienda_db::{Database, DbConfig};
    use tower::ServiceExt;

    use crate::auth::{Claims, JwtDecoder, PermissionGate};
    use crate::notify::testing::RecordingTransport;
    use crate::notify::{MailTransport, NotificationDispatcher};
    use crate::pdf::PdfRenderer;
    use crate::state::AppState;

    pub const TEST_SECRET: &str = "test-secret";

    /// Signs a one-hour token for `user` carrying `permissions`.
    pub fn mint_token(user: &str, permissions: &[&str]) -> String {
        let claims = Claims {
            user: user.to_string(),
            permissions: permissions.iter().map(|p| p.to_string()).collect(),
            exp: Utc::now().timestamp() + 3600,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(TEST_SECRET.as_bytes()),
        )
        .unwrap()
    }

    pub struct TestApp {
        pub router: Router,
        pub db: Database,
        pub mail: Arc<RecordingTransport>,
    }

    impl TestApp {
        /// In-memory database with a recording mail transport.
        pub async fn new() -> Self {
            let mail = Arc::new(RecordingTransport::default());
            let (router, db) = router_with(mail.clone()).await;
            TestApp { router, db, mail }
        }

        /// Uses `transport` for mail; `mail` records nothing.
        pub async fn with_transport(transport: Arc<dyn MailTransport>) -> Self {
            let (router, db) = router_with(transport).await;
            TestApp {
                router,
                db,
                mail: Arc::new(RecordingTransport::default()),
            }
        }
    }

    async fn router_with(transport: Arc<dyn MailTransport>) -> (Router, Database) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let state = AppState {
            db: db.clone(),
            gate: PermissionGate::new(Arc::new(JwtDecoder::new(TEST_SECRET))),
            notifier: NotificationDispatcher::new(transport),
            renderer: Arc::new(PdfRenderer),
        };
        (crate::build_router(Arc::new(state)), db)
    }

    pub struct TestResponse {
        pub status: StatusCode,
        pub headers: HeaderMap,
        pub body: Vec<u8>,
    }

    impl TestResponse {
        pub fn json(&self) -> serde_json::Value {
            serde_json::from_slice(&self.body).unwrap()
        }
    }

    pub async fn send(
        router: &Router,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<serde_json::Value>,
    ) -> TestResponse {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            request = request.header("authorization", format!("Bearer {}", token));
        }
        let request = match body {
            Some(json) => request
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };

        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap().to_vec();

        TestResponse { status, headers, body }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::{mint_token, send, TestApp};
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    const FORBIDDEN: &str = "You don't have permissions to perform this action.";

    #[tokio::test]
    async fn test_missing_authorization_is_403_everywhere() {
        let app = TestApp::new().await;

        for (method, uri) in [
            (Method::GET, "/clients"),
            (Method::POST, "/clients"),
            (Method::DELETE, "/clients/123"),
            (Method::GET, "/products"),
            (Method::PATCH, "/products/P1"),
            (Method::POST, "/transactions"),
            (Method::GET, "/transactions/json/report"),
        ] {
            let response = send(&app.router, method, uri, None, None).await;
            assert_eq!(response.status, StatusCode::FORBIDDEN, "{}", uri);
            assert_eq!(response.json(), json!({ "message": FORBIDDEN }), "{}", uri);
        }
    }

    #[tokio::test]
    async fn test_valid_token_without_permission_is_403() {
        let app = TestApp::new().await;
        let token = mint_token("viewer", &["VIEW_CLIENT"]);

        let response = send(
            &app.router,
            Method::POST,
            "/clients",
            Some(&token),
            Some(json!({ "document": "1", "name": "A", "last_name": "B", "email": "a@b.co" })),
        )
        .await;
        assert_eq!(response.status, StatusCode::FORBIDDEN);
        assert_eq!(response.json(), json!({ "message": FORBIDDEN }));

        let allowed = send(&app.router, Method::GET, "/clients", Some(&token), None).await;
        assert_eq!(allowed.status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_head_requires_view_permission() {
        let app = TestApp::new().await;
        let viewer = mint_token("viewer", &["VIEW_CLIENT"]);
        let other = mint_token("other", &["VIEW_PRODUCT"]);

        let response = send(&app.router, Method::HEAD, "/clients", Some(&viewer), None).await;
        assert_eq!(response.status, StatusCode::OK);
        assert!(response.body.is_empty());

        let response = send(&app.router, Method::HEAD, "/clients", Some(&other), None).await;
        assert_eq!(response.status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_garbage_token_is_401() {
        let app = TestApp::new().await;
        let response = send(&app.router, Method::GET, "/clients", Some("garbage"), None).await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED);
        assert_eq!(response.json(), json!({ "error": "Invalid authorization token" }));
    }
}
