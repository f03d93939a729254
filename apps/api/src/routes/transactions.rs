//! Transaction endpoints and the sales report.
//!
//! ## Create Flow
//! ```text
//! POST /transactions
//!   │ validate payload shape
//!   ▼
//! TransactionRepository::create   (atomic: header + lines, or nothing)
//!   │
//!   ├── error ──► 404 / 400 / 500 {error}
//!   ▼
//! NotificationDispatcher::send(client email)   (failures only logged)
//!   │
//!   ▼
//! 201 Transaction
//! ```

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{middleware, Extension, Json, Router};
use chrono::Utc;
use serde_json::{json, Value};
use tienda_core::permissions::Resource;
use tienda_core::{NewTransaction, SalesReport, Transaction, TransactionPatch};
use tracing::{error, info, warn};

use crate::auth::{require_permission, Caller};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/transactions", post(create_transaction).get(list_transactions))
        .route(
            "/transactions/{id}",
            get(get_transaction)
                .put(replace_transaction)
                .patch(update_transaction)
                .delete(delete_transaction),
        )
        .route("/transactions/{id}/report", get(sales_report))
        .route_layer(middleware::from_fn_with_state(
            (state, Resource::Transaction),
            require_permission,
        ))
}

async fn create_transaction(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    payload: Result<Json<NewTransaction>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Transaction>)> {
    info!(user = %caller.user, "Calling create_transaction service");

    let Json(new) = payload?;
    new.validate()?;

    let transaction = state
        .db
        .transactions()
        .create(&new)
        .await
        .map_err(|e| {
            error!(user = %caller.user, error = %e, "create_transaction failed");
            ApiError::from_recording(e)
        })?;

    notify_client(&state, &transaction).await;

    Ok((StatusCode::CREATED, Json(transaction)))
}

/// Sends the confirmation to the transaction's client. Never fails.
async fn notify_client(state: &AppState, transaction: &Transaction) {
    match state.db.clients().get(&transaction.client).await {
        Ok(Some(client)) => state.notifier.send(&client.email, transaction).await,
        Ok(None) => warn!(client = %transaction.client, "Client vanished before notification"),
        Err(e) => error!(client = %transaction.client, error = %e, "Could not load client for notification"),
    }
}

async fn list_transactions(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
) -> ApiResult<Json<Vec<Transaction>>> {
    info!(user = %caller.user, "Calling list_transactions service");
    Ok(Json(state.db.transactions().list().await?))
}

async fn get_transaction(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
) -> ApiResult<Json<Transaction>> {
    info!(user = %caller.user, transaction = %id, "Calling get_transaction service");

    state
        .db
        .transactions()
        .get(&id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Transaction".to_string()))
}

async fn replace_transaction(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
    payload: Result<Json<NewTransaction>, JsonRejection>,
) -> ApiResult<Json<Transaction>> {
    info!(user = %caller.user, transaction = %id, "Calling replace_transaction service");

    let Json(full) = payload?;
    full.validate()?;

    let patch = TransactionPatch::from(full);
    Ok(Json(state.db.transactions().update(&id, &patch).await?))
}

async fn update_transaction(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
    payload: Result<Json<TransactionPatch>, JsonRejection>,
) -> ApiResult<Json<Transaction>> {
    info!(user = %caller.user, transaction = %id, "Calling update_transaction service");

    let Json(patch) = payload?;
    patch.validate()?;

    Ok(Json(state.db.transactions().update(&id, &patch).await?))
}

async fn delete_transaction(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    info!(user = %caller.user, transaction = %id, "Calling delete_transaction service");

    state.db.transactions().delete(&id).await?;
    Ok(Json(json!({ "message": "This transaction has been deleted successfully" })))
}

/// `GET /transactions/{format}/report`: the path segment selects the format.
async fn sales_report(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    Path(format): Path<String>,
) -> ApiResult<Response> {
    info!(user = %caller.user, format = %format, "Calling sales_report service");

    match format.as_str() {
        "json" => Ok(Json(build_report(&state).await?).into_response()),
        "pdf" => {
            let report = build_report(&state).await?;
            let document = state.renderer.render(&report);
            Ok((
                [
                    (CONTENT_TYPE, state.renderer.content_type()),
                    (CONTENT_DISPOSITION, "attachment; filename=\"sales_report.pdf\""),
                ],
                document,
            )
                .into_response())
        }
        _ => Ok(StatusCode::NOT_FOUND.into_response()),
    }
}

async fn build_report(state: &AppState) -> ApiResult<SalesReport> {
    let transactions = state.db.transactions().list().await?;
    Ok(SalesReport::from_transactions(&transactions, Utc::now()))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::notify::testing::FailingTransport;
    use crate::test_support::{mint_token, send, TestApp};
    use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
    use axum::http::{Method, StatusCode};
    use serde_json::{json, Value};
    use tienda_core::NewProduct;

    const ALL_TRANSACTION: &[&str] = &[
        "CREATE_TRANSACTION",
        "VIEW_TRANSACTION",
        "UPDATE_TRANSACTION",
        "DELETE_TRANSACTION",
    ];

    async fn seed(app: &TestApp) {
        let token = mint_token("seeder", &["CREATE_CLIENT", "CREATE_PRODUCT"]);
        let client = send(
            &app.router,
            Method::POST,
            "/clients",
            Some(&token),
            Some(json!({
                "document": "123",
                "name": "Ana",
                "last_name": "Gomez",
                "email": "ana@example.com"
            })),
        )
        .await;
        assert_eq!(client.status, StatusCode::CREATED);

        for (id, price) in [("P1", 1000), ("P2", 250)] {
            let product = send(
                &app.router,
                Method::POST,
                "/products",
                Some(&token),
                Some(json!({ "id": id, "name": format!("Product {}", id), "price_cents": price, "stock": 10 })),
            )
            .await;
            assert_eq!(product.status, StatusCode::CREATED);
        }
    }

    fn sale(lines: Value) -> Value {
        json!({
            "client": "123",
            "payment_method": "CARD",
            "status": "PAID",
            "products": lines
        })
    }

    #[tokio::test]
    async fn test_create_transaction_scenario() {
        let app = TestApp::new().await;
        seed(&app).await;
        let token = mint_token("cashier", ALL_TRANSACTION);

        let response = send(
            &app.router,
            Method::POST,
            "/transactions",
            Some(&token),
            Some(sale(json!([{ "product": "P1", "quantity": 2 }]))),
        )
        .await;

        assert_eq!(response.status, StatusCode::CREATED);
        let body = response.json();
        assert_eq!(body["total_cents"], 2000);
        assert_eq!(body["payment_method"], "CARD");
        assert_eq!(body["status"], "PAID");
        assert_eq!(body["products"].as_array().unwrap().len(), 1);
        assert_eq!(body["products"][0]["total_cents"], 2000);

        let sent = app.mail.messages();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "ana@example.com");
        assert_eq!(
            sent[0].subject,
            format!("Transaction confirmation {}", body["id"].as_str().unwrap())
        );
    }

    #[tokio::test]
    async fn test_failing_mail_still_creates() {
        let failing = Arc::new(FailingTransport::default());
        let app = TestApp::with_transport(failing.clone()).await;
        seed(&app).await;
        let token = mint_token("cashier", ALL_TRANSACTION);

        let response = send(
            &app.router,
            Method::POST,
            "/transactions",
            Some(&token),
            Some(sale(json!([{ "product": "P1", "quantity": 2 }]))),
        )
        .await;

        assert_eq!(response.status, StatusCode::CREATED);
        assert_eq!(*failing.attempts.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_total_overflow_is_400_and_persists_nothing() {
        let app = TestApp::new().await;
        seed(&app).await;
        // Stored directly: the API refuses prices this large
        for id in ["BIG1", "BIG2"] {
            app.db
                .products()
                .create(&NewProduct {
                    id: Some(id.to_string()),
                    name: id.to_string(),
                    description: None,
                    price_cents: 5_000_000_000_000_000_000,
                    stock: 1,
                })
                .await
                .unwrap();
        }
        let token = mint_token("cashier", ALL_TRANSACTION);

        let response = send(
            &app.router,
            Method::POST,
            "/transactions",
            Some(&token),
            Some(sale(json!([
                { "product": "BIG1", "quantity": 1 },
                { "product": "BIG2", "quantity": 1 }
            ]))),
        )
        .await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        assert_eq!(
            response.json(),
            json!({ "error": "Amount overflow while totalling the transaction" })
        );
        assert!(app.mail.messages().is_empty());

        let listed = send(&app.router, Method::GET, "/transactions", Some(&token), None).await;
        assert_eq!(listed.json(), json!([]));
    }

    #[tokio::test]
    async fn test_missing_product_aborts_whole_transaction() {
        let app = TestApp::new().await;
        seed(&app).await;
        let token = mint_token("cashier", ALL_TRANSACTION);

        let response = send(
            &app.router,
            Method::POST,
            "/transactions",
            Some(&token),
            Some(sale(json!([
                { "product": "P1", "quantity": 1 },
                { "product": "NOPE", "quantity": 1 }
            ]))),
        )
        .await;
        assert_eq!(response.status, StatusCode::NOT_FOUND);
        assert_eq!(response.json(), json!({ "error": "Product not found" }));
        assert!(app.mail.messages().is_empty());

        let listed = send(&app.router, Method::GET, "/transactions", Some(&token), None).await;
        assert_eq!(listed.json(), json!([]));

        // Retrying with a fixed reference succeeds, lines accepted as `items`
        let retry = send(
            &app.router,
            Method::POST,
            "/transactions",
            Some(&token),
            Some(json!({
                "client": "123",
                "payment_method": "CASH",
                "items": [{ "product": "P1", "quantity": 1 }, { "product": "P2", "quantity": 2 }]
            })),
        )
        .await;
        assert_eq!(retry.status, StatusCode::CREATED);
        assert_eq!(retry.json()["total_cents"], 1500);
        assert_eq!(retry.json()["status"], "PENDING");
    }

    #[tokio::test]
    async fn test_create_validation_errors() {
        let app = TestApp::new().await;
        seed(&app).await;
        let token = mint_token("cashier", ALL_TRANSACTION);

        let empty = send(&app.router, Method::POST, "/transactions", Some(&token), Some(sale(json!([])))).await;
        assert_eq!(empty.status, StatusCode::BAD_REQUEST);

        let zero = send(
            &app.router,
            Method::POST,
            "/transactions",
            Some(&token),
            Some(sale(json!([{ "product": "P1", "quantity": 0 }]))),
        )
        .await;
        assert_eq!(zero.status, StatusCode::BAD_REQUEST);

        let mut bad_method = sale(json!([{ "product": "P1", "quantity": 1 }]));
        bad_method["payment_method"] = json!("BITCOIN");
        let response = send(&app.router, Method::POST, "/transactions", Some(&token), Some(bad_method)).await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST);

        let mut unknown_client = sale(json!([{ "product": "P1", "quantity": 1 }]));
        unknown_client["client"] = json!("999");
        let response =
            send(&app.router, Method::POST, "/transactions", Some(&token), Some(unknown_client)).await;
        assert_eq!(response.status, StatusCode::NOT_FOUND);
        assert_eq!(response.json(), json!({ "error": "Client not found" }));
    }

    #[tokio::test]
    async fn test_update_and_delete_transaction() {
        let app = TestApp::new().await;
        seed(&app).await;
        let token = mint_token("cashier", ALL_TRANSACTION);

        let created = send(
            &app.router,
            Method::POST,
            "/transactions",
            Some(&token),
            Some(sale(json!([{ "product": "P1", "quantity": 2 }]))),
        )
        .await
        .json();
        let uri = format!("/transactions/{}", created["id"].as_str().unwrap());

        let patched = send(
            &app.router,
            Method::PATCH,
            &uri,
            Some(&token),
            Some(json!({ "status": "CANCELLED" })),
        )
        .await;
        assert_eq!(patched.status, StatusCode::OK);
        assert_eq!(patched.json()["status"], "CANCELLED");
        assert_eq!(patched.json()["total_cents"], 2000);

        let replaced = send(
            &app.router,
            Method::PUT,
            &uri,
            Some(&token),
            Some(sale(json!([{ "product": "P2", "quantity": 4 }]))),
        )
        .await;
        assert_eq!(replaced.status, StatusCode::OK);
        assert_eq!(replaced.json()["total_cents"], 1000);
        assert_eq!(replaced.json()["status"], "PAID");

        let fetched = send(&app.router, Method::GET, &uri, Some(&token), None).await;
        assert_eq!(fetched.json()["products"][0]["product"], "P2");

        let deleted = send(&app.router, Method::DELETE, &uri, Some(&token), None).await;
        assert_eq!(deleted.status, StatusCode::OK);
        assert_eq!(
            deleted.json(),
            json!({ "message": "This transaction has been deleted successfully" })
        );

        for method in [Method::GET, Method::DELETE] {
            let gone = send(&app.router, method, &uri, Some(&token), None).await;
            assert_eq!(gone.status, StatusCode::NOT_FOUND);
            assert_eq!(gone.json(), json!({ "error": "Transaction not found" }));
        }
    }

    #[tokio::test]
    async fn test_referenced_product_and_client_are_kept() {
        let app = TestApp::new().await;
        seed(&app).await;
        let token = mint_token(
            "admin",
            &["CREATE_TRANSACTION", "DELETE_PRODUCT", "DELETE_CLIENT", "VIEW_PRODUCT"],
        );

        send(
            &app.router,
            Method::POST,
            "/transactions",
            Some(&token),
            Some(sale(json!([{ "product": "P1", "quantity": 1 }]))),
        )
        .await;

        let product = send(&app.router, Method::DELETE, "/products/P1", Some(&token), None).await;
        assert_eq!(product.status, StatusCode::CONFLICT);
        assert_eq!(
            product.json(),
            json!({ "error": "Product is referenced by existing transactions" })
        );

        let client = send(&app.router, Method::DELETE, "/clients/123", Some(&token), None).await;
        assert_eq!(client.status, StatusCode::CONFLICT);

        let still_there = send(&app.router, Method::GET, "/products/P1", Some(&token), None).await;
        assert_eq!(still_there.status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_price_change_keeps_recorded_totals() {
        let app = TestApp::new().await;
        seed(&app).await;
        let token = mint_token("admin", &["CREATE_TRANSACTION", "VIEW_TRANSACTION", "UPDATE_PRODUCT"]);

        let created = send(
            &app.router,
            Method::POST,
            "/transactions",
            Some(&token),
            Some(sale(json!([{ "product": "P1", "quantity": 2 }]))),
        )
        .await
        .json();

        let repriced = send(
            &app.router,
            Method::PATCH,
            "/products/P1",
            Some(&token),
            Some(json!({ "price_cents": 5000 })),
        )
        .await;
        assert_eq!(repriced.status, StatusCode::OK);

        let uri = format!("/transactions/{}", created["id"].as_str().unwrap());
        let fetched = send(&app.router, Method::GET, &uri, Some(&token), None).await.json();
        assert_eq!(fetched["total_cents"], 2000);
        assert_eq!(fetched["products"][0]["unit_price_cents"], 1000);
    }

    #[tokio::test]
    async fn test_reports() {
        let app = TestApp::new().await;
        seed(&app).await;
        let token = mint_token("manager", ALL_TRANSACTION);

        for lines in [
            json!([{ "product": "P1", "quantity": 2 }]),
            json!([{ "product": "P2", "quantity": 3 }, { "product": "P1", "quantity": 1 }]),
        ] {
            let created = send(&app.router, Method::POST, "/transactions", Some(&token), Some(sale(lines))).await;
            assert_eq!(created.status, StatusCode::CREATED);
        }

        let report = send(&app.router, Method::GET, "/transactions/json/report", Some(&token), None).await;
        assert_eq!(report.status, StatusCode::OK);
        let body = report.json();
        assert_eq!(body["transaction_count"], 2);
        assert_eq!(body["total_revenue_cents"], 2000 + 750 + 1000);
        assert_eq!(body["by_payment_method"]["CARD"]["count"], 2);
        assert_eq!(body["products"][0]["product"], "P1");
        assert_eq!(body["products"][0]["units_sold"], 3);

        let pdf = send(&app.router, Method::GET, "/transactions/pdf/report", Some(&token), None).await;
        assert_eq!(pdf.status, StatusCode::OK);
        assert_eq!(pdf.headers[CONTENT_TYPE], "application/pdf");
        assert_eq!(
            pdf.headers[CONTENT_DISPOSITION],
            "attachment; filename=\"sales_report.pdf\""
        );
        assert!(pdf.body.starts_with(b"%PDF-"));

        let unknown = send(&app.router, Method::GET, "/transactions/xyz/report", Some(&token), None).await;
        assert_eq!(unknown.status, StatusCode::NOT_FOUND);
        assert!(unknown.body.is_empty());
    }

    #[tokio::test]
    async fn test_report_requires_view_permission() {
        let app = TestApp::new().await;
        let token = mint_token("cashier", &["CREATE_TRANSACTION"]);
        let response = send(&app.router, Method::GET, "/transactions/json/report", Some(&token), None).await;
        assert_eq!(response.status, StatusCode::FORBIDDEN);
    }
}
