//! Product endpoints, plus the open healthcheck.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{middleware, Extension, Json, Router};
use serde_json::{json, Value};
use tienda_core::permissions::Resource;
use tienda_core::types::validate_product;
use tienda_core::{NewProduct, Product, ProductFields, ProductPatch};
use tracing::info;

use crate::auth::{require_permission, Caller};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/products", post(create_product).get(list_products))
        .route(
            "/products/{id}",
            get(get_product)
                .put(replace_product)
                .patch(update_product)
                .delete(delete_product),
        )
        .route_layer(middleware::from_fn_with_state(
            (state, Resource::Product),
            require_permission,
        ))
        // Added after the layer so it stays outside the gate
        .route("/products/healthcheck", get(healthcheck))
}

async fn healthcheck() -> &'static str {
    "Hello world"
}

async fn create_product(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    payload: Result<Json<NewProduct>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Product>)> {
    info!(user = %caller.user, "Calling create_product service");

    let Json(new) = payload?;
    new.validate()?;

    let created = state.db.products().create(&new).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn list_products(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
) -> ApiResult<Json<Vec<Product>>> {
    info!(user = %caller.user, "Calling list_products service");
    Ok(Json(state.db.products().list().await?))
}

async fn get_product(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
) -> ApiResult<Json<Product>> {
    info!(user = %caller.user, product = %id, "Calling get_product service");
    Ok(Json(find(&state, &id).await?))
}

async fn replace_product(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
    payload: Result<Json<ProductFields>, JsonRejection>,
) -> ApiResult<Json<Product>> {
    info!(user = %caller.user, product = %id, "Calling replace_product service");

    let Json(fields) = payload?;
    let product = fields.apply(find(&state, &id).await?);
    validate_product(&product)?;

    Ok(Json(state.db.products().update(&product).await?))
}

async fn update_product(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
    payload: Result<Json<ProductPatch>, JsonRejection>,
) -> ApiResult<Json<Product>> {
    info!(user = %caller.user, product = %id, "Calling update_product service");

    let Json(patch) = payload?;
    let product = patch.apply(find(&state, &id).await?);
    validate_product(&product)?;

    Ok(Json(state.db.products().update(&product).await?))
}

async fn delete_product(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    info!(user = %caller.user, product = %id, "Calling delete_product service");

    state.db.products().delete(&id).await?;
    Ok(Json(json!({ "message": "This product has been deleted successfully" })))
}

async fn find(state: &AppState, id: &str) -> ApiResult<Product> {
    state
        .db
        .products()
        .get(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Product".to_string()))
}
