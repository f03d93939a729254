//! Client endpoints.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{middleware, Extension, Json, Router};
use tienda_core::permissions::Resource;
use tienda_core::{Client, ClientFields, ClientPatch};
use tracing::info;

use crate::auth::{require_permission, Caller};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/clients", post(create_client).get(list_clients))
        .route(
            "/clients/{document}",
            get(get_client)
                .put(replace_client)
                .patch(update_client)
                .delete(delete_client),
        )
        .route_layer(middleware::from_fn_with_state(
            (state, Resource::Client),
            require_permission,
        ))
}

async fn create_client(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    payload: Result<Json<Client>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Client>)> {
    info!(user = %caller.user, "Calling create_client service");

    let Json(client) = payload?;
    client.validate()?;

    let created = state.db.clients().create(&client).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn list_clients(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
) -> ApiResult<Json<Vec<Client>>> {
    info!(user = %caller.user, "Calling list_clients service");
    Ok(Json(state.db.clients().list().await?))
}

async fn get_client(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    Path(document): Path<String>,
) -> ApiResult<Json<Client>> {
    info!(user = %caller.user, document = %document, "Calling get_client service");
    Ok(Json(find(&state, &document).await?))
}

async fn replace_client(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    Path(document): Path<String>,
    payload: Result<Json<ClientFields>, JsonRejection>,
) -> ApiResult<Json<Client>> {
    info!(user = %caller.user, document = %document, "Calling replace_client service");

    let Json(fields) = payload?;
    let client = fields.into_client(&document);
    client.validate()?;

    Ok(Json(state.db.clients().update(&client).await?))
}

async fn update_client(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    Path(document): Path<String>,
    payload: Result<Json<ClientPatch>, JsonRejection>,
) -> ApiResult<Json<Client>> {
    info!(user = %caller.user, document = %document, "Calling update_client service");

    let Json(patch) = payload?;
    let client = patch.apply(find(&state, &document).await?);
    client.validate()?;

    Ok(Json(state.db.clients().update(&client).await?))
}

async fn delete_client(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    Path(document): Path<String>,
) -> ApiResult<StatusCode> {
    info!(user = %caller.user, document = %document, "Calling delete_client service");

    state.db.clients().delete(&document).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn find(state: &AppState, document: &str) -> ApiResult<Client> {
    state
        .db
        .clients()
        .get(document)
        .await?
        .ok_or_else(|| ApiError::NotFound("Client".to_string()))
}
