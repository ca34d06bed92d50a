use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use serde_json::{json, Value};
use tracing::instrument;

use crate::error::Error;
use crate::state::AppState;
use crate::users::dto::{LoginRequest, RegisterRequest};
use crate::users::service;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/users/register", post(register))
        .route("/users/login", post(login))
}

#[instrument(skip(state, payload))]
async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<Value>), Error> {
    let user = service::register(state.users.as_ref(), payload).await?;
    Ok((StatusCode::CREATED, Json(json!({ "user": user }))))
}

#[instrument(skip(state, payload))]
async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<Value>, Error> {
    let token = service::login(state.users.as_ref(), &state.keys, payload).await?;
    Ok(Json(json!({ "auth_token": token })))
}
