use axum::{body::Bytes, extract::State, http::StatusCode, Json};
use serde_json::{json, Value};

use crate::error::Result;
use crate::extract::{optional_json, ApiJson, ApiPath};
use crate::middleware::AuthUser;
use crate::models::{EndFast, RecordFast, StartFast};
use crate::repositories::FastingRepository;

#[derive(Clone)]
pub struct FastingState {
    pub fasting_repo: FastingRepository,
}

pub async fn types(State(state): State<FastingState>) -> Result<Json<Value>> {
    let types = state.fasting_repo.list_types().await?;

    Ok(Json(json!({
        "count": types.len(),
        "types": types,
    })))
}

pub async fn start(
    State(state): State<FastingState>,
    auth_user: AuthUser,
    ApiJson(input): ApiJson<StartFast>,
) -> Result<(StatusCode, Json<Value>)> {
    let fast = state.fasting_repo.start(auth_user.id, input).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Fast started successfully",
            "fast": fast,
        })),
    ))
}

pub async fn current(
    State(state): State<FastingState>,
    auth_user: AuthUser,
) -> Result<Json<Value>> {
    let fast = state.fasting_repo.current(auth_user.id).await?;
    Ok(Json(json!({ "fast": fast })))
}

/// Ends a fast; an empty body completes it.
pub async fn end(
    State(state): State<FastingState>,
    auth_user: AuthUser,
    ApiPath(id): ApiPath<u64>,
    body: Bytes,
) -> Result<Json<Value>> {
    let input: EndFast = optional_json(&body)?;
    let fast = state.fasting_repo.end(id, auth_user.id, input).await?;

    Ok(Json(json!({
        "message": "Fast ended successfully",
        "fast": fast,
    })))
}

pub async fn record(
    State(state): State<FastingState>,
    auth_user: AuthUser,
    ApiJson(input): ApiJson<RecordFast>,
) -> Result<(StatusCode, Json<Value>)> {
    let fast = state.fasting_repo.record(auth_user.id, input).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Fast recorded successfully",
            "fast": fast,
        })),
    ))
}

pub async fn history(
    State(state): State<FastingState>,
    auth_user: AuthUser,
) -> Result<Json<Value>> {
    let fasts = state.fasting_repo.history(auth_user.id).await?;

    Ok(Json(json!({
        "count": fasts.len(),
        "fasts": fasts,
    })))
}
