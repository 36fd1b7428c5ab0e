use axum::{extract::State, http::StatusCode, Json};
use serde_json::{json, Value};

use crate::error::Result;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::middleware::AuthUser;
use crate::models::water::total_amount;
use crate::models::{LogWater, WaterQuery};
use crate::repositories::WaterRepository;

#[derive(Clone)]
pub struct WaterState {
    pub water_repo: WaterRepository,
}

pub async fn log(
    State(state): State<WaterState>,
    auth_user: AuthUser,
    ApiJson(input): ApiJson<LogWater>,
) -> Result<(StatusCode, Json<Value>)> {
    let log = state.water_repo.log(auth_user.id, input).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Water intake logged successfully",
            "log": log,
        })),
    ))
}

pub async fn list(
    State(state): State<WaterState>,
    auth_user: AuthUser,
    ApiQuery(query): ApiQuery<WaterQuery>,
) -> Result<Json<Value>> {
    let logs = state.water_repo.list(auth_user.id, query).await?;

    Ok(Json(json!({
        "count": logs.len(),
        "total_amount": total_amount(&logs),
        "logs": logs,
    })))
}

pub async fn delete_latest(
    State(state): State<WaterState>,
    auth_user: AuthUser,
) -> Result<Json<Value>> {
    let deleted = state.water_repo.delete_latest(auth_user.id).await?;

    Ok(Json(json!({
        "message": "Water log deleted successfully",
        "deleted_log": deleted,
    })))
}

pub async fn delete(
    State(state): State<WaterState>,
    auth_user: AuthUser,
    ApiPath(id): ApiPath<u64>,
) -> Result<Json<Value>> {
    let deleted = state.water_repo.delete(id, auth_user.id).await?;

    Ok(Json(json!({
        "message": "Water log deleted successfully",
        "deleted_log": deleted,
    })))
}
