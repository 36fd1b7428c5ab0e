use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::error::{AppError, Result};
use crate::extract::ApiJson;
use crate::middleware::AuthUser;
use crate::models::{UpdateProfile, UpdateSettings};
use crate::repositories::UserRepository;

#[derive(Clone)]
pub struct ProfileState {
    pub user_repo: UserRepository,
}

pub async fn me(State(state): State<ProfileState>, auth_user: AuthUser) -> Result<Json<Value>> {
    let user = state
        .user_repo
        .find_by_id(auth_user.id)
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;

    Ok(Json(json!({ "user": user })))
}

pub async fn update_me(
    State(state): State<ProfileState>,
    auth_user: AuthUser,
    ApiJson(input): ApiJson<UpdateProfile>,
) -> Result<Json<Value>> {
    let user = state.user_repo.update_profile(auth_user.id, input).await?;

    Ok(Json(json!({
        "message": "Profile updated successfully",
        "user": user,
    })))
}

pub async fn update_settings(
    State(state): State<ProfileState>,
    auth_user: AuthUser,
    ApiJson(input): ApiJson<UpdateSettings>,
) -> Result<Json<Value>> {
    let user = state.user_repo.update_settings(auth_user.id, input).await?;

    Ok(Json(json!({
        "message": "Settings updated successfully",
        "user": user,
    })))
}
