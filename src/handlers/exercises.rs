use axum::{extract::State, http::StatusCode, Json};
use serde_json::{json, Value};

use crate::error::Result;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::middleware::{AuthUser, OptionalAuthUser};
use crate::models::{CreateExercise, ExerciseFilter, UpdateExercise};
use crate::repositories::ExerciseRepository;

#[derive(Clone)]
pub struct ExercisesState {
    pub exercise_repo: ExerciseRepository,
}

pub async fn list(
    State(state): State<ExercisesState>,
    auth_user: OptionalAuthUser,
    ApiQuery(filter): ApiQuery<ExerciseFilter>,
) -> Result<Json<Value>> {
    let exercises = state.exercise_repo.list(auth_user.user_id(), filter).await?;

    Ok(Json(json!({
        "count": exercises.len(),
        "exercises": exercises,
    })))
}

pub async fn show(
    State(state): State<ExercisesState>,
    auth_user: OptionalAuthUser,
    ApiPath(id): ApiPath<u64>,
) -> Result<Json<Value>> {
    let exercise = state
        .exercise_repo
        .find_visible(id, auth_user.user_id())
        .await?;

    Ok(Json(json!({ "exercise": exercise })))
}

pub async fn create(
    State(state): State<ExercisesState>,
    auth_user: AuthUser,
    ApiJson(input): ApiJson<CreateExercise>,
) -> Result<(StatusCode, Json<Value>)> {
    let exercise = state.exercise_repo.create(auth_user.id, input).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Exercise created successfully",
            "exercise": exercise,
        })),
    ))
}

pub async fn update(
    State(state): State<ExercisesState>,
    auth_user: AuthUser,
    ApiPath(id): ApiPath<u64>,
    ApiJson(input): ApiJson<UpdateExercise>,
) -> Result<Json<Value>> {
    let exercise = state.exercise_repo.update(id, auth_user.id, input).await?;

    Ok(Json(json!({
        "message": "Exercise updated successfully",
        "exercise": exercise,
    })))
}

pub async fn delete(
    State(state): State<ExercisesState>,
    auth_user: AuthUser,
    ApiPath(id): ApiPath<u64>,
) -> Result<Json<Value>> {
    state.exercise_repo.delete(id, auth_user.id).await?;

    Ok(Json(json!({ "message": "Exercise deleted successfully" })))
}

pub async fn muscle_groups(State(state): State<ExercisesState>) -> Result<Json<Value>> {
    let muscle_groups = state.exercise_repo.muscle_groups().await?;
    Ok(Json(json!({ "muscle_groups": muscle_groups })))
}

pub async fn equipment(State(state): State<ExercisesState>) -> Result<Json<Value>> {
    let equipment = state.exercise_repo.equipment().await?;
    Ok(Json(json!({ "equipment": equipment })))
}
