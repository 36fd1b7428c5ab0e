use axum::{extract::State, http::StatusCode, Json};
use serde_json::{json, Value};

use crate::error::Result;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::middleware::AuthUser;
use crate::models::{
    AddSessionExercise, HistoryQuery, LogSet, StartWorkout, StatsQuery, UpdateSessionExercise,
    UpdateSet, UpdateWorkout,
};
use crate::repositories::WorkoutRepository;

#[derive(Clone)]
pub struct WorkoutsState {
    pub workout_repo: WorkoutRepository,
}

pub async fn list(
    State(state): State<WorkoutsState>,
    auth_user: AuthUser,
    ApiQuery(query): ApiQuery<HistoryQuery>,
) -> Result<Json<Value>> {
    let limit = query.limit();
    let offset = query.offset();
    let (workouts, total) = state.workout_repo.history(auth_user.id, query).await?;

    Ok(Json(json!({
        "workouts": workouts,
        "total": total,
        "limit": limit,
        "offset": offset,
    })))
}

pub async fn start(
    State(state): State<WorkoutsState>,
    auth_user: AuthUser,
    ApiJson(input): ApiJson<StartWorkout>,
) -> Result<(StatusCode, Json<Value>)> {
    let workout = state.workout_repo.start(auth_user.id, input).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Workout started successfully",
            "workout": workout,
        })),
    ))
}

pub async fn active(
    State(state): State<WorkoutsState>,
    auth_user: AuthUser,
) -> Result<Json<Value>> {
    let workout = state.workout_repo.active(auth_user.id).await?;
    Ok(Json(json!({ "workout": workout })))
}

pub async fn stats(
    State(state): State<WorkoutsState>,
    auth_user: AuthUser,
    ApiQuery(query): ApiQuery<StatsQuery>,
) -> Result<Json<Value>> {
    let stats = state.workout_repo.stats(auth_user.id, query.days()).await?;
    Ok(Json(json!({ "stats": stats })))
}

pub async fn show(
    State(state): State<WorkoutsState>,
    auth_user: AuthUser,
    ApiPath(id): ApiPath<u64>,
) -> Result<Json<Value>> {
    let workout = state.workout_repo.get(id, auth_user.id).await?;
    Ok(Json(json!({ "workout": workout })))
}

pub async fn update(
    State(state): State<WorkoutsState>,
    auth_user: AuthUser,
    ApiPath(id): ApiPath<u64>,
    ApiJson(input): ApiJson<UpdateWorkout>,
) -> Result<Json<Value>> {
    let workout = state.workout_repo.update(id, auth_user.id, input).await?;

    Ok(Json(json!({
        "message": "Workout updated successfully",
        "workout": workout,
    })))
}

pub async fn delete(
    State(state): State<WorkoutsState>,
    auth_user: AuthUser,
    ApiPath(id): ApiPath<u64>,
) -> Result<Json<Value>> {
    state.workout_repo.delete(id, auth_user.id).await?;
    Ok(Json(json!({ "message": "Workout deleted successfully" })))
}

pub async fn add_exercise(
    State(state): State<WorkoutsState>,
    auth_user: AuthUser,
    ApiPath(id): ApiPath<u64>,
    ApiJson(input): ApiJson<AddSessionExercise>,
) -> Result<(StatusCode, Json<Value>)> {
    let session_exercise = state
        .workout_repo
        .add_exercise(id, auth_user.id, input)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Exercise added to workout",
            "session_exercise": session_exercise,
        })),
    ))
}

pub async fn update_exercise(
    State(state): State<WorkoutsState>,
    auth_user: AuthUser,
    ApiPath((id, session_exercise_id)): ApiPath<(u64, u64)>,
    ApiJson(input): ApiJson<UpdateSessionExercise>,
) -> Result<Json<Value>> {
    let session_exercise = state
        .workout_repo
        .update_exercise(id, session_exercise_id, auth_user.id, input)
        .await?;

    Ok(Json(json!({
        "message": "Workout exercise updated successfully",
        "session_exercise": session_exercise,
    })))
}

pub async fn remove_exercise(
    State(state): State<WorkoutsState>,
    auth_user: AuthUser,
    ApiPath((id, session_exercise_id)): ApiPath<(u64, u64)>,
) -> Result<Json<Value>> {
    state
        .workout_repo
        .remove_exercise(id, session_exercise_id, auth_user.id)
        .await?;

    Ok(Json(json!({ "message": "Exercise removed from workout" })))
}

pub async fn log_set(
    State(state): State<WorkoutsState>,
    auth_user: AuthUser,
    ApiPath((id, session_exercise_id)): ApiPath<(u64, u64)>,
    ApiJson(input): ApiJson<LogSet>,
) -> Result<(StatusCode, Json<Value>)> {
    let set = state
        .workout_repo
        .log_set(id, session_exercise_id, auth_user.id, input)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Set logged successfully",
            "set": set,
        })),
    ))
}

pub async fn update_set(
    State(state): State<WorkoutsState>,
    auth_user: AuthUser,
    ApiPath((id, set_id)): ApiPath<(u64, u64)>,
    ApiJson(input): ApiJson<UpdateSet>,
) -> Result<Json<Value>> {
    let set = state
        .workout_repo
        .update_set(id, set_id, auth_user.id, input)
        .await?;

    Ok(Json(json!({
        "message": "Set updated successfully",
        "set": set,
    })))
}

pub async fn delete_set(
    State(state): State<WorkoutsState>,
    auth_user: AuthUser,
    ApiPath((id, set_id)): ApiPath<(u64, u64)>,
) -> Result<Json<Value>> {
    state
        .workout_repo
        .delete_set(id, set_id, auth_user.id)
        .await?;

    Ok(Json(json!({ "message": "Set deleted successfully" })))
}
