use axum::{body::Bytes, extract::State, http::StatusCode, Json};
use serde_json::{json, Value};

use crate::error::Result;
use crate::extract::{optional_json, ApiJson, ApiPath, ApiQuery};
use crate::middleware::AuthUser;
use crate::models::{
    AddTemplateExercise, CreateTemplate, DuplicateTemplate, TemplateFilter, UpdateTemplate,
    UpdateTemplateExercise,
};
use crate::repositories::TemplateRepository;

#[derive(Clone)]
pub struct TemplatesState {
    pub template_repo: TemplateRepository,
}

pub async fn list(
    State(state): State<TemplatesState>,
    auth_user: AuthUser,
    ApiQuery(filter): ApiQuery<TemplateFilter>,
) -> Result<Json<Value>> {
    let templates = state.template_repo.list(auth_user.id, filter).await?;

    Ok(Json(json!({
        "count": templates.len(),
        "templates": templates,
    })))
}

pub async fn show(
    State(state): State<TemplatesState>,
    auth_user: AuthUser,
    ApiPath(id): ApiPath<u64>,
) -> Result<Json<Value>> {
    let template = state.template_repo.get(id, auth_user.id).await?;
    Ok(Json(json!({ "template": template })))
}

pub async fn create(
    State(state): State<TemplatesState>,
    auth_user: AuthUser,
    ApiJson(input): ApiJson<CreateTemplate>,
) -> Result<(StatusCode, Json<Value>)> {
    let template = state.template_repo.create(auth_user.id, input).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Template created successfully",
            "template": template,
        })),
    ))
}

pub async fn update(
    State(state): State<TemplatesState>,
    auth_user: AuthUser,
    ApiPath(id): ApiPath<u64>,
    ApiJson(input): ApiJson<UpdateTemplate>,
) -> Result<Json<Value>> {
    let template = state.template_repo.update(id, auth_user.id, input).await?;

    Ok(Json(json!({
        "message": "Template updated successfully",
        "template": template,
    })))
}

pub async fn delete(
    State(state): State<TemplatesState>,
    auth_user: AuthUser,
    ApiPath(id): ApiPath<u64>,
) -> Result<Json<Value>> {
    state.template_repo.delete(id, auth_user.id).await?;
    Ok(Json(json!({ "message": "Template deleted successfully" })))
}

pub async fn duplicate(
    State(state): State<TemplatesState>,
    auth_user: AuthUser,
    ApiPath(id): ApiPath<u64>,
    body: Bytes,
) -> Result<(StatusCode, Json<Value>)> {
    let input: DuplicateTemplate = optional_json(&body)?;
    let template = state.template_repo.duplicate(id, auth_user.id, input).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Template duplicated successfully",
            "template": template,
        })),
    ))
}

pub async fn add_exercise(
    State(state): State<TemplatesState>,
    auth_user: AuthUser,
    ApiPath(id): ApiPath<u64>,
    ApiJson(input): ApiJson<AddTemplateExercise>,
) -> Result<(StatusCode, Json<Value>)> {
    let entry = state
        .template_repo
        .add_exercise(id, auth_user.id, input)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Exercise added to template",
            "template_exercise": entry,
        })),
    ))
}

pub async fn update_exercise(
    State(state): State<TemplatesState>,
    auth_user: AuthUser,
    ApiPath((id, exercise_id)): ApiPath<(u64, u64)>,
    ApiJson(input): ApiJson<UpdateTemplateExercise>,
) -> Result<Json<Value>> {
    let entry = state
        .template_repo
        .update_exercise(id, exercise_id, auth_user.id, input)
        .await?;

    Ok(Json(json!({
        "message": "Template exercise updated successfully",
        "template_exercise": entry,
    })))
}

pub async fn remove_exercise(
    State(state): State<TemplatesState>,
    auth_user: AuthUser,
    ApiPath((id, exercise_id)): ApiPath<(u64, u64)>,
) -> Result<Json<Value>> {
    state
        .template_repo
        .remove_exercise(id, exercise_id, auth_user.id)
        .await?;

    Ok(Json(json!({ "message": "Exercise removed from template" })))
}

pub async fn categories(
    State(state): State<TemplatesState>,
    auth_user: AuthUser,
) -> Result<Json<Value>> {
    let categories = state.template_repo.categories(auth_user.id).await?;
    Ok(Json(json!({ "categories": categories })))
}
