use axum::{http::StatusCode, response::IntoResponse};
use http_body_util::BodyExt;
use fitlog::error::AppError;

#[test]
fn test_not_found_returns_404() {
    let error = AppError::not_found("Workout");
    let response = error.into_response();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[test]
fn test_conflict_returns_409() {
    let error = AppError::Conflict("Exercise is in use".to_string());
    let response = error.into_response();

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[test]
fn test_bad_request_returns_400() {
    let error = AppError::BadRequest("Invalid input".to_string());
    let response = error.into_response();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[test]
fn test_unauthorized_returns_401() {
    let error = AppError::Unauthorized;
    let response = error.into_response();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[test]
fn test_internal_returns_500() {
    let error = AppError::Internal("Something went wrong".to_string());
    let response = error.into_response();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[test]
fn test_validation_returns_400() {
    let error = AppError::Validation("Invalid field".to_string());
    let response = error.into_response();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_error_body_is_json() {
    let response = AppError::not_found("Template").into_response();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

    assert_eq!(body["error"], "Template not found");
}

#[tokio::test]
async fn test_database_error_message_is_generic() {
    let error = AppError::Database(rusqlite::Error::QueryReturnedNoRows);
    let response = error.into_response();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error"], "Database error");
}
