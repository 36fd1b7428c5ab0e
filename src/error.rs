use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use rusqlite::ffi;
use serde_json::json;
use std::num::TryFromIntError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(rusqlite::Error),

    #[error("Pool error: {0}")]
    Pool(#[from] r2d2::Error),

    /// Missing rows and rows owned by someone else are reported the same way.
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn not_found(what: &str) -> Self {
        AppError::NotFound(format!("{} not found", what))
    }
}

impl From<rusqlite::Error> for AppError {
    fn from(e: rusqlite::Error) -> Self {
        match &e {
            // Ids above i64::MAX cannot be bound, so no row can carry them
            rusqlite::Error::ToSqlConversionFailure(inner) if inner.is::<TryFromIntError>() => {
                AppError::NotFound("Record not found".to_string())
            }
            _ => AppError::Database(e),
        }
    }
}

/// Maps a unique-index violation on a write to `Conflict`.
pub fn conflict_on_unique(message: String) -> impl FnOnce(rusqlite::Error) -> AppError {
    move |e| match &e {
        rusqlite::Error::SqliteFailure(err, _)
            if err.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE =>
        {
            AppError::Conflict(message)
        }
        _ => AppError::from(e),
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database error".to_string(),
                )
            }
            AppError::Pool(e) => {
                tracing::error!("Pool error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database error".to_string(),
                )
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal error".to_string(),
                )
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_range_id_is_not_found() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        let err = conn
            .query_row("SELECT ?", [u64::MAX], |row| row.get::<_, i64>(0))
            .unwrap_err();

        assert!(matches!(AppError::from(err), AppError::NotFound(_)));
    }

    #[test]
    fn test_conflict_on_unique() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE t (name TEXT NOT NULL);
             CREATE UNIQUE INDEX idx_t_name ON t (name);
             INSERT INTO t (name) VALUES ('Leg Day');",
        )
        .unwrap();

        let err = conn
            .execute("INSERT INTO t (name) VALUES ('Leg Day')", [])
            .unwrap_err();
        let mapped = conflict_on_unique("Template 'Leg Day' already exists".to_string())(err);
        assert!(matches!(mapped, AppError::Conflict(msg) if msg.contains("Leg Day")));

        let err = conn.execute("INSERT INTO missing VALUES (1)", []).unwrap_err();
        let mapped = conflict_on_unique("unused".to_string())(err);
        assert!(matches!(mapped, AppError::Database(_)));
    }
}
