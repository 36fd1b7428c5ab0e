use axum::body::Bytes;
use axum::extract::{FromRequest, FromRequestParts};
use serde::de::DeserializeOwned;

use crate::error::{AppError, Result};

/// `axum::Json` with rejections reported as `{"error": ...}` bodies.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// `axum::extract::Query` with rejections reported as `{"error": ...}` bodies.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct ApiQuery<T>(pub T);

/// `axum::extract::Path` with rejections reported as `{"error": ...}` bodies.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct ApiPath<T>(pub T);

/// Parses a JSON body that may be omitted entirely.
pub fn optional_json<T>(body: &Bytes) -> Result<T>
where
    T: DeserializeOwned + Default,
{
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body).map_err(|e| AppError::BadRequest(e.to_string()))
}
