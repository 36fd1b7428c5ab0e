use std::sync::Arc;

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};

use crate::auth::TokenVerifier;
use crate::error::AppError;
use crate::repositories::UserRepository;

/// Installed as a router `Extension` so every extractor can reach it.
#[derive(Clone)]
pub struct AuthState {
    pub verifier: Arc<dyn TokenVerifier>,
    pub user_repo: UserRepository,
}

#[derive(Clone, Debug)]
pub struct AuthUser {
    pub id: u64,
    pub subject: String,
}

impl AuthUser {
    async fn from_bearer(auth: &AuthState, token: &str) -> Result<Self, AppError> {
        let identity = auth
            .verifier
            .verify(token)
            .await
            .ok_or(AppError::Unauthorized)?;
        let user = auth.user_repo.find_or_create(identity).await?;

        Ok(Self {
            id: user.id,
            subject: user.subject,
        })
    }
}

fn auth_state(parts: &Parts) -> Result<AuthState, AppError> {
    parts
        .extensions
        .get::<AuthState>()
        .cloned()
        .ok_or_else(|| AppError::Internal("AuthState extension missing".to_string()))
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth = auth_state(parts)?;
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| AppError::Unauthorized)?;

        AuthUser::from_bearer(&auth, bearer.token()).await
    }
}

// Optional auth - anonymous when no token is sent, 401 when a bad one is
pub struct OptionalAuthUser(pub Option<AuthUser>);

impl<S> FromRequestParts<S> for OptionalAuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if !parts.headers.contains_key(header::AUTHORIZATION) {
            return Ok(OptionalAuthUser(None));
        }

        let user = AuthUser::from_request_parts(parts, state).await?;
        Ok(OptionalAuthUser(Some(user)))
    }
}

impl OptionalAuthUser {
    pub fn user_id(&self) -> Option<u64> {
        self.0.as_ref().map(|user| user.id)
    }
}
