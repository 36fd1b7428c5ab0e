#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use fitlog::auth::{StaticTokenVerifier, VerifiedIdentity};
use fitlog::db::{create_memory_pool, DbPool};
use fitlog::handlers::{exercises, fasting, profile, templates, water, workouts};
use fitlog::middleware::AuthState;
use fitlog::migrations::run_migrations_for_tests;
use fitlog::repositories::{
    ExerciseRepository, FastingRepository, TemplateRepository, UserRepository, WaterRepository,
    WorkoutRepository,
};
use fitlog::routes::{create_router, AppStates};

pub const ALICE: &str = "alice-token";
pub const BOB: &str = "bob-token";

pub fn setup_test_db() -> DbPool {
    let pool = create_memory_pool().expect("Failed to create test database");
    run_migrations_for_tests(&pool).expect("Failed to run migrations");
    pool
}

fn identity(subject: &str, email: &str) -> VerifiedIdentity {
    VerifiedIdentity {
        subject: subject.to_string(),
        email: Some(email.to_string()),
        name: None,
    }
}

pub fn create_test_app(pool: DbPool) -> Router {
    let verifier = StaticTokenVerifier::new([
        (ALICE.to_string(), identity("alice", "alice@example.com")),
        (BOB.to_string(), identity("bob", "bob@example.com")),
    ]);
    let user_repo = UserRepository::new(pool.clone());

    let auth_state = AuthState {
        verifier: Arc::new(verifier),
        user_repo: user_repo.clone(),
    };
    let states = AppStates {
        profile: profile::ProfileState { user_repo },
        exercises: exercises::ExercisesState {
            exercise_repo: ExerciseRepository::new(pool.clone()),
        },
        templates: templates::TemplatesState {
            template_repo: TemplateRepository::new(pool.clone()),
        },
        workouts: workouts::WorkoutsState {
            workout_repo: WorkoutRepository::new(pool.clone()),
        },
        fasting: fasting::FastingState {
            fasting_repo: FastingRepository::new(pool.clone()),
        },
        water: water::WaterState {
            water_repo: WaterRepository::new(pool),
        },
    };

    create_router(auth_state, states)
}

/// App over a fresh database with the built-in catalog and fast types.
pub async fn create_seeded_app() -> Router {
    let pool = setup_test_db();
    ExerciseRepository::new(pool.clone())
        .seed_defaults()
        .await
        .unwrap();
    FastingRepository::new(pool.clone())
        .seed_default_types()
        .await
        .unwrap();
    create_test_app(pool)
}

pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };

    (status, json)
}

pub async fn get(app: &Router, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
    send(app, Method::GET, uri, token, None).await
}

pub async fn post(app: &Router, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
    send(app, Method::POST, uri, Some(token), Some(body)).await
}

pub async fn put(app: &Router, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
    send(app, Method::PUT, uri, Some(token), Some(body)).await
}

pub async fn delete(app: &Router, uri: &str, token: &str) -> (StatusCode, Value) {
    send(app, Method::DELETE, uri, Some(token), None).await
}

pub async fn exercise_id(app: &Router, name: &str) -> u64 {
    let (_, body) = get(app, &format!("/api/exercises?search={}", name), None).await;
    body["exercises"]
        .as_array()
        .unwrap()
        .iter()
        .find(|e| e["name"] == name)
        .and_then(|e| e["id"].as_u64())
        .unwrap()
}
