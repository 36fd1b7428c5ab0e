use axum::{
    routing::{delete, get, patch, post, put},
    Extension, Router,
};

use crate::handlers::{exercises, fasting, health, profile, templates, water, workouts};
use crate::middleware::AuthState;

pub struct AppStates {
    pub profile: profile::ProfileState,
    pub exercises: exercises::ExercisesState,
    pub templates: templates::TemplatesState,
    pub workouts: workouts::WorkoutsState,
    pub fasting: fasting::FastingState,
    pub water: water::WaterState,
}

pub fn create_router(auth_state: AuthState, states: AppStates) -> Router {
    Router::new()
        .route("/", get(health::welcome))
        .route("/health", get(health::health_check))
        // Profile
        .route("/api/auth/me", get(profile::me).put(profile::update_me))
        .route("/api/auth/me/settings", patch(profile::update_settings))
        .with_state(states.profile)
        // Exercise catalog
        .route("/api/exercises", get(exercises::list).post(exercises::create))
        .route("/api/exercises/muscle-groups", get(exercises::muscle_groups))
        .route("/api/exercises/equipment", get(exercises::equipment))
        .route(
            "/api/exercises/{id}",
            get(exercises::show)
                .put(exercises::update)
                .delete(exercises::delete),
        )
        .with_state(states.exercises)
        // Templates
        .route("/api/templates", get(templates::list).post(templates::create))
        .route("/api/templates/categories", get(templates::categories))
        .route(
            "/api/templates/{id}",
            get(templates::show)
                .put(templates::update)
                .delete(templates::delete),
        )
        .route("/api/templates/{id}/duplicate", post(templates::duplicate))
        .route("/api/templates/{id}/exercises", post(templates::add_exercise))
        .route(
            "/api/templates/{id}/exercises/{exercise_id}",
            put(templates::update_exercise).delete(templates::remove_exercise),
        )
        .with_state(states.templates)
        // Workout sessions
        .route("/api/workouts", get(workouts::list).post(workouts::start))
        .route("/api/workouts/active", get(workouts::active))
        .route("/api/workouts/stats", get(workouts::stats))
        .route(
            "/api/workouts/{id}",
            get(workouts::show)
                .put(workouts::update)
                .delete(workouts::delete),
        )
        .route("/api/workouts/{id}/exercises", post(workouts::add_exercise))
        .route(
            "/api/workouts/{id}/exercises/{session_exercise_id}",
            put(workouts::update_exercise).delete(workouts::remove_exercise),
        )
        .route(
            "/api/workouts/{id}/exercises/{session_exercise_id}/sets",
            post(workouts::log_set),
        )
        .route(
            "/api/workouts/{id}/sets/{set_id}",
            put(workouts::update_set).delete(workouts::delete_set),
        )
        .with_state(states.workouts)
        // Fasting
        .route("/api/fasts", get(fasting::history).post(fasting::start))
        .route("/api/fasts/types", get(fasting::types))
        .route("/api/fasts/current", get(fasting::current))
        .route("/api/fasts/record", post(fasting::record))
        .route("/api/fasts/{id}", put(fasting::end))
        .with_state(states.fasting)
        // Water
        .route("/api/water", get(water::list).post(water::log))
        .route("/api/water/latest", delete(water::delete_latest))
        .route("/api/water/{id}", delete(water::delete))
        .with_state(states.water)
        .layer(Extension(auth_state))
}
