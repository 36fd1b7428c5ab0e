//! Owned-chain lookups shared by the repositories.
//!
//! Each check resolves a row only when the caller owns it (directly or through
//! its parents) and reports anything else as not found, so callers cannot
//! probe for other users' data.

use rusqlite::{Connection, OptionalExtension};

use crate::error::{AppError, Result};
use crate::models::{
    Exercise, ExerciseSet, FastSession, FromSqliteRow, SessionExercise, WaterLog, WorkoutSession,
    WorkoutTemplate,
};

pub(crate) const SESSION_EXERCISE_COLUMNS: &str =
    "se.id, se.session_id, se.exercise_id, e.name AS exercise_name, se.order_index, se.notes, se.completed_at";

pub(crate) const TEMPLATE_EXERCISE_COLUMNS: &str =
    "te.id, te.template_id, te.exercise_id, e.name AS exercise_name, te.order_index, te.target_sets, te.target_reps, te.target_weight, te.rest_seconds";

pub fn owned_session(conn: &Connection, session_id: u64, user_id: u64) -> Result<WorkoutSession> {
    conn.query_row(
        "SELECT * FROM workout_sessions
         WHERE id = ? AND user_id = ? AND deleted_at IS NULL",
        rusqlite::params![session_id, user_id],
        WorkoutSession::from_row,
    )
    .optional()?
    .ok_or_else(|| AppError::not_found("Workout"))
}

pub fn owned_session_exercise(
    conn: &Connection,
    session_id: u64,
    session_exercise_id: u64,
    user_id: u64,
) -> Result<SessionExercise> {
    let sql = format!(
        "SELECT {} FROM session_exercises se
         JOIN workout_sessions ws ON ws.id = se.session_id
         JOIN exercises e ON e.id = se.exercise_id
         WHERE se.id = ? AND ws.id = ? AND ws.user_id = ?
           AND se.deleted_at IS NULL AND ws.deleted_at IS NULL",
        SESSION_EXERCISE_COLUMNS
    );
    conn.query_row(
        &sql,
        rusqlite::params![session_exercise_id, session_id, user_id],
        SessionExercise::from_row,
    )
    .optional()?
    .ok_or_else(|| AppError::not_found("Workout exercise"))
}

pub fn owned_set(conn: &Connection, session_id: u64, set_id: u64, user_id: u64) -> Result<ExerciseSet> {
    conn.query_row(
        "SELECT s.* FROM exercise_sets s
         JOIN session_exercises se ON se.id = s.session_exercise_id
         JOIN workout_sessions ws ON ws.id = se.session_id
         WHERE s.id = ? AND ws.id = ? AND ws.user_id = ?
           AND s.deleted_at IS NULL AND se.deleted_at IS NULL AND ws.deleted_at IS NULL",
        rusqlite::params![set_id, session_id, user_id],
        ExerciseSet::from_row,
    )
    .optional()?
    .ok_or_else(|| AppError::not_found("Set"))
}

pub fn owned_template(conn: &Connection, template_id: u64, user_id: u64) -> Result<WorkoutTemplate> {
    conn.query_row(
        "SELECT * FROM workout_templates
         WHERE id = ? AND user_id = ? AND deleted_at IS NULL",
        rusqlite::params![template_id, user_id],
        WorkoutTemplate::from_row,
    )
    .optional()?
    .ok_or_else(|| AppError::not_found("Template"))
}

/// Templates the caller owns, plus everyone's public templates.
pub fn readable_template(
    conn: &Connection,
    template_id: u64,
    user_id: u64,
) -> Result<WorkoutTemplate> {
    conn.query_row(
        "SELECT * FROM workout_templates
         WHERE id = ? AND (user_id = ? OR is_public = 1) AND deleted_at IS NULL",
        rusqlite::params![template_id, user_id],
        WorkoutTemplate::from_row,
    )
    .optional()?
    .ok_or_else(|| AppError::not_found("Template"))
}

/// Built-in exercises, plus the caller's own custom ones.
pub fn visible_exercise(
    conn: &Connection,
    exercise_id: u64,
    user_id: Option<u64>,
) -> Result<Exercise> {
    conn.query_row(
        "SELECT * FROM exercises
         WHERE id = ? AND (is_custom = 0 OR created_by_user_id = ?) AND deleted_at IS NULL",
        rusqlite::params![exercise_id, user_id],
        Exercise::from_row,
    )
    .optional()?
    .ok_or_else(|| AppError::not_found("Exercise"))
}

pub fn owned_custom_exercise(conn: &Connection, exercise_id: u64, user_id: u64) -> Result<Exercise> {
    conn.query_row(
        "SELECT * FROM exercises
         WHERE id = ? AND is_custom = 1 AND created_by_user_id = ? AND deleted_at IS NULL",
        rusqlite::params![exercise_id, user_id],
        Exercise::from_row,
    )
    .optional()?
    .ok_or_else(|| AppError::not_found("Exercise"))
}

pub fn owned_fast(conn: &Connection, fast_id: u64, user_id: u64) -> Result<FastSession> {
    conn.query_row(
        "SELECT * FROM fast_sessions
         WHERE id = ? AND user_id = ? AND deleted_at IS NULL",
        rusqlite::params![fast_id, user_id],
        FastSession::from_row,
    )
    .optional()?
    .ok_or_else(|| AppError::not_found("Fast"))
}

pub fn owned_water_log(conn: &Connection, log_id: u64, user_id: u64) -> Result<WaterLog> {
    conn.query_row(
        "SELECT * FROM water_logs
         WHERE id = ? AND user_id = ? AND deleted_at IS NULL",
        rusqlite::params![log_id, user_id],
        WaterLog::from_row,
    )
    .optional()?
    .ok_or_else(|| AppError::not_found("Water log"))
}
