use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::Row;
use serde::{Deserialize, Serialize};

use super::serde_helpers::deserialize_nullable;
use super::FromSqliteRow;
use crate::error::{AppError, Result};

pub const DEFAULT_HISTORY_LIMIT: i64 = 20;
pub const MAX_HISTORY_LIMIT: i64 = 100;
pub const DEFAULT_STATS_DAYS: i64 = 30;
pub const MAX_STATS_DAYS: i64 = 36_500;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkoutSession {
    pub id: u64,
    pub user_id: u64,
    pub template_id: Option<u64>,
    pub name: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub duration_minutes: Option<i64>,
    pub notes: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FromSqliteRow for WorkoutSession {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let ended_at: Option<DateTime<Utc>> = row.get("ended_at")?;
        Ok(Self {
            id: row.get("id")?,
            user_id: row.get("user_id")?,
            template_id: row.get("template_id")?,
            name: row.get("name")?,
            started_at: row.get("started_at")?,
            is_active: ended_at.is_none(),
            ended_at,
            duration_minutes: row.get("duration_minutes")?,
            notes: row.get("notes")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

/// An exercise performed within a session, joined with its name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionExercise {
    pub id: u64,
    pub session_id: u64,
    pub exercise_id: u64,
    pub exercise_name: String,
    pub order_index: i32,
    pub notes: String,
    pub completed_at: Option<DateTime<Utc>>,
    pub sets: Vec<ExerciseSet>,
}

impl FromSqliteRow for SessionExercise {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            session_id: row.get("session_id")?,
            exercise_id: row.get("exercise_id")?,
            exercise_name: row.get("exercise_name")?,
            order_index: row.get("order_index")?,
            notes: row.get("notes")?,
            completed_at: row.get("completed_at")?,
            sets: Vec::new(),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExerciseSet {
    pub id: u64,
    pub session_exercise_id: u64,
    pub set_number: i32,
    pub reps: Option<i32>,
    pub weight: Option<f64>,
    pub duration_seconds: Option<i32>,
    pub distance_meters: Option<f64>,
    pub rpe: Option<i32>,
    pub completed_at: DateTime<Utc>,
}

impl FromSqliteRow for ExerciseSet {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            session_exercise_id: row.get("session_exercise_id")?,
            set_number: row.get("set_number")?,
            reps: row.get("reps")?,
            weight: row.get("weight")?,
            duration_seconds: row.get("duration_seconds")?,
            distance_meters: row.get("distance_meters")?,
            rpe: row.get("rpe")?,
            completed_at: row.get("completed_at")?,
        })
    }
}

impl ExerciseSet {
    pub fn validate(&self) -> Result<()> {
        validate_set_metrics(
            self.reps,
            self.weight,
            self.duration_seconds,
            self.distance_meters,
            self.rpe,
        )
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct WorkoutWithDetails {
    #[serde(flatten)]
    pub session: WorkoutSession,
    pub exercises: Vec<SessionExercise>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct WorkoutStats {
    pub total_workouts: i64,
    pub total_minutes: i64,
    pub total_sets: i64,
    pub average_duration: f64,
    pub days: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StartWorkout {
    pub name: String,
    pub template_id: Option<u64>,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateWorkout {
    pub name: Option<String>,
    pub notes: Option<String>,
    pub ended_at: Option<DateTime<Utc>>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AddSessionExercise {
    pub exercise_id: u64,
    #[serde(default)]
    pub order_index: i32,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateSessionExercise {
    pub order_index: Option<i32>,
    pub notes: Option<String>,
    #[serde(default, deserialize_with = "deserialize_nullable")]
    pub completed_at: Option<Option<DateTime<Utc>>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LogSet {
    pub reps: Option<i32>,
    pub weight: Option<f64>,
    pub duration_seconds: Option<i32>,
    pub distance_meters: Option<f64>,
    pub rpe: Option<i32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateSet {
    #[serde(default, deserialize_with = "deserialize_nullable")]
    pub reps: Option<Option<i32>>,
    #[serde(default, deserialize_with = "deserialize_nullable")]
    pub weight: Option<Option<f64>>,
    #[serde(default, deserialize_with = "deserialize_nullable")]
    pub duration_seconds: Option<Option<i32>>,
    #[serde(default, deserialize_with = "deserialize_nullable")]
    pub distance_meters: Option<Option<f64>>,
    #[serde(default, deserialize_with = "deserialize_nullable")]
    pub rpe: Option<Option<i32>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl HistoryQuery {
    pub fn limit(&self) -> i64 {
        self.limit
            .unwrap_or(DEFAULT_HISTORY_LIMIT)
            .clamp(1, MAX_HISTORY_LIMIT)
    }

    pub fn offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatsQuery {
    pub days: Option<i64>,
}

impl StatsQuery {
    pub fn days(&self) -> i64 {
        match self.days {
            Some(days) if days > 0 => days.min(MAX_STATS_DAYS),
            _ => DEFAULT_STATS_DAYS,
        }
    }
}

/// Whole minutes elapsed, rounded down.
pub fn duration_minutes(started_at: DateTime<Utc>, ended_at: DateTime<Utc>) -> i64 {
    (ended_at - started_at).num_minutes()
}

/// Position after the current maximum; lists start at 1.
pub fn next_order_index(current_max: Option<i32>) -> i32 {
    current_max.unwrap_or(0) + 1
}

/// Set numbers continue from the highest ever recorded, deleted sets included.
pub fn next_set_number(highest_recorded: Option<i32>) -> i32 {
    highest_recorded.unwrap_or(0) + 1
}

pub fn average_duration(total_minutes: i64, total_workouts: i64) -> f64 {
    if total_workouts == 0 {
        0.0
    } else {
        total_minutes as f64 / total_workouts as f64
    }
}

pub fn validate_set_metrics(
    reps: Option<i32>,
    weight: Option<f64>,
    duration_seconds: Option<i32>,
    distance_meters: Option<f64>,
    rpe: Option<i32>,
) -> Result<()> {
    if reps.is_none() && weight.is_none() && duration_seconds.is_none() && distance_meters.is_none()
    {
        return Err(AppError::Validation(
            "At least one of reps, weight, duration_seconds or distance_meters is required"
                .to_string(),
        ));
    }

    if let Some(rpe) = rpe {
        if !(1..=10).contains(&rpe) {
            return Err(AppError::Validation(
                "RPE must be between 1 and 10".to_string(),
            ));
        }
    }

    Ok(())
}
