use chrono::{DateTime, Utc};
use rusqlite::Row;
use serde::{Deserialize, Serialize};

use super::serde_helpers::deserialize_nullable;
use super::FromSqliteRow;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkoutTemplate {
    pub id: u64,
    pub user_id: u64,
    pub name: String,
    pub description: String,
    pub category: String,
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FromSqliteRow for WorkoutTemplate {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            user_id: row.get("user_id")?,
            name: row.get("name")?,
            description: row.get("description")?,
            category: row.get("category")?,
            is_public: row.get("is_public")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

/// A template entry joined with its exercise name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateExercise {
    pub id: u64,
    pub template_id: u64,
    pub exercise_id: u64,
    pub exercise_name: String,
    pub order_index: i32,
    pub target_sets: i32,
    pub target_reps: String,
    pub target_weight: Option<f64>,
    pub rest_seconds: i32,
}

impl FromSqliteRow for TemplateExercise {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            template_id: row.get("template_id")?,
            exercise_id: row.get("exercise_id")?,
            exercise_name: row.get("exercise_name")?,
            order_index: row.get("order_index")?,
            target_sets: row.get("target_sets")?,
            target_reps: row.get("target_reps")?,
            target_weight: row.get("target_weight")?,
            rest_seconds: row.get("rest_seconds")?,
        })
    }
}

impl TemplateExercise {
    /// Note attached to the session exercise created from this entry.
    pub fn target_note(&self) -> String {
        format!("Target: {} sets of {}", self.target_sets, self.target_reps)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TemplateWithExercises {
    #[serde(flatten)]
    pub template: WorkoutTemplate,
    pub exercises: Vec<TemplateExercise>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateTemplate {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub is_public: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateTemplate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub is_public: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TemplateFilter {
    pub category: Option<String>,
    pub include_public: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AddTemplateExercise {
    pub exercise_id: u64,
    /// 0 appends after the current last entry.
    #[serde(default)]
    pub order_index: i32,
    #[serde(default)]
    pub target_sets: i32,
    #[serde(default)]
    pub target_reps: String,
    pub target_weight: Option<f64>,
    #[serde(default)]
    pub rest_seconds: i32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateTemplateExercise {
    pub order_index: Option<i32>,
    pub target_sets: Option<i32>,
    pub target_reps: Option<String>,
    #[serde(default, deserialize_with = "deserialize_nullable")]
    pub target_weight: Option<Option<f64>>,
    pub rest_seconds: Option<i32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DuplicateTemplate {
    pub name: Option<String>,
}

/// Name for a copy when the caller does not pick one.
pub fn copy_name(original: &str, requested: Option<&str>) -> String {
    match requested.map(str::trim) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => format!("{} (Copy)", original),
    }
}
