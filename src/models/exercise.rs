use chrono::{DateTime, Utc};
use rusqlite::Row;
use serde::{Deserialize, Serialize};

use super::FromSqliteRow;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Exercise {
    pub id: u64,
    pub name: String,
    /// Comma-separated, e.g. `"chest,shoulders,triceps"`.
    pub muscle_groups: String,
    pub equipment: String,
    pub instructions: String,
    pub is_custom: bool,
    pub created_by_user_id: Option<u64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FromSqliteRow for Exercise {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            muscle_groups: row.get("muscle_groups")?,
            equipment: row.get("equipment")?,
            instructions: row.get("instructions")?,
            is_custom: row.get("is_custom")?,
            created_by_user_id: row.get("created_by_user_id")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateExercise {
    pub name: String,
    #[serde(default)]
    pub muscle_groups: String,
    #[serde(default)]
    pub equipment: String,
    #[serde(default)]
    pub instructions: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateExercise {
    pub name: Option<String>,
    pub muscle_groups: Option<String>,
    pub equipment: Option<String>,
    pub instructions: Option<String>,
}

/// Query parameters for catalog browsing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExerciseFilter {
    pub muscle_group: Option<String>,
    pub equipment: Option<String>,
    pub search: Option<String>,
    pub include_custom: Option<bool>,
}

impl ExerciseFilter {
    pub fn include_custom(&self) -> bool {
        self.include_custom.unwrap_or(true)
    }
}

pub struct DefaultExercise {
    pub name: &'static str,
    pub muscle_groups: &'static str,
    pub equipment: &'static str,
    pub instructions: &'static str,
}

pub const DEFAULT_EXERCISES: &[DefaultExercise] = &[
    DefaultExercise {
        name: "Push-ups",
        muscle_groups: "chest,shoulders,triceps",
        equipment: "bodyweight",
        instructions: "Start in plank position, lower body until chest nearly touches floor, push back up.",
    },
    DefaultExercise {
        name: "Squats",
        muscle_groups: "legs,glutes",
        equipment: "bodyweight",
        instructions: "Stand with feet shoulder-width apart, lower hips until thighs parallel to floor, stand back up.",
    },
    DefaultExercise {
        name: "Pull-ups",
        muscle_groups: "back,biceps",
        equipment: "pull-up bar",
        instructions: "Hang from bar with palms facing away, pull body up until chin over bar, lower with control.",
    },
    DefaultExercise {
        name: "Plank",
        muscle_groups: "core,shoulders",
        equipment: "bodyweight",
        instructions: "Hold push-up position with forearms on ground, keep body straight from head to heels.",
    },
    DefaultExercise {
        name: "Deadlift",
        muscle_groups: "back,legs,glutes",
        equipment: "barbell",
        instructions: "Stand with feet hip-width apart, bend at hips and knees to lift barbell from floor to standing.",
    },
];
