use std::collections::BTreeSet;

use chrono::Utc;
use rusqlite::types::Value;
use rusqlite::{Connection, OptionalExtension};

use crate::db::DbPool;
use crate::error::{conflict_on_unique, AppError, Result};
use crate::models::exercise::DEFAULT_EXERCISES;
use crate::models::{CreateExercise, Exercise, ExerciseFilter, FromSqliteRow, UpdateExercise};
use crate::repositories::ownership::{owned_custom_exercise, visible_exercise};

#[derive(Clone)]
pub struct ExerciseRepository {
    pool: DbPool,
}

impl ExerciseRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Built-ins first, then the caller's customs when requested.
    pub async fn list(&self, user_id: Option<u64>, filter: ExerciseFilter) -> Result<Vec<Exercise>> {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;

            let mut sql = String::from("SELECT * FROM exercises WHERE deleted_at IS NULL");
            let mut params: Vec<Value> = Vec::new();

            match user_id.filter(|_| filter.include_custom()) {
                Some(user_id) => {
                    sql.push_str(" AND (is_custom = 0 OR created_by_user_id = ?)");
                    params.push(Value::Integer(user_id as i64));
                }
                None => sql.push_str(" AND is_custom = 0"),
            }

            for (column, term) in [
                ("muscle_groups", &filter.muscle_group),
                ("equipment", &filter.equipment),
                ("name", &filter.search),
            ] {
                if let Some(term) = term.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
                    sql.push_str(&format!(" AND {} LIKE '%' || ? || '%'", column));
                    params.push(Value::Text(term.to_string()));
                }
            }

            sql.push_str(" ORDER BY is_custom, name");

            let mut stmt = conn.prepare(&sql)?;
            let exercises = stmt
                .query_map(rusqlite::params_from_iter(params), Exercise::from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(exercises)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    pub async fn find_visible(&self, id: u64, user_id: Option<u64>) -> Result<Exercise> {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            visible_exercise(&conn, id, user_id)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    pub async fn create(&self, user_id: u64, input: CreateExercise) -> Result<Exercise> {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let name = input.name.trim();
            if name.is_empty() {
                return Err(AppError::Validation("Exercise name is required".to_string()));
            }
            ensure_unique_name(&conn, user_id, name, None)?;

            let now = Utc::now();
            conn.execute(
                "INSERT INTO exercises
                    (name, muscle_groups, equipment, instructions, is_custom, created_by_user_id, created_at, updated_at)
                 VALUES (?, ?, ?, ?, 1, ?, ?, ?)",
                rusqlite::params![
                    name,
                    input.muscle_groups.trim(),
                    input.equipment.trim(),
                    input.instructions.trim(),
                    user_id,
                    now,
                    now
                ],
            )
            .map_err(conflict_on_unique(format!("Exercise '{}' already exists", name)))?;
            let id = conn.last_insert_rowid() as u64;
            tracing::debug!("Created custom exercise {} for user {}", id, user_id);

            visible_exercise(&conn, id, Some(user_id))
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    pub async fn update(&self, id: u64, user_id: u64, input: UpdateExercise) -> Result<Exercise> {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let mut exercise = owned_custom_exercise(&conn, id, user_id)?;

            if let Some(name) = input.name {
                let name = name.trim();
                if name.is_empty() {
                    return Err(AppError::Validation("Exercise name cannot be empty".to_string()));
                }
                if name != exercise.name {
                    ensure_unique_name(&conn, user_id, name, Some(id))?;
                }
                exercise.name = name.to_string();
            }
            if let Some(muscle_groups) = input.muscle_groups {
                exercise.muscle_groups = muscle_groups.trim().to_string();
            }
            if let Some(equipment) = input.equipment {
                exercise.equipment = equipment.trim().to_string();
            }
            if let Some(instructions) = input.instructions {
                exercise.instructions = instructions.trim().to_string();
            }

            conn.execute(
                "UPDATE exercises
                 SET name = ?, muscle_groups = ?, equipment = ?, instructions = ?, updated_at = ?
                 WHERE id = ?",
                rusqlite::params![
                    exercise.name,
                    exercise.muscle_groups,
                    exercise.equipment,
                    exercise.instructions,
                    Utc::now(),
                    id
                ],
            )
            .map_err(conflict_on_unique(format!("Exercise '{}' already exists", exercise.name)))?;

            owned_custom_exercise(&conn, id, user_id)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    pub async fn delete(&self, id: u64, user_id: u64) -> Result<()> {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            owned_custom_exercise(&conn, id, user_id)?;

            let references: i64 = conn.query_row(
                "SELECT
                    (SELECT COUNT(*) FROM template_exercises WHERE exercise_id = ?1 AND deleted_at IS NULL)
                  + (SELECT COUNT(*) FROM session_exercises WHERE exercise_id = ?1 AND deleted_at IS NULL)",
                [id],
                |row| row.get(0),
            )?;
            if references > 0 {
                return Err(AppError::Conflict(
                    "Exercise is used in templates or workouts".to_string(),
                ));
            }

            conn.execute(
                "UPDATE exercises SET deleted_at = ? WHERE id = ?",
                rusqlite::params![Utc::now(), id],
            )?;
            tracing::info!("Deleted custom exercise {} for user {}", id, user_id);
            Ok(())
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    /// Distinct muscle groups across built-in exercises.
    pub async fn muscle_groups(&self) -> Result<Vec<String>> {
        self.builtin_values("muscle_groups").await
    }

    /// Distinct equipment across built-in exercises.
    pub async fn equipment(&self) -> Result<Vec<String>> {
        self.builtin_values("equipment").await
    }

    async fn builtin_values(&self, column: &'static str) -> Result<Vec<String>> {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM exercises WHERE is_custom = 0 AND deleted_at IS NULL",
                column
            ))?;
            let raw = stmt
                .query_map([], |row| row.get::<_, String>(0))?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            let values: BTreeSet<String> = raw
                .iter()
                .flat_map(|value| value.split(','))
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(str::to_string)
                .collect();
            Ok(values.into_iter().collect())
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    /// Inserts the built-in catalog when no exercises exist yet.
    pub async fn seed_defaults(&self) -> Result<usize> {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool.get()?;
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM exercises WHERE deleted_at IS NULL",
                [],
                |row| row.get(0),
            )?;
            if count > 0 {
                return Ok(0);
            }

            let now = Utc::now();
            let tx = conn.transaction()?;
            for exercise in DEFAULT_EXERCISES {
                tx.execute(
                    "INSERT INTO exercises
                        (name, muscle_groups, equipment, instructions, is_custom, created_at, updated_at)
                     VALUES (?, ?, ?, ?, 0, ?, ?)",
                    rusqlite::params![
                        exercise.name,
                        exercise.muscle_groups,
                        exercise.equipment,
                        exercise.instructions,
                        now,
                        now
                    ],
                )?;
            }
            tx.commit()?;

            tracing::info!("Seeded {} default exercises", DEFAULT_EXERCISES.len());
            Ok(DEFAULT_EXERCISES.len())
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }
}

fn ensure_unique_name(conn: &Connection, user_id: u64, name: &str, exclude_id: Option<u64>) -> Result<()> {
    let existing: Option<u64> = conn
        .query_row(
            "SELECT id FROM exercises
             WHERE created_by_user_id = ? AND name = ? AND deleted_at IS NULL
               AND (?3 IS NULL OR id != ?3)",
            rusqlite::params![user_id, name, exclude_id],
            |row| row.get(0),
        )
        .optional()?;

    match existing {
        Some(_) => Err(AppError::Conflict(format!(
            "Exercise '{}' already exists",
            name
        ))),
        None => Ok(()),
    }
}
