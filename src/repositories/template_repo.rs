use chrono::Utc;
use rusqlite::types::Value;
use rusqlite::{Connection, OptionalExtension};

use crate::db::DbPool;
use crate::error::{conflict_on_unique, AppError, Result};
use crate::models::from_row::query_all;
use crate::models::template::copy_name;
use crate::models::workout_session::next_order_index;
use crate::models::{
    AddTemplateExercise, CreateTemplate, DuplicateTemplate, FromSqliteRow, TemplateExercise,
    TemplateFilter, TemplateWithExercises, UpdateTemplate, UpdateTemplateExercise,
    WorkoutTemplate,
};
use crate::repositories::ownership::{
    owned_template, readable_template, visible_exercise, TEMPLATE_EXERCISE_COLUMNS,
};

#[derive(Clone)]
pub struct TemplateRepository {
    pool: DbPool,
}

impl TemplateRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// The caller's templates, plus public ones when requested. Newest first.
    pub async fn list(
        &self,
        user_id: u64,
        filter: TemplateFilter,
    ) -> Result<Vec<TemplateWithExercises>> {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;

            let mut sql = String::from("SELECT * FROM workout_templates WHERE deleted_at IS NULL");
            let mut params = vec![Value::Integer(user_id as i64)];
            if filter.include_public.unwrap_or(false) {
                sql.push_str(" AND (user_id = ? OR is_public = 1)");
            } else {
                sql.push_str(" AND user_id = ?");
            }
            if let Some(category) = filter
                .category
                .as_deref()
                .map(str::trim)
                .filter(|c| !c.is_empty())
            {
                sql.push_str(" AND category = ?");
                params.push(Value::Text(category.to_string()));
            }
            sql.push_str(" ORDER BY created_at DESC, id DESC");

            let mut stmt = conn.prepare(&sql)?;
            let templates = stmt
                .query_map(rusqlite::params_from_iter(params), WorkoutTemplate::from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            templates
                .into_iter()
                .map(|template| with_exercises(&conn, template))
                .collect()
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    pub async fn get(&self, id: u64, user_id: u64) -> Result<TemplateWithExercises> {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let template = readable_template(&conn, id, user_id)?;
            with_exercises(&conn, template)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    pub async fn create(&self, user_id: u64, input: CreateTemplate) -> Result<TemplateWithExercises> {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let name = input.name.trim();
            if name.is_empty() {
                return Err(AppError::Validation("Template name is required".to_string()));
            }
            ensure_unique_name(&conn, user_id, name, None)?;

            let now = Utc::now();
            conn.execute(
                "INSERT INTO workout_templates
                    (user_id, name, description, category, is_public, created_at, updated_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?)",
                rusqlite::params![
                    user_id,
                    name,
                    input.description.trim(),
                    input.category.trim(),
                    input.is_public,
                    now,
                    now
                ],
            )
            .map_err(conflict_on_unique(format!("Template '{}' already exists", name)))?;
            let id = conn.last_insert_rowid() as u64;
            tracing::debug!("Created template {} for user {}", id, user_id);

            let template = owned_template(&conn, id, user_id)?;
            with_exercises(&conn, template)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    pub async fn update(
        &self,
        id: u64,
        user_id: u64,
        input: UpdateTemplate,
    ) -> Result<TemplateWithExercises> {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let mut template = owned_template(&conn, id, user_id)?;

            if let Some(name) = input.name {
                let name = name.trim();
                if name.is_empty() {
                    return Err(AppError::Validation("Template name cannot be empty".to_string()));
                }
                if name != template.name {
                    ensure_unique_name(&conn, user_id, name, Some(id))?;
                }
                template.name = name.to_string();
            }
            if let Some(description) = input.description {
                template.description = description.trim().to_string();
            }
            if let Some(category) = input.category {
                template.category = category.trim().to_string();
            }
            if let Some(is_public) = input.is_public {
                template.is_public = is_public;
            }

            conn.execute(
                "UPDATE workout_templates
                 SET name = ?, description = ?, category = ?, is_public = ?, updated_at = ?
                 WHERE id = ?",
                rusqlite::params![
                    template.name,
                    template.description,
                    template.category,
                    template.is_public,
                    Utc::now(),
                    id
                ],
            )
            .map_err(conflict_on_unique(format!("Template '{}' already exists", template.name)))?;

            let template = owned_template(&conn, id, user_id)?;
            with_exercises(&conn, template)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    /// Soft-deletes the template and its entries. Refused while workouts use it.
    pub async fn delete(&self, id: u64, user_id: u64) -> Result<()> {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool.get()?;
            owned_template(&conn, id, user_id)?;

            let in_use: i64 = conn.query_row(
                "SELECT COUNT(*) FROM workout_sessions WHERE template_id = ? AND deleted_at IS NULL",
                [id],
                |row| row.get(0),
            )?;
            if in_use > 0 {
                return Err(AppError::Conflict(
                    "Template is used by existing workouts".to_string(),
                ));
            }

            let now = Utc::now();
            let tx = conn.transaction()?;
            tx.execute(
                "UPDATE template_exercises SET deleted_at = ?
                 WHERE template_id = ? AND deleted_at IS NULL",
                rusqlite::params![now, id],
            )?;
            tx.execute(
                "UPDATE workout_templates SET deleted_at = ? WHERE id = ?",
                rusqlite::params![now, id],
            )?;
            tx.commit()?;

            tracing::info!("Deleted template {} for user {}", id, user_id);
            Ok(())
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    pub async fn add_exercise(
        &self,
        template_id: u64,
        user_id: u64,
        input: AddTemplateExercise,
    ) -> Result<TemplateExercise> {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            owned_template(&conn, template_id, user_id)?;
            visible_exercise(&conn, input.exercise_id, Some(user_id))?;

            if find_entry(&conn, template_id, input.exercise_id)?.is_some() {
                return Err(AppError::Conflict(
                    "Exercise is already in this template".to_string(),
                ));
            }

            let order_index = if input.order_index == 0 {
                let current_max: Option<i32> = conn.query_row(
                    "SELECT MAX(order_index) FROM template_exercises
                     WHERE template_id = ? AND deleted_at IS NULL",
                    [template_id],
                    |row| row.get(0),
                )?;
                next_order_index(current_max)
            } else {
                input.order_index
            };

            let now = Utc::now();
            conn.execute(
                "INSERT INTO template_exercises
                    (template_id, exercise_id, order_index, target_sets, target_reps, target_weight, rest_seconds, created_at, updated_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
                rusqlite::params![
                    template_id,
                    input.exercise_id,
                    order_index,
                    input.target_sets,
                    input.target_reps.trim(),
                    input.target_weight,
                    input.rest_seconds,
                    now,
                    now
                ],
            )
            .map_err(conflict_on_unique("Exercise is already in this template".to_string()))?;
            touch(&conn, template_id)?;

            find_entry(&conn, template_id, input.exercise_id)?
                .ok_or_else(|| AppError::not_found("Template exercise"))
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    pub async fn update_exercise(
        &self,
        template_id: u64,
        exercise_id: u64,
        user_id: u64,
        input: UpdateTemplateExercise,
    ) -> Result<TemplateExercise> {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            owned_template(&conn, template_id, user_id)?;
            let mut entry = find_entry(&conn, template_id, exercise_id)?
                .ok_or_else(|| AppError::not_found("Template exercise"))?;

            if let Some(order_index) = input.order_index {
                entry.order_index = order_index;
            }
            if let Some(target_sets) = input.target_sets {
                entry.target_sets = target_sets;
            }
            if let Some(target_reps) = input.target_reps {
                entry.target_reps = target_reps.trim().to_string();
            }
            if let Some(target_weight) = input.target_weight {
                entry.target_weight = target_weight;
            }
            if let Some(rest_seconds) = input.rest_seconds {
                entry.rest_seconds = rest_seconds;
            }

            conn.execute(
                "UPDATE template_exercises
                 SET order_index = ?, target_sets = ?, target_reps = ?, target_weight = ?, rest_seconds = ?, updated_at = ?
                 WHERE id = ?",
                rusqlite::params![
                    entry.order_index,
                    entry.target_sets,
                    entry.target_reps,
                    entry.target_weight,
                    entry.rest_seconds,
                    Utc::now(),
                    entry.id
                ],
            )?;
            touch(&conn, template_id)?;

            find_entry(&conn, template_id, exercise_id)?
                .ok_or_else(|| AppError::not_found("Template exercise"))
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    pub async fn remove_exercise(&self, template_id: u64, exercise_id: u64, user_id: u64) -> Result<()> {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            owned_template(&conn, template_id, user_id)?;
            let entry = find_entry(&conn, template_id, exercise_id)?
                .ok_or_else(|| AppError::not_found("Template exercise"))?;

            conn.execute(
                "UPDATE template_exercises SET deleted_at = ? WHERE id = ?",
                rusqlite::params![Utc::now(), entry.id],
            )?;
            touch(&conn, template_id)?;
            Ok(())
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    /// Copies a readable template and its entries into a new private template.
    pub async fn duplicate(
        &self,
        id: u64,
        user_id: u64,
        input: DuplicateTemplate,
    ) -> Result<TemplateWithExercises> {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool.get()?;
            let source = readable_template(&conn, id, user_id)?;
            let entries = load_entries(&conn, id)?;

            let name = copy_name(&source.name, input.name.as_deref());
            ensure_unique_name(&conn, user_id, &name, None)?;

            let now = Utc::now();
            let tx = conn.transaction()?;
            tx.execute(
                "INSERT INTO workout_templates
                    (user_id, name, description, category, is_public, created_at, updated_at)
                 VALUES (?, ?, ?, ?, 0, ?, ?)",
                rusqlite::params![user_id, name, source.description, source.category, now, now],
            )
            .map_err(conflict_on_unique(format!("Template '{}' already exists", name)))?;
            let copy_id = tx.last_insert_rowid() as u64;

            for entry in &entries {
                tx.execute(
                    "INSERT INTO template_exercises
                        (template_id, exercise_id, order_index, target_sets, target_reps, target_weight, rest_seconds, created_at, updated_at)
                     VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
                    rusqlite::params![
                        copy_id,
                        entry.exercise_id,
                        entry.order_index,
                        entry.target_sets,
                        entry.target_reps,
                        entry.target_weight,
                        entry.rest_seconds,
                        now,
                        now
                    ],
                )?;
            }
            tx.commit()?;

            tracing::info!("Duplicated template {} as {} for user {}", id, copy_id, user_id);

            let template = owned_template(&conn, copy_id, user_id)?;
            with_exercises(&conn, template)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    /// Distinct non-empty categories of templates the caller can read.
    pub async fn categories(&self, user_id: u64) -> Result<Vec<String>> {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let mut stmt = conn.prepare(
                "SELECT DISTINCT category FROM workout_templates
                 WHERE (user_id = ? OR is_public = 1) AND category != '' AND deleted_at IS NULL
                 ORDER BY category",
            )?;
            let categories = stmt
                .query_map([user_id], |row| row.get(0))?
                .collect::<rusqlite::Result<Vec<String>>>()?;
            Ok(categories)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }
}

/// Live entries of a template in display order.
pub(crate) fn load_entries(conn: &Connection, template_id: u64) -> Result<Vec<TemplateExercise>> {
    let sql = format!(
        "SELECT {} FROM template_exercises te
         JOIN exercises e ON e.id = te.exercise_id
         WHERE te.template_id = ? AND te.deleted_at IS NULL
         ORDER BY te.order_index, te.id",
        TEMPLATE_EXERCISE_COLUMNS
    );
    let entries = query_all(conn, &sql, [template_id])?;
    Ok(entries)
}

fn with_exercises(conn: &Connection, template: WorkoutTemplate) -> Result<TemplateWithExercises> {
    let exercises = load_entries(conn, template.id)?;
    Ok(TemplateWithExercises {
        template,
        exercises,
    })
}

fn find_entry(conn: &Connection, template_id: u64, exercise_id: u64) -> Result<Option<TemplateExercise>> {
    let entry = conn
        .query_row(
            &format!(
                "SELECT {} FROM template_exercises te
                 JOIN exercises e ON e.id = te.exercise_id
                 WHERE te.template_id = ? AND te.exercise_id = ? AND te.deleted_at IS NULL",
                TEMPLATE_EXERCISE_COLUMNS
            ),
            rusqlite::params![template_id, exercise_id],
            TemplateExercise::from_row,
        )
        .optional()?;
    Ok(entry)
}

fn ensure_unique_name(conn: &Connection, user_id: u64, name: &str, exclude_id: Option<u64>) -> Result<()> {
    let existing: Option<u64> = conn
        .query_row(
            "SELECT id FROM workout_templates
             WHERE user_id = ? AND name = ? AND deleted_at IS NULL
               AND (?3 IS NULL OR id != ?3)",
            rusqlite::params![user_id, name, exclude_id],
            |row| row.get(0),
        )
        .optional()?;

    match existing {
        Some(_) => Err(AppError::Conflict(format!(
            "Template '{}' already exists",
            name
        ))),
        None => Ok(()),
    }
}

fn touch(conn: &Connection, template_id: u64) -> Result<()> {
    conn.execute(
        "UPDATE workout_templates SET updated_at = ? WHERE id = ?",
        rusqlite::params![Utc::now(), template_id],
    )?;
    Ok(())
}
