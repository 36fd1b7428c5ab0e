use chrono::Utc;
use rusqlite::{Connection, OptionalExtension};

use crate::auth::VerifiedIdentity;
use crate::db::DbPool;
use crate::error::{AppError, Result};
use crate::models::{FromSqliteRow, UpdateProfile, UpdateSettings, User};

#[derive(Clone)]
pub struct UserRepository {
    pool: DbPool,
}

impl UserRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: u64) -> Result<Option<User>> {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let result = find_user(&conn, id)?;
            Ok(result)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    /// Resolves a verified identity to its user row, creating it on first sight.
    pub async fn find_or_create(&self, identity: VerifiedIdentity) -> Result<User> {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let now = Utc::now();
            let name = identity
                .name
                .clone()
                .or_else(|| identity.email.clone())
                .unwrap_or_default();

            let inserted = conn.execute(
                "INSERT INTO users (subject, email, name, created_at, updated_at)
                 VALUES (?, ?, ?, ?, ?)
                 ON CONFLICT(subject) DO NOTHING",
                rusqlite::params![identity.subject, identity.email, name, now, now],
            )?;
            if inserted > 0 {
                tracing::info!("Created user for subject {}", identity.subject);
            }

            let user = conn.query_row(
                "SELECT * FROM users WHERE subject = ? AND deleted_at IS NULL",
                [&identity.subject],
                User::from_row,
            )?;
            Ok(user)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    pub async fn update_profile(&self, id: u64, input: UpdateProfile) -> Result<User> {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let mut user = find_user(&conn, id)?.ok_or_else(|| AppError::not_found("User"))?;

            if let Some(name) = input.name {
                let name = name.trim();
                if name.is_empty() {
                    return Err(AppError::Validation("Name cannot be empty".to_string()));
                }
                user.name = name.to_string();
            }
            if let Some(height) = input.height {
                user.height = height;
            }
            if let Some(weight) = input.weight {
                user.weight = weight;
            }

            conn.execute(
                "UPDATE users SET name = ?, height = ?, weight = ?, updated_at = ? WHERE id = ?",
                rusqlite::params![user.name, user.height, user.weight, Utc::now(), id],
            )?;
            find_user(&conn, id)?.ok_or_else(|| AppError::not_found("User"))
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    pub async fn update_settings(&self, id: u64, input: UpdateSettings) -> Result<User> {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let mut user = find_user(&conn, id)?.ok_or_else(|| AppError::not_found("User"))?;

            if let Some(goals) = input.goals {
                user.goals = goals;
            }
            if let Some(settings) = input.settings {
                user.settings = settings;
            }

            conn.execute(
                "UPDATE users SET goals = ?, settings = ?, updated_at = ? WHERE id = ?",
                rusqlite::params![user.goals, user.settings, Utc::now(), id],
            )?;
            find_user(&conn, id)?.ok_or_else(|| AppError::not_found("User"))
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }
}

fn find_user(conn: &Connection, id: u64) -> Result<Option<User>> {
    let user = conn
        .query_row(
            "SELECT * FROM users WHERE id = ? AND deleted_at IS NULL",
            [id],
            User::from_row,
        )
        .optional()?;
    Ok(user)
}
