use chrono::{Duration, NaiveTime, Utc};
use rusqlite::OptionalExtension;

use crate::db::DbPool;
use crate::error::{AppError, Result};
use crate::models::from_row::query_all;
use crate::models::{FromSqliteRow, LogWater, WaterLog, WaterQuery};
use crate::repositories::fasting_repo::from_millis;
use crate::repositories::ownership::owned_water_log;

#[derive(Clone)]
pub struct WaterRepository {
    pool: DbPool,
}

impl WaterRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn log(&self, user_id: u64, input: LogWater) -> Result<WaterLog> {
        if input.amount.is_nan() || input.amount < 0.0 {
            return Err(AppError::Validation("Amount cannot be negative".to_string()));
        }
        let now = Utc::now();
        let logged_at = match input.logged_at {
            Some(millis) => from_millis(millis)?,
            None => now,
        };
        if logged_at > now {
            return Err(AppError::Validation(
                "Water log cannot be in the future".to_string(),
            ));
        }

        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            conn.execute(
                "INSERT INTO water_logs (user_id, amount, logged_at, created_at, updated_at)
                 VALUES (?, ?, ?, ?, ?)",
                rusqlite::params![user_id, input.amount, logged_at, now, now],
            )?;
            let id = conn.last_insert_rowid() as u64;
            owned_water_log(&conn, id, user_id)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    /// Newest first, optionally limited to one UTC calendar day.
    pub async fn list(&self, user_id: u64, query: WaterQuery) -> Result<Vec<WaterLog>> {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let from = query
                .date
                .map(|date| date.and_time(NaiveTime::MIN).and_utc());
            let until = from.map(|start| start + Duration::days(1));

            let logs: Vec<WaterLog> = query_all(
                &conn,
                "SELECT * FROM water_logs
                 WHERE user_id = ?1 AND deleted_at IS NULL
                   AND (?2 IS NULL OR logged_at >= ?2)
                   AND (?3 IS NULL OR logged_at < ?3)
                 ORDER BY logged_at DESC, id DESC",
                rusqlite::params![user_id, from, until],
            )?;
            Ok(logs)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    pub async fn delete_latest(&self, user_id: u64) -> Result<WaterLog> {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let latest = conn
                .query_row(
                    "SELECT * FROM water_logs
                     WHERE user_id = ? AND deleted_at IS NULL
                     ORDER BY logged_at DESC, created_at DESC, id DESC
                     LIMIT 1",
                    [user_id],
                    WaterLog::from_row,
                )
                .optional()?
                .ok_or_else(|| AppError::NotFound("No water logs found to delete".to_string()))?;

            conn.execute(
                "UPDATE water_logs SET deleted_at = ? WHERE id = ?",
                rusqlite::params![Utc::now(), latest.id],
            )?;
            Ok(latest)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    pub async fn delete(&self, id: u64, user_id: u64) -> Result<WaterLog> {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let log = owned_water_log(&conn, id, user_id)?;
            conn.execute(
                "UPDATE water_logs SET deleted_at = ? WHERE id = ?",
                rusqlite::params![Utc::now(), id],
            )?;
            Ok(log)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }
}
