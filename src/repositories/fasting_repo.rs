use chrono::{DateTime, Utc};
use rusqlite::OptionalExtension;
use uuid::Uuid;

use crate::db::DbPool;
use crate::error::{AppError, Result};
use crate::models::fasting::{determine_type, DEFAULT_FAST_TYPES};
use crate::models::from_row::query_all;
use crate::models::workout_session::duration_minutes;
use crate::models::{EndFast, FastSession, FastStatus, FastType, FromSqliteRow, RecordFast, StartFast};
use crate::repositories::ownership::owned_fast;

#[derive(Clone)]
pub struct FastingRepository {
    pool: DbPool,
}

impl FastingRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Inserts any missing built-in fast types.
    pub async fn seed_default_types(&self) -> Result<usize> {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool.get()?;
            let tx = conn.transaction()?;
            let mut inserted = 0;

            for fast_type in DEFAULT_FAST_TYPES {
                let exists: bool = tx.query_row(
                    "SELECT COUNT(*) > 0 FROM fast_types WHERE name = ? AND is_custom = 0",
                    [fast_type.name],
                    |row| row.get(0),
                )?;
                if exists {
                    continue;
                }
                tx.execute(
                    "INSERT INTO fast_types (id, name, description, target_hours, is_custom, created_at)
                     VALUES (?, ?, ?, ?, 0, ?)",
                    rusqlite::params![
                        Uuid::new_v4(),
                        fast_type.name,
                        fast_type.description,
                        fast_type.target_hours,
                        Utc::now()
                    ],
                )?;
                inserted += 1;
            }
            tx.commit()?;

            if inserted > 0 {
                tracing::info!("Seeded {} fast types", inserted);
            }
            Ok(inserted)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    pub async fn list_types(&self) -> Result<Vec<FastType>> {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let types: Vec<FastType> = query_all(
                &conn,
                "SELECT * FROM fast_types WHERE is_custom = 0 ORDER BY target_hours, name",
                [],
            )?;
            Ok(types)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    pub async fn start(&self, user_id: u64, input: StartFast) -> Result<FastSession> {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let fast_type = conn
                .query_row(
                    "SELECT * FROM fast_types WHERE id = ? AND (is_custom = 0 OR user_id = ?)",
                    rusqlite::params![input.fast_type_id, user_id],
                    FastType::from_row,
                )
                .optional()?
                .ok_or_else(|| AppError::Validation("Invalid fast type".to_string()))?;

            let ongoing: bool = conn.query_row(
                "SELECT COUNT(*) > 0 FROM fast_sessions
                 WHERE user_id = ? AND status = ? AND deleted_at IS NULL",
                rusqlite::params![user_id, FastStatus::Ongoing.as_str()],
                |row| row.get(0),
            )?;
            if ongoing {
                return Err(AppError::Conflict("A fast is already in progress".to_string()));
            }

            let now = Utc::now();
            conn.execute(
                "INSERT INTO fast_sessions
                    (user_id, fast_type_id, kind, start_time, target_minutes, status, notes, created_at, updated_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
                rusqlite::params![
                    user_id,
                    fast_type.id,
                    determine_type(fast_type.target_hours as i64),
                    now,
                    fast_type.target_hours as i64 * 60,
                    FastStatus::Ongoing.as_str(),
                    input.notes.trim(),
                    now,
                    now
                ],
            )?;
            let id = conn.last_insert_rowid() as u64;
            tracing::info!("Started fast {} for user {}", id, user_id);

            owned_fast(&conn, id, user_id)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    pub async fn current(&self, user_id: u64) -> Result<Option<FastSession>> {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let fast = conn
                .query_row(
                    "SELECT * FROM fast_sessions
                     WHERE user_id = ? AND status = ? AND deleted_at IS NULL
                     ORDER BY start_time DESC
                     LIMIT 1",
                    rusqlite::params![user_id, FastStatus::Ongoing.as_str()],
                    FastSession::from_row,
                )
                .optional()?;
            Ok(fast)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    pub async fn end(&self, id: u64, user_id: u64, input: EndFast) -> Result<FastSession> {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let mut fast = owned_fast(&conn, id, user_id)?;
            if fast.status != FastStatus::Ongoing {
                return Err(AppError::Validation("Fast is not in progress".to_string()));
            }

            let now = Utc::now();
            fast.end_time = Some(now);
            fast.duration_minutes = Some(duration_minutes(fast.start_time, now));
            fast.status = if input.cancel {
                FastStatus::Cancelled
            } else {
                FastStatus::Completed
            };
            if let Some(notes) = input.notes.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
                fast.notes = notes.to_string();
            }

            conn.execute(
                "UPDATE fast_sessions
                 SET end_time = ?, duration_minutes = ?, status = ?, notes = ?, updated_at = ?
                 WHERE id = ?",
                rusqlite::params![
                    fast.end_time,
                    fast.duration_minutes,
                    fast.status.as_str(),
                    fast.notes,
                    now,
                    id
                ],
            )?;
            tracing::info!("Fast {} ended as {}", id, fast.status.as_str());

            owned_fast(&conn, id, user_id)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    /// Stores a fast that was timed on the client.
    pub async fn record(&self, user_id: u64, input: RecordFast) -> Result<FastSession> {
        if input.start_time >= input.end_time {
            return Err(AppError::Validation(
                "Start time must be before end time".to_string(),
            ));
        }
        if input.actual_duration_seconds <= 0 || input.goal_duration_seconds <= 0 {
            return Err(AppError::Validation("Durations must be positive".to_string()));
        }
        let start_time = from_millis(input.start_time)?;
        let end_time = from_millis(input.end_time)?;
        let now = Utc::now();
        if start_time > now || end_time > now {
            return Err(AppError::Validation("Fast cannot be in the future".to_string()));
        }

        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            conn.execute(
                "INSERT INTO fast_sessions
                    (user_id, kind, start_time, end_time, target_minutes, duration_minutes, status, notes, created_at, updated_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                rusqlite::params![
                    user_id,
                    determine_type(input.goal_duration_seconds / 3600),
                    start_time,
                    end_time,
                    input.goal_duration_seconds / 60,
                    input.actual_duration_seconds / 60,
                    FastStatus::Completed.as_str(),
                    input.notes.trim(),
                    now,
                    now
                ],
            )?;
            let id = conn.last_insert_rowid() as u64;
            tracing::debug!("Recorded fast {} for user {}", id, user_id);

            owned_fast(&conn, id, user_id)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    pub async fn history(&self, user_id: u64) -> Result<Vec<FastSession>> {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let fasts: Vec<FastSession> = query_all(
                &conn,
                "SELECT * FROM fast_sessions
                 WHERE user_id = ? AND deleted_at IS NULL
                 ORDER BY start_time DESC, id DESC",
                [user_id],
            )?;
            Ok(fasts)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }
}

pub(crate) fn from_millis(millis: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis)
        .ok_or_else(|| AppError::Validation("Invalid timestamp".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    use crate::repositories::test_support::{create_test_user, setup_test_db};

    async fn sixteen_eight(repo: &FastingRepository) -> Uuid {
        repo.seed_default_types().await.unwrap();
        repo.list_types()
            .await
            .unwrap()
            .into_iter()
            .find(|t| t.target_hours == 16)
            .unwrap()
            .id
    }

    fn start_fast(fast_type_id: Uuid) -> StartFast {
        StartFast {
            fast_type_id,
            notes: String::new(),
        }
    }

    #[tokio::test]
    async fn test_seed_default_types_is_idempotent() {
        let pool = setup_test_db();
        let repo = FastingRepository::new(pool);

        assert_eq!(repo.seed_default_types().await.unwrap(), 4);
        assert_eq!(repo.seed_default_types().await.unwrap(), 0);

        let hours: Vec<_> = repo
            .list_types()
            .await
            .unwrap()
            .iter()
            .map(|t| t.target_hours)
            .collect();
        assert_eq!(hours, vec![16, 18, 20, 24]);
    }

    #[tokio::test]
    async fn test_start_and_single_ongoing_fast() {
        let pool = setup_test_db();
        let alice = create_test_user(&pool, "alice");
        let repo = FastingRepository::new(pool);
        let type_id = sixteen_eight(&repo).await;

        let fast = repo.start(alice, start_fast(type_id)).await.unwrap();
        assert_eq!(fast.kind, "16:8");
        assert_eq!(fast.target_minutes, 960);
        assert_eq!(fast.status, FastStatus::Ongoing);
        assert_eq!(repo.current(alice).await.unwrap().unwrap().id, fast.id);

        assert!(matches!(
            repo.start(alice, start_fast(type_id)).await,
            Err(AppError::Conflict(_))
        ));
        assert!(matches!(
            repo.start(alice, start_fast(Uuid::new_v4())).await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_end_fast() {
        let pool = setup_test_db();
        let alice = create_test_user(&pool, "alice");
        let bob = create_test_user(&pool, "bob");
        let repo = FastingRepository::new(pool);
        let type_id = sixteen_eight(&repo).await;
        let fast = repo.start(alice, start_fast(type_id)).await.unwrap();

        assert!(matches!(
            repo.end(fast.id, bob, EndFast::default()).await,
            Err(AppError::NotFound(_))
        ));

        let ended = repo
            .end(
                fast.id,
                alice,
                EndFast {
                    notes: Some("broke early".to_string()),
                    cancel: true,
                },
            )
            .await
            .unwrap();
        assert_eq!(ended.status, FastStatus::Cancelled);
        assert_eq!(ended.duration_minutes, Some(0));
        assert_eq!(ended.notes, "broke early");
        assert!(repo.current(alice).await.unwrap().is_none());

        assert!(matches!(
            repo.end(fast.id, alice, EndFast::default()).await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_record_completed_fast() {
        let pool = setup_test_db();
        let alice = create_test_user(&pool, "alice");
        let repo = FastingRepository::new(pool);
        let end = Utc::now() - Duration::hours(1);
        let start = end - Duration::hours(18);

        let fast = repo
            .record(
                alice,
                RecordFast {
                    start_time: start.timestamp_millis(),
                    end_time: end.timestamp_millis(),
                    actual_duration_seconds: 18 * 3600,
                    goal_duration_seconds: 18 * 3600,
                    notes: String::new(),
                },
            )
            .await
            .unwrap();

        assert_eq!(fast.kind, "18:6");
        assert_eq!(fast.status, FastStatus::Completed);
        assert_eq!(fast.duration_minutes, Some(18 * 60));
        assert_eq!(fast.target_minutes, 18 * 60);
        assert_eq!(repo.history(alice).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_record_validation() {
        let pool = setup_test_db();
        let alice = create_test_user(&pool, "alice");
        let repo = FastingRepository::new(pool);
        let now = Utc::now().timestamp_millis();
        let hour = 3_600_000;

        let valid = RecordFast {
            start_time: now - 2 * hour,
            end_time: now - hour,
            actual_duration_seconds: 3600,
            goal_duration_seconds: 3600,
            notes: String::new(),
        };

        let reversed = RecordFast {
            start_time: valid.end_time,
            end_time: valid.start_time,
            ..valid.clone()
        };
        let zero = RecordFast {
            actual_duration_seconds: 0,
            ..valid.clone()
        };
        let future = RecordFast {
            start_time: now + hour,
            end_time: now + 2 * hour,
            ..valid.clone()
        };

        for input in [reversed, zero, future] {
            assert!(matches!(
                repo.record(alice, input).await,
                Err(AppError::Validation(_))
            ));
        }
        assert_eq!(repo.record(alice, valid).await.unwrap().kind, "custom");
    }
}
