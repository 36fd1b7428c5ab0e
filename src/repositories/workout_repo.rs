use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use rusqlite::{Connection, OptionalExtension};

use crate::db::DbPool;
use crate::error::{AppError, Result};
use crate::models::from_row::query_all;
use crate::models::serde_helpers::apply_nullable;
use crate::models::workout_session::{
    average_duration, duration_minutes, next_order_index, next_set_number, validate_set_metrics,
};
use crate::models::{
    AddSessionExercise, ExerciseSet, FromSqliteRow, HistoryQuery, LogSet, SessionExercise,
    StartWorkout, UpdateSessionExercise, UpdateSet, UpdateWorkout, WorkoutSession, WorkoutStats,
    WorkoutWithDetails,
};
use crate::repositories::ownership::{
    owned_session, owned_session_exercise, owned_set, readable_template, visible_exercise,
    SESSION_EXERCISE_COLUMNS,
};
use crate::repositories::template_repo::load_entries;

#[derive(Clone)]
pub struct WorkoutRepository {
    pool: DbPool,
}

impl WorkoutRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Starts a session, copying the template's exercises when one is given.
    pub async fn start(&self, user_id: u64, input: StartWorkout) -> Result<WorkoutWithDetails> {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool.get()?;
            let name = input.name.trim();
            if name.is_empty() {
                return Err(AppError::Validation("Workout name is required".to_string()));
            }

            let entries = match input.template_id {
                Some(template_id) => {
                    readable_template(&conn, template_id, user_id)?;
                    load_entries(&conn, template_id)?
                }
                None => Vec::new(),
            };

            let now = Utc::now();
            let tx = conn.transaction()?;
            tx.execute(
                "INSERT INTO workout_sessions
                    (user_id, template_id, name, started_at, notes, created_at, updated_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?)",
                rusqlite::params![user_id, input.template_id, name, now, input.notes.trim(), now, now],
            )?;
            let session_id = tx.last_insert_rowid() as u64;

            for entry in &entries {
                tx.execute(
                    "INSERT INTO session_exercises
                        (session_id, exercise_id, order_index, notes, created_at, updated_at)
                     VALUES (?, ?, ?, ?, ?, ?)",
                    rusqlite::params![
                        session_id,
                        entry.exercise_id,
                        entry.order_index,
                        entry.target_note(),
                        now,
                        now
                    ],
                )?;
            }
            tx.commit()?;

            tracing::info!(
                "Started workout {} for user {} with {} exercises",
                session_id,
                user_id,
                entries.len()
            );

            let session = owned_session(&conn, session_id, user_id)?;
            with_details(&conn, session)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    /// A page of the caller's workouts, newest first, plus the total count.
    pub async fn history(
        &self,
        user_id: u64,
        query: HistoryQuery,
    ) -> Result<(Vec<WorkoutWithDetails>, i64)> {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let from = query.start_date.map(start_of_day);
            let until = query
                .end_date
                .and_then(|date| date.succ_opt())
                .map(start_of_day);

            let total: i64 = conn.query_row(
                "SELECT COUNT(*) FROM workout_sessions
                 WHERE user_id = ?1 AND deleted_at IS NULL
                   AND (?2 IS NULL OR started_at >= ?2)
                   AND (?3 IS NULL OR started_at < ?3)",
                rusqlite::params![user_id, from, until],
                |row| row.get(0),
            )?;

            let mut stmt = conn.prepare(
                "SELECT * FROM workout_sessions
                 WHERE user_id = ?1 AND deleted_at IS NULL
                   AND (?2 IS NULL OR started_at >= ?2)
                   AND (?3 IS NULL OR started_at < ?3)
                 ORDER BY started_at DESC, id DESC
                 LIMIT ?4 OFFSET ?5",
            )?;
            let sessions = stmt
                .query_map(
                    rusqlite::params![user_id, from, until, query.limit(), query.offset()],
                    WorkoutSession::from_row,
                )?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            let workouts = sessions
                .into_iter()
                .map(|session| with_details(&conn, session))
                .collect::<Result<Vec<_>>>()?;
            Ok((workouts, total))
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    pub async fn get(&self, id: u64, user_id: u64) -> Result<WorkoutWithDetails> {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let session = owned_session(&conn, id, user_id)?;
            with_details(&conn, session)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    /// The most recently started unfinished workout, if any.
    pub async fn active(&self, user_id: u64) -> Result<Option<WorkoutWithDetails>> {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let session = conn
                .query_row(
                    "SELECT * FROM workout_sessions
                     WHERE user_id = ? AND ended_at IS NULL AND deleted_at IS NULL
                     ORDER BY started_at DESC, id DESC
                     LIMIT 1",
                    [user_id],
                    WorkoutSession::from_row,
                )
                .optional()?;

            session
                .map(|session| with_details(&conn, session))
                .transpose()
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    /// Updates name/notes and finishes the workout when asked to.
    ///
    /// Finishing is one-way: once `ended_at` is set, later finish requests
    /// leave it and `duration_minutes` untouched.
    pub async fn update(
        &self,
        id: u64,
        user_id: u64,
        input: UpdateWorkout,
    ) -> Result<WorkoutWithDetails> {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let mut session = owned_session(&conn, id, user_id)?;

            if let Some(name) = input.name {
                let name = name.trim();
                if name.is_empty() {
                    return Err(AppError::Validation("Workout name cannot be empty".to_string()));
                }
                session.name = name.to_string();
            }
            if let Some(notes) = input.notes {
                session.notes = notes.trim().to_string();
            }

            let finish_at = match (input.ended_at, input.is_active) {
                (Some(ended_at), _) => Some(ended_at),
                (None, Some(false)) => Some(Utc::now()),
                _ => None,
            };
            if let Some(ended_at) = finish_at.filter(|_| session.ended_at.is_none()) {
                if ended_at < session.started_at {
                    return Err(AppError::Validation(
                        "ended_at cannot be before started_at".to_string(),
                    ));
                }
                let minutes = duration_minutes(session.started_at, ended_at);
                session.ended_at = Some(ended_at);
                session.duration_minutes = Some(minutes);
                tracing::info!("Finished workout {} after {} minutes", id, minutes);
            }

            conn.execute(
                "UPDATE workout_sessions
                 SET name = ?, notes = ?, ended_at = ?, duration_minutes = ?, updated_at = ?
                 WHERE id = ?",
                rusqlite::params![
                    session.name,
                    session.notes,
                    session.ended_at,
                    session.duration_minutes,
                    Utc::now(),
                    id
                ],
            )?;

            let session = owned_session(&conn, id, user_id)?;
            with_details(&conn, session)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    /// Soft-deletes the workout with its exercises and sets.
    pub async fn delete(&self, id: u64, user_id: u64) -> Result<()> {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool.get()?;
            owned_session(&conn, id, user_id)?;

            let now = Utc::now();
            let tx = conn.transaction()?;
            tx.execute(
                "UPDATE exercise_sets SET deleted_at = ?1
                 WHERE deleted_at IS NULL
                   AND session_exercise_id IN (SELECT id FROM session_exercises WHERE session_id = ?2)",
                rusqlite::params![now, id],
            )?;
            tx.execute(
                "UPDATE session_exercises SET deleted_at = ?
                 WHERE session_id = ? AND deleted_at IS NULL",
                rusqlite::params![now, id],
            )?;
            tx.execute(
                "UPDATE workout_sessions SET deleted_at = ? WHERE id = ?",
                rusqlite::params![now, id],
            )?;
            tx.commit()?;

            tracing::info!("Deleted workout {} for user {}", id, user_id);
            Ok(())
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    pub async fn add_exercise(
        &self,
        session_id: u64,
        user_id: u64,
        input: AddSessionExercise,
    ) -> Result<SessionExercise> {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            owned_session(&conn, session_id, user_id)?;
            visible_exercise(&conn, input.exercise_id, Some(user_id))?;

            let order_index = if input.order_index == 0 {
                let current_max: Option<i32> = conn.query_row(
                    "SELECT MAX(order_index) FROM session_exercises
                     WHERE session_id = ? AND deleted_at IS NULL",
                    [session_id],
                    |row| row.get(0),
                )?;
                next_order_index(current_max)
            } else {
                input.order_index
            };

            let now = Utc::now();
            conn.execute(
                "INSERT INTO session_exercises
                    (session_id, exercise_id, order_index, notes, created_at, updated_at)
                 VALUES (?, ?, ?, ?, ?, ?)",
                rusqlite::params![
                    session_id,
                    input.exercise_id,
                    order_index,
                    input.notes.trim(),
                    now,
                    now
                ],
            )?;
            let id = conn.last_insert_rowid() as u64;

            owned_session_exercise(&conn, session_id, id, user_id)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    pub async fn update_exercise(
        &self,
        session_id: u64,
        session_exercise_id: u64,
        user_id: u64,
        input: UpdateSessionExercise,
    ) -> Result<SessionExercise> {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let mut entry = owned_session_exercise(&conn, session_id, session_exercise_id, user_id)?;

            if let Some(order_index) = input.order_index {
                entry.order_index = order_index;
            }
            if let Some(notes) = input.notes {
                entry.notes = notes.trim().to_string();
            }
            apply_nullable(&mut entry.completed_at, input.completed_at);

            conn.execute(
                "UPDATE session_exercises
                 SET order_index = ?, notes = ?, completed_at = ?, updated_at = ?
                 WHERE id = ?",
                rusqlite::params![
                    entry.order_index,
                    entry.notes,
                    entry.completed_at,
                    Utc::now(),
                    entry.id
                ],
            )?;

            let mut entry = owned_session_exercise(&conn, session_id, session_exercise_id, user_id)?;
            entry.sets = load_sets(&conn, entry.id)?;
            Ok(entry)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    /// Soft-deletes a session exercise and its sets.
    pub async fn remove_exercise(
        &self,
        session_id: u64,
        session_exercise_id: u64,
        user_id: u64,
    ) -> Result<()> {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool.get()?;
            owned_session_exercise(&conn, session_id, session_exercise_id, user_id)?;

            let now = Utc::now();
            let tx = conn.transaction()?;
            tx.execute(
                "UPDATE exercise_sets SET deleted_at = ?
                 WHERE session_exercise_id = ? AND deleted_at IS NULL",
                rusqlite::params![now, session_exercise_id],
            )?;
            tx.execute(
                "UPDATE session_exercises SET deleted_at = ? WHERE id = ?",
                rusqlite::params![now, session_exercise_id],
            )?;
            tx.commit()?;
            Ok(())
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    pub async fn log_set(
        &self,
        session_id: u64,
        session_exercise_id: u64,
        user_id: u64,
        input: LogSet,
    ) -> Result<ExerciseSet> {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            owned_session_exercise(&conn, session_id, session_exercise_id, user_id)?;
            validate_set_metrics(
                input.reps,
                input.weight,
                input.duration_seconds,
                input.distance_meters,
                input.rpe,
            )?;

            // Deleted sets count too, so numbers are never handed out twice.
            let highest: Option<i32> = conn.query_row(
                "SELECT MAX(set_number) FROM exercise_sets WHERE session_exercise_id = ?",
                [session_exercise_id],
                |row| row.get(0),
            )?;
            let set_number = next_set_number(highest);

            let now = Utc::now();
            conn.execute(
                "INSERT INTO exercise_sets
                    (session_exercise_id, set_number, reps, weight, duration_seconds, distance_meters, rpe, completed_at, created_at, updated_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                rusqlite::params![
                    session_exercise_id,
                    set_number,
                    input.reps,
                    input.weight,
                    input.duration_seconds,
                    input.distance_meters,
                    input.rpe,
                    now,
                    now,
                    now
                ],
            )?;
            let id = conn.last_insert_rowid() as u64;
            tracing::debug!("Logged set {} on workout exercise {}", set_number, session_exercise_id);

            owned_set(&conn, session_id, id, user_id)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    pub async fn update_set(
        &self,
        session_id: u64,
        set_id: u64,
        user_id: u64,
        input: UpdateSet,
    ) -> Result<ExerciseSet> {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let mut set = owned_set(&conn, session_id, set_id, user_id)?;

            apply_nullable(&mut set.reps, input.reps);
            apply_nullable(&mut set.weight, input.weight);
            apply_nullable(&mut set.duration_seconds, input.duration_seconds);
            apply_nullable(&mut set.distance_meters, input.distance_meters);
            apply_nullable(&mut set.rpe, input.rpe);
            set.validate()?;

            conn.execute(
                "UPDATE exercise_sets
                 SET reps = ?, weight = ?, duration_seconds = ?, distance_meters = ?, rpe = ?, updated_at = ?
                 WHERE id = ?",
                rusqlite::params![
                    set.reps,
                    set.weight,
                    set.duration_seconds,
                    set.distance_meters,
                    set.rpe,
                    Utc::now(),
                    set.id
                ],
            )?;

            owned_set(&conn, session_id, set_id, user_id)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    pub async fn delete_set(&self, session_id: u64, set_id: u64, user_id: u64) -> Result<()> {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            owned_set(&conn, session_id, set_id, user_id)?;
            conn.execute(
                "UPDATE exercise_sets SET deleted_at = ? WHERE id = ?",
                rusqlite::params![Utc::now(), set_id],
            )?;
            Ok(())
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    /// Totals for workouts started within the last `days` days.
    pub async fn stats(&self, user_id: u64, days: i64) -> Result<WorkoutStats> {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let since = Duration::try_days(days)
                .and_then(|window| Utc::now().checked_sub_signed(window))
                .unwrap_or(DateTime::<Utc>::MIN_UTC);

            let (total_workouts, total_minutes): (i64, i64) = conn.query_row(
                "SELECT COUNT(*), COALESCE(SUM(duration_minutes), 0) FROM workout_sessions
                 WHERE user_id = ? AND started_at >= ? AND ended_at IS NOT NULL AND deleted_at IS NULL",
                rusqlite::params![user_id, since],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )?;

            let total_sets: i64 = conn.query_row(
                "SELECT COUNT(*) FROM exercise_sets s
                 JOIN session_exercises se ON se.id = s.session_exercise_id
                 JOIN workout_sessions ws ON ws.id = se.session_id
                 WHERE ws.user_id = ? AND ws.started_at >= ?
                   AND s.deleted_at IS NULL AND se.deleted_at IS NULL AND ws.deleted_at IS NULL",
                rusqlite::params![user_id, since],
                |row| row.get(0),
            )?;

            Ok(WorkoutStats {
                total_workouts,
                total_minutes,
                total_sets,
                average_duration: average_duration(total_minutes, total_workouts),
                days,
            })
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }
}

fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

fn load_sets(conn: &Connection, session_exercise_id: u64) -> Result<Vec<ExerciseSet>> {
    let sets = query_all(
        conn,
        "SELECT * FROM exercise_sets
         WHERE session_exercise_id = ? AND deleted_at IS NULL
         ORDER BY set_number",
        [session_exercise_id],
    )?;
    Ok(sets)
}

fn with_details(conn: &Connection, session: WorkoutSession) -> Result<WorkoutWithDetails> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM session_exercises se
         JOIN exercises e ON e.id = se.exercise_id
         WHERE se.session_id = ? AND se.deleted_at IS NULL
         ORDER BY se.order_index, se.id",
        SESSION_EXERCISE_COLUMNS
    ))?;
    let mut exercises = stmt
        .query_map([session.id], SessionExercise::from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    for exercise in &mut exercises {
        exercise.sets = load_sets(conn, exercise.id)?;
    }

    Ok(WorkoutWithDetails { session, exercises })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::test_support::{
        create_test_exercise, create_test_session, create_test_template, create_test_user,
        setup_test_db,
    };

    fn start(name: &str, template_id: Option<u64>) -> StartWorkout {
        StartWorkout {
            name: name.to_string(),
            template_id,
            notes: String::new(),
        }
    }

    fn reps(reps: i32, weight: f64) -> LogSet {
        LogSet {
            reps: Some(reps),
            weight: Some(weight),
            ..Default::default()
        }
    }

    fn add_template_entry(pool: &DbPool, template_id: u64, exercise_id: u64, order: i32, sets: i32, target_reps: &str) {
        let conn = pool.get().unwrap();
        let now = Utc::now();
        conn.execute(
            "INSERT INTO template_exercises
                (template_id, exercise_id, order_index, target_sets, target_reps, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
            rusqlite::params![template_id, exercise_id, order, sets, target_reps, now, now],
        )
        .unwrap();
    }

    async fn workout_with_exercise(
        repo: &WorkoutRepository,
        user_id: u64,
        exercise_id: u64,
    ) -> (u64, u64) {
        let workout = repo.start(user_id, start("Session", None)).await.unwrap();
        let entry = repo
            .add_exercise(
                workout.session.id,
                user_id,
                AddSessionExercise {
                    exercise_id,
                    order_index: 0,
                    notes: String::new(),
                },
            )
            .await
            .unwrap();
        (workout.session.id, entry.id)
    }

    #[tokio::test]
    async fn test_start_requires_name() {
        let pool = setup_test_db();
        let alice = create_test_user(&pool, "alice");
        let repo = WorkoutRepository::new(pool);

        assert!(matches!(
            repo.start(alice, start("  ", None)).await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_start_from_template_copies_entries() {
        let pool = setup_test_db();
        let alice = create_test_user(&pool, "alice");
        let squats = create_test_exercise(&pool, "Squats", None);
        let lunges = create_test_exercise(&pool, "Lunges", None);
        let template_id = create_test_template(&pool, alice, "Leg Day", false);
        add_template_entry(&pool, template_id, lunges, 2, 3, "12");
        add_template_entry(&pool, template_id, squats, 1, 5, "5");
        let repo = WorkoutRepository::new(pool);

        let workout = repo.start(alice, start("Leg Day", Some(template_id))).await.unwrap();

        assert!(workout.session.is_active);
        assert_eq!(workout.session.template_id, Some(template_id));
        assert_eq!(workout.exercises.len(), 2);
        assert_eq!(workout.exercises[0].exercise_name, "Squats");
        assert_eq!(workout.exercises[0].order_index, 1);
        assert_eq!(workout.exercises[0].notes, "Target: 5 sets of 5");
        assert_eq!(workout.exercises[1].exercise_name, "Lunges");
        assert_eq!(workout.exercises[1].notes, "Target: 3 sets of 12");
    }

    #[tokio::test]
    async fn test_start_from_unreadable_template_creates_nothing() {
        let pool = setup_test_db();
        let alice = create_test_user(&pool, "alice");
        let bob = create_test_user(&pool, "bob");
        let template_id = create_test_template(&pool, alice, "Private", false);
        let repo = WorkoutRepository::new(pool);

        assert!(matches!(
            repo.start(bob, start("Sneaky", Some(template_id))).await,
            Err(AppError::NotFound(_))
        ));
        let (workouts, total) = repo.history(bob, HistoryQuery::default()).await.unwrap();
        assert!(workouts.is_empty());
        assert_eq!(total, 0);
    }

    #[tokio::test]
    async fn test_log_set_validation_and_numbering() {
        let pool = setup_test_db();
        let alice = create_test_user(&pool, "alice");
        let squats = create_test_exercise(&pool, "Squats", None);
        let repo = WorkoutRepository::new(pool);
        let (session_id, entry_id) = workout_with_exercise(&repo, alice, squats).await;

        let empty = repo.log_set(session_id, entry_id, alice, LogSet::default()).await;
        assert!(matches!(empty, Err(AppError::Validation(_))));

        let bad_rpe = repo
            .log_set(
                session_id,
                entry_id,
                alice,
                LogSet {
                    rpe: Some(11),
                    ..reps(5, 100.0)
                },
            )
            .await;
        assert!(matches!(bad_rpe, Err(AppError::Validation(_))));

        let first = repo.log_set(session_id, entry_id, alice, reps(10, 60.0)).await.unwrap();
        assert_eq!(first.set_number, 1);
        assert_eq!(first.reps, Some(10));
    }

    #[tokio::test]
    async fn test_set_numbers_are_never_reused() {
        let pool = setup_test_db();
        let alice = create_test_user(&pool, "alice");
        let squats = create_test_exercise(&pool, "Squats", None);
        let repo = WorkoutRepository::new(pool);
        let (session_id, entry_id) = workout_with_exercise(&repo, alice, squats).await;

        let first = repo.log_set(session_id, entry_id, alice, reps(5, 80.0)).await.unwrap();
        repo.delete_set(session_id, first.id, alice).await.unwrap();
        let second = repo.log_set(session_id, entry_id, alice, reps(5, 80.0)).await.unwrap();

        assert_eq!(first.set_number, 1);
        assert_eq!(second.set_number, 2);

        let workout = repo.get(session_id, alice).await.unwrap();
        assert_eq!(workout.exercises[0].sets.len(), 1);
    }

    #[tokio::test]
    async fn test_nested_writes_check_ownership() {
        let pool = setup_test_db();
        let alice = create_test_user(&pool, "alice");
        let bob = create_test_user(&pool, "bob");
        let squats = create_test_exercise(&pool, "Squats", None);
        let repo = WorkoutRepository::new(pool);
        let (session_id, entry_id) = workout_with_exercise(&repo, alice, squats).await;
        let set = repo.log_set(session_id, entry_id, alice, reps(5, 80.0)).await.unwrap();

        assert!(matches!(
            repo.log_set(session_id, entry_id, bob, reps(5, 80.0)).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            repo.delete_set(session_id, set.id, bob).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            repo.remove_exercise(session_id, entry_id, bob).await,
            Err(AppError::NotFound(_))
        ));

        // Right owner, wrong parent workout.
        let other = repo.start(alice, start("Other", None)).await.unwrap();
        assert!(matches!(
            repo.log_set(other.session.id, entry_id, alice, reps(5, 80.0)).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_update_set_tri_state() {
        let pool = setup_test_db();
        let alice = create_test_user(&pool, "alice");
        let squats = create_test_exercise(&pool, "Squats", None);
        let repo = WorkoutRepository::new(pool);
        let (session_id, entry_id) = workout_with_exercise(&repo, alice, squats).await;
        let set = repo.log_set(session_id, entry_id, alice, reps(8, 70.0)).await.unwrap();

        let updated = repo
            .update_set(
                session_id,
                set.id,
                alice,
                UpdateSet {
                    weight: Some(None),
                    rpe: Some(Some(8)),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.reps, Some(8));
        assert_eq!(updated.weight, None);
        assert_eq!(updated.rpe, Some(8));

        let emptied = repo
            .update_set(
                session_id,
                set.id,
                alice,
                UpdateSet {
                    reps: Some(None),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(emptied, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_finish_computes_duration_once() {
        let pool = setup_test_db();
        let alice = create_test_user(&pool, "alice");
        let repo = WorkoutRepository::new(pool);
        let workout = repo.start(alice, start("Run", None)).await.unwrap();
        let started_at = workout.session.started_at;

        let finished = repo
            .update(
                workout.session.id,
                alice,
                UpdateWorkout {
                    ended_at: Some(started_at + Duration::minutes(95)),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(!finished.session.is_active);
        assert_eq!(finished.session.duration_minutes, Some(95));

        let again = repo
            .update(
                workout.session.id,
                alice,
                UpdateWorkout {
                    ended_at: Some(started_at + Duration::minutes(200)),
                    notes: Some("felt good".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(again.session.duration_minutes, Some(95));
        assert_eq!(again.session.ended_at, finished.session.ended_at);
        assert_eq!(again.session.notes, "felt good");
    }

    #[tokio::test]
    async fn test_finish_via_is_active_and_rejects_early_end() {
        let pool = setup_test_db();
        let alice = create_test_user(&pool, "alice");
        let repo = WorkoutRepository::new(pool);
        let first = repo.start(alice, start("A", None)).await.unwrap();
        let second = repo.start(alice, start("B", None)).await.unwrap();

        let early = repo
            .update(
                first.session.id,
                alice,
                UpdateWorkout {
                    ended_at: Some(first.session.started_at - Duration::minutes(1)),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(early, Err(AppError::Validation(_))));

        let ended = repo
            .update(
                second.session.id,
                alice,
                UpdateWorkout {
                    is_active: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(ended.session.ended_at.is_some());
        assert_eq!(ended.session.duration_minutes, Some(0));

        let blank = repo
            .update(
                first.session.id,
                alice,
                UpdateWorkout {
                    name: Some(String::new()),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(blank, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_active_returns_latest_unfinished() {
        let pool = setup_test_db();
        let alice = create_test_user(&pool, "alice");
        let repo = WorkoutRepository::new(pool);

        assert!(repo.active(alice).await.unwrap().is_none());

        let first = repo.start(alice, start("First", None)).await.unwrap();
        let second = repo.start(alice, start("Second", None)).await.unwrap();
        assert_eq!(repo.active(alice).await.unwrap().unwrap().session.id, second.session.id);

        repo.update(
            second.session.id,
            alice,
            UpdateWorkout {
                is_active: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(repo.active(alice).await.unwrap().unwrap().session.id, first.session.id);
    }

    #[tokio::test]
    async fn test_delete_cascades() {
        let pool = setup_test_db();
        let alice = create_test_user(&pool, "alice");
        let squats = create_test_exercise(&pool, "Squats", None);
        let repo = WorkoutRepository::new(pool.clone());
        let (session_id, entry_id) = workout_with_exercise(&repo, alice, squats).await;
        repo.log_set(session_id, entry_id, alice, reps(5, 80.0)).await.unwrap();

        repo.delete(session_id, alice).await.unwrap();

        assert!(matches!(repo.get(session_id, alice).await, Err(AppError::NotFound(_))));
        let conn = pool.get().unwrap();
        let live: i64 = conn
            .query_row(
                "SELECT (SELECT COUNT(*) FROM session_exercises WHERE deleted_at IS NULL)
                      + (SELECT COUNT(*) FROM exercise_sets WHERE deleted_at IS NULL)",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(live, 0);
    }

    #[tokio::test]
    async fn test_remove_exercise_and_update_completion() {
        let pool = setup_test_db();
        let alice = create_test_user(&pool, "alice");
        let squats = create_test_exercise(&pool, "Squats", None);
        let repo = WorkoutRepository::new(pool);
        let (session_id, entry_id) = workout_with_exercise(&repo, alice, squats).await;

        let done_at = Utc::now();
        let completed = repo
            .update_exercise(
                session_id,
                entry_id,
                alice,
                UpdateSessionExercise {
                    completed_at: Some(Some(done_at)),
                    notes: Some("easy".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(completed.completed_at.is_some());
        assert_eq!(completed.notes, "easy");

        let reopened = repo
            .update_exercise(
                session_id,
                entry_id,
                alice,
                UpdateSessionExercise {
                    completed_at: Some(None),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(reopened.completed_at.is_none());
        assert_eq!(reopened.notes, "easy");

        repo.remove_exercise(session_id, entry_id, alice).await.unwrap();
        assert!(repo.get(session_id, alice).await.unwrap().exercises.is_empty());
    }

    #[tokio::test]
    async fn test_add_exercise_appends() {
        let pool = setup_test_db();
        let alice = create_test_user(&pool, "alice");
        let squats = create_test_exercise(&pool, "Squats", None);
        let repo = WorkoutRepository::new(pool);
        let (session_id, first_id) = workout_with_exercise(&repo, alice, squats).await;

        let second = repo
            .add_exercise(
                session_id,
                alice,
                AddSessionExercise {
                    exercise_id: squats,
                    order_index: 0,
                    notes: String::new(),
                },
            )
            .await
            .unwrap();

        let workout = repo.get(session_id, alice).await.unwrap();
        assert_eq!(workout.exercises[0].id, first_id);
        assert_eq!(workout.exercises[0].order_index, 1);
        assert_eq!(second.order_index, 2);
    }

    #[tokio::test]
    async fn test_history_paging_and_dates() {
        let pool = setup_test_db();
        let alice = create_test_user(&pool, "alice");
        let repo = WorkoutRepository::new(pool.clone());
        for name in ["One", "Two", "Three"] {
            repo.start(alice, start(name, None)).await.unwrap();
        }
        {
            let conn = pool.get().unwrap();
            let old = "2020-01-15".parse::<NaiveDate>().unwrap();
            conn.execute(
                "UPDATE workout_sessions SET started_at = ? WHERE name = 'One'",
                [start_of_day(old) + Duration::hours(10)],
            )
            .unwrap();
        }

        let (page, total) = repo
            .history(
                alice,
                HistoryQuery {
                    limit: Some(2),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(total, 3);
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].session.name, "Three");

        let (old, total) = repo
            .history(
                alice,
                HistoryQuery {
                    start_date: Some("2020-01-15".parse().unwrap()),
                    end_date: Some("2020-01-15".parse().unwrap()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(total, 1);
        assert_eq!(old[0].session.name, "One");
    }

    #[tokio::test]
    async fn test_stats() {
        let pool = setup_test_db();
        let alice = create_test_user(&pool, "alice");
        let squats = create_test_exercise(&pool, "Squats", None);
        let repo = WorkoutRepository::new(pool);

        let empty = repo.stats(alice, 30).await.unwrap();
        assert_eq!(empty.total_workouts, 0);
        assert_eq!(empty.average_duration, 0.0);

        for minutes in [30, 60] {
            let (session_id, entry_id) = workout_with_exercise(&repo, alice, squats).await;
            repo.log_set(session_id, entry_id, alice, reps(5, 80.0)).await.unwrap();
            let started_at = repo.get(session_id, alice).await.unwrap().session.started_at;
            repo.update(
                session_id,
                alice,
                UpdateWorkout {
                    ended_at: Some(started_at + Duration::minutes(minutes)),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        }
        // Unfinished workouts add sets but not minutes.
        let (session_id, entry_id) = workout_with_exercise(&repo, alice, squats).await;
        repo.log_set(session_id, entry_id, alice, reps(5, 80.0)).await.unwrap();

        let stats = repo.stats(alice, 30).await.unwrap();
        assert_eq!(stats.total_workouts, 2);
        assert_eq!(stats.total_minutes, 90);
        assert_eq!(stats.total_sets, 3);
        assert_eq!(stats.average_duration, 45.0);
        assert_eq!(stats.days, 30);
    }

    #[tokio::test]
    async fn test_stats_with_unbounded_window() {
        let pool = setup_test_db();
        let alice = create_test_user(&pool, "alice");
        let session_id = create_test_session(&pool, alice, "Run");
        let repo = WorkoutRepository::new(pool);
        repo.update(
            session_id,
            alice,
            UpdateWorkout {
                is_active: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let stats = repo.stats(alice, i64::MAX).await.unwrap();

        assert_eq!(stats.total_workouts, 1);
        assert_eq!(stats.days, i64::MAX);
    }
}
