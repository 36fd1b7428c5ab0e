use chrono::Utc;

use crate::db::{create_memory_pool, DbPool};
use crate::migrations::run_migrations_for_tests;

pub fn setup_test_db() -> DbPool {
    let pool = create_memory_pool().expect("Failed to create test database");
    run_migrations_for_tests(&pool).expect("Failed to run migrations");
    pool
}

pub fn create_test_user(pool: &DbPool, subject: &str) -> u64 {
    let conn = pool.get().unwrap();
    let now = Utc::now();
    conn.execute(
        "INSERT INTO users (subject, email, name, created_at, updated_at) VALUES (?, ?, ?, ?, ?)",
        rusqlite::params![subject, format!("{}@example.com", subject), subject, now, now],
    )
    .unwrap();
    conn.last_insert_rowid() as u64
}

pub fn create_test_exercise(pool: &DbPool, name: &str, creator: Option<u64>) -> u64 {
    let conn = pool.get().unwrap();
    let now = Utc::now();
    conn.execute(
        "INSERT INTO exercises (name, muscle_groups, equipment, is_custom, created_by_user_id, created_at, updated_at)
         VALUES (?, 'legs', 'barbell', ?, ?, ?, ?)",
        rusqlite::params![name, creator.is_some(), creator, now, now],
    )
    .unwrap();
    conn.last_insert_rowid() as u64
}

pub fn create_test_template(pool: &DbPool, user_id: u64, name: &str, is_public: bool) -> u64 {
    let conn = pool.get().unwrap();
    let now = Utc::now();
    conn.execute(
        "INSERT INTO workout_templates (user_id, name, is_public, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?)",
        rusqlite::params![user_id, name, is_public, now, now],
    )
    .unwrap();
    conn.last_insert_rowid() as u64
}

pub fn create_test_session(pool: &DbPool, user_id: u64, name: &str) -> u64 {
    let conn = pool.get().unwrap();
    let now = Utc::now();
    conn.execute(
        "INSERT INTO workout_sessions (user_id, name, started_at, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?)",
        rusqlite::params![user_id, name, now, now, now],
    )
    .unwrap();
    conn.last_insert_rowid() as u64
}
