use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::Row;
use serde::{Deserialize, Serialize};

use super::FromSqliteRow;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaterLog {
    pub id: u64,
    pub user_id: u64,
    /// Millilitres.
    pub amount: f64,
    pub logged_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl FromSqliteRow for WaterLog {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            user_id: row.get("user_id")?,
            amount: row.get("amount")?,
            logged_at: row.get("logged_at")?,
            created_at: row.get("created_at")?,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogWater {
    pub amount: f64,
    /// Epoch milliseconds; defaults to now.
    pub logged_at: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WaterQuery {
    pub date: Option<NaiveDate>,
}

pub fn total_amount(logs: &[WaterLog]) -> f64 {
    logs.iter().map(|log| log.amount).sum()
}
