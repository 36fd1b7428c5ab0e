use chrono::{DateTime, Utc};
use rusqlite::Row;
use serde::{Deserialize, Serialize};

use super::serde_helpers::deserialize_nullable;
use super::FromSqliteRow;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub subject: String,
    pub email: Option<String>,
    pub name: String,
    pub height: Option<f64>,
    pub weight: Option<f64>,
    pub goals: String,
    pub settings: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FromSqliteRow for User {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            subject: row.get("subject")?,
            email: row.get("email")?,
            name: row.get("name")?,
            height: row.get("height")?,
            weight: row.get("weight")?,
            goals: row.get("goals")?,
            settings: row.get("settings")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateProfile {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_nullable")]
    pub height: Option<Option<f64>>,
    #[serde(default, deserialize_with = "deserialize_nullable")]
    pub weight: Option<Option<f64>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateSettings {
    pub goals: Option<String>,
    pub settings: Option<String>,
}
