use chrono::{DateTime, Utc};
use rusqlite::Row;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::FromSqliteRow;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FastType {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub target_hours: i32,
    pub is_custom: bool,
    pub user_id: Option<u64>,
    pub created_at: DateTime<Utc>,
}

impl FromSqliteRow for FastType {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            description: row.get("description")?,
            target_hours: row.get("target_hours")?,
            is_custom: row.get("is_custom")?,
            user_id: row.get("user_id")?,
            created_at: row.get("created_at")?,
        })
    }
}

pub struct DefaultFastType {
    pub name: &'static str,
    pub description: &'static str,
    pub target_hours: i32,
}

pub const DEFAULT_FAST_TYPES: &[DefaultFastType] = &[
    DefaultFastType {
        name: "16:8 Intermittent Fast",
        description: "16 hours of fasting followed by 8-hour eating window",
        target_hours: 16,
    },
    DefaultFastType {
        name: "18:6 Intermittent Fast",
        description: "18 hours of fasting followed by 6-hour eating window",
        target_hours: 18,
    },
    DefaultFastType {
        name: "20:4 Intermittent Fast",
        description: "20 hours of fasting followed by 4-hour eating window",
        target_hours: 20,
    },
    DefaultFastType {
        name: "24-Hour Fast",
        description: "Full day fast from dinner to dinner",
        target_hours: 24,
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FastStatus {
    #[default]
    Ongoing,
    Completed,
    Cancelled,
}

impl FastStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FastStatus::Ongoing => "ongoing",
            FastStatus::Completed => "completed",
            FastStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "completed" => FastStatus::Completed,
            "cancelled" => FastStatus::Cancelled,
            _ => FastStatus::Ongoing,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FastSession {
    pub id: u64,
    pub user_id: u64,
    pub fast_type_id: Option<Uuid>,
    /// Protocol label such as `"16:8"` or `"OMAD"`.
    pub kind: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub target_minutes: i64,
    pub duration_minutes: Option<i64>,
    pub status: FastStatus,
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FromSqliteRow for FastSession {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let status: String = row.get("status")?;
        Ok(Self {
            id: row.get("id")?,
            user_id: row.get("user_id")?,
            fast_type_id: row.get("fast_type_id")?,
            kind: row.get("kind")?,
            start_time: row.get("start_time")?,
            end_time: row.get("end_time")?,
            target_minutes: row.get("target_minutes")?,
            duration_minutes: row.get("duration_minutes")?,
            status: FastStatus::parse(&status),
            notes: row.get("notes")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StartFast {
    pub fast_type_id: Uuid,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EndFast {
    pub notes: Option<String>,
    #[serde(default)]
    pub cancel: bool,
}

/// A fast timed on the client and submitted after the fact.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordFast {
    /// Epoch milliseconds.
    pub start_time: i64,
    /// Epoch milliseconds.
    pub end_time: i64,
    pub actual_duration_seconds: i64,
    pub goal_duration_seconds: i64,
    #[serde(default)]
    pub notes: String,
}

/// Protocol label for a target length in hours.
pub fn determine_type(target_hours: i64) -> &'static str {
    match target_hours {
        16 => "16:8",
        18 => "18:6",
        20 => "20:4",
        24 => "OMAD",
        _ => "custom",
    }
}
