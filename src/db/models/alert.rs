use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlertType {
    WaterQuality,
    HighUsage,
}

impl AlertType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertType::WaterQuality => "WATER_QUALITY",
            AlertType::HighUsage => "HIGH_USAGE",
        }
    }
}

/// Severity is determined by the triggering condition: unsafe water is
/// HIGH, an over-limit meter reading is MEDIUM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    High,
    Medium,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::High => "HIGH",
            Severity::Medium => "MEDIUM",
        }
    }
}

/// A derived alert referencing the reading that triggered it. Never
/// deleted; acknowledgement only flips `is_read`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub id: i64,
    pub user_id: i64,
    pub alert_type: AlertType,
    pub message: String,
    pub severity: Severity,
    pub created_at: DateTime<Utc>,
    pub is_read: bool,
    pub related_reading_id: Option<i64>,
}
