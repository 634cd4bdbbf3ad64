use serde::{Deserialize, Serialize};

use crate::classify::SafetyStatus;

/// Aggregates over the full quality history of one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityStats {
    pub total: i64,
    pub safe_count: i64,
    pub unsafe_count: i64,
    /// Mean safety score rounded to the nearest integer; `None` with no
    /// readings.
    pub avg_score: Option<i64>,
}

/// Aggregates over the full meter history of one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeterStats {
    pub total: i64,
    pub avg_usage: Option<f64>,
    pub min_usage: Option<i64>,
    pub max_usage: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserStatistics {
    pub quality: QualityStats,
    pub meter: MeterStats,
    pub unread_alerts: i64,
}

/// One day of quality readings in a trend window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyQualityPoint {
    /// Calendar date, `YYYY-MM-DD`.
    pub date: String,
    pub avg_score: f64,
    pub count: i64,
}

/// One day of meter readings in a trend window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyUsagePoint {
    pub date: String,
    pub avg_usage: f64,
    pub count: i64,
}

/// Count of readings per safety status over the full history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafetySlice {
    pub status: SafetyStatus,
    pub count: i64,
}
