use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::classify::SafetyStatus;
use crate::decision::AlertLevel;

/// A persisted water quality reading. Immutable once written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityReading {
    pub id: i64,
    pub user_id: i64,
    pub recorded_at: DateTime<Utc>,
    pub safety_status: SafetyStatus,
    pub safety_score: i64,
    pub mean_hue: f64,
    pub mean_saturation: f64,
    pub mean_brightness: f64,
    pub texture_score: f64,
    pub alert_level: AlertLevel,
    pub image_ref: Option<String>,
    pub location: Option<String>,
    pub notes: Option<String>,
}
