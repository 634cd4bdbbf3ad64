use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::vision::RecognitionTier;

/// A persisted meter reading. Immutable once written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeterReading {
    pub id: i64,
    pub user_id: i64,
    pub recorded_at: DateTime<Utc>,
    pub reading_value: i64,
    /// Raw digit string the value was parsed from.
    pub raw_digits: String,
    pub is_high_usage: bool,
    /// True when `reading_value` is a coercion of an unparsable string, not
    /// a confirmed zero reading.
    pub coerced_zero: bool,
    pub recognized_by: RecognitionTier,
    pub conservation_tip: String,
    pub image_ref: Option<String>,
    pub meter_id: Option<String>,
    pub location: Option<String>,
}
