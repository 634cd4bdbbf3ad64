use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};

use crate::classify::SafetyStatus;
use crate::db::models::{AlertType, Severity};
use crate::decision::AlertLevel;
use crate::vision::RecognitionTier;

pub fn parse_datetime(value: &str, field: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .with_context(|| format!("failed to parse {field}"))
}

pub fn parse_optional_datetime(
    value: Option<String>,
    field: &str,
) -> Result<Option<DateTime<Utc>>> {
    match value {
        Some(raw) => parse_datetime(&raw, field).map(Some),
        None => Ok(None),
    }
}

pub fn parse_safety_status(value: &str) -> Result<SafetyStatus> {
    match value {
        "SAFE" => Ok(SafetyStatus::Safe),
        "UNSAFE" => Ok(SafetyStatus::Unsafe),
        other => Err(anyhow!("unknown safety status {other}")),
    }
}

pub fn parse_alert_level(value: &str) -> Result<AlertLevel> {
    match value {
        "NONE" => Ok(AlertLevel::None),
        "HIGH" => Ok(AlertLevel::High),
        other => Err(anyhow!("unknown alert level {other}")),
    }
}

pub fn parse_alert_type(value: &str) -> Result<AlertType> {
    match value {
        "WATER_QUALITY" => Ok(AlertType::WaterQuality),
        "HIGH_USAGE" => Ok(AlertType::HighUsage),
        other => Err(anyhow!("unknown alert type {other}")),
    }
}

pub fn parse_severity(value: &str) -> Result<Severity> {
    match value {
        "HIGH" => Ok(Severity::High),
        "MEDIUM" => Ok(Severity::Medium),
        other => Err(anyhow!("unknown severity {other}")),
    }
}

pub fn parse_tier(value: &str) -> Result<RecognitionTier> {
    match value {
        "filename" => Ok(RecognitionTier::Filename),
        "optical" => Ok(RecognitionTier::Optical),
        other => Err(anyhow!("unknown recognition tier {other}")),
    }
}
