use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::{params, Row};

use crate::db::{
    helpers::{parse_alert_level, parse_datetime, parse_safety_status},
    models::QualityReading,
    Database,
};
use crate::decision::{AlertLevel, QualityDecision};
use crate::vision::FeatureVector;

/// Request-scoped context stored alongside a quality reading.
#[derive(Debug, Clone, Default)]
pub struct QualityContext {
    pub image_ref: Option<String>,
    pub location: Option<String>,
    pub notes: Option<String>,
}

fn row_to_reading(row: &Row) -> Result<QualityReading> {
    let recorded_at: String = row.get("recorded_at")?;
    let safety_status: String = row.get("safety_status")?;
    let alert_level: String = row.get("alert_level")?;

    Ok(QualityReading {
        id: row.get("id")?,
        user_id: row.get("user_id")?,
        recorded_at: parse_datetime(&recorded_at, "recorded_at")?,
        safety_status: parse_safety_status(&safety_status)?,
        safety_score: row.get("safety_score")?,
        mean_hue: row.get("mean_hue")?,
        mean_saturation: row.get("mean_saturation")?,
        mean_brightness: row.get("mean_brightness")?,
        texture_score: row.get("texture_score")?,
        alert_level: parse_alert_level(&alert_level)?,
        image_ref: row.get("image_ref")?,
        location: row.get("location")?,
        notes: row.get("notes")?,
    })
}

const SELECT_COLUMNS: &str = "id, user_id, recorded_at, safety_status, safety_score, \
     mean_hue, mean_saturation, mean_brightness, texture_score, alert_level, \
     image_ref, location, notes";

impl Database {
    /// Insert a quality reading and, for an UNSAFE verdict, exactly one
    /// HIGH severity alert, in a single transaction.
    pub async fn record_quality(
        &self,
        user_id: i64,
        decision: &QualityDecision,
        features: &FeatureVector,
        recorded_at: DateTime<Utc>,
        ctx: QualityContext,
    ) -> Result<i64> {
        let decision = decision.clone();
        let features = features.clone();
        self.execute(move |conn| {
            let tx = conn.transaction()?;

            tx.execute(
                "INSERT INTO quality_readings
                 (user_id, recorded_at, safety_status, safety_score, mean_hue,
                  mean_saturation, mean_brightness, texture_score, alert_level,
                  image_ref, location, notes)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                params![
                    user_id,
                    recorded_at.to_rfc3339(),
                    decision.status.as_str(),
                    decision.safety_score,
                    features.mean_hue,
                    features.mean_saturation,
                    features.mean_brightness,
                    features.texture_score,
                    decision.alert_level.as_str(),
                    ctx.image_ref,
                    ctx.location,
                    ctx.notes,
                ],
            )?;
            let reading_id = tx.last_insert_rowid();

            if decision.alert_level == AlertLevel::High {
                tx.execute(
                    "INSERT INTO alerts
                     (user_id, alert_type, alert_message, severity, created_at,
                      is_read, related_reading_id)
                     VALUES (?1, 'WATER_QUALITY', ?2, 'HIGH', ?3, 0, ?4)",
                    params![
                        user_id,
                        "Unsafe water detected! Boil water before use.",
                        recorded_at.to_rfc3339(),
                        reading_id,
                    ],
                )?;
            }

            tx.commit()?;
            Ok(reading_id)
        })
        .await
    }

    /// Most recent quality readings, newest first, ties broken by id.
    pub async fn recent_quality(&self, user_id: i64, limit: usize) -> Result<Vec<QualityReading>> {
        let limit = limit as i64;
        self.execute(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {SELECT_COLUMNS} FROM quality_readings
                 WHERE user_id = ?1
                 ORDER BY recorded_at DESC, id DESC
                 LIMIT ?2"
            ))?;

            let mut rows = stmt.query(params![user_id, limit])?;
            let mut readings = Vec::new();
            while let Some(row) = rows.next()? {
                readings.push(row_to_reading(row)?);
            }
            Ok(readings)
        })
        .await
    }

    /// Full quality history, newest first, for tabular export.
    pub async fn quality_rows_for_export(&self, user_id: i64) -> Result<Vec<QualityReading>> {
        self.execute(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {SELECT_COLUMNS} FROM quality_readings
                 WHERE user_id = ?1
                 ORDER BY recorded_at DESC, id DESC"
            ))?;

            let mut rows = stmt.query(params![user_id])?;
            let mut readings = Vec::new();
            while let Some(row) = rows.next()? {
                readings.push(row_to_reading(row)?);
            }
            Ok(readings)
        })
        .await
    }
}
