use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::{params, Row};

use crate::db::{
    helpers::{parse_datetime, parse_tier},
    models::MeterReading,
    Database,
};
use crate::decision::UsageDecision;

/// Request-scoped context stored alongside a meter reading.
#[derive(Debug, Clone, Default)]
pub struct MeterContext {
    pub image_ref: Option<String>,
    pub meter_id: Option<String>,
    pub location: Option<String>,
}

fn row_to_reading(row: &Row) -> Result<MeterReading> {
    let recorded_at: String = row.get("recorded_at")?;
    let recognized_by: String = row.get("recognized_by")?;

    Ok(MeterReading {
        id: row.get("id")?,
        user_id: row.get("user_id")?,
        recorded_at: parse_datetime(&recorded_at, "recorded_at")?,
        reading_value: row.get("reading_value")?,
        raw_digits: row.get("raw_digits")?,
        is_high_usage: row.get("is_high_usage")?,
        coerced_zero: row.get("coerced_zero")?,
        recognized_by: parse_tier(&recognized_by)?,
        conservation_tip: row.get("conservation_tip")?,
        image_ref: row.get("image_ref")?,
        meter_id: row.get("meter_id")?,
        location: row.get("location")?,
    })
}

const SELECT_COLUMNS: &str = "id, user_id, recorded_at, reading_value, raw_digits, \
     is_high_usage, coerced_zero, recognized_by, conservation_tip, \
     image_ref, meter_id, location";

impl Database {
    /// Insert a meter reading and, for an over-limit value, exactly one
    /// MEDIUM severity alert, in a single transaction.
    pub async fn record_meter(
        &self,
        user_id: i64,
        decision: &UsageDecision,
        recorded_at: DateTime<Utc>,
        ctx: MeterContext,
    ) -> Result<i64> {
        let decision = decision.clone();
        self.execute(move |conn| {
            let tx = conn.transaction()?;

            tx.execute(
                "INSERT INTO meter_readings
                 (user_id, recorded_at, reading_value, raw_digits, is_high_usage,
                  coerced_zero, recognized_by, conservation_tip, image_ref, meter_id, location)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                params![
                    user_id,
                    recorded_at.to_rfc3339(),
                    decision.usage_liters,
                    decision.raw_digits,
                    decision.is_high,
                    decision.coerced_zero,
                    decision.recognized_by.as_str(),
                    decision.conservation_tip,
                    ctx.image_ref,
                    ctx.meter_id,
                    ctx.location,
                ],
            )?;
            let reading_id = tx.last_insert_rowid();

            if decision.is_high {
                tx.execute(
                    "INSERT INTO alerts
                     (user_id, alert_type, alert_message, severity, created_at,
                      is_read, related_reading_id)
                     VALUES (?1, 'HIGH_USAGE', ?2, 'MEDIUM', ?3, 0, ?4)",
                    params![
                        user_id,
                        format!(
                            "Usage exceeds eco limit! Current: {} L",
                            decision.usage_liters
                        ),
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

    /// Most recent meter readings, newest first, ties broken by id.
    pub async fn recent_meter(&self, user_id: i64, limit: usize) -> Result<Vec<MeterReading>> {
        let limit = limit as i64;
        self.execute(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {SELECT_COLUMNS} FROM meter_readings
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

    /// Full meter history, newest first, for tabular export.
    pub async fn meter_rows_for_export(&self, user_id: i64) -> Result<Vec<MeterReading>> {
        self.execute(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {SELECT_COLUMNS} FROM meter_readings
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
