use anyhow::Result;
use rusqlite::params;

use crate::db::{
    helpers::parse_safety_status,
    models::{
        DailyQualityPoint, DailyUsagePoint, MeterStats, QualityStats, SafetySlice, UserStatistics,
    },
    Database,
};

impl Database {
    /// Counts and aggregates over the full history of one user. Always a
    /// fresh aggregation, never cached.
    pub async fn statistics(&self, user_id: i64) -> Result<UserStatistics> {
        self.execute(move |conn| {
            let quality = conn.query_row(
                "SELECT COUNT(*),
                        SUM(CASE WHEN safety_status = 'SAFE' THEN 1 ELSE 0 END),
                        SUM(CASE WHEN safety_status = 'UNSAFE' THEN 1 ELSE 0 END),
                        AVG(safety_score)
                 FROM quality_readings WHERE user_id = ?1",
                params![user_id],
                |row| {
                    let avg_score: Option<f64> = row.get(3)?;
                    Ok(QualityStats {
                        total: row.get(0)?,
                        safe_count: row.get::<_, Option<i64>>(1)?.unwrap_or(0),
                        unsafe_count: row.get::<_, Option<i64>>(2)?.unwrap_or(0),
                        avg_score: avg_score.map(|avg| avg.round() as i64),
                    })
                },
            )?;

            let meter = conn.query_row(
                "SELECT COUNT(*), AVG(reading_value), MIN(reading_value), MAX(reading_value)
                 FROM meter_readings WHERE user_id = ?1",
                params![user_id],
                |row| {
                    Ok(MeterStats {
                        total: row.get(0)?,
                        avg_usage: row.get(1)?,
                        min_usage: row.get(2)?,
                        max_usage: row.get(3)?,
                    })
                },
            )?;

            let unread_alerts = conn.query_row(
                "SELECT COUNT(*) FROM alerts WHERE user_id = ?1 AND is_read = 0",
                params![user_id],
                |row| row.get(0),
            )?;

            Ok(UserStatistics {
                quality,
                meter,
                unread_alerts,
            })
        })
        .await
    }

    /// Per-day average safety score over the trailing window.
    pub async fn daily_quality_trend(
        &self,
        user_id: i64,
        days: u32,
    ) -> Result<Vec<DailyQualityPoint>> {
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT DATE(recorded_at), AVG(safety_score), COUNT(*)
                 FROM quality_readings
                 WHERE user_id = ?1 AND recorded_at >= datetime('now', ?2)
                 GROUP BY DATE(recorded_at)
                 ORDER BY DATE(recorded_at)",
            )?;

            let mut rows = stmt.query(params![user_id, format!("-{days} days")])?;
            let mut points = Vec::new();
            while let Some(row) = rows.next()? {
                points.push(DailyQualityPoint {
                    date: row.get(0)?,
                    avg_score: row.get(1)?,
                    count: row.get(2)?,
                });
            }
            Ok(points)
        })
        .await
    }

    /// Per-day average usage over the trailing window.
    pub async fn daily_usage_trend(
        &self,
        user_id: i64,
        days: u32,
    ) -> Result<Vec<DailyUsagePoint>> {
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT DATE(recorded_at), AVG(reading_value), COUNT(*)
                 FROM meter_readings
                 WHERE user_id = ?1 AND recorded_at >= datetime('now', ?2)
                 GROUP BY DATE(recorded_at)
                 ORDER BY DATE(recorded_at)",
            )?;

            let mut rows = stmt.query(params![user_id, format!("-{days} days")])?;
            let mut points = Vec::new();
            while let Some(row) = rows.next()? {
                points.push(DailyUsagePoint {
                    date: row.get(0)?,
                    avg_usage: row.get(1)?,
                    count: row.get(2)?,
                });
            }
            Ok(points)
        })
        .await
    }

    /// Reading counts per safety status over the full history.
    pub async fn safety_distribution(&self, user_id: i64) -> Result<Vec<SafetySlice>> {
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT safety_status, COUNT(*)
                 FROM quality_readings
                 WHERE user_id = ?1
                 GROUP BY safety_status",
            )?;

            let mut rows = stmt.query(params![user_id])?;
            let mut slices = Vec::new();
            while let Some(row) = rows.next()? {
                let status: String = row.get(0)?;
                slices.push(SafetySlice {
                    status: parse_safety_status(&status)?,
                    count: row.get(1)?,
                });
            }
            Ok(slices)
        })
        .await
    }
}
