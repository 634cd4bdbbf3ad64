use anyhow::Result;
use rusqlite::{params, Row};

use crate::db::{
    helpers::{parse_alert_type, parse_datetime, parse_severity},
    models::Alert,
    Database,
};

fn row_to_alert(row: &Row) -> Result<Alert> {
    let alert_type: String = row.get("alert_type")?;
    let severity: String = row.get("severity")?;
    let created_at: String = row.get("created_at")?;

    Ok(Alert {
        id: row.get("id")?,
        user_id: row.get("user_id")?,
        alert_type: parse_alert_type(&alert_type)?,
        message: row.get("alert_message")?,
        severity: parse_severity(&severity)?,
        created_at: parse_datetime(&created_at, "created_at")?,
        is_read: row.get("is_read")?,
        related_reading_id: row.get("related_reading_id")?,
    })
}

impl Database {
    /// Unacknowledged alerts, newest first.
    pub async fn unread_alerts(&self, user_id: i64) -> Result<Vec<Alert>> {
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, user_id, alert_type, alert_message, severity, created_at,
                        is_read, related_reading_id
                 FROM alerts
                 WHERE user_id = ?1 AND is_read = 0
                 ORDER BY created_at DESC, id DESC",
            )?;

            let mut rows = stmt.query(params![user_id])?;
            let mut alerts = Vec::new();
            while let Some(row) = rows.next()? {
                alerts.push(row_to_alert(row)?);
            }
            Ok(alerts)
        })
        .await
    }

    /// Acknowledge an alert. Idempotent: marking an already-read or unknown
    /// id is a no-op, not an error.
    pub async fn mark_alert_read(&self, alert_id: i64) -> Result<()> {
        self.execute(move |conn| {
            conn.execute(
                "UPDATE alerts SET is_read = 1 WHERE id = ?1",
                params![alert_id],
            )?;
            Ok(())
        })
        .await
    }
}
