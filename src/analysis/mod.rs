//! Request-scoped orchestration of the sensing-to-decision pipeline.
//!
//! The controller owns shared handles (store, classifier, metrics) and is
//! cheap to clone. Vision work is CPU-bound and synchronous, so it runs on
//! the blocking pool; classification reads the immutable classifier handle
//! inline; every persisted reading goes through the store's single-writer
//! transaction path.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::classify::{QualityClassifier, SafetyStatus};
use crate::db::models::{
    Alert, DailyQualityPoint, DailyUsagePoint, MeterReading, QualityReading, SafetySlice,
    UserSettings, UserStatistics,
};
use crate::db::{Database, MeterContext, QualityContext};
use crate::decision::{decide_quality, decide_usage};
use crate::error::{Error, Result};
use crate::export::export_report;
use crate::metrics::{MetricsCollector, MetricsSnapshot};
use crate::vision::{extract_features, recognize_meter, MeterRecognition, RecognitionTier};

/// Optional context supplied with a water sample photo.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QualitySampleContext {
    pub location: Option<String>,
    pub notes: Option<String>,
}

/// Optional context supplied with a meter photo.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MeterPhotoContext {
    pub location: Option<String>,
    pub meter_id: Option<String>,
}

/// Caller-facing result of a quality analysis.
#[derive(Debug, Clone, Serialize)]
pub struct QualityReport {
    pub reading_id: i64,
    pub safety_status: SafetyStatus,
    pub safety_score: i64,
    /// e.g. `87/100`
    pub score_display: String,
    pub alert: String,
    pub insight: String,
    /// e.g. `87.3%`
    pub confidence_display: String,
    pub degraded: bool,
    pub recorded_at: DateTime<Utc>,
}

/// Caller-facing result of a meter reading attempt. `RetakePhoto` is a
/// user-actionable outcome, not an error.
#[derive(Debug, Clone, Serialize)]
pub enum MeterOutcome {
    Report(MeterReport),
    RetakePhoto,
}

#[derive(Debug, Clone, Serialize)]
pub struct MeterReport {
    pub reading_id: i64,
    pub usage_liters: i64,
    /// e.g. `105535 Liters`
    pub usage_display: String,
    /// e.g. `Eco Limit: 14500 L/Month`
    pub limit_display: String,
    pub conservation_tip: String,
    pub insight: String,
    pub is_high: bool,
    pub coerced_zero: bool,
    pub recognized_by: RecognitionTier,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct AnalysisController {
    db: Database,
    classifier: Arc<QualityClassifier>,
    metrics: MetricsCollector,
}

impl AnalysisController {
    pub fn new(db: Database, classifier: Arc<QualityClassifier>) -> Self {
        Self {
            db,
            classifier,
            metrics: MetricsCollector::new(),
        }
    }

    /// Whether the classifier is running without a trained artifact.
    pub fn is_degraded(&self) -> bool {
        self.classifier.is_degraded()
    }

    /// Analyze a water sample photo: extract features, classify, decide,
    /// persist the reading (plus alert when unsafe) and report back.
    pub async fn analyze_quality(
        &self,
        user_id: i64,
        image: Vec<u8>,
        ctx: QualitySampleContext,
    ) -> Result<QualityReport> {
        let features = tokio::task::spawn_blocking(move || extract_features(&image))
            .await
            .map_err(|err| Error::FeatureExtraction(format!("analysis task failed: {err}")))??;

        let verdict = self.classifier.classify(&features);
        let decision = decide_quality(&verdict);
        let recorded_at = Utc::now();

        let reading_id = self
            .db
            .record_quality(
                user_id,
                &decision,
                &features,
                recorded_at,
                QualityContext {
                    image_ref: Some(format!("quality-{user_id}-{}", Uuid::new_v4())),
                    location: ctx.location,
                    notes: ctx.notes,
                },
            )
            .await?;

        self.metrics.record_quality_analysis(verdict.degraded).await;

        Ok(QualityReport {
            reading_id,
            safety_status: decision.status,
            safety_score: decision.safety_score,
            score_display: format!("{}/100", decision.safety_score),
            alert: decision.alert_message,
            insight: decision.insight,
            confidence_display: format!("{:.1}%", decision.confidence),
            degraded: verdict.degraded,
            recorded_at,
        })
    }

    /// Read a meter photo: recognize the digits, compare against the user's
    /// eco limit, persist the reading (plus alert when over limit) and
    /// report back. A rejected recognition returns `RetakePhoto`.
    pub async fn read_meter(
        &self,
        user_id: i64,
        image: Vec<u8>,
        original_filename: String,
        ctx: MeterPhotoContext,
    ) -> Result<MeterOutcome> {
        let recognition =
            tokio::task::spawn_blocking(move || recognize_meter(&image, &original_filename))
                .await
                .map_err(|err| Error::Recognition(format!("recognition task failed: {err}")))??;

        let (digits, tier) = match recognition {
            MeterRecognition::Rejected => {
                self.metrics.record_rejection().await;
                return Ok(MeterOutcome::RetakePhoto);
            }
            MeterRecognition::Reading { digits, tier } => (digits, tier),
        };

        let limit = self.db.get_settings(user_id).await?.eco_limit;
        let decision = decide_usage(&digits, tier, limit);
        let recorded_at = Utc::now();

        let reading_id = self
            .db
            .record_meter(
                user_id,
                &decision,
                recorded_at,
                MeterContext {
                    image_ref: Some(format!("meter-{user_id}-{}", Uuid::new_v4())),
                    meter_id: ctx.meter_id,
                    location: ctx.location,
                },
            )
            .await?;

        self.metrics
            .record_meter_read(tier, decision.coerced_zero)
            .await;

        Ok(MeterOutcome::Report(MeterReport {
            reading_id,
            usage_liters: decision.usage_liters,
            usage_display: format!("{} Liters", decision.raw_digits),
            limit_display: decision.monthly_estimate,
            conservation_tip: decision.conservation_tip,
            insight: decision.insight,
            is_high: decision.is_high,
            coerced_zero: decision.coerced_zero,
            recognized_by: tier,
            recorded_at,
        }))
    }

    pub async fn statistics(&self, user_id: i64) -> Result<UserStatistics> {
        Ok(self.db.statistics(user_id).await?)
    }

    pub async fn recent_quality(&self, user_id: i64, limit: usize) -> Result<Vec<QualityReading>> {
        Ok(self.db.recent_quality(user_id, limit).await?)
    }

    pub async fn recent_meter(&self, user_id: i64, limit: usize) -> Result<Vec<MeterReading>> {
        Ok(self.db.recent_meter(user_id, limit).await?)
    }

    pub async fn unread_alerts(&self, user_id: i64) -> Result<Vec<Alert>> {
        Ok(self.db.unread_alerts(user_id).await?)
    }

    pub async fn mark_alert_read(&self, alert_id: i64) -> Result<()> {
        Ok(self.db.mark_alert_read(alert_id).await?)
    }

    pub async fn get_settings(&self, user_id: i64) -> Result<UserSettings> {
        Ok(self.db.get_settings(user_id).await?)
    }

    pub async fn update_settings(&self, user_id: i64, settings: UserSettings) -> Result<()> {
        Ok(self.db.update_settings(user_id, settings).await?)
    }

    pub async fn daily_quality_trend(
        &self,
        user_id: i64,
        days: u32,
    ) -> Result<Vec<DailyQualityPoint>> {
        Ok(self.db.daily_quality_trend(user_id, days).await?)
    }

    pub async fn daily_usage_trend(
        &self,
        user_id: i64,
        days: u32,
    ) -> Result<Vec<DailyUsagePoint>> {
        Ok(self.db.daily_usage_trend(user_id, days).await?)
    }

    pub async fn safety_distribution(&self, user_id: i64) -> Result<Vec<SafetySlice>> {
        Ok(self.db.safety_distribution(user_id).await?)
    }

    /// Full reading history as an in-memory XLSX workbook.
    pub async fn export_report(&self, user_id: i64) -> Result<Vec<u8>> {
        let quality = self.db.quality_rows_for_export(user_id).await?;
        let meter = self.db.meter_rows_for_export(user_id).await?;
        export_report(&quality, &meter)
    }

    pub async fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.get_snapshot().await
    }
}
