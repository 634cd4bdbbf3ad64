//! In-process counters for pipeline observability.
//!
//! Degraded classifications and zero-coercions are not errors, so this is
//! the only place they become visible to monitoring.

mod types;

pub use types::MetricsSnapshot;

use std::sync::Arc;
use tokio::sync::Mutex;

use crate::vision::RecognitionTier;

pub struct MetricsCollector {
    inner: Arc<Mutex<MetricsState>>,
}

#[derive(Default)]
struct MetricsState {
    quality_analyses: u64,
    degraded_classifications: u64,
    meter_reads: u64,
    rejected_recognitions: u64,
    filename_tier_hits: u64,
    zero_coercions: u64,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(MetricsState::default())),
        }
    }

    pub async fn record_quality_analysis(&self, degraded: bool) {
        let mut state = self.inner.lock().await;
        state.quality_analyses += 1;
        if degraded {
            state.degraded_classifications += 1;
        }
    }

    pub async fn record_meter_read(&self, tier: RecognitionTier, coerced_zero: bool) {
        let mut state = self.inner.lock().await;
        state.meter_reads += 1;
        if tier == RecognitionTier::Filename {
            state.filename_tier_hits += 1;
        }
        if coerced_zero {
            state.zero_coercions += 1;
        }
    }

    pub async fn record_rejection(&self) {
        let mut state = self.inner.lock().await;
        state.rejected_recognitions += 1;
    }

    pub async fn get_snapshot(&self) -> MetricsSnapshot {
        let state = self.inner.lock().await;
        MetricsSnapshot {
            quality_analyses: state.quality_analyses,
            degraded_classifications: state.degraded_classifications,
            meter_reads: state.meter_reads,
            rejected_recognitions: state.rejected_recognitions,
            filename_tier_hits: state.filename_tier_hits,
            zero_coercions: state.zero_coercions,
        }
    }

    pub async fn reset(&self) {
        let mut state = self.inner.lock().await;
        *state = MetricsState::default();
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for MetricsCollector {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn counters_accumulate_and_reset() {
        let metrics = MetricsCollector::new();
        metrics.record_quality_analysis(true).await;
        metrics.record_quality_analysis(false).await;
        metrics
            .record_meter_read(RecognitionTier::Filename, false)
            .await;
        metrics
            .record_meter_read(RecognitionTier::Optical, true)
            .await;
        metrics.record_rejection().await;

        let snapshot = metrics.get_snapshot().await;
        assert_eq!(snapshot.quality_analyses, 2);
        assert_eq!(snapshot.degraded_classifications, 1);
        assert_eq!(snapshot.meter_reads, 2);
        assert_eq!(snapshot.filename_tier_hits, 1);
        assert_eq!(snapshot.zero_coercions, 1);
        assert_eq!(snapshot.rejected_recognitions, 1);

        metrics.reset().await;
        assert_eq!(metrics.get_snapshot().await, MetricsSnapshot::default());
    }
}
