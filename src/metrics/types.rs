use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub quality_analyses: u64,
    pub degraded_classifications: u64,
    pub meter_reads: u64,
    pub rejected_recognitions: u64,
    pub filename_tier_hits: u64,
    pub zero_coercions: u64,
}
