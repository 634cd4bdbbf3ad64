//! Decision logic converting raw classifier and recognizer signals into
//! user-facing verdicts.
//!
//! Both flows are pure functions; persistence and metrics happen in the
//! controller. The safety score is always oriented "higher = safer": for an
//! UNSAFE verdict it is the inverse of the classifier's confidence, for a
//! SAFE verdict the confidence itself.

use serde::{Deserialize, Serialize};

use crate::classify::{QualityVerdict, SafetyStatus};
use crate::log_warn;
use crate::vision::RecognitionTier;

const ENABLE_LOGS: bool = true;

/// Per-user usage threshold applied when no settings row exists yet.
pub const DEFAULT_ECO_LIMIT: i64 = 14_500;

/// Quality alerting has exactly two levels; there is no intermediate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlertLevel {
    None,
    High,
}

impl AlertLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertLevel::None => "NONE",
            AlertLevel::High => "HIGH",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityDecision {
    pub status: SafetyStatus,
    /// 0-100, higher = safer.
    pub safety_score: i64,
    pub alert_level: AlertLevel,
    pub alert_message: String,
    pub insight: String,
    /// Classifier confidence in percent, regardless of which class won.
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageDecision {
    pub usage_liters: i64,
    /// Raw recognized digit string the value was parsed from.
    pub raw_digits: String,
    pub limit: i64,
    pub is_high: bool,
    pub insight: String,
    pub conservation_tip: String,
    /// Always displays the configured limit, not a derived projection.
    pub monthly_estimate: String,
    /// True when the recognized string did not parse and the value was
    /// coerced to zero. Semantically distinct from a confirmed zero reading.
    pub coerced_zero: bool,
    pub recognized_by: RecognitionTier,
}

/// Quality flow: UNSAFE carries a HIGH alert, SAFE carries none.
pub fn decide_quality(verdict: &QualityVerdict) -> QualityDecision {
    let confidence = verdict.confidence;
    match verdict.status {
        SafetyStatus::Unsafe => QualityDecision {
            status: SafetyStatus::Unsafe,
            safety_score: 100 - confidence.round() as i64,
            alert_level: AlertLevel::High,
            alert_message: "ALERT: Boil water before use".into(),
            insight: format!(
                "Contamination detected ({confidence:.1}% confidence). \
                 Filtration and boiling recommended before consumption."
            ),
            confidence,
        },
        SafetyStatus::Safe => QualityDecision {
            status: SafetyStatus::Safe,
            safety_score: confidence.round() as i64,
            alert_level: AlertLevel::None,
            alert_message: "No realtime alerts".into(),
            insight: format!(
                "Water quality is good ({confidence:.1}% confidence). Safe for consumption."
            ),
            confidence,
        },
    }
}

/// Usage flow: strict comparison against the eco limit; a reading equal to
/// the limit is not an alert. Unparsable digit strings coerce to zero
/// rather than failing the request.
pub fn decide_usage(digits: &str, tier: RecognitionTier, limit: i64) -> UsageDecision {
    let (usage_liters, coerced_zero) = match digits.parse::<i64>() {
        Ok(value) => (value, false),
        Err(_) => {
            log_warn!("unparsable meter reading '{digits}' coerced to 0");
            (0, true)
        }
    };

    let is_high = usage_liters > limit;
    let (insight, conservation_tip) = if is_high {
        (
            format!("Alert: usage exceeds the {limit} L eco limit."),
            "High consumption detected. Check for leaks immediately.".to_string(),
        )
    } else {
        (
            "Normal usage pattern.".to_string(),
            "Great job! Your usage is within eco-limits.".to_string(),
        )
    };

    UsageDecision {
        usage_liters,
        raw_digits: digits.to_string(),
        limit,
        is_high,
        insight,
        conservation_tip,
        monthly_estimate: format!("Eco Limit: {limit} L/Month"),
        coerced_zero,
        recognized_by: tier,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsafe_score_is_inverted_confidence() {
        let decision = decide_quality(&QualityVerdict {
            status: SafetyStatus::Unsafe,
            confidence: 82.4,
            degraded: false,
        });
        assert_eq!(decision.safety_score, 100 - 82);
        assert_eq!(decision.alert_level, AlertLevel::High);
    }

    #[test]
    fn safe_score_equals_rounded_confidence() {
        let decision = decide_quality(&QualityVerdict {
            status: SafetyStatus::Safe,
            confidence: 97.6,
            degraded: false,
        });
        assert_eq!(decision.safety_score, 98);
        assert_eq!(decision.alert_level, AlertLevel::None);
    }

    #[test]
    fn usage_at_limit_is_not_high() {
        let decision = decide_usage("14500", RecognitionTier::Filename, 14_500);
        assert!(!decision.is_high);
        assert_eq!(decision.usage_liters, 14_500);
    }

    #[test]
    fn usage_one_over_limit_is_high() {
        let decision = decide_usage("14501", RecognitionTier::Filename, 14_500);
        assert!(decision.is_high);
    }

    #[test]
    fn unparsable_digits_coerce_to_zero() {
        let decision = decide_usage("", RecognitionTier::Optical, 14_500);
        assert_eq!(decision.usage_liters, 0);
        assert!(decision.coerced_zero);
        assert!(!decision.is_high);
    }

    #[test]
    fn overflowing_digits_coerce_to_zero() {
        let decision = decide_usage(
            "99999999999999999999999999",
            RecognitionTier::Optical,
            14_500,
        );
        assert_eq!(decision.usage_liters, 0);
        assert!(decision.coerced_zero);
    }

    #[test]
    fn monthly_estimate_shows_the_limit() {
        let decision = decide_usage("500", RecognitionTier::Filename, 9_000);
        assert_eq!(decision.monthly_estimate, "Eco Limit: 9000 L/Month");
    }
}
