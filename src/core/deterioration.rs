//! Trend-based deterioration risk from the most recent vitals.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::{EmergencyCase, VitalsSnapshot};

/// Number of most recent snapshots considered.
pub const TREND_WINDOW: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeteriorationRisk {
    High,
    Medium,
    Low,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Increasing,
    Decreasing,
    Stable,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Trend {
    pub direction: TrendDirection,
    pub magnitude: f64,
}

impl Trend {
    /// Change between the first and last reading, `None` when either is missing.
    fn between(first: Option<f64>, last: Option<f64>) -> Option<Self> {
        let (first, last) = (first?, last?);
        let direction = if last > first {
            TrendDirection::Increasing
        } else if last < first {
            TrendDirection::Decreasing
        } else {
            TrendDirection::Stable
        };
        Some(Self {
            direction,
            magnitude: (last - first).abs(),
        })
    }

    fn rose_by_more_than(trend: Option<Trend>, delta: f64) -> bool {
        trend.map_or(false, |t| t.direction == TrendDirection::Increasing && t.magnitude > delta)
    }

    fn fell_by_more_than(trend: Option<Trend>, delta: f64) -> bool {
        trend.map_or(false, |t| t.direction == TrendDirection::Decreasing && t.magnitude > delta)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VitalTrends {
    #[serde(rename = "systolicBP", skip_serializing_if = "Option::is_none")]
    pub systolic_bp: Option<Trend>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heart_rate: Option<Trend>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oxygen_saturation: Option<Trend>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<Trend>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeteriorationForecast {
    pub risk: DeteriorationRisk,
    /// Percent, capped at 95.
    pub confidence: u32,
    pub deterioration_score: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trends: Option<VitalTrends>,
    pub recommendations: Vec<String>,
}

impl DeteriorationForecast {
    fn unknown() -> Self {
        Self {
            risk: DeteriorationRisk::Unknown,
            confidence: 0,
            deterioration_score: 0,
            trends: None,
            recommendations: Vec::new(),
        }
    }
}

fn recommendations(risk: DeteriorationRisk) -> Vec<String> {
    let items: &[&str] = match risk {
        DeteriorationRisk::High => &[
            "Increase monitoring frequency to every 15 minutes",
            "Consider ICU consultation",
            "Review current treatment plan",
            "Prepare for potential escalation of care",
        ],
        DeteriorationRisk::Medium => &[
            "Increase monitoring frequency to every 30 minutes",
            "Review vital sign trends",
            "Consider additional diagnostic tests",
        ],
        DeteriorationRisk::Low => &["Continue standard monitoring", "Document current status"],
        DeteriorationRisk::Unknown => &[],
    };
    items.iter().map(|s| s.to_string()).collect()
}

pub fn predict_deterioration(case: &EmergencyCase) -> DeteriorationForecast {
    predict_from_history(&case.vitals_history)
}

/// Compare the first and last of the most recent [`TREND_WINDOW`] snapshots.
/// Fewer than two snapshots yields an `Unknown` forecast.
pub fn predict_from_history(history: &[VitalsSnapshot]) -> DeteriorationForecast {
    if history.len() < 2 {
        return DeteriorationForecast::unknown();
    }

    let window = &history[history.len().saturating_sub(TREND_WINDOW)..];
    let (first, last) = (&window[0], &window[window.len() - 1]);

    let trends = VitalTrends {
        systolic_bp: Trend::between(first.systolic_bp, last.systolic_bp),
        heart_rate: Trend::between(first.heart_rate, last.heart_rate),
        oxygen_saturation: Trend::between(first.oxygen_saturation, last.oxygen_saturation),
        temperature: Trend::between(first.temperature, last.temperature),
    };

    let mut score = 0;
    if Trend::fell_by_more_than(trends.systolic_bp, 20.0) {
        score += 2;
    }
    if Trend::rose_by_more_than(trends.heart_rate, 20.0) {
        score += 2;
    }
    if Trend::fell_by_more_than(trends.oxygen_saturation, 5.0) {
        score += 3;
    }
    if Trend::rose_by_more_than(trends.temperature, 1.5) {
        score += 1;
    }

    let risk = match score {
        s if s >= 4 => DeteriorationRisk::High,
        s if s >= 2 => DeteriorationRisk::Medium,
        _ => DeteriorationRisk::Low,
    };
    debug!(score, ?risk, window = window.len(), "deterioration predicted");

    DeteriorationForecast {
        risk,
        confidence: (score * 20).min(95),
        deterioration_score: score,
        trends: Some(trends),
        recommendations: recommendations(risk),
    }
}
