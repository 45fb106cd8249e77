//! Department quality indicators over a recent window of cases.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::{CaseStatus, EmergencyCase, Priority};

pub const DEFAULT_TIMEFRAME_HOURS: i64 = 24;

const CRITICAL_DIAGNOSES: [&str; 4] = ["myocardial infarction", "stroke", "sepsis", "trauma"];
const HIGH_DIAGNOSES: [&str; 3] = ["pneumonia", "appendicitis", "fracture"];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityMetrics {
    pub timeframe_hours: i64,
    pub total_cases: usize,
    pub completed_cases: usize,
    /// Minutes from arrival to treatment start.
    pub average_wait_time: f64,
    /// Percent of diagnosed cases whose priority agreed with the diagnosis.
    pub triage_accuracy: f64,
    /// Mean satisfaction on a 0-5 scale.
    pub patient_satisfaction: f64,
    /// Hours from arrival to discharge.
    pub length_of_stay: f64,
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

fn minutes(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    (to - from).num_seconds() as f64 / 60.0
}

/// Legacy keyword heuristic for whether a priority fit the final diagnosis.
/// It has no clinical validation; Medium and Low are always counted as fitting.
pub fn priority_matches_diagnosis(priority: Priority, diagnosis: &str) -> bool {
    let diagnosis = diagnosis.to_lowercase();
    let mentions = |keywords: &[&str]| keywords.iter().any(|k| diagnosis.contains(k));
    match priority {
        Priority::Critical => mentions(&CRITICAL_DIAGNOSES[..]),
        Priority::High => mentions(&CRITICAL_DIAGNOSES[..]) || mentions(&HIGH_DIAGNOSES[..]),
        Priority::Medium | Priority::Low => true,
    }
}

/// Aggregate metrics over cases that arrived within the last `timeframe_hours`.
///
/// A window too large to represent as a date reaches back indefinitely.
pub fn calculate_quality_metrics(
    cases: &[EmergencyCase],
    timeframe_hours: i64,
    now: DateTime<Utc>,
) -> QualityMetrics {
    let since = Duration::try_hours(timeframe_hours).and_then(|window| now.checked_sub_signed(window));
    let recent: Vec<&EmergencyCase> = cases
        .iter()
        .filter(|c| since.map_or(true, |since| c.arrival_time > since))
        .collect();

    if recent.is_empty() {
        return QualityMetrics {
            timeframe_hours,
            ..QualityMetrics::default()
        };
    }

    let average_wait_time = mean(
        recent
            .iter()
            .filter_map(|c| c.treatment_start_time.map(|start| minutes(c.arrival_time, start))),
    );

    let diagnosed: Vec<(Priority, &str)> = recent
        .iter()
        .filter(|c| c.triage_score.is_some())
        .filter_map(|c| c.final_diagnosis.as_deref().map(|d| (c.priority, d)))
        .collect();
    let triage_accuracy = if diagnosed.is_empty() {
        0.0
    } else {
        let accurate = diagnosed
            .iter()
            .filter(|(priority, diagnosis)| priority_matches_diagnosis(*priority, diagnosis))
            .count();
        accurate as f64 / diagnosed.len() as f64 * 100.0
    };

    let completed: Vec<&EmergencyCase> = recent
        .iter()
        .copied()
        .filter(|c| c.status == CaseStatus::Completed)
        .collect();
    let patient_satisfaction = mean(completed.iter().filter_map(|c| c.satisfaction_score));
    let length_of_stay = mean(
        completed
            .iter()
            .filter_map(|c| c.discharge_time.map(|end| minutes(c.arrival_time, end) / 60.0)),
    );

    debug!(cases = recent.len(), completed = completed.len(), "quality metrics computed");

    QualityMetrics {
        timeframe_hours,
        total_cases: recent.len(),
        completed_cases: completed.len(),
        average_wait_time,
        triage_accuracy,
        patient_satisfaction,
        length_of_stay,
    }
}
