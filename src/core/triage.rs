//! Additive rule scoring over a vitals snapshot, symptoms and age.
//!
//! Each breached threshold adds a fixed number of points and a human readable
//! risk factor. The total maps onto a [`Priority`] through fixed cut-offs.

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::models::{Demographics, Priority, VitalsSnapshot};

/// Symptoms that add 4 points each.
pub const CRITICAL_SYMPTOMS: [&str; 4] = [
    "chest pain",
    "difficulty breathing",
    "unconscious",
    "severe bleeding",
];

/// Symptoms that add 2 points each.
pub const URGENT_SYMPTOMS: [&str; 4] = ["severe pain", "vomiting", "high fever", "confusion"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriageAssessment {
    pub score: u32,
    pub priority: Priority,
    pub risk_factors: Vec<String>,
    pub recommended_action: String,
}

#[derive(Default)]
struct Tally {
    score: u32,
    risk_factors: Vec<String>,
}

impl Tally {
    fn add(&mut self, points: u32, factor: impl Into<String>) {
        self.score += points;
        self.risk_factors.push(factor.into());
    }
}

fn outside(value: Option<f64>, low: f64, high: f64) -> bool {
    value.map_or(false, |v| v > high || v < low)
}

fn below(value: Option<f64>, low: f64) -> bool {
    value.map_or(false, |v| v < low)
}

fn matches_any(symptom: &str, keywords: &[&str]) -> bool {
    let symptom = symptom.to_lowercase();
    keywords.iter().any(|keyword| symptom.contains(keyword))
}

/// Score a patient from one vitals snapshot, the presenting symptoms and
/// demographics. Missing or non-numeric measurements never breach.
pub fn calculate_triage_score(
    vitals: &VitalsSnapshot,
    symptoms: &[String],
    demographics: &Demographics,
) -> TriageAssessment {
    let mut tally = Tally::default();

    if outside(vitals.systolic_bp, 90.0, 180.0) {
        tally.add(3, "Critical Blood Pressure");
    }
    if outside(vitals.heart_rate, 50.0, 120.0) {
        tally.add(2, "Abnormal Heart Rate");
    }
    if outside(vitals.temperature, 35.0, 39.0) {
        tally.add(2, "Temperature Extremes");
    }
    if below(vitals.oxygen_saturation, 92.0) {
        tally.add(3, "Low Oxygen Saturation");
    }
    if outside(vitals.respiratory_rate, 12.0, 24.0) {
        tally.add(2, "Abnormal Respiratory Rate");
    }

    // Substring match, so "mild chest pain" still counts as chest pain.
    for symptom in symptoms {
        if matches_any(symptom, &CRITICAL_SYMPTOMS) {
            tally.add(4, format!("Critical Symptom: {}", symptom));
        }
        if matches_any(symptom, &URGENT_SYMPTOMS) {
            tally.add(2, format!("Urgent Symptom: {}", symptom));
        }
    }

    if let Some(age) = demographics.age {
        if age > 65.0 || age < 2.0 {
            tally.add(1, "Age Risk Factor");
        }
    }

    let priority = Priority::from_score(tally.score);
    trace!(score = tally.score, %priority, "triage scored");

    TriageAssessment {
        score: tally.score,
        priority,
        risk_factors: tally.risk_factors,
        recommended_action: priority.recommended_action().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use fake::Fake;
    use test_case::test_case;

    fn normal_vitals() -> VitalsSnapshot {
        VitalsSnapshot::empty(Utc::now())
            .with_blood_pressure(120.0, 80.0)
            .with_heart_rate(75.0)
            .with_temperature(37.0)
            .with_oxygen_saturation(98.0)
            .with_respiratory_rate(16.0)
    }

    fn symptoms(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test_case(8, Priority::Critical)]
    #[test_case(7, Priority::High)]
    #[test_case(5, Priority::High)]
    #[test_case(4, Priority::Medium)]
    #[test_case(3, Priority::Medium)]
    #[test_case(2, Priority::Low)]
    #[test_case(0, Priority::Low)]
    fn test_priority_thresholds(score: u32, expected: Priority) {
        assert_eq!(Priority::from_score(score), expected);
    }

    #[test]
    fn test_randomized_normal_vitals_score_zero() {
        for _ in 0..200 {
            let vitals = VitalsSnapshot::empty(Utc::now())
                .with_blood_pressure((90..181).fake::<u32>() as f64, 80.0)
                .with_heart_rate((50..121).fake::<u32>() as f64)
                .with_temperature((350..391).fake::<u32>() as f64 / 10.0)
                .with_oxygen_saturation((92..101).fake::<u32>() as f64)
                .with_respiratory_rate((12..25).fake::<u32>() as f64);
            let age = (2..66).fake::<u32>();

            let result = calculate_triage_score(&vitals, &[], &Demographics::aged(age));
            assert_eq!(result.score, 0, "vitals {:?} age {}", vitals, age);
            assert_eq!(result.priority, Priority::Low);
            assert!(result.risk_factors.is_empty());
        }
    }

    #[test]
    fn test_end_to_end_critical_presentation() {
        let vitals = VitalsSnapshot::empty(Utc::now())
            .with_blood_pressure(200.0, 110.0)
            .with_heart_rate(130.0)
            .with_temperature(37.8)
            .with_oxygen_saturation(88.0)
            .with_respiratory_rate(28.0);
        let presenting = symptoms(&["chest pain", "difficulty breathing"]);

        // 65 is inside the age band, so no age point.
        let result = calculate_triage_score(&vitals, &presenting, &Demographics::aged(65));
        assert_eq!(result.score, 18);
        assert_eq!(result.priority, Priority::Critical);
        assert_eq!(
            result.recommended_action,
            "Immediate resuscitation required - Activate trauma team"
        );
        assert_eq!(
            result.risk_factors,
            vec![
                "Critical Blood Pressure",
                "Abnormal Heart Rate",
                "Low Oxygen Saturation",
                "Abnormal Respiratory Rate",
                "Critical Symptom: chest pain",
                "Critical Symptom: difficulty breathing",
            ]
        );

        let result = calculate_triage_score(&vitals, &presenting, &Demographics::aged(66));
        assert_eq!(result.score, 19);
        assert_eq!(result.risk_factors.last().unwrap(), "Age Risk Factor");
    }

    #[test]
    fn test_score_is_additive() {
        let demographics = Demographics::aged(40);
        let steps: [fn(VitalsSnapshot) -> VitalsSnapshot; 5] = [
            |v: VitalsSnapshot| v.with_blood_pressure(85.0, 50.0),
            |v: VitalsSnapshot| v.with_heart_rate(45.0),
            |v: VitalsSnapshot| v.with_temperature(34.0),
            |v: VitalsSnapshot| v.with_oxygen_saturation(90.0),
            |v: VitalsSnapshot| v.with_respiratory_rate(30.0),
        ];

        let mut vitals = normal_vitals();
        let mut previous = calculate_triage_score(&vitals, &[], &demographics).score;
        for step in steps {
            vitals = step(vitals);
            let score = calculate_triage_score(&vitals, &[], &demographics).score;
            assert!(score > previous);
            previous = score;
        }
        assert_eq!(previous, 12);
    }

    #[test_case("Chest Pain radiating to left arm", 4; "critical case insensitive")]
    #[test_case("mild chest pain", 4; "substring still matches")]
    #[test_case("Severe bleeding from scalp", 4; "bleeding")]
    #[test_case("vomiting since morning", 2; "urgent")]
    #[test_case("HIGH FEVER", 2; "urgent upper case")]
    #[test_case("headache", 0; "no match")]
    #[test_case("unconscious with confusion earlier", 6; "both sets")]
    fn test_symptom_keywords(symptom: &str, expected: u32) {
        let result = calculate_triage_score(&normal_vitals(), &symptoms(&[symptom]), &Demographics::aged(30));
        assert_eq!(result.score, expected);
    }

    #[test]
    fn test_symptom_labels_keep_raw_text() {
        let result = calculate_triage_score(
            &normal_vitals(),
            &symptoms(&["Chest Pain", "Vomiting"]),
            &Demographics::default(),
        );
        assert_eq!(
            result.risk_factors,
            vec!["Critical Symptom: Chest Pain", "Urgent Symptom: Vomiting"]
        );
        assert_eq!(result.score, 6);
        assert_eq!(result.priority, Priority::High);
    }

    #[test]
    fn test_missing_and_nan_vitals_do_not_breach() {
        let mut vitals = VitalsSnapshot::empty(Utc::now());
        vitals.heart_rate = Some(f64::NAN);
        vitals.oxygen_saturation = Some(f64::NAN);

        let result = calculate_triage_score(&vitals, &[], &Demographics::default());
        assert_eq!(result.score, 0);
        assert_eq!(result.priority, Priority::Low);
        assert_eq!(result.recommended_action, "Standard care - See within 2-4 hours");
    }

    #[test_case(1, 1)]
    #[test_case(2, 0)]
    #[test_case(65, 0)]
    #[test_case(66, 1)]
    fn test_age_risk(age: u32, expected: u32) {
        let result = calculate_triage_score(&normal_vitals(), &[], &Demographics::aged(age));
        assert_eq!(result.score, expected);
    }

    #[test_case(65.5, 1)]
    #[test_case(1.5, 1)]
    #[test_case(2.5, 0)]
    fn test_fractional_age_risk(age: f64, expected: u32) {
        let result = calculate_triage_score(&normal_vitals(), &[], &Demographics::aged(age));
        assert_eq!(result.score, expected);
    }

    #[test]
    fn test_threshold_edges_are_exclusive() {
        let vitals = VitalsSnapshot::empty(Utc::now())
            .with_blood_pressure(180.0, 100.0)
            .with_heart_rate(50.0)
            .with_temperature(39.0)
            .with_oxygen_saturation(92.0)
            .with_respiratory_rate(24.0);
        let result = calculate_triage_score(&vitals, &[], &Demographics::aged(30));
        assert_eq!(result.score, 0);
    }
}
