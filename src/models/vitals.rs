use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use validator::Validate;

/// A single set of vital signs taken at the bedside.
///
/// Every measurement is optional. A value that is absent, non-numeric or
/// non-finite is stored as `None` and never breaches a triage threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct VitalsSnapshot {
    #[serde(rename = "systolicBP", default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub systolic_bp: Option<f64>,
    #[serde(rename = "diastolicBP", default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub diastolic_bp: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub heart_rate: Option<f64>,
    /// Degrees Celsius.
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    /// Percent.
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub oxygen_saturation: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub respiratory_rate: Option<f64>,
    #[validate(range(min = 0.0, max = 10.0))]
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub pain_scale: Option<f64>,
    pub timestamp: DateTime<Utc>,
}

impl VitalsSnapshot {
    /// A snapshot with no measurements recorded.
    pub fn empty(timestamp: DateTime<Utc>) -> Self {
        Self {
            systolic_bp: None,
            diastolic_bp: None,
            heart_rate: None,
            temperature: None,
            oxygen_saturation: None,
            respiratory_rate: None,
            pain_scale: None,
            timestamp,
        }
    }

    pub fn with_blood_pressure(mut self, systolic: f64, diastolic: f64) -> Self {
        self.systolic_bp = Some(systolic);
        self.diastolic_bp = Some(diastolic);
        self
    }

    pub fn with_heart_rate(mut self, bpm: f64) -> Self {
        self.heart_rate = Some(bpm);
        self
    }

    pub fn with_temperature(mut self, celsius: f64) -> Self {
        self.temperature = Some(celsius);
        self
    }

    pub fn with_oxygen_saturation(mut self, percent: f64) -> Self {
        self.oxygen_saturation = Some(percent);
        self
    }

    pub fn with_respiratory_rate(mut self, per_minute: f64) -> Self {
        self.respiratory_rate = Some(per_minute);
        self
    }

    pub fn with_pain_scale(mut self, pain: f64) -> Self {
        self.pain_scale = Some(pain);
        self
    }
}

/// Patient demographics relevant to triage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Demographics {
    /// Years, fractional values kept as given.
    #[serde(default, deserialize_with = "lenient_age", skip_serializing_if = "Option::is_none")]
    pub age: Option<f64>,
}

impl Demographics {
    pub fn aged(age: impl Into<f64>) -> Self {
        Self { age: Some(age.into()) }
    }
}

fn as_finite(value: Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|n| n.is_finite())
}

fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(as_finite))
}

fn lenient_age<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(as_finite).filter(|age| *age >= 0.0))
}
