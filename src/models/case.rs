use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::vitals::{Demographics, VitalsSnapshot};
use crate::core::triage::{calculate_triage_score, TriageAssessment};

/// Severity class derived from the triage score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Priority {
    Critical,
    High,
    Medium,
    #[default]
    Low,
}

impl Priority {
    /// Ordering weight, higher is more urgent.
    pub fn rank(self) -> u8 {
        match self {
            Priority::Critical => 4,
            Priority::High => 3,
            Priority::Medium => 2,
            Priority::Low => 1,
        }
    }

    pub fn from_score(score: u32) -> Self {
        match score {
            s if s >= 8 => Priority::Critical,
            s if s >= 5 => Priority::High,
            s if s >= 3 => Priority::Medium,
            _ => Priority::Low,
        }
    }

    pub fn recommended_action(self) -> &'static str {
        match self {
            Priority::Critical => "Immediate resuscitation required - Activate trauma team",
            Priority::High => "Urgent medical attention - See within 15 minutes",
            Priority::Medium => "Semi-urgent care - See within 1 hour",
            Priority::Low => "Standard care - See within 2-4 hours",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Priority::Critical => "Critical",
            Priority::High => "High",
            Priority::Medium => "Medium",
            Priority::Low => "Low",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseStatus {
    #[default]
    Active,
    Completed,
    Transferred,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArrivalMode {
    #[default]
    WalkIn,
    Ambulance,
    Helicopter,
    PoliceTransport,
    Transfer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Disposition {
    Discharged,
    Admitted,
    Transferred,
    LeftAgainstMedicalAdvice,
    Deceased,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StaffRole {
    Physician,
    Nurse,
    Resident,
    Technician,
    Consultant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffAssignment {
    pub staff_id: String,
    pub role: StaffRole,
    pub assigned_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderType {
    Medication,
    Lab,
    Imaging,
    Procedure,
    Consultation,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    #[default]
    Routine,
    Urgent,
    Stat,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OrderStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

impl OrderStatus {
    /// pending -> in-progress -> completed, and pending | in-progress -> cancelled.
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        matches!(
            (self, next),
            (OrderStatus::Pending, OrderStatus::InProgress)
                | (OrderStatus::InProgress, OrderStatus::Completed)
                | (OrderStatus::Pending, OrderStatus::Cancelled)
                | (OrderStatus::InProgress, OrderStatus::Cancelled)
        )
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            OrderStatus::Pending => "pending",
            OrderStatus::InProgress => "in-progress",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreatmentOrder {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub order_type: OrderType,
    pub description: String,
    #[serde(default)]
    pub urgency: Urgency,
    #[serde(default)]
    pub status: OrderStatus,
    pub ordered_by: String,
    pub ordered_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// A single emergency department encounter.
///
/// `triage_score`, `priority`, `risk_factors` and `recommended_action` are
/// only ever written together through [`EmergencyCase::retriage`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmergencyCase {
    pub id: Uuid,
    /// Incremented by the repository on every successful write.
    #[serde(default)]
    pub version: u64,
    pub patient_id: String,
    #[serde(default)]
    pub chief_complaint: String,
    #[serde(default)]
    pub symptoms: Vec<String>,
    #[serde(default)]
    pub demographics: Demographics,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vitals: Option<VitalsSnapshot>,
    #[serde(default)]
    pub vitals_history: Vec<VitalsSnapshot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub triage_score: Option<u32>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub risk_factors: Vec<String>,
    #[serde(default)]
    pub recommended_action: String,
    #[serde(default)]
    pub treatment_orders: Vec<TreatmentOrder>,
    #[serde(default)]
    pub assigned_staff: Vec<StaffAssignment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<String>,
    pub arrival_time: DateTime<Utc>,
    #[serde(default)]
    pub arrival_mode: ArrivalMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub treatment_start_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discharge_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: CaseStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disposition: Option<Disposition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub satisfaction_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_diagnosis: Option<String>,
}

impl EmergencyCase {
    /// Open a new active case and score it from the arrival vitals.
    pub fn open(
        patient_id: impl Into<String>,
        chief_complaint: impl Into<String>,
        symptoms: Vec<String>,
        demographics: Demographics,
        vitals: VitalsSnapshot,
        arrival_mode: ArrivalMode,
        arrival_time: DateTime<Utc>,
    ) -> Self {
        let mut case = Self {
            id: Uuid::new_v4(),
            version: 0,
            patient_id: patient_id.into(),
            chief_complaint: chief_complaint.into(),
            symptoms,
            demographics,
            vitals: Some(vitals.clone()),
            vitals_history: vec![vitals],
            triage_score: None,
            priority: Priority::default(),
            risk_factors: Vec::new(),
            recommended_action: String::new(),
            treatment_orders: Vec::new(),
            assigned_staff: Vec::new(),
            resource_id: None,
            arrival_time,
            arrival_mode,
            treatment_start_time: None,
            discharge_time: None,
            status: CaseStatus::Active,
            disposition: None,
            satisfaction_score: None,
            final_diagnosis: None,
        };
        case.retriage();
        case
    }

    pub fn is_active(&self) -> bool {
        self.status == CaseStatus::Active
    }

    /// Recompute the triage fields from the current vitals, symptoms and
    /// demographics. Returns the new assessment.
    pub fn retriage(&mut self) -> TriageAssessment {
        let empty;
        let vitals = match &self.vitals {
            Some(vitals) => vitals,
            None => {
                empty = VitalsSnapshot::empty(self.arrival_time);
                &empty
            }
        };
        let assessment = calculate_triage_score(vitals, &self.symptoms, &self.demographics);
        self.triage_score = Some(assessment.score);
        self.priority = assessment.priority;
        self.risk_factors = assessment.risk_factors.clone();
        self.recommended_action = assessment.recommended_action.clone();
        assessment
    }

    pub fn order_mut(&mut self, order_id: Uuid) -> Option<&mut TreatmentOrder> {
        self.treatment_orders.iter_mut().find(|o| o.id == order_id)
    }
}
