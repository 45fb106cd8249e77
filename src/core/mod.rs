//! Deterministic scoring and allocation algorithms.
//!
//! Every function here is pure: inputs are borrowed, never mutated, and
//! results are returned as plain records. Callers snapshot case data before
//! calling and persist the results themselves.

pub mod allocation;
pub mod deterioration;
pub mod quality;
pub mod triage;

pub use allocation::{optimize_resource_allocation, AllocationPlan, Assignment, Utilization, WaitingEntry};
pub use deterioration::{predict_deterioration, DeteriorationForecast, DeteriorationRisk, Trend, TrendDirection};
pub use quality::{calculate_quality_metrics, QualityMetrics};
pub use triage::{calculate_triage_score, TriageAssessment};
