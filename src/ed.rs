//! Emergency department case service.
//!
//! Every mutation reads the case, applies the change, recomputes triage when
//! inputs changed, and writes it back with an optimistic version check. Two
//! staff members updating the same case at once get a `VersionConflict`
//! instead of silently losing one update.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

use crate::clock::Clock;
use crate::core::allocation::{optimize_resource_allocation, AllocationPlan};
use crate::core::deterioration::{predict_deterioration, DeteriorationForecast};
use crate::core::quality::{calculate_quality_metrics, QualityMetrics, DEFAULT_TIMEFRAME_HOURS};
use crate::db::{CaseRepository, ResourcePool};
use crate::error::{EdError, Result};
use crate::models::{
    ArrivalMode, CaseStatus, Demographics, Disposition, EmergencyCase, OrderStatus, OrderType,
    Priority, StaffAssignment, StaffRole, TreatmentOrder, Urgency, VitalsSnapshot,
};

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Arrival {
    #[validate(length(min = 1))]
    pub patient_id: String,
    #[serde(default)]
    pub chief_complaint: String,
    #[serde(default)]
    pub symptoms: Vec<String>,
    #[serde(default)]
    pub demographics: Demographics,
    #[validate]
    pub vitals: VitalsSnapshot,
    #[serde(default)]
    pub arrival_mode: ArrivalMode,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewTreatmentOrder {
    #[serde(rename = "type")]
    pub order_type: OrderType,
    #[validate(length(min = 1))]
    pub description: String,
    #[serde(default)]
    pub urgency: Urgency,
    #[validate(length(min = 1))]
    pub ordered_by: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Discharge {
    pub disposition: Disposition,
    #[serde(default)]
    pub final_diagnosis: Option<String>,
    #[validate(range(min = 0.0, max = 5.0))]
    #[serde(default)]
    pub satisfaction_score: Option<f64>,
}

fn require_active(case: &EmergencyCase) -> Result<()> {
    if case.is_active() {
        Ok(())
    } else {
        Err(EdError::CaseClosed(case.id))
    }
}

pub struct EmergencyDepartment<R, C> {
    cases: R,
    resources: ResourcePool,
    clock: C,
    quality_timeframe_hours: i64,
}

impl<R: CaseRepository, C: Clock> EmergencyDepartment<R, C> {
    pub fn new(cases: R, resources: ResourcePool, clock: C) -> Self {
        Self {
            cases,
            resources,
            clock,
            quality_timeframe_hours: DEFAULT_TIMEFRAME_HOURS,
        }
    }

    pub fn with_quality_timeframe(mut self, hours: i64) -> Self {
        self.quality_timeframe_hours = hours;
        self
    }

    pub fn resource_pool(&self) -> &ResourcePool {
        &self.resources
    }

    pub fn case(&self, case_id: Uuid) -> Result<EmergencyCase> {
        self.cases.get(case_id)?.ok_or(EdError::CaseNotFound(case_id))
    }

    pub fn cases(&self) -> Result<Vec<EmergencyCase>> {
        self.cases.list()
    }

    /// Load, change and store a case in one optimistic round trip.
    fn modify<T>(
        &self,
        case_id: Uuid,
        change: impl FnOnce(&mut EmergencyCase, DateTime<Utc>) -> Result<T>,
    ) -> Result<(EmergencyCase, T)> {
        let mut case = self.case(case_id)?;
        let output = change(&mut case, self.clock.now())?;
        let stored = self.cases.update(case)?;
        Ok((stored, output))
    }

    #[instrument(skip(self, arrival), fields(patient_id = %arrival.patient_id))]
    pub fn register_arrival(&self, arrival: Arrival) -> Result<EmergencyCase> {
        arrival.validate()?;

        let case = EmergencyCase::open(
            arrival.patient_id,
            arrival.chief_complaint,
            arrival.symptoms,
            arrival.demographics,
            arrival.vitals,
            arrival.arrival_mode,
            self.clock.now(),
        );
        self.cases.insert(case.clone())?;

        if case.priority == Priority::Critical {
            warn!(case_id = %case.id, score = ?case.triage_score, "critical arrival");
        } else {
            info!(case_id = %case.id, priority = %case.priority, "case registered");
        }
        Ok(case)
    }

    /// Append a vitals snapshot and rescore the case.
    #[instrument(skip(self, vitals), fields(case_id = %case_id))]
    pub fn record_vitals(&self, case_id: Uuid, vitals: VitalsSnapshot) -> Result<EmergencyCase> {
        vitals.validate()?;

        let (case, previous) = self.modify(case_id, |case, _| {
            require_active(case)?;
            if let Some(last) = case.vitals_history.last() {
                if vitals.timestamp < last.timestamp {
                    return Err(EdError::OutOfOrderVitals(case.id));
                }
            }
            let previous = case.priority;
            case.vitals_history.push(vitals.clone());
            case.vitals = Some(vitals);
            case.retriage();
            Ok(previous)
        })?;

        if case.priority.rank() > previous.rank() {
            warn!(from = %previous, to = %case.priority, "priority escalated");
        }
        Ok(case)
    }

    #[instrument(skip(self, symptoms), fields(case_id = %case_id))]
    pub fn update_symptoms(&self, case_id: Uuid, symptoms: Vec<String>) -> Result<EmergencyCase> {
        let (case, _) = self.modify(case_id, |case, _| {
            require_active(case)?;
            case.symptoms = symptoms;
            case.retriage();
            Ok(())
        })?;
        Ok(case)
    }

    /// Record a staff member on the case. The first physician to be assigned
    /// marks the start of treatment.
    #[instrument(skip(self), fields(case_id = %case_id))]
    pub fn assign_staff(&self, case_id: Uuid, staff_id: &str, role: StaffRole) -> Result<EmergencyCase> {
        let (case, _) = self.modify(case_id, |case, now| {
            require_active(case)?;
            case.assigned_staff.push(StaffAssignment {
                staff_id: staff_id.to_string(),
                role,
                assigned_at: now,
            });
            if role == StaffRole::Physician && case.treatment_start_time.is_none() {
                case.treatment_start_time = Some(now);
            }
            Ok(())
        })?;
        Ok(case)
    }

    #[instrument(skip(self), fields(case_id = %case_id))]
    pub fn start_treatment(&self, case_id: Uuid) -> Result<EmergencyCase> {
        let (case, _) = self.modify(case_id, |case, now| {
            require_active(case)?;
            case.treatment_start_time.get_or_insert(now);
            Ok(())
        })?;
        Ok(case)
    }

    #[instrument(skip(self, order), fields(case_id = %case_id))]
    pub fn add_treatment_order(&self, case_id: Uuid, order: NewTreatmentOrder) -> Result<TreatmentOrder> {
        order.validate()?;

        let (_, created) = self.modify(case_id, |case, now| {
            require_active(case)?;
            let created = TreatmentOrder {
                id: Uuid::new_v4(),
                order_type: order.order_type,
                description: order.description,
                urgency: order.urgency,
                status: OrderStatus::Pending,
                ordered_by: order.ordered_by,
                ordered_at: now,
                completed_by: None,
                completed_at: None,
                notes: None,
            };
            case.treatment_orders.push(created.clone());
            Ok(created)
        })?;
        info!(order_id = %created.id, urgency = ?created.urgency, "treatment order placed");
        Ok(created)
    }

    #[instrument(skip(self, notes), fields(case_id = %case_id, order_id = %order_id))]
    pub fn update_order_status(
        &self,
        case_id: Uuid,
        order_id: Uuid,
        status: OrderStatus,
        actor: &str,
        notes: Option<String>,
    ) -> Result<TreatmentOrder> {
        let (_, updated) = self.modify(case_id, |case, now| {
            let order = case
                .order_mut(order_id)
                .ok_or(EdError::OrderNotFound { case_id, order_id })?;
            if !order.status.can_transition_to(status) {
                return Err(EdError::InvalidOrderTransition {
                    from: order.status,
                    to: status,
                });
            }
            order.status = status;
            if status == OrderStatus::Completed {
                order.completed_by = Some(actor.to_string());
                order.completed_at = Some(now);
            }
            if notes.is_some() {
                order.notes = notes;
            }
            Ok(order.clone())
        })?;
        Ok(updated)
    }

    /// Close the case as completed and free its resource.
    #[instrument(skip(self, discharge), fields(case_id = %case_id))]
    pub fn discharge(&self, case_id: Uuid, discharge: Discharge) -> Result<EmergencyCase> {
        discharge.validate()?;

        let (case, freed) = self.modify(case_id, |case, now| {
            require_active(case)?;
            case.status = CaseStatus::Completed;
            case.discharge_time = Some(now);
            case.disposition = Some(discharge.disposition);
            case.final_diagnosis = discharge.final_diagnosis;
            case.satisfaction_score = discharge.satisfaction_score;
            Ok(case.resource_id.take())
        })?;

        if let Some(resource_id) = freed {
            self.resources.release(&resource_id)?;
        }
        info!(disposition = ?case.disposition, "case discharged");
        Ok(case)
    }

    /// Close the case as transferred out and free its resource.
    #[instrument(skip(self), fields(case_id = %case_id))]
    pub fn transfer(&self, case_id: Uuid, destination: &str) -> Result<EmergencyCase> {
        let (case, freed) = self.modify(case_id, |case, now| {
            require_active(case)?;
            case.status = CaseStatus::Transferred;
            case.discharge_time = Some(now);
            case.disposition = Some(Disposition::Transferred);
            Ok(case.resource_id.take())
        })?;

        if let Some(resource_id) = freed {
            self.resources.release(&resource_id)?;
        }
        info!(destination, "case transferred");
        Ok(case)
    }

    pub fn predict_deterioration(&self, case_id: Uuid) -> Result<DeteriorationForecast> {
        let case = self.case(case_id)?;
        Ok(predict_deterioration(&case))
    }

    /// Place waiting active cases into free resources and persist the result.
    ///
    /// A placement that cannot be applied, because the resource was taken or
    /// the case changed since the plan was made, goes back to the waiting
    /// queue. The returned plan describes exactly what was stored.
    #[instrument(skip(self))]
    pub fn allocate_resources(&self) -> Result<AllocationPlan> {
        let unplaced: Vec<EmergencyCase> = self
            .cases
            .list()?
            .into_iter()
            .filter(|c| c.is_active() && c.resource_id.is_none())
            .collect();
        let mut plan = optimize_resource_allocation(&unplaced, &self.resources.snapshot(), self.clock.now());

        let mut deferred = Vec::new();
        for assignment in &plan.assignments {
            if let Err(err) = self.place(assignment.case_id, &assignment.resource_id) {
                warn!(case_id = %assignment.case_id, resource_id = %assignment.resource_id, error = %err, "placement deferred");
                deferred.push(assignment.case_id);
            }
        }
        for case_id in deferred {
            plan.defer(case_id);
        }

        info!(
            assigned = plan.assignments.len(),
            waiting = plan.waiting_queue.len(),
            "resources allocated"
        );
        Ok(plan)
    }

    /// Occupy the resource and record it on the case, or leave both untouched.
    fn place(&self, case_id: Uuid, resource_id: &str) -> Result<()> {
        self.resources.occupy(resource_id)?;
        let placed = self.modify(case_id, |case, _| {
            require_active(case)?;
            case.resource_id = Some(resource_id.to_string());
            Ok(())
        });
        if let Err(err) = placed {
            self.resources.release(resource_id)?;
            return Err(err);
        }
        Ok(())
    }

    pub fn quality_metrics(&self, timeframe_hours: Option<i64>) -> Result<QualityMetrics> {
        let cases = self.cases.list()?;
        Ok(calculate_quality_metrics(
            &cases,
            timeframe_hours.unwrap_or(self.quality_timeframe_hours),
            self.clock.now(),
        ))
    }
}
