//! Single-pass greedy placement of active cases into beds, bays and chairs.
//!
//! Cases are served by priority then arrival time. Each case takes the first
//! available resource of the type its priority requires, otherwise it joins
//! the waiting queue. Nothing is revisited once taken.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::models::{EmergencyCase, Priority, Resource, ResourceStatus, ResourceType};

/// Shortest wait ever quoted to a queued case, in minutes.
pub const MIN_WAIT_MINUTES: u32 = 15;

const WAIT_SCALE: f64 = 0.8;

/// Expected minutes a case of this priority holds its resource.
pub fn base_duration(priority: Priority) -> u32 {
    match priority {
        Priority::Critical => 120,
        Priority::High => 90,
        Priority::Medium => 60,
        Priority::Low => 30,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub case_id: Uuid,
    pub resource_id: String,
    pub resource_type: ResourceType,
    pub priority: Priority,
    /// Minutes.
    pub estimated_duration: u32,
    pub assigned_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaitingEntry {
    pub case_id: Uuid,
    pub priority: Priority,
    pub required_resource: ResourceType,
    /// Minutes.
    pub estimated_wait_time: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Utilization {
    pub total: usize,
    pub occupied: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationPlan {
    pub assignments: Vec<Assignment>,
    pub waiting_queue: Vec<WaitingEntry>,
    pub resource_utilization: BTreeMap<ResourceType, Utilization>,
}

impl AllocationPlan {
    /// Move an assignment back to the waiting queue, as if its resource had
    /// never been free. Returns the removed assignment.
    pub fn defer(&mut self, case_id: Uuid) -> Option<Assignment> {
        let index = self.assignments.iter().position(|a| a.case_id == case_id)?;
        let assignment = self.assignments.remove(index);

        if let Some(usage) = self.resource_utilization.get_mut(&assignment.resource_type) {
            usage.occupied = usage.occupied.saturating_sub(1);
        }
        self.waiting_queue.push(WaitingEntry {
            case_id,
            priority: assignment.priority,
            required_resource: assignment.resource_type,
            estimated_wait_time: estimate_wait(&self.assignments, assignment.priority),
        });
        Some(assignment)
    }
}

fn estimate_wait(assignments: &[Assignment], priority: Priority) -> u32 {
    let durations: Vec<u32> = assignments
        .iter()
        .filter(|a| a.priority == priority)
        .map(|a| a.estimated_duration)
        .collect();

    let reference = if durations.is_empty() {
        base_duration(priority) as f64
    } else {
        durations.iter().map(|&d| d as f64).sum::<f64>() / durations.len() as f64
    };

    ((reference * WAIT_SCALE).round() as u32).max(MIN_WAIT_MINUTES)
}

fn utilization(pool: &[Resource]) -> BTreeMap<ResourceType, Utilization> {
    let mut by_type: BTreeMap<ResourceType, Utilization> = BTreeMap::new();
    for resource in pool {
        let entry = by_type.entry(resource.resource_type).or_default();
        entry.total += 1;
        if resource.status == ResourceStatus::Occupied {
            entry.occupied += 1;
        }
    }
    by_type
}

/// Plan resource assignments for the active cases.
///
/// Inputs are not modified; the returned utilization reflects the pool after
/// the plan is applied, counting resources that were already occupied.
/// Equal priority and arrival time keep their input order.
pub fn optimize_resource_allocation(
    cases: &[EmergencyCase],
    resources: &[Resource],
    now: DateTime<Utc>,
) -> AllocationPlan {
    let mut pool = resources.to_vec();

    let mut queue: Vec<&EmergencyCase> = cases.iter().filter(|c| c.is_active()).collect();
    queue.sort_by(|a, b| {
        b.priority
            .rank()
            .cmp(&a.priority.rank())
            .then_with(|| a.arrival_time.cmp(&b.arrival_time))
    });

    let mut assignments = Vec::new();
    let mut waiting_queue = Vec::new();

    for case in queue {
        let required = ResourceType::for_priority(case.priority);
        let free = pool
            .iter_mut()
            .find(|r| r.resource_type == required && r.is_available());

        match free {
            Some(resource) => {
                resource.status = ResourceStatus::Occupied;
                assignments.push(Assignment {
                    case_id: case.id,
                    resource_id: resource.id.clone(),
                    resource_type: required,
                    priority: case.priority,
                    estimated_duration: base_duration(case.priority),
                    assigned_at: now,
                });
            }
            None => {
                waiting_queue.push(WaitingEntry {
                    case_id: case.id,
                    priority: case.priority,
                    required_resource: required,
                    estimated_wait_time: estimate_wait(&assignments, case.priority),
                });
            }
        }
    }

    debug!(
        assigned = assignments.len(),
        waiting = waiting_queue.len(),
        "allocation planned"
    );

    AllocationPlan {
        assignments,
        waiting_queue,
        resource_utilization: utilization(&pool),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ArrivalMode, Demographics, VitalsSnapshot};
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn case_with(priority: Priority, arrived_min: i64) -> EmergencyCase {
        let arrival = t0() + Duration::minutes(arrived_min);
        let mut case = EmergencyCase::open(
            "P",
            "",
            Vec::new(),
            Demographics::default(),
            VitalsSnapshot::empty(arrival),
            ArrivalMode::WalkIn,
            arrival,
        );
        case.priority = priority;
        case
    }

    #[test]
    fn test_critical_takes_trauma_bay_low_waits() {
        let critical = case_with(Priority::Critical, 5);
        let low = case_with(Priority::Low, 0);
        let resources = vec![Resource::available("TB-1", ResourceType::TraumaBay)];

        let plan = optimize_resource_allocation(&[low.clone(), critical.clone()], &resources, t0());

        assert_eq!(plan.assignments.len(), 1);
        assert_eq!(plan.assignments[0].case_id, critical.id);
        assert_eq!(plan.assignments[0].resource_id, "TB-1");
        assert_eq!(plan.assignments[0].estimated_duration, 120);

        assert_eq!(plan.waiting_queue.len(), 1);
        let waiting = &plan.waiting_queue[0];
        assert_eq!(waiting.case_id, low.id);
        assert_eq!(waiting.required_resource, ResourceType::TriageChair);
        assert!(waiting.estimated_wait_time >= MIN_WAIT_MINUTES);
        assert_eq!(waiting.estimated_wait_time, 24);

        // Input pool is untouched.
        assert!(resources[0].is_available());
    }

    #[test]
    fn test_earlier_arrival_wins_within_priority() {
        let late = case_with(Priority::High, 30);
        let early = case_with(Priority::High, 10);
        let resources = vec![Resource::available("AB-1", ResourceType::AcuteBed)];

        let plan = optimize_resource_allocation(&[late.clone(), early.clone()], &resources, t0());

        assert_eq!(plan.assignments[0].case_id, early.id);
        assert_eq!(plan.waiting_queue[0].case_id, late.id);
        // Same-priority assignment of 90 minutes scaled by 0.8.
        assert_eq!(plan.waiting_queue[0].estimated_wait_time, 72);
    }

    #[test]
    fn test_inactive_cases_are_skipped() {
        let mut done = case_with(Priority::Critical, 0);
        done.status = crate::models::CaseStatus::Completed;
        let resources = vec![Resource::available("TB-1", ResourceType::TraumaBay)];

        let plan = optimize_resource_allocation(&[done], &resources, t0());
        assert!(plan.assignments.is_empty());
        assert!(plan.waiting_queue.is_empty());
        assert_eq!(plan.resource_utilization[&ResourceType::TraumaBay].occupied, 0);
    }

    #[test]
    fn test_utilization_counts_preexisting_occupancy() {
        let cases = vec![
            case_with(Priority::Medium, 0),
            case_with(Priority::Medium, 1),
        ];
        let resources = vec![
            Resource::occupied("SB-1", ResourceType::StandardBed),
            Resource::available("SB-2", ResourceType::StandardBed),
            Resource::available("TC-1", ResourceType::TriageChair),
        ];

        let plan = optimize_resource_allocation(&cases, &resources, t0());

        assert_eq!(plan.assignments.len(), 1);
        assert_eq!(plan.assignments[0].resource_id, "SB-2");
        assert_eq!(plan.waiting_queue.len(), 1);
        assert_eq!(
            plan.resource_utilization[&ResourceType::StandardBed],
            Utilization { total: 2, occupied: 2 }
        );
        assert_eq!(
            plan.resource_utilization[&ResourceType::TriageChair],
            Utilization { total: 1, occupied: 0 }
        );
        assert!(!plan.resource_utilization.contains_key(&ResourceType::TraumaBay));
    }

    #[test]
    fn test_no_downgrade_to_other_resource_types() {
        // A free acute bed is never handed to a Critical case.
        let critical = case_with(Priority::Critical, 0);
        let resources = vec![Resource::available("AB-1", ResourceType::AcuteBed)];

        let plan = optimize_resource_allocation(&[critical], &resources, t0());
        assert!(plan.assignments.is_empty());
        assert_eq!(plan.waiting_queue[0].estimated_wait_time, 96);
    }

    #[test]
    fn test_defer_moves_assignment_to_waiting_queue() {
        let first = case_with(Priority::Low, 0);
        let second = case_with(Priority::Low, 1);
        let resources = vec![
            Resource::available("TC-1", ResourceType::TriageChair),
            Resource::available("TC-2", ResourceType::TriageChair),
        ];
        let mut plan = optimize_resource_allocation(&[first.clone(), second.clone()], &resources, t0());
        assert_eq!(plan.assignments.len(), 2);

        let deferred = plan.defer(second.id).unwrap();
        assert_eq!(deferred.resource_id, "TC-2");
        assert_eq!(plan.assignments.len(), 1);
        assert_eq!(plan.assignments[0].case_id, first.id);
        assert_eq!(plan.waiting_queue.len(), 1);
        assert_eq!(plan.waiting_queue[0].case_id, second.id);
        assert_eq!(plan.waiting_queue[0].estimated_wait_time, 24);
        assert_eq!(
            plan.resource_utilization[&ResourceType::TriageChair],
            Utilization { total: 2, occupied: 1 }
        );

        assert!(plan.defer(second.id).is_none());
    }

    #[test]
    fn test_plan_serializes_resource_keys_snake_case() {
        let resources = vec![Resource::available("TC-1", ResourceType::TriageChair)];
        let plan = optimize_resource_allocation(&[], &resources, t0());
        let json = serde_json::to_value(&plan).unwrap();
        assert_eq!(json["resourceUtilization"]["triage_chair"]["total"], 1);
    }
}
