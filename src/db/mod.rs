//! Storage module for the emergency department.
//!
//! Cases sit behind the [`CaseRepository`] trait so a document store can be
//! swapped in; the in-memory implementation keeps them in a `DashMap`.
//! Writes are optimistic: an update only lands if the caller read the
//! version currently stored.

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::debug;
use uuid::Uuid;

use crate::error::{EdError, Result};
use crate::models::{EmergencyCase, Resource, ResourceStatus};

#[cfg_attr(test, mockall::automock)]
pub trait CaseRepository: Send + Sync {
    fn insert(&self, case: EmergencyCase) -> Result<()>;

    fn get(&self, id: Uuid) -> Result<Option<EmergencyCase>>;

    /// Store `case` if its `version` matches the stored one and return the
    /// stored copy with the version bumped.
    fn update(&self, case: EmergencyCase) -> Result<EmergencyCase>;

    fn list(&self) -> Result<Vec<EmergencyCase>>;
}

/// Case store backed by a concurrent map
#[derive(Debug, Clone, Default)]
pub struct InMemoryCaseRepository {
    cases: Arc<DashMap<Uuid, EmergencyCase>>,
}

impl InMemoryCaseRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }
}

impl CaseRepository for InMemoryCaseRepository {
    fn insert(&self, case: EmergencyCase) -> Result<()> {
        match self.cases.entry(case.id) {
            Entry::Occupied(_) => Err(EdError::DuplicateCase(case.id)),
            Entry::Vacant(slot) => {
                slot.insert(case);
                Ok(())
            }
        }
    }

    fn get(&self, id: Uuid) -> Result<Option<EmergencyCase>> {
        Ok(self.cases.get(&id).map(|case| case.clone()))
    }

    fn update(&self, mut case: EmergencyCase) -> Result<EmergencyCase> {
        let mut stored = self
            .cases
            .get_mut(&case.id)
            .ok_or(EdError::CaseNotFound(case.id))?;

        if stored.version != case.version {
            return Err(EdError::VersionConflict {
                case_id: case.id,
                expected: case.version,
                found: stored.version,
            });
        }

        case.version += 1;
        *stored = case.clone();
        debug!(case_id = %case.id, version = case.version, "case stored");
        Ok(case)
    }

    fn list(&self) -> Result<Vec<EmergencyCase>> {
        let mut cases: Vec<EmergencyCase> = self.cases.iter().map(|entry| entry.value().clone()).collect();
        cases.sort_by(|a, b| a.arrival_time.cmp(&b.arrival_time));
        Ok(cases)
    }
}

/// The department's beds, bays and chairs.
#[derive(Debug, Clone, Default)]
pub struct ResourcePool {
    resources: Arc<DashMap<String, Resource>>,
}

impl ResourcePool {
    pub fn new(resources: impl IntoIterator<Item = Resource>) -> Self {
        let pool = Self::default();
        for resource in resources {
            pool.add(resource);
        }
        pool
    }

    pub fn add(&self, resource: Resource) {
        self.resources.insert(resource.id.clone(), resource);
    }

    pub fn get(&self, id: &str) -> Option<Resource> {
        self.resources.get(id).map(|r| r.clone())
    }

    /// Point-in-time copy ordered by id.
    pub fn snapshot(&self) -> Vec<Resource> {
        let mut resources: Vec<Resource> = self.resources.iter().map(|entry| entry.value().clone()).collect();
        resources.sort_by(|a, b| a.id.cmp(&b.id));
        resources
    }

    pub fn occupy(&self, id: &str) -> Result<()> {
        let mut resource = self
            .resources
            .get_mut(id)
            .ok_or_else(|| EdError::ResourceNotFound(id.to_string()))?;
        if resource.status == ResourceStatus::Occupied {
            return Err(EdError::ResourceUnavailable(id.to_string()));
        }
        resource.status = ResourceStatus::Occupied;
        Ok(())
    }

    pub fn release(&self, id: &str) -> Result<()> {
        let mut resource = self
            .resources
            .get_mut(id)
            .ok_or_else(|| EdError::ResourceNotFound(id.to_string()))?;
        resource.status = ResourceStatus::Available;
        Ok(())
    }
}
