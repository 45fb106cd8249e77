use serde::{Deserialize, Serialize};

use super::case::Priority;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    TraumaBay,
    AcuteBed,
    StandardBed,
    TriageChair,
}

impl ResourceType {
    /// The resource a case of the given priority is placed in.
    pub fn for_priority(priority: Priority) -> Self {
        match priority {
            Priority::Critical => ResourceType::TraumaBay,
            Priority::High => ResourceType::AcuteBed,
            Priority::Medium => ResourceType::StandardBed,
            Priority::Low => ResourceType::TriageChair,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceStatus {
    #[default]
    Available,
    Occupied,
}

/// A bed, bay or chair that holds at most one active case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub id: String,
    #[serde(rename = "type")]
    pub resource_type: ResourceType,
    #[serde(default)]
    pub status: ResourceStatus,
}

impl Resource {
    pub fn available(id: impl Into<String>, resource_type: ResourceType) -> Self {
        Self {
            id: id.into(),
            resource_type,
            status: ResourceStatus::Available,
        }
    }

    pub fn occupied(id: impl Into<String>, resource_type: ResourceType) -> Self {
        Self {
            id: id.into(),
            resource_type,
            status: ResourceStatus::Occupied,
        }
    }

    pub fn is_available(&self) -> bool {
        self.status == ResourceStatus::Available
    }
}
