//! Plain data records shared by the scoring algorithms and the case service.

pub mod case;
pub mod resource;
pub mod vitals;

pub use case::{
    ArrivalMode, CaseStatus, Disposition, EmergencyCase, OrderStatus, OrderType, Priority,
    StaffAssignment, StaffRole, TreatmentOrder, Urgency,
};
pub use resource::{Resource, ResourceStatus, ResourceType};
pub use vitals::{Demographics, VitalsSnapshot};
