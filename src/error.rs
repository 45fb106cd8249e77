use thiserror::Error;
use uuid::Uuid;

use crate::models::OrderStatus;

#[derive(Debug, Error)]
pub enum EdError {
    #[error("emergency case {0} was not found")]
    CaseNotFound(Uuid),
    #[error("emergency case {0} already exists")]
    DuplicateCase(Uuid),
    #[error("treatment order {order_id} was not found on case {case_id}")]
    OrderNotFound { case_id: Uuid, order_id: Uuid },
    #[error("resource {0} was not found")]
    ResourceNotFound(String),
    #[error("resource {0} is already occupied")]
    ResourceUnavailable(String),
    #[error("emergency case {0} is no longer active")]
    CaseClosed(Uuid),
    #[error("treatment order cannot move from {from} to {to}")]
    InvalidOrderTransition { from: OrderStatus, to: OrderStatus },
    #[error("vitals for case {0} are older than the last recorded snapshot")]
    OutOfOrderVitals(Uuid),
    #[error("case {case_id} was modified concurrently (expected version {expected}, found {found})")]
    VersionConflict { case_id: Uuid, expected: u64, found: u64 },
    #[error(transparent)]
    Validation(#[from] validator::ValidationErrors),
    #[error(transparent)]
    Config(#[from] ::config::ConfigError),
}

pub type Result<T, E = EdError> = std::result::Result<T, E>;
