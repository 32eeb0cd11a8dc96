//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into [`CampusError`]
//! via `#[from]`. Adapters box their own error type into
//! [`CampusError::Storage`].

use crate::equipment::EquipmentStatus;

/// Top-level error returned by domain operations, services and ports.
#[derive(Debug, thiserror::Error)]
pub enum CampusError {
    #[error("validation error")]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    NotFound(#[from] NotFoundError),

    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransition),

    #[error(transparent)]
    InvalidAssignment(#[from] AssignmentError),

    #[error(transparent)]
    VersionConflict(#[from] VersionConflict),

    #[error(transparent)]
    Timeout(#[from] TimeoutError),

    #[error("storage error")]
    Storage(Box<dyn std::error::Error + Send + Sync>),
}

impl CampusError {
    /// Whether retrying the same operation on freshly loaded state may succeed.
    #[must_use]
    pub fn is_version_conflict(&self) -> bool {
        matches!(self, Self::VersionConflict(_))
    }
}

/// Invariant violations detected while building or mutating a value.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("name must not be empty")]
    EmptyName,

    #[error("code must not be empty")]
    EmptyCode,

    #[error("space number must not be empty")]
    EmptySpaceNumber,

    #[error("street must not be empty")]
    EmptyStreet,

    #[error("city must not be empty")]
    EmptyCity,

    #[error("latitude {0} is outside [-90, 90]")]
    LatitudeOutOfRange(f64),

    #[error("longitude {0} is outside [-180, 180]")]
    LongitudeOutOfRange(f64),

    #[error("acquisition value must be a finite, non-negative amount")]
    InvalidAcquisitionValue,

    #[error("estimated lifespan must be at least one month")]
    InvalidLifespan,

    #[error("floor does not belong to building {0}")]
    FloorOutsideBuilding(String),

    #[error("missing required field `{0}`")]
    MissingField(&'static str),

    #[error("unknown {field} `{value}`")]
    UnknownValue { field: &'static str, value: String },
}

/// An aggregate could not be resolved by id.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{entity} {id} not found")]
pub struct NotFoundError {
    pub entity: &'static str,
    pub id: String,
}

/// A status change that is not listed in the transition table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("cannot move equipment from {from} to {to}")]
pub struct InvalidTransition {
    pub from: EquipmentStatus,
    pub to: EquipmentStatus,
}

/// Rejected occupant or equipment assignments.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AssignmentError {
    #[error("space {0} is not a room and cannot have an occupant")]
    NotARoom(String),

    #[error("space {0} is inactive")]
    InactiveSpace(String),

    #[error("space {0} is occupied and cannot be deactivated")]
    SpaceOccupied(String),

    #[error("equipment {0} is out of service and cannot be assigned")]
    OutOfService(String),

    #[error("equipment {0} is still assigned to space {1}")]
    StillAssigned(String, String),
}

/// Optimistic concurrency check failed on save.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{entity} {id} was modified concurrently (expected version {expected})")]
pub struct VersionConflict {
    pub entity: &'static str,
    pub id: String,
    pub expected: u64,
}

/// A read-only computation exceeded its deadline.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{operation} timed out after {millis}ms")]
pub struct TimeoutError {
    pub operation: &'static str,
    pub millis: u64,
}
