//! Space — a room, office, lab, … on a floor, to which equipment is assigned.
//!
//! A space never computes equipment status itself. It only stores the derived
//! [`DefectState`], which is replaced wholesale by [`Space::recompute_defects`]
//! from a count supplied by the caller.

mod defect;
mod kind;

pub use defect::DefectState;
pub use kind::SpaceType;

use serde::Serialize;

use crate::error::{AssignmentError, CampusError, ValidationError};
use crate::id::{BuildingId, FloorId, OccupantId, SpaceId};
use crate::time::{Timestamp, now};

/// A space inside a floor.
#[derive(Debug, Clone, Serialize)]
pub struct Space {
    pub id: SpaceId,
    pub building_id: BuildingId,
    pub floor_id: FloorId,
    pub number: String,
    pub name: Option<String>,
    pub space_type: SpaceType,
    occupant_id: Option<OccupantId>,
    defects: DefectState,
    active: bool,
    pub created_at: Timestamp,
    pub version: u64,
}

impl Space {
    /// Create a builder for constructing a [`Space`].
    #[must_use]
    pub fn builder() -> SpaceBuilder {
        SpaceBuilder::default()
    }

    /// Whether this space is a lodging unit that can be occupied.
    #[must_use]
    pub fn is_room(&self) -> bool {
        self.space_type.is_room()
    }

    #[must_use]
    pub fn occupant_id(&self) -> Option<OccupantId> {
        self.occupant_id
    }

    #[must_use]
    pub fn is_occupied(&self) -> bool {
        self.occupant_id.is_some()
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    #[must_use]
    pub fn defects(&self) -> DefectState {
        self.defects
    }

    #[must_use]
    pub fn defective_equipment_count(&self) -> u32 {
        self.defects.count()
    }

    #[must_use]
    pub fn is_defective(&self) -> bool {
        self.defects.is_defective()
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`CampusError::Validation`] when `number` is empty, or
    /// [`CampusError::InvalidAssignment`] when an occupant is set on a
    /// non-room or on an inactive space.
    pub fn validate(&self) -> Result<(), CampusError> {
        if self.number.trim().is_empty() {
            return Err(ValidationError::EmptySpaceNumber.into());
        }
        if self.occupant_id.is_some() {
            if !self.is_room() {
                return Err(AssignmentError::NotARoom(self.id.to_string()).into());
            }
            if !self.active {
                return Err(AssignmentError::InactiveSpace(self.id.to_string()).into());
            }
        }
        Ok(())
    }

    /// Give the room to `occupant`, replacing any previous occupant.
    ///
    /// # Errors
    ///
    /// Returns [`AssignmentError::NotARoom`] when the space type cannot be
    /// occupied and [`AssignmentError::InactiveSpace`] when deactivated.
    pub fn assign_occupant(&mut self, occupant: OccupantId) -> Result<(), CampusError> {
        if !self.is_room() {
            return Err(AssignmentError::NotARoom(self.id.to_string()).into());
        }
        if !self.active {
            return Err(AssignmentError::InactiveSpace(self.id.to_string()).into());
        }
        self.occupant_id = Some(occupant);
        Ok(())
    }

    /// Clear the occupant, returning the previous one.
    pub fn release_occupant(&mut self) -> Option<OccupantId> {
        self.occupant_id.take()
    }

    /// Soft-deactivate the space.
    ///
    /// # Errors
    ///
    /// Returns [`AssignmentError::SpaceOccupied`] while an occupant is set.
    pub fn deactivate(&mut self) -> Result<(), CampusError> {
        if self.occupant_id.is_some() {
            return Err(AssignmentError::SpaceOccupied(self.id.to_string()).into());
        }
        self.active = false;
        Ok(())
    }

    pub fn reactivate(&mut self) {
        self.active = true;
    }

    /// Reject equipment assignment to a deactivated space.
    ///
    /// # Errors
    ///
    /// Returns [`AssignmentError::InactiveSpace`].
    pub fn ensure_accepts_equipment(&self) -> Result<(), CampusError> {
        if self.active {
            Ok(())
        } else {
            Err(AssignmentError::InactiveSpace(self.id.to_string()).into())
        }
    }

    /// Replace the defect state with one derived from `count`.
    ///
    /// Returns `true` when the stored state changed. Calling it again with the
    /// same count is a no-op.
    pub fn recompute_defects(&mut self, count: i64) -> bool {
        let next = DefectState::from_count(count);
        let changed = next != self.defects;
        self.defects = next;
        changed
    }
}

/// Step-by-step builder for [`Space`].
///
/// Besides fresh spaces, storage adapters use it to rehydrate persisted rows,
/// which is why occupant, defect count and version can be supplied.
#[derive(Debug, Default)]
pub struct SpaceBuilder {
    id: Option<SpaceId>,
    building_id: Option<BuildingId>,
    floor_id: Option<FloorId>,
    number: Option<String>,
    name: Option<String>,
    space_type: Option<SpaceType>,
    occupant_id: Option<OccupantId>,
    defective_count: u32,
    active: Option<bool>,
    created_at: Option<Timestamp>,
    version: u64,
}

impl SpaceBuilder {
    #[must_use]
    pub fn id(mut self, id: SpaceId) -> Self {
        self.id = Some(id);
        self
    }

    /// Place the space on `floor_id` of `building_id`.
    #[must_use]
    pub fn location(mut self, building_id: BuildingId, floor_id: FloorId) -> Self {
        self.building_id = Some(building_id);
        self.floor_id = Some(floor_id);
        self
    }

    #[must_use]
    pub fn number(mut self, number: impl Into<String>) -> Self {
        self.number = Some(number.into());
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn space_type(mut self, space_type: SpaceType) -> Self {
        self.space_type = Some(space_type);
        self
    }

    #[must_use]
    pub fn occupant_id(mut self, occupant_id: Option<OccupantId>) -> Self {
        self.occupant_id = occupant_id;
        self
    }

    #[must_use]
    pub fn defective_count(mut self, count: u32) -> Self {
        self.defective_count = count;
        self
    }

    #[must_use]
    pub fn active(mut self, active: bool) -> Self {
        self.active = Some(active);
        self
    }

    #[must_use]
    pub fn created_at(mut self, created_at: Timestamp) -> Self {
        self.created_at = Some(created_at);
        self
    }

    #[must_use]
    pub fn version(mut self, version: u64) -> Self {
        self.version = version;
        self
    }

    /// Consume the builder, validate, and return a [`Space`].
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::MissingField`] when the location or type is
    /// missing, and the errors of [`Space::validate`].
    pub fn build(self) -> Result<Space, CampusError> {
        let building_id = self
            .building_id
            .ok_or(ValidationError::MissingField("building_id"))?;
        let floor_id = self
            .floor_id
            .ok_or(ValidationError::MissingField("floor_id"))?;
        let space_type = self
            .space_type
            .ok_or(ValidationError::MissingField("space_type"))?;
        let space = Space {
            id: self.id.unwrap_or_default(),
            building_id,
            floor_id,
            number: self.number.unwrap_or_default(),
            name: self.name,
            space_type,
            occupant_id: self.occupant_id,
            defects: DefectState::from_count(i64::from(self.defective_count)),
            active: self.active.unwrap_or(true),
            created_at: self.created_at.unwrap_or_else(now),
            version: self.version,
        };
        space.validate()?;
        Ok(space)
    }
}
