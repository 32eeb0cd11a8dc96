//! Equipment — a tracked asset assigned to a space, with a lifecycle status.
//!
//! The equipment aggregate owns its status and its assignment pointer (a
//! plain [`SpaceId`], never a live space). Every mutation goes through
//! [`Equipment::change_status`], [`Equipment::assign_to`],
//! [`Equipment::unassign`] or [`Equipment::remove`], which record
//! [`DomainEvent`]s instead of touching any other aggregate. The application
//! layer drains them with [`Equipment::take_events`] after a successful save.

mod kind;
mod status;

pub use kind::{EquipmentCategory, EquipmentType};
pub use status::EquipmentStatus;

use serde::{Deserialize, Serialize};

use crate::error::{AssignmentError, CampusError, ValidationError};
use crate::event::{DomainEvent, EventPayload};
use crate::id::{EquipmentId, SpaceId};
use crate::time::{Timestamp, elapsed_months, now};

/// Purchase metadata, only consumed by statistics and risk scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawAcquisition")]
pub struct Acquisition {
    value: f64,
    acquired_on: Timestamp,
    estimated_lifespan_months: u32,
}

impl Acquisition {
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidAcquisitionValue`] for negative or
    /// non-finite values and [`ValidationError::InvalidLifespan`] for a zero
    /// lifespan.
    pub fn new(
        value: f64,
        acquired_on: Timestamp,
        estimated_lifespan_months: u32,
    ) -> Result<Self, CampusError> {
        if !value.is_finite() || value < 0.0 {
            return Err(ValidationError::InvalidAcquisitionValue.into());
        }
        if estimated_lifespan_months == 0 {
            return Err(ValidationError::InvalidLifespan.into());
        }
        Ok(Self {
            value,
            acquired_on,
            estimated_lifespan_months,
        })
    }

    #[must_use]
    pub fn value(&self) -> f64 {
        self.value
    }

    #[must_use]
    pub fn acquired_on(&self) -> Timestamp {
        self.acquired_on
    }

    #[must_use]
    pub fn estimated_lifespan_months(&self) -> u32 {
        self.estimated_lifespan_months
    }

    /// Share of the estimated lifespan consumed at `at`, capped at `1.0`.
    #[must_use]
    pub fn age_ratio(&self, at: Timestamp) -> f64 {
        let elapsed = elapsed_months(self.acquired_on, at);
        (elapsed / f64::from(self.estimated_lifespan_months)).min(1.0)
    }
}

#[derive(Deserialize)]
struct RawAcquisition {
    value: f64,
    acquired_on: Timestamp,
    estimated_lifespan_months: u32,
}

impl TryFrom<RawAcquisition> for Acquisition {
    type Error = CampusError;

    fn try_from(raw: RawAcquisition) -> Result<Self, Self::Error> {
        Self::new(raw.value, raw.acquired_on, raw.estimated_lifespan_months)
    }
}

/// A tracked piece of equipment.
#[derive(Debug, Clone, Serialize)]
pub struct Equipment {
    pub id: EquipmentId,
    equipment_type: EquipmentType,
    pub name: String,
    pub serial_number: Option<String>,
    status: EquipmentStatus,
    space_id: Option<SpaceId>,
    failure_history_count: u32,
    installed_at: Option<Timestamp>,
    last_intervention_at: Option<Timestamp>,
    pub acquisition: Option<Acquisition>,
    pub created_at: Timestamp,
    pub version: u64,
    #[serde(skip)]
    pending: Vec<DomainEvent>,
}

impl Equipment {
    /// Create a builder for constructing an [`Equipment`].
    #[must_use]
    pub fn builder() -> EquipmentBuilder {
        EquipmentBuilder::default()
    }

    #[must_use]
    pub fn equipment_type(&self) -> EquipmentType {
        self.equipment_type
    }

    #[must_use]
    pub fn category(&self) -> EquipmentCategory {
        self.equipment_type.category()
    }

    #[must_use]
    pub fn status(&self) -> EquipmentStatus {
        self.status
    }

    #[must_use]
    pub fn space_id(&self) -> Option<SpaceId> {
        self.space_id
    }

    #[must_use]
    pub fn failure_history_count(&self) -> u32 {
        self.failure_history_count
    }

    #[must_use]
    pub fn installed_at(&self) -> Option<Timestamp> {
        self.installed_at
    }

    #[must_use]
    pub fn last_intervention_at(&self) -> Option<Timestamp> {
        self.last_intervention_at
    }

    #[must_use]
    pub fn is_defective(&self) -> bool {
        self.status.is_defective()
    }

    /// Share of the estimated lifespan consumed at `at`; `0.0` when unknown.
    #[must_use]
    pub fn age_ratio(&self, at: Timestamp) -> f64 {
        self.acquisition
            .as_ref()
            .map_or(0.0, |acquisition| acquisition.age_ratio(at))
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`CampusError::Validation`] when `name` is empty.
    pub fn validate(&self) -> Result<(), CampusError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        Ok(())
    }

    /// Check that a freshly registered equipment is not placed in a space
    /// while out of service.
    ///
    /// Stored equipment may still be out of service in a space: retiring
    /// does not unassign.
    ///
    /// # Errors
    ///
    /// Returns [`AssignmentError::OutOfService`] for that combination.
    pub fn ensure_registrable(&self) -> Result<(), CampusError> {
        if self.status == EquipmentStatus::OutOfService && self.space_id.is_some() {
            return Err(AssignmentError::OutOfService(self.id.to_string()).into());
        }
        Ok(())
    }

    /// Move to `target` if the transition table allows it.
    ///
    /// Staying in the current status is a no-op that records nothing and
    /// returns `Ok(false)`.
    ///
    /// # Errors
    ///
    /// Returns [`CampusError::InvalidTransition`] without touching any state
    /// when `target` is not reachable from the current status.
    pub fn change_status(
        &mut self,
        target: EquipmentStatus,
        reason: Option<String>,
        at: Timestamp,
    ) -> Result<bool, CampusError> {
        let old = self.status;
        let new = old.transition_to(target)?;
        if old == new {
            return Ok(false);
        }

        self.status = new;
        if new.is_failure() {
            self.failure_history_count = self.failure_history_count.saturating_add(1);
        }
        if new == EquipmentStatus::InMaintenance || new == EquipmentStatus::Good {
            self.last_intervention_at = Some(at);
        }

        self.record(
            EventPayload::StatusChanged {
                old_status: old,
                new_status: new,
                space_id: self.space_id,
                reason,
            },
            at,
        );
        Ok(true)
    }

    /// Assign the equipment to `space_id`, moving it from any previous space.
    ///
    /// Returns `Ok(false)` when already assigned there. The caller is
    /// responsible for checking that the target space accepts equipment.
    ///
    /// # Errors
    ///
    /// Returns [`AssignmentError::OutOfService`] for retired equipment.
    pub fn assign_to(&mut self, space_id: SpaceId, at: Timestamp) -> Result<bool, CampusError> {
        if self.space_id == Some(space_id) {
            return Ok(false);
        }
        if self.status == EquipmentStatus::OutOfService {
            return Err(AssignmentError::OutOfService(self.id.to_string()).into());
        }
        let old_space_id = self.space_id.replace(space_id);
        if self.installed_at.is_none() {
            self.installed_at = Some(at);
        }
        self.record(
            EventPayload::Assigned {
                old_space_id,
                new_space_id: space_id,
            },
            at,
        );
        Ok(true)
    }

    /// Clear the assignment. Returns `false` when not assigned.
    pub fn unassign(&mut self, at: Timestamp) -> bool {
        let Some(old_space_id) = self.space_id.take() else {
            return false;
        };
        self.record(EventPayload::Unassigned { old_space_id }, at);
        true
    }

    /// Record the removal of this equipment.
    ///
    /// # Errors
    ///
    /// Returns [`AssignmentError::StillAssigned`] when assigned and `cascade`
    /// is `false`.
    pub fn remove(&mut self, cascade: bool, at: Timestamp) -> Result<(), CampusError> {
        if let Some(space_id) = self.space_id
            && !cascade
        {
            return Err(
                AssignmentError::StillAssigned(self.id.to_string(), space_id.to_string()).into(),
            );
        }
        self.record(
            EventPayload::EquipmentRemoved {
                status: self.status,
                space_id: self.space_id,
            },
            at,
        );
        Ok(())
    }

    /// Events recorded since the last [`take_events`](Self::take_events).
    #[must_use]
    pub fn pending_events(&self) -> &[DomainEvent] {
        &self.pending
    }

    /// Drain the recorded events.
    pub fn take_events(&mut self) -> Vec<DomainEvent> {
        std::mem::take(&mut self.pending)
    }

    fn record(&mut self, payload: EventPayload, at: Timestamp) {
        self.pending
            .push(DomainEvent::for_equipment(self.id, payload).at(at));
    }
}

/// Step-by-step builder for [`Equipment`].
///
/// [`build`](Self::build) rehydrates an existing record without recording
/// anything; [`register`](Self::register) creates a new one and records an
/// `EquipmentRegistered` event.
#[derive(Debug, Default)]
pub struct EquipmentBuilder {
    id: Option<EquipmentId>,
    equipment_type: Option<EquipmentType>,
    name: Option<String>,
    serial_number: Option<String>,
    status: EquipmentStatus,
    space_id: Option<SpaceId>,
    failure_history_count: u32,
    installed_at: Option<Timestamp>,
    last_intervention_at: Option<Timestamp>,
    acquisition: Option<Acquisition>,
    created_at: Option<Timestamp>,
    version: u64,
}

impl EquipmentBuilder {
    #[must_use]
    pub fn id(mut self, id: EquipmentId) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn equipment_type(mut self, equipment_type: EquipmentType) -> Self {
        self.equipment_type = Some(equipment_type);
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn serial_number(mut self, serial_number: impl Into<String>) -> Self {
        self.serial_number = Some(serial_number.into());
        self
    }

    /// Initial status, for imported equipment. Defaults to `Good`.
    #[must_use]
    pub fn status(mut self, status: EquipmentStatus) -> Self {
        self.status = status;
        self
    }

    #[must_use]
    pub fn space_id(mut self, space_id: Option<SpaceId>) -> Self {
        self.space_id = space_id;
        self
    }

    #[must_use]
    pub fn failure_history_count(mut self, count: u32) -> Self {
        self.failure_history_count = count;
        self
    }

    #[must_use]
    pub fn installed_at(mut self, at: Option<Timestamp>) -> Self {
        self.installed_at = at;
        self
    }

    #[must_use]
    pub fn last_intervention_at(mut self, at: Option<Timestamp>) -> Self {
        self.last_intervention_at = at;
        self
    }

    #[must_use]
    pub fn acquisition(mut self, acquisition: Acquisition) -> Self {
        self.acquisition = Some(acquisition);
        self
    }

    #[must_use]
    pub fn created_at(mut self, at: Timestamp) -> Self {
        self.created_at = Some(at);
        self
    }

    #[must_use]
    pub fn version(mut self, version: u64) -> Self {
        self.version = version;
        self
    }

    /// Consume the builder, validate, and return an [`Equipment`].
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::MissingField`] without a type and
    /// [`ValidationError::EmptyName`] without a name.
    pub fn build(self) -> Result<Equipment, CampusError> {
        let equipment_type = self
            .equipment_type
            .ok_or(ValidationError::MissingField("equipment_type"))?;
        let equipment = Equipment {
            id: self.id.unwrap_or_default(),
            equipment_type,
            name: self.name.unwrap_or_default(),
            serial_number: self.serial_number,
            status: self.status,
            space_id: self.space_id,
            failure_history_count: self.failure_history_count,
            installed_at: self.installed_at,
            last_intervention_at: self.last_intervention_at,
            acquisition: self.acquisition,
            created_at: self.created_at.unwrap_or_else(now),
            version: self.version,
            pending: Vec::new(),
        };
        equipment.validate()?;
        Ok(equipment)
    }

    /// Build a new equipment and record its registration.
    ///
    /// # Errors
    ///
    /// Same as [`build`](Self::build), plus
    /// [`AssignmentError::OutOfService`] when an out-of-service equipment is
    /// registered into a space.
    pub fn register(self) -> Result<Equipment, CampusError> {
        let mut equipment = self.build()?;
        equipment.ensure_registrable()?;
        if equipment.space_id.is_some() && equipment.installed_at.is_none() {
            equipment.installed_at = Some(equipment.created_at);
        }
        let at = equipment.created_at;
        equipment.record(
            EventPayload::EquipmentRegistered {
                status: equipment.status,
                space_id: equipment.space_id,
            },
            at,
        );
        Ok(equipment)
    }
}
