//! Equipment service — lifecycle and assignment use-cases.
//!
//! Every mutation follows the same sequence: take the per-equipment lock,
//! load, mutate through the aggregate, save with a version check, then publish
//! the events the aggregate recorded. Publishing happens after the save and
//! its failures are only logged.

use campushub_domain::equipment::{Equipment, EquipmentStatus};
use campushub_domain::error::{CampusError, NotFoundError};
use campushub_domain::event::DomainEvent;
use campushub_domain::id::{EquipmentId, SpaceId};
use campushub_domain::space::Space;
use campushub_domain::time::now;

use crate::keyed_lock::KeyedLock;
use crate::ports::{EquipmentFilter, EquipmentRepository, EventPublisher, SpaceRepository};

/// Application service for equipment.
pub struct EquipmentService<ER, SR, P> {
    equipment_repo: ER,
    space_repo: SR,
    publisher: P,
    locks: KeyedLock<EquipmentId>,
}

impl<ER, SR, P> EquipmentService<ER, SR, P>
where
    ER: EquipmentRepository,
    SR: SpaceRepository,
    P: EventPublisher,
{
    /// Create a new service.
    pub fn new(equipment_repo: ER, space_repo: SR, publisher: P) -> Self {
        Self {
            equipment_repo,
            space_repo,
            publisher,
            locks: KeyedLock::default(),
        }
    }

    /// Persist a new equipment built with
    /// [`EquipmentBuilder::register`](campushub_domain::equipment::EquipmentBuilder::register).
    ///
    /// # Errors
    ///
    /// Returns [`CampusError::Validation`] if invariants fail,
    /// [`CampusError::NotFound`] or [`CampusError::InvalidAssignment`] if the
    /// initial space is unknown or inactive or the equipment is out of
    /// service, or a storage error.
    #[tracing::instrument(skip(self, equipment), fields(equipment_id = %equipment.id))]
    pub async fn register_equipment(
        &self,
        mut equipment: Equipment,
    ) -> Result<Equipment, CampusError> {
        equipment.validate()?;
        equipment.ensure_registrable()?;
        if let Some(space_id) = equipment.space_id() {
            self.require_space(space_id)
                .await?
                .ensure_accepts_equipment()?;
        }
        let events = equipment.take_events();
        let created = self.equipment_repo.create(equipment).await?;
        self.publish(events).await;
        Ok(created)
    }

    /// Look up an equipment by id, returning an error if not found.
    ///
    /// # Errors
    ///
    /// Returns [`CampusError::NotFound`] when no equipment with `id` exists,
    /// or a storage error from the repository.
    pub async fn get_equipment(&self, id: EquipmentId) -> Result<Equipment, CampusError> {
        self.equipment_repo.get_by_id(id).await?.ok_or_else(|| {
            NotFoundError {
                entity: "Equipment",
                id: id.to_string(),
            }
            .into()
        })
    }

    /// List equipment matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn list_equipment(
        &self,
        filter: EquipmentFilter,
    ) -> Result<Vec<Equipment>, CampusError> {
        self.equipment_repo.find(filter).await
    }

    /// Move an equipment to `target`, publishing `StatusChanged`.
    ///
    /// Asking for the current status is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`CampusError::InvalidTransition`] when the move is not in the
    /// transition table (nothing is saved), [`CampusError::NotFound`],
    /// [`CampusError::VersionConflict`] on a concurrent write, or a storage error.
    #[tracing::instrument(skip(self, reason))]
    pub async fn change_status(
        &self,
        id: EquipmentId,
        target: EquipmentStatus,
        reason: Option<String>,
    ) -> Result<Equipment, CampusError> {
        let _guard = self.locks.acquire(id).await;
        let mut equipment = self.get_equipment(id).await?;
        if !equipment.change_status(target, reason, now())? {
            return Ok(equipment);
        }
        self.save(equipment).await
    }

    /// Assign an equipment to an active space, publishing `Assigned`.
    ///
    /// # Errors
    ///
    /// Returns [`CampusError::NotFound`] for an unknown equipment or space,
    /// [`CampusError::InvalidAssignment`] for an inactive space or an
    /// out-of-service equipment, [`CampusError::VersionConflict`], or a
    /// storage error.
    #[tracing::instrument(skip(self))]
    pub async fn assign_to(
        &self,
        id: EquipmentId,
        space_id: SpaceId,
    ) -> Result<Equipment, CampusError> {
        let _guard = self.locks.acquire(id).await;
        let mut equipment = self.get_equipment(id).await?;
        self.require_space(space_id)
            .await?
            .ensure_accepts_equipment()?;
        if !equipment.assign_to(space_id, now())? {
            return Ok(equipment);
        }
        self.save(equipment).await
    }

    /// Detach an equipment from its space, publishing `Unassigned`.
    ///
    /// # Errors
    ///
    /// Returns [`CampusError::NotFound`], [`CampusError::VersionConflict`],
    /// or a storage error.
    #[tracing::instrument(skip(self))]
    pub async fn unassign(&self, id: EquipmentId) -> Result<Equipment, CampusError> {
        let _guard = self.locks.acquire(id).await;
        let mut equipment = self.get_equipment(id).await?;
        if !equipment.unassign(now()) {
            return Ok(equipment);
        }
        self.save(equipment).await
    }

    /// Delete an equipment, publishing `EquipmentRemoved`.
    ///
    /// An assigned equipment is only removed when `cascade` is set.
    ///
    /// # Errors
    ///
    /// Returns [`CampusError::InvalidAssignment`] when still assigned without
    /// `cascade`, [`CampusError::NotFound`], or a storage error.
    #[tracing::instrument(skip(self))]
    pub async fn remove_equipment(&self, id: EquipmentId, cascade: bool) -> Result<(), CampusError> {
        let _guard = self.locks.acquire(id).await;
        let mut equipment = self.get_equipment(id).await?;
        equipment.remove(cascade, now())?;
        let events = equipment.take_events();
        self.equipment_repo.delete(id).await?;
        self.publish(events).await;
        Ok(())
    }

    async fn require_space(&self, id: SpaceId) -> Result<Space, CampusError> {
        self.space_repo.get_by_id(id).await?.ok_or_else(|| {
            NotFoundError {
                entity: "Space",
                id: id.to_string(),
            }
            .into()
        })
    }

    async fn save(&self, mut equipment: Equipment) -> Result<Equipment, CampusError> {
        let events = equipment.take_events();
        let saved = self.equipment_repo.update(equipment).await?;
        self.publish(events).await;
        Ok(saved)
    }

    async fn publish(&self, events: Vec<DomainEvent>) {
        if events.is_empty() {
            return;
        }
        let count = events.len();
        if let Err(err) = self.publisher.publish_all(events).await {
            tracing::warn!(%err, count, "failed to publish equipment events");
        }
    }
}
