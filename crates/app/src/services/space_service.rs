//! Space service — creation, occupancy and activation of spaces.
//!
//! Direct edits go through the repository's version check and surface
//! [`CampusError::VersionConflict`] to the caller without retrying.

use campushub_domain::error::{CampusError, NotFoundError, ValidationError};
use campushub_domain::id::{BuildingId, OccupantId, SpaceId};
use campushub_domain::space::Space;

use crate::handlers::{RecomputeOutcome, RecomputePolicy, SpaceDefectRecomputer};
use crate::ports::{EquipmentRepository, EventPublisher, FloorRepository, SpaceRepository};

/// Application service for spaces.
pub struct SpaceService<SR, FR, ER, P> {
    space_repo: SR,
    floor_repo: FR,
    recomputer: SpaceDefectRecomputer<ER, SR>,
    publisher: P,
}

impl<SR, FR, ER, P> SpaceService<SR, FR, ER, P>
where
    SR: SpaceRepository + Clone + Sync,
    FR: FloorRepository,
    ER: EquipmentRepository + Sync,
    P: EventPublisher,
{
    /// Create a new service.
    pub fn new(
        space_repo: SR,
        floor_repo: FR,
        equipment_repo: ER,
        publisher: P,
        policy: RecomputePolicy,
    ) -> Self {
        Self {
            recomputer: SpaceDefectRecomputer::new(equipment_repo, space_repo.clone(), policy),
            space_repo,
            floor_repo,
            publisher,
        }
    }

    /// Create a new space on an existing floor.
    ///
    /// # Errors
    ///
    /// Returns [`CampusError::Validation`] if invariants fail or the floor
    /// belongs to another building, [`CampusError::NotFound`] for an unknown
    /// floor, or a storage error.
    #[tracing::instrument(skip(self, space), fields(space_number = %space.number))]
    pub async fn create_space(&self, space: Space) -> Result<Space, CampusError> {
        space.validate()?;
        let floor = self
            .floor_repo
            .get_by_id(space.floor_id)
            .await?
            .ok_or_else(|| NotFoundError {
                entity: "Floor",
                id: space.floor_id.to_string(),
            })?;
        if floor.building_id != space.building_id {
            return Err(ValidationError::FloorOutsideBuilding(floor.id.to_string()).into());
        }
        self.space_repo.create(space).await
    }

    /// Look up a space by id, returning an error if not found.
    ///
    /// # Errors
    ///
    /// Returns [`CampusError::NotFound`] when no space with `id` exists,
    /// or a storage error from the repository.
    pub async fn get_space(&self, id: SpaceId) -> Result<Space, CampusError> {
        self.space_repo.get_by_id(id).await?.ok_or_else(|| {
            NotFoundError {
                entity: "Space",
                id: id.to_string(),
            }
            .into()
        })
    }

    /// List spaces, optionally restricted to one building.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn list_spaces(&self, building: Option<BuildingId>) -> Result<Vec<Space>, CampusError> {
        self.space_repo.find(building).await
    }

    /// Give a room-type space an occupant, replacing the previous one.
    ///
    /// # Errors
    ///
    /// Returns [`CampusError::InvalidAssignment`] for a non-room or inactive
    /// space, [`CampusError::NotFound`],
    /// [`CampusError::VersionConflict`], or a storage error.
    #[tracing::instrument(skip(self))]
    pub async fn assign_occupant(
        &self,
        id: SpaceId,
        occupant_id: OccupantId,
    ) -> Result<Space, CampusError> {
        let mut space = self.get_space(id).await?;
        space.assign_occupant(occupant_id)?;
        self.space_repo.update(space).await
    }

    /// Remove the occupant of a space. Releasing a free space is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`CampusError::NotFound`], [`CampusError::VersionConflict`],
    /// or a storage error.
    #[tracing::instrument(skip(self))]
    pub async fn release_occupant(&self, id: SpaceId) -> Result<Space, CampusError> {
        let mut space = self.get_space(id).await?;
        if space.release_occupant().is_none() {
            return Ok(space);
        }
        self.space_repo.update(space).await
    }

    /// Soft-deactivate a free space.
    ///
    /// # Errors
    ///
    /// Returns [`CampusError::InvalidAssignment`] while occupied,
    /// [`CampusError::NotFound`], [`CampusError::VersionConflict`], or a
    /// storage error.
    #[tracing::instrument(skip(self))]
    pub async fn deactivate_space(&self, id: SpaceId) -> Result<Space, CampusError> {
        let mut space = self.get_space(id).await?;
        if !space.is_active() {
            return Ok(space);
        }
        space.deactivate()?;
        self.space_repo.update(space).await
    }

    /// Bring a deactivated space back.
    ///
    /// # Errors
    ///
    /// Returns [`CampusError::NotFound`], [`CampusError::VersionConflict`],
    /// or a storage error.
    #[tracing::instrument(skip(self))]
    pub async fn reactivate_space(&self, id: SpaceId) -> Result<Space, CampusError> {
        let mut space = self.get_space(id).await?;
        if space.is_active() {
            return Ok(space);
        }
        space.reactivate();
        self.space_repo.update(space).await
    }

    /// Recount the defective equipment of a space on demand, publishing
    /// `DefectRecomputed` when the state moved.
    ///
    /// Repairs a count left stale by a dropped recompute.
    ///
    /// # Errors
    ///
    /// Returns [`CampusError::NotFound`] for an unknown space, the last
    /// [`CampusError::VersionConflict`] once retries are exhausted, or a
    /// storage error.
    #[tracing::instrument(skip(self))]
    pub async fn resync_defects(&self, id: SpaceId) -> Result<Space, CampusError> {
        let outcome = self.recomputer.recompute(id).await?;
        if outcome == RecomputeOutcome::SpaceMissing {
            return Err(NotFoundError {
                entity: "Space",
                id: id.to_string(),
            }
            .into());
        }
        if let Some(event) = outcome.into_event(id)
            && let Err(err) = self.publisher.publish(event).await
        {
            tracing::warn!(%err, "failed to publish defect recompute");
        }
        self.get_space(id).await
    }
}
