//! Storage port — repository traits for persistence and read-side queries.
//!
//! `update` implementations must perform an optimistic concurrency check: the
//! write only succeeds when the stored version equals the version carried by
//! the aggregate, and the returned aggregate carries the incremented version.
//! A stale write fails with [`CampusError::VersionConflict`].
//!
//! Every read-side query taking `building: Option<BuildingId>` restricts the
//! result to that building when set. Equipment is located through the space it
//! is assigned to, so unassigned equipment only shows up unfiltered.

use std::future::Future;

use campushub_domain::building::{Building, BuildingType};
use campushub_domain::equipment::{Equipment, EquipmentStatus, EquipmentType};
use campushub_domain::error::CampusError;
use campushub_domain::floor::Floor;
use campushub_domain::id::{BuildingId, EquipmentId, FloorId, SpaceId};
use campushub_domain::space::Space;
use campushub_domain::statistics::{Bucket, DefectiveSpace, SpaceSummary};

/// Criteria for listing equipment. Unset fields do not filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EquipmentFilter {
    pub building_id: Option<BuildingId>,
    pub space_id: Option<SpaceId>,
    pub status: Option<EquipmentStatus>,
}

impl EquipmentFilter {
    #[must_use]
    pub fn in_building(building_id: Option<BuildingId>) -> Self {
        Self {
            building_id,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn in_space(space_id: SpaceId) -> Self {
        Self {
            space_id: Some(space_id),
            ..Self::default()
        }
    }

    /// Whether `equipment`, located in `building`, satisfies the filter.
    #[must_use]
    pub fn matches(&self, equipment: &Equipment, building: Option<BuildingId>) -> bool {
        self.space_id.is_none_or(|id| equipment.space_id() == Some(id))
            && self.status.is_none_or(|s| equipment.status() == s)
            && self.building_id.is_none_or(|id| building == Some(id))
    }
}

/// Repository for the [`Equipment`] aggregate and its read-side histograms.
pub trait EquipmentRepository {
    /// Persist a new equipment.
    fn create(
        &self,
        equipment: Equipment,
    ) -> impl Future<Output = Result<Equipment, CampusError>> + Send;

    /// Get an equipment by its unique identifier.
    fn get_by_id(
        &self,
        id: EquipmentId,
    ) -> impl Future<Output = Result<Option<Equipment>, CampusError>> + Send;

    /// Save an existing equipment with a version check.
    fn update(
        &self,
        equipment: Equipment,
    ) -> impl Future<Output = Result<Equipment, CampusError>> + Send;

    /// Delete an equipment by its unique identifier.
    fn delete(&self, id: EquipmentId) -> impl Future<Output = Result<(), CampusError>> + Send;

    /// List equipment matching `filter`.
    fn find(
        &self,
        filter: EquipmentFilter,
    ) -> impl Future<Output = Result<Vec<Equipment>, CampusError>> + Send;

    /// Number of equipments assigned to `space_id` whose status is in the
    /// defective set.
    fn count_defective_by_space(
        &self,
        space_id: SpaceId,
    ) -> impl Future<Output = Result<u64, CampusError>> + Send;

    /// Histogram of equipment by status. Empty buckets are omitted.
    fn count_by_status(
        &self,
        building: Option<BuildingId>,
    ) -> impl Future<Output = Result<Vec<Bucket<EquipmentStatus>>, CampusError>> + Send;

    /// Histogram of equipment by catalog type. Empty buckets are omitted.
    fn count_by_type(
        &self,
        building: Option<BuildingId>,
    ) -> impl Future<Output = Result<Vec<Bucket<EquipmentType>>, CampusError>> + Send;

    /// Number of equipments currently assigned to a space.
    fn count_assigned(
        &self,
        building: Option<BuildingId>,
    ) -> impl Future<Output = Result<u64, CampusError>> + Send;
}

/// Repository for the [`Space`] aggregate and its read-side summaries.
pub trait SpaceRepository {
    /// Persist a new space.
    fn create(&self, space: Space) -> impl Future<Output = Result<Space, CampusError>> + Send;

    /// Get a space by its unique identifier.
    fn get_by_id(
        &self,
        id: SpaceId,
    ) -> impl Future<Output = Result<Option<Space>, CampusError>> + Send;

    /// Save an existing space with a version check.
    fn update(&self, space: Space) -> impl Future<Output = Result<Space, CampusError>> + Send;

    /// List spaces, optionally restricted to one building.
    fn find(
        &self,
        building: Option<BuildingId>,
    ) -> impl Future<Output = Result<Vec<Space>, CampusError>> + Send;

    /// Aggregated counts (total, active, rooms, occupied, free, defective, by type).
    fn summary(
        &self,
        building: Option<BuildingId>,
    ) -> impl Future<Output = Result<SpaceSummary, CampusError>> + Send;

    /// Defective spaces ordered by descending defective count, then number.
    fn find_most_defective(
        &self,
        limit: usize,
        building: Option<BuildingId>,
    ) -> impl Future<Output = Result<Vec<DefectiveSpace>, CampusError>> + Send;
}

/// Repository for [`Building`]s.
pub trait BuildingRepository {
    /// Persist a new building.
    fn create(
        &self,
        building: Building,
    ) -> impl Future<Output = Result<Building, CampusError>> + Send;

    /// Get a building by its unique identifier.
    fn get_by_id(
        &self,
        id: BuildingId,
    ) -> impl Future<Output = Result<Option<Building>, CampusError>> + Send;

    /// Get all buildings.
    fn get_all(&self) -> impl Future<Output = Result<Vec<Building>, CampusError>> + Send;

    /// Histogram of buildings by type.
    fn count_by_type(
        &self,
    ) -> impl Future<Output = Result<Vec<Bucket<BuildingType>>, CampusError>> + Send;
}

/// Repository for [`Floor`]s.
pub trait FloorRepository {
    /// Persist a new floor.
    fn create(&self, floor: Floor) -> impl Future<Output = Result<Floor, CampusError>> + Send;

    /// Get a floor by its unique identifier.
    fn get_by_id(
        &self,
        id: FloorId,
    ) -> impl Future<Output = Result<Option<Floor>, CampusError>> + Send;

    /// Floors of a building, ordered by number.
    fn find_by_building(
        &self,
        building_id: BuildingId,
    ) -> impl Future<Output = Result<Vec<Floor>, CampusError>> + Send;

    /// Number of active floors, optionally restricted to one building.
    fn count_active(
        &self,
        building: Option<BuildingId>,
    ) -> impl Future<Output = Result<u64, CampusError>> + Send;
}
