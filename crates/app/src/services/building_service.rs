//! Building service — use-cases for buildings and their floors.

use campushub_domain::building::Building;
use campushub_domain::error::{CampusError, NotFoundError};
use campushub_domain::floor::Floor;
use campushub_domain::id::{BuildingId, FloorId};

use crate::ports::{BuildingRepository, FloorRepository};

/// Application service for the building/floor hierarchy.
pub struct BuildingService<BR, FR> {
    building_repo: BR,
    floor_repo: FR,
}

impl<BR: BuildingRepository, FR: FloorRepository> BuildingService<BR, FR> {
    /// Create a new service backed by the given repositories.
    pub fn new(building_repo: BR, floor_repo: FR) -> Self {
        Self {
            building_repo,
            floor_repo,
        }
    }

    /// Create a new building after validating domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`CampusError::Validation`] if invariants fail, or a
    /// storage error propagated from the repository.
    #[tracing::instrument(skip(self, building), fields(code = %building.code))]
    pub async fn create_building(&self, building: Building) -> Result<Building, CampusError> {
        building.validate()?;
        self.building_repo.create(building).await
    }

    /// Look up a building by id, returning an error if not found.
    ///
    /// # Errors
    ///
    /// Returns [`CampusError::NotFound`] when no building with `id` exists,
    /// or a storage error from the repository.
    pub async fn get_building(&self, id: BuildingId) -> Result<Building, CampusError> {
        self.building_repo.get_by_id(id).await?.ok_or_else(|| {
            NotFoundError {
                entity: "Building",
                id: id.to_string(),
            }
            .into()
        })
    }

    /// List all buildings.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn list_buildings(&self) -> Result<Vec<Building>, CampusError> {
        self.building_repo.get_all().await
    }

    /// Add a floor to an existing building.
    ///
    /// # Errors
    ///
    /// Returns [`CampusError::NotFound`] when the building does not exist,
    /// or a storage error.
    #[tracing::instrument(skip(self, floor), fields(building_id = %floor.building_id, number = floor.number))]
    pub async fn add_floor(&self, floor: Floor) -> Result<Floor, CampusError> {
        self.get_building(floor.building_id).await?;
        self.floor_repo.create(floor).await
    }

    /// Look up a floor by id, returning an error if not found.
    ///
    /// # Errors
    ///
    /// Returns [`CampusError::NotFound`] when no floor with `id` exists,
    /// or a storage error from the repository.
    pub async fn get_floor(&self, id: FloorId) -> Result<Floor, CampusError> {
        self.floor_repo.get_by_id(id).await?.ok_or_else(|| {
            NotFoundError {
                entity: "Floor",
                id: id.to_string(),
            }
            .into()
        })
    }

    /// Floors of a building, ordered by number.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn list_floors(&self, building_id: BuildingId) -> Result<Vec<Floor>, CampusError> {
        self.floor_repo.find_by_building(building_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::InMemoryCampus;
    use campushub_domain::building::BuildingType;
    use campushub_domain::error::ValidationError;

    fn make_service() -> BuildingService<InMemoryCampus, InMemoryCampus> {
        let campus = InMemoryCampus::default();
        BuildingService::new(campus.clone(), campus)
    }

    fn building(code: &str) -> Building {
        Building::builder()
            .code(code)
            .name("Résidence Jean Mermoz")
            .building_type(BuildingType::Residential)
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn should_create_building_when_valid() {
        let svc = make_service();
        let created = svc.create_building(building("RJM")).await.unwrap();

        let fetched = svc.get_building(created.id).await.unwrap();
        assert_eq!(fetched.code, "RJM");
        assert_eq!(svc.list_buildings().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn should_reject_building_when_code_is_empty() {
        let svc = make_service();
        let mut invalid = building("X");
        invalid.code = String::new();

        let result = svc.create_building(invalid).await;
        assert!(matches!(
            result,
            Err(CampusError::Validation(ValidationError::EmptyCode))
        ));
    }

    #[tokio::test]
    async fn should_list_floors_in_order() {
        let svc = make_service();
        let b = svc.create_building(building("B")).await.unwrap();
        svc.add_floor(Floor::new(b.id, 2)).await.unwrap();
        svc.add_floor(Floor::new(b.id, -1)).await.unwrap();
        svc.add_floor(Floor::new(b.id, 0)).await.unwrap();

        let numbers: Vec<i32> = svc
            .list_floors(b.id)
            .await
            .unwrap()
            .iter()
            .map(|f| f.number)
            .collect();
        assert_eq!(numbers, vec![-1, 0, 2]);
    }

    #[tokio::test]
    async fn should_refuse_floor_for_unknown_building() {
        let svc = make_service();
        let result = svc.add_floor(Floor::new(BuildingId::new(), 0)).await;
        assert!(matches!(result, Err(CampusError::NotFound(_))));
    }
}
