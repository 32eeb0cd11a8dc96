//! In-memory repositories and fixtures shared by the unit tests of this crate.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};

use campushub_domain::building::{Building, BuildingType};
use campushub_domain::equipment::{Equipment, EquipmentStatus, EquipmentType};
use campushub_domain::error::{CampusError, VersionConflict};
use campushub_domain::floor::Floor;
use campushub_domain::id::{BuildingId, EquipmentId, FloorId, SpaceId};
use campushub_domain::space::{Space, SpaceType};
use campushub_domain::statistics::{Bucket, DefectiveSpace, SpaceSummary};

use crate::ports::{
    Alert, AlertNotifier, BuildingRepository, EquipmentFilter, EquipmentRepository, FloorRepository,
    SpaceRepository,
};

#[derive(Default)]
struct State {
    buildings: HashMap<BuildingId, Building>,
    floors: HashMap<FloorId, Floor>,
    spaces: HashMap<SpaceId, Space>,
    equipment: HashMap<EquipmentId, Equipment>,
    /// Number of upcoming space updates that fail with a version conflict.
    space_conflicts: u32,
}

impl State {
    fn building_of(&self, equipment: &Equipment) -> Option<BuildingId> {
        equipment
            .space_id()
            .and_then(|id| self.spaces.get(&id))
            .map(|s| s.building_id)
    }

    fn equipment_in(&self, building: Option<BuildingId>) -> Vec<&Equipment> {
        let filter = EquipmentFilter::in_building(building);
        self.equipment
            .values()
            .filter(|e| filter.matches(e, self.building_of(e)))
            .collect()
    }

    fn spaces_in(&self, building: Option<BuildingId>) -> Vec<&Space> {
        self.spaces
            .values()
            .filter(|s| building.is_none_or(|id| s.building_id == id))
            .collect()
    }
}

fn histogram<K: Copy + PartialEq>(all: &[K], keys: impl Iterator<Item = K>) -> Vec<Bucket<K>> {
    let keys: Vec<K> = keys.collect();
    all.iter()
        .map(|k| Bucket::new(*k, keys.iter().filter(|x| *x == k).count() as u64))
        .filter(|b| b.count > 0)
        .collect()
}

/// One store implementing every repository port.
#[derive(Clone, Default)]
pub(crate) struct InMemoryCampus {
    state: Arc<Mutex<State>>,
}

impl InMemoryCampus {
    /// Make the next `n` space updates fail with a version conflict.
    pub(crate) fn fail_next_space_updates(&self, n: u32) {
        self.state.lock().unwrap().space_conflicts = n;
    }

    pub(crate) fn space(&self, id: SpaceId) -> Space {
        self.state.lock().unwrap().spaces[&id].clone()
    }

    /// Overwrite equipment state without touching versions or events.
    pub(crate) fn put_equipment(&self, equipment: Equipment) {
        self.state
            .lock()
            .unwrap()
            .equipment
            .insert(equipment.id, equipment);
    }

    pub(crate) fn remove_space(&self, id: SpaceId) {
        self.state.lock().unwrap().spaces.remove(&id);
    }
}

impl EquipmentRepository for InMemoryCampus {
    fn create(
        &self,
        equipment: Equipment,
    ) -> impl Future<Output = Result<Equipment, CampusError>> + Send {
        self.put_equipment(equipment.clone());
        async { Ok(equipment) }
    }

    fn get_by_id(
        &self,
        id: EquipmentId,
    ) -> impl Future<Output = Result<Option<Equipment>, CampusError>> + Send {
        let result = self.state.lock().unwrap().equipment.get(&id).cloned();
        async { Ok(result) }
    }

    fn update(
        &self,
        mut equipment: Equipment,
    ) -> impl Future<Output = Result<Equipment, CampusError>> + Send {
        let mut state = self.state.lock().unwrap();
        let stored = state.equipment.get(&equipment.id).map(|e| e.version);
        let result = if stored == Some(equipment.version) {
            equipment.version += 1;
            state.equipment.insert(equipment.id, equipment.clone());
            Ok(equipment)
        } else {
            Err(VersionConflict {
                entity: "Equipment",
                id: equipment.id.to_string(),
                expected: equipment.version,
            }
            .into())
        };
        async { result }
    }

    fn delete(&self, id: EquipmentId) -> impl Future<Output = Result<(), CampusError>> + Send {
        self.state.lock().unwrap().equipment.remove(&id);
        async { Ok(()) }
    }

    fn find(
        &self,
        filter: EquipmentFilter,
    ) -> impl Future<Output = Result<Vec<Equipment>, CampusError>> + Send {
        let state = self.state.lock().unwrap();
        let mut result: Vec<Equipment> = state
            .equipment
            .values()
            .filter(|e| filter.matches(e, state.building_of(e)))
            .cloned()
            .collect();
        result.sort_by(|a, b| a.name.cmp(&b.name));
        async { Ok(result) }
    }

    fn count_defective_by_space(
        &self,
        space_id: SpaceId,
    ) -> impl Future<Output = Result<u64, CampusError>> + Send {
        let count = self
            .state
            .lock()
            .unwrap()
            .equipment
            .values()
            .filter(|e| e.space_id() == Some(space_id) && e.is_defective())
            .count() as u64;
        async move { Ok(count) }
    }

    fn count_by_status(
        &self,
        building: Option<BuildingId>,
    ) -> impl Future<Output = Result<Vec<Bucket<EquipmentStatus>>, CampusError>> + Send {
        let state = self.state.lock().unwrap();
        let result = histogram(
            &EquipmentStatus::ALL,
            state.equipment_in(building).into_iter().map(Equipment::status),
        );
        async { Ok(result) }
    }

    fn count_by_type(
        &self,
        building: Option<BuildingId>,
    ) -> impl Future<Output = Result<Vec<Bucket<EquipmentType>>, CampusError>> + Send {
        let state = self.state.lock().unwrap();
        let result = histogram(
            &EquipmentType::ALL,
            state
                .equipment_in(building)
                .into_iter()
                .map(Equipment::equipment_type),
        );
        async { Ok(result) }
    }

    fn count_assigned(
        &self,
        building: Option<BuildingId>,
    ) -> impl Future<Output = Result<u64, CampusError>> + Send {
        let state = self.state.lock().unwrap();
        let count = state
            .equipment_in(building)
            .into_iter()
            .filter(|e| e.space_id().is_some())
            .count() as u64;
        async move { Ok(count) }
    }
}

impl SpaceRepository for InMemoryCampus {
    fn create(&self, space: Space) -> impl Future<Output = Result<Space, CampusError>> + Send {
        self.state
            .lock()
            .unwrap()
            .spaces
            .insert(space.id, space.clone());
        async { Ok(space) }
    }

    fn get_by_id(
        &self,
        id: SpaceId,
    ) -> impl Future<Output = Result<Option<Space>, CampusError>> + Send {
        let result = self.state.lock().unwrap().spaces.get(&id).cloned();
        async { Ok(result) }
    }

    fn update(&self, mut space: Space) -> impl Future<Output = Result<Space, CampusError>> + Send {
        let mut state = self.state.lock().unwrap();
        let stored = state.spaces.get(&space.id).map(|s| s.version);
        let result = if state.space_conflicts > 0 || stored != Some(space.version) {
            state.space_conflicts = state.space_conflicts.saturating_sub(1);
            Err(VersionConflict {
                entity: "Space",
                id: space.id.to_string(),
                expected: space.version,
            }
            .into())
        } else {
            space.version += 1;
            state.spaces.insert(space.id, space.clone());
            Ok(space)
        };
        async { result }
    }

    fn find(
        &self,
        building: Option<BuildingId>,
    ) -> impl Future<Output = Result<Vec<Space>, CampusError>> + Send {
        let state = self.state.lock().unwrap();
        let mut result: Vec<Space> = state.spaces_in(building).into_iter().cloned().collect();
        result.sort_by(|a, b| a.number.cmp(&b.number));
        async { Ok(result) }
    }

    fn summary(
        &self,
        building: Option<BuildingId>,
    ) -> impl Future<Output = Result<SpaceSummary, CampusError>> + Send {
        let state = self.state.lock().unwrap();
        let spaces = state.spaces_in(building);
        let count = |f: &dyn Fn(&Space) -> bool| spaces.iter().filter(|s| f(s)).count() as u64;
        let rooms = count(&Space::is_room);
        let occupied = count(&|s| s.is_room() && s.is_occupied());
        let summary = SpaceSummary {
            total: spaces.len() as u64,
            active: count(&Space::is_active),
            rooms,
            occupied,
            free: rooms - occupied,
            defective: count(&Space::is_defective),
            by_type: histogram(&SpaceType::ALL, spaces.iter().map(|s| s.space_type)),
        };
        async { Ok(summary) }
    }

    fn find_most_defective(
        &self,
        limit: usize,
        building: Option<BuildingId>,
    ) -> impl Future<Output = Result<Vec<DefectiveSpace>, CampusError>> + Send {
        let state = self.state.lock().unwrap();
        let mut spaces: Vec<&Space> = state
            .spaces_in(building)
            .into_iter()
            .filter(|s| s.is_defective())
            .collect();
        spaces.sort_by(|a, b| {
            b.defective_equipment_count()
                .cmp(&a.defective_equipment_count())
                .then_with(|| a.number.cmp(&b.number))
        });
        let result: Vec<DefectiveSpace> = spaces
            .into_iter()
            .take(limit)
            .map(|s| DefectiveSpace {
                space_id: s.id,
                space_number: s.number.clone(),
                building_id: s.building_id,
                defective_count: s.defective_equipment_count(),
                max_risk_score: None,
            })
            .collect();
        async { Ok(result) }
    }
}

impl BuildingRepository for InMemoryCampus {
    fn create(
        &self,
        building: Building,
    ) -> impl Future<Output = Result<Building, CampusError>> + Send {
        self.state
            .lock()
            .unwrap()
            .buildings
            .insert(building.id, building.clone());
        async { Ok(building) }
    }

    fn get_by_id(
        &self,
        id: BuildingId,
    ) -> impl Future<Output = Result<Option<Building>, CampusError>> + Send {
        let result = self.state.lock().unwrap().buildings.get(&id).cloned();
        async { Ok(result) }
    }

    fn get_all(&self) -> impl Future<Output = Result<Vec<Building>, CampusError>> + Send {
        let mut result: Vec<Building> = self
            .state
            .lock()
            .unwrap()
            .buildings
            .values()
            .cloned()
            .collect();
        result.sort_by(|a, b| a.code.cmp(&b.code));
        async { Ok(result) }
    }

    fn count_by_type(
        &self,
    ) -> impl Future<Output = Result<Vec<Bucket<BuildingType>>, CampusError>> + Send {
        let state = self.state.lock().unwrap();
        let result = histogram(
            &BuildingType::ALL,
            state.buildings.values().map(|b| b.building_type),
        );
        async { Ok(result) }
    }
}

impl FloorRepository for InMemoryCampus {
    fn create(&self, floor: Floor) -> impl Future<Output = Result<Floor, CampusError>> + Send {
        self.state
            .lock()
            .unwrap()
            .floors
            .insert(floor.id, floor.clone());
        async { Ok(floor) }
    }

    fn get_by_id(
        &self,
        id: FloorId,
    ) -> impl Future<Output = Result<Option<Floor>, CampusError>> + Send {
        let result = self.state.lock().unwrap().floors.get(&id).cloned();
        async { Ok(result) }
    }

    fn find_by_building(
        &self,
        building_id: BuildingId,
    ) -> impl Future<Output = Result<Vec<Floor>, CampusError>> + Send {
        let mut result: Vec<Floor> = self
            .state
            .lock()
            .unwrap()
            .floors
            .values()
            .filter(|f| f.building_id == building_id)
            .cloned()
            .collect();
        result.sort_by_key(|f| f.number);
        async { Ok(result) }
    }

    fn count_active(
        &self,
        building: Option<BuildingId>,
    ) -> impl Future<Output = Result<u64, CampusError>> + Send {
        let count = self
            .state
            .lock()
            .unwrap()
            .floors
            .values()
            .filter(|f| f.active && building.is_none_or(|id| f.building_id == id))
            .count() as u64;
        async move { Ok(count) }
    }
}

/// Notifier keeping every alert it receives.
#[derive(Clone, Default)]
pub(crate) struct RecordingNotifier {
    alerts: Arc<Mutex<Vec<Alert>>>,
}

impl RecordingNotifier {
    pub(crate) fn alerts(&self) -> Vec<Alert> {
        self.alerts.lock().unwrap().clone()
    }
}

impl AlertNotifier for RecordingNotifier {
    fn notify(&self, alert: Alert) -> impl Future<Output = Result<(), CampusError>> + Send {
        self.alerts.lock().unwrap().push(alert);
        async { Ok(()) }
    }
}

/// A building with one floor, in the store.
pub(crate) async fn seed_building(campus: &InMemoryCampus, code: &str) -> (BuildingId, FloorId) {
    let building = Building::builder()
        .code(code)
        .name(format!("Residence {code}"))
        .building_type(BuildingType::Residential)
        .build()
        .unwrap();
    let floor = Floor::new(building.id, 0);
    let ids = (building.id, floor.id);
    BuildingRepository::create(campus, building).await.unwrap();
    FloorRepository::create(campus, floor).await.unwrap();
    ids
}

/// A space of the given type in the store.
pub(crate) async fn seed_space(
    campus: &InMemoryCampus,
    location: (BuildingId, FloorId),
    number: &str,
    space_type: SpaceType,
) -> SpaceId {
    let space = Space::builder()
        .location(location.0, location.1)
        .number(number)
        .space_type(space_type)
        .build()
        .unwrap();
    let id = space.id;
    SpaceRepository::create(campus, space).await.unwrap();
    id
}

/// An equipment with the given status, assigned to `space_id`, stored
/// without recording events.
pub(crate) fn stored_equipment(
    campus: &InMemoryCampus,
    space_id: Option<SpaceId>,
    status: EquipmentStatus,
) -> Equipment {
    let equipment = Equipment::builder()
        .equipment_type(EquipmentType::Heater)
        .name("Heater")
        .status(status)
        .space_id(space_id)
        .build()
        .unwrap();
    campus.put_equipment(equipment.clone());
    equipment
}
