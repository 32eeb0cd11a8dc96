//! Statistics engine — read-only snapshots built from repository aggregates.
//!
//! Nothing here writes, so every public operation runs under a deadline and
//! can be abandoned midway without leaving partial state behind.

use std::future::Future;
use std::time::Duration;

use campushub_domain::building::Building;
use campushub_domain::equipment::EquipmentStatus;
use campushub_domain::error::{CampusError, NotFoundError, TimeoutError};
use campushub_domain::id::BuildingId;
use campushub_domain::statistics::{
    Bucket, BuildingCounts, BuildingStats, DefectiveSpace, EquipmentSummary, GlobalStats, Rates,
    RiskAssessment, SpaceSummary,
};
use campushub_domain::time::now;

use crate::ports::{
    BuildingRepository, EquipmentFilter, EquipmentRepository, FloorRepository, SpaceRepository,
};

/// Tunables of the statistics engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatisticsOptions {
    /// Size of the "most defective spaces" list when the caller gives none.
    pub top_defective_limit: usize,
    /// Deadline applied to every snapshot or query.
    pub timeout: Duration,
}

impl Default for StatisticsOptions {
    fn default() -> Self {
        Self {
            top_defective_limit: 10,
            timeout: Duration::from_secs(5),
        }
    }
}

/// Builds global and per-building snapshots and risk views.
pub struct StatisticsService<BR, FR, SR, ER> {
    building_repo: BR,
    floor_repo: FR,
    space_repo: SR,
    equipment_repo: ER,
    options: StatisticsOptions,
}

impl<BR, FR, SR, ER> StatisticsService<BR, FR, SR, ER>
where
    BR: BuildingRepository,
    FR: FloorRepository,
    SR: SpaceRepository,
    ER: EquipmentRepository,
{
    pub fn new(
        building_repo: BR,
        floor_repo: FR,
        space_repo: SR,
        equipment_repo: ER,
        options: StatisticsOptions,
    ) -> Self {
        Self {
            building_repo,
            floor_repo,
            space_repo,
            equipment_repo,
            options,
        }
    }

    /// Campus-wide snapshot, or the snapshot of one building when `building`
    /// is set.
    ///
    /// # Errors
    ///
    /// Returns [`CampusError::NotFound`] for an unknown building filter,
    /// [`CampusError::Timeout`] past the deadline, or a storage error.
    #[tracing::instrument(skip(self))]
    pub async fn build_global_snapshot(
        &self,
        building: Option<BuildingId>,
    ) -> Result<GlobalStats, CampusError> {
        self.with_deadline("global snapshot", async {
            let buildings = match building {
                Some(id) => {
                    let found = self.require_building(id).await?;
                    BuildingCounts {
                        total: 1,
                        by_type: vec![Bucket::new(found.building_type, 1)],
                    }
                }
                None => {
                    let by_type = self.building_repo.count_by_type().await?;
                    BuildingCounts {
                        total: by_type.iter().map(|b| b.count).sum(),
                        by_type,
                    }
                }
            };
            let active_floors = self.floor_repo.count_active(building).await?;
            let (spaces, equipment) = self.summaries(building).await?;
            let most_defective_spaces = self
                .defective_spaces(self.options.top_defective_limit, building)
                .await?;

            Ok(GlobalStats {
                generated_at: now(),
                building_filter: building,
                buildings,
                active_floors,
                rates: Rates::compute(&spaces, &equipment),
                spaces,
                equipment,
                most_defective_spaces,
            })
        })
        .await
    }

    /// Snapshot of a single building.
    ///
    /// # Errors
    ///
    /// Returns [`CampusError::NotFound`] for an unknown building,
    /// [`CampusError::Timeout`] past the deadline, or a storage error.
    #[tracing::instrument(skip(self))]
    pub async fn build_building_snapshot(
        &self,
        building_id: BuildingId,
    ) -> Result<BuildingStats, CampusError> {
        self.with_deadline("building snapshot", async {
            let building = self.require_building(building_id).await?;
            let active_floors = self.floor_repo.count_active(Some(building_id)).await?;
            let (spaces, equipment) = self.summaries(Some(building_id)).await?;
            let most_defective_spaces = self
                .defective_spaces(self.options.top_defective_limit, Some(building_id))
                .await?;

            Ok(BuildingStats {
                generated_at: now(),
                building_id,
                code: building.code,
                name: building.name,
                building_type: building.building_type,
                active_floors,
                rates: Rates::compute(&spaces, &equipment),
                spaces,
                equipment,
                most_defective_spaces,
            })
        })
        .await
    }

    /// The `limit` spaces with the most defective equipment (configured
    /// default when `None`), with the highest equipment risk score of each.
    ///
    /// # Errors
    ///
    /// Returns [`CampusError::Timeout`] past the deadline, or a storage error.
    #[tracing::instrument(skip(self))]
    pub async fn top_defective_spaces(
        &self,
        limit: Option<usize>,
        building: Option<BuildingId>,
    ) -> Result<Vec<DefectiveSpace>, CampusError> {
        let limit = limit.unwrap_or(self.options.top_defective_limit);
        self.with_deadline("top defective spaces", self.defective_spaces(limit, building))
            .await
    }

    /// In-service equipment ranked by descending risk score.
    ///
    /// # Errors
    ///
    /// Returns [`CampusError::Timeout`] past the deadline, or a storage error.
    #[tracing::instrument(skip(self))]
    pub async fn predict_maintenance(
        &self,
        building: Option<BuildingId>,
        limit: usize,
    ) -> Result<Vec<RiskAssessment>, CampusError> {
        self.with_deadline("maintenance prediction", async {
            let at = now();
            let equipment = self
                .equipment_repo
                .find(EquipmentFilter::in_building(building))
                .await?;
            let mut ranked: Vec<RiskAssessment> = equipment
                .iter()
                .filter(|e| e.status() != EquipmentStatus::OutOfService)
                .map(|e| RiskAssessment::of(e, at))
                .collect();
            ranked.sort_by(|a, b| {
                b.score
                    .total_cmp(&a.score)
                    .then_with(|| b.failure_history_count.cmp(&a.failure_history_count))
                    .then_with(|| a.equipment_id.cmp(&b.equipment_id))
            });
            ranked.truncate(limit);
            Ok(ranked)
        })
        .await
    }

    async fn with_deadline<T>(
        &self,
        operation: &'static str,
        work: impl Future<Output = Result<T, CampusError>>,
    ) -> Result<T, CampusError> {
        match tokio::time::timeout(self.options.timeout, work).await {
            Ok(result) => result,
            Err(_) => {
                let millis = u64::try_from(self.options.timeout.as_millis()).unwrap_or(u64::MAX);
                tracing::warn!(operation, millis, "statistics computation timed out");
                Err(TimeoutError { operation, millis }.into())
            }
        }
    }

    async fn require_building(&self, id: BuildingId) -> Result<Building, CampusError> {
        self.building_repo.get_by_id(id).await?.ok_or_else(|| {
            NotFoundError {
                entity: "Building",
                id: id.to_string(),
            }
            .into()
        })
    }

    async fn summaries(
        &self,
        building: Option<BuildingId>,
    ) -> Result<(SpaceSummary, EquipmentSummary), CampusError> {
        let spaces = self.space_repo.summary(building).await?;
        let by_status = self.equipment_repo.count_by_status(building).await?;
        let by_type = self.equipment_repo.count_by_type(building).await?;
        let assigned = self.equipment_repo.count_assigned(building).await?;
        Ok((
            spaces,
            EquipmentSummary::from_histograms(by_status, by_type, assigned),
        ))
    }

    async fn defective_spaces(
        &self,
        limit: usize,
        building: Option<BuildingId>,
    ) -> Result<Vec<DefectiveSpace>, CampusError> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let mut spaces = self.space_repo.find_most_defective(limit, building).await?;
        let at = now();
        for space in &mut spaces {
            let equipment = self
                .equipment_repo
                .find(EquipmentFilter::in_space(space.space_id))
                .await?;
            space.max_risk_score = equipment
                .iter()
                .map(|e| RiskAssessment::of(e, at).score)
                .reduce(f64::max);
        }
        Ok(spaces)
    }
}
