//! `SQLite` implementation of [`SpaceRepository`].
//!
//! The defect count and flag live in two columns written together from the
//! domain's `DefectState`. A `CHECK` constraint in the schema rejects any row
//! where they disagree.

use std::future::Future;

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use campushub_app::ports::SpaceRepository;
use campushub_domain::error::CampusError;
use campushub_domain::id::{BuildingId, SpaceId};
use campushub_domain::space::{Space, SpaceType};
use campushub_domain::statistics::{DefectiveSpace, SpaceSummary};

use crate::codec::{decode_err, histogram, parse, parse_opt, parse_timestamp, to_i64, to_u32, to_u64};
use crate::error::{StorageError, rejected_update};

struct Wrapper(Space);

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let id: String = row.try_get("id")?;
        let building_id: String = row.try_get("building_id")?;
        let floor_id: String = row.try_get("floor_id")?;
        let number: String = row.try_get("number")?;
        let name: Option<String> = row.try_get("name")?;
        let space_type: String = row.try_get("space_type")?;
        let occupant_id: Option<String> = row.try_get("occupant_id")?;
        let defective_count: i64 = row.try_get("defective_equipment_count")?;
        let active: bool = row.try_get("active")?;
        let created_at: String = row.try_get("created_at")?;
        let version: i64 = row.try_get("version")?;

        let mut builder = Space::builder()
            .id(parse(&id)?)
            .location(parse(&building_id)?, parse(&floor_id)?)
            .number(number)
            .space_type(parse(&space_type)?)
            .occupant_id(parse_opt(occupant_id)?)
            .defective_count(to_u32(defective_count)?)
            .active(active)
            .created_at(parse_timestamp(&created_at)?)
            .version(to_u64(version)?);
        if let Some(name) = name {
            builder = builder.name(name);
        }
        builder.build().map(Self).map_err(decode_err)
    }
}

const INSERT: &str = r"
    INSERT INTO spaces (
        id, building_id, floor_id, number, name, space_type, occupant_id,
        defective_equipment_count, is_defective, active, created_at, version
    ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
";
const SELECT_BY_ID: &str = "SELECT * FROM spaces WHERE id = ?";
const SELECT_FILTERED: &str =
    "SELECT * FROM spaces WHERE (? IS NULL OR building_id = ?) ORDER BY number";
const UPDATE: &str = r"
    UPDATE spaces SET
        floor_id = ?, number = ?, name = ?, space_type = ?, occupant_id = ?,
        defective_equipment_count = ?, is_defective = ?, active = ?,
        version = version + 1
    WHERE id = ? AND version = ?
";
const SELECT_VERSION: &str = "SELECT version FROM spaces WHERE id = ?";
const COUNT_BY_TYPE: &str = r"
    SELECT space_type, COUNT(*) FROM spaces
    WHERE (? IS NULL OR building_id = ?)
    GROUP BY space_type
";
const COUNT_FLAGS: &str = r"
    SELECT
        COALESCE(SUM(active), 0),
        COALESCE(SUM(occupant_id IS NOT NULL), 0),
        COALESCE(SUM(is_defective), 0)
    FROM spaces
    WHERE (? IS NULL OR building_id = ?)
";
const SELECT_MOST_DEFECTIVE: &str = r"
    SELECT id, number, building_id, defective_equipment_count FROM spaces
    WHERE is_defective = 1 AND (? IS NULL OR building_id = ?)
    ORDER BY defective_equipment_count DESC, number ASC
    LIMIT ?
";

/// `SQLite`-backed space repository.
#[derive(Clone)]
pub struct SqliteSpaceRepository {
    pool: SqlitePool,
}

impl SqliteSpaceRepository {
    /// Create a new repository using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl SpaceRepository for SqliteSpaceRepository {
    fn create(&self, space: Space) -> impl Future<Output = Result<Space, CampusError>> + Send {
        let pool = self.pool.clone();
        async move {
            sqlx::query(INSERT)
                .bind(space.id.to_string())
                .bind(space.building_id.to_string())
                .bind(space.floor_id.to_string())
                .bind(&space.number)
                .bind(&space.name)
                .bind(space.space_type.as_str())
                .bind(space.occupant_id().map(|id| id.to_string()))
                .bind(space.defective_equipment_count())
                .bind(space.is_defective())
                .bind(space.is_active())
                .bind(space.created_at.to_rfc3339())
                .bind(to_i64(space.version))
                .execute(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(space)
        }
    }

    fn get_by_id(
        &self,
        id: SpaceId,
    ) -> impl Future<Output = Result<Option<Space>, CampusError>> + Send {
        let pool = self.pool.clone();
        async move {
            let row: Option<Wrapper> = sqlx::query_as(SELECT_BY_ID)
                .bind(id.to_string())
                .fetch_optional(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(row.map(|w| w.0))
        }
    }

    fn update(&self, mut space: Space) -> impl Future<Output = Result<Space, CampusError>> + Send {
        let pool = self.pool.clone();
        async move {
            let result = sqlx::query(UPDATE)
                .bind(space.floor_id.to_string())
                .bind(&space.number)
                .bind(&space.name)
                .bind(space.space_type.as_str())
                .bind(space.occupant_id().map(|id| id.to_string()))
                .bind(space.defective_equipment_count())
                .bind(space.is_defective())
                .bind(space.is_active())
                .bind(space.id.to_string())
                .bind(to_i64(space.version))
                .execute(&pool)
                .await
                .map_err(StorageError::from)?;

            if result.rows_affected() == 0 {
                let exists: Option<i64> = sqlx::query_scalar(SELECT_VERSION)
                    .bind(space.id.to_string())
                    .fetch_optional(&pool)
                    .await
                    .map_err(StorageError::from)?;
                return Err(rejected_update(
                    "Space",
                    space.id.to_string(),
                    space.version,
                    exists,
                ));
            }

            space.version += 1;
            Ok(space)
        }
    }

    fn find(
        &self,
        building: Option<BuildingId>,
    ) -> impl Future<Output = Result<Vec<Space>, CampusError>> + Send {
        let pool = self.pool.clone();
        async move {
            let building = building.map(|id| id.to_string());
            let rows: Vec<Wrapper> = sqlx::query_as(SELECT_FILTERED)
                .bind(&building)
                .bind(&building)
                .fetch_all(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(rows.into_iter().map(|w| w.0).collect())
        }
    }

    fn summary(
        &self,
        building: Option<BuildingId>,
    ) -> impl Future<Output = Result<SpaceSummary, CampusError>> + Send {
        let pool = self.pool.clone();
        async move {
            let building = building.map(|id| id.to_string());
            let type_rows: Vec<(String, i64)> = sqlx::query_as(COUNT_BY_TYPE)
                .bind(&building)
                .bind(&building)
                .fetch_all(&pool)
                .await
                .map_err(StorageError::from)?;
            let (active, occupied, defective): (i64, i64, i64) = sqlx::query_as(COUNT_FLAGS)
                .bind(&building)
                .bind(&building)
                .fetch_one(&pool)
                .await
                .map_err(StorageError::from)?;

            let by_type = histogram(&SpaceType::ALL, type_rows).map_err(StorageError::from)?;
            let total = by_type.iter().map(|b| b.count).sum();
            let rooms = by_type
                .iter()
                .filter(|b| b.key.is_room())
                .map(|b| b.count)
                .sum();
            let occupied = to_u64(occupied).map_err(StorageError::from)?;

            Ok(SpaceSummary {
                total,
                active: to_u64(active).map_err(StorageError::from)?,
                rooms,
                occupied,
                free: rooms.saturating_sub(occupied),
                defective: to_u64(defective).map_err(StorageError::from)?,
                by_type,
            })
        }
    }

    fn find_most_defective(
        &self,
        limit: usize,
        building: Option<BuildingId>,
    ) -> impl Future<Output = Result<Vec<DefectiveSpace>, CampusError>> + Send {
        let pool = self.pool.clone();
        async move {
            let building = building.map(|id| id.to_string());
            let rows: Vec<(String, String, String, i64)> = sqlx::query_as(SELECT_MOST_DEFECTIVE)
                .bind(&building)
                .bind(&building)
                .bind(i64::try_from(limit).unwrap_or(i64::MAX))
                .fetch_all(&pool)
                .await
                .map_err(StorageError::from)?;

            let spaces = rows
                .into_iter()
                .map(|(id, number, building_id, count)| {
                    Ok(DefectiveSpace {
                        space_id: parse(&id)?,
                        space_number: number,
                        building_id: parse(&building_id)?,
                        defective_count: to_u32(count)?,
                        max_risk_score: None,
                    })
                })
                .collect::<Result<Vec<_>, sqlx::Error>>()
                .map_err(StorageError::from)?;

            Ok(spaces)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::building_repo::SqliteBuildingRepository;
    use crate::floor_repo::SqliteFloorRepository;
    use crate::pool::Config;
    use campushub_app::ports::{BuildingRepository, FloorRepository};
    use campushub_domain::building::Building;
    use campushub_domain::floor::Floor;
    use campushub_domain::id::{FloorId, OccupantId};

    async fn setup() -> (SqliteSpaceRepository, BuildingId, FloorId, SqlitePool) {
        let db = Config {
            database_url: "sqlite::memory:".to_string(),
        }
        .build()
        .await
        .unwrap();
        let pool = db.pool().clone();
        let (building_id, floor_id) = seed_building(&pool, "B").await;
        (SqliteSpaceRepository::new(pool.clone()), building_id, floor_id, pool)
    }

    async fn seed_building(pool: &SqlitePool, code: &str) -> (BuildingId, FloorId) {
        let building = Building::builder().code(code).name(code).build().unwrap();
        let floor = Floor::new(building.id, 0);
        let ids = (building.id, floor.id);
        SqliteBuildingRepository::new(pool.clone())
            .create(building)
            .await
            .unwrap();
        SqliteFloorRepository::new(pool.clone())
            .create(floor)
            .await
            .unwrap();
        ids
    }

    fn space(building_id: BuildingId, floor_id: FloorId, number: &str, kind: SpaceType) -> Space {
        Space::builder()
            .location(building_id, floor_id)
            .number(number)
            .space_type(kind)
            .build()
            .unwrap()
    }

    async fn with_defects(repo: &SqliteSpaceRepository, mut space: Space, count: i64) -> SpaceId {
        space.recompute_defects(count);
        let id = space.id;
        repo.create(space).await.unwrap();
        id
    }

    #[tokio::test]
    async fn should_create_and_retrieve_space() {
        let (repo, b, f, _) = setup().await;
        let mut room = space(b, f, "A-101", SpaceType::Room);
        room.name = Some("Corner room".to_string());
        let id = room.id;

        repo.create(room).await.unwrap();

        let fetched = repo.get_by_id(id).await.unwrap().unwrap();
        assert_eq!(fetched.number, "A-101");
        assert_eq!(fetched.name.as_deref(), Some("Corner room"));
        assert_eq!(fetched.space_type, SpaceType::Room);
        assert!(fetched.is_active());
        assert_eq!(fetched.version, 0);
    }

    #[tokio::test]
    async fn should_bump_version_on_update() {
        let (repo, b, f, _) = setup().await;
        let room = space(b, f, "A-101", SpaceType::Room);
        let id = room.id;
        repo.create(room).await.unwrap();

        let mut loaded = repo.get_by_id(id).await.unwrap().unwrap();
        loaded.assign_occupant(OccupantId::new()).unwrap();
        loaded.recompute_defects(3);
        let saved = repo.update(loaded).await.unwrap();

        assert_eq!(saved.version, 1);
        let fetched = repo.get_by_id(id).await.unwrap().unwrap();
        assert_eq!(fetched.version, 1);
        assert!(fetched.is_occupied());
        assert_eq!(fetched.defective_equipment_count(), 3);
        assert!(fetched.is_defective());
    }

    #[tokio::test]
    async fn should_reject_stale_update_with_version_conflict() {
        let (repo, b, f, _) = setup().await;
        let room = space(b, f, "A-101", SpaceType::Room);
        let id = room.id;
        repo.create(room).await.unwrap();

        let mut first = repo.get_by_id(id).await.unwrap().unwrap();
        let mut second = first.clone();
        first.recompute_defects(1);
        repo.update(first).await.unwrap();
        second.assign_occupant(OccupantId::new()).unwrap();

        let result = repo.update(second).await;
        assert!(matches!(result, Err(CampusError::VersionConflict(_))));
        let stored = repo.get_by_id(id).await.unwrap().unwrap();
        assert!(!stored.is_occupied());
        assert_eq!(stored.defective_equipment_count(), 1);
    }

    #[tokio::test]
    async fn should_report_not_found_when_updating_missing_space() {
        let (repo, b, f, _) = setup().await;
        let result = repo.update(space(b, f, "Z", SpaceType::Office)).await;
        assert!(matches!(result, Err(CampusError::NotFound(_))));
    }

    #[tokio::test]
    async fn should_summarize_spaces_per_building() {
        let (repo, b, f, pool) = setup().await;
        let (other_b, other_f) = seed_building(&pool, "C").await;
        let mut occupied = space(b, f, "A-101", SpaceType::Room);
        occupied.assign_occupant(OccupantId::new()).unwrap();
        repo.create(occupied).await.unwrap();
        repo.create(space(b, f, "A-102", SpaceType::Studio))
            .await
            .unwrap();
        with_defects(&repo, space(b, f, "LAB", SpaceType::Laboratory), 2).await;
        let mut closed = space(b, f, "STO", SpaceType::Storage);
        closed.deactivate().unwrap();
        repo.create(closed).await.unwrap();
        repo.create(space(other_b, other_f, "C-1", SpaceType::Room))
            .await
            .unwrap();

        let summary = repo.summary(Some(b)).await.unwrap();
        assert_eq!(summary.total, 4);
        assert_eq!(summary.active, 3);
        assert_eq!(summary.rooms, 2);
        assert_eq!(summary.occupied, 1);
        assert_eq!(summary.free, 1);
        assert_eq!(summary.defective, 1);
        assert_eq!(summary.by_type.len(), 4);

        let all = repo.summary(None).await.unwrap();
        assert_eq!(all.total, 5);
        assert_eq!(all.rooms, 3);
    }

    #[tokio::test]
    async fn should_return_most_defective_space_when_limited_to_one() {
        let (repo, b, f, pool) = setup().await;
        let (other_b, other_f) = seed_building(&pool, "C").await;
        with_defects(&repo, space(b, f, "S1", SpaceType::Room), 2).await;
        let s2 = with_defects(&repo, space(b, f, "S2", SpaceType::Room), 5).await;
        with_defects(&repo, space(other_b, other_f, "S3", SpaceType::Room), 9).await;
        repo.create(space(b, f, "S4", SpaceType::Room))
            .await
            .unwrap();

        let top = repo.find_most_defective(1, Some(b)).await.unwrap();
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].space_id, s2);
        assert_eq!(top[0].defective_count, 5);

        let all = repo.find_most_defective(10, None).await.unwrap();
        let counts: Vec<u32> = all.iter().map(|s| s.defective_count).collect();
        assert_eq!(counts, vec![9, 5, 2]);
    }
}
