//! `SQLite` implementation of [`FloorRepository`].

use std::future::Future;

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use campushub_app::ports::FloorRepository;
use campushub_domain::error::CampusError;
use campushub_domain::floor::Floor;
use campushub_domain::id::{BuildingId, FloorId};

use crate::codec::{parse, to_i64, to_u64};
use crate::error::StorageError;

struct Wrapper(Floor);

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let id: String = row.try_get("id")?;
        let building_id: String = row.try_get("building_id")?;
        let version: i64 = row.try_get("version")?;

        Ok(Self(Floor {
            id: parse(&id)?,
            building_id: parse(&building_id)?,
            number: row.try_get("number")?,
            label: row.try_get("label")?,
            active: row.try_get("active")?,
            version: to_u64(version)?,
        }))
    }
}

const INSERT: &str =
    "INSERT INTO floors (id, building_id, number, label, active, version) VALUES (?, ?, ?, ?, ?, ?)";
const SELECT_BY_ID: &str = "SELECT * FROM floors WHERE id = ?";
const SELECT_BY_BUILDING: &str = "SELECT * FROM floors WHERE building_id = ? ORDER BY number";
const COUNT_ACTIVE: &str =
    "SELECT COUNT(*) FROM floors WHERE active = 1 AND (? IS NULL OR building_id = ?)";

/// `SQLite`-backed floor repository.
#[derive(Clone)]
pub struct SqliteFloorRepository {
    pool: SqlitePool,
}

impl SqliteFloorRepository {
    /// Create a new repository using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl FloorRepository for SqliteFloorRepository {
    fn create(&self, floor: Floor) -> impl Future<Output = Result<Floor, CampusError>> + Send {
        let pool = self.pool.clone();
        async move {
            sqlx::query(INSERT)
                .bind(floor.id.to_string())
                .bind(floor.building_id.to_string())
                .bind(floor.number)
                .bind(&floor.label)
                .bind(floor.active)
                .bind(to_i64(floor.version))
                .execute(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(floor)
        }
    }

    fn get_by_id(
        &self,
        id: FloorId,
    ) -> impl Future<Output = Result<Option<Floor>, CampusError>> + Send {
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

    fn find_by_building(
        &self,
        building_id: BuildingId,
    ) -> impl Future<Output = Result<Vec<Floor>, CampusError>> + Send {
        let pool = self.pool.clone();
        async move {
            let rows: Vec<Wrapper> = sqlx::query_as(SELECT_BY_BUILDING)
                .bind(building_id.to_string())
                .fetch_all(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(rows.into_iter().map(|w| w.0).collect())
        }
    }

    fn count_active(
        &self,
        building: Option<BuildingId>,
    ) -> impl Future<Output = Result<u64, CampusError>> + Send {
        let pool = self.pool.clone();
        async move {
            let building = building.map(|id| id.to_string());
            let count: i64 = sqlx::query_scalar(COUNT_ACTIVE)
                .bind(&building)
                .bind(&building)
                .fetch_one(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(to_u64(count).map_err(StorageError::from)?)
        }
    }
}
