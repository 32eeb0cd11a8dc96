//! `SQLite` implementation of [`BuildingRepository`].

use std::future::Future;

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use campushub_app::ports::BuildingRepository;
use campushub_domain::building::{Building, BuildingType};
use campushub_domain::error::CampusError;
use campushub_domain::id::BuildingId;
use campushub_domain::location::{Address, Coordinates};
use campushub_domain::statistics::Bucket;

use crate::codec::{decode_err, histogram, parse, parse_timestamp, to_i64, to_u64};
use crate::error::StorageError;

/// Wrapper for converting database rows into domain [`Building`].
struct Wrapper(Building);

impl Wrapper {
    fn maybe(value: Option<Self>) -> Option<Building> {
        value.map(|w| w.0)
    }
}

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let id: String = row.try_get("id")?;
        let building_type: String = row.try_get("building_type")?;
        let address: Option<String> = row.try_get("address")?;
        let latitude: Option<f64> = row.try_get("latitude")?;
        let longitude: Option<f64> = row.try_get("longitude")?;
        let created_at: String = row.try_get("created_at")?;
        let version: i64 = row.try_get("version")?;

        let address: Option<Address> = address
            .map(|json| serde_json::from_str(&json))
            .transpose()
            .map_err(decode_err)?;
        let coordinates = match (latitude, longitude) {
            (Some(lat), Some(lon)) => Some(Coordinates::new(lat, lon).map_err(decode_err)?),
            _ => None,
        };

        Ok(Self(Building {
            id: parse(&id)?,
            code: row.try_get("code")?,
            name: row.try_get("name")?,
            building_type: parse(&building_type)?,
            address,
            coordinates,
            active: row.try_get("active")?,
            created_at: parse_timestamp(&created_at)?,
            version: to_u64(version)?,
        }))
    }
}

const INSERT: &str = r"
    INSERT INTO buildings (id, code, name, building_type, address, latitude, longitude, active, created_at, version)
    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
";
const SELECT_BY_ID: &str = "SELECT * FROM buildings WHERE id = ?";
const SELECT_ALL: &str = "SELECT * FROM buildings ORDER BY code";
const COUNT_BY_TYPE: &str =
    "SELECT building_type, COUNT(*) FROM buildings GROUP BY building_type";

/// `SQLite`-backed building repository.
#[derive(Clone)]
pub struct SqliteBuildingRepository {
    pool: SqlitePool,
}

impl SqliteBuildingRepository {
    /// Create a new repository using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl BuildingRepository for SqliteBuildingRepository {
    fn create(
        &self,
        building: Building,
    ) -> impl Future<Output = Result<Building, CampusError>> + Send {
        let pool = self.pool.clone();
        async move {
            let address = building
                .address
                .as_ref()
                .map(serde_json::to_string)
                .transpose()
                .map_err(StorageError::from)?;

            sqlx::query(INSERT)
                .bind(building.id.to_string())
                .bind(&building.code)
                .bind(&building.name)
                .bind(building.building_type.as_str())
                .bind(address)
                .bind(building.coordinates.map(|c| c.latitude()))
                .bind(building.coordinates.map(|c| c.longitude()))
                .bind(building.active)
                .bind(building.created_at.to_rfc3339())
                .bind(to_i64(building.version))
                .execute(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(building)
        }
    }

    fn get_by_id(
        &self,
        id: BuildingId,
    ) -> impl Future<Output = Result<Option<Building>, CampusError>> + Send {
        let pool = self.pool.clone();
        async move {
            let row: Option<Wrapper> = sqlx::query_as(SELECT_BY_ID)
                .bind(id.to_string())
                .fetch_optional(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(Wrapper::maybe(row))
        }
    }

    fn get_all(&self) -> impl Future<Output = Result<Vec<Building>, CampusError>> + Send {
        let pool = self.pool.clone();
        async move {
            let rows: Vec<Wrapper> = sqlx::query_as(SELECT_ALL)
                .fetch_all(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(rows.into_iter().map(|w| w.0).collect())
        }
    }

    fn count_by_type(
        &self,
    ) -> impl Future<Output = Result<Vec<Bucket<BuildingType>>, CampusError>> + Send {
        let pool = self.pool.clone();
        async move {
            let rows: Vec<(String, i64)> = sqlx::query_as(COUNT_BY_TYPE)
                .fetch_all(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(histogram(&BuildingType::ALL, rows).map_err(StorageError::from)?)
        }
    }
}
