//! `SQLite` implementation of [`EquipmentRepository`].
//!
//! Equipment has no building column: building filters join through the space
//! it is assigned to, so unassigned equipment never matches a building filter.

use std::future::Future;
use std::sync::LazyLock;

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use campushub_app::ports::{EquipmentFilter, EquipmentRepository};
use campushub_domain::equipment::{Acquisition, Equipment, EquipmentStatus, EquipmentType};
use campushub_domain::error::CampusError;
use campushub_domain::id::{BuildingId, EquipmentId, SpaceId};
use campushub_domain::statistics::Bucket;

use crate::codec::{
    decode_err, histogram, parse, parse_opt, parse_timestamp, parse_timestamp_opt, to_i64,
    to_u32, to_u64,
};
use crate::error::{StorageError, rejected_update};

/// Wrapper for converting database rows into domain [`Equipment`].
struct Wrapper(Equipment);

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let id: String = row.try_get("id")?;
        let equipment_type: String = row.try_get("equipment_type")?;
        let name: String = row.try_get("name")?;
        let serial_number: Option<String> = row.try_get("serial_number")?;
        let status: String = row.try_get("status")?;
        let space_id: Option<String> = row.try_get("space_id")?;
        let failures: i64 = row.try_get("failure_history_count")?;
        let installed_at: Option<String> = row.try_get("installed_at")?;
        let last_intervention_at: Option<String> = row.try_get("last_intervention_at")?;
        let acquisition_value: Option<f64> = row.try_get("acquisition_value")?;
        let acquired_on: Option<String> = row.try_get("acquired_on")?;
        let lifespan: Option<i64> = row.try_get("estimated_lifespan_months")?;
        let created_at: String = row.try_get("created_at")?;
        let version: i64 = row.try_get("version")?;

        let mut builder = Equipment::builder()
            .id(parse(&id)?)
            .equipment_type(parse(&equipment_type)?)
            .name(name)
            .status(parse(&status)?)
            .space_id(parse_opt(space_id)?)
            .failure_history_count(to_u32(failures)?)
            .installed_at(parse_timestamp_opt(installed_at)?)
            .last_intervention_at(parse_timestamp_opt(last_intervention_at)?)
            .created_at(parse_timestamp(&created_at)?)
            .version(to_u64(version)?);
        if let Some(serial_number) = serial_number {
            builder = builder.serial_number(serial_number);
        }
        if let (Some(value), Some(acquired_on), Some(lifespan)) =
            (acquisition_value, acquired_on, lifespan)
        {
            let acquisition =
                Acquisition::new(value, parse_timestamp(&acquired_on)?, to_u32(lifespan)?)
                    .map_err(decode_err)?;
            builder = builder.acquisition(acquisition);
        }
        builder.build().map(Self).map_err(decode_err)
    }
}

const INSERT: &str = r"
    INSERT INTO equipment (
        id, equipment_type, name, serial_number, status, space_id,
        failure_history_count, installed_at, last_intervention_at,
        acquisition_value, acquired_on, estimated_lifespan_months,
        created_at, version
    ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
";
const SELECT_BY_ID: &str = "SELECT * FROM equipment WHERE id = ?";
const UPDATE: &str = r"
    UPDATE equipment SET
        name = ?, serial_number = ?, status = ?, space_id = ?,
        failure_history_count = ?, installed_at = ?, last_intervention_at = ?,
        acquisition_value = ?, acquired_on = ?, estimated_lifespan_months = ?,
        version = version + 1
    WHERE id = ? AND version = ?
";
const SELECT_VERSION: &str = "SELECT version FROM equipment WHERE id = ?";
const DELETE: &str = "DELETE FROM equipment WHERE id = ?";
const SELECT_FILTERED: &str = r"
    SELECT e.* FROM equipment e
    LEFT JOIN spaces s ON s.id = e.space_id
    WHERE (? IS NULL OR s.building_id = ?)
      AND (? IS NULL OR e.space_id = ?)
      AND (? IS NULL OR e.status = ?)
    ORDER BY e.created_at, e.id
";
/// One placeholder per [`EquipmentStatus::DEFECTIVE`] entry, bound in order.
static COUNT_DEFECTIVE_BY_SPACE: LazyLock<String> = LazyLock::new(|| {
    let placeholders = vec!["?"; EquipmentStatus::DEFECTIVE.len()].join(", ");
    format!("SELECT COUNT(*) FROM equipment WHERE space_id = ? AND status IN ({placeholders})")
});
const COUNT_BY_STATUS: &str = r"
    SELECT e.status, COUNT(*) FROM equipment e
    LEFT JOIN spaces s ON s.id = e.space_id
    WHERE (? IS NULL OR s.building_id = ?)
    GROUP BY e.status
";
const COUNT_BY_TYPE: &str = r"
    SELECT e.equipment_type, COUNT(*) FROM equipment e
    LEFT JOIN spaces s ON s.id = e.space_id
    WHERE (? IS NULL OR s.building_id = ?)
    GROUP BY e.equipment_type
";
const COUNT_ASSIGNED: &str = r"
    SELECT COUNT(*) FROM equipment e
    JOIN spaces s ON s.id = e.space_id
    WHERE (? IS NULL OR s.building_id = ?)
";

/// `SQLite`-backed equipment repository.
#[derive(Clone)]
pub struct SqliteEquipmentRepository {
    pool: SqlitePool,
}

impl SqliteEquipmentRepository {
    /// Create a new repository using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn acquisition_columns(equipment: &Equipment) -> (Option<f64>, Option<String>, Option<u32>) {
    match &equipment.acquisition {
        Some(acq) => (
            Some(acq.value()),
            Some(acq.acquired_on().to_rfc3339()),
            Some(acq.estimated_lifespan_months()),
        ),
        None => (None, None, None),
    }
}

impl EquipmentRepository for SqliteEquipmentRepository {
    fn create(
        &self,
        equipment: Equipment,
    ) -> impl Future<Output = Result<Equipment, CampusError>> + Send {
        let pool = self.pool.clone();
        async move {
            let (value, acquired_on, lifespan) = acquisition_columns(&equipment);
            sqlx::query(INSERT)
                .bind(equipment.id.to_string())
                .bind(equipment.equipment_type().as_str())
                .bind(&equipment.name)
                .bind(&equipment.serial_number)
                .bind(equipment.status().as_str())
                .bind(equipment.space_id().map(|id| id.to_string()))
                .bind(equipment.failure_history_count())
                .bind(equipment.installed_at().map(|at| at.to_rfc3339()))
                .bind(equipment.last_intervention_at().map(|at| at.to_rfc3339()))
                .bind(value)
                .bind(acquired_on)
                .bind(lifespan)
                .bind(equipment.created_at.to_rfc3339())
                .bind(to_i64(equipment.version))
                .execute(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(equipment)
        }
    }

    fn get_by_id(
        &self,
        id: EquipmentId,
    ) -> impl Future<Output = Result<Option<Equipment>, CampusError>> + Send {
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

    fn update(
        &self,
        mut equipment: Equipment,
    ) -> impl Future<Output = Result<Equipment, CampusError>> + Send {
        let pool = self.pool.clone();
        async move {
            let (value, acquired_on, lifespan) = acquisition_columns(&equipment);
            let result = sqlx::query(UPDATE)
                .bind(&equipment.name)
                .bind(&equipment.serial_number)
                .bind(equipment.status().as_str())
                .bind(equipment.space_id().map(|id| id.to_string()))
                .bind(equipment.failure_history_count())
                .bind(equipment.installed_at().map(|at| at.to_rfc3339()))
                .bind(equipment.last_intervention_at().map(|at| at.to_rfc3339()))
                .bind(value)
                .bind(acquired_on)
                .bind(lifespan)
                .bind(equipment.id.to_string())
                .bind(to_i64(equipment.version))
                .execute(&pool)
                .await
                .map_err(StorageError::from)?;

            if result.rows_affected() == 0 {
                let exists: Option<i64> = sqlx::query_scalar(SELECT_VERSION)
                    .bind(equipment.id.to_string())
                    .fetch_optional(&pool)
                    .await
                    .map_err(StorageError::from)?;
                return Err(rejected_update(
                    "Equipment",
                    equipment.id.to_string(),
                    equipment.version,
                    exists,
                ));
            }

            equipment.version += 1;
            Ok(equipment)
        }
    }

    fn delete(&self, id: EquipmentId) -> impl Future<Output = Result<(), CampusError>> + Send {
        let pool = self.pool.clone();
        async move {
            sqlx::query(DELETE)
                .bind(id.to_string())
                .execute(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(())
        }
    }

    fn find(
        &self,
        filter: EquipmentFilter,
    ) -> impl Future<Output = Result<Vec<Equipment>, CampusError>> + Send {
        let pool = self.pool.clone();
        async move {
            let building = filter.building_id.map(|id| id.to_string());
            let space = filter.space_id.map(|id| id.to_string());
            let status = filter.status.map(EquipmentStatus::as_str);
            let rows: Vec<Wrapper> = sqlx::query_as(SELECT_FILTERED)
                .bind(&building)
                .bind(&building)
                .bind(&space)
                .bind(&space)
                .bind(status)
                .bind(status)
                .fetch_all(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(rows.into_iter().map(|w| w.0).collect())
        }
    }

    fn count_defective_by_space(
        &self,
        space_id: SpaceId,
    ) -> impl Future<Output = Result<u64, CampusError>> + Send {
        let pool = self.pool.clone();
        async move {
            let mut query =
                sqlx::query_scalar(COUNT_DEFECTIVE_BY_SPACE.as_str()).bind(space_id.to_string());
            for status in EquipmentStatus::DEFECTIVE {
                query = query.bind(status.as_str());
            }
            let count: i64 = query
                .fetch_one(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(to_u64(count).map_err(StorageError::from)?)
        }
    }

    fn count_by_status(
        &self,
        building: Option<BuildingId>,
    ) -> impl Future<Output = Result<Vec<Bucket<EquipmentStatus>>, CampusError>> + Send {
        let pool = self.pool.clone();
        async move {
            let building = building.map(|id| id.to_string());
            let rows: Vec<(String, i64)> = sqlx::query_as(COUNT_BY_STATUS)
                .bind(&building)
                .bind(&building)
                .fetch_all(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(histogram(&EquipmentStatus::ALL, rows).map_err(StorageError::from)?)
        }
    }

    fn count_by_type(
        &self,
        building: Option<BuildingId>,
    ) -> impl Future<Output = Result<Vec<Bucket<EquipmentType>>, CampusError>> + Send {
        let pool = self.pool.clone();
        async move {
            let building = building.map(|id| id.to_string());
            let rows: Vec<(String, i64)> = sqlx::query_as(COUNT_BY_TYPE)
                .bind(&building)
                .bind(&building)
                .fetch_all(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(histogram(&EquipmentType::ALL, rows).map_err(StorageError::from)?)
        }
    }

    fn count_assigned(
        &self,
        building: Option<BuildingId>,
    ) -> impl Future<Output = Result<u64, CampusError>> + Send {
        let pool = self.pool.clone();
        async move {
            let building = building.map(|id| id.to_string());
            let count: i64 = sqlx::query_scalar(COUNT_ASSIGNED)
                .bind(&building)
                .bind(&building)
                .fetch_one(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(to_u64(count).map_err(StorageError::from)?)
        }
    }
}
