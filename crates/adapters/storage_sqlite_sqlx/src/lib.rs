//! # campushub-adapter-storage-sqlite-sqlx
//!
//! `SQLite` persistence adapter using [sqlx](https://docs.rs/sqlx).
//!
//! ## Responsibilities
//! - Implement the repository port traits defined in `campushub-app::ports::storage`
//! - Manage `SQLite` connection pool lifecycle
//! - Run database migrations (using sqlx embedded migrations)
//! - Map between domain types and database rows
//! - Enforce optimistic versioning with `UPDATE ... WHERE version = ?`
//!
//! ## Dependency rule
//! Depends on `campushub-app` (for port traits) and `campushub-domain` (for domain types).
//! The `app` and `domain` crates must never reference this adapter.

mod codec;

pub mod building_repo;
pub mod equipment_repo;
pub mod error;
pub mod floor_repo;
pub mod pool;
pub mod space_repo;

pub use building_repo::SqliteBuildingRepository;
pub use equipment_repo::SqliteEquipmentRepository;
pub use error::StorageError;
pub use floor_repo::SqliteFloorRepository;
pub use pool::{Config, Database};
pub use space_repo::SqliteSpaceRepository;
