//! Application services — use-case implementations.
//!
//! Each service struct accepts port trait implementations via generic parameters
//! (constructor injection), keeping this layer decoupled from concrete adapters.

pub mod building_service;
pub mod equipment_service;
pub mod space_service;
pub mod statistics_service;

pub use building_service::BuildingService;
pub use equipment_service::EquipmentService;
pub use space_service::SpaceService;
pub use statistics_service::{StatisticsOptions, StatisticsService};
