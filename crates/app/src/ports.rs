//! Port definitions — traits that adapters implement.
//!
//! Ports are the boundaries between the application core and the outside world.
//! They are defined here (in `app`) so that both the use-case layer and the
//! adapter layer can depend on them without creating circular dependencies.

pub mod alert;
pub mod event_bus;
pub mod storage;

pub use alert::{Alert, AlertNotifier};
pub use event_bus::{EventHandler, EventPublisher, HandlerFuture};
pub use storage::{
    BuildingRepository, EquipmentFilter, EquipmentRepository, FloorRepository, SpaceRepository,
};
