//! # campushub-app
//!
//! Application layer — use-cases, **port definitions** (traits) and the
//! event choreography between aggregates.
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `BuildingRepository`, `FloorRepository` — the containment hierarchy
//!   - `SpaceRepository` — spaces plus occupancy/defect summaries
//!   - `EquipmentRepository` — equipment plus status/type histograms and the
//!     defective count per space
//!   - `EventPublisher`, `EventHandler` — publishing and reacting to events
//!   - `AlertNotifier` — outbound alerts
//! - Define **driving/inbound ports** as use-case structs:
//!   - `EquipmentService` — register, change status, assign, unassign, remove
//!   - `SpaceService` — create, occupancy, activation, defect resync
//!   - `BuildingService` — buildings and floors
//!   - `StatisticsService` — snapshots, top defective spaces, maintenance risk
//! - Provide **in-process infrastructure** (event bus, per-key locks) that
//!   doesn't need IO
//! - Keep each space's defect count consistent with its equipment through
//!   event handlers rather than cross-aggregate writes
//!
//! ## Dependency rule
//! Depends on `campushub-domain` only (plus `tokio::sync`/`tokio::time`).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod event_bus;
pub mod handlers;
pub mod keyed_lock;
pub mod ports;
pub mod services;

#[cfg(test)]
pub(crate) mod testing;
