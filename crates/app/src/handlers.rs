//! Event subscribers keeping derived state consistent and raising alerts.
//!
//! - [`DefectRecomputeHandler`] listens to equipment changes and recomputes
//!   the defect state of every space they touch
//! - [`OccupiedSpaceAlertHandler`] listens to `DefectRecomputed`
//! - [`CriticalEquipmentAlertHandler`] listens to `StatusChanged`

pub mod alerts;
pub mod defect_recompute;

use std::sync::Arc;

use campushub_domain::event::EventKind;

pub use alerts::{CriticalEquipmentAlertHandler, OccupiedSpaceAlertHandler};
pub use defect_recompute::{
    DefectRecomputeHandler, RecomputeOutcome, RecomputePolicy, SpaceDefectRecomputer,
};

use crate::event_bus::InProcessEventBus;
use crate::ports::{AlertNotifier, EquipmentRepository, SpaceRepository};

/// Register the consistency and alerting subscribers on `bus`.
///
/// The recompute handler is registered first, so a batch's alerts never
/// delay its count updates.
pub fn register_handlers<ER, SR, N>(
    bus: &InProcessEventBus,
    equipment_repo: ER,
    space_repo: SR,
    notifier: N,
    policy: RecomputePolicy,
) where
    ER: EquipmentRepository + Send + Sync + 'static,
    SR: SpaceRepository + Send + Sync + 'static,
    N: AlertNotifier + Clone + Send + Sync + 'static,
{
    bus.register(
        &EventKind::EQUIPMENT_CHANGES,
        Arc::new(DefectRecomputeHandler::new(SpaceDefectRecomputer::new(
            equipment_repo,
            space_repo,
            policy,
        ))),
    );
    bus.register(
        &[EventKind::DefectRecomputed],
        Arc::new(OccupiedSpaceAlertHandler::new(notifier.clone())),
    );
    bus.register(
        &[EventKind::StatusChanged],
        Arc::new(CriticalEquipmentAlertHandler::new(notifier)),
    );
}
