//! Alert port — outbound notifications about situations needing attention.

use std::future::Future;

use serde::Serialize;

use campushub_domain::equipment::EquipmentStatus;
use campushub_domain::error::CampusError;
use campushub_domain::id::{EquipmentId, OccupantId, SpaceId};

/// Something a human should hear about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Alert {
    /// An occupied space just became defective.
    OccupiedSpaceDefective {
        space_id: SpaceId,
        occupant_id: OccupantId,
        defective_count: u32,
    },
    /// An equipment entered a critical status.
    CriticalEquipment {
        equipment_id: EquipmentId,
        status: EquipmentStatus,
        space_id: Option<SpaceId>,
        reason: Option<String>,
    },
}

/// Delivers alerts (mail, chat, pager, log …).
pub trait AlertNotifier {
    fn notify(&self, alert: Alert) -> impl Future<Output = Result<(), CampusError>> + Send;
}

impl<T: AlertNotifier + Send + Sync> AlertNotifier for std::sync::Arc<T> {
    fn notify(&self, alert: Alert) -> impl Future<Output = Result<(), CampusError>> + Send {
        (**self).notify(alert)
    }
}
