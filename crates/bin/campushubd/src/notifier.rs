//! Alert delivery through the log.

use std::future::Future;

use campushub_app::ports::{Alert, AlertNotifier};
use campushub_domain::error::CampusError;

/// Writes every alert as a `warn` event under the `campushub::alert` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogAlertNotifier;

impl AlertNotifier for LogAlertNotifier {
    fn notify(&self, alert: Alert) -> impl Future<Output = Result<(), CampusError>> + Send {
        async move {
            match alert {
                Alert::OccupiedSpaceDefective {
                    space_id,
                    occupant_id,
                    defective_count,
                } => tracing::warn!(
                    target: "campushub::alert",
                    %space_id,
                    %occupant_id,
                    defective_count,
                    "occupied space became defective"
                ),
                Alert::CriticalEquipment {
                    equipment_id,
                    status,
                    space_id,
                    reason,
                } => tracing::warn!(
                    target: "campushub::alert",
                    %equipment_id,
                    %status,
                    ?space_id,
                    ?reason,
                    "equipment entered a critical status"
                ),
            }
            Ok(())
        }
    }
}
