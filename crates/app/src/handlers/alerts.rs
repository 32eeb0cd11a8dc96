//! Alerting subscribers. Each runs independently of the recompute path, so a
//! notifier outage never delays a defect count update.

use campushub_domain::event::{AggregateRef, DomainEvent, EventPayload};

use crate::ports::{Alert, AlertNotifier, EventHandler, HandlerFuture};

/// Raises [`Alert::OccupiedSpaceDefective`] when an occupied space goes from
/// healthy to defective.
pub struct OccupiedSpaceAlertHandler<N> {
    notifier: N,
}

impl<N: AlertNotifier + Send + Sync> OccupiedSpaceAlertHandler<N> {
    pub fn new(notifier: N) -> Self {
        Self { notifier }
    }

    fn alert_for(event: &DomainEvent) -> Option<Alert> {
        let AggregateRef::Space(space_id) = event.aggregate else {
            return None;
        };
        match &event.payload {
            EventPayload::DefectRecomputed {
                previous,
                current,
                occupant_id: Some(occupant_id),
            } if !previous.is_defective() && current.is_defective() => {
                Some(Alert::OccupiedSpaceDefective {
                    space_id,
                    occupant_id: *occupant_id,
                    defective_count: current.count(),
                })
            }
            _ => None,
        }
    }
}

impl<N: AlertNotifier + Send + Sync> EventHandler for OccupiedSpaceAlertHandler<N> {
    fn name(&self) -> &'static str {
        "occupied_space_alert"
    }

    fn handle<'a>(&'a self, events: &'a [DomainEvent]) -> HandlerFuture<'a> {
        Box::pin(async move {
            for alert in events.iter().filter_map(Self::alert_for) {
                if let Err(err) = self.notifier.notify(alert).await {
                    tracing::warn!(%err, "failed to send occupied space alert");
                }
            }
            Ok(Vec::new())
        })
    }
}

/// Raises [`Alert::CriticalEquipment`] when an equipment enters a critical status.
pub struct CriticalEquipmentAlertHandler<N> {
    notifier: N,
}

impl<N: AlertNotifier + Send + Sync> CriticalEquipmentAlertHandler<N> {
    pub fn new(notifier: N) -> Self {
        Self { notifier }
    }

    fn alert_for(event: &DomainEvent) -> Option<Alert> {
        let equipment_id = event.equipment_id()?;
        match &event.payload {
            EventPayload::StatusChanged {
                new_status,
                space_id,
                reason,
                ..
            } if new_status.is_critical() => Some(Alert::CriticalEquipment {
                equipment_id,
                status: *new_status,
                space_id: *space_id,
                reason: reason.clone(),
            }),
            _ => None,
        }
    }
}

impl<N: AlertNotifier + Send + Sync> EventHandler for CriticalEquipmentAlertHandler<N> {
    fn name(&self) -> &'static str {
        "critical_equipment_alert"
    }

    fn handle<'a>(&'a self, events: &'a [DomainEvent]) -> HandlerFuture<'a> {
        Box::pin(async move {
            for alert in events.iter().filter_map(Self::alert_for) {
                if let Err(err) = self.notifier.notify(alert).await {
                    tracing::warn!(%err, "failed to send critical equipment alert");
                }
            }
            Ok(Vec::new())
        })
    }
}
