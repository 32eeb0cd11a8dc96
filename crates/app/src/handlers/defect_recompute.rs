//! Equipment → space propagation of the defective-equipment count.

use std::time::Duration;

use campushub_domain::error::CampusError;
use campushub_domain::event::{DomainEvent, EventPayload};
use campushub_domain::id::{OccupantId, SpaceId};
use campushub_domain::space::DefectState;

use crate::ports::{EquipmentRepository, EventHandler, HandlerFuture, SpaceRepository};

/// Bounded retry applied when a recompute loses a race with another writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecomputePolicy {
    pub max_retries: u32,
    /// Delay before the first retry, grown linearly with each attempt.
    pub backoff: Duration,
}

impl Default for RecomputePolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff: Duration::from_millis(20),
        }
    }
}

/// Result of recomputing one space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecomputeOutcome {
    /// The stored state already matched the count.
    Unchanged(DefectState),
    /// The state moved and was saved.
    Updated {
        previous: DefectState,
        current: DefectState,
        occupant_id: Option<OccupantId>,
    },
    /// The space no longer exists.
    SpaceMissing,
}

impl RecomputeOutcome {
    /// The `DefectRecomputed` event to publish, if the state moved.
    #[must_use]
    pub fn into_event(self, space_id: SpaceId) -> Option<DomainEvent> {
        match self {
            Self::Updated {
                previous,
                current,
                occupant_id,
            } => Some(DomainEvent::for_space(
                space_id,
                EventPayload::DefectRecomputed {
                    previous,
                    current,
                    occupant_id,
                },
            )),
            Self::Unchanged(_) | Self::SpaceMissing => None,
        }
    }
}

/// Sets a space's defect state from a fresh repository count.
///
/// The count is always read, never derived from an event payload, so running
/// the same recompute twice or in any order converges to the true count.
#[derive(Clone)]
pub struct SpaceDefectRecomputer<ER, SR> {
    equipment_repo: ER,
    space_repo: SR,
    policy: RecomputePolicy,
}

impl<ER, SR> SpaceDefectRecomputer<ER, SR>
where
    ER: EquipmentRepository + Sync,
    SR: SpaceRepository + Sync,
{
    pub fn new(equipment_repo: ER, space_repo: SR, policy: RecomputePolicy) -> Self {
        Self {
            equipment_repo,
            space_repo,
            policy,
        }
    }

    /// Recount the defective equipment of `space_id` and save the result.
    ///
    /// A version conflict triggers a re-read and a new attempt, up to
    /// [`RecomputePolicy::max_retries`] times.
    ///
    /// # Errors
    ///
    /// Returns the last [`CampusError::VersionConflict`] once retries are
    /// exhausted, or a storage error from either repository.
    #[tracing::instrument(skip(self))]
    pub async fn recompute(&self, space_id: SpaceId) -> Result<RecomputeOutcome, CampusError> {
        let mut attempt = 0;
        loop {
            let Some(mut space) = self.space_repo.get_by_id(space_id).await? else {
                return Ok(RecomputeOutcome::SpaceMissing);
            };
            let count = self
                .equipment_repo
                .count_defective_by_space(space_id)
                .await?;

            let previous = space.defects();
            if !space.recompute_defects(i64::try_from(count).unwrap_or(i64::MAX)) {
                return Ok(RecomputeOutcome::Unchanged(previous));
            }
            let current = space.defects();
            let occupant_id = space.occupant_id();

            match self.space_repo.update(space).await {
                Ok(_) => {
                    tracing::debug!(
                        previous = previous.count(),
                        current = current.count(),
                        "space defect state updated"
                    );
                    return Ok(RecomputeOutcome::Updated {
                        previous,
                        current,
                        occupant_id,
                    });
                }
                Err(err) if err.is_version_conflict() && attempt < self.policy.max_retries => {
                    attempt += 1;
                    tracing::debug!(attempt, "version conflict during recompute, retrying");
                    tokio::time::sleep(self.policy.backoff * attempt).await;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

/// Subscriber recomputing every space touched by a batch of equipment events.
///
/// Each space is recomputed once per batch. Failures are logged per space and
/// never reported to the bus, so one broken space does not hold back the others.
pub struct DefectRecomputeHandler<ER, SR> {
    recomputer: SpaceDefectRecomputer<ER, SR>,
}

impl<ER, SR> DefectRecomputeHandler<ER, SR>
where
    ER: EquipmentRepository + Send + Sync,
    SR: SpaceRepository + Send + Sync,
{
    pub fn new(recomputer: SpaceDefectRecomputer<ER, SR>) -> Self {
        Self { recomputer }
    }

    async fn run(&self, events: &[DomainEvent]) -> Vec<DomainEvent> {
        let mut spaces: Vec<SpaceId> = Vec::new();
        for space_id in events
            .iter()
            .filter(|e| e.is_defect_relevant())
            .flat_map(DomainEvent::affected_spaces)
        {
            if !spaces.contains(&space_id) {
                spaces.push(space_id);
            }
        }

        let mut produced = Vec::new();
        for space_id in spaces {
            match self.recomputer.recompute(space_id).await {
                Ok(RecomputeOutcome::SpaceMissing) => {
                    tracing::info!(%space_id, "space not found, skipping defect recompute");
                }
                Ok(outcome) => produced.extend(outcome.into_event(space_id)),
                Err(err) => {
                    tracing::warn!(%err, %space_id, "defect recompute failed");
                }
            }
        }
        produced
    }
}

impl<ER, SR> EventHandler for DefectRecomputeHandler<ER, SR>
where
    ER: EquipmentRepository + Send + Sync,
    SR: SpaceRepository + Send + Sync,
{
    fn name(&self) -> &'static str {
        "defect_recompute"
    }

    fn handle<'a>(&'a self, events: &'a [DomainEvent]) -> HandlerFuture<'a> {
        Box::pin(async move { Ok(self.run(events).await) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{InMemoryCampus, seed_building, seed_space, stored_equipment};
    use campushub_domain::equipment::{Equipment, EquipmentStatus};
    use campushub_domain::event::EventKind;
    use campushub_domain::id::EquipmentId;
    use campushub_domain::space::SpaceType;
    use campushub_domain::time::now;

    fn handler(campus: &InMemoryCampus) -> DefectRecomputeHandler<InMemoryCampus, InMemoryCampus> {
        DefectRecomputeHandler::new(SpaceDefectRecomputer::new(
            campus.clone(),
            campus.clone(),
            RecomputePolicy {
                max_retries: 3,
                backoff: Duration::from_millis(1),
            },
        ))
    }

    fn change_status(
        campus: &InMemoryCampus,
        mut equipment: Equipment,
        target: EquipmentStatus,
    ) -> (Equipment, DomainEvent) {
        equipment.change_status(target, None, now()).unwrap();
        let event = equipment.take_events().remove(0);
        campus.put_equipment(equipment.clone());
        (equipment, event)
    }

    #[tokio::test]
    async fn should_set_count_from_repository_when_status_changes() {
        let campus = InMemoryCampus::default();
        let location = seed_building(&campus, "A").await;
        let space_id = seed_space(&campus, location, "A-101", SpaceType::Room).await;
        let heater = stored_equipment(&campus, Some(space_id), EquipmentStatus::Good);

        let (_, event) = change_status(&campus, heater, EquipmentStatus::NeedsRepair);
        let produced = handler(&campus).handle(&[event]).await.unwrap();

        let space = campus.space(space_id);
        assert_eq!(space.defective_equipment_count(), 1);
        assert!(space.is_defective());
        assert_eq!(produced.len(), 1);
        assert_eq!(produced[0].kind(), EventKind::DefectRecomputed);
    }

    #[tokio::test]
    async fn should_yield_same_count_when_event_delivered_twice() {
        let campus = InMemoryCampus::default();
        let location = seed_building(&campus, "A").await;
        let space_id = seed_space(&campus, location, "A-101", SpaceType::Room).await;
        let heater = stored_equipment(&campus, Some(space_id), EquipmentStatus::Good);
        let (_, event) = change_status(&campus, heater, EquipmentStatus::NeedsRepair);
        let handler = handler(&campus);

        handler.handle(std::slice::from_ref(&event)).await.unwrap();
        let second = handler.handle(&[event]).await.unwrap();

        assert_eq!(campus.space(space_id).defective_equipment_count(), 1);
        assert!(second.is_empty());
    }

    #[tokio::test]
    async fn should_converge_regardless_of_event_order() {
        for reversed in [false, true] {
            let campus = InMemoryCampus::default();
            let location = seed_building(&campus, "A").await;
            let space_id = seed_space(&campus, location, "A-101", SpaceType::Room).await;
            let first = stored_equipment(&campus, Some(space_id), EquipmentStatus::Good);
            let second = stored_equipment(&campus, Some(space_id), EquipmentStatus::NeedsRepair);

            let (_, e1) = change_status(&campus, first, EquipmentStatus::NeedsReplacement);
            let (_, e2) = change_status(&campus, second, EquipmentStatus::InMaintenance);
            let mut events = vec![e1, e2];
            if reversed {
                events.reverse();
            }

            let handler = handler(&campus);
            for event in &events {
                handler.handle(std::slice::from_ref(event)).await.unwrap();
            }

            assert_eq!(campus.space(space_id).defective_equipment_count(), 2);
        }
    }

    #[tokio::test]
    async fn should_recompute_both_spaces_when_equipment_moves() {
        let campus = InMemoryCampus::default();
        let location = seed_building(&campus, "A").await;
        let old_space = seed_space(&campus, location, "A-101", SpaceType::Room).await;
        let new_space = seed_space(&campus, location, "A-102", SpaceType::Room).await;
        let mut heater = stored_equipment(&campus, Some(old_space), EquipmentStatus::NeedsRepair);
        handler(&campus)
            .recomputer
            .recompute(old_space)
            .await
            .unwrap();
        assert!(campus.space(old_space).is_defective());

        heater.assign_to(new_space, now()).unwrap();
        let event = heater.take_events().remove(0);
        campus.put_equipment(heater);
        handler(&campus).handle(&[event]).await.unwrap();

        assert!(!campus.space(old_space).is_defective());
        assert_eq!(campus.space(new_space).defective_equipment_count(), 1);
    }

    #[tokio::test]
    async fn should_recompute_space_once_per_batch() {
        let campus = InMemoryCampus::default();
        let location = seed_building(&campus, "A").await;
        let space_id = seed_space(&campus, location, "A-101", SpaceType::Room).await;
        let a = stored_equipment(&campus, Some(space_id), EquipmentStatus::Good);
        let b = stored_equipment(&campus, Some(space_id), EquipmentStatus::Good);
        let (_, e1) = change_status(&campus, a, EquipmentStatus::NeedsRepair);
        let (_, e2) = change_status(&campus, b, EquipmentStatus::NeedsRepair);

        let produced = handler(&campus).handle(&[e1, e2]).await.unwrap();

        assert_eq!(produced.len(), 1);
        assert_eq!(campus.space(space_id).version, 1);
        assert_eq!(campus.space(space_id).defective_equipment_count(), 2);
    }

    #[tokio::test]
    async fn should_skip_missing_space_without_failing() {
        let campus = InMemoryCampus::default();
        let location = seed_building(&campus, "A").await;
        let space_id = seed_space(&campus, location, "A-101", SpaceType::Room).await;
        let heater = stored_equipment(&campus, Some(space_id), EquipmentStatus::Good);
        let (_, event) = change_status(&campus, heater, EquipmentStatus::NeedsRepair);
        campus.remove_space(space_id);

        let produced = handler(&campus).handle(&[event]).await.unwrap();
        assert!(produced.is_empty());
    }

    #[tokio::test]
    async fn should_retry_when_version_conflicts() {
        let campus = InMemoryCampus::default();
        let location = seed_building(&campus, "A").await;
        let space_id = seed_space(&campus, location, "A-101", SpaceType::Room).await;
        stored_equipment(&campus, Some(space_id), EquipmentStatus::AwaitingPart);
        campus.fail_next_space_updates(2);

        let outcome = handler(&campus)
            .recomputer
            .recompute(space_id)
            .await
            .unwrap();

        assert!(matches!(outcome, RecomputeOutcome::Updated { .. }));
        assert_eq!(campus.space(space_id).defective_equipment_count(), 1);
    }

    #[tokio::test]
    async fn should_give_up_after_max_retries() {
        let campus = InMemoryCampus::default();
        let location = seed_building(&campus, "A").await;
        let space_id = seed_space(&campus, location, "A-101", SpaceType::Room).await;
        stored_equipment(&campus, Some(space_id), EquipmentStatus::AwaitingPart);
        campus.fail_next_space_updates(10);

        let result = handler(&campus).recomputer.recompute(space_id).await;

        assert!(matches!(result, Err(CampusError::VersionConflict(_))));
        assert!(!campus.space(space_id).is_defective());
    }

    #[tokio::test]
    async fn should_ignore_status_change_outside_defective_set() {
        let campus = InMemoryCampus::default();
        let event = DomainEvent::for_equipment(
            EquipmentId::new(),
            EventPayload::StatusChanged {
                old_status: EquipmentStatus::Good,
                new_status: EquipmentStatus::OutOfService,
                space_id: Some(SpaceId::new()),
                reason: None,
            },
        );

        let produced = handler(&campus).handle(&[event]).await.unwrap();
        assert!(produced.is_empty());
    }
}
