//! Domain events — immutable records of something that happened to an aggregate.
//!
//! Events are the only channel through which an equipment change influences a
//! space: the equipment aggregate records them, the application layer publishes
//! them, and subscribers react.

use serde::{Deserialize, Serialize};

use crate::equipment::EquipmentStatus;
use crate::id::{EquipmentId, EventId, OccupantId, SpaceId};
use crate::space::DefectState;
use crate::time::{Timestamp, now};

/// The aggregate an event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "aggregate", content = "id", rename_all = "snake_case")]
pub enum AggregateRef {
    Equipment(EquipmentId),
    Space(SpaceId),
}

/// Discriminant of [`EventPayload`], used to register subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    EquipmentRegistered,
    StatusChanged,
    Assigned,
    Unassigned,
    EquipmentRemoved,
    DefectRecomputed,
}

impl EventKind {
    /// Kinds emitted by the equipment aggregate that can move a space's defect count.
    pub const EQUIPMENT_CHANGES: [Self; 5] = [
        Self::EquipmentRegistered,
        Self::StatusChanged,
        Self::Assigned,
        Self::Unassigned,
        Self::EquipmentRemoved,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::EquipmentRegistered => "equipment_registered",
            Self::StatusChanged => "status_changed",
            Self::Assigned => "assigned",
            Self::Unassigned => "unassigned",
            Self::EquipmentRemoved => "equipment_removed",
            Self::DefectRecomputed => "defect_recomputed",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What happened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventPayload {
    EquipmentRegistered {
        status: EquipmentStatus,
        space_id: Option<SpaceId>,
    },
    StatusChanged {
        old_status: EquipmentStatus,
        new_status: EquipmentStatus,
        space_id: Option<SpaceId>,
        reason: Option<String>,
    },
    Assigned {
        old_space_id: Option<SpaceId>,
        new_space_id: SpaceId,
    },
    Unassigned {
        old_space_id: SpaceId,
    },
    EquipmentRemoved {
        status: EquipmentStatus,
        space_id: Option<SpaceId>,
    },
    DefectRecomputed {
        previous: DefectState,
        current: DefectState,
        occupant_id: Option<OccupantId>,
    },
}

impl EventPayload {
    #[must_use]
    pub fn kind(&self) -> EventKind {
        match self {
            Self::EquipmentRegistered { .. } => EventKind::EquipmentRegistered,
            Self::StatusChanged { .. } => EventKind::StatusChanged,
            Self::Assigned { .. } => EventKind::Assigned,
            Self::Unassigned { .. } => EventKind::Unassigned,
            Self::EquipmentRemoved { .. } => EventKind::EquipmentRemoved,
            Self::DefectRecomputed { .. } => EventKind::DefectRecomputed,
        }
    }
}

/// An immutable domain event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainEvent {
    pub id: EventId,
    pub aggregate: AggregateRef,
    pub occurred_at: Timestamp,
    pub payload: EventPayload,
}

impl DomainEvent {
    /// Create a new event with an auto-generated id and the current timestamp.
    #[must_use]
    pub fn new(aggregate: AggregateRef, payload: EventPayload) -> Self {
        Self {
            id: EventId::new(),
            aggregate,
            occurred_at: now(),
            payload,
        }
    }

    #[must_use]
    pub fn for_equipment(id: EquipmentId, payload: EventPayload) -> Self {
        Self::new(AggregateRef::Equipment(id), payload)
    }

    #[must_use]
    pub fn for_space(id: SpaceId, payload: EventPayload) -> Self {
        Self::new(AggregateRef::Space(id), payload)
    }

    /// Override the timestamp.
    #[must_use]
    pub fn at(mut self, occurred_at: Timestamp) -> Self {
        self.occurred_at = occurred_at;
        self
    }

    #[must_use]
    pub fn kind(&self) -> EventKind {
        self.payload.kind()
    }

    #[must_use]
    pub fn equipment_id(&self) -> Option<EquipmentId> {
        match self.aggregate {
            AggregateRef::Equipment(id) => Some(id),
            AggregateRef::Space(_) => None,
        }
    }

    /// Spaces whose defect count may have moved because of this event,
    /// previous assignment first.
    #[must_use]
    pub fn affected_spaces(&self) -> Vec<SpaceId> {
        match &self.payload {
            EventPayload::EquipmentRegistered { space_id, .. }
            | EventPayload::StatusChanged { space_id, .. }
            | EventPayload::EquipmentRemoved { space_id, .. } => space_id.iter().copied().collect(),
            EventPayload::Assigned {
                old_space_id,
                new_space_id,
            } => match old_space_id {
                Some(old) if old != new_space_id => vec![*old, *new_space_id],
                _ => vec![*new_space_id],
            },
            EventPayload::Unassigned { old_space_id } => vec![*old_space_id],
            EventPayload::DefectRecomputed { .. } => Vec::new(),
        }
    }

    /// Whether a subscriber maintaining defect counts must recompute.
    ///
    /// A status change matters when either side is in the defective set, since
    /// both entering and leaving it move the count. Assignment changes and
    /// removals always matter for the spaces they touch.
    #[must_use]
    pub fn is_defect_relevant(&self) -> bool {
        match &self.payload {
            EventPayload::StatusChanged {
                old_status,
                new_status,
                ..
            } => old_status.is_defective() || new_status.is_defective(),
            EventPayload::EquipmentRegistered { status, space_id } => {
                space_id.is_some() && status.is_defective()
            }
            EventPayload::Assigned { .. } | EventPayload::Unassigned { .. } => true,
            EventPayload::EquipmentRemoved { space_id, .. } => space_id.is_some(),
            EventPayload::DefectRecomputed { .. } => false,
        }
    }

    /// Whether this event reports equipment entering a critical status.
    #[must_use]
    pub fn is_critical(&self) -> bool {
        matches!(
            &self.payload,
            EventPayload::StatusChanged { new_status, .. } if new_status.is_critical()
        )
    }
}
