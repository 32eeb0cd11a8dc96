//! Space type — the functional classification of a space.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// What a space is used for.
///
/// Only [`Room`](Self::Room) and [`Studio`](Self::Studio) are lodging units
/// that can have an occupant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpaceType {
    Room,
    Studio,
    Office,
    Classroom,
    Laboratory,
    MeetingRoom,
    Storage,
    Technical,
    Common,
    Sanitary,
}

impl SpaceType {
    /// Every variant, in display order.
    pub const ALL: [Self; 10] = [
        Self::Room,
        Self::Studio,
        Self::Office,
        Self::Classroom,
        Self::Laboratory,
        Self::MeetingRoom,
        Self::Storage,
        Self::Technical,
        Self::Common,
        Self::Sanitary,
    ];

    /// Whether the space is a lodging unit that can be occupied.
    #[must_use]
    pub fn is_room(self) -> bool {
        matches!(self, Self::Room | Self::Studio)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Room => "room",
            Self::Studio => "studio",
            Self::Office => "office",
            Self::Classroom => "classroom",
            Self::Laboratory => "laboratory",
            Self::MeetingRoom => "meeting_room",
            Self::Storage => "storage",
            Self::Technical => "technical",
            Self::Common => "common",
            Self::Sanitary => "sanitary",
        }
    }
}

impl std::fmt::Display for SpaceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SpaceType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| ValidationError::UnknownValue {
                field: "space type",
                value: s.to_string(),
            })
    }
}
