//! Floor — a level inside a building, containing spaces.

use serde::Serialize;

use crate::id::{BuildingId, FloorId};

/// A level of a [`Building`](crate::building::Building).
///
/// Negative numbers are basements, `0` is the ground floor.
#[derive(Debug, Clone, Serialize)]
pub struct Floor {
    pub id: FloorId,
    pub building_id: BuildingId,
    pub number: i32,
    pub label: Option<String>,
    pub active: bool,
    pub version: u64,
}

impl Floor {
    /// Create a new active floor.
    #[must_use]
    pub fn new(building_id: BuildingId, number: i32) -> Self {
        Self {
            id: FloorId::new(),
            building_id,
            number,
            label: None,
            active: true,
            version: 0,
        }
    }

    /// Attach a custom label such as `"Mezzanine"`.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        let label = label.into();
        self.label = (!label.trim().is_empty()).then_some(label);
        self
    }

    /// Human-readable label, falling back to one derived from the number.
    #[must_use]
    pub fn display_label(&self) -> String {
        if let Some(label) = &self.label {
            return label.clone();
        }
        match self.number {
            0 => "Ground floor".to_string(),
            n if n < 0 => format!("Basement {}", n.unsigned_abs()),
            n => format!("Floor {n}"),
        }
    }
}
