//! Equipment catalog — fixed equipment types and the categories they roll up to.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Broad family of an [`EquipmentType`], used for statistics histograms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EquipmentCategory {
    Furniture,
    Appliance,
    Hvac,
    Plumbing,
    Lighting,
    Safety,
    Electronics,
    Other,
}

impl EquipmentCategory {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Furniture => "furniture",
            Self::Appliance => "appliance",
            Self::Hvac => "hvac",
            Self::Plumbing => "plumbing",
            Self::Lighting => "lighting",
            Self::Safety => "safety",
            Self::Electronics => "electronics",
            Self::Other => "other",
        }
    }
}

impl std::fmt::Display for EquipmentCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Catalog entry of a piece of equipment. Immutable after creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EquipmentType {
    Bed,
    Desk,
    Chair,
    Wardrobe,
    Shelf,
    Refrigerator,
    Microwave,
    WashingMachine,
    Heater,
    AirConditioner,
    WaterHeater,
    LightFixture,
    SmokeDetector,
    FireExtinguisher,
    Projector,
    Computer,
    Whiteboard,
    Other,
}

impl EquipmentType {
    /// Every variant, in display order.
    pub const ALL: [Self; 18] = [
        Self::Bed,
        Self::Desk,
        Self::Chair,
        Self::Wardrobe,
        Self::Shelf,
        Self::Refrigerator,
        Self::Microwave,
        Self::WashingMachine,
        Self::Heater,
        Self::AirConditioner,
        Self::WaterHeater,
        Self::LightFixture,
        Self::SmokeDetector,
        Self::FireExtinguisher,
        Self::Projector,
        Self::Computer,
        Self::Whiteboard,
        Self::Other,
    ];

    #[must_use]
    pub fn category(self) -> EquipmentCategory {
        match self {
            Self::Bed | Self::Desk | Self::Chair | Self::Wardrobe | Self::Shelf => {
                EquipmentCategory::Furniture
            }
            Self::Refrigerator | Self::Microwave | Self::WashingMachine => {
                EquipmentCategory::Appliance
            }
            Self::Heater | Self::AirConditioner => EquipmentCategory::Hvac,
            Self::WaterHeater => EquipmentCategory::Plumbing,
            Self::LightFixture => EquipmentCategory::Lighting,
            Self::SmokeDetector | Self::FireExtinguisher => EquipmentCategory::Safety,
            Self::Projector | Self::Computer | Self::Whiteboard => EquipmentCategory::Electronics,
            Self::Other => EquipmentCategory::Other,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bed => "bed",
            Self::Desk => "desk",
            Self::Chair => "chair",
            Self::Wardrobe => "wardrobe",
            Self::Shelf => "shelf",
            Self::Refrigerator => "refrigerator",
            Self::Microwave => "microwave",
            Self::WashingMachine => "washing_machine",
            Self::Heater => "heater",
            Self::AirConditioner => "air_conditioner",
            Self::WaterHeater => "water_heater",
            Self::LightFixture => "light_fixture",
            Self::SmokeDetector => "smoke_detector",
            Self::FireExtinguisher => "fire_extinguisher",
            Self::Projector => "projector",
            Self::Computer => "computer",
            Self::Whiteboard => "whiteboard",
            Self::Other => "other",
        }
    }
}

impl std::fmt::Display for EquipmentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EquipmentType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| ValidationError::UnknownValue {
                field: "equipment type",
                value: s.to_string(),
            })
    }
}
