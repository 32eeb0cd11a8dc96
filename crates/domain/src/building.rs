//! Building — the root of the physical hierarchy (building → floor → space).

use serde::{Deserialize, Serialize};

use crate::error::{CampusError, ValidationError};
use crate::id::BuildingId;
use crate::location::{Address, Coordinates};
use crate::time::{Timestamp, now};

/// Functional classification of a building.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildingType {
    Residential,
    Academic,
    Administrative,
    Sports,
    Technical,
    #[default]
    Other,
}

impl BuildingType {
    /// Every variant, in display order.
    pub const ALL: [Self; 6] = [
        Self::Residential,
        Self::Academic,
        Self::Administrative,
        Self::Sports,
        Self::Technical,
        Self::Other,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Residential => "residential",
            Self::Academic => "academic",
            Self::Administrative => "administrative",
            Self::Sports => "sports",
            Self::Technical => "technical",
            Self::Other => "other",
        }
    }
}

impl std::fmt::Display for BuildingType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for BuildingType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| ValidationError::UnknownValue {
                field: "building type",
                value: s.to_string(),
            })
    }
}

/// A physical building.
#[derive(Debug, Clone, Serialize)]
pub struct Building {
    pub id: BuildingId,
    pub code: String,
    pub name: String,
    pub building_type: BuildingType,
    pub address: Option<Address>,
    pub coordinates: Option<Coordinates>,
    pub active: bool,
    pub created_at: Timestamp,
    pub version: u64,
}

impl Building {
    /// Create a builder for constructing a [`Building`].
    #[must_use]
    pub fn builder() -> BuildingBuilder {
        BuildingBuilder::default()
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`CampusError::Validation`] when `code` or `name` is empty.
    pub fn validate(&self) -> Result<(), CampusError> {
        if self.code.trim().is_empty() {
            return Err(ValidationError::EmptyCode.into());
        }
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        Ok(())
    }
}

/// Step-by-step builder for [`Building`].
#[derive(Debug, Default)]
pub struct BuildingBuilder {
    id: Option<BuildingId>,
    code: Option<String>,
    name: Option<String>,
    building_type: BuildingType,
    address: Option<Address>,
    coordinates: Option<Coordinates>,
}

impl BuildingBuilder {
    #[must_use]
    pub fn id(mut self, id: BuildingId) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn building_type(mut self, building_type: BuildingType) -> Self {
        self.building_type = building_type;
        self
    }

    #[must_use]
    pub fn address(mut self, address: Address) -> Self {
        self.address = Some(address);
        self
    }

    #[must_use]
    pub fn coordinates(mut self, coordinates: Coordinates) -> Self {
        self.coordinates = Some(coordinates);
        self
    }

    /// Consume the builder, validate, and return a [`Building`].
    ///
    /// # Errors
    ///
    /// Returns [`CampusError::Validation`] if `code` or `name` is missing or empty.
    pub fn build(self) -> Result<Building, CampusError> {
        let building = Building {
            id: self.id.unwrap_or_default(),
            code: self.code.unwrap_or_default(),
            name: self.name.unwrap_or_default(),
            building_type: self.building_type,
            address: self.address,
            coordinates: self.coordinates,
            active: true,
            created_at: now(),
            version: 0,
        };
        building.validate()?;
        Ok(building)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_build_valid_building_when_code_and_name_provided() {
        let building = Building::builder()
            .code("B1")
            .name("Residence A")
            .building_type(BuildingType::Residential)
            .build()
            .unwrap();
        assert_eq!(building.code, "B1");
        assert!(building.active);
        assert_eq!(building.version, 0);
    }

    #[test]
    fn should_return_validation_error_when_code_is_missing() {
        let result = Building::builder().name("Residence A").build();
        assert!(matches!(
            result,
            Err(CampusError::Validation(ValidationError::EmptyCode))
        ));
    }

    #[test]
    fn should_return_validation_error_when_name_is_blank() {
        let result = Building::builder().code("B1").name("   ").build();
        assert!(matches!(
            result,
            Err(CampusError::Validation(ValidationError::EmptyName))
        ));
    }

    #[test]
    fn should_parse_building_type_from_its_label() {
        for kind in BuildingType::ALL {
            assert_eq!(kind.as_str().parse::<BuildingType>().unwrap(), kind);
        }
        assert!("castle".parse::<BuildingType>().is_err());
    }
}
