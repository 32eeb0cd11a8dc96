//! Location value objects — postal address and geographic coordinates.
//!
//! Both types are immutable once built and can only be obtained through their
//! validating constructors, so holding one means it is valid.

use serde::{Deserialize, Serialize};

use crate::error::{CampusError, ValidationError};

/// A WGS84 latitude/longitude pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCoordinates")]
pub struct Coordinates {
    latitude: f64,
    longitude: f64,
}

impl Coordinates {
    /// Build coordinates after range-checking both components.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::LatitudeOutOfRange`] or
    /// [`ValidationError::LongitudeOutOfRange`] for non-finite or
    /// out-of-range values.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, CampusError> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(ValidationError::LatitudeOutOfRange(latitude).into());
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(ValidationError::LongitudeOutOfRange(longitude).into());
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    #[must_use]
    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    #[must_use]
    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

#[derive(Deserialize)]
struct RawCoordinates {
    latitude: f64,
    longitude: f64,
}

impl TryFrom<RawCoordinates> for Coordinates {
    type Error = CampusError;

    fn try_from(raw: RawCoordinates) -> Result<Self, Self::Error> {
        Self::new(raw.latitude, raw.longitude)
    }
}

/// Postal address of a building.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawAddress")]
pub struct Address {
    street: String,
    postal_code: Option<String>,
    city: String,
    country: Option<String>,
}

impl Address {
    /// Build an address; street and city are trimmed and must be non-empty.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyStreet`] or [`ValidationError::EmptyCity`].
    pub fn new(
        street: impl Into<String>,
        postal_code: Option<String>,
        city: impl Into<String>,
        country: Option<String>,
    ) -> Result<Self, CampusError> {
        let street = street.into().trim().to_string();
        let city = city.into().trim().to_string();
        if street.is_empty() {
            return Err(ValidationError::EmptyStreet.into());
        }
        if city.is_empty() {
            return Err(ValidationError::EmptyCity.into());
        }
        Ok(Self {
            street,
            postal_code: postal_code.filter(|code| !code.trim().is_empty()),
            city,
            country: country.filter(|c| !c.trim().is_empty()),
        })
    }

    #[must_use]
    pub fn street(&self) -> &str {
        &self.street
    }

    #[must_use]
    pub fn postal_code(&self) -> Option<&str> {
        self.postal_code.as_deref()
    }

    #[must_use]
    pub fn city(&self) -> &str {
        &self.city
    }

    #[must_use]
    pub fn country(&self) -> Option<&str> {
        self.country.as_deref()
    }
}

#[derive(Deserialize)]
struct RawAddress {
    street: String,
    postal_code: Option<String>,
    city: String,
    country: Option<String>,
}

impl TryFrom<RawAddress> for Address {
    type Error = CampusError;

    fn try_from(raw: RawAddress) -> Result<Self, Self::Error> {
        Self::new(raw.street, raw.postal_code, raw.city, raw.country)
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.street)?;
        match &self.postal_code {
            Some(code) => write!(f, ", {code} {}", self.city)?,
            None => write!(f, ", {}", self.city)?,
        }
        if let Some(country) = &self.country {
            write!(f, ", {country}")?;
        }
        Ok(())
    }
}
