//! # campushub-domain
//!
//! Pure domain model for campus infrastructure and equipment tracking.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions, timestamps
//! - Value objects for locations (address, coordinates)
//! - **Buildings** and **Floors**: the containment hierarchy
//! - **Spaces**: rooms, offices, labs … with occupancy and a derived defect state
//! - **Equipment**: assets with a lifecycle status machine and an assignment
//!   pointer to a space
//! - **Domain events** recorded by aggregates for cross-aggregate choreography
//! - **Statistics** DTOs, ratio formulas and risk scoring
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod building;
pub mod equipment;
pub mod event;
pub mod floor;
pub mod location;
pub mod space;
pub mod statistics;
