#![deny(warnings)]

//! Core domain models and invariants for the airline turnaround simulator.
//!
//! This crate defines the serializable fleet and route records, the registries
//! that own them, and the quarter calendar, together with validation helpers
//! that guarantee basic invariants before anything reaches the simulation.

use thiserror::Error;

mod aircraft;
mod fleet;
mod network;
mod quarter;
mod route;

pub use aircraft::{
    validate_aircraft, Aircraft, AircraftStatus, AircraftType, MaintenancePolicy, Registration,
    UtilizationBasis, BASE_MAINTENANCE_COST_USD,
};
pub use fleet::{Fleet, FleetGroup, FleetStatus};
pub use network::RouteNetwork;
pub use quarter::{QuarterCalendar, QuarterId, DAYS_PER_QUARTER};
pub use route::{validate_route, PerFlightCosts, Route, RouteField, RouteKey, RouteUpdate};

/// Validation errors for domain invariants.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    /// Aircraft status outside {active, maintenance, grounded}.
    #[error("invalid aircraft status `{0}`; expected one of active, maintenance, grounded")]
    InvalidStatus(String),
    /// Registration already present in the fleet.
    #[error("aircraft registration {0} already exists in the fleet")]
    DuplicateRegistration(String),
    /// Identity field (registration, type, airport code) is blank.
    #[error("{0} must not be empty")]
    EmptyIdentifier(&'static str),
    /// Quantity or monetary value must be non-negative.
    #[error("{0} must be non-negative")]
    NegativeValue(&'static str),
    /// Load factor must be within [0, 1].
    #[error("load factor must be within [0,1]")]
    InvalidLoadFactor,
    /// Route modification names a field outside the known set.
    #[error("unknown route field `{0}`")]
    UnknownRouteField(String),
    /// Route modification value has the wrong type or range for its field.
    #[error("invalid value for route field `{field}`: {reason}")]
    InvalidFieldValue { field: String, reason: String },
    /// Quarter label is not of the form `YYYY-Qk`.
    #[error("invalid quarter id `{0}`; expected YYYY-Qk")]
    InvalidQuarter(String),
    /// Calendar arithmetic left the supported date range.
    #[error("date out of range after {0}")]
    DateOutOfRange(String),
    /// Intervention payload is missing or cannot be decoded.
    #[error("malformed intervention: {0}")]
    Malformed(String),
}
