//! Individual aircraft records and their cost, fuel and maintenance formulas.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::ValidationError;

/// Base maintenance cost per aircraft in USD before age and utilization factors.
pub const BASE_MAINTENANCE_COST_USD: i64 = 100_000;

/// Tail registration, e.g. "S2-AFO". Unique within a fleet.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Registration(pub String);

impl fmt::Display for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Registration {
    fn from(s: &str) -> Self {
        Registration(s.to_string())
    }
}

/// Aircraft model designator, e.g. "B787-8".
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AircraftType(pub String);

impl fmt::Display for AircraftType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AircraftType {
    fn from(s: &str) -> Self {
        AircraftType(s.to_string())
    }
}

/// Operational status of a tail.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum AircraftStatus {
    /// Flying revenue service.
    #[default]
    Active,
    /// In a maintenance check.
    Maintenance,
    /// Out of service.
    Grounded,
}

impl AircraftStatus {
    /// Every valid status, in reporting order.
    pub const ALL: [AircraftStatus; 3] = [
        AircraftStatus::Active,
        AircraftStatus::Maintenance,
        AircraftStatus::Grounded,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AircraftStatus::Active => "active",
            AircraftStatus::Maintenance => "maintenance",
            AircraftStatus::Grounded => "grounded",
        }
    }
}

impl fmt::Display for AircraftStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AircraftStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AircraftStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| ValidationError::InvalidStatus(s.to_string()))
    }
}

impl TryFrom<String> for AircraftStatus {
    type Error = ValidationError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// How `utilization_hours` is read when checking whether maintenance is due.
///
/// The reference model compares the recorded hours directly against the
/// threshold even though the field is described as a daily rate. Both
/// readings are kept so scenarios can choose explicitly.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UtilizationBasis {
    /// `utilization_hours` is an accumulated counter compared as-is.
    #[default]
    Cumulative,
    /// `utilization_hours` is block hours per day, accrued since the last check.
    DailyRate,
}

/// Thresholds for the maintenance-due check.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MaintenancePolicy {
    /// Days since last maintenance at which a check is due.
    #[serde(default = "MaintenancePolicy::default_interval_days")]
    pub interval_days: i64,
    /// Accrued block hours at which a check is due.
    #[serde(default = "MaintenancePolicy::default_hours_threshold")]
    pub hours_threshold: Decimal,
    /// Interpretation of `utilization_hours`.
    #[serde(default)]
    pub utilization_basis: UtilizationBasis,
}

impl MaintenancePolicy {
    fn default_interval_days() -> i64 {
        30
    }

    fn default_hours_threshold() -> Decimal {
        Decimal::new(100, 0)
    }
}

impl Default for MaintenancePolicy {
    fn default() -> Self {
        Self {
            interval_days: Self::default_interval_days(),
            hours_threshold: Self::default_hours_threshold(),
            utilization_basis: UtilizationBasis::default(),
        }
    }
}

/// A single tail in the fleet.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Aircraft {
    /// Unique registration.
    pub registration: Registration,
    /// Aircraft model.
    #[serde(rename = "type", alias = "aircraft_type")]
    pub aircraft_type: AircraftType,
    /// Age in years (>= 0).
    #[serde(alias = "age")]
    pub age_years: Decimal,
    /// Date the airframe joined the fleet.
    #[serde(alias = "purchase_date")]
    pub acquisition_date: NaiveDate,
    /// Date of the last completed maintenance check.
    pub last_maintenance: NaiveDate,
    /// Date of the next scheduled check.
    pub next_maintenance: NaiveDate,
    /// Operational status.
    #[serde(default)]
    pub status: AircraftStatus,
    /// Daily block hours (>= 0).
    pub utilization_hours: Decimal,
    /// Fuel burn in liters per block hour (>= 0).
    #[serde(alias = "fuel_efficiency")]
    pub fuel_efficiency_lph: Decimal,
    /// Passenger seats.
    pub seating_capacity: u32,
    /// Cargo capacity in kg (>= 0).
    #[serde(alias = "cargo_capacity")]
    pub cargo_capacity_kg: Decimal,
}

impl Aircraft {
    /// Estimated maintenance cost, growing 10% per year of age and 5% per
    /// daily block hour.
    pub fn maintenance_cost(&self) -> Decimal {
        let age_factor = Decimal::ONE + self.age_years * Decimal::new(1, 1);
        let utilization_factor = Decimal::ONE + self.utilization_hours * Decimal::new(5, 2);
        Decimal::new(BASE_MAINTENANCE_COST_USD, 0) * age_factor * utilization_factor
    }

    /// Liters of fuel burned over `block_hours`.
    pub fn fuel_consumption(&self, block_hours: Decimal) -> Decimal {
        block_hours * self.fuel_efficiency_lph
    }

    /// Whether a maintenance check is due as of `as_of`.
    pub fn needs_maintenance(&self, as_of: NaiveDate, policy: &MaintenancePolicy) -> bool {
        let days = as_of.signed_duration_since(self.last_maintenance).num_days();
        if days >= policy.interval_days {
            return true;
        }
        let accrued = match policy.utilization_basis {
            UtilizationBasis::Cumulative => self.utilization_hours,
            UtilizationBasis::DailyRate => self.utilization_hours * Decimal::from(days.max(0)),
        };
        accrued >= policy.hours_threshold
    }

    pub fn is_active(&self) -> bool {
        self.status == AircraftStatus::Active
    }

    /// Set the status in place. Setting the current status again is a no-op.
    pub fn set_status(&mut self, status: AircraftStatus) {
        self.status = status;
    }

    /// Parse and set a status given by name.
    pub fn update_status(&mut self, status: &str) -> Result<(), ValidationError> {
        self.set_status(status.parse()?);
        Ok(())
    }
}

/// Validate a single aircraft record.
pub fn validate_aircraft(a: &Aircraft) -> Result<(), ValidationError> {
    if a.registration.0.trim().is_empty() {
        return Err(ValidationError::EmptyIdentifier("registration"));
    }
    if a.aircraft_type.0.trim().is_empty() {
        return Err(ValidationError::EmptyIdentifier("aircraft type"));
    }
    if a.age_years < Decimal::ZERO {
        return Err(ValidationError::NegativeValue("age"));
    }
    if a.utilization_hours < Decimal::ZERO {
        return Err(ValidationError::NegativeValue("utilization hours"));
    }
    if a.fuel_efficiency_lph < Decimal::ZERO {
        return Err(ValidationError::NegativeValue("fuel efficiency"));
    }
    if a.cargo_capacity_kg < Decimal::ZERO {
        return Err(ValidationError::NegativeValue("cargo capacity"));
    }
    Ok(())
}
