//! Fleet registry: the ordered set of tails owned by the airline.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::aircraft::{
    validate_aircraft, Aircraft, AircraftStatus, AircraftType, MaintenancePolicy, Registration,
};
use crate::ValidationError;

/// Ordered collection of aircraft with unique registrations.
///
/// Order is insertion order; route assignment picks the first matching tail,
/// so it is significant.
#[derive(Clone, Debug, Default)]
pub struct Fleet {
    aircraft: Vec<Aircraft>,
}

/// Point-in-time fleet counts reported each quarter.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FleetStatus {
    pub total_aircraft: usize,
    pub active_aircraft: usize,
    pub maintenance_aircraft: usize,
    pub grounded_aircraft: usize,
    /// Mean daily block hours over active aircraft.
    #[serde(with = "rust_decimal::serde::float")]
    pub average_utilization: Decimal,
    /// Tails whose maintenance check is due at the reporting date.
    #[serde(default)]
    pub due_for_maintenance: usize,
}

impl Fleet {
    /// Build a fleet, validating each record and registration uniqueness.
    pub fn new(aircraft: Vec<Aircraft>) -> Result<Self, ValidationError> {
        let mut fleet = Fleet::default();
        for a in aircraft {
            fleet.add(a)?;
        }
        Ok(fleet)
    }

    pub fn aircraft(&self) -> &[Aircraft] {
        &self.aircraft
    }

    pub fn len(&self) -> usize {
        self.aircraft.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aircraft.is_empty()
    }

    pub fn get(&self, registration: &Registration) -> Option<&Aircraft> {
        self.aircraft.iter().find(|a| &a.registration == registration)
    }

    pub fn get_mut(&mut self, registration: &Registration) -> Option<&mut Aircraft> {
        self.aircraft
            .iter_mut()
            .find(|a| &a.registration == registration)
    }

    fn with_status(&self, status: AircraftStatus) -> impl Iterator<Item = &Aircraft> {
        self.aircraft.iter().filter(move |a| a.status == status)
    }

    /// Active aircraft, optionally restricted to one type.
    pub fn available(&self, aircraft_type: Option<&AircraftType>) -> Vec<&Aircraft> {
        self.with_status(AircraftStatus::Active)
            .filter(|a| aircraft_type.map_or(true, |t| &a.aircraft_type == t))
            .collect()
    }

    pub fn in_maintenance(&self) -> Vec<&Aircraft> {
        self.with_status(AircraftStatus::Maintenance).collect()
    }

    pub fn grounded(&self) -> Vec<&Aircraft> {
        self.with_status(AircraftStatus::Grounded).collect()
    }

    /// First active aircraft of the given type in fleet order.
    pub fn first_available(&self, aircraft_type: &AircraftType) -> Option<&Aircraft> {
        self.with_status(AircraftStatus::Active)
            .find(|a| &a.aircraft_type == aircraft_type)
    }

    /// Maintenance cost summed over every tail, whatever its status.
    pub fn total_maintenance_cost(&self) -> Decimal {
        self.aircraft.iter().map(Aircraft::maintenance_cost).sum()
    }

    /// Daily fuel burn in liters at each tail's current utilization.
    pub fn total_fuel_consumption(&self) -> Decimal {
        self.aircraft
            .iter()
            .map(|a| a.fuel_consumption(a.utilization_hours))
            .sum()
    }

    /// Mean utilization over active aircraft; zero when none are active.
    pub fn utilization(&self) -> Decimal {
        let active: Vec<&Aircraft> = self.with_status(AircraftStatus::Active).collect();
        if active.is_empty() {
            return Decimal::ZERO;
        }
        let total: Decimal = active.iter().map(|a| a.utilization_hours).sum();
        total / Decimal::from(active.len())
    }

    /// Add a tail. Fails if the record is invalid or the registration exists.
    pub fn add(&mut self, aircraft: Aircraft) -> Result<(), ValidationError> {
        validate_aircraft(&aircraft)?;
        if self.get(&aircraft.registration).is_some() {
            return Err(ValidationError::DuplicateRegistration(
                aircraft.registration.0,
            ));
        }
        debug!(registration = %aircraft.registration, kind = %aircraft.aircraft_type, "aircraft added");
        self.aircraft.push(aircraft);
        Ok(())
    }

    /// Remove a tail by registration. Missing registrations are ignored.
    pub fn remove(&mut self, registration: &Registration) -> Option<Aircraft> {
        let idx = self
            .aircraft
            .iter()
            .position(|a| &a.registration == registration)?;
        debug!(%registration, "aircraft removed");
        Some(self.aircraft.remove(idx))
    }

    pub fn due_for_maintenance(
        &self,
        as_of: NaiveDate,
        policy: &MaintenancePolicy,
    ) -> Vec<&Aircraft> {
        self.aircraft
            .iter()
            .filter(|a| a.needs_maintenance(as_of, policy))
            .collect()
    }

    /// Snapshot of status counts and utilization.
    pub fn status(&self, as_of: NaiveDate, policy: &MaintenancePolicy) -> FleetStatus {
        FleetStatus {
            total_aircraft: self.len(),
            active_aircraft: self.with_status(AircraftStatus::Active).count(),
            maintenance_aircraft: self.with_status(AircraftStatus::Maintenance).count(),
            grounded_aircraft: self.with_status(AircraftStatus::Grounded).count(),
            average_utilization: self.utilization(),
            due_for_maintenance: self.due_for_maintenance(as_of, policy).len(),
        }
    }
}

/// Template for `count` identically configured tails, registered as
/// `<registration_prefix><first_number>`, `<registration_prefix><first_number + 1>`, ...
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FleetGroup {
    pub registration_prefix: String,
    pub first_number: u32,
    pub count: u32,
    #[serde(rename = "type", alias = "aircraft_type")]
    pub aircraft_type: AircraftType,
    pub age_years: Decimal,
    pub acquisition_date: NaiveDate,
    pub last_maintenance: NaiveDate,
    pub next_maintenance: NaiveDate,
    #[serde(default)]
    pub status: AircraftStatus,
    pub utilization_hours: Decimal,
    pub fuel_efficiency_lph: Decimal,
    pub seating_capacity: u32,
    pub cargo_capacity_kg: Decimal,
}

impl FleetGroup {
    pub fn expand(&self) -> Vec<Aircraft> {
        (0..self.count)
            .map(|i| Aircraft {
                registration: Registration(format!(
                    "{}{}",
                    self.registration_prefix,
                    self.first_number + i
                )),
                aircraft_type: self.aircraft_type.clone(),
                age_years: self.age_years,
                acquisition_date: self.acquisition_date,
                last_maintenance: self.last_maintenance,
                next_maintenance: self.next_maintenance,
                status: self.status,
                utilization_hours: self.utilization_hours,
                fuel_efficiency_lph: self.fuel_efficiency_lph,
                seating_capacity: self.seating_capacity,
                cargo_capacity_kg: self.cargo_capacity_kg,
            })
            .collect()
    }
}
