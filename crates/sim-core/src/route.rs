//! Route records: per-flight economics of a single origin-destination service.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::aircraft::{Aircraft, AircraftType};
use crate::ValidationError;

/// Composite key of a route, rendered as `origin-destination`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RouteKey {
    pub origin: String,
    pub destination: String,
}

impl RouteKey {
    pub fn new(origin: impl Into<String>, destination: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            destination: destination.into(),
        }
    }
}

impl fmt::Display for RouteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.origin, self.destination)
    }
}

/// Fixed costs incurred on every departure, in USD.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PerFlightCosts {
    #[serde(default, alias = "ground_handling_cost")]
    pub ground_handling: Decimal,
    #[serde(default)]
    pub airport_charges: Decimal,
    #[serde(default, alias = "crew_cost")]
    pub crew: Decimal,
    #[serde(default, alias = "maintenance_cost")]
    pub maintenance: Decimal,
    #[serde(default, alias = "marketing_cost")]
    pub marketing: Decimal,
    #[serde(default, alias = "other_costs")]
    pub other: Decimal,
}

impl PerFlightCosts {
    pub fn total(&self) -> Decimal {
        self.ground_handling
            + self.airport_charges
            + self.crew
            + self.maintenance
            + self.marketing
            + self.other
    }
}

/// A scheduled origin-destination service.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Route {
    /// Origin airport code.
    pub origin: String,
    /// Destination airport code.
    pub destination: String,
    /// Great-circle distance in km.
    #[serde(alias = "distance")]
    pub distance_km: Decimal,
    /// Gate-to-gate time in hours.
    #[serde(alias = "flight_time")]
    pub block_time_hours: Decimal,
    /// Departures per week; zero means suspended.
    #[serde(alias = "frequency")]
    pub weekly_frequency: u32,
    /// Aircraft type flown on the route.
    pub aircraft_type: AircraftType,
    /// Share of seats sold, in [0,1].
    pub load_factor: Decimal,
    /// Revenue per revenue-passenger-km.
    pub yield_per_rpk: Decimal,
    /// Variable cost per available-seat-km.
    #[serde(alias = "operating_cost_per_ask")]
    pub cost_per_ask: Decimal,
    /// Jet fuel price per liter.
    #[serde(default, alias = "fuel_price")]
    pub fuel_price_per_liter: Decimal,
    /// Per-departure fixed costs.
    #[serde(flatten)]
    pub fixed_costs: PerFlightCosts,
}

impl Route {
    pub fn key(&self) -> RouteKey {
        RouteKey::new(self.origin.clone(), self.destination.clone())
    }

    pub fn is_suspended(&self) -> bool {
        self.weekly_frequency == 0
    }

    /// Ticket revenue of one departure: seats × load factor × distance × yield.
    pub fn revenue(&self, seats: u32) -> Decimal {
        Decimal::from(seats) * self.load_factor * self.distance_km * self.yield_per_rpk
    }

    /// Cost of one departure: ASK-driven cost plus the fixed per-flight costs.
    pub fn operating_cost(&self, seats: u32) -> Decimal {
        Decimal::from(seats) * self.distance_km * self.cost_per_ask + self.fixed_costs.total()
    }

    pub fn profit(&self, seats: u32) -> Decimal {
        self.revenue(seats) - self.operating_cost(seats)
    }

    pub fn weekly_profit(&self, seats: u32) -> Decimal {
        self.profit(seats) * Decimal::from(self.weekly_frequency)
    }

    /// Load factor at which revenue covers cost.
    ///
    /// `None` when seats, yield or distance is zero, where the ratio is undefined.
    pub fn break_even_load_factor(&self, seats: u32) -> Option<Decimal> {
        let revenue_per_passenger = self.yield_per_rpk * self.distance_km;
        if seats == 0 || revenue_per_passenger.is_zero() {
            return None;
        }
        let passengers = self
            .operating_cost(seats)
            .checked_div(revenue_per_passenger)?;
        passengers.checked_div(Decimal::from(seats))
    }

    /// Fuel bill of one departure flown by `aircraft`.
    pub fn trip_fuel_cost(&self, aircraft: &Aircraft) -> Decimal {
        aircraft.fuel_consumption(self.block_time_hours) * self.fuel_price_per_liter
    }
}

/// Validate a route record.
pub fn validate_route(r: &Route) -> Result<(), ValidationError> {
    if r.origin.trim().is_empty() {
        return Err(ValidationError::EmptyIdentifier("origin"));
    }
    if r.destination.trim().is_empty() {
        return Err(ValidationError::EmptyIdentifier("destination"));
    }
    if r.aircraft_type.0.trim().is_empty() {
        return Err(ValidationError::EmptyIdentifier("aircraft type"));
    }
    if r.load_factor < Decimal::ZERO || r.load_factor > Decimal::ONE {
        return Err(ValidationError::InvalidLoadFactor);
    }
    let non_negative = [
        ("distance", r.distance_km),
        ("block time", r.block_time_hours),
        ("yield per RPK", r.yield_per_rpk),
        ("cost per ASK", r.cost_per_ask),
        ("fuel price", r.fuel_price_per_liter),
        ("ground handling cost", r.fixed_costs.ground_handling),
        ("airport charges", r.fixed_costs.airport_charges),
        ("crew cost", r.fixed_costs.crew),
        ("maintenance cost", r.fixed_costs.maintenance),
        ("marketing cost", r.fixed_costs.marketing),
        ("other costs", r.fixed_costs.other),
    ];
    for (name, value) in non_negative {
        if value < Decimal::ZERO {
            return Err(ValidationError::NegativeValue(name));
        }
    }
    Ok(())
}

/// Route attributes that a modification may change. Identity fields are not
/// modifiable.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RouteField {
    DistanceKm,
    BlockTimeHours,
    WeeklyFrequency,
    AircraftType,
    LoadFactor,
    YieldPerRpk,
    CostPerAsk,
    FuelPricePerLiter,
    GroundHandling,
    AirportCharges,
    Crew,
    Maintenance,
    Marketing,
    Other,
}

impl RouteField {
    pub fn as_str(self) -> &'static str {
        match self {
            RouteField::DistanceKm => "distance_km",
            RouteField::BlockTimeHours => "block_time_hours",
            RouteField::WeeklyFrequency => "weekly_frequency",
            RouteField::AircraftType => "aircraft_type",
            RouteField::LoadFactor => "load_factor",
            RouteField::YieldPerRpk => "yield_per_rpk",
            RouteField::CostPerAsk => "cost_per_ask",
            RouteField::FuelPricePerLiter => "fuel_price_per_liter",
            RouteField::GroundHandling => "ground_handling",
            RouteField::AirportCharges => "airport_charges",
            RouteField::Crew => "crew",
            RouteField::Maintenance => "maintenance",
            RouteField::Marketing => "marketing",
            RouteField::Other => "other",
        }
    }
}

impl FromStr for RouteField {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let field = match s {
            "distance_km" | "distance" => RouteField::DistanceKm,
            "block_time_hours" | "flight_time" => RouteField::BlockTimeHours,
            "weekly_frequency" | "frequency" => RouteField::WeeklyFrequency,
            "aircraft_type" => RouteField::AircraftType,
            "load_factor" => RouteField::LoadFactor,
            "yield_per_rpk" => RouteField::YieldPerRpk,
            "cost_per_ask" | "operating_cost_per_ask" => RouteField::CostPerAsk,
            "fuel_price_per_liter" | "fuel_price" => RouteField::FuelPricePerLiter,
            "ground_handling" | "ground_handling_cost" => RouteField::GroundHandling,
            "airport_charges" => RouteField::AirportCharges,
            "crew" | "crew_cost" => RouteField::Crew,
            "maintenance" | "maintenance_cost" => RouteField::Maintenance,
            "marketing" | "marketing_cost" => RouteField::Marketing,
            "other" | "other_costs" => RouteField::Other,
            _ => return Err(ValidationError::UnknownRouteField(s.to_string())),
        };
        Ok(field)
    }
}

/// A single typed change to a route attribute.
#[derive(Clone, Debug, PartialEq)]
pub enum RouteUpdate {
    /// Set a decimal attribute.
    Amount(RouteField, Decimal),
    WeeklyFrequency(u32),
    AircraftType(AircraftType),
}

impl RouteUpdate {
    /// Decode a `field: value` pair from a modification map.
    pub fn parse(name: &str, value: &Value) -> Result<Self, ValidationError> {
        let field: RouteField = name.parse()?;
        let invalid = |reason: &str| ValidationError::InvalidFieldValue {
            field: name.to_string(),
            reason: reason.to_string(),
        };
        match field {
            RouteField::WeeklyFrequency => value
                .as_u64()
                .and_then(|n| u32::try_from(n).ok())
                .map(RouteUpdate::WeeklyFrequency)
                .ok_or_else(|| invalid("expected a non-negative integer")),
            RouteField::AircraftType => match value.as_str().map(str::trim) {
                Some(t) if !t.is_empty() => Ok(RouteUpdate::AircraftType(AircraftType::from(t))),
                _ => Err(invalid("expected a non-empty aircraft type")),
            },
            _ => {
                let amount: Decimal = serde_json::from_value(value.clone())
                    .map_err(|_| invalid("expected a number"))?;
                if amount < Decimal::ZERO {
                    return Err(invalid("must be non-negative"));
                }
                if field == RouteField::LoadFactor && amount > Decimal::ONE {
                    return Err(invalid("must be within [0,1]"));
                }
                Ok(RouteUpdate::Amount(field, amount))
            }
        }
    }

    pub fn field(&self) -> RouteField {
        match self {
            RouteUpdate::Amount(field, _) => *field,
            RouteUpdate::WeeklyFrequency(_) => RouteField::WeeklyFrequency,
            RouteUpdate::AircraftType(_) => RouteField::AircraftType,
        }
    }

    pub fn apply(&self, route: &mut Route) {
        match self {
            RouteUpdate::WeeklyFrequency(n) => route.weekly_frequency = *n,
            RouteUpdate::AircraftType(t) => route.aircraft_type = t.clone(),
            RouteUpdate::Amount(field, amount) => {
                let slot = match field {
                    RouteField::DistanceKm => &mut route.distance_km,
                    RouteField::BlockTimeHours => &mut route.block_time_hours,
                    RouteField::LoadFactor => &mut route.load_factor,
                    RouteField::YieldPerRpk => &mut route.yield_per_rpk,
                    RouteField::CostPerAsk => &mut route.cost_per_ask,
                    RouteField::FuelPricePerLiter => &mut route.fuel_price_per_liter,
                    RouteField::GroundHandling => &mut route.fixed_costs.ground_handling,
                    RouteField::AirportCharges => &mut route.fixed_costs.airport_charges,
                    RouteField::Crew => &mut route.fixed_costs.crew,
                    RouteField::Maintenance => &mut route.fixed_costs.maintenance,
                    RouteField::Marketing => &mut route.fixed_costs.marketing,
                    RouteField::Other => &mut route.fixed_costs.other,
                    // Non-decimal fields never reach `Amount` through `parse`.
                    RouteField::WeeklyFrequency | RouteField::AircraftType => return,
                };
                *slot = *amount;
            }
        }
    }
}
