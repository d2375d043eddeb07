//! Quarter interventions: the caller-facing wire format and its validated form.
//!
//! [`InterventionBatch`] mirrors the JSON/YAML structure accepted from callers
//! and scenario files. It is converted as a whole into [`Interventions`]
//! before anything is applied, so an unsupported action or malformed payload
//! anywhere in the batch rejects the quarter up front.

use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sim_core::{
    validate_aircraft, validate_route, Aircraft, AircraftStatus, QuarterId, Registration, Route,
    RouteKey, RouteUpdate, ValidationError,
};
use std::collections::BTreeMap;

use crate::SimError;

/// Interventions to apply, keyed by the quarter they belong to.
pub type Schedule = BTreeMap<QuarterId, InterventionBatch>;

/// One quarter's interventions as supplied by the caller.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct InterventionBatch {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub route_changes: Vec<RouteChangeSpec>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fleet_changes: Vec<FleetChangeSpec>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub financial_changes: Vec<FinancialChangeSpec>,
}

impl InterventionBatch {
    pub fn is_empty(&self) -> bool {
        self.route_changes.is_empty()
            && self.fleet_changes.is_empty()
            && self.financial_changes.is_empty()
    }
}

/// `{action: add|modify, origin, destination, route_data?, modifications?}`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RouteChangeSpec {
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route_data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modifications: Option<BTreeMap<String, Value>>,
}

/// `{action: add|remove|status, aircraft_data?, registration?, status?}`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FleetChangeSpec {
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aircraft_data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registration: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// `{type: liability|asset, category, amount}`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FinancialChangeSpec {
    #[serde(rename = "type")]
    pub kind: String,
    pub category: String,
    pub amount: Decimal,
}

#[derive(Clone, Debug, PartialEq)]
pub enum RouteChange {
    /// Insert or replace a route.
    Upsert(Route),
    /// Change fields of an existing route; a missing route is left alone.
    Modify { key: RouteKey, updates: Vec<RouteUpdate> },
}

#[derive(Clone, Debug, PartialEq)]
pub enum FleetChange {
    Add(Aircraft),
    Remove(Registration),
    SetStatus {
        registration: Registration,
        status: AircraftStatus,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub enum FinancialChange {
    Liability { category: String, amount: Decimal },
    Asset { category: String, amount: Decimal },
}

/// A validated batch, applied in order: routes, then fleet, then finance.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Interventions {
    pub route_changes: Vec<RouteChange>,
    pub fleet_changes: Vec<FleetChange>,
    pub financial_changes: Vec<FinancialChange>,
}

impl Interventions {
    pub fn len(&self) -> usize {
        self.route_changes.len() + self.fleet_changes.len() + self.financial_changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl TryFrom<&InterventionBatch> for Interventions {
    type Error = SimError;

    fn try_from(batch: &InterventionBatch) -> Result<Self, Self::Error> {
        Ok(Interventions {
            route_changes: batch
                .route_changes
                .iter()
                .map(RouteChange::try_from)
                .collect::<Result<_, _>>()?,
            fleet_changes: batch
                .fleet_changes
                .iter()
                .map(FleetChange::try_from)
                .collect::<Result<_, _>>()?,
            financial_changes: batch
                .financial_changes
                .iter()
                .map(FinancialChange::try_from)
                .collect::<Result<_, _>>()?,
        })
    }
}

impl TryFrom<&RouteChangeSpec> for RouteChange {
    type Error = SimError;

    fn try_from(spec: &RouteChangeSpec) -> Result<Self, Self::Error> {
        match spec.action.as_str() {
            "add" => {
                let route: Route = decode(&spec.route_data, "route add requires route_data")?;
                validate_route(&route)?;
                Ok(RouteChange::Upsert(route))
            }
            "modify" => {
                let origin = required(&spec.origin, "route modify requires origin")?;
                let destination =
                    required(&spec.destination, "route modify requires destination")?;
                let updates = spec
                    .modifications
                    .iter()
                    .flatten()
                    .map(|(name, value)| RouteUpdate::parse(name, value))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(RouteChange::Modify {
                    key: RouteKey::new(origin, destination),
                    updates,
                })
            }
            other => Err(SimError::UnsupportedIntervention(format!(
                "route action `{other}`"
            ))),
        }
    }
}

impl TryFrom<&FleetChangeSpec> for FleetChange {
    type Error = SimError;

    fn try_from(spec: &FleetChangeSpec) -> Result<Self, Self::Error> {
        match spec.action.as_str() {
            "add" => {
                let aircraft: Aircraft =
                    decode(&spec.aircraft_data, "aircraft add requires aircraft_data")?;
                validate_aircraft(&aircraft)?;
                Ok(FleetChange::Add(aircraft))
            }
            "remove" => {
                let registration = required(&spec.registration, "aircraft remove requires registration")?;
                Ok(FleetChange::Remove(Registration(registration.to_string())))
            }
            "status" => {
                let registration =
                    required(&spec.registration, "aircraft status requires registration")?;
                let status = required(&spec.status, "aircraft status requires status")?;
                Ok(FleetChange::SetStatus {
                    registration: Registration(registration.to_string()),
                    status: status.parse()?,
                })
            }
            other => Err(SimError::UnsupportedIntervention(format!(
                "fleet action `{other}`"
            ))),
        }
    }
}

impl TryFrom<&FinancialChangeSpec> for FinancialChange {
    type Error = SimError;

    fn try_from(spec: &FinancialChangeSpec) -> Result<Self, Self::Error> {
        let category = spec.category.clone();
        let amount = spec.amount;
        match spec.kind.as_str() {
            "liability" => Ok(FinancialChange::Liability { category, amount }),
            "asset" => Ok(FinancialChange::Asset { category, amount }),
            other => Err(SimError::UnsupportedIntervention(format!(
                "financial change type `{other}`"
            ))),
        }
    }
}

fn required<'a>(field: &'a Option<String>, missing: &str) -> Result<&'a str, ValidationError> {
    field
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ValidationError::Malformed(missing.to_string()))
}

fn decode<T: DeserializeOwned>(payload: &Option<Value>, missing: &str) -> Result<T, ValidationError> {
    let value = payload
        .as_ref()
        .ok_or_else(|| ValidationError::Malformed(missing.to_string()))?;
    serde_json::from_value(value.clone()).map_err(|e| ValidationError::Malformed(e.to_string()))
}
