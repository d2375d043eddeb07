//! Scenario files: everything needed to seed a simulation.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sim_core::{Aircraft, Fleet, FleetGroup, MaintenancePolicy, Route, ValidationError};
use sim_econ::{FixedShareAllocation, LedgerConfig};
use std::fs;
use std::path::Path;

use crate::intervention::Schedule;
use crate::SimError;

/// Initial state, policies and intervention schedule of one scenario.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScenarioConfig {
    #[serde(default)]
    pub name: String,
    /// First day of the first simulated quarter.
    pub start_date: NaiveDate,
    #[serde(default)]
    pub fleet: FleetConfig,
    #[serde(default)]
    pub routes: Vec<Route>,
    #[serde(default)]
    pub ledger: LedgerConfig,
    #[serde(default)]
    pub maintenance: MaintenancePolicy,
    #[serde(default)]
    pub cost_allocation: FixedShareAllocation,
    #[serde(default)]
    pub schedule: Schedule,
}

/// Fleet composition: templated groups first, then individual tails.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FleetConfig {
    #[serde(default)]
    pub groups: Vec<FleetGroup>,
    #[serde(default)]
    pub aircraft: Vec<Aircraft>,
}

impl FleetConfig {
    pub fn build(&self) -> Result<Fleet, ValidationError> {
        let tails = self
            .groups
            .iter()
            .flat_map(FleetGroup::expand)
            .chain(self.aircraft.iter().cloned())
            .collect();
        Fleet::new(tails)
    }
}

impl ScenarioConfig {
    pub fn new(start_date: NaiveDate) -> Self {
        Self {
            name: String::new(),
            start_date,
            fleet: FleetConfig::default(),
            routes: Vec::new(),
            ledger: LedgerConfig::default(),
            maintenance: MaintenancePolicy::default(),
            cost_allocation: FixedShareAllocation::default(),
            schedule: Schedule::new(),
        }
    }

    pub fn from_yaml(text: &str) -> Result<Self, SimError> {
        serde_yaml::from_str(text).map_err(|e| SimError::Config(e.to_string()))
    }

    pub fn from_json(text: &str) -> Result<Self, SimError> {
        serde_json::from_str(text).map_err(|e| SimError::Config(e.to_string()))
    }

    /// Read a scenario file; `.json` files are parsed as JSON, anything else as YAML.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, SimError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|e| SimError::Config(format!("{}: {e}", path.display())))?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json(&text),
            _ => Self::from_yaml(&text),
        }
    }
}
