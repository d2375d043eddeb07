#![deny(warnings)]

//! Quarter-by-quarter simulation runtime.
//!
//! [`Simulation`] owns one fleet, one route network and one ledger. Each call
//! to [`Simulation::advance_quarter`] applies the quarter's interventions,
//! prices every route with the fleet's aircraft, closes the quarter in the
//! ledger and returns an immutable [`QuarterReport`].

use sim_core::ValidationError;
use sim_econ::EconError;
use thiserror::Error;

mod config;
mod engine;
mod intervention;
mod report;

pub use config::{FleetConfig, ScenarioConfig};
pub use engine::{Phase, Simulation};
pub use intervention::{
    FinancialChange, FinancialChangeSpec, FleetChange, FleetChangeSpec, InterventionBatch,
    Interventions, RouteChange, RouteChangeSpec, Schedule,
};
pub use report::{QuarterReport, RouteDetail, RoutePerformance};

/// Errors surfaced by the runtime.
#[derive(Debug, Error)]
pub enum SimError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Econ(#[from] EconError),
    /// Unrecognized intervention action or type.
    #[error("unsupported intervention: {0}")]
    UnsupportedIntervention(String),
    /// Scenario file could not be decoded.
    #[error("invalid scenario: {0}")]
    Config(String),
}

/// A multi-quarter run stopped early. Quarters in `completed` were committed
/// before `source` aborted the next one.
#[derive(Debug, Error)]
#[error("run stopped after {} closed quarter(s): {source}", .completed.len())]
pub struct RunError {
    pub completed: Vec<QuarterReport>,
    #[source]
    pub source: SimError,
}
