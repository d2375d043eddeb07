//! Quarter orchestrator.

use sim_core::{
    validate_route, Fleet, MaintenancePolicy, QuarterCalendar, QuarterId, Route, RouteNetwork,
    ValidationError,
};
use sim_econ::{CostAllocation, EconError, Ledger, QuarterInputs};
use tracing::{debug, info, warn};

use crate::config::ScenarioConfig;
use crate::intervention::{
    FinancialChange, FleetChange, InterventionBatch, Interventions, RouteChange, Schedule,
};
use crate::report::{QuarterReport, RouteDetail, RoutePerformance};
use crate::{RunError, SimError};

/// Where the orchestrator is in the quarter cycle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Phase {
    Idle,
    /// Held only while `advance_quarter` stages a quarter. The call replaces
    /// it before returning, so callers never observe it.
    QuarterInProgress(QuarterId),
    QuarterClosed(QuarterId),
}

/// Mutable state replaced wholesale when a quarter commits.
#[derive(Clone, Debug)]
struct SimState {
    fleet: Fleet,
    network: RouteNetwork,
    ledger: Ledger,
}

/// Single-scenario simulation. Owns its fleet, network and ledger exclusively.
pub struct Simulation {
    state: SimState,
    allocation: Box<dyn CostAllocation>,
    maintenance: MaintenancePolicy,
    calendar: QuarterCalendar,
    phase: Phase,
}

impl Simulation {
    /// Build a simulation from a scenario, validating every record and policy.
    ///
    /// The scenario's schedule is not consumed here; pass it to [`Simulation::run`].
    pub fn new(config: ScenarioConfig) -> Result<Self, SimError> {
        config.cost_allocation.validate()?;
        let fleet = config.fleet.build()?;
        let network = RouteNetwork::new(config.routes)?;
        let ledger = Ledger::new(config.ledger)?;
        info!(
            scenario = %config.name,
            start = %config.start_date,
            aircraft = fleet.len(),
            routes = network.len(),
            "simulation initialized"
        );
        Ok(Self {
            state: SimState {
                fleet,
                network,
                ledger,
            },
            allocation: Box::new(config.cost_allocation),
            maintenance: config.maintenance,
            calendar: QuarterCalendar::starting(config.start_date),
            phase: Phase::Idle,
        })
    }

    /// Replace the cost allocation policy.
    pub fn with_cost_allocation(mut self, policy: impl CostAllocation + 'static) -> Self {
        self.allocation = Box::new(policy);
        self
    }

    pub fn fleet(&self) -> &Fleet {
        &self.state.fleet
    }

    pub fn network(&self) -> &RouteNetwork {
        &self.state.network
    }

    pub fn ledger(&self) -> &Ledger {
        &self.state.ledger
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn calendar(&self) -> &QuarterCalendar {
        &self.calendar
    }

    /// Apply `batch`, price the network, close `quarter` and report on it.
    ///
    /// The batch is validated as a whole and applied to a staged copy of the
    /// state; on any error nothing changes, including the phase and the
    /// calendar cursor.
    ///
    /// The report's period start is the fixed start of `quarter` on the
    /// calendar. The cursor moves past `quarter` when it is at or after the
    /// cursor; closing an earlier quarter again leaves the cursor where it is.
    pub fn advance_quarter(
        &mut self,
        quarter: &QuarterId,
        batch: &InterventionBatch,
    ) -> Result<QuarterReport, SimError> {
        let previous = std::mem::replace(
            &mut self.phase,
            Phase::QuarterInProgress(quarter.clone()),
        );
        match self.stage_quarter(quarter, batch) {
            Ok((state, calendar, report)) => {
                self.state = state;
                self.calendar = calendar;
                self.phase = Phase::QuarterClosed(quarter.clone());
                info!(
                    %quarter,
                    revenue = %report.financial_summary.revenue,
                    net_income = %report.financial_summary.net_income,
                    routes = report.route_performance.route_count(),
                    "quarter closed"
                );
                Ok(report)
            }
            Err(e) => {
                warn!(%quarter, error = %e, "quarter aborted; state unchanged");
                self.phase = previous;
                Err(e)
            }
        }
    }

    /// Advance `quarters` consecutive quarters from the calendar cursor,
    /// looking up each quarter's interventions in `schedule`.
    ///
    /// Stops at the first failing quarter. Quarters closed before it stay
    /// committed and their reports travel with the error.
    pub fn run(
        &mut self,
        quarters: u32,
        schedule: &Schedule,
    ) -> Result<Vec<QuarterReport>, RunError> {
        let mut reports = Vec::with_capacity(quarters as usize);
        for _ in 0..quarters {
            match self.advance_scheduled(schedule) {
                Ok(report) => reports.push(report),
                Err(source) => {
                    return Err(RunError {
                        completed: reports,
                        source,
                    })
                }
            }
        }
        Ok(reports)
    }

    /// Close the quarter under the calendar cursor with its scheduled batch.
    pub fn advance_scheduled(&mut self, schedule: &Schedule) -> Result<QuarterReport, SimError> {
        let none = InterventionBatch::default();
        let quarter = self.calendar.current();
        let batch = schedule.get(&quarter).unwrap_or(&none);
        self.advance_quarter(&quarter, batch)
    }

    fn stage_quarter(
        &self,
        quarter: &QuarterId,
        batch: &InterventionBatch,
    ) -> Result<(SimState, QuarterCalendar, QuarterReport), SimError> {
        let period_start = self.calendar.period_start_of(quarter)?;
        let plan = Interventions::try_from(batch)?;
        debug!(%quarter, interventions = plan.len(), "applying interventions");

        let mut staged = self.state.clone();
        staged.apply(&plan)?;

        let performance = staged.route_performance();
        let split = self.allocation.allocate(performance.total_cost);
        let inputs = QuarterInputs {
            revenue: performance.total_revenue,
            operating_cost: performance.total_cost,
            fuel_cost: split.fuel,
            maintenance_cost: staged.fleet.total_maintenance_cost(),
            labor_cost: split.labor,
            airport_cost: split.airport,
            other_cost: split.other,
        };
        let metrics = staged.ledger.close_quarter(quarter, &inputs)?;

        let report = QuarterReport {
            quarter: quarter.clone(),
            period_start,
            financial_summary: metrics.summary(),
            route_performance: performance,
            fleet_status: staged.fleet.status(period_start, &self.maintenance),
            key_metrics: metrics.key_metrics(),
        };

        let mut calendar = self.calendar.clone();
        calendar.advance_past(quarter)?;
        Ok((staged, calendar, report))
    }
}

impl SimState {
    /// Routes first, then fleet, then finance; each list in order.
    fn apply(&mut self, plan: &Interventions) -> Result<(), SimError> {
        for change in &plan.route_changes {
            self.apply_route_change(change)?;
        }
        for change in &plan.fleet_changes {
            self.apply_fleet_change(change)?;
        }
        for change in &plan.financial_changes {
            self.apply_financial_change(change)?;
        }
        Ok(())
    }

    fn apply_route_change(&mut self, change: &RouteChange) -> Result<(), ValidationError> {
        match change {
            RouteChange::Upsert(route) => {
                if self.network.upsert(route.clone())?.is_some() {
                    debug!(route = %route.key(), "route replaced");
                }
            }
            RouteChange::Modify { key, updates } => {
                let Some(route) = self.network.get_mut(&key.origin, &key.destination) else {
                    debug!(route = %key, "modify skipped; route not in network");
                    return Ok(());
                };
                for update in updates {
                    update.apply(route);
                }
                validate_route(route)?;
            }
        }
        Ok(())
    }

    fn apply_fleet_change(&mut self, change: &FleetChange) -> Result<(), ValidationError> {
        match change {
            FleetChange::Add(aircraft) => self.fleet.add(aircraft.clone())?,
            FleetChange::Remove(registration) => {
                if self.fleet.remove(registration).is_none() {
                    debug!(%registration, "remove skipped; aircraft not in fleet");
                }
            }
            FleetChange::SetStatus {
                registration,
                status,
            } => match self.fleet.get_mut(registration) {
                Some(aircraft) => aircraft.set_status(*status),
                None => debug!(%registration, "status change skipped; aircraft not in fleet"),
            },
        }
        Ok(())
    }

    fn apply_financial_change(&mut self, change: &FinancialChange) -> Result<(), EconError> {
        // Unknown buckets are logged by the ledger.
        match change {
            FinancialChange::Liability { category, amount } => {
                self.ledger.apply_liability_delta(category, *amount)?;
            }
            FinancialChange::Asset { category, amount } => {
                self.ledger.apply_asset_delta(category, *amount)?;
            }
        }
        Ok(())
    }

    /// Price every route with the first active aircraft of its type.
    fn route_performance(&self) -> RoutePerformance {
        let seats_for = |r: &Route| {
            self.fleet
                .first_available(&r.aircraft_type)
                .map(|a| a.seating_capacity)
        };
        let keys = |routes: Vec<&Route>| -> Vec<String> {
            routes.into_iter().map(|r| r.key().to_string()).collect()
        };
        let mut performance = RoutePerformance {
            total_weekly_profit: self.network.total_weekly_profit(seats_for),
            profitable_routes: keys(self.network.profitable_routes(seats_for)),
            unprofitable_routes: keys(self.network.unprofitable_routes(seats_for)),
            suspended_routes: keys(self.network.suspended()),
            ..RoutePerformance::default()
        };
        for (key, route) in self.network.routes() {
            let Some(aircraft) = self.fleet.first_available(&route.aircraft_type) else {
                debug!(route = %key, aircraft_type = %route.aircraft_type, "no active aircraft; route not flown");
                continue;
            };
            let seats = aircraft.seating_capacity;
            performance.record(
                key.to_string(),
                RouteDetail {
                    revenue: route.revenue(seats),
                    cost: route.operating_cost(seats),
                    profit: route.profit(seats),
                    weekly_profit: route.weekly_profit(seats),
                    load_factor: route.load_factor,
                    break_even_load_factor: route.break_even_load_factor(seats),
                    aircraft_registration: aircraft.registration.clone(),
                    seats,
                },
            );
        }
        if performance.total_revenue.is_zero() && !self.network.is_empty() {
            debug!(routes = self.network.len(), "no route flown this quarter");
        }
        performance
    }
}

impl std::fmt::Debug for Simulation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulation")
            .field("phase", &self.phase)
            .field("calendar", &self.calendar)
            .field("aircraft", &self.state.fleet.len())
            .field("routes", &self.state.network.len())
            .field("cash", &self.state.ledger.cash())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use proptest::prelude::*;
    use rust_decimal::Decimal;
    use serde_json::json;
    use sim_core::{Aircraft, AircraftStatus, AircraftType, Registration, Route};
    use sim_econ::{CostSplit, LedgerConfig, AIRCRAFT_LOANS, CASH};
    use std::collections::BTreeMap;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn aircraft(reg: &str, ty: &str, seats: u32) -> Aircraft {
        Aircraft {
            registration: Registration::from(reg),
            aircraft_type: AircraftType::from(ty),
            age_years: Decimal::ZERO,
            acquisition_date: date(2024, 1, 1),
            last_maintenance: date(2025, 1, 1),
            next_maintenance: date(2025, 4, 1),
            status: AircraftStatus::Active,
            utilization_hours: Decimal::ZERO,
            fuel_efficiency_lph: Decimal::from(1000),
            seating_capacity: seats,
            cargo_capacity_kg: Decimal::ZERO,
        }
    }

    fn route(origin: &str, destination: &str, ty: &str) -> Route {
        serde_json::from_value(json!({
            "origin": origin,
            "destination": destination,
            "distance_km": 1000,
            "block_time_hours": 2,
            "weekly_frequency": 7,
            "aircraft_type": ty,
            "load_factor": 0.8,
            "yield_per_rpk": 0.1,
            "cost_per_ask": 0.05
        }))
        .unwrap()
    }

    /// One 100-seat type X aircraft flying A-B.
    fn single_route() -> ScenarioConfig {
        let mut config = ScenarioConfig::new(date(2025, 1, 1));
        config.name = "single route".into();
        config.fleet.aircraft = vec![aircraft("X-1", "X", 100)];
        config.routes = vec![route("A", "B", "X")];
        config
    }

    /// No fleet, no routes, no debt, no aircraft book value.
    fn cash_only(cash: i64) -> ScenarioConfig {
        let mut config = ScenarioConfig::new(date(2025, 1, 1));
        config.ledger = LedgerConfig {
            liabilities: BTreeMap::new(),
            assets: BTreeMap::from([(CASH.to_string(), Decimal::from(cash))]),
            ..LedgerConfig::default()
        };
        config
    }

    fn batch(value: serde_json::Value) -> InterventionBatch {
        serde_json::from_value(value).unwrap()
    }

    fn q(s: &str) -> QuarterId {
        QuarterId::from(s)
    }

    #[test]
    fn single_route_economics() {
        let mut sim = Simulation::new(single_route()).unwrap();
        let report = sim
            .advance_quarter(&q("2025-Q1"), &InterventionBatch::default())
            .unwrap();
        let detail = &report.route_performance.route_details["A-B"];
        assert_eq!(detail.revenue, Decimal::from(8000));
        assert_eq!(detail.cost, Decimal::from(5000));
        assert_eq!(detail.profit, Decimal::from(3000));
        assert_eq!(detail.weekly_profit, Decimal::from(21000));
        assert_eq!(detail.seats, 100);
        assert_eq!(detail.aircraft_registration, Registration::from("X-1"));
        assert_eq!(detail.break_even_load_factor, Some(Decimal::new(5, 1)));
        assert_eq!(report.route_performance.total_revenue, Decimal::from(8000));
        assert_eq!(report.route_performance.total_cost, Decimal::from(5000));
        assert_eq!(report.route_performance.total_weekly_profit, Decimal::from(21000));
        assert_eq!(report.route_performance.profitable_routes, vec!["A-B".to_string()]);
        assert!(report.route_performance.unprofitable_routes.is_empty());
        assert!(report.route_performance.suspended_routes.is_empty());
        assert_eq!(report.financial_summary.ebitda, Decimal::from(3000));
        assert_eq!(report.period_start, date(2025, 1, 1));
        assert_eq!(sim.phase(), &Phase::QuarterClosed(q("2025-Q1")));

        let metrics = sim.ledger().metrics(&q("2025-Q1")).unwrap();
        assert_eq!(metrics.fuel_cost, Decimal::from(1500));
        assert_eq!(metrics.labor_cost, Decimal::from(1250));
        assert_eq!(metrics.airport_cost, Decimal::from(750));
        assert_eq!(metrics.other_cost, Decimal::from(500));
        assert_eq!(
            metrics.maintenance_cost,
            sim.fleet().total_maintenance_cost()
        );
    }

    #[test]
    fn removed_aircraft_leaves_route_unflown() {
        let mut sim = Simulation::new(single_route()).unwrap();
        let report = sim
            .advance_quarter(
                &q("2025-Q1"),
                &batch(json!({"fleet_changes": [{"action": "remove", "registration": "X-1"}]})),
            )
            .unwrap();
        assert!(sim.fleet().is_empty());
        assert!(report.route_performance.route_details.is_empty());
        assert_eq!(report.route_performance.total_revenue, Decimal::ZERO);
        assert_eq!(report.route_performance.total_cost, Decimal::ZERO);
        assert_eq!(report.fleet_status.total_aircraft, 0);
        // The route itself stays in the network.
        assert!(sim.network().get("A", "B").is_some());
    }

    #[test]
    fn grounded_aircraft_are_not_assigned() {
        let mut config = single_route();
        config.fleet.aircraft.push(aircraft("X-2", "X", 150));
        let mut sim = Simulation::new(config).unwrap();
        let report = sim
            .advance_quarter(
                &q("2025-Q1"),
                &batch(json!({"fleet_changes": [
                    {"action": "status", "registration": "X-1", "status": "grounded"},
                    {"action": "status", "registration": "X-404", "status": "maintenance"}
                ]})),
            )
            .unwrap();
        let detail = &report.route_performance.route_details["A-B"];
        assert_eq!(detail.aircraft_registration, Registration::from("X-2"));
        assert_eq!(detail.seats, 150);
        assert_eq!(report.fleet_status.grounded_aircraft, 1);
        assert_eq!(report.fleet_status.active_aircraft, 1);
    }

    #[test]
    fn cash_delta_moves_cash_exactly() {
        let mut sim = Simulation::new(cash_only(5_000_000)).unwrap();
        let report = sim
            .advance_quarter(
                &q("2025-Q1"),
                &batch(json!({"financial_changes": [
                    {"type": "asset", "category": "cash", "amount": -1000000}
                ]})),
            )
            .unwrap();
        assert_eq!(report.financial_summary.net_income, Decimal::ZERO);
        assert_eq!(sim.ledger().cash(), Decimal::from(4_000_000));
    }

    #[test]
    fn interventions_apply_routes_then_fleet_then_finance() {
        let mut sim = Simulation::new(single_route()).unwrap();
        let loans = sim.ledger().liability(AIRCRAFT_LOANS);
        let report = sim
            .advance_quarter(
                &q("2025-Q1"),
                &batch(json!({
                    "route_changes": [
                        {"action": "add", "route_data": {
                            "origin": "B", "destination": "C", "distance": 500,
                            "flight_time": 1, "frequency": 14, "aircraft_type": "Y",
                            "load_factor": 0.7, "yield_per_rpk": 0.12,
                            "operating_cost_per_ask": 0.06}},
                        {"action": "modify", "origin": "A", "destination": "B",
                         "modifications": {"frequency": 0}},
                        {"action": "modify", "origin": "Z", "destination": "Q",
                         "modifications": {"frequency": 3}}
                    ],
                    "fleet_changes": [
                        {"action": "add", "aircraft_data": {
                            "registration": "Y-1", "type": "Y", "age": 2,
                            "purchase_date": "2023-01-01", "last_maintenance": "2025-01-01",
                            "next_maintenance": "2025-04-01", "utilization_hours": 8,
                            "fuel_efficiency": 900, "seating_capacity": 50,
                            "cargo_capacity": 1000}}
                    ],
                    "financial_changes": [
                        {"type": "liability", "category": "aircraft_loans", "amount": -40000000},
                        {"type": "liability", "category": "no_such_bucket", "amount": 1}
                    ]
                })),
            )
            .unwrap();

        let details = &report.route_performance.route_details;
        assert_eq!(details.len(), 2);
        assert_eq!(details["A-B"].weekly_profit, Decimal::ZERO);
        assert_eq!(details["B-C"].aircraft_registration, Registration::from("Y-1"));
        assert!(sim.network().get("Z", "Q").is_none());
        let performance = &report.route_performance;
        assert_eq!(performance.suspended_routes, vec!["A-B".to_string()]);
        assert_eq!(performance.unprofitable_routes, vec!["A-B".to_string()]);
        assert_eq!(performance.profitable_routes, vec!["B-C".to_string()]);
        assert_eq!(performance.total_weekly_profit, details["B-C"].weekly_profit);
        assert_eq!(
            sim.ledger().liability(AIRCRAFT_LOANS),
            loans - Decimal::from(40_000_000)
        );
        assert!(!sim.ledger().liabilities().contains_key("no_such_bucket"));
    }

    #[test]
    fn failed_quarter_leaves_state_untouched() {
        let mut sim = Simulation::new(single_route()).unwrap();
        let cash = sim.ledger().cash();
        let loans = sim.ledger().liability(AIRCRAFT_LOANS);
        let bad = batch(json!({
            "route_changes": [
                {"action": "modify", "origin": "A", "destination": "B",
                 "modifications": {"frequency": 1}}
            ],
            "fleet_changes": [
                {"action": "add", "aircraft_data": {
                    "registration": "X-1", "type": "X", "age": 1,
                    "purchase_date": "2023-01-01", "last_maintenance": "2025-01-01",
                    "next_maintenance": "2025-04-01", "utilization_hours": 1,
                    "fuel_efficiency": 900, "seating_capacity": 50,
                    "cargo_capacity": 0}}
            ],
            "financial_changes": [
                {"type": "liability", "category": "aircraft_loans", "amount": -1}
            ]
        }));
        let err = sim.advance_quarter(&q("2025-Q1"), &bad).unwrap_err();
        assert!(matches!(
            err,
            SimError::Validation(ValidationError::DuplicateRegistration(_))
        ));
        assert_eq!(sim.phase(), &Phase::Idle);
        assert_eq!(sim.calendar().current(), q("2025-Q1"));
        assert_eq!(sim.ledger().cash(), cash);
        assert_eq!(sim.ledger().liability(AIRCRAFT_LOANS), loans);
        assert!(sim.ledger().history().is_empty());
        assert_eq!(sim.network().get("A", "B").unwrap().weekly_frequency, 7);
        assert_eq!(sim.fleet().len(), 1);
    }

    #[test]
    fn out_of_range_modification_is_rejected() {
        let mut sim = Simulation::new(single_route()).unwrap();
        sim.advance_quarter(&q("2025-Q1"), &InterventionBatch::default())
            .unwrap();
        let err = sim
            .advance_quarter(
                &q("2025-Q2"),
                &batch(json!({"route_changes": [
                    {"action": "modify", "origin": "A", "destination": "B",
                     "modifications": {"load_factor": 1.5}}
                ]})),
            )
            .unwrap_err();
        assert!(matches!(err, SimError::Validation(_)));
        assert_eq!(sim.phase(), &Phase::QuarterClosed(q("2025-Q1")));
        assert_eq!(
            sim.network().get("A", "B").unwrap().load_factor,
            Decimal::new(8, 1)
        );
    }

    #[test]
    fn unsupported_action_fails_fast() {
        let mut sim = Simulation::new(single_route()).unwrap();
        let err = sim
            .advance_quarter(
                &q("2025-Q1"),
                &batch(json!({"route_changes": [{"action": "delete", "origin": "A", "destination": "B"}]})),
            )
            .unwrap_err();
        assert!(matches!(err, SimError::UnsupportedIntervention(_)));
        assert_eq!(sim.phase(), &Phase::Idle);
        assert!(sim.ledger().history().is_empty());
    }

    #[test]
    fn run_labels_quarters_and_reads_schedule() {
        let mut config = cash_only(1_000);
        config.start_date = date(2024, 11, 15);
        let schedule = Schedule::from([(
            q("2025-Q1"),
            batch(json!({"financial_changes": [{"type": "asset", "category": "cash", "amount": -100}]})),
        )]);
        let mut sim = Simulation::new(config).unwrap();
        let reports = sim.run(3, &schedule).unwrap();
        let labels: Vec<&str> = reports.iter().map(|r| r.quarter.as_str()).collect();
        assert_eq!(labels, vec!["2024-Q4", "2025-Q1", "2025-Q2"]);
        assert_eq!(reports[1].period_start, date(2025, 2, 13));
        assert_eq!(sim.ledger().cash(), Decimal::from(900));

        // The cursor carries over into the next run.
        let more = sim.run(1, &schedule).unwrap();
        assert_eq!(more[0].quarter, q("2025-Q3"));
        assert_eq!(sim.ledger().cash(), Decimal::from(900));
        assert_eq!(sim.ledger().history().len(), 4);
    }

    #[test]
    fn unflown_routes_stay_out_of_profit_lists() {
        let mut config = single_route();
        config.routes.push(route("C", "D", "Z"));
        let mut sim = Simulation::new(config).unwrap();
        let report = sim
            .advance_quarter(&q("2025-Q1"), &InterventionBatch::default())
            .unwrap();
        let performance = &report.route_performance;
        assert_eq!(performance.profitable_routes, vec!["A-B".to_string()]);
        assert!(performance.unprofitable_routes.is_empty());
        assert_eq!(performance.total_weekly_profit, Decimal::from(21000));
    }

    #[test]
    fn failed_run_returns_completed_quarters() {
        let schedule = Schedule::from([
            (
                q("2025-Q1"),
                batch(json!({"financial_changes": [{"type": "asset", "category": "cash", "amount": -100}]})),
            ),
            (
                q("2025-Q2"),
                batch(json!({"route_changes": [{"action": "delete", "origin": "A", "destination": "B"}]})),
            ),
        ]);
        let mut sim = Simulation::new(cash_only(1_000)).unwrap();
        let err = sim.run(3, &schedule).unwrap_err();
        let labels: Vec<&str> = err.completed.iter().map(|r| r.quarter.as_str()).collect();
        assert_eq!(labels, vec!["2025-Q1"]);
        assert!(matches!(err.source, SimError::UnsupportedIntervention(_)));
        assert!(err.to_string().starts_with("run stopped after 1 closed quarter(s)"));
        assert_eq!(sim.ledger().cash(), Decimal::from(900));
        assert_eq!(sim.phase(), &Phase::QuarterClosed(q("2025-Q1")));
        assert_eq!(sim.calendar().current(), q("2025-Q2"));
    }

    #[test]
    fn reclosing_a_past_quarter_keeps_its_period_and_the_cursor() {
        let none = InterventionBatch::default();
        let mut sim = Simulation::new(cash_only(1_000)).unwrap();
        let first = sim.advance_quarter(&q("2025-Q1"), &none).unwrap();
        let again = sim.advance_quarter(&q("2025-Q1"), &none).unwrap();
        assert_eq!(first.period_start, date(2025, 1, 1));
        assert_eq!(again.period_start, date(2025, 1, 1));
        assert_eq!(sim.calendar().current(), q("2025-Q2"));

        let next = sim.run(1, &Schedule::new()).unwrap();
        assert_eq!(next[0].quarter, q("2025-Q2"));
        assert_eq!(next[0].period_start, date(2025, 4, 1));

        // Closing 2025-Q1 after 2025-Q2 does not rewind the cursor.
        let late = sim.advance_quarter(&q("2025-Q1"), &none).unwrap();
        assert_eq!(late.period_start, date(2025, 1, 1));
        assert_eq!(sim.calendar().current(), q("2025-Q3"));
    }

    #[test]
    fn closing_a_future_quarter_jumps_the_cursor() {
        let mut sim = Simulation::new(cash_only(1_000)).unwrap();
        let report = sim
            .advance_quarter(&q("2026-Q3"), &InterventionBatch::default())
            .unwrap();
        assert_eq!(report.period_start, date(2026, 6, 25));
        assert_eq!(sim.calendar().current(), q("2026-Q4"));

        let err = sim
            .advance_quarter(&q("26-Q9"), &InterventionBatch::default())
            .unwrap_err();
        assert!(matches!(err, SimError::Validation(_)));
        assert_eq!(sim.phase(), &Phase::QuarterClosed(q("2026-Q3")));
        assert_eq!(sim.calendar().current(), q("2026-Q4"));
    }

    #[test]
    fn overflowing_cash_change_aborts_the_quarter() {
        let mut config = cash_only(0);
        config.ledger.assets.insert(CASH.to_string(), Decimal::MAX);
        let mut sim = Simulation::new(config).unwrap();
        let err = sim
            .advance_quarter(
                &q("2025-Q1"),
                &batch(json!({"financial_changes": [
                    {"type": "asset", "category": "cash", "amount": 1}
                ]})),
            )
            .unwrap_err();
        assert!(matches!(err, SimError::Econ(EconError::Overflow(_))));
        assert_eq!(sim.ledger().cash(), Decimal::MAX);
        assert!(sim.ledger().history().is_empty());
        assert_eq!(sim.phase(), &Phase::Idle);
        assert_eq!(sim.calendar().current(), q("2025-Q1"));
    }

    #[test]
    fn custom_allocation_policy_is_used() {
        let sim = Simulation::new(single_route()).unwrap();
        let mut sim = sim.with_cost_allocation(|cost: Decimal| CostSplit {
            fuel: cost,
            ..CostSplit::default()
        });
        sim.advance_quarter(&q("2025-Q1"), &InterventionBatch::default())
            .unwrap();
        let metrics = sim.ledger().metrics(&q("2025-Q1")).unwrap();
        assert_eq!(metrics.fuel_cost, Decimal::from(5000));
        assert_eq!(metrics.labor_cost, Decimal::ZERO);
    }

    #[test]
    fn invalid_allocation_shares_are_rejected() {
        let mut config = single_route();
        config.cost_allocation.fuel = Decimal::new(90, 2);
        assert!(matches!(Simulation::new(config), Err(SimError::Econ(_))));
    }

    proptest! {
        #[test]
        fn cash_deltas_sum_exactly(amounts in proptest::collection::vec(-1_000_000i64..1_000_000, 0..6)) {
            let mut sim = Simulation::new(cash_only(10_000_000)).unwrap();
            let changes: Vec<_> = amounts
                .iter()
                .map(|a| json!({"type": "asset", "category": "cash", "amount": a}))
                .collect();
            sim.advance_quarter(&q("2025-Q1"), &batch(json!({"financial_changes": changes})))
                .unwrap();
            let expected = Decimal::from(10_000_000 + amounts.iter().sum::<i64>());
            prop_assert_eq!(sim.ledger().cash(), expected);
        }
    }
}
