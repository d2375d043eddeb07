//! Quarter report snapshot written after every close.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sim_core::{FleetStatus, QuarterId, Registration};
use sim_econ::{FinancialSummary, KeyMetrics};
use std::collections::BTreeMap;

/// Immutable record of one simulated quarter.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QuarterReport {
    pub quarter: QuarterId,
    pub period_start: NaiveDate,
    pub financial_summary: FinancialSummary,
    pub route_performance: RoutePerformance,
    pub fleet_status: FleetStatus,
    pub key_metrics: KeyMetrics,
}

/// Network totals plus per-route detail keyed by `origin-destination`.
///
/// Revenue and cost are per departure; routes without an active aircraft of
/// their type are absent from the details and from the profit lists. Weekly
/// profit and the profit lists come from the route network's own aggregates.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RoutePerformance {
    #[serde(with = "rust_decimal::serde::float")]
    pub total_revenue: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_cost: Decimal,
    #[serde(default, with = "rust_decimal::serde::float")]
    pub total_weekly_profit: Decimal,
    #[serde(default)]
    pub profitable_routes: Vec<String>,
    #[serde(default)]
    pub unprofitable_routes: Vec<String>,
    /// Routes held at frequency zero, flown or not.
    #[serde(default)]
    pub suspended_routes: Vec<String>,
    pub route_details: BTreeMap<String, RouteDetail>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RouteDetail {
    #[serde(with = "rust_decimal::serde::float")]
    pub revenue: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub cost: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub profit: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub weekly_profit: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub load_factor: Decimal,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub break_even_load_factor: Option<Decimal>,
    pub aircraft_registration: Registration,
    pub seats: u32,
}

impl RoutePerformance {
    pub(crate) fn record(&mut self, key: String, detail: RouteDetail) {
        self.total_revenue += detail.revenue;
        self.total_cost += detail.cost;
        self.route_details.insert(key, detail);
    }

    pub fn route_count(&self) -> usize {
        self.route_details.len()
    }
}
