//! Balance-sheet ledger and quarter close.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sim_core::QuarterId;
use std::collections::BTreeMap;
use tracing::{debug, warn};

use crate::metrics::{FinancialMetrics, FinancialSummary, KeyMetrics};
use crate::EconError;

/// Liability bucket that accrues interest.
pub const AIRCRAFT_LOANS: &str = "aircraft_loans";
/// Asset bucket that depreciates.
pub const AIRCRAFT_ASSET: &str = "aircraft";
/// Asset bucket that receives net income.
pub const CASH: &str = "cash";

/// Opening balance sheet and financing assumptions.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Named liability buckets in USD.
    pub liabilities: BTreeMap<String, Decimal>,
    /// Named asset buckets in USD.
    pub assets: BTreeMap<String, Decimal>,
    /// Annual interest rate on aircraft loans (e.g. 0.05).
    #[serde(default = "LedgerConfig::default_interest_rate")]
    pub annual_interest_rate: Decimal,
    /// Straight-line useful life of aircraft in years.
    #[serde(default = "LedgerConfig::default_aircraft_life")]
    pub aircraft_life_years: Decimal,
}

impl LedgerConfig {
    fn default_interest_rate() -> Decimal {
        Decimal::new(5, 2)
    }

    fn default_aircraft_life() -> Decimal {
        Decimal::from(20)
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        let liabilities = [
            (AIRCRAFT_LOANS, 1_040_000_000i64),
            ("fuel_payments", 970_000_000),
            ("employee_benefits", 1_075_000_000),
            ("airport_charges", 3_866_000_000),
        ];
        let assets = [
            (AIRCRAFT_ASSET, 2_500_000_000i64),
            (CASH, 50_000_000),
            ("other_assets", 100_000_000),
        ];
        Self {
            liabilities: liabilities
                .into_iter()
                .map(|(k, v)| (k.to_string(), Decimal::from(v)))
                .collect(),
            assets: assets
                .into_iter()
                .map(|(k, v)| (k.to_string(), Decimal::from(v)))
                .collect(),
            annual_interest_rate: Self::default_interest_rate(),
            aircraft_life_years: Self::default_aircraft_life(),
        }
    }
}

/// Revenue and cost figures fed into a quarter close.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct QuarterInputs {
    pub revenue: Decimal,
    pub operating_cost: Decimal,
    pub fuel_cost: Decimal,
    pub maintenance_cost: Decimal,
    pub labor_cost: Decimal,
    pub airport_cost: Decimal,
    pub other_cost: Decimal,
}

impl QuarterInputs {
    pub fn validate(&self) -> Result<(), EconError> {
        let costs = [
            ("operating", self.operating_cost),
            ("fuel", self.fuel_cost),
            ("maintenance", self.maintenance_cost),
            ("labor", self.labor_cost),
            ("airport", self.airport_cost),
            ("other", self.other_cost),
        ];
        for (name, value) in costs {
            if value < Decimal::ZERO {
                return Err(EconError::NegativeCost(name));
            }
        }
        Ok(())
    }
}

/// Running balance sheet plus the history of closed quarters.
#[derive(Clone, Debug)]
pub struct Ledger {
    liabilities: BTreeMap<String, Decimal>,
    assets: BTreeMap<String, Decimal>,
    annual_interest_rate: Decimal,
    aircraft_life_years: Decimal,
    history: BTreeMap<QuarterId, FinancialMetrics>,
}

impl Ledger {
    pub fn new(config: LedgerConfig) -> Result<Self, EconError> {
        if config.annual_interest_rate < Decimal::ZERO {
            return Err(EconError::InvalidParameter("annual interest rate must be >= 0"));
        }
        if config.aircraft_life_years <= Decimal::ZERO {
            return Err(EconError::InvalidParameter("aircraft life must be > 0"));
        }
        Ok(Self {
            liabilities: config.liabilities,
            assets: config.assets,
            annual_interest_rate: config.annual_interest_rate,
            aircraft_life_years: config.aircraft_life_years,
            history: BTreeMap::new(),
        })
    }

    pub fn liabilities(&self) -> &BTreeMap<String, Decimal> {
        &self.liabilities
    }

    pub fn assets(&self) -> &BTreeMap<String, Decimal> {
        &self.assets
    }

    /// Balance of a liability bucket; zero if it does not exist.
    pub fn liability(&self, bucket: &str) -> Decimal {
        self.liabilities.get(bucket).copied().unwrap_or_default()
    }

    /// Balance of an asset bucket; zero if it does not exist.
    pub fn asset(&self, bucket: &str) -> Decimal {
        self.assets.get(bucket).copied().unwrap_or_default()
    }

    pub fn cash(&self) -> Decimal {
        self.asset(CASH)
    }

    pub fn total_debt(&self) -> Result<Decimal, EconError> {
        checked_total(&self.liabilities, "total debt")
    }

    pub fn total_assets(&self) -> Result<Decimal, EconError> {
        checked_total(&self.assets, "total assets")
    }

    /// One quarter of interest on aircraft loans at the annual rate.
    pub fn quarterly_interest(&self) -> Result<Decimal, EconError> {
        self.liability(AIRCRAFT_LOANS)
            .checked_mul(self.annual_interest_rate)
            .and_then(|annual| annual.checked_div(Decimal::from(4)))
            .ok_or(EconError::Overflow("interest expense"))
    }

    /// One quarter of straight-line depreciation of the aircraft book value.
    pub fn quarterly_depreciation(&self) -> Result<Decimal, EconError> {
        self.asset(AIRCRAFT_ASSET)
            .checked_div(self.aircraft_life_years)
            .and_then(|annual| annual.checked_div(Decimal::from(4)))
            .ok_or(EconError::Overflow("depreciation"))
    }

    /// Close `quarter`: book net income into cash and record its metrics,
    /// replacing any earlier record for the same quarter.
    ///
    /// Closing the same quarter twice yields the same figures but books the
    /// net income into cash twice. Arithmetic overflow fails the close and
    /// leaves the ledger untouched.
    pub fn close_quarter(
        &mut self,
        quarter: &QuarterId,
        inputs: &QuarterInputs,
    ) -> Result<FinancialMetrics, EconError> {
        inputs.validate()?;
        let ebitda = inputs
            .revenue
            .checked_sub(inputs.operating_cost)
            .ok_or(EconError::Overflow("ebitda"))?;
        let interest_expense = self.quarterly_interest()?;
        let depreciation = self.quarterly_depreciation()?;
        let net_income = ebitda
            .checked_sub(interest_expense)
            .and_then(|v| v.checked_sub(depreciation))
            .ok_or(EconError::Overflow("net income"))?;
        let cash_balance = self
            .cash()
            .checked_add(net_income)
            .ok_or(EconError::Overflow(CASH))?;

        let mut assets = self.assets.clone();
        assets.insert(CASH.to_string(), cash_balance);
        let total_assets = checked_total(&assets, "total assets")?;
        let total_debt = self.total_debt()?;
        total_assets
            .checked_sub(total_debt)
            .ok_or(EconError::Overflow("equity"))?;
        self.assets = assets;

        let metrics = FinancialMetrics {
            revenue: inputs.revenue,
            operating_cost: inputs.operating_cost,
            fuel_cost: inputs.fuel_cost,
            maintenance_cost: inputs.maintenance_cost,
            labor_cost: inputs.labor_cost,
            airport_cost: inputs.airport_cost,
            other_cost: inputs.other_cost,
            ebitda,
            interest_expense,
            depreciation,
            net_income,
            cash_balance,
            total_debt,
            total_assets,
        };
        if self.history.insert(quarter.clone(), metrics.clone()).is_some() {
            debug!(%quarter, "quarter re-closed; previous metrics replaced");
        }
        debug!(%quarter, %ebitda, %net_income, cash = %metrics.cash_balance, "quarter closed");
        Ok(metrics)
    }

    pub fn metrics(&self, quarter: &QuarterId) -> Option<&FinancialMetrics> {
        self.history.get(quarter)
    }

    pub fn history(&self) -> &BTreeMap<QuarterId, FinancialMetrics> {
        &self.history
    }

    /// ROIC of a closed quarter in percent; zero for unknown quarters.
    pub fn roic(&self, quarter: &QuarterId) -> Decimal {
        self.metrics(quarter)
            .map_or(Decimal::ZERO, FinancialMetrics::roic)
    }

    /// Daily net income of a closed quarter; zero for unknown quarters.
    pub fn cash_burn_rate(&self, quarter: &QuarterId) -> Decimal {
        self.metrics(quarter)
            .map_or(Decimal::ZERO, FinancialMetrics::cash_burn_rate)
    }

    pub fn financial_summary(&self, quarter: &QuarterId) -> Option<FinancialSummary> {
        self.metrics(quarter).map(FinancialMetrics::summary)
    }

    pub fn key_metrics(&self, quarter: &QuarterId) -> Option<KeyMetrics> {
        self.metrics(quarter).map(FinancialMetrics::key_metrics)
    }

    /// Add `amount` to a liability bucket. Unknown buckets are left alone and
    /// reported as `false`.
    pub fn apply_liability_delta(
        &mut self,
        bucket: &str,
        amount: Decimal,
    ) -> Result<bool, EconError> {
        apply_delta(&mut self.liabilities, "liability", bucket, amount)
    }

    /// Add `amount` to an asset bucket. Unknown buckets are left alone and
    /// reported as `false`.
    pub fn apply_asset_delta(&mut self, bucket: &str, amount: Decimal) -> Result<bool, EconError> {
        apply_delta(&mut self.assets, "asset", bucket, amount)
    }
}

fn apply_delta(
    buckets: &mut BTreeMap<String, Decimal>,
    side: &str,
    bucket: &str,
    amount: Decimal,
) -> Result<bool, EconError> {
    match buckets.get_mut(bucket) {
        Some(balance) => {
            *balance = balance
                .checked_add(amount)
                .ok_or(EconError::Overflow("balance adjustment"))?;
            debug!(side, bucket, %amount, balance = %balance, "balance adjusted");
            Ok(true)
        }
        None => {
            warn!(side, bucket, %amount, "unknown bucket; adjustment ignored");
            Ok(false)
        }
    }
}

fn checked_total(
    buckets: &BTreeMap<String, Decimal>,
    what: &'static str,
) -> Result<Decimal, EconError> {
    buckets
        .values()
        .try_fold(Decimal::ZERO, |total, v| total.checked_add(*v))
        .ok_or(EconError::Overflow(what))
}
