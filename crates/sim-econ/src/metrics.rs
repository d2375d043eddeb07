//! Per-quarter financial metrics and the ratios derived from them.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sim_core::DAYS_PER_QUARTER;

/// Financial results of one closed quarter. Never mutated after creation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FinancialMetrics {
    pub revenue: Decimal,
    pub operating_cost: Decimal,
    pub fuel_cost: Decimal,
    pub maintenance_cost: Decimal,
    pub labor_cost: Decimal,
    pub airport_cost: Decimal,
    pub other_cost: Decimal,
    pub ebitda: Decimal,
    pub interest_expense: Decimal,
    pub depreciation: Decimal,
    pub net_income: Decimal,
    /// Cash asset after this quarter's net income was booked.
    pub cash_balance: Decimal,
    pub total_debt: Decimal,
    pub total_assets: Decimal,
}

impl FinancialMetrics {
    /// EBITDA as a percentage of revenue; zero without revenue.
    pub fn operating_margin(&self) -> Decimal {
        if self.revenue.is_zero() {
            return Decimal::ZERO;
        }
        self.ebitda
            .checked_div(self.revenue)
            .and_then(|r| r.checked_mul(Decimal::ONE_HUNDRED))
            .unwrap_or(Decimal::ZERO)
    }

    /// Assets minus debt.
    pub fn equity(&self) -> Decimal {
        self.total_assets - self.total_debt
    }

    /// Debt over equity; positive infinity when equity is exactly zero.
    pub fn debt_to_equity(&self) -> f64 {
        let equity = self.equity();
        if equity.is_zero() {
            return f64::INFINITY;
        }
        self.total_debt
            .checked_div(equity)
            .and_then(|r| r.to_f64())
            .unwrap_or(f64::INFINITY)
    }

    /// Net income over invested capital (assets minus debt), in percent.
    /// Zero when invested capital is zero.
    pub fn roic(&self) -> Decimal {
        let invested = self.equity();
        if invested.is_zero() {
            return Decimal::ZERO;
        }
        self.net_income
            .checked_div(invested)
            .and_then(|r| r.checked_mul(Decimal::ONE_HUNDRED))
            .unwrap_or(Decimal::ZERO)
    }

    /// Net income per day of the quarter.
    pub fn cash_burn_rate(&self) -> Decimal {
        self.net_income / Decimal::from(DAYS_PER_QUARTER)
    }

    pub fn summary(&self) -> FinancialSummary {
        FinancialSummary {
            revenue: self.revenue,
            operating_cost: self.operating_cost,
            ebitda: self.ebitda,
            net_income: self.net_income,
            operating_margin: self.operating_margin(),
            debt_to_equity: self.debt_to_equity(),
            roic: self.roic(),
            cash_burn_rate: self.cash_burn_rate(),
        }
    }

    pub fn key_metrics(&self) -> KeyMetrics {
        KeyMetrics {
            operating_margin: self.operating_margin(),
            roic: self.roic(),
            cash_burn_rate: self.cash_burn_rate(),
            debt_to_equity: self.debt_to_equity(),
        }
    }
}

/// Headline figures of a quarter as written into reports.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FinancialSummary {
    #[serde(with = "rust_decimal::serde::float")]
    pub revenue: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub operating_cost: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub ebitda: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub net_income: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub operating_margin: Decimal,
    #[serde(with = "unbounded_ratio")]
    pub debt_to_equity: f64,
    #[serde(with = "rust_decimal::serde::float")]
    pub roic: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub cash_burn_rate: Decimal,
}

/// Ratios charted quarter over quarter.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct KeyMetrics {
    #[serde(with = "rust_decimal::serde::float")]
    pub operating_margin: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub roic: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub cash_burn_rate: Decimal,
    #[serde(with = "unbounded_ratio")]
    pub debt_to_equity: f64,
}

/// JSON has no infinity: write non-finite ratios as `null`, read `null` back
/// as positive infinity.
mod unbounded_ratio {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &f64, s: S) -> Result<S::Ok, S::Error> {
        if value.is_finite() {
            s.serialize_f64(*value)
        } else {
            s.serialize_none()
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
        Ok(Option::<f64>::deserialize(d)?.unwrap_or(f64::INFINITY))
    }
}
