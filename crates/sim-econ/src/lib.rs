#![deny(warnings)]

//! Financial models for the airline turnaround simulator.
//!
//! This crate provides:
//! - The balance-sheet ledger and its quarter-close computation
//! - Immutable per-quarter financial metrics and derived ratios
//! - Pluggable policies that split operating cost into components

use rust_decimal::Decimal;
use thiserror::Error;

mod allocation;
mod ledger;
mod metrics;

pub use allocation::{CostAllocation, CostSplit, FixedShareAllocation};
pub use ledger::{Ledger, LedgerConfig, QuarterInputs, AIRCRAFT_ASSET, AIRCRAFT_LOANS, CASH};
pub use metrics::{FinancialMetrics, FinancialSummary, KeyMetrics};

/// Errors produced by the financial models.
#[derive(Debug, Error, PartialEq)]
pub enum EconError {
    /// Cost components must be non-negative, even when revenue minus cost is not.
    #[error("{0} cost must be non-negative")]
    NegativeCost(&'static str),
    /// Allocation share outside [0, 1].
    #[error("cost share for {0} must be within [0,1]")]
    InvalidShare(&'static str),
    /// Allocation shares add up to more than the whole.
    #[error("cost shares sum to {0}, which exceeds 1")]
    SharesExceedTotal(Decimal),
    /// Ledger parameter out of range.
    #[error("invalid ledger parameter: {0}")]
    InvalidParameter(&'static str),
    /// A balance or total left the representable range.
    #[error("{0} overflowed")]
    Overflow(&'static str),
}
