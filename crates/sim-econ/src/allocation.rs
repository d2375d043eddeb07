//! Cost allocation: how total route operating cost is split into components.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::EconError;

/// Component costs derived from a total operating cost.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CostSplit {
    pub fuel: Decimal,
    pub labor: Decimal,
    pub airport: Decimal,
    pub other: Decimal,
}

/// Policy mapping total operating cost to its components.
pub trait CostAllocation {
    fn allocate(&self, operating_cost: Decimal) -> CostSplit;
}

impl<F> CostAllocation for F
where
    F: Fn(Decimal) -> CostSplit,
{
    fn allocate(&self, operating_cost: Decimal) -> CostSplit {
        self(operating_cost)
    }
}

/// Static shares of operating cost. Whatever the shares leave over stays
/// attributed to the base operating cost.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FixedShareAllocation {
    pub fuel: Decimal,
    pub labor: Decimal,
    pub airport: Decimal,
    pub other: Decimal,
}

impl Default for FixedShareAllocation {
    fn default() -> Self {
        Self {
            fuel: Decimal::new(30, 2),
            labor: Decimal::new(25, 2),
            airport: Decimal::new(15, 2),
            other: Decimal::new(10, 2),
        }
    }
}

impl FixedShareAllocation {
    pub fn validate(&self) -> Result<(), EconError> {
        let shares = [
            ("fuel", self.fuel),
            ("labor", self.labor),
            ("airport", self.airport),
            ("other", self.other),
        ];
        for (name, share) in shares {
            if share < Decimal::ZERO || share > Decimal::ONE {
                return Err(EconError::InvalidShare(name));
            }
        }
        let total = self.fuel + self.labor + self.airport + self.other;
        if total > Decimal::ONE {
            return Err(EconError::SharesExceedTotal(total));
        }
        Ok(())
    }

    /// Share of operating cost not assigned to any component.
    pub fn unallocated(&self) -> Decimal {
        Decimal::ONE - (self.fuel + self.labor + self.airport + self.other)
    }
}

impl CostAllocation for FixedShareAllocation {
    fn allocate(&self, operating_cost: Decimal) -> CostSplit {
        CostSplit {
            fuel: operating_cost * self.fuel,
            labor: operating_cost * self.labor,
            airport: operating_cost * self.airport,
            other: operating_cost * self.other,
        }
    }
}
