//! Quarter labels and the calendar that produces them.

use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ValidationError;

/// Simulated days per quarter.
pub const DAYS_PER_QUARTER: u64 = 90;

/// Quarter label of the form `YYYY-Qk`, e.g. "2025-Q1". Labels sort
/// chronologically for four-digit years.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuarterId(pub String);

impl QuarterId {
    pub fn new(year: i32, quarter: u8) -> Result<Self, ValidationError> {
        if !(1..=4).contains(&quarter) {
            return Err(ValidationError::InvalidQuarter(format!("{year}-Q{quarter}")));
        }
        Ok(QuarterId(format!("{year}-Q{quarter}")))
    }

    /// Split the label into year and quarter number.
    pub fn parse(&self) -> Result<(i32, u8), ValidationError> {
        let invalid = || ValidationError::InvalidQuarter(self.0.clone());
        let (year, q) = self.0.split_once("-Q").ok_or_else(invalid)?;
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let q: u8 = q.parse().map_err(|_| invalid())?;
        if !(1..=4).contains(&q) {
            return Err(invalid());
        }
        Ok((year, q))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for QuarterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for QuarterId {
    fn from(s: &str) -> Self {
        QuarterId(s.to_string())
    }
}

/// Cursor over consecutive quarters.
///
/// Labels follow calendar quarters starting from the quarter containing the
/// start date; the period start date advances by a fixed 90 days per step.
/// Any quarter label can be placed relative to the start, so a quarter's
/// period start does not depend on where the cursor currently is.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuarterCalendar {
    origin: NaiveDate,
    origin_year: i32,
    origin_quarter: u8,
    /// Quarters between the origin and the cursor.
    offset: i64,
}

impl QuarterCalendar {
    pub fn starting(date: NaiveDate) -> Self {
        Self {
            origin: date,
            origin_year: date.year(),
            origin_quarter: (date.month0() / 3 + 1) as u8,
            offset: 0,
        }
    }

    pub fn current(&self) -> QuarterId {
        self.label_at(self.offset)
    }

    pub fn period_start(&self) -> NaiveDate {
        // The cursor only moves through `seek`, which checks the date.
        self.date_at(self.offset).unwrap_or(self.origin)
    }

    /// Quarters from the start quarter to `quarter`; negative before it.
    pub fn offset_of(&self, quarter: &QuarterId) -> Result<i64, ValidationError> {
        let (year, q) = quarter.parse()?;
        let years = i64::from(year) - i64::from(self.origin_year);
        Ok(years * 4 + i64::from(q) - i64::from(self.origin_quarter))
    }

    /// First day of `quarter`'s simulated period.
    pub fn period_start_of(&self, quarter: &QuarterId) -> Result<NaiveDate, ValidationError> {
        let offset = self.offset_of(quarter)?;
        self.date_at(offset)
            .ok_or_else(|| ValidationError::DateOutOfRange(quarter.to_string()))
    }

    /// Step to the next quarter.
    pub fn advance(&mut self) -> Result<(), ValidationError> {
        self.seek(self.offset + 1)
    }

    /// Move the cursor just past `quarter` unless it is already beyond it.
    /// Returns whether the cursor moved.
    pub fn advance_past(&mut self, quarter: &QuarterId) -> Result<bool, ValidationError> {
        let next = self.offset_of(quarter)? + 1;
        if next <= self.offset {
            return Ok(false);
        }
        self.seek(next)?;
        Ok(true)
    }

    fn seek(&mut self, offset: i64) -> Result<(), ValidationError> {
        if self.date_at(offset).is_none() {
            return Err(ValidationError::DateOutOfRange(self.label_at(offset).0));
        }
        self.offset = offset;
        Ok(())
    }

    fn label_at(&self, offset: i64) -> QuarterId {
        let index = i64::from(self.origin_year) * 4 + i64::from(self.origin_quarter - 1) + offset;
        QuarterId(format!("{}-Q{}", index.div_euclid(4), index.rem_euclid(4) + 1))
    }

    fn date_at(&self, offset: i64) -> Option<NaiveDate> {
        let days = Days::new(offset.unsigned_abs().checked_mul(DAYS_PER_QUARTER)?);
        if offset >= 0 {
            self.origin.checked_add_days(days)
        } else {
            self.origin.checked_sub_days(days)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn calendar_rolls_over_years() {
        let mut cal = QuarterCalendar::starting(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
        let mut labels = Vec::new();
        for _ in 0..6 {
            labels.push(cal.current().0);
            cal.advance().unwrap();
        }
        assert_eq!(
            labels,
            vec!["2025-Q1", "2025-Q2", "2025-Q3", "2025-Q4", "2026-Q1", "2026-Q2"]
        );
        assert_eq!(cal.period_start(), NaiveDate::from_ymd_opt(2026, 6, 25).unwrap());
    }

    #[test]
    fn calendar_starts_in_containing_quarter() {
        let cal = QuarterCalendar::starting(NaiveDate::from_ymd_opt(2024, 8, 15).unwrap());
        assert_eq!(cal.current(), QuarterId::from("2024-Q3"));
    }

    #[test]
    fn quarter_ids_parse_and_validate() {
        assert_eq!(QuarterId::new(2025, 2).unwrap().as_str(), "2025-Q2");
        assert!(QuarterId::new(2025, 5).is_err());
        assert_eq!(QuarterId::from("2027-Q4").parse(), Ok((2027, 4)));
        assert!(QuarterId::from("2027-Q0").parse().is_err());
        assert!(QuarterId::from("Q1-2027").parse().is_err());
        assert!(QuarterId::from("2025-Q4") < QuarterId::from("2026-Q1"));
    }

    #[test]
    fn period_start_is_fixed_per_quarter() {
        let mut cal = QuarterCalendar::starting(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
        let q2 = QuarterId::from("2025-Q2");
        assert_eq!(cal.offset_of(&q2), Ok(1));
        assert_eq!(
            cal.period_start_of(&QuarterId::from("2025-Q1")),
            Ok(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap())
        );
        assert_eq!(
            cal.period_start_of(&QuarterId::from("2024-Q4")),
            Ok(NaiveDate::from_ymd_opt(2024, 10, 3).unwrap())
        );
        cal.advance().unwrap();
        cal.advance().unwrap();
        assert_eq!(
            cal.period_start_of(&q2),
            Ok(NaiveDate::from_ymd_opt(2025, 4, 1).unwrap())
        );
        assert!(cal.period_start_of(&QuarterId::from("garbage")).is_err());
    }

    #[test]
    fn advance_past_never_moves_backwards() {
        let mut cal = QuarterCalendar::starting(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
        assert_eq!(cal.advance_past(&QuarterId::from("2025-Q1")), Ok(true));
        assert_eq!(cal.current(), QuarterId::from("2025-Q2"));
        assert_eq!(cal.advance_past(&QuarterId::from("2025-Q1")), Ok(false));
        assert_eq!(cal.current(), QuarterId::from("2025-Q2"));
        assert_eq!(cal.advance_past(&QuarterId::from("2026-Q3")), Ok(true));
        assert_eq!(cal.current(), QuarterId::from("2026-Q4"));
        assert_eq!(cal.period_start(), NaiveDate::from_ymd_opt(2026, 9, 23).unwrap());
    }
}
