//! Monthly period keys and the quarters they map to.
//!
//! Return panels are indexed by an integer `YYYYMM` key. Daily source dates
//! (`YYYYMMDD`) collapse onto their month by integer division, so several rows
//! may share a key. Quarter keys group months 1-3, 4-6, 7-9 and 10-12 and are
//! written as `"<year>Q<quarter>"`.

use crate::error::{PanelError, Result};
use chrono::{Datelike, NaiveDate};
use derive_more::{Display, Into};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// A monthly period key in `YYYYMM` form.
///
/// Deserialization goes through [`PeriodKey::new`], so the month is always 1-12.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, Into, Serialize, Deserialize,
)]
#[serde(try_from = "u32", into = "u32")]
pub struct PeriodKey(u32);

impl TryFrom<u32> for PeriodKey {
    type Error = PanelError;

    fn try_from(yyyymm: u32) -> Result<Self> {
        Self::new(yyyymm)
    }
}

impl PeriodKey {
    /// Build a key from a `YYYYMM` integer, validating the month.
    pub fn new(yyyymm: u32) -> Result<Self> {
        let month = yyyymm % 100;
        if !(1..=12).contains(&month) {
            return Err(PanelError::InvalidPeriodKey(i64::from(yyyymm)));
        }
        Ok(Self(yyyymm))
    }

    /// Build a key from year and month.
    pub fn from_ymd(year: u32, month: u32) -> Result<Self> {
        Self::new(year * 100 + month)
    }

    /// Strip day granularity from a `YYYYMMDD` date value.
    ///
    /// ```
    /// use everywhere_data::PeriodKey;
    ///
    /// let key = PeriodKey::from_date_value(20200315).unwrap();
    /// assert_eq!(key.value(), 202003);
    /// ```
    pub fn from_date_value(value: i64) -> Result<Self> {
        let yyyymm = value.div_euclid(100);
        let yyyymm = u32::try_from(yyyymm).map_err(|_| PanelError::InvalidPeriodKey(value))?;
        Self::new(yyyymm).map_err(|_| PanelError::InvalidPeriodKey(value))
    }

    /// Key of the month containing `date`.
    pub fn from_date(date: NaiveDate) -> Result<Self> {
        let year = u32::try_from(date.year())
            .map_err(|_| PanelError::InvalidPeriodKey(i64::from(date.year())))?;
        Self::from_ymd(year, date.month())
    }

    /// Raw `YYYYMM` value.
    pub const fn value(&self) -> u32 {
        self.0
    }

    /// Calendar year.
    pub const fn year(&self) -> u32 {
        self.0 / 100
    }

    /// Calendar month (1-12).
    pub const fn month(&self) -> u32 {
        self.0 % 100
    }

    /// Quarter containing this month.
    pub const fn quarter(&self) -> QuarterKey {
        QuarterKey {
            year: self.year(),
            quarter: (self.month() - 1) / 3 + 1,
        }
    }
}

/// A calendar quarter, ordered chronologically and displayed as `2020Q3`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, Serialize, Deserialize,
)]
#[display("{year}Q{quarter}")]
pub struct QuarterKey {
    /// Calendar year
    pub year: u32,
    /// Quarter number (1-4)
    pub quarter: u32,
}

impl QuarterKey {
    /// Quarters elapsed since year 0, used as a sortable integer key.
    pub const fn ordinal(&self) -> i64 {
        self.year as i64 * 4 + self.quarter as i64 - 1
    }

    /// Inverse of [`QuarterKey::ordinal`].
    pub fn from_ordinal(ordinal: i64) -> Result<Self> {
        let year = u32::try_from(ordinal.div_euclid(4))
            .map_err(|_| PanelError::InvalidQuarterKey(ordinal.to_string()))?;
        Ok(Self {
            year,
            quarter: ordinal.rem_euclid(4) as u32 + 1,
        })
    }
}

impl FromStr for QuarterKey {
    type Err = PanelError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || PanelError::InvalidQuarterKey(s.to_string());
        let (year, quarter) = s.split_once('Q').ok_or_else(invalid)?;
        let year = year.parse::<u32>().map_err(|_| invalid())?;
        let quarter = quarter.parse::<u32>().map_err(|_| invalid())?;
        if !(1..=4).contains(&quarter) {
            return Err(invalid());
        }
        Ok(Self { year, quarter })
    }
}

/// Map a raw `YYYYMM` value to its quarter label.
///
/// Months are not validated here: anything below 4 is Q1 and anything from 10
/// up is Q4.
///
/// ```
/// use everywhere_data::quarter_key;
///
/// assert_eq!(quarter_key(202003), "2020Q1");
/// assert_eq!(quarter_key(202012), "2020Q4");
/// ```
pub fn quarter_key(period: u32) -> String {
    let year = period / 100;
    let quarter = match period % 100 {
        m if m < 4 => 1,
        m if m < 7 => 2,
        m if m < 10 => 3,
        _ => 4,
    };
    format!("{year}Q{quarter}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(202001, "2020Q1")]
    #[case(202002, "2020Q1")]
    #[case(202003, "2020Q1")]
    #[case(202004, "2020Q2")]
    #[case(202006, "2020Q2")]
    #[case(202007, "2020Q3")]
    #[case(202009, "2020Q3")]
    #[case(202010, "2020Q4")]
    #[case(202012, "2020Q4")]
    #[case(199911, "1999Q4")]
    fn test_quarter_mapping(#[case] period: u32, #[case] expected: &str) {
        assert_eq!(quarter_key(period), expected);
        let key = PeriodKey::new(period).unwrap();
        assert_eq!(key.quarter().to_string(), expected);
    }

    #[test]
    fn test_quarter_mapping_is_stable() {
        assert_eq!(quarter_key(202008), quarter_key(202008));
    }

    #[test]
    fn test_from_date_value_strips_day() {
        assert_eq!(PeriodKey::from_date_value(20200315).unwrap().value(), 202003);
        assert_eq!(PeriodKey::from_date_value(19991231).unwrap().value(), 199912);
    }

    #[test]
    fn test_invalid_month_rejected() {
        assert!(PeriodKey::new(202013).is_err());
        assert!(PeriodKey::new(202000).is_err());
        assert!(PeriodKey::from_date_value(20201301).is_err());
        assert!(PeriodKey::from_date_value(-5).is_err());
    }

    #[test]
    fn test_from_date() {
        let date = NaiveDate::from_ymd_opt(2021, 8, 17).unwrap();
        let key = PeriodKey::from_date(date).unwrap();
        assert_eq!(key.value(), 202108);
        assert_eq!(key.year(), 2021);
        assert_eq!(key.month(), 8);
    }

    #[test]
    fn test_quarter_key_ordering_and_parse() {
        let a: QuarterKey = "2019Q4".parse().unwrap();
        let b: QuarterKey = "2020Q1".parse().unwrap();
        assert!(a < b);
        assert_eq!(b, QuarterKey { year: 2020, quarter: 1 });
        assert!("2020Q5".parse::<QuarterKey>().is_err());
        assert!("2020-03".parse::<QuarterKey>().is_err());
    }

    #[test]
    fn test_deserialize_validates_month() {
        let key: PeriodKey = serde_json::from_str("202003").unwrap();
        assert_eq!(key.quarter(), QuarterKey { year: 2020, quarter: 1 });
        assert_eq!(serde_json::to_string(&key).unwrap(), "202003");
        assert!(serde_json::from_str::<PeriodKey>("202000").is_err());
        assert!(serde_json::from_str::<PeriodKey>("202013").is_err());
    }

    #[test]
    fn test_quarter_ordinal() {
        let q: QuarterKey = "2010Q4".parse().unwrap();
        let next: QuarterKey = "2011Q1".parse().unwrap();
        assert_eq!(q.ordinal() + 1, next.ordinal());
        assert_eq!(QuarterKey::from_ordinal(q.ordinal()).unwrap(), q);
        assert!(QuarterKey::from_ordinal(-1).is_err());
    }
}
