//! Calendar helpers: the `Year` newtype and the date windows a prediction unit
//! classifies and loads.

use chrono::{Datelike, Days, NaiveDate};
use std::fmt;
use std::fmt::{Display, Formatter};
use std::ops::RangeInclusive;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Ord, PartialOrd, Hash)]
pub struct Year(pub i32);

impl Year {
    pub fn get(self) -> i32 {
        self.0
    }

    pub fn first_day(self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.0, 1, 1)
    }

    pub fn last_day(self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.0, 12, 31)
    }
}

impl Display for Year {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}", self.0)
    }
}

/// An inclusive date window.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    /// The window classified for one year: the calendar year extended
    /// backwards by `lead_days` so the first in-year day has a full
    /// persistence window of history. `None` when the start falls outside
    /// the representable calendar.
    pub fn for_year(year: Year, lead_days: usize) -> Option<Self> {
        let lead_days = u64::try_from(lead_days).ok()?;
        let start = year.first_day()?.checked_sub_days(Days::new(lead_days))?;
        Some(Self {
            start,
            end: year.last_day()?,
        })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// The source years that must be read to cover this window.
    ///
    /// One extra year is read on either side when the window touches the
    /// year boundary, so gaps at the edge of the window can still be
    /// interpolated against the neighbouring file.
    pub fn source_years(&self) -> RangeInclusive<i32> {
        let mut first = self.start.year();
        if self.start.month() == 1 {
            first -= 1;
        }
        let mut last = self.end.year();
        if self.end.month() == 12 {
            last += 1;
        }
        first..=last
    }
}
