//! Progress against a weekly patient target.
use crate::{load_headerless, load_headerless_optional, Result};
use chrono::{Datelike, NaiveDate};
use std::{fmt, path::Path};

/// Rows whose first field is a date in `year`.
///
/// Only the text after the last `-` is looked at, so the rest of the date can be in any shape.
pub fn count_in_year(rows: &[csv::StringRecord], year: i32) -> u32 {
    let year = year.to_string();
    rows.iter()
        .filter(|row| {
            row.get(0)
                .and_then(|date| date.trim().rsplit('-').next())
                .map_or(false, |y| y == year)
        })
        .count() as u32
}

/// Count this year's patients in the master file and the current file.
///
/// The current file only exists once a patient has been done since the last merge, so a missing
/// current file counts as zero.
pub fn patients_this_year(
    master: impl AsRef<Path>,
    current: impl AsRef<Path>,
    year: i32,
) -> Result<u32> {
    let master = count_in_year(&load_headerless(master)?, year);
    let current = count_in_year(&load_headerless_optional(current)?, year);
    Ok(master + current)
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct WeeklyTarget {
    /// Patients so far this year.
    pub count: u32,
    pub weekly: u32,
    /// Patients carried over from last year.
    pub carry_over: u32,
    /// Days since 1 January.
    pub days: i64,
}

impl WeeklyTarget {
    pub fn new(count: u32, weekly: u32, carry_over: u32, today: NaiveDate) -> Self {
        let days = today.ordinal0() as i64;
        WeeklyTarget {
            count,
            weekly,
            carry_over,
            days,
        }
    }

    pub fn with_carry_over(&self) -> u32 {
        self.count + self.carry_over
    }

    /// How many patients should have been done by today.
    pub fn desired(&self) -> i64 {
        self.days * i64::from(self.weekly) / 7
    }

    /// Patients ahead of the target, negative if behind. Carry over isn't included.
    pub fn excess(&self) -> i64 {
        i64::from(self.count) - self.desired()
    }

    /// `None` on 1 January, when no time has passed.
    pub fn average_per_week(&self) -> Option<i64> {
        if self.days == 0 {
            return None;
        }
        Some(i64::from(self.count) * 7 / self.days)
    }
}

impl fmt::Display for WeeklyTarget {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Patients this year: {}\n", self.count)?;
        writeln!(
            f,
            "Patients this year plus carry over from last year : {}\n",
            self.with_carry_over()
        )?;
        writeln!(
            f,
            "Excess for {} - without carry over: {}\n",
            self.weekly,
            self.excess()
        )?;
        match self.average_per_week() {
            Some(average) => write!(f, "Average per week - without carry over:  {}", average),
            None => write!(f, "Average per week - without carry over:  n/a"),
        }
    }
}
