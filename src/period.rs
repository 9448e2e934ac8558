//! Reporting periods, and the console prompts used to choose them.
use crate::Result;
use chrono::{Datelike, NaiveDate};
use qu::ick_use::*;
use std::{
    fmt,
    io::{BufRead, Write},
};

/// A calendar quarter, identified by the month it finishes in.
///
/// Quality surveys are done at the end of March, June, September and December.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Quarter {
    year: i32,
    end_month: u32,
}

impl Quarter {
    pub fn new(year: i32, end_month: u32) -> Result<Self> {
        ensure!(
            matches!(end_month, 3 | 6 | 9 | 12),
            "a quarter ends in month 3, 6, 9 or 12, not {}",
            end_month
        );
        Ok(Self { year, end_month })
    }

    pub fn year(self) -> i32 {
        self.year
    }

    pub fn end_month(self) -> u32 {
        self.end_month
    }

    /// The three months of the quarter, in order.
    pub fn months(self) -> [u32; 3] {
        [self.end_month - 2, self.end_month - 1, self.end_month]
    }

    pub fn contains(self, date: NaiveDate) -> bool {
        date.year() == self.year && self.months().contains(&date.month())
    }

    /// The month before the quarter as `(year, month)`.
    ///
    /// For the January-March quarter this is December of the previous year.
    pub fn previous_month(self) -> (i32, u32) {
        if self.end_month == 3 {
            (self.year - 1, 12)
        } else {
            (self.year, self.end_month - 3)
        }
    }

    /// Whether `date` is in the quarter or the month before it.
    pub fn contains_with_lookback(self, date: NaiveDate) -> bool {
        self.contains(date) || (date.year(), date.month()) == self.previous_month()
    }

    pub fn label(self) -> &'static str {
        match self.end_month {
            3 => "JANUARY-MARCH",
            6 => "APRIL-JUNE",
            9 => "JULY-SEPTEMBER",
            _ => "OCTOBER-DECEMBER",
        }
    }
}

impl fmt::Display for Quarter {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {}", self.label(), self.year)
    }
}

/// Half of a calendar year.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum HalfYear {
    First,
    Second,
}

impl HalfYear {
    pub fn months(self) -> std::ops::RangeInclusive<u32> {
        match self {
            HalfYear::First => 1..=6,
            HalfYear::Second => 7..=12,
        }
    }

    pub fn contains(self, year: i32, date: NaiveDate) -> bool {
        date.year() == year && self.months().contains(&date.month())
    }

    pub fn label(self) -> &'static str {
        match self {
            HalfYear::First => "January-June",
            HalfYear::Second => "July-December",
        }
    }
}

/// A run of `count` months starting at `first_month`.
///
/// The span stays inside `year`: months past December are never matched.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct MonthSpan {
    pub year: i32,
    pub first_month: u32,
    pub count: u32,
}

impl MonthSpan {
    pub fn contains(self, date: NaiveDate) -> bool {
        date.year() == self.year
            && date.month() >= self.first_month
            && date.month() < self.first_month.saturating_add(self.count)
    }
}

impl fmt::Display for MonthSpan {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} MONTHS FROM 1-{}-{}",
            self.count, self.first_month, self.year
        )
    }
}

// Input validation for the console prompts.

pub fn parse_year(input: &str) -> Result<i32> {
    let input = input.trim();
    ensure!(
        input.len() == 4 && input.bytes().all(|b| b.is_ascii_digit()),
        "Year must be 4 digits."
    );
    Ok(input.parse()?)
}

pub fn parse_quarter_end(input: &str) -> Result<u32> {
    match input.trim().parse::<u32>() {
        Ok(month @ (3 | 6 | 9 | 12)) => Ok(month),
        _ => bail!("Enter the month to finish survey as a number, 3, 6, 9, 12"),
    }
}

/// A month entered as two digits, `01` to `12`.
pub fn parse_month(input: &str) -> Result<u32> {
    let input = input.trim();
    ensure!(
        input.len() == 2 && input.bytes().all(|b| b.is_ascii_digit()),
        "Month must be 2 digits."
    );
    let month: u32 = input.parse()?;
    ensure!((1..=12).contains(&month), "Enter a number between 1 and 12");
    Ok(month)
}

/// A number of months, `1` to `12`.
pub fn parse_count(input: &str) -> Result<u32> {
    let input = input.trim();
    ensure!(
        !input.is_empty() && input.bytes().all(|b| b.is_ascii_digit()),
        "Input must be a number."
    );
    match input.parse::<u32>() {
        Ok(count @ 1..=12) => Ok(count),
        _ => bail!("Enter a number of months between 1 and 12"),
    }
}

pub fn parse_half_year(input: &str) -> Result<HalfYear> {
    match input.trim() {
        "1" => Ok(HalfYear::First),
        "2" => Ok(HalfYear::Second),
        _ => bail!("Enter 1 or 2"),
    }
}

/// Ask `question` until `parse` accepts the answer.
///
/// Rejected answers print the parse error and ask again. Running out of input is an error.
pub fn prompt<T>(
    input: &mut impl BufRead,
    output: &mut impl Write,
    question: &str,
    parse: impl Fn(&str) -> Result<T>,
) -> Result<T> {
    let mut line = String::new();
    loop {
        write!(output, "{}", question)?;
        output.flush()?;
        line.clear();
        if input.read_line(&mut line)? == 0 {
            bail!("no answer given for \"{}\"", question.trim());
        }
        match parse(&line) {
            Ok(value) => return Ok(value),
            Err(e) => writeln!(output, "{}", e)?,
        }
    }
}

/// Use the value given on the command line, or ask for it on the console.
pub fn or_prompt<T>(
    value: Option<T>,
    question: &str,
    parse: impl Fn(&str) -> Result<T>,
) -> Result<T> {
    match value {
        Some(value) => Ok(value),
        None => prompt(
            &mut std::io::stdin().lock(),
            &mut std::io::stdout(),
            question,
            parse,
        ),
    }
}
