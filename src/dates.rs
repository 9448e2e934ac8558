//! Date handling for the practice and hospital exports.
//!
//! The practice writes dates as `dd-mm-yyyy` and birth dates as `d/m/yyyy`. The hospital
//! extract and our intermediate tables use the separator-free `ddmmyyyy` form.
use chrono::{Datelike, NaiveDate};
use std::fmt;

pub const DMY_DASHED: &str = "%d-%m-%Y";
pub const DMY_COMPACT: &str = "%d%m%Y";

/// Parse an 8 digit `ddmmyyyy` date. Anything else, including impossible calendar dates, gives
/// `None`.
pub fn parse_compact(input: &str) -> Option<NaiveDate> {
    if input.len() != 8 || !input.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    NaiveDate::parse_from_str(input, DMY_COMPACT).ok()
}

pub fn format_compact(date: NaiveDate) -> String {
    date.format(DMY_COMPACT).to_string()
}

pub fn format_dashed(date: NaiveDate) -> String {
    date.format(DMY_DASHED).to_string()
}

/// `12-03-2024` -> `12032024`
pub fn strip_separators(date: &str) -> String {
    date.replace('-', "")
}

/// Normalise a `d/m/yyyy` birth date to `ddmmyyyy`.
///
/// The slashes are removed and a 7 digit result gets a leading zero. Birth dates with a single
/// digit month as well as a single digit day can't be fixed this way and are left at 6 digits.
pub fn normalize_dob(dob: &str) -> String {
    let dob = dob.replace('/', "");
    if dob.len() == 7 {
        format!("0{}", dob)
    } else {
        dob
    }
}

/// Age in whole years on the date `on`.
///
/// The year difference is reduced by one when `on` falls earlier in the year than the birthday.
/// On the birthday itself the new age already applies.
pub fn age_at(birth: NaiveDate, on: NaiveDate) -> i32 {
    let mut age = on.year() - birth.year();
    if (on.month(), on.day()) < (birth.month(), birth.day()) {
        age -= 1;
    }
    age
}

pub fn is_under_50(procedure: NaiveDate, birth: NaiveDate) -> bool {
    age_at(birth, procedure) < 50
}

/// The earliest and latest dates seen.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct DateRange {
    span: Option<(NaiveDate, NaiveDate)>,
}

impl DateRange {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, date: NaiveDate) {
        self.span = Some(match self.span {
            None => (date, date),
            Some((start, end)) => (start.min(date), end.max(date)),
        });
    }

    pub fn start(&self) -> Option<NaiveDate> {
        self.span.map(|(start, _)| start)
    }

    pub fn end(&self) -> Option<NaiveDate> {
        self.span.map(|(_, end)| end)
    }

    pub fn is_empty(&self) -> bool {
        self.span.is_none()
    }
}

impl FromIterator<NaiveDate> for DateRange {
    fn from_iter<T: IntoIterator<Item = NaiveDate>>(iter: T) -> Self {
        let mut range = Self::new();
        for date in iter {
            range.update(date);
        }
        range
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.span {
            Some((start, end)) => write!(
                f,
                "{} to {}",
                start.format(DMY_DASHED),
                end.format(DMY_DASHED)
            ),
            None => f.write_str("n/a to n/a"),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn compact_dates() {
        assert_eq!(parse_compact("12032024"), Some(ymd(2024, 3, 12)));
        assert_eq!(parse_compact("31022024"), None);
        assert_eq!(parse_compact("1032024"), None);
        assert_eq!(parse_compact("?"), None);
        assert_eq!(parse_compact(""), None);
        assert_eq!(format_compact(ymd(2024, 3, 1)), "01032024");
    }

    #[test]
    fn dob_normalisation() {
        assert_eq!(normalize_dob("1/02/1960"), "01021960");
        assert_eq!(normalize_dob("11/02/1960"), "11021960");
        assert_eq!(normalize_dob("1/2/1960"), "121960");
    }

    #[test]
    fn birthday_boundary() {
        let birth = ymd(1974, 6, 15);
        // day before the 50th birthday
        assert!(is_under_50(ymd(2024, 6, 14), birth));
        // on the birthday the patient is 50
        assert!(!is_under_50(ymd(2024, 6, 15), birth));
        assert!(!is_under_50(ymd(2024, 6, 16), birth));
        assert_eq!(age_at(birth, ymd(2024, 6, 15)), 50);
        assert_eq!(age_at(birth, ymd(2024, 1, 1)), 49);
    }

    #[test]
    fn under_50_monotonic_in_birth_year() {
        let procedure = ymd(2024, 6, 15);
        for (month, day) in [(1, 1), (6, 14), (6, 15), (6, 16), (12, 31)] {
            let mut seen_under = false;
            for year in 1940..2010 {
                let under = is_under_50(procedure, ymd(year, month, day));
                // once someone born in year Y is under 50, everyone born later is too.
                assert!(!seen_under || under, "not monotonic at {}-{}-{}", year, month, day);
                seen_under |= under;
            }
            assert!(seen_under);
        }
    }

    #[test]
    fn date_range_tracks_extremes() {
        let range: DateRange = [ymd(2024, 3, 2), ymd(2024, 1, 5), ymd(2024, 2, 1)]
            .into_iter()
            .collect();
        assert_eq!(range.start(), Some(ymd(2024, 1, 5)));
        assert_eq!(range.end(), Some(ymd(2024, 3, 2)));
        assert_eq!(range.to_string(), "05-01-2024 to 02-03-2024");
        assert!(DateRange::new().is_empty());
    }
}
