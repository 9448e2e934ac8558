//! The post-procedure phone call worklist.
//!
//! Every patient is rung the day after their procedure. Calls are logged to `follow_up.csv`,
//! which holds the patient's row from `episodes.csv` with three columns added for the result.
use crate::{dates::DMY_DASHED, RawTable, Result};
use chrono::{Duration, NaiveDate};
use itertools::Itertools;
use qu::ick_use::*;
use std::{collections::HashSet, fmt::Write, fs, path::Path};

pub const FILE: &str = "follow_up.csv";

pub const ANSWERED: &str = "answered";
pub const ISSUE: &str = "issue";
pub const ISSUE_TEXT: &str = "issue_text";

/// Patient details shown for a call, with their labels.
const DISPLAY_FIELDS: [(&str, &str); 8] = [
    ("Endo", "endo"),
    ("Anaes", "anaes"),
    ("Nurse", "nurse"),
    ("Upper", "upper"),
    ("Colon", "colon"),
    ("Banding", "anal"),
    ("Polyp", "polyp"),
    ("Phone", "phone"),
];

fn parse_date(date: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(date.trim(), DMY_DASHED)
        .with_context(|| format!("bad date \"{}\"", date))
}

/// The `(date, mrn)` pairs that have already been called.
pub fn done_pairs(follow_up: &RawTable) -> HashSet<(String, String)> {
    follow_up
        .rows()
        .iter()
        .map(|row| {
            (
                follow_up.get(row, "date").to_string(),
                follow_up.get(row, "mrn").to_string(),
            )
        })
        .collect()
}

/// Patients from `start` up to yesterday who haven't been called, oldest first.
pub fn outstanding(
    episodes: &RawTable,
    follow_up: &RawTable,
    start: NaiveDate,
    today: NaiveDate,
) -> Result<Vec<csv::StringRecord>> {
    let yesterday = today - Duration::days(1);
    let done = done_pairs(follow_up);

    let mut calls = vec![];
    for row in episodes.rows() {
        let date = parse_date(episodes.get(row, "date"))?;
        if date < start || date > yesterday {
            continue;
        }
        let key = (
            episodes.get(row, "date").to_string(),
            episodes.get(row, "mrn").to_string(),
        );
        if done.contains(&key) {
            continue;
        }
        calls.push((date, row.clone()));
    }
    event!(Level::DEBUG, "{} calls outstanding", calls.len());
    // stable, so same-day patients stay in list order
    Ok(calls
        .into_iter()
        .sorted_by_key(|(date, _)| *date)
        .map(|(_, row)| row)
        .collect())
}

/// Append a call result to the log, writing the header if the log is new.
pub fn record_result(
    path: impl AsRef<Path>,
    headers: &csv::StringRecord,
    row: &csv::StringRecord,
    answered: &str,
    issue: &str,
    issue_text: &str,
) -> Result {
    let path = path.as_ref();
    let write_header = match fs::metadata(path) {
        Ok(meta) => meta.len() == 0,
        Err(_) => true,
    };
    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("unable to open \"{}\"", path.display()))?;
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_writer(file);
    if write_header {
        let mut header = headers.clone();
        header.push_field(ANSWERED);
        header.push_field(ISSUE);
        header.push_field(ISSUE_TEXT);
        writer.write_record(&header)?;
    }
    let mut row = row.clone();
    row.push_field(answered);
    row.push_field(issue);
    row.push_field(issue_text);
    writer.write_record(&row)?;
    writer.flush()?;
    Ok(())
}

/// Log the result of a call back from a patient who was missed.
///
/// Every row for the `date` and `mrn` is marked answered. New text is added to any existing
/// notes. The file is only rewritten when a row matched.
pub fn update_callback(
    path: impl AsRef<Path>,
    date: &str,
    mrn: &str,
    issue: &str,
    issue_text: &str,
) -> Result<bool> {
    let path = path.as_ref();
    let mut table = RawTable::load_or_empty(path)?;
    if table.is_empty() {
        return Ok(false);
    }
    let column = |name: &str| {
        table
            .column(name)
            .ok_or_else(|| format_err!("\"{}\" has no `{}` column", path.display(), name))
    };
    let (answered_col, issue_col, text_col) =
        (column(ANSWERED)?, column(ISSUE)?, column(ISSUE_TEXT)?);
    let (date_col, mrn_col) = (column("date")?, column("mrn")?);

    let new_text = issue_text.trim();
    let mut found = false;
    for row in table.rows_mut() {
        if row.get(date_col) != Some(date) || row.get(mrn_col) != Some(mrn) {
            continue;
        }
        let existing = row.get(text_col).unwrap_or("").trim();
        let text = match (existing.is_empty(), new_text.is_empty()) {
            (false, false) => format!("{} | {}", existing, new_text),
            (_, false) => new_text.to_string(),
            (_, true) => existing.to_string(),
        };
        *row = row
            .iter()
            .enumerate()
            .map(|(idx, field)| match idx {
                idx if idx == answered_col => "yes",
                idx if idx == issue_col => issue,
                idx if idx == text_col => text.as_str(),
                _ => field,
            })
            .collect();
        found = true;
    }
    if found {
        table.save(path)?;
    }
    Ok(found)
}

/// Phone numbers of 10 digits are shown as `dddd ddd ddd`.
pub fn format_phone(phone: &str) -> String {
    if phone.len() == 10 && phone.is_ascii() {
        format!("{} {} {}", &phone[..4], &phone[4..7], &phone[7..])
    } else {
        phone.to_string()
    }
}

/// The details read out for a call.
pub fn describe(table: &RawTable, row: &csv::StringRecord) -> String {
    let mut out = String::new();
    let _ = write_description(&mut out, table, row);
    out
}

fn write_description(
    out: &mut String,
    table: &RawTable,
    row: &csv::StringRecord,
) -> std::fmt::Result {
    writeln!(out, "{:<8} {}", "Date:", table.get(row, "date"))?;
    writeln!(
        out,
        "{:<8} {} {} {}",
        "Name:",
        table.get(row, "title"),
        table.get(row, "firstname"),
        table.get(row, "surname")
    )?;
    for (label, column) in DISPLAY_FIELDS {
        let mut value = table.get(row, column).to_string();
        if column == "phone" {
            value = format_phone(&value);
        }
        writeln!(out, "{:<8} {}", format!("{}:", label), value)?;
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use csv::StringRecord;
    use tempfile::TempDir;

    const EPISODES: &str = "\
date,mrn,title,firstname,surname,endo,phone
02-07-2024,10,Mr,Al,Brown,Smith,0412345678
01-07-2024,11,Ms,Bo,Green,Smith,0298765432
30-06-2024,12,Mr,Cy,White,Jones,0400000000
03-07-2024,13,Mr,Di,Black,Jones,0411111111
01-07-2024,14,Ms,Ed,Grey,Jones,0422222222
";

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn episodes(dir: &TempDir) -> RawTable {
        let path = dir.path().join("episodes.csv");
        fs::write(&path, EPISODES).unwrap();
        RawTable::load(path).unwrap()
    }

    fn mrns(rows: &[StringRecord]) -> Vec<&str> {
        rows.iter().map(|row| row.get(1).unwrap()).collect()
    }

    #[test]
    fn outstanding_calls() {
        let dir = TempDir::new().unwrap();
        let episodes = episodes(&dir);
        let log = dir.path().join(FILE);

        // nothing logged yet, and today's patients aren't due
        let none = RawTable::load_or_empty(&log).unwrap();
        let calls = outstanding(&episodes, &none, ymd(2024, 7, 1), ymd(2024, 7, 3)).unwrap();
        assert_eq!(mrns(&calls), ["11", "14", "10"]);

        record_result(&log, episodes.headers(), &calls[0], "yes", "no", "").unwrap();
        let done = RawTable::load_or_empty(&log).unwrap();
        let calls = outstanding(&episodes, &done, ymd(2024, 7, 1), ymd(2024, 7, 3)).unwrap();
        assert_eq!(mrns(&calls), ["14", "10"]);
    }

    #[test]
    fn header_written_once() {
        let dir = TempDir::new().unwrap();
        let episodes = episodes(&dir);
        let log = dir.path().join(FILE);
        fs::write(&log, "").unwrap();

        let rows = episodes.rows();
        record_result(&log, episodes.headers(), &rows[0], "no", "", "").unwrap();
        record_result(&log, episodes.headers(), &rows[1], "yes", "yes", "sore throat").unwrap();

        let contents = fs::read_to_string(&log).unwrap();
        let lines: Vec<_> = contents.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[0],
            "date,mrn,title,firstname,surname,endo,phone,answered,issue,issue_text"
        );
        assert_eq!(
            lines[2],
            "01-07-2024,11,Ms,Bo,Green,Smith,0298765432,yes,yes,sore throat"
        );
    }

    #[test]
    fn callback_appends_notes() {
        let dir = TempDir::new().unwrap();
        let episodes = episodes(&dir);
        let log = dir.path().join(FILE);
        let rows = episodes.rows();
        record_result(&log, episodes.headers(), &rows[0], "yes", "yes", "bleeding").unwrap();
        record_result(&log, episodes.headers(), &rows[1], "no", "", "").unwrap();

        assert!(update_callback(&log, "02-07-2024", "10", "yes", "settled").unwrap());
        assert!(update_callback(&log, "01-07-2024", "11", "no", "").unwrap());
        assert!(!update_callback(&log, "01-07-2024", "99", "no", "").unwrap());

        let table = RawTable::load(&log).unwrap();
        let first = &table.rows()[0];
        assert_eq!(table.get(first, ISSUE_TEXT), "bleeding | settled");
        let second = &table.rows()[1];
        assert_eq!(table.get(second, ANSWERED), "yes");
        assert_eq!(table.get(second, ISSUE), "no");
        assert_eq!(table.get(second, ISSUE_TEXT), "");
    }

    #[test]
    fn callback_without_log() {
        let dir = TempDir::new().unwrap();
        assert!(!update_callback(dir.path().join(FILE), "01-07-2024", "1", "no", "").unwrap());
    }

    #[test]
    fn phone_numbers() {
        assert_eq!(format_phone("0412345678"), "0412 345 678");
        assert_eq!(format_phone("95551234"), "95551234");
        assert_eq!(format_phone(""), "");
    }

    #[test]
    fn call_sheet() {
        let dir = TempDir::new().unwrap();
        let episodes = episodes(&dir);
        let text = describe(&episodes, &episodes.rows()[0]);
        assert!(text.contains("Name:    Mr Al Brown\n"));
        assert!(text.contains("Phone:   0412 345 678\n"));
        assert!(text.contains("Banding: \n"));
    }
}
