//! Small extracts and clean-ups of the practice exports.
use crate::{day_surgery, save_csv, EpisodeRecord, Result};
use chrono::NaiveDate;
use qu::ick_use::*;
use serde::Serialize;
use std::path::{Path, PathBuf};

pub const GLP_FILE: &str = "glp.csv";
pub const RENAMED_FILE: &str = "new_csv.csv";

/// The procedures done on one patient, for the day sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub struct DayRow {
    pub upper: String,
    pub lower: String,
    pub anal: String,
    pub polyp: String,
}

/// Every procedure done on `date`.
pub fn day_extract<'a>(
    records: impl IntoIterator<Item = &'a EpisodeRecord>,
    date: NaiveDate,
) -> Vec<DayRow> {
    records
        .into_iter()
        .filter(|record| record.date == date)
        .map(|record| DayRow {
            upper: record.upper.clone(),
            lower: record.colon.clone(),
            anal: record.anal.clone(),
            polyp: record.polyp.clone(),
        })
        .collect()
}

/// Where the day sheet for `date` is saved.
pub fn day_extract_path(dir: impl AsRef<Path>, date: NaiveDate) -> PathBuf {
    dir.as_ref().join(format!("{}.csv", date.format("%Y-%m-%d")))
}

/// Save the day sheet, returning where it went.
pub fn save_day_extract(
    rows: &[DayRow],
    dir: impl AsRef<Path>,
    date: NaiveDate,
) -> Result<PathBuf> {
    let path = day_extract_path(dir, date);
    save_csv(rows, &path)?;
    event!(
        Level::INFO,
        "{} episodes exported to \"{}\"",
        rows.len(),
        path.display()
    );
    Ok(path)
}

/// Day surgery rows where the GLP-1 question was answered.
pub fn glp_rows(rows: &[csv::StringRecord]) -> Vec<csv::StringRecord> {
    rows.iter()
        .filter(|row| matches!(row.get(day_surgery::GLP1), Some("Yes" | "No")))
        .cloned()
        .collect()
}

/// Rename an endoscopist in day surgery rows, returning how many rows changed.
pub fn rename_doctor(rows: &mut [csv::StringRecord], from: &str, to: &str) -> usize {
    let mut renamed = 0;
    for row in rows.iter_mut() {
        if row.get(day_surgery::ENDOSCOPIST) != Some(from) {
            continue;
        }
        *row = row
            .iter()
            .enumerate()
            .map(|(idx, field)| {
                if idx == day_surgery::ENDOSCOPIST {
                    to
                } else {
                    field
                }
            })
            .collect();
        renamed += 1;
    }
    renamed
}

#[cfg(test)]
mod test {
    use super::*;
    use csv::StringRecord;
    use std::fs;
    use tempfile::TempDir;

    fn record(date: (i32, u32, u32), upper: &str, colon: &str) -> EpisodeRecord {
        EpisodeRecord {
            date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            mrn: "1".into(),
            anaes: String::new(),
            endo: String::new(),
            upper: upper.into(),
            colon: colon.into(),
            anal: String::new(),
            caecum: String::new(),
            title: String::new(),
            firstname: String::new(),
            surname: String::new(),
            dob: String::new(),
            polyp: "yes".into(),
        }
    }

    fn day_surgery_row(doctor: &str, glp: &str) -> StringRecord {
        StringRecord::from(vec![
            "02-05-2024", "77", "0800", "0830", "Dr B", doctor, "2", "30473", "", "", "", "", glp,
            "",
        ])
    }

    #[test]
    fn day_sheet() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 2).unwrap();
        let records = vec![
            record((2024, 5, 2), "30473", "32090"),
            record((2024, 5, 3), "30473", ""),
        ];
        let rows = day_extract(&records, date);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].lower, "32090");

        let dir = TempDir::new().unwrap();
        let path = save_day_extract(&rows, dir.path(), date).unwrap();
        assert_eq!(path, dir.path().join("2024-05-02.csv"));
        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with("UPPER,LOWER,ANAL,POLYP\n30473,32090,,yes\n"));
    }

    #[test]
    fn glp_answered_only() {
        let rows = vec![
            day_surgery_row("Dr A", "Yes"),
            day_surgery_row("Dr A", ""),
            day_surgery_row("Dr A", "No"),
            day_surgery_row("Dr A", "yes"),
            StringRecord::from(vec!["02-05-2024", "77"]),
        ];
        let kept = glp_rows(&rows);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[1].get(12), Some("No"));
    }

    #[test]
    fn rename() {
        let mut rows = vec![
            day_surgery_row("Dr R Feller", ""),
            day_surgery_row("Dr A Smith", ""),
        ];
        assert_eq!(rename_doctor(&mut rows, "Dr R Feller", "A/Prof R Feller"), 1);
        assert_eq!(rows[0].get(5), Some("A/Prof R Feller"));
        assert_eq!(rows[0].len(), 14);
        assert_eq!(rows[1].get(5), Some("Dr A Smith"));
    }
}
