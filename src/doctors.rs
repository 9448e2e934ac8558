//! Which doctor did a procedure.
//!
//! The hospital extract doesn't record the endoscopist, so we look the episode up in the
//! practice's own `episodes.csv`. The two systems don't always agree on spelling or birth dates,
//! so there are three indexes of decreasing specificity:
//!
//!  1. date + birth date + surname
//!  2. date + birth date
//!  3. date + surname
//!
//! A lookup tries each in order and settles for the first hit.
//!
//! The directory is built straight from the raw text of `episodes.csv`, so a row with a date in
//! some other format just never matches rather than stopping the run.
use crate::{
    dates::{normalize_dob, strip_separators},
    ArcStr, Result,
};
use qu::ick_use::*;
use serde::Deserialize;
use std::{collections::HashMap, path::Path};

/// Doctor name given to episodes the practice has no record of.
pub const UNKNOWN_DOCTOR: &str = "unknown";

/// The columns of `episodes.csv` the directory is built from, as raw text.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DirectoryRow {
    /// `dd-mm-yyyy`
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub mrn: String,
    #[serde(default)]
    pub endo: String,
    #[serde(default)]
    pub surname: String,
    /// `d/m/yyyy`
    #[serde(default)]
    pub dob: String,
}

/// Who did a procedure, and the patient details the practice holds for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DoctorEntry {
    /// Lower-cased doctor name.
    pub doctor: ArcStr,
    pub mrn: ArcStr,
    /// Birth date normalised to `ddmmyyyy`.
    pub dob: ArcStr,
}

impl DoctorEntry {
    /// The entry returned when nothing matches.
    pub fn unknown() -> Self {
        Self {
            doctor: UNKNOWN_DOCTOR.into(),
            mrn: "?".into(),
            dob: "?".into(),
        }
    }

    pub fn is_unknown(&self) -> bool {
        &*self.doctor == UNKNOWN_DOCTOR
    }
}

/// The normalised parts a key is built from.
#[derive(Debug, Copy, Clone)]
pub struct KeyParts<'a> {
    /// `ddmmyyyy`
    pub date: &'a str,
    /// `ddmmyyyy`
    pub dob: &'a str,
    /// lower case
    pub surname: &'a str,
}

type KeyBuilder = fn(KeyParts<'_>) -> String;

/// Key builders, most specific first.
const TIERS: [KeyBuilder; 3] = [full_key, date_dob_key, date_surname_key];

fn full_key(k: KeyParts<'_>) -> String {
    format!("{}{}{}", k.date, k.dob, k.surname)
}

fn date_dob_key(k: KeyParts<'_>) -> String {
    format!("{}{}", k.date, k.dob)
}

fn date_surname_key(k: KeyParts<'_>) -> String {
    format!("{}{}", k.date, k.surname)
}

#[derive(Debug, Clone, Default)]
pub struct DoctorDirectory {
    tiers: [HashMap<String, DoctorEntry>; 3],
}

impl DoctorDirectory {
    /// Build the directory from the practice's episodes table.
    ///
    /// Rows that can't be read at all are skipped.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_path(path)
            .with_context(|| format!("while loading \"{}\"", path.display()))?;
        let rows = reader
            .into_deserialize::<DirectoryRow>()
            .filter_map(|row| match row {
                Ok(row) => Some(row),
                Err(e) => {
                    event!(Level::DEBUG, "skipping episode row: {}", e);
                    None
                }
            });
        Ok(Self::from_rows(rows))
    }

    pub fn from_rows(rows: impl IntoIterator<Item = DirectoryRow>) -> Self {
        let mut this = Self::default();
        for row in rows {
            this.insert_row(&row);
        }
        event!(
            Level::DEBUG,
            "doctor directory has {} full keys",
            this.tiers[0].len()
        );
        this
    }

    fn insert_row(&mut self, row: &DirectoryRow) {
        let date = strip_separators(&row.date);
        let dob = normalize_dob(&row.dob);
        let surname = row.surname.to_lowercase();
        self.insert(
            KeyParts {
                date: &date,
                dob: &dob,
                surname: &surname,
            },
            DoctorEntry {
                doctor: row.endo.to_lowercase().into(),
                mrn: row.mrn.as_str().into(),
                dob: dob.as_str().into(),
            },
        );
    }

    /// Add an entry under all three keys. Later entries replace earlier ones.
    fn insert(&mut self, parts: KeyParts<'_>, entry: DoctorEntry) {
        for (tier, build) in self.tiers.iter_mut().zip(TIERS) {
            tier.insert(build(parts), entry.clone());
        }
    }

    /// Find the doctor for an episode, falling back to less specific keys, and finally to
    /// `DoctorEntry::unknown`.
    pub fn lookup(&self, date: &str, dob: &str, surname: &str) -> DoctorEntry {
        let parts = KeyParts { date, dob, surname };
        self.tiers
            .iter()
            .zip(TIERS)
            .find_map(|(tier, build)| tier.get(&build(parts)))
            .cloned()
            .unwrap_or_else(DoctorEntry::unknown)
    }

    pub fn len(&self) -> usize {
        self.tiers[0].len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiers[0].is_empty()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn row(date: &str, mrn: &str, endo: &str, surname: &str, dob: &str) -> DirectoryRow {
        DirectoryRow {
            date: date.into(),
            mrn: mrn.into(),
            endo: endo.into(),
            surname: surname.into(),
            dob: dob.into(),
        }
    }

    fn directory() -> DoctorDirectory {
        DoctorDirectory::from_rows([
            row("12-03-2024", "1001", "Smith", "Brown", "1/02/1960"),
            row("12-03-2024", "1002", "Jones", "Green", "15/08/1971"),
        ])
    }

    #[test]
    fn full_key_hit() {
        let entry = directory().lookup("12032024", "01021960", "brown");
        assert_eq!(&*entry.doctor, "smith");
        assert_eq!(&*entry.mrn, "1001");
        assert_eq!(&*entry.dob, "01021960");
        assert!(!entry.is_unknown());
    }

    #[test]
    fn falls_back_to_date_and_dob() {
        // surname misspelt in the hospital system
        let entry = directory().lookup("12032024", "15081971", "gren");
        assert_eq!(&*entry.doctor, "jones");
    }

    #[test]
    fn falls_back_to_date_and_surname() {
        let entry = directory().lookup("12032024", "99999999", "brown");
        assert_eq!(&*entry.doctor, "smith");
        assert_eq!(&*entry.dob, "01021960");
    }

    #[test]
    fn miss_gives_unknown() {
        let entry = directory().lookup("13032024", "01021960", "brown");
        assert!(entry.is_unknown());
        assert_eq!(&*entry.doctor, UNKNOWN_DOCTOR);
        assert_eq!(&*entry.mrn, "?");
        assert_eq!(&*entry.dob, "?");
    }

    #[test]
    fn later_rows_win() {
        let dir = DoctorDirectory::from_rows([
            row("12-03-2024", "1", "Smith", "Brown", "1/02/1960"),
            row("12-03-2024", "1", "Jones", "Brown", "1/02/1960"),
        ]);
        assert_eq!(&*dir.lookup("12032024", "01021960", "brown").doctor, "jones");
        assert_eq!(dir.len(), 1);
    }

    #[test]
    fn load_tolerates_odd_rows() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("episodes.csv");
        fs::write(
            &path,
            "date,mrn,anaes,endo,surname,dob\n\
             12-03-2024,1001,Lee,Smith,Brown,1/02/1960\n\
             2024/03/13,1002,Lee,Jones,Green,15/08/1971\n\
             14-03-2024,1003\n\
             15-03-2024,1004,Lee,Jones,White,3/11/1955\n",
        )
        .unwrap();

        let dir = DoctorDirectory::load(&path).unwrap();
        assert_eq!(dir.len(), 4);
        assert_eq!(&*dir.lookup("12032024", "01021960", "brown").doctor, "smith");
        assert_eq!(&*dir.lookup("15032024", "03111955", "white").doctor, "jones");
        // the unparseable date never matches a real one
        assert!(dir.lookup("13032024", "15081971", "green").is_unknown());
    }

    #[test]
    fn load_missing_file_is_an_error() {
        let tmp = TempDir::new().unwrap();
        assert!(DoctorDirectory::load(tmp.path().join("episodes.csv")).is_err());
    }
}
