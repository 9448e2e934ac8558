//! Patients who came back for a repeat procedure within a few weeks.
//!
//! The survey is run at the end of each quarter. A repeat can straddle the start of the quarter,
//! so admissions from the month before are looked at too.
use crate::{
    dates::{format_dashed, DMY_DASHED},
    day_surgery, load_headerless, Quarter, Result,
};
use chrono::{Datelike, NaiveDate};
use qu::ick_use::*;
use std::{collections::HashMap, fmt::Write, path::Path};

pub const REPORT: &str = "repeats.txt";

/// One row of `day_surgery.csv`, keeping only the fields used here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Admission {
    pub date: NaiveDate,
    pub mrn: String,
    pub endoscopist: String,
    /// Item number of the upper procedure, if there was one.
    pub upper: String,
    /// Item number of the colonoscopy, if there was one.
    pub colon: String,
}

impl Admission {
    pub fn from_record(record: &csv::StringRecord) -> Result<Self> {
        let field = |idx| record.get(idx).unwrap_or("").trim();
        let date = NaiveDate::parse_from_str(field(day_surgery::DATE), DMY_DASHED)
            .with_context(|| format!("bad admission date \"{}\"", field(day_surgery::DATE)))?;
        Ok(Admission {
            date,
            mrn: field(day_surgery::MRN).into(),
            endoscopist: field(day_surgery::ENDOSCOPIST).into(),
            upper: field(day_surgery::UPPER).into(),
            colon: field(day_surgery::COLON).into(),
        })
    }

    /// Load every admission.
    pub fn load(path: impl AsRef<Path>) -> Result<Vec<Self>> {
        let path = path.as_ref();
        load_headerless(path)?
            .iter()
            .enumerate()
            .map(|(idx, record)| {
                Admission::from_record(record)
                    .with_context(|| format!("row {} of \"{}\"", idx + 1, path.display()))
            })
            .collect()
    }

    pub fn upper_label(&self) -> &str {
        if self.upper.is_empty() {
            ""
        } else {
            "upper"
        }
    }

    pub fn colon_label(&self) -> &str {
        if self.colon.starts_with("320") {
            "short colon"
        } else if self.colon.starts_with("322") {
            "long colon"
        } else {
            &self.colon
        }
    }

    /// How many procedures were done in this admission.
    fn procedure_count(&self) -> u32 {
        u32::from(!self.upper.is_empty()) + u32::from(!self.colon.is_empty())
    }
}

/// A patient's admissions in the look-back period, without same-day duplicates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatientAdmissions {
    pub mrn: String,
    pub admissions: Vec<Admission>,
}

impl PatientAdmissions {
    /// Whether the first two admissions count as a repeat.
    fn is_repeat(&self, quarter: Quarter, window_days: i64) -> bool {
        let [first, second, ..] = self.admissions.as_slice() else {
            return false;
        };
        // already reported with the last quarter
        if (second.date.year(), second.date.month()) == quarter.previous_month() {
            return false;
        }
        if (second.date - first.date).num_days().abs() >= window_days {
            return false;
        }
        // an upper and a colonoscopy on separate days
        let split = (first.upper.is_empty() || second.upper.is_empty())
            && (first.colon.is_empty() || second.colon.is_empty());
        !split
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repeats {
    pub quarter: Quarter,
    /// Patients with a repeat, in the order they first appear.
    pub patients: Vec<PatientAdmissions>,
    /// Procedures done in the quarter itself.
    pub total_procedures: u32,
}

impl Repeats {
    pub fn find<'a>(
        admissions: impl IntoIterator<Item = &'a Admission>,
        quarter: Quarter,
        window_days: i64,
    ) -> Self {
        let mut patients: Vec<PatientAdmissions> = vec![];
        let mut idx_map: HashMap<String, usize> = HashMap::new();
        let mut total_procedures = 0;

        for admission in admissions {
            if quarter.contains(admission.date) {
                total_procedures += admission.procedure_count();
            }
            if !quarter.contains_with_lookback(admission.date) {
                continue;
            }
            match idx_map.get(&admission.mrn) {
                Some(&idx) => {
                    let patient = &mut patients[idx];
                    if patient.admissions.iter().all(|a| a.date != admission.date) {
                        patient.admissions.push(admission.clone());
                    }
                }
                None => {
                    idx_map.insert(admission.mrn.clone(), patients.len());
                    patients.push(PatientAdmissions {
                        mrn: admission.mrn.clone(),
                        admissions: vec![admission.clone()],
                    });
                }
            }
        }
        event!(
            Level::DEBUG,
            "{} patients admitted in or just before {}",
            patients.len(),
            quarter
        );

        patients.retain(|patient| patient.is_repeat(quarter, window_days));
        Repeats {
            quarter,
            patients,
            total_procedures,
        }
    }

    pub fn count(&self) -> usize {
        self.patients.len()
    }

    pub fn report(&self) -> String {
        let mut out = String::new();
        let _ = self.write_report(&mut out);
        out
    }

    fn write_report(&self, out: &mut String) -> std::fmt::Result {
        writeln!(
            out,
            "QPS REPORT ON REPEAT PROCEDURES IN THE 3 MONTHS UP TO {}/{}\n",
            self.quarter.end_month(),
            self.quarter.year()
        )?;
        for patient in &self.patients {
            for (idx, admission) in patient.admissions.iter().enumerate() {
                let (mrn, doctor) = if idx == 0 {
                    (patient.mrn.as_str(), admission.endoscopist.as_str())
                } else {
                    ("", "")
                };
                writeln!(
                    out,
                    "{:<10} {:<12} {:<25} {:<10} {:<10}",
                    mrn,
                    format_dashed(admission.date),
                    doctor,
                    admission.upper_label(),
                    admission.colon_label()
                )?;
            }
            out.push_str("\n\n");
        }
        writeln!(out)?;
        writeln!(out, "Number of repeats: {}", self.count())?;
        write!(out, "Total number of procedures: {}", self.total_procedures)
    }
}
