//! Caecal intubation: how often a colonoscopy reached the caecum.
//!
//! The `caecum` column of `episodes.csv` is empty for upper endoscopies, `success` when the
//! caecum was reached, and otherwise holds the reason it wasn't (`Poor Prep`, `Obstruction`,
//! ...).
use crate::{adr::rate, dates::format_dashed, EpisodeRecord, MonthSpan, Quarter};
use chrono::NaiveDate;
use itertools::Itertools;
use std::{collections::BTreeMap, fmt::Write};

pub const QPS_REPORT: &str = "caecum_qps.txt";
pub const RATES_REPORT: &str = "caecum.txt";

const SUCCESS: &str = "success";
const POOR_PREP: &str = "Poor Prep";
/// Failures for this reason aren't held against the unit.
const OBSTRUCTION: &str = "Obstruction";

/// One doctor's colonoscopies.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct DoctorCaecum {
    pub total: u32,
    pub success: u32,
    pub fail: u32,
    pub poor_prep: u32,
}

impl DoctorCaecum {
    /// Failures for reasons other than poor bowel prep.
    pub fn other_fails(&self) -> u32 {
        self.fail - self.poor_prep
    }

    pub fn failure_rate(&self) -> i64 {
        rate(self.fail, self.total)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub date: NaiveDate,
    pub doctor: String,
    pub mrn: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaecumStats {
    doctors: BTreeMap<String, DoctorCaecum>,
    colonoscopies: u32,
    poor_preps: u32,
    failures_excluding_obstruction: u32,
    failures: Vec<Failure>,
}

impl CaecumStats {
    /// Tally the colonoscopies whose date passes `include`.
    pub fn collect<'a>(
        records: impl IntoIterator<Item = &'a EpisodeRecord>,
        include: impl Fn(NaiveDate) -> bool,
    ) -> Self {
        let mut this = Self::default();
        for record in records {
            if !record.caecum.trim().is_empty() && include(record.date) {
                this.add(record);
            }
        }
        this
    }

    pub fn for_quarter<'a>(
        records: impl IntoIterator<Item = &'a EpisodeRecord>,
        quarter: Quarter,
    ) -> Self {
        Self::collect(records, |date| quarter.contains(date))
    }

    pub fn for_span<'a>(
        records: impl IntoIterator<Item = &'a EpisodeRecord>,
        span: MonthSpan,
    ) -> Self {
        Self::collect(records, |date| span.contains(date))
    }

    fn add(&mut self, record: &EpisodeRecord) {
        let outcome = record.caecum.trim();
        let doctor = self.doctors.entry(record.endo.clone()).or_default();
        doctor.total += 1;
        self.colonoscopies += 1;

        if outcome == SUCCESS {
            doctor.success += 1;
            return;
        }
        doctor.fail += 1;
        if outcome == POOR_PREP {
            doctor.poor_prep += 1;
            self.poor_preps += 1;
        }
        if outcome != OBSTRUCTION {
            self.failures_excluding_obstruction += 1;
        }
        self.failures.push(Failure {
            date: record.date,
            doctor: record.endo.clone(),
            mrn: record.mrn.clone(),
            reason: outcome.to_string(),
        });
    }

    pub fn colonoscopies(&self) -> u32 {
        self.colonoscopies
    }

    pub fn poor_preps(&self) -> u32 {
        self.poor_preps
    }

    /// Failures to reach the caecum, apart from those caused by an obstruction. Poor preps are
    /// included.
    pub fn failures_excluding_obstruction(&self) -> u32 {
        self.failures_excluding_obstruction
    }

    /// Every failure, in file order.
    pub fn failures(&self) -> &[Failure] {
        &self.failures
    }

    pub fn doctor(&self, name: &str) -> Option<&DoctorCaecum> {
        self.doctors.get(name)
    }

    /// Doctors in alphabetical order.
    pub fn doctors(&self) -> impl Iterator<Item = (&str, &DoctorCaecum)> + '_ {
        self.doctors.iter().map(|(name, counts)| (name.as_str(), counts))
    }

    pub fn is_empty(&self) -> bool {
        self.colonoscopies == 0
    }
}

/// The quarterly report for the QPS and TQM committees.
pub fn qps_report(stats: &CaecumStats, quarter: Quarter) -> String {
    let mut out = String::new();
    let _ = write_qps_report(&mut out, stats, quarter);
    out
}

fn write_qps_report(out: &mut String, stats: &CaecumStats, quarter: Quarter) -> std::fmt::Result {
    writeln!(out, "QPS CAECUM DATA FOR {}\n\n", quarter)?;
    writeln!(out, "         Total colons performed:  {}\n", stats.colonoscopies)?;
    writeln!(
        out,
        "         Total number of bad bowel preps:  {}\n",
        stats.poor_preps
    )?;
    writeln!(
        out,
        "         Total failure to reach caecum minus obstruction:  {}\n\n\n",
        stats.failures_excluding_obstruction
    )?;

    writeln!(out, "TQM CAECUM DATA FOR {}\n\n", quarter)?;
    writeln!(
        out,
        "Doctor                        Total colons    Poor Prep   Other Failures   % Failed\n"
    )?;
    for (doctor, counts) in stats.doctors() {
        writeln!(
            out,
            "{:<20}:{:15}{:<8}   {:<8} {:<8} {}",
            doctor,
            "",
            counts.total,
            counts.poor_prep,
            counts.other_fails(),
            counts.failure_rate()
        )?;
    }

    out.push_str("\n\n");
    for failure in &stats.failures {
        writeln!(
            out,
            "{}\t{:<20}\t{:<20}\t{}",
            format_dashed(failure.date),
            failure.doctor,
            failure.mrn,
            failure.reason
        )?;
    }
    Ok(())
}

/// Intubation rates over a run of months, laid out as two tables.
pub fn rates_report(stats: &CaecumStats, span: MonthSpan) -> String {
    let mut doctors = vec![vec![
        "Endoscopist".to_string(),
        "Colonoscopies".to_string(),
        "Failures".to_string(),
        "% Failures".to_string(),
    ]];
    doctors.extend(stats.doctors().map(|(doctor, counts)| {
        vec![
            doctor.to_string(),
            counts.total.to_string(),
            counts.fail.to_string(),
            counts.failure_rate().to_string(),
        ]
    }));
    let failures: Vec<Vec<String>> = stats
        .failures
        .iter()
        .map(|f| {
            vec![
                format_dashed(f.date),
                f.doctor.clone(),
                f.mrn.clone(),
                f.reason.clone(),
            ]
        })
        .collect();

    format!(
        "CAECAL INTUBATION RATES FOR {}\n\n\n{}\n\n\n\n\n{}",
        span,
        fixed_width(&doctors),
        fixed_width(&failures)
    )
}

/// Left-align each column to its widest cell plus two spaces.
fn fixed_width(rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = vec![];
    for row in rows {
        for (idx, cell) in row.iter().enumerate() {
            let len = cell.chars().count();
            match widths.get_mut(idx) {
                Some(width) => *width = (*width).max(len),
                None => widths.push(len),
            }
        }
    }
    rows.iter()
        .map(|row| {
            let mut line = String::new();
            for (cell, width) in row.iter().zip(&widths) {
                let _ = write!(line, "{:<w$}", cell, w = width + 2);
            }
            line.trim_end().to_string()
        })
        .join("\n")
}
