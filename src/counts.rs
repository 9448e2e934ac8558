//! Simple tallies over `episodes.csv`.
use crate::{EpisodeRecord, HalfYear};
use chrono::Datelike;
use std::{collections::HashMap, fmt::Write};

pub const ANAES_REPORT: &str = "anaes_count.txt";

/// Item number for an oesophageal dilatation.
pub const DILATATION: &str = "30475";

/// Procedures per anaesthetist for one year.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnaesthetistCounts {
    pub year: i32,
    /// Busiest first. Equal counts keep the order the names first appear in.
    pub counts: Vec<(String, u32)>,
}

impl AnaesthetistCounts {
    pub fn total(&self) -> u32 {
        self.counts.iter().map(|(_, count)| count).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn report(&self) -> String {
        let mut out = String::new();
        let _ = self.write_report(&mut out);
        out
    }

    fn write_report(&self, out: &mut String) -> std::fmt::Result {
        let rule = "-".repeat(35);
        writeln!(out, "Anaesthetist procedure counts for {}:", self.year)?;
        writeln!(out, "{}", rule)?;
        for (name, count) in &self.counts {
            writeln!(out, "{:<20} {}", name, count)?;
        }
        writeln!(out, "{}", rule)?;
        writeln!(out, "{:<20} {}", "Total", self.total())
    }
}

pub fn anaesthetist_counts<'a>(
    records: impl IntoIterator<Item = &'a EpisodeRecord>,
    year: i32,
) -> AnaesthetistCounts {
    let mut counts: Vec<(String, u32)> = vec![];
    let mut idx_map: HashMap<&str, usize> = HashMap::new();
    for record in records {
        let anaes = record.anaes.trim();
        if record.date.year() != year || anaes.is_empty() {
            continue;
        }
        match idx_map.get(anaes) {
            Some(&idx) => counts[idx].1 += 1,
            None => {
                idx_map.insert(anaes, counts.len());
                counts.push((anaes.to_string(), 1));
            }
        }
    }
    // stable, so ties stay in first-seen order
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    AnaesthetistCounts { year, counts }
}

/// Upper endoscopies over half a year.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct ProcedureCounts {
    pub upper_endoscopies: u32,
    pub dilatations: u32,
}

pub fn procedure_counts<'a>(
    records: impl IntoIterator<Item = &'a EpisodeRecord>,
    year: i32,
    half: HalfYear,
) -> ProcedureCounts {
    let mut counts = ProcedureCounts::default();
    for record in records {
        if !half.contains(year, record.date) {
            continue;
        }
        let upper = record.upper.trim();
        if !upper.is_empty() {
            counts.upper_endoscopies += 1;
        }
        if upper == DILATATION {
            counts.dilatations += 1;
        }
    }
    counts
}
