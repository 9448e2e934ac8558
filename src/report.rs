//! ADR reports: a fixed width text table for reading, and a CSV copy for spreadsheets.
use crate::{adr::AdrStats, save_csv, save_text, title_case, Result};
use serde::Serialize;
use std::{fmt::Write, path::Path};

pub const TEXT_REPORT: &str = "adr.txt";
pub const CSV_REPORT: &str = "output.csv";

/// One doctor's line in the CSV report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportRow {
    #[serde(rename = "Doctor")]
    pub doctor: String,
    #[serde(rename = "Total Cols")]
    pub colonoscopies: u32,
    #[serde(rename = "%ADR")]
    pub adr: i64,
    #[serde(rename = "%ADR<50")]
    pub adr_under_50: i64,
    #[serde(rename = "%ADR>50")]
    pub adr_over_50: i64,
    #[serde(rename = "%SSA(all ages)")]
    pub ssa: i64,
}

pub fn report_rows(stats: &AdrStats) -> Vec<ReportRow> {
    stats
        .doctor_rates()
        .map(|rates| ReportRow {
            doctor: title_case(&rates.doctor),
            colonoscopies: rates.colonoscopies,
            adr: rates.adr,
            adr_under_50: rates.adr_under_50,
            adr_over_50: rates.adr_over_50,
            ssa: rates.ssa,
        })
        .collect()
}

/// Render the text report.
pub fn adr_text(stats: &AdrStats) -> String {
    let mut out = String::new();
    // Writing to a `String` can't fail.
    let _ = write_adr_text(&mut out, stats);
    out
}

fn write_adr_text(out: &mut String, stats: &AdrStats) -> std::fmt::Result {
    writeln!(out, "ADR Results from {}", stats.date_range())?;
    writeln!(
        out,
        "{:20}Total Cols     ADR       ADR<50      ADR>50   SSA(all ages)",
        ""
    )?;
    for row in report_rows(stats) {
        writeln!(
            out,
            "{:<20}  {:<10}  {:<10}  {:<10} {:<10} {:<10}",
            row.doctor,
            row.colonoscopies,
            row.adr,
            row.adr_under_50,
            row.adr_over_50,
            row.ssa,
        )?;
    }
    out.push_str("\n\n");
    writeln!(
        out,
        "Total colonoscopies done on patients over 50 years:  {}",
        stats.unit_over_50().colonoscopies
    )?;
    writeln!(out, "Unit wide ADR for over 50 years:  {}%", stats.unit_adr())?;
    writeln!(out, "Unit wide SSA for over 50 years:  {}%", stats.unit_ssa())?;
    Ok(())
}

/// Write both reports into `dir`.
pub fn save_reports(stats: &AdrStats, dir: impl AsRef<Path>) -> Result {
    let dir = dir.as_ref();
    save_text(&adr_text(stats), dir.join(TEXT_REPORT))?;
    save_csv(&report_rows(stats), dir.join(CSV_REPORT))?;
    Ok(())
}
