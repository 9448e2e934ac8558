use clap::Parser;
use endoscopy_audit::{
    caecum::{self, CaecumStats},
    period::{self, or_prompt},
    save_text, Config, EpisodeRecord, MonthSpan, Quarter, EPISODES_FILE,
};
use qu::ick_use::*;
use std::path::PathBuf;

/// Caecal intubation rates.
///
/// By default this writes the quarterly QPS/TQM report. Pass `--span` (or `--months`) for the
/// rates over an arbitrary run of months instead.
#[derive(Parser)]
struct Opt {
    #[clap(long, short)]
    year: Option<i32>,
    /// The month the quarter ends in: 3, 6, 9 or 12.
    #[clap(long, short)]
    quarter: Option<u32>,
    /// Report on a run of months rather than a quarter.
    #[clap(long, short)]
    span: bool,
    /// Report on this many months starting at `--first-month`. Implies `--span`.
    #[clap(long, value_parser = period::parse_count)]
    months: Option<u32>,
    #[clap(long)]
    first_month: Option<u32>,
    #[clap(long, short)]
    config: Option<PathBuf>,
}

#[qu::ick]
pub fn main(opt: Opt) -> Result {
    let config = Config::load_or_default(opt.config.as_deref())?;
    let records = EpisodeRecord::load(config.data_path(EPISODES_FILE))?;
    let year = or_prompt(opt.year, "Year as 4 digits:  ", period::parse_year)?;

    if opt.span || opt.months.is_some() {
        let count = or_prompt(
            opt.months,
            "How many months of data do you want?  ",
            period::parse_count,
        )?;
        let first_month = or_prompt(
            opt.first_month,
            "Enter first month of period as two digits:  ",
            period::parse_month,
        )?;
        let span = MonthSpan {
            year,
            first_month,
            count,
        };
        let stats = CaecumStats::for_span(&records, span);
        let report = caecum::rates_report(&stats, span);
        println!("{}", report);
        save_text(&report, config.output_path(caecum::RATES_REPORT))?;
        return Ok(());
    }

    let end_month = or_prompt(
        opt.quarter,
        "Enter the month to finish survey as a number, 3, 6, 9, 12: ",
        period::parse_quarter_end,
    )?;
    let quarter = Quarter::new(year, end_month)?;
    let stats = CaecumStats::for_quarter(&records, quarter);
    if stats.is_empty() {
        event!(Level::WARN, "no colonoscopies found for {}", quarter);
    }
    let report = caecum::qps_report(&stats, quarter);
    println!("{}", report);
    save_text(&report, config.output_path(caecum::QPS_REPORT))?;
    Ok(())
}
