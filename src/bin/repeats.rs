use clap::Parser;
use endoscopy_audit::{
    day_surgery,
    period::{self, or_prompt},
    repeats::{self, Admission, Repeats},
    save_text, Config, Quarter,
};
use qu::ick_use::*;
use std::path::PathBuf;

/// Patients readmitted for a repeat procedure, for the quarterly QPS survey.
#[derive(Parser)]
struct Opt {
    #[clap(long, short)]
    year: Option<i32>,
    /// The month the quarter ends in: 3, 6, 9 or 12.
    #[clap(long, short)]
    quarter: Option<u32>,
    /// Override the repeat window from the config file.
    #[clap(long, short)]
    window_days: Option<i64>,
    #[clap(long, short)]
    config: Option<PathBuf>,
}

#[qu::ick]
pub fn main(opt: Opt) -> Result {
    let config = Config::load_or_default(opt.config.as_deref())?;
    let window_days = opt.window_days.unwrap_or(config.repeat_window_days);
    ensure!(window_days > 0, "the repeat window must be at least a day");

    let year = or_prompt(opt.year, "Year as 4 digits:  ", period::parse_year)?;
    let end_month = or_prompt(
        opt.quarter,
        "Enter the month to finish survey as a number, 3, 6, 9, 12: ",
        period::parse_quarter_end,
    )?;
    let quarter = Quarter::new(year, end_month)?;

    let admissions = Admission::load(config.data_path(day_surgery::FILE))?;
    let repeats = Repeats::find(&admissions, quarter, window_days);
    let report = repeats.report();
    println!("{}", report);
    save_text(&report, config.output_path(repeats::REPORT))?;
    Ok(())
}
