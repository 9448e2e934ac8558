use chrono::{Datelike, Local};
use clap::Parser;
use endoscopy_audit::{
    target::{patients_this_year, WeeklyTarget},
    Config,
};
use qu::ick_use::*;
use std::path::PathBuf;

/// Whether this year's patient numbers are on track for a weekly target.
#[derive(Parser)]
struct Opt {
    /// Patients per week. Defaults to the config file's `weekly_target`.
    #[clap(long, short)]
    weekly: Option<u32>,
    /// The sedation master list, relative to the data directory.
    #[clap(long, default_value = "sedation/master.csv")]
    master: PathBuf,
    /// Patients since the master list was last updated, relative to the data directory.
    #[clap(long, default_value = "sedation/current.csv")]
    current: PathBuf,
    #[clap(long, short)]
    config: Option<PathBuf>,
}

#[qu::ick]
pub fn main(opt: Opt) -> Result {
    let config = Config::load_or_default(opt.config.as_deref())?;
    let today = Local::now().date_naive();
    let count = patients_this_year(
        config.data_path(&opt.master),
        config.data_path(&opt.current),
        today.year(),
    )?;
    let weekly = opt.weekly.unwrap_or(config.weekly_target);
    let target = WeeklyTarget::new(count, weekly, config.carry_over, today);
    println!("{}", target);
    Ok(())
}
