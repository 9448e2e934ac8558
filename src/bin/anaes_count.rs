use clap::Parser;
use endoscopy_audit::{
    counts::{self, anaesthetist_counts},
    period::{self, or_prompt},
    save_text, Config, EpisodeRecord, EPISODES_FILE,
};
use qu::ick_use::*;
use std::path::PathBuf;

/// Procedures per anaesthetist for a year.
#[derive(Parser)]
struct Opt {
    #[clap(long, short)]
    year: Option<i32>,
    #[clap(long, short)]
    config: Option<PathBuf>,
}

#[qu::ick]
pub fn main(opt: Opt) -> Result {
    let config = Config::load_or_default(opt.config.as_deref())?;
    let year = or_prompt(opt.year, "Enter year (e.g. 2025): ", period::parse_year)?;
    let records = EpisodeRecord::load(config.data_path(EPISODES_FILE))?;

    let counts = anaesthetist_counts(&records, year);
    if counts.is_empty() {
        println!("No procedures found for {}.", year);
        return Ok(());
    }
    let path = config.output_path(counts::ANAES_REPORT);
    save_text(&counts.report(), &path)?;
    println!("Results for {} written to {}", year, path.display());
    Ok(())
}
