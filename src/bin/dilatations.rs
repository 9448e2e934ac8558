use clap::Parser;
use endoscopy_audit::{
    counts::procedure_counts,
    period::{self, or_prompt},
    Config, EpisodeRecord, HalfYear, EPISODES_FILE,
};
use qu::ick_use::*;
use std::path::PathBuf;

/// Oesophageal dilatations over half a year.
#[derive(Parser)]
struct Opt {
    #[clap(long, short)]
    year: Option<i32>,
    /// 1 for January-June, 2 for July-December.
    #[clap(long, short = 'p', value_parser = period::parse_half_year)]
    half: Option<HalfYear>,
    #[clap(long, short)]
    config: Option<PathBuf>,
}

#[qu::ick]
pub fn main(opt: Opt) -> Result {
    let config = Config::load_or_default(opt.config.as_deref())?;
    println!("Welcome to Dilatation Counter\n");
    let year = or_prompt(opt.year, "Enter year: ", period::parse_year)?;
    let half = or_prompt(
        opt.half,
        "Select period:\n1. January-June\n2. July-December\nEnter 1 or 2: ",
        period::parse_half_year,
    )?;

    let records = EpisodeRecord::load(config.data_path(EPISODES_FILE))?;
    let counts = procedure_counts(&records, year, half);
    println!(
        "\nThe number of dilatations performed in the period {} {} was {}.",
        half.label(),
        year,
        counts.dilatations
    );
    println!(
        "Upper endoscopies in the same period: {}",
        counts.upper_endoscopies
    );
    Ok(())
}
