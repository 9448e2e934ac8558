use chrono::NaiveDate;
use clap::Parser;
use endoscopy_audit::{
    dates::DMY_DASHED,
    extract::{day_extract, save_day_extract},
    Config, EpisodeRecord, EPISODES_FILE,
};
use qu::ick_use::*;
use std::path::PathBuf;

/// The procedures done on one day, for the billing sheet.
#[derive(Parser)]
struct Opt {
    /// The day to extract, `dd-mm-yyyy`.
    #[clap(value_parser = parse_date)]
    date: NaiveDate,
    #[clap(long, short)]
    config: Option<PathBuf>,
}

fn parse_date(input: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), DMY_DASHED)
        .with_context(|| format!("expected a date like 25-12-2024, found \"{}\"", input))
}

#[qu::ick]
pub fn main(opt: Opt) -> Result {
    let config = Config::load_or_default(opt.config.as_deref())?;
    let records = EpisodeRecord::load(config.data_path(EPISODES_FILE))?;

    let rows = day_extract(&records, opt.date);
    if rows.is_empty() {
        println!("No episodes found for {}", opt.date.format(DMY_DASHED));
        return Ok(());
    }
    let path = save_day_extract(&rows, &config.output_dir, opt.date)?;
    println!("Created {}\n{} episodes exported", path.display(), rows.len());
    Ok(())
}
