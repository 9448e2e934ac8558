use clap::Parser;
use endoscopy_audit::{
    adr::AdrStats,
    doctors::{DoctorDirectory, UNKNOWN_DOCTOR},
    header, phisc, report, Config, EPISODES_FILE,
};
use qu::ick_use::*;
use std::path::PathBuf;

/// Adenoma detection rates from PHISC extracts.
#[derive(Parser)]
struct Opt {
    /// PHISC extracts to parse. If none are given, the existing `adr.csv` is re-analysed.
    extracts: Vec<PathBuf>,
    #[clap(long, short)]
    config: Option<PathBuf>,
}

#[qu::ick]
pub fn main(opt: Opt) -> Result {
    let config = Config::load_or_default(opt.config.as_deref())?;
    let table = config.output_path(phisc::EPISODES_TABLE);

    let episodes = if opt.extracts.is_empty() {
        phisc::load_episodes(&table)?
    } else {
        let directory = DoctorDirectory::load(config.data_path(EPISODES_FILE))?;
        event!(Level::INFO, "{} episodes in the doctor directory", directory.len());
        let episodes = phisc::parse_files(&opt.extracts, &directory)?;
        let unknown = episodes.iter().filter(|ep| &*ep.doctor == UNKNOWN_DOCTOR).count();
        if unknown > 0 {
            event!(Level::WARN, "{} colonoscopies with no matching doctor", unknown);
        }
        phisc::write_episodes(&table, &episodes)?;
        episodes
    };

    let stats = AdrStats::from_episodes(&episodes);
    header("ADR");
    print!("{}", report::adr_text(&stats));
    report::save_reports(&stats, &config.output_dir)?;
    Ok(())
}
