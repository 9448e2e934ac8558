use clap::{Parser, Subcommand};
use endoscopy_audit::{
    day_surgery,
    extract::{self, glp_rows, rename_doctor},
    load_headerless, save_headerless, Config,
};
use qu::ick_use::*;
use std::path::PathBuf;

/// Clean-up passes over `day_surgery.csv`. The input is never modified.
#[derive(Parser)]
struct Opt {
    #[clap(subcommand)]
    command: Command,
    #[clap(long, short)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Keep rows where the GLP-1 question was answered, writing `glp.csv`.
    Glp,
    /// Rename an endoscopist, writing `new_csv.csv`.
    Rename {
        #[clap(long)]
        from: String,
        #[clap(long)]
        to: String,
    },
}

#[qu::ick]
pub fn main(opt: Opt) -> Result {
    let config = Config::load_or_default(opt.config.as_deref())?;
    let mut rows = load_headerless(config.data_path(day_surgery::FILE))?;

    match opt.command {
        Command::Glp => {
            let kept = glp_rows(&rows);
            event!(Level::INFO, "kept {} of {} rows", kept.len(), rows.len());
            save_headerless(&kept, config.output_path(extract::GLP_FILE))?;
        }
        Command::Rename { from, to } => {
            let renamed = rename_doctor(&mut rows, &from, &to);
            if renamed == 0 {
                event!(Level::WARN, "no rows for \"{}\"", from);
            } else {
                event!(Level::INFO, "renamed {} rows", renamed);
            }
            save_headerless(&rows, config.output_path(extract::RENAMED_FILE))?;
        }
    }
    Ok(())
}
