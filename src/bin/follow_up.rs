use chrono::Local;
use clap::{Parser, Subcommand};
use endoscopy_audit::{
    follow_up::{self, describe, outstanding, record_result, update_callback},
    header,
    period::prompt,
    Config, RawTable, EPISODES_FILE,
};
use qu::ick_use::*;
use std::{
    io::{self, BufRead, Write},
    path::PathBuf,
};

/// The day-after phone call worklist.
#[derive(Parser)]
struct Opt {
    #[clap(subcommand)]
    command: Option<Command>,
    #[clap(long, short)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Work through the patients still to be called (the default).
    Calls,
    /// Record a call back from a patient who was missed.
    Callback {
        /// Procedure date, `dd-mm-yyyy`.
        #[clap(long)]
        date: String,
        #[clap(long)]
        mrn: String,
        /// Whether the patient reported an issue.
        #[clap(long)]
        issue: bool,
        /// Notes, added to any already recorded.
        #[clap(long, default_value = "")]
        text: String,
    },
}

fn yes_no(input: &str) -> Result<&'static str> {
    match input.trim().to_lowercase().as_str() {
        "y" | "yes" => Ok("yes"),
        "n" | "no" => Ok("no"),
        _ => bail!("Enter yes or no"),
    }
}

fn required_text(input: &str) -> Result<String> {
    let input = input.trim();
    ensure!(!input.is_empty(), "Please enter details about the issue.");
    Ok(input.to_string())
}

#[qu::ick]
pub fn main(opt: Opt) -> Result {
    let config = Config::load_or_default(opt.config.as_deref())?;
    let log = config.output_path(follow_up::FILE);

    match opt.command.unwrap_or(Command::Calls) {
        Command::Calls => calls(&config, log),
        Command::Callback {
            date,
            mrn,
            issue,
            text,
        } => {
            ensure!(!issue || !text.trim().is_empty(), "describe the issue with --text");
            let issue = if issue { "yes" } else { "no" };
            if update_callback(&log, &date, &mrn, issue, &text)? {
                println!("Updated {} on {}", mrn, date);
            } else {
                println!("No call found for {} on {}", mrn, date);
            }
            Ok(())
        }
    }
}

fn calls(config: &Config, log: PathBuf) -> Result {
    let episodes = RawTable::load(config.data_path(EPISODES_FILE))?;
    let done = RawTable::load_or_empty(&log)?;
    let today = Local::now().date_naive();
    let calls = outstanding(&episodes, &done, config.follow_up_start()?, today)?;
    if calls.is_empty() {
        println!("No patients to call.");
        return Ok(());
    }

    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut output = io::stdout();
    for (idx, row) in calls.iter().enumerate() {
        header(&format!("Patient {} of {}", idx + 1, calls.len()));
        print!("{}", describe(&episodes, row));
        output.flush()?;

        let answered = prompt(&mut input, &mut output, "Answered? (y/n): ", yes_no)?;
        let (issue, issue_text) = if answered == "yes" {
            let issue = prompt(&mut input, &mut output, "Any issue? (y/n): ", yes_no)?;
            let text = if issue == "yes" {
                prompt(&mut input, &mut output, "Details: ", required_text)?
            } else {
                let mut line = String::new();
                write!(output, "Notes (optional): ")?;
                output.flush()?;
                input.read_line(&mut line)?;
                line.trim().to_string()
            };
            (issue, text)
        } else {
            ("", String::new())
        };
        record_result(&log, episodes.headers(), row, answered, issue, &issue_text)?;
    }
    println!("\nAll calls done.");
    Ok(())
}
