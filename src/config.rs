//! Settings shared by all the tools, read from `endoscopy-audit.toml`.
use crate::{util::opt_dmy_date, Result};
use anyhow::Context;
use chrono::NaiveDate;
use qu::ick_use::*;
use serde::Deserialize;
use std::{
    fs, io,
    path::{Path, PathBuf},
};

pub const CONFIG_FILE: &str = "endoscopy-audit.toml";

/// The production machine keeps the exports on a separate data drive.
const WINDOWS_DATA_DIR: &str = "D:/endoscopy/episode_data";

pub fn default_data_dir() -> PathBuf {
    if cfg!(windows) {
        PathBuf::from(WINDOWS_DATA_DIR)
    } else {
        PathBuf::from(".")
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where `episodes.csv` and `day_surgery.csv` live.
    pub data_dir: PathBuf,
    /// Where reports are written.
    pub output_dir: PathBuf,
    /// First procedure date to include in the follow-up worklist.
    #[serde(deserialize_with = "opt_dmy_date")]
    pub follow_up_start: Option<NaiveDate>,
    /// Two admissions closer than this many days count as a repeat.
    pub repeat_window_days: i64,
    pub weekly_target: u32,
    /// Patients carried over from last year for the weekly target.
    pub carry_over: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            output_dir: PathBuf::from("."),
            follow_up_start: None,
            repeat_window_days: 31,
            weekly_target: 40,
            carry_over: 320,
        }
    }
}

impl Config {
    /// Load the configuration. A missing file gives the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if matches!(e.kind(), io::ErrorKind::NotFound) => {
                event!(
                    Level::DEBUG,
                    "no config at \"{}\", using defaults",
                    path.display()
                );
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(e).with_context(|| format!("reading \"{}\"", path.display()))
            }
        };
        Self::from_toml(&contents).with_context(|| format!("parsing \"{}\"", path.display()))
    }

    /// Load from the given path, or `endoscopy-audit.toml` in the working directory.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        Self::load(path.unwrap_or_else(|| Path::new(CONFIG_FILE)))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        ensure!(
            config.repeat_window_days > 0,
            "repeat_window_days must be positive"
        );
        Ok(config)
    }

    pub fn data_path(&self, name: impl AsRef<Path>) -> PathBuf {
        self.data_dir.join(name)
    }

    pub fn output_path(&self, name: impl AsRef<Path>) -> PathBuf {
        self.output_dir.join(name)
    }

    /// The follow-up start date, which must be configured for the worklist.
    pub fn follow_up_start(&self) -> Result<NaiveDate> {
        self.follow_up_start
            .ok_or_else(|| format_err!("`follow_up_start` is not set in {}", CONFIG_FILE))
    }
}
