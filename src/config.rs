use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Map document to load, relative to the resource root
    pub map: String,
    /// Scenario script used by the static game mode
    pub tutorial: String,
    pub mode: GameMode,
    /// Fixed RNG seed, random when absent
    pub seed: Option<u64>,
    pub economy: EconomyConfig,
    pub debug: DebugFlags,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            map: String::from("maps/map.json"),
            tutorial: String::from("data/tutorial-events.json"),
            mode: GameMode::Dynamic,
            seed: None,
            economy: EconomyConfig::default(),
            debug: DebugFlags::default(),
        }
    }
}

impl Config {
    /// Reads the config from `path`, falling back to the defaults when the file doesn't exist.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        use std::io::ErrorKind;

        let path = path.as_ref();
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::info!("No config at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(e) => return Err(e).with_context(|| format!("reading {}", path.display())),
        };

        Self::parse(&contents).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn parse(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GameMode {
    /// Jobs are generated on a timer and the session ends when time runs out
    Dynamic,
    /// Jobs come from the scenario script, `delay` ms after start
    Static { delay: f64 },
}

/// Tunables for the job economy, times in milliseconds.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EconomyConfig {
    pub initial_time_until_next_job: f64,
    pub min_time_between_jobs: f64,
    pub max_time_between_jobs: f64,
    pub min_deliveries_per_job: usize,
    pub max_deliveries_per_job: usize,
    pub closest_spawners: usize,
    pub time_remaining: f64,
    pub job_time_bonus: f64,
    pub job_description: String,
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            initial_time_until_next_job: 60_000.0,
            min_time_between_jobs: 5_000.0,
            max_time_between_jobs: 30_000.0,
            min_deliveries_per_job: 1,
            max_deliveries_per_job: 3,
            closest_spawners: 3,
            time_remaining: 60_000.0,
            job_time_bonus: 30_000.0,
            job_description: String::from("do a job"),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DebugFlags {
    /// Every surface counts as meringue while accelerating
    pub go_really_fast: bool,
    /// Scenario delays run a hundred times faster
    pub debug_mode: bool,
}
