//! Engine configuration.
//!
//! Defaults come from [`EngineConfig::default`]; [`EngineConfig::from_env`]
//! overlays:
//! - `BOOLCIRC_WORKERS`: worker thread count
//! - `BOOLCIRC_MAX_IN_FLIGHT`: cap on dispatched-but-unfinished gates
//! - `BOOLCIRC_SCHEDULE`: `dataflow` or `levelled`

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Oversubscription factor applied to the host's available parallelism.
const WORKERS_PER_CORE: usize = 2;

/// In-flight gates allowed per worker.
const IN_FLIGHT_PER_WORKER: usize = 4;

/// How ready gates are chosen for dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Schedule {
    /// Dispatch any gate as soon as its last operand lands.
    #[default]
    Dataflow,
    /// Dispatch one level bucket at a time with a barrier between buckets.
    Levelled,
}

impl fmt::Display for Schedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Schedule::Dataflow => write!(f, "dataflow"),
            Schedule::Levelled => write!(f, "levelled"),
        }
    }
}

impl FromStr for Schedule {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dataflow" => Ok(Schedule::Dataflow),
            "levelled" | "leveled" => Ok(Schedule::Levelled),
            other => Err(format!(
                "unknown schedule '{}': expected dataflow or levelled",
                other
            )),
        }
    }
}

/// Worker pool and scheduling settings for one engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Worker thread count. Default: available parallelism x 2.
    pub workers: usize,
    /// Maximum gates dispatched but not yet completed. Default: 4 x workers.
    pub max_in_flight: usize,
    pub strategy: Schedule,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        EngineConfig::with_workers(cores * WORKERS_PER_CORE)
    }
}

impl EngineConfig {
    /// Default settings for a given worker count.
    pub fn with_workers(workers: usize) -> Self {
        let workers = workers.max(1);
        EngineConfig {
            workers,
            max_in_flight: workers * IN_FLIGHT_PER_WORKER,
            strategy: Schedule::default(),
        }
    }

    pub fn schedule(mut self, strategy: Schedule) -> Self {
        self.strategy = strategy;
        self
    }

    /// Defaults overlaid with the `BOOLCIRC_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`EngineConfig::from_env`] but reading from `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = match parse_var::<usize>(&lookup, "BOOLCIRC_WORKERS") {
            Some(workers) => EngineConfig::with_workers(workers),
            None => EngineConfig::default(),
        };
        if let Some(cap) = parse_var::<usize>(&lookup, "BOOLCIRC_MAX_IN_FLIGHT") {
            config.max_in_flight = cap;
        }
        if let Some(strategy) = parse_var::<Schedule>(&lookup, "BOOLCIRC_SCHEDULE") {
            config.strategy = strategy;
        }
        config.normalized()
    }

    /// Clamps both limits to at least one, and the in-flight cap to at
    /// least the worker count so no worker is starved by the cap.
    pub fn normalized(mut self) -> Self {
        self.workers = self.workers.max(1);
        self.max_in_flight = self.max_in_flight.max(self.workers);
        self
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    let raw = lookup(key)?;
    match raw.parse::<T>() {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(key, value = %raw, error = %e, "ignoring invalid setting");
            None
        }
    }
}
