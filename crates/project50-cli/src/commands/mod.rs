pub mod challenge;
pub mod config;
pub mod note;
pub mod task;

use std::error::Error;
use std::sync::Arc;

use project50_core::{ChallengeEngine, Config, Database, SystemClock};
use serde::Serialize;

pub type CliResult<T = ()> = Result<T, Box<dyn Error>>;

/// Open the stored challenge. Loading already brings the day up to date.
pub fn open_engine() -> CliResult<ChallengeEngine> {
    let config = Config::load()?;
    let db = Database::open()?;
    tracing::debug!(drift_policy = ?config.challenge.drift_policy, "opening challenge");
    Ok(ChallengeEngine::new(
        Box::new(db),
        Arc::new(SystemClock),
        config.challenge.drift_policy,
    ))
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> CliResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
