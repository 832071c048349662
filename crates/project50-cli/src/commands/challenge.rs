//! Challenge lifecycle and calendar commands.

use clap::Subcommand;
use project50_core::{
    templates, templates_for, CoreError, TaskCategory, TaskDefinition, ValidationError,
    CHALLENGE_DAYS,
};
use serde_json::json;

use super::{open_engine, print_json, CliResult};

#[derive(Subcommand)]
pub enum ChallengeAction {
    /// Start a new challenge, replacing the current one
    Start {
        /// Template category to include (repeatable)
        #[arg(long = "task", value_name = "CATEGORY")]
        tasks: Vec<TaskCategory>,
        /// Custom task title (repeatable)
        #[arg(long = "custom", value_name = "TITLE")]
        custom: Vec<String>,
    },
    /// Print the current challenge and today's status as JSON
    Status,
    /// Bring the challenge up to today and print what changed
    Check,
    /// Show one day of the challenge
    Day {
        /// Day number (1-50)
        day: u32,
    },
    /// Show the status of all 50 days
    Calendar,
    /// List the built-in task templates
    Templates,
    /// Abandon the current challenge
    Reset,
}

pub fn run(action: ChallengeAction) -> CliResult {
    match action {
        ChallengeAction::Start { tasks, custom } => {
            if tasks.contains(&TaskCategory::Custom) {
                return Err(
                    "'custom' has no template; add custom tasks with --custom <TITLE>".into(),
                );
            }
            let mut definitions = templates_for(&tasks);
            definitions.extend(custom.into_iter().map(|title| TaskDefinition::custom(title, "")));

            let mut engine = open_engine()?;
            let event = engine.start_new_challenge(definitions)?;
            print_json(&event)?;
        }
        ChallengeAction::Status => {
            let engine = open_engine()?;
            let today = engine.current_day().map(|day| engine.day_status(day));
            let challenge = engine.challenge();
            print_json(&json!({
                "snapshot": engine.snapshot(),
                "today": today,
                "streak": challenge.map(|c| c.current_streak()),
                "completion_rate": challenge.map(|c| c.completion_rate()),
                "persistence_degraded": engine.is_persistence_degraded(),
            }))?;
        }
        ChallengeAction::Check => {
            let mut engine = open_engine()?;
            let events = engine.check_challenge_status();
            print_json(&events)?;
        }
        ChallengeAction::Day { day } => {
            if !(1..=CHALLENGE_DAYS).contains(&day) {
                return Err(CoreError::from(ValidationError::OutOfRange {
                    field: "day".into(),
                    value: i64::from(day),
                    min: 1,
                    max: i64::from(CHALLENGE_DAYS),
                })
                .into());
            }
            let engine = open_engine()?;
            let note = engine.challenge().and_then(|c| c.note_for(day));
            print_json(&json!({
                "status": engine.day_status(day),
                "note": note,
            }))?;
        }
        ChallengeAction::Calendar => {
            let engine = open_engine()?;
            print_json(&engine.calendar())?;
        }
        ChallengeAction::Templates => {
            let list: Vec<_> = templates()
                .iter()
                .map(|t| {
                    json!({
                        "category": t.category,
                        "title": t.title,
                        "description": t.description,
                        "icon": t.icon(),
                    })
                })
                .collect();
            print_json(&list)?;
        }
        ChallengeAction::Reset => {
            let mut engine = open_engine()?;
            let event = engine.reset_challenge();
            print_json(&event)?;
        }
    }
    Ok(())
}
