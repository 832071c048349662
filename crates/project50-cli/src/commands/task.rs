//! Daily task commands.

use clap::Subcommand;
use project50_core::Event;

use super::{open_engine, print_json, CliResult};

#[derive(Subcommand)]
pub enum TaskAction {
    /// Check or uncheck a task for today
    Toggle {
        /// Task ID
        task_id: String,
    },
    /// Change a task's description
    Describe {
        /// Task ID
        task_id: String,
        /// New description
        text: String,
    },
}

pub fn run(action: TaskAction) -> CliResult {
    let mut engine = open_engine()?;

    match action {
        TaskAction::Toggle { task_id } => {
            let events = engine.toggle_task(&task_id);
            if !matches!(events.last(), Some(Event::TaskToggled { .. })) {
                // Still report a day change or status change the sync caused.
                if !events.is_empty() {
                    print_json(&events)?;
                }
                return Err(format!("task '{task_id}' was not toggled").into());
            }
            print_json(&events)?;
        }
        TaskAction::Describe { task_id, text } => {
            match engine.update_task_description(&task_id, text) {
                Some(event) => print_json(&event)?,
                None => return Err(format!("task '{task_id}' not found").into()),
            }
        }
    }
    Ok(())
}
