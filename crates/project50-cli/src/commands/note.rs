use clap::Subcommand;
use project50_core::Mood;

use super::{open_engine, print_json, CliResult};

#[derive(Subcommand)]
pub enum NoteAction {
    /// Write the note for a day, replacing any existing one
    Set {
        /// Day number (1-50)
        day: u32,
        /// Note text
        content: String,
        /// great, good, okay, low or awful
        #[arg(long)]
        mood: Option<Mood>,
    },
    /// Print the note for a day
    Show {
        /// Day number (1-50)
        day: u32,
    },
    /// Delete the note for a day
    Rm {
        /// Day number (1-50)
        day: u32,
    },
}

pub fn run(action: NoteAction) -> CliResult {
    let mut engine = open_engine()?;

    match action {
        NoteAction::Set { day, content, mood } => {
            match engine.add_or_update_note(day, content, mood) {
                Some(event) => print_json(&event)?,
                None => return Err(format!("cannot write a note for day {day}").into()),
            }
        }
        NoteAction::Show { day } => match engine.challenge().and_then(|c| c.note_for(day)) {
            Some(note) => print_json(note)?,
            None => return Err(format!("no note for day {day}").into()),
        },
        NoteAction::Rm { day } => match engine.remove_note(day) {
            Some(event) => print_json(&event)?,
            None => return Err(format!("no note for day {day}").into()),
        },
    }
    Ok(())
}
