use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::challenge::ChallengeStatus;

/// Every state change in the challenge produces an Event.
/// Hosts log or display them; the published snapshot carries the state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    ChallengeStarted {
        challenge_id: String,
        start_date: NaiveDate,
        task_count: usize,
        at: DateTime<Utc>,
    },
    ChallengeReset {
        at: DateTime<Utc>,
    },
    TaskToggled {
        task_id: String,
        completed: bool,
        day: u32,
        /// Whether the day counts as completed after this toggle.
        day_completed: bool,
        at: DateTime<Utc>,
    },
    TaskDescriptionUpdated {
        task_id: String,
        at: DateTime<Utc>,
    },
    NoteSaved {
        day: u32,
        /// False when an existing note was overwritten.
        created: bool,
        at: DateTime<Utc>,
    },
    NoteRemoved {
        day: u32,
        at: DateTime<Utc>,
    },
    /// The calendar reached a new challenge day; task checks were cleared.
    DayAdvanced {
        from_day: u32,
        to_day: u32,
        at: DateTime<Utc>,
    },
    /// Terminal status reached.
    StatusChanged {
        from: ChallengeStatus,
        to: ChallengeStatus,
        day: u32,
        at: DateTime<Utc>,
    },
    DaySelected {
        day: Option<u32>,
        at: DateTime<Utc>,
    },
    EditTipHidden {
        at: DateTime<Utc>,
    },
}

impl Event {
    /// Short machine name, used as a log field.
    pub fn kind(&self) -> &'static str {
        match self {
            Event::ChallengeStarted { .. } => "challenge_started",
            Event::ChallengeReset { .. } => "challenge_reset",
            Event::TaskToggled { .. } => "task_toggled",
            Event::TaskDescriptionUpdated { .. } => "task_description_updated",
            Event::NoteSaved { .. } => "note_saved",
            Event::NoteRemoved { .. } => "note_removed",
            Event::DayAdvanced { .. } => "day_advanced",
            Event::StatusChanged { .. } => "status_changed",
            Event::DaySelected { .. } => "day_selected",
            Event::EditTipHidden { .. } => "edit_tip_hidden",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_serialize_with_type_tag() {
        let ev = Event::DayAdvanced {
            from_day: 1,
            to_day: 4,
            at: Utc::now(),
        };
        let json = serde_json::to_value(&ev).unwrap();
        assert_eq!(json["type"], "day_advanced");
        assert_eq!(json["to_day"], 4);
        assert_eq!(ev.kind(), "day_advanced");
    }
}
