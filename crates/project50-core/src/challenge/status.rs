//! Calendar classification of challenge days.

use serde::{Deserialize, Serialize};

use super::record::ChallengeRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayState {
    /// After the current day.
    Upcoming,
    /// The current day, not yet completed.
    Current,
    /// All tasks were checked on that day.
    Completed,
    /// A past day that was never completed.
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayStatus {
    pub day: u32,
    pub state: DayState,
    /// A note exists for this day. Affects emphasis only, never `state`.
    pub has_note: bool,
}

impl DayStatus {
    /// Classify `day` against `record`. With no challenge every day is upcoming.
    pub fn of(record: Option<&ChallengeRecord>, day: u32) -> Self {
        let Some(record) = record else {
            return Self {
                day,
                state: DayState::Upcoming,
                has_note: false,
            };
        };

        let done = record.is_day_completed(day);
        let state = if day > record.current_day {
            DayState::Upcoming
        } else if done {
            DayState::Completed
        } else if day == record.current_day {
            DayState::Current
        } else {
            DayState::Failed
        };

        Self {
            day,
            state,
            has_note: record.note_for(day).is_some(),
        }
    }
}
