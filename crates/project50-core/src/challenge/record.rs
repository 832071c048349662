//! The persisted challenge aggregate.

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::note::{DayNote, Mood};
use super::task::TaskDefinition;

/// Length of every challenge, in days.
pub const CHALLENGE_DAYS: u32 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChallengeStatus {
    Ongoing,
    /// Day 50 was completed and the calendar moved past it. Terminal.
    Completed,
    /// Abandoned under the `mark_failed` drift policy. Terminal.
    Failed,
}

impl ChallengeStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ChallengeStatus::Ongoing)
    }
}

/// The single active challenge.
///
/// Invariants kept by the engine:
/// `1 <= current_day <= CHALLENGE_DAYS` and every entry of
/// `completed_days` is at most `current_day`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChallengeRecord {
    pub id: String,
    /// Calendar date of day 1. Time of day is irrelevant to day math.
    pub start_date: NaiveDate,
    pub started_at: DateTime<Utc>,
    pub current_day: u32,
    pub tasks: Vec<TaskDefinition>,
    #[serde(default)]
    pub notes: Vec<DayNote>,
    #[serde(default)]
    pub completed_days: BTreeSet<u32>,
    pub status: ChallengeStatus,
}

impl ChallengeRecord {
    pub fn new(tasks: Vec<TaskDefinition>, start_date: NaiveDate, started_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            start_date,
            started_at,
            current_day: 1,
            tasks,
            notes: Vec::new(),
            completed_days: BTreeSet::new(),
            status: ChallengeStatus::Ongoing,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn task(&self, task_id: &str) -> Option<&TaskDefinition> {
        self.tasks.iter().find(|t| t.id == task_id)
    }

    /// True when every task is checked for the current day.
    pub fn is_today_completed(&self) -> bool {
        !self.tasks.is_empty() && self.tasks.iter().all(|t| t.completed)
    }

    pub fn is_day_completed(&self, day: u32) -> bool {
        self.completed_days.contains(&day)
    }

    pub fn note_for(&self, day: u32) -> Option<&DayNote> {
        self.notes.iter().find(|n| n.day_number == day)
    }

    /// Consecutive completed days ending today, or yesterday while
    /// today is still open.
    pub fn current_streak(&self) -> u32 {
        let mut day = if self.is_day_completed(self.current_day) {
            self.current_day
        } else {
            self.current_day.saturating_sub(1)
        };
        let mut streak = 0;
        while day >= 1 && self.is_day_completed(day) {
            streak += 1;
            day -= 1;
        }
        streak
    }

    /// Share of elapsed days (including today) that were completed.
    pub fn completion_rate(&self) -> f64 {
        self.completed_days.len() as f64 / f64::from(self.current_day)
    }

    // ── Mutations (engine only) ──────────────────────────────────────

    pub(crate) fn task_mut(&mut self, task_id: &str) -> Option<&mut TaskDefinition> {
        self.tasks.iter_mut().find(|t| t.id == task_id)
    }

    /// Re-derive whether the current day counts as completed.
    pub(crate) fn refresh_today(&mut self) {
        if self.is_today_completed() {
            self.completed_days.insert(self.current_day);
        } else {
            self.completed_days.remove(&self.current_day);
        }
    }

    pub(crate) fn clear_task_checks(&mut self) {
        for task in &mut self.tasks {
            task.completed = false;
        }
    }

    /// Insert or overwrite the note for `day`. Returns true when a new
    /// note was created.
    pub(crate) fn upsert_note(
        &mut self,
        day: u32,
        content: String,
        mood: Option<Mood>,
        at: DateTime<Utc>,
    ) -> bool {
        match self.notes.iter_mut().find(|n| n.day_number == day) {
            Some(note) => {
                note.rewrite(content, mood, at);
                false
            }
            None => {
                self.notes.push(DayNote::new(day, content, mood, at));
                self.notes.sort_by_key(|n| n.day_number);
                true
            }
        }
    }

    pub(crate) fn remove_note(&mut self, day: u32) -> Option<DayNote> {
        let index = self.notes.iter().position(|n| n.day_number == day)?;
        Some(self.notes.remove(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::challenge::task::{templates_for, TaskCategory};

    fn record() -> ChallengeRecord {
        let tasks = templates_for(&[TaskCategory::Reading, TaskCategory::Exercise]);
        ChallengeRecord::new(
            tasks,
            NaiveDate::from_ymd_opt(2025, 2, 13).unwrap(),
            Utc::now(),
        )
    }

    #[test]
    fn fresh_record_starts_on_day_one() {
        let r = record();
        assert_eq!(r.current_day, 1);
        assert!(r.completed_days.is_empty());
        assert!(r.notes.is_empty());
        assert_eq!(r.status, ChallengeStatus::Ongoing);
        assert!(!r.is_today_completed());
    }

    #[test]
    fn streak_counts_back_from_yesterday_while_today_open() {
        let mut r = record();
        r.current_day = 6;
        r.completed_days = [1, 3, 4, 5].into_iter().collect();
        assert_eq!(r.current_streak(), 3);

        r.completed_days.insert(6);
        assert_eq!(r.current_streak(), 4);

        r.completed_days.remove(&5);
        assert_eq!(r.current_streak(), 1);
    }

    #[test]
    fn completion_rate_over_elapsed_days() {
        let mut r = record();
        r.current_day = 4;
        r.completed_days = [1, 2].into_iter().collect();
        assert!((r.completion_rate() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn upsert_note_keeps_identity() {
        let mut r = record();
        let t0 = Utc::now();
        assert!(r.upsert_note(5, "first".into(), None, t0));
        let id = r.note_for(5).unwrap().id.clone();

        assert!(!r.upsert_note(5, "second".into(), Some(Mood::Good), t0));
        assert_eq!(r.notes.len(), 1);
        let note = r.note_for(5).unwrap();
        assert_eq!(note.id, id);
        assert_eq!(note.content, "second");
        assert_eq!(note.mood, Some(Mood::Good));
    }

    #[test]
    fn record_json_roundtrip_tolerates_missing_collections() {
        let r = record();
        let mut json = serde_json::to_value(&r).unwrap();
        let obj = json.as_object_mut().unwrap();
        obj.remove("notes");
        obj.remove("completed_days");
        let parsed: ChallengeRecord = serde_json::from_value(json).unwrap();
        assert_eq!(parsed.tasks, r.tasks);
        assert!(parsed.notes.is_empty());
    }
}
