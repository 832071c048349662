//! Challenge engine.
//!
//! Owns the single [`ChallengeRecord`] and is the only thing that mutates
//! it. It is driven from outside: it runs no threads and reads time only
//! through the injected [`Clock`] whenever it is asked to check the day.
//!
//! ## Status transitions
//!
//! ```text
//! (none) -start-> Ongoing -> Completed | Failed
//!    ^                |           |
//!    +------reset-----+-----------+
//! ```
//!
//! Day advancement is purely calendar-driven. Checking tasks only decides
//! whether a day lands in `completed_days`.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::note::Mood;
use super::record::{ChallengeRecord, ChallengeStatus, CHALLENGE_DAYS};
use super::resolver::{DayResolver, Resolution};
use super::status::DayStatus;
use super::task::TaskDefinition;
use crate::clock::Clock;
use crate::error::{Result, ValidationError};
use crate::events::Event;
use crate::storage::ChallengeStore;

/// What to do when the calendar skips whole days between checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriftPolicy {
    /// Jump straight to today; skipped days simply show as failed.
    #[default]
    FastForward,
    /// A skipped day, or passing day 50 without completing it, fails the
    /// whole challenge.
    MarkFailed,
}

/// Read-only state handed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub current_challenge: Option<ChallengeRecord>,
    pub selected_day_for_editing: Option<u32>,
    /// First-run hint after a challenge is started.
    pub show_edit_tip: bool,
}

/// A user or host request, in serializable form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "intent", rename_all = "snake_case")]
pub enum Intent {
    StartNewChallenge {
        tasks: Vec<TaskDefinition>,
    },
    ResetChallenge,
    ToggleTask {
        task_id: String,
    },
    UpdateTaskDescription {
        task_id: String,
        description: String,
    },
    AddOrUpdateNote {
        day: u32,
        content: String,
        #[serde(default)]
        mood: Option<Mood>,
    },
    RemoveNote {
        day: u32,
    },
    CheckChallengeStatus,
    SelectDay {
        day: u32,
    },
    ClearSelection,
    HideEditTip,
}

/// Stateful core of the challenge.
pub struct ChallengeEngine {
    store: Box<dyn ChallengeStore>,
    clock: Arc<dyn Clock>,
    drift_policy: DriftPolicy,
    challenge: Option<ChallengeRecord>,
    selected_day: Option<u32>,
    show_edit_tip: bool,
    /// Set after the first failed write; the session continues in memory.
    persistence_degraded: bool,
}

impl ChallengeEngine {
    /// Load any stored challenge and bring it up to today.
    pub fn new(
        store: Box<dyn ChallengeStore>,
        clock: Arc<dyn Clock>,
        drift_policy: DriftPolicy,
    ) -> Self {
        let challenge = match store.load() {
            Ok(challenge) => challenge,
            Err(e) => {
                tracing::error!(error = %e, "failed to load challenge, starting empty");
                None
            }
        };
        let mut engine = Self {
            store,
            clock,
            drift_policy,
            challenge,
            selected_day: None,
            show_edit_tip: false,
            persistence_degraded: false,
        };
        engine.check_challenge_status();
        engine
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn challenge(&self) -> Option<&ChallengeRecord> {
        self.challenge.as_ref()
    }

    pub fn current_day(&self) -> Option<u32> {
        self.challenge.as_ref().map(|c| c.current_day)
    }

    pub fn drift_policy(&self) -> DriftPolicy {
        self.drift_policy
    }

    pub fn is_persistence_degraded(&self) -> bool {
        self.persistence_degraded
    }

    /// Classify one day for the calendar overview. Never mutates.
    pub fn day_status(&self, day: u32) -> DayStatus {
        DayStatus::of(self.challenge.as_ref(), day)
    }

    /// Status of every challenge day, day 1 first.
    pub fn calendar(&self) -> Vec<DayStatus> {
        (1..=CHALLENGE_DAYS).map(|day| self.day_status(day)).collect()
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            current_challenge: self.challenge.clone(),
            selected_day_for_editing: self.selected_day,
            show_edit_tip: self.show_edit_tip,
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Apply any intent. Only `StartNewChallenge` can fail.
    pub fn dispatch(&mut self, intent: Intent) -> Result<Vec<Event>> {
        let event = match intent {
            Intent::StartNewChallenge { tasks } => Some(self.start_new_challenge(tasks)?),
            Intent::ResetChallenge => Some(self.reset_challenge()),
            Intent::ToggleTask { task_id } => return Ok(self.toggle_task(&task_id)),
            Intent::UpdateTaskDescription {
                task_id,
                description,
            } => self.update_task_description(&task_id, description),
            Intent::AddOrUpdateNote { day, content, mood } => {
                self.add_or_update_note(day, content, mood)
            }
            Intent::RemoveNote { day } => self.remove_note(day),
            Intent::CheckChallengeStatus => return Ok(self.check_challenge_status()),
            Intent::SelectDay { day } => self.select_day(day),
            Intent::ClearSelection => self.clear_selection(),
            Intent::HideEditTip => self.hide_edit_tip(),
        };
        Ok(event.into_iter().collect())
    }

    /// Begin a fresh challenge with `tasks`, replacing any current one.
    ///
    /// # Errors
    /// Returns a validation error when `tasks` is empty; nothing changes.
    pub fn start_new_challenge(&mut self, tasks: Vec<TaskDefinition>) -> Result<Event> {
        if tasks.is_empty() {
            return Err(ValidationError::EmptyCollection(
                "a challenge needs at least one task".into(),
            )
            .into());
        }
        if let Some(old) = &self.challenge {
            tracing::info!(challenge_id = %old.id, "replacing active challenge");
        }

        let now = self.clock.now();
        let at = now.with_timezone(&Utc);
        let mut tasks = tasks;
        for task in &mut tasks {
            task.completed = false;
        }
        let record = ChallengeRecord::new(tasks, now.date_naive(), at);
        let event = Event::ChallengeStarted {
            challenge_id: record.id.clone(),
            start_date: record.start_date,
            task_count: record.tasks.len(),
            at,
        };
        tracing::info!(
            challenge_id = %record.id,
            start_date = %record.start_date,
            tasks = record.tasks.len(),
            "challenge started"
        );

        self.challenge = Some(record);
        self.selected_day = None;
        self.show_edit_tip = true;
        self.persist();
        self.mark_updated(at);
        Ok(event)
    }

    /// Drop the challenge and everything stored for it.
    pub fn reset_challenge(&mut self) -> Event {
        let at = self.now_utc();
        if let Some(old) = self.challenge.take() {
            tracing::info!(challenge_id = %old.id, day = old.current_day, "challenge reset");
        }
        self.selected_day = None;
        self.show_edit_tip = false;
        if !self.persistence_degraded {
            if let Err(e) = self.store.clear() {
                tracing::error!(error = %e, "failed to clear stored challenge");
                self.persistence_degraded = true;
            }
        }
        Event::ChallengeReset { at }
    }

    /// Flip one task for the current day and re-derive the day's completion.
    ///
    /// The day is synced first, so a toggle that lands after midnight but
    /// before the periodic check applies to the new day. Events from that
    /// sync come first, followed by `TaskToggled` when the toggle applied.
    /// Once the calendar is past the last day, day 50 is closed and
    /// toggles are ignored.
    pub fn toggle_task(&mut self, task_id: &str) -> Vec<Event> {
        let mut events = self.check_challenge_status();
        let now = self.clock.now();
        let at = now.with_timezone(&Utc);

        let Some(record) = self.challenge.as_mut() else {
            tracing::debug!(task_id, "toggle ignored: no active challenge");
            return events;
        };
        if record.status.is_terminal() {
            tracing::debug!(task_id, status = ?record.status, "toggle ignored: challenge finished");
            return events;
        }
        if DayResolver::resolve(record.start_date, now).is_past_end() {
            tracing::debug!(task_id, "toggle ignored: last day has passed");
            return events;
        }
        let Some(task) = record.task_mut(task_id) else {
            tracing::warn!(task_id, "toggle ignored: unknown task");
            return events;
        };

        task.completed = !task.completed;
        let completed = task.completed;
        record.refresh_today();
        let day = record.current_day;
        let day_completed = record.is_day_completed(day);
        tracing::debug!(task_id, completed, day, day_completed, "task toggled");

        self.persist();
        events.push(Event::TaskToggled {
            task_id: task_id.to_string(),
            completed,
            day,
            day_completed,
            at,
        });
        events
    }

    pub fn update_task_description(
        &mut self,
        task_id: &str,
        description: impl Into<String>,
    ) -> Option<Event> {
        let at = self.now_utc();
        let Some(record) = self.challenge.as_mut() else {
            tracing::debug!(task_id, "description update ignored: no active challenge");
            return None;
        };
        let Some(task) = record.task_mut(task_id) else {
            tracing::warn!(task_id, "description update ignored: unknown task");
            return None;
        };
        task.description = description.into();

        self.persist();
        Some(Event::TaskDescriptionUpdated {
            task_id: task_id.to_string(),
            at,
        })
    }

    /// Write the note for `day`; a second note for the same day replaces
    /// the first.
    pub fn add_or_update_note(
        &mut self,
        day: u32,
        content: impl Into<String>,
        mood: Option<Mood>,
    ) -> Option<Event> {
        let at = self.now_utc();
        let Some(record) = self.challenge.as_mut() else {
            tracing::debug!(day, "note ignored: no active challenge");
            return None;
        };
        if !is_challenge_day(day) {
            tracing::warn!(day, "note ignored: day out of range");
            return None;
        }
        let created = record.upsert_note(day, content.into(), mood, at);

        self.persist();
        Some(Event::NoteSaved { day, created, at })
    }

    pub fn remove_note(&mut self, day: u32) -> Option<Event> {
        let at = self.now_utc();
        let record = self.challenge.as_mut()?;
        if record.remove_note(day).is_none() {
            tracing::debug!(day, "no note to remove");
            return None;
        }

        self.persist();
        Some(Event::NoteRemoved { day, at })
    }

    pub fn select_day(&mut self, day: u32) -> Option<Event> {
        if !is_challenge_day(day) {
            tracing::warn!(day, "selection ignored: day out of range");
            return None;
        }
        self.selected_day = Some(day);
        Some(Event::DaySelected {
            day: Some(day),
            at: self.now_utc(),
        })
    }

    pub fn clear_selection(&mut self) -> Option<Event> {
        self.selected_day.take()?;
        Some(Event::DaySelected {
            day: None,
            at: self.now_utc(),
        })
    }

    pub fn hide_edit_tip(&mut self) -> Option<Event> {
        if !self.show_edit_tip {
            return None;
        }
        self.show_edit_tip = false;
        Some(Event::EditTipHidden { at: self.now_utc() })
    }

    /// Bring the challenge up to the calendar day. Call periodically.
    ///
    /// Idempotent: a second call on the same calendar day changes nothing.
    /// When the day moves forward, every task check is cleared and the new
    /// day is saved in one write. Past the last day the day number stays
    /// at 50, but day 50 is closed: its checks are cleared and the status
    /// is settled from `completed_days` as day 50 left it.
    pub fn check_challenge_status(&mut self) -> Vec<Event> {
        let now = self.clock.now();
        let at = now.with_timezone(&Utc);
        self.warn_if_clock_rewound(at);

        let policy = self.drift_policy;
        let Some(record) = self.challenge.as_mut() else {
            return Vec::new();
        };
        if record.status.is_terminal() {
            return Vec::new();
        }

        let resolution = DayResolver::resolve(record.start_date, now);
        let mut events = advance_day(record, resolution, policy, at);
        let closed = resolution.is_past_end() && close_final_day(record);
        events.extend(settle_past_end(record, resolution, policy, at));

        if !events.is_empty() || closed {
            self.persist();
            self.mark_updated(at);
        }
        events
    }

    /// The host came back to the foreground.
    pub fn on_become_active(&mut self) -> Vec<Event> {
        tracing::debug!("became active, checking day");
        self.check_challenge_status()
    }

    /// Time zone change, significant time change or similar OS signal.
    pub fn on_external_time_signal(&mut self) -> Vec<Event> {
        tracing::debug!("external time signal, checking day");
        self.check_challenge_status()
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn now_utc(&self) -> DateTime<Utc> {
        self.clock.now().with_timezone(&Utc)
    }

    fn persist(&mut self) {
        if self.persistence_degraded {
            return;
        }
        let Some(record) = &self.challenge else {
            return;
        };
        if let Err(e) = self.store.save(record) {
            tracing::error!(error = %e, "failed to save challenge, continuing in memory");
            self.persistence_degraded = true;
        }
    }

    fn mark_updated(&mut self, at: DateTime<Utc>) {
        if self.persistence_degraded {
            return;
        }
        if let Err(e) = self.store.mark_updated(at) {
            tracing::error!(error = %e, "failed to write last-update marker, continuing in memory");
            self.persistence_degraded = true;
        }
    }

    fn warn_if_clock_rewound(&self, now: DateTime<Utc>) {
        if self.challenge.is_none() || self.persistence_degraded {
            return;
        }
        match self.store.last_update() {
            Ok(Some(last)) if now < last => {
                tracing::warn!(%last, %now, "clock is behind the last recorded update");
            }
            Ok(_) => {}
            Err(e) => tracing::debug!(error = %e, "last-update marker unavailable"),
        }
    }
}

fn is_challenge_day(day: u32) -> bool {
    (1..=CHALLENGE_DAYS).contains(&day)
}

/// Move `record` forward to the resolved day, clearing task checks.
/// Never moves backward.
fn advance_day(
    record: &mut ChallengeRecord,
    resolution: Resolution,
    policy: DriftPolicy,
    at: DateTime<Utc>,
) -> Vec<Event> {
    let from_day = record.current_day;
    let to_day = resolution.day;
    if to_day < from_day {
        tracing::warn!(
            current_day = from_day,
            resolved_day = to_day,
            "calendar is behind the challenge, keeping current day"
        );
        return Vec::new();
    }
    if to_day == from_day {
        return Vec::new();
    }

    record.current_day = to_day;
    record.clear_task_checks();
    // A fresh day starts unchecked, so it cannot be complete yet.
    record.completed_days.remove(&to_day);

    let skipped = to_day - from_day - 1;
    tracing::info!(from_day, to_day, skipped, "challenge day advanced");
    let mut events = vec![Event::DayAdvanced {
        from_day,
        to_day,
        at,
    }];

    if skipped > 0 && policy == DriftPolicy::MarkFailed {
        tracing::info!(skipped, "days were missed, challenge failed");
        events.push(set_status(record, ChallengeStatus::Failed, at));
    }
    events
}

/// Clear the checks left over from day 50 once its calendar day is over.
/// Returns true when anything was cleared.
fn close_final_day(record: &mut ChallengeRecord) -> bool {
    if !record.tasks.iter().any(|t| t.completed) {
        return false;
    }
    record.clear_task_checks();
    tracing::info!(
        final_day_completed = record.is_day_completed(CHALLENGE_DAYS),
        "last day closed"
    );
    true
}

/// Once the calendar is beyond the last day, decide the final status.
fn settle_past_end(
    record: &mut ChallengeRecord,
    resolution: Resolution,
    policy: DriftPolicy,
    at: DateTime<Utc>,
) -> Option<Event> {
    if record.status.is_terminal() || !resolution.is_past_end() {
        return None;
    }
    if record.is_day_completed(CHALLENGE_DAYS) {
        tracing::info!("final day completed, challenge completed");
        return Some(set_status(record, ChallengeStatus::Completed, at));
    }
    if policy == DriftPolicy::MarkFailed {
        tracing::info!("final day passed incomplete, challenge failed");
        return Some(set_status(record, ChallengeStatus::Failed, at));
    }
    None
}

fn set_status(record: &mut ChallengeRecord, to: ChallengeStatus, at: DateTime<Utc>) -> Event {
    let from = record.status;
    record.status = to;
    Event::StatusChanged {
        from,
        to,
        day: record.current_day,
        at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::challenge::{templates_for, DayState, TaskCategory};
    use crate::clock::ManualClock;
    use crate::storage::MemoryStore;
    use chrono::{Duration, NaiveDate};

    fn setup(policy: DriftPolicy) -> (ChallengeEngine, Arc<ManualClock>, MemoryStore) {
        let clock = Arc::new(ManualClock::at_noon(NaiveDate::from_ymd_opt(2025, 2, 13).unwrap()));
        let store = MemoryStore::new();
        let engine = ChallengeEngine::new(Box::new(store.clone()), clock.clone(), policy);
        (engine, clock, store)
    }

    fn three_tasks() -> Vec<TaskDefinition> {
        templates_for(&[TaskCategory::WakeUp, TaskCategory::Reading, TaskCategory::Exercise])
    }

    fn task_ids(engine: &ChallengeEngine) -> Vec<String> {
        engine
            .challenge()
            .unwrap()
            .tasks
            .iter()
            .map(|t| t.id.clone())
            .collect()
    }

    #[test]
    fn start_rejects_empty_selection() {
        let (mut engine, _clock, store) = setup(DriftPolicy::FastForward);
        let err = engine.start_new_challenge(Vec::new()).unwrap_err();
        assert!(matches!(err, crate::CoreError::Validation(ValidationError::EmptyCollection(_))));
        assert!(engine.challenge().is_none());
        assert_eq!(store.save_count(), 0);
    }

    #[test]
    fn start_creates_fresh_record_and_raises_tip() {
        let (mut engine, _clock, store) = setup(DriftPolicy::FastForward);
        let mut tasks = three_tasks();
        tasks[0].completed = true;
        engine.start_new_challenge(tasks).unwrap();

        let record = engine.challenge().unwrap();
        assert_eq!(record.current_day, 1);
        assert!(record.completed_days.is_empty());
        assert_eq!(record.status, ChallengeStatus::Ongoing);
        assert!(record.tasks.iter().all(|t| !t.completed));
        assert_eq!(record.start_date, NaiveDate::from_ymd_opt(2025, 2, 13).unwrap());
        assert!(engine.snapshot().show_edit_tip);
        assert_eq!(store.load().unwrap().as_ref(), Some(record));
        assert!(store.last_update().unwrap().is_some());

        assert!(engine.hide_edit_tip().is_some());
        assert!(engine.hide_edit_tip().is_none());
    }

    #[test]
    fn toggle_twice_restores_state() {
        let (mut engine, _clock, _store) = setup(DriftPolicy::FastForward);
        engine.start_new_challenge(three_tasks()).unwrap();
        let ids = task_ids(&engine);
        engine.toggle_task(&ids[0]);
        engine.toggle_task(&ids[1]);
        let before = engine.challenge().unwrap().clone();

        engine.toggle_task(&ids[2]);
        assert!(engine.challenge().unwrap().is_day_completed(1));
        engine.toggle_task(&ids[2]);

        assert_eq!(engine.challenge().unwrap(), &before);
        assert!(!engine.challenge().unwrap().is_day_completed(1));
    }

    #[test]
    fn toggle_unknown_task_or_without_challenge_is_noop() {
        let (mut engine, _clock, store) = setup(DriftPolicy::FastForward);
        assert!(engine.toggle_task("nope").is_empty());

        engine.start_new_challenge(three_tasks()).unwrap();
        let saves = store.save_count();
        assert!(engine.toggle_task("nope").is_empty());
        assert_eq!(store.save_count(), saves);
    }

    #[test]
    fn day_status_is_pure() {
        let (mut engine, _clock, store) = setup(DriftPolicy::FastForward);
        engine.start_new_challenge(three_tasks()).unwrap();
        let saves = store.save_count();
        let first = engine.calendar();
        let second = engine.calendar();
        assert_eq!(first, second);
        assert_eq!(store.save_count(), saves);
        assert_eq!(first[0].state, DayState::Current);
        assert!(first[1..].iter().all(|s| s.state == DayState::Upcoming));
    }

    #[test]
    fn same_day_check_is_idempotent() {
        let (mut engine, clock, store) = setup(DriftPolicy::FastForward);
        engine.start_new_challenge(three_tasks()).unwrap();
        let ids = task_ids(&engine);
        engine.toggle_task(&ids[0]);
        let saves = store.save_count();

        clock.advance(Duration::hours(11));
        assert!(engine.check_challenge_status().is_empty());
        assert!(engine.check_challenge_status().is_empty());
        assert_eq!(store.save_count(), saves);
        assert!(engine.challenge().unwrap().tasks[0].completed);
    }

    #[test]
    fn toggle_after_midnight_applies_to_new_day() {
        let (mut engine, clock, _store) = setup(DriftPolicy::FastForward);
        engine.start_new_challenge(three_tasks()).unwrap();
        let ids = task_ids(&engine);
        engine.toggle_task(&ids[0]);

        clock.advance(Duration::days(1));
        let events = engine.toggle_task(&ids[1]);
        assert_eq!(events.len(), 2);
        assert!(matches!(
            events[0],
            Event::DayAdvanced {
                from_day: 1,
                to_day: 2,
                ..
            }
        ));
        match &events[1] {
            Event::TaskToggled { day, completed, .. } => {
                assert_eq!(*day, 2);
                assert!(*completed);
            }
            other => panic!("unexpected event {other:?}"),
        }
        let record = engine.challenge().unwrap();
        assert!(!record.tasks[0].completed, "yesterday's check was cleared");
        assert!(record.tasks[1].completed);
    }

    #[test]
    fn clock_moved_backward_never_decreases_day() {
        let (mut engine, clock, _store) = setup(DriftPolicy::FastForward);
        engine.start_new_challenge(three_tasks()).unwrap();
        clock.advance(Duration::days(5));
        engine.check_challenge_status();
        assert_eq!(engine.current_day(), Some(6));

        clock.advance(Duration::days(-3));
        assert!(engine.check_challenge_status().is_empty());
        assert_eq!(engine.current_day(), Some(6));

        clock.advance(Duration::days(-30));
        engine.check_challenge_status();
        assert_eq!(engine.current_day(), Some(6));
    }

    #[test]
    fn mark_failed_policy_fails_on_skipped_day() {
        let (mut engine, clock, _store) = setup(DriftPolicy::MarkFailed);
        engine.start_new_challenge(three_tasks()).unwrap();

        clock.advance(Duration::days(1));
        engine.check_challenge_status();
        assert_eq!(engine.challenge().unwrap().status, ChallengeStatus::Ongoing);

        clock.advance(Duration::days(2));
        let events = engine.check_challenge_status();
        assert_eq!(events.len(), 2);
        assert!(matches!(
            events[1],
            Event::StatusChanged {
                from: ChallengeStatus::Ongoing,
                to: ChallengeStatus::Failed,
                ..
            }
        ));
        let record = engine.challenge().unwrap();
        assert_eq!(record.current_day, 4);
        assert_eq!(record.status, ChallengeStatus::Failed);

        // Terminal: further days and toggles change nothing.
        let ids = task_ids(&engine);
        assert!(engine.toggle_task(&ids[0]).is_empty());
        clock.advance(Duration::days(1));
        assert!(engine.check_challenge_status().is_empty());
        assert_eq!(engine.current_day(), Some(4));
    }

    #[test]
    fn fast_forward_policy_never_fails() {
        let (mut engine, clock, _store) = setup(DriftPolicy::FastForward);
        engine.start_new_challenge(three_tasks()).unwrap();
        clock.advance(Duration::days(60));
        engine.check_challenge_status();
        let record = engine.challenge().unwrap();
        assert_eq!(record.current_day, CHALLENGE_DAYS);
        assert_eq!(record.status, ChallengeStatus::Ongoing);
    }

    #[test]
    fn mark_failed_policy_fails_when_final_day_passes_incomplete() {
        let (mut engine, clock, _store) = setup(DriftPolicy::MarkFailed);
        engine.start_new_challenge(three_tasks()).unwrap();
        for _ in 1..CHALLENGE_DAYS {
            clock.advance(Duration::days(1));
            engine.check_challenge_status();
        }
        assert_eq!(engine.current_day(), Some(CHALLENGE_DAYS));
        assert_eq!(engine.challenge().unwrap().status, ChallengeStatus::Ongoing);

        clock.advance(Duration::days(1));
        engine.check_challenge_status();
        assert_eq!(engine.challenge().unwrap().status, ChallengeStatus::Failed);
    }

    #[test]
    fn partial_final_day_is_closed_at_deadline() {
        let (mut engine, clock, store) = setup(DriftPolicy::FastForward);
        engine
            .start_new_challenge(templates_for(&[TaskCategory::WakeUp, TaskCategory::Diet]))
            .unwrap();
        let ids = task_ids(&engine);

        clock.advance(Duration::days(i64::from(CHALLENGE_DAYS) - 1));
        engine.check_challenge_status();
        assert_eq!(engine.current_day(), Some(CHALLENGE_DAYS));
        assert_eq!(engine.toggle_task(&ids[0]).len(), 1);

        clock.advance(Duration::days(1));
        let saves = store.save_count();
        assert!(engine.check_challenge_status().is_empty());
        assert_eq!(store.save_count(), saves + 1);
        let record = engine.challenge().unwrap();
        assert!(record.tasks.iter().all(|t| !t.completed));
        assert_eq!(record.current_day, CHALLENGE_DAYS);

        // The missing task cannot be made up on day 51 or any later day.
        assert!(engine.toggle_task(&ids[1]).is_empty());
        clock.advance(Duration::days(30));
        assert!(engine.toggle_task(&ids[1]).is_empty());
        assert!(engine.toggle_task(&ids[0]).is_empty());

        let record = engine.challenge().unwrap();
        assert!(!record.is_day_completed(CHALLENGE_DAYS));
        assert_eq!(record.status, ChallengeStatus::Ongoing);
        assert!(store.load().unwrap().unwrap().tasks.iter().all(|t| !t.completed));
    }

    #[test]
    fn completed_final_day_completes_at_deadline() {
        let (mut engine, clock, _store) = setup(DriftPolicy::FastForward);
        engine.start_new_challenge(three_tasks()).unwrap();
        clock.advance(Duration::days(i64::from(CHALLENGE_DAYS) - 1));
        for id in task_ids(&engine) {
            engine.toggle_task(&id);
        }
        assert!(engine.challenge().unwrap().is_day_completed(CHALLENGE_DAYS));

        clock.advance(Duration::days(1));
        let events = engine.check_challenge_status();
        assert!(matches!(
            events.as_slice(),
            [Event::StatusChanged {
                to: ChallengeStatus::Completed,
                ..
            }]
        ));
        let record = engine.challenge().unwrap();
        assert!(record.tasks.iter().all(|t| !t.completed));
        assert!(record.is_day_completed(CHALLENGE_DAYS));
    }

    #[test]
    fn notes_upsert_by_day_and_reject_out_of_range() {
        let (mut engine, _clock, _store) = setup(DriftPolicy::FastForward);
        assert!(engine.add_or_update_note(5, "no challenge", None).is_none());

        engine.start_new_challenge(three_tasks()).unwrap();
        assert_eq!(
            engine.add_or_update_note(5, "first", None),
            Some(Event::NoteSaved {
                day: 5,
                created: true,
                at: engine.now_utc()
            })
        );
        engine.add_or_update_note(5, "second", Some(Mood::Great));
        assert!(engine.add_or_update_note(0, "zero", None).is_none());
        assert!(engine.add_or_update_note(51, "late", None).is_none());

        let record = engine.challenge().unwrap();
        assert_eq!(record.notes.len(), 1);
        assert_eq!(record.note_for(5).unwrap().content, "second");
        assert!(engine.day_status(5).has_note);
        assert_eq!(engine.day_status(5).state, DayState::Upcoming);

        assert!(engine.remove_note(5).is_some());
        assert!(engine.remove_note(5).is_none());
        assert!(!engine.day_status(5).has_note);
    }

    #[test]
    fn update_description_in_place() {
        let (mut engine, _clock, store) = setup(DriftPolicy::FastForward);
        engine.start_new_challenge(three_tasks()).unwrap();
        let ids = task_ids(&engine);
        engine.update_task_description(&ids[1], "Read 20 pages");

        let stored = store.load().unwrap().unwrap();
        assert_eq!(stored.task(&ids[1]).unwrap().description, "Read 20 pages");
        assert!(engine.update_task_description("nope", "x").is_none());
    }

    #[test]
    fn reset_clears_memory_and_store() {
        let (mut engine, _clock, store) = setup(DriftPolicy::FastForward);
        engine.start_new_challenge(three_tasks()).unwrap();
        engine.select_day(3);
        engine.reset_challenge();

        let snap = engine.snapshot();
        assert!(snap.current_challenge.is_none());
        assert!(snap.selected_day_for_editing.is_none());
        assert!(!snap.show_edit_tip);
        assert!(store.load().unwrap().is_none());
        assert!(store.last_update().unwrap().is_none());
        assert_eq!(engine.day_status(1).state, DayState::Upcoming);
    }

    #[test]
    fn failed_writes_degrade_to_memory() {
        let (mut engine, _clock, store) = setup(DriftPolicy::FastForward);
        engine.start_new_challenge(three_tasks()).unwrap();
        let ids = task_ids(&engine);

        store.set_fail_writes(true);
        assert!(!engine.toggle_task(&ids[0]).is_empty());
        assert!(engine.is_persistence_degraded());
        assert!(engine.challenge().unwrap().tasks[0].completed);

        // Later writes are not attempted even once the store recovers.
        store.set_fail_writes(false);
        engine.toggle_task(&ids[1]);
        let stored = store.load().unwrap().unwrap();
        assert!(stored.tasks.iter().all(|t| !t.completed));
    }

    #[test]
    fn dispatch_routes_intents() {
        let (mut engine, _clock, _store) = setup(DriftPolicy::FastForward);
        assert!(engine
            .dispatch(Intent::StartNewChallenge { tasks: Vec::new() })
            .is_err());
        let events = engine
            .dispatch(Intent::StartNewChallenge {
                tasks: three_tasks(),
            })
            .unwrap();
        assert_eq!(events[0].kind(), "challenge_started");

        let events = engine.dispatch(Intent::SelectDay { day: 7 }).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(engine.snapshot().selected_day_for_editing, Some(7));
        assert!(engine.dispatch(Intent::SelectDay { day: 99 }).unwrap().is_empty());
        engine.dispatch(Intent::ClearSelection).unwrap();
        assert_eq!(engine.snapshot().selected_day_for_editing, None);

        assert!(engine.dispatch(Intent::CheckChallengeStatus).unwrap().is_empty());
    }

    #[test]
    fn intent_json_shape() {
        let intent: Intent =
            serde_json::from_str(r#"{"intent":"add_or_update_note","day":3,"content":"hi"}"#).unwrap();
        assert_eq!(
            intent,
            Intent::AddOrUpdateNote {
                day: 3,
                content: "hi".into(),
                mood: None
            }
        );
    }
}
