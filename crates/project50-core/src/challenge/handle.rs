//! Shared, serialized access to the engine.
//!
//! Timer ticks, foreground signals and user intents can arrive from
//! different threads. They all go through one mutex, so a day reset and a
//! task toggle never interleave. After every operation the new
//! [`Snapshot`] is published on a watch channel.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::watch;

use super::engine::{ChallengeEngine, Intent, Snapshot};
use super::status::DayStatus;
use crate::error::Result;
use crate::events::Event;
use crate::scheduler::{ScheduleHandle, Scheduler};

pub struct ChallengeHandle {
    engine: Arc<Mutex<ChallengeEngine>>,
    published: Arc<watch::Sender<Snapshot>>,
    schedule: Option<ScheduleHandle>,
}

impl ChallengeHandle {
    pub fn new(engine: ChallengeEngine) -> Self {
        let (published, _) = watch::channel(engine.snapshot());
        Self {
            engine: Arc::new(Mutex::new(engine)),
            published: Arc::new(published),
            schedule: None,
        }
    }

    /// Receive every snapshot published after an operation.
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.published.subscribe()
    }

    pub fn snapshot(&self) -> Snapshot {
        lock(&self.engine).snapshot()
    }

    pub fn day_status(&self, day: u32) -> DayStatus {
        lock(&self.engine).day_status(day)
    }

    pub fn calendar(&self) -> Vec<DayStatus> {
        lock(&self.engine).calendar()
    }

    /// Apply an intent under the lock and publish the result.
    ///
    /// # Errors
    /// Propagates validation errors from `StartNewChallenge`.
    pub fn dispatch(&self, intent: Intent) -> Result<Vec<Event>> {
        apply(&self.engine, &self.published, |engine| engine.dispatch(intent))
    }

    pub fn check_challenge_status(&self) -> Vec<Event> {
        apply(&self.engine, &self.published, ChallengeEngine::check_challenge_status)
    }

    pub fn on_become_active(&self) -> Vec<Event> {
        apply(&self.engine, &self.published, ChallengeEngine::on_become_active)
    }

    pub fn on_external_time_signal(&self) -> Vec<Event> {
        apply(&self.engine, &self.published, ChallengeEngine::on_external_time_signal)
    }

    /// Start periodic day checks. Replaces any running schedule.
    pub fn start_status_checks(&mut self, scheduler: &dyn Scheduler, interval: Duration) {
        self.stop_status_checks();
        let engine = Arc::clone(&self.engine);
        let published = Arc::clone(&self.published);
        let tick = Arc::new(move || {
            let events = apply(&engine, &published, ChallengeEngine::check_challenge_status);
            for event in &events {
                tracing::debug!(kind = event.kind(), "scheduled check produced event");
            }
        });
        self.schedule = Some(scheduler.every(interval, tick));
        tracing::debug!(?interval, "status checks started");
    }

    pub fn stop_status_checks(&mut self) {
        if let Some(schedule) = self.schedule.take() {
            schedule.cancel();
            tracing::debug!("status checks stopped");
        }
    }

    pub fn is_checking(&self) -> bool {
        self.schedule.is_some()
    }
}

impl Drop for ChallengeHandle {
    fn drop(&mut self) {
        self.stop_status_checks();
    }
}

fn apply<R>(
    engine: &Mutex<ChallengeEngine>,
    published: &watch::Sender<Snapshot>,
    op: impl FnOnce(&mut ChallengeEngine) -> R,
) -> R {
    let mut engine = lock(engine);
    let result = op(&mut engine);
    // Publish under the lock so subscribers see snapshots in order.
    published.send_replace(engine.snapshot());
    result
}

fn lock(engine: &Mutex<ChallengeEngine>) -> MutexGuard<'_, ChallengeEngine> {
    engine.lock().unwrap_or_else(|e| e.into_inner())
}
