//! Recurring day checks.
//!
//! The engine needs "something that calls `check_challenge_status()` at
//! least once per minute". [`Scheduler`] is that something, decoupled from
//! any particular timer API. A [`ScheduleHandle`] stops the recurrence when
//! cancelled or dropped, so nothing keeps firing after its owner is gone.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::time::MissedTickBehavior;

/// Callback run on every tick.
pub type Tick = Arc<dyn Fn() + Send + Sync + 'static>;

pub trait Scheduler {
    /// Run `tick` every `interval` until the returned handle is cancelled
    /// or dropped. The first run happens one interval from now.
    fn every(&self, interval: Duration, tick: Tick) -> ScheduleHandle;
}

/// Cancels a recurring tick on [`ScheduleHandle::cancel`] or drop.
#[must_use = "dropping the handle cancels the schedule"]
pub struct ScheduleHandle {
    cancel: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl ScheduleHandle {
    pub fn new(cancel: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    pub fn cancel(mut self) {
        self.run_cancel();
    }

    fn run_cancel(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for ScheduleHandle {
    fn drop(&mut self) {
        self.run_cancel();
    }
}

impl std::fmt::Debug for ScheduleHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScheduleHandle")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

/// Ticks on a tokio runtime using `tokio::time::interval`.
#[derive(Debug, Clone)]
pub struct TokioScheduler {
    runtime: tokio::runtime::Handle,
}

impl TokioScheduler {
    pub fn new(runtime: tokio::runtime::Handle) -> Self {
        Self { runtime }
    }

    /// Scheduler on the runtime of the calling task, if there is one.
    pub fn current() -> Option<Self> {
        tokio::runtime::Handle::try_current().ok().map(Self::new)
    }
}

impl Scheduler for TokioScheduler {
    fn every(&self, interval: Duration, tick: Tick) -> ScheduleHandle {
        let task = self.runtime.spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // A machine waking from sleep needs one check, not a burst.
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                tick();
            }
        });
        ScheduleHandle::new(move || task.abort())
    }
}

type Entry = (u64, Duration, Tick);

/// Scheduler that only ticks when told to. For tests and hosts with their
/// own event loop.
#[derive(Clone, Default)]
pub struct ManualScheduler {
    entries: Arc<Mutex<Vec<Entry>>>,
    next_id: Arc<AtomicU64>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run every active tick once. Returns how many ran.
    pub fn fire(&self) -> usize {
        let ticks: Vec<Tick> = lock(&self.entries)
            .iter()
            .map(|(_, _, tick)| Arc::clone(tick))
            .collect();
        for tick in &ticks {
            tick();
        }
        ticks.len()
    }

    pub fn active(&self) -> usize {
        lock(&self.entries).len()
    }

    /// Interval requested by each active schedule.
    pub fn intervals(&self) -> Vec<Duration> {
        lock(&self.entries).iter().map(|(_, every, _)| *every).collect()
    }
}

impl Scheduler for ManualScheduler {
    fn every(&self, interval: Duration, tick: Tick) -> ScheduleHandle {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        lock(&self.entries).push((id, interval, tick));

        let entries = Arc::clone(&self.entries);
        ScheduleHandle::new(move || lock(&entries).retain(|(entry_id, _, _)| *entry_id != id))
    }
}

impl std::fmt::Debug for ManualScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManualScheduler")
            .field("active", &self.active())
            .finish()
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}
