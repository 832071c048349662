//! # Project 50 Core Library
//!
//! Business logic for a 50-day personal challenge: pick daily tasks, check
//! them off every day, keep a note per day, and see each day of the
//! challenge classified on a calendar.
//!
//! ## Architecture
//!
//! - **Challenge Engine**: a calendar-driven state machine. The caller
//!   invokes `check_challenge_status()` periodically (or lets a
//!   [`ChallengeHandle`] do it through a [`Scheduler`]) and on OS time
//!   signals.
//! - **Day Resolver**: pure day math from a start date and a [`Clock`].
//! - **Storage**: the record as a JSON blob in a SQLite key-value table,
//!   plus TOML configuration.
//!
//! ## Key Components
//!
//! - [`ChallengeEngine`]: owns and mutates the single challenge
//! - [`ChallengeHandle`]: serialized shared access and published snapshots
//! - [`ChallengeStore`]: persistence capability the engine is built with
//! - [`Config`]: application configuration management

pub mod challenge;
pub mod clock;
pub mod error;
pub mod events;
pub mod logging;
pub mod scheduler;
pub mod storage;

pub use challenge::{
    templates, templates_for, ChallengeEngine, ChallengeHandle, ChallengeRecord, ChallengeStatus,
    DayNote, DayResolver, DayState, DayStatus, DriftPolicy, Intent, Mood, Snapshot, TaskCategory,
    TaskDefinition, TaskTemplate, CHALLENGE_DAYS,
};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{ConfigError, CoreError, StorageError, ValidationError};
pub use events::Event;
pub use scheduler::{ManualScheduler, ScheduleHandle, Scheduler, TokioScheduler};
pub use storage::{ChallengeStore, Config, Database, MemoryStore};
