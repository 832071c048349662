mod engine;
mod handle;
mod note;
mod record;
mod resolver;
mod status;
mod task;

pub use engine::{ChallengeEngine, DriftPolicy, Intent, Snapshot};
pub use handle::ChallengeHandle;
pub use note::{DayNote, Mood};
pub use record::{ChallengeRecord, ChallengeStatus, CHALLENGE_DAYS};
pub use resolver::{clamp_day, day_has_advanced, DayResolver, Resolution};
pub use status::{DayState, DayStatus};
pub use task::{templates, templates_for, TaskCategory, TaskDefinition, TaskTemplate};
