//! Compositor Animation Core
//!
//! Frame-driven, single-threaded animation scheduling. An
//! [`AnimationScheduler`] owns the set of running [`AnimationTask`]s and
//! advances them from an external tick; each task interpolates one float
//! value through a four-state lifecycle with update and lifecycle listeners.
//!
//! Hosts inject a [`SchedulerConfig`] (duration scale, test mode), a
//! [`Clock`], and a redraw callback. Nothing here spawns threads or blocks.

pub mod clock;
pub mod config;
pub mod diagnostics;
pub mod ids;
pub mod interp;
pub mod listener;
pub mod property;
pub mod scheduler;
pub mod set;
pub mod state;
pub mod task;

// Re-exports for hosts
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ConfigError, SchedulerConfig};
pub use diagnostics::{SchedulerSnapshot, TaskSnapshot};
pub use ids::{ListenerId, TaskId};
pub use interp::Interpolator;
pub use listener::{AnimationListener, OnCancel, OnEnd, OnStart};
pub use property::{FloatProperty, FnProperty};
pub use scheduler::{AnimationScheduler, FAST_FORWARD_MS};
pub use set::{AnimationSet, SetOrdering};
pub use state::TaskState;
pub use task::{AnimationTask, DEFAULT_DURATION_MS};
