//! Serializable views of scheduler state for logging and test assertions.

use serde::{Deserialize, Serialize};

use crate::ids::TaskId;
use crate::state::TaskState;
use crate::task::AnimationTask;

/// Point-in-time view of one task.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TaskSnapshot {
    pub id: TaskId,
    pub state: TaskState,
    pub elapsed_ms: u64,
    pub animated_fraction: f32,
    pub value: f32,
}

impl TaskSnapshot {
    pub fn of(task: &AnimationTask) -> Self {
        Self {
            id: task.id(),
            state: task.state(),
            elapsed_ms: task.elapsed_ms(),
            animated_fraction: task.animated_fraction(),
            value: task.value(),
        }
    }
}

/// Point-in-time view of a scheduler and its active set.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SchedulerSnapshot {
    pub last_frame_ms: u64,
    pub redraw_pending: bool,
    pub duration_scale: f32,
    #[serde(default)]
    pub active: Vec<TaskSnapshot>,
}

impl SchedulerSnapshot {
    #[inline]
    pub fn is_idle(&self) -> bool {
        self.active.is_empty()
    }

    pub fn find(&self, id: TaskId) -> Option<&TaskSnapshot> {
        self.active.iter().find(|t| t.id == id)
    }
}
