use serde::{Deserialize, Serialize};

/// Lifecycle state of an animation task.
///
/// `Ended` doubles as the initial state: a freshly built task is inert until
/// started, and an ended task may be started again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskState {
    /// Transient; promoted to `Running` within the same `start` call
    Started,
    /// Receiving frame updates
    Running,
    /// Canceled and about to end
    Canceled,
    /// Terminal, and the valid initial state
    #[default]
    Ended,
}

impl TaskState {
    /// Get the name of this state
    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Started => "started",
            Self::Running => "running",
            Self::Canceled => "canceled",
            Self::Ended => "ended",
        }
    }

    /// Check if the task is accepting frame updates
    #[inline]
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running)
    }

    /// Check if `start` would take effect from this state
    #[inline]
    pub fn can_start(&self) -> bool {
        matches!(self, Self::Ended)
    }

    /// Check if `cancel` or `end` would take effect from this state
    #[inline]
    pub fn can_finish(&self) -> bool {
        !matches!(self, Self::Ended)
    }
}

impl From<&str> for TaskState {
    fn from(s: &str) -> Self {
        match s {
            "started" => Self::Started,
            "running" => Self::Running,
            "canceled" => Self::Canceled,
            _ => Self::Ended,
        }
    }
}
