//! AnimationScheduler: owns the active task set and drives it from an
//! external frame tick.
//!
//! Frame pass:
//! - copy the active set (listeners may start or cancel tasks mid-pass)
//! - advance every copied task by the same delta
//! - drop tasks that ended during the pass
//! - issue exactly one redraw request
//!
//! Redraw requests coalesce: registrations between two passes issue at most
//! one request, and a pass suppresses requests from tasks it starts.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use log::{debug, trace};

use crate::clock::{Clock, SystemClock};
use crate::config::{sanitize_scale, SchedulerConfig};
use crate::diagnostics::{SchedulerSnapshot, TaskSnapshot};
use crate::ids::{IdAllocator, TaskId};
use crate::task::AnimationTask;

/// Delta used to complete every active task in one pass (test mode).
pub const FAST_FORWARD_MS: u64 = u64::MAX;

pub(crate) struct SchedulerInner {
    config: Cell<SchedulerConfig>,
    clock: Rc<dyn Clock>,
    request_redraw: Box<dyn Fn()>,
    active: RefCell<Vec<AnimationTask>>,
    last_frame_ms: Cell<u64>,
    redraw_pending: Cell<bool>,
    ids: RefCell<IdAllocator>,
}

/// Cooperative, single-threaded frame scheduler for [`AnimationTask`]s.
///
/// Cloning the handle shares the scheduler. Tasks refer back to it weakly.
#[derive(Clone)]
pub struct AnimationScheduler {
    inner: Rc<SchedulerInner>,
}

impl AnimationScheduler {
    /// `request_redraw` is invoked whenever the scheduler needs another frame.
    pub fn new(
        config: SchedulerConfig,
        clock: Rc<dyn Clock>,
        request_redraw: impl Fn() + 'static,
    ) -> Self {
        let config = config.with_duration_scale(config.duration_scale);
        let now = clock.now_ms();
        let inner = SchedulerInner {
            config: Cell::new(config),
            clock,
            request_redraw: Box::new(request_redraw),
            active: RefCell::new(Vec::new()),
            last_frame_ms: Cell::new(now),
            redraw_pending: Cell::new(false),
            ids: RefCell::new(IdAllocator::new()),
        };
        Self {
            inner: Rc::new(inner),
        }
    }

    pub fn with_system_clock(config: SchedulerConfig, request_redraw: impl Fn() + 'static) -> Self {
        Self::new(config, Rc::new(SystemClock::new()), request_redraw)
    }

    pub(crate) fn from_inner(inner: Rc<SchedulerInner>) -> Self {
        Self { inner }
    }

    pub(crate) fn downgrade(&self) -> Weak<SchedulerInner> {
        Rc::downgrade(&self.inner)
    }

    pub(crate) fn alloc_task_id(&self) -> TaskId {
        self.inner.ids.borrow_mut().alloc_task()
    }

    // ----- configuration -----

    pub fn config(&self) -> SchedulerConfig {
        self.inner.config.get()
    }

    /// Refresh the duration scale from the host's animation-speed setting.
    /// Takes effect on the next applied frame.
    pub fn set_duration_scale(&self, scale: f32) {
        let cfg = self.config();
        self.inner.config.set(SchedulerConfig {
            duration_scale: sanitize_scale(scale),
            ..cfg
        });
    }

    pub fn set_test_mode(&self, enabled: bool) {
        let cfg = self.config();
        self.inner.config.set(cfg.with_test_mode(enabled));
    }

    // ----- registration -----

    /// Add a task to the active set and, in test mode, fast-forward it.
    ///
    /// Registering a task that is already active, or one that is not
    /// running, is a no-op.
    pub fn register_and_start(&self, task: &AnimationTask) {
        if self.register(task) {
            self.fast_forward_if_testing(task);
        }
    }

    /// Add a running task to the active set. Returns whether it was added.
    pub(crate) fn register(&self, task: &AnimationTask) -> bool {
        if !task.is_running() {
            return false;
        }
        let was_empty = {
            let mut active = self.inner.active.borrow_mut();
            if active.iter().any(|t| t.ptr_eq(task)) {
                return false;
            }
            let was_empty = active.is_empty();
            active.push(task.clone());
            was_empty
        };
        if was_empty {
            // Avoid an artificially large first delta after an idle period.
            self.inner.last_frame_ms.set(self.inner.clock.now_ms());
        }
        debug!(
            "scheduler: registered task {:?} ({} active)",
            task.id(),
            self.active_count()
        );

        if !self.inner.redraw_pending.get() {
            self.inner.redraw_pending.set(true);
            (self.inner.request_redraw)();
        }
        true
    }

    /// Complete every active task in one pass when test mode is on.
    pub(crate) fn fast_forward_if_testing(&self, task: &AnimationTask) {
        if self.config().test_mode {
            debug!("scheduler: test mode, fast-forwarding task {:?}", task.id());
            self.advance_frame_by(FAST_FORWARD_MS);
        }
    }

    /// Remove a task without touching its state. Called when a task ends.
    pub(crate) fn deregister(&self, task: &AnimationTask) {
        self.inner
            .active
            .borrow_mut()
            .retain(|t| !t.ptr_eq(task));
    }

    // ----- frames -----

    /// Advance by the wall-clock time since the last frame.
    /// Returns whether the active set is now empty.
    pub fn advance_frame(&self) -> bool {
        let now = self.inner.clock.now_ms();
        let delta = now.saturating_sub(self.inner.last_frame_ms.get());
        self.inner.last_frame_ms.set(now);
        self.advance_frame_by(delta)
    }

    /// Advance every active task by `delta_ms`.
    /// Returns whether the active set is now empty.
    pub fn advance_frame_by(&self, delta_ms: u64) -> bool {
        // Starts triggered from inside the pass ride on the redraw issued below.
        self.inner.redraw_pending.set(true);

        let snapshot: Vec<AnimationTask> = self.inner.active.borrow().clone();
        for task in &snapshot {
            task.advance(delta_ms);
        }

        let (removed, idle) = {
            let mut active = self.inner.active.borrow_mut();
            let before = active.len();
            active.retain(|t| t.is_running());
            (before - active.len(), active.is_empty())
        };
        trace!(
            "scheduler: frame delta={}ms advanced={} removed={} idle={}",
            delta_ms,
            snapshot.len(),
            removed,
            idle
        );

        // Once idle the host may stop ticking, so the next registration must
        // ask for a frame again.
        self.inner.redraw_pending.set(!idle);
        (self.inner.request_redraw)();
        idle
    }

    /// Explicitly end every active task, firing the usual callbacks.
    pub fn end_all(&self) {
        let snapshot: Vec<AnimationTask> = self.inner.active.borrow().clone();
        debug!("scheduler: ending {} active task(s)", snapshot.len());
        for task in &snapshot {
            task.end();
        }
    }

    /// Drop every active task without firing any callbacks.
    pub fn destroy(&self) {
        let dropped = {
            let mut active = self.inner.active.borrow_mut();
            let n = active.len();
            active.clear();
            n
        };
        self.inner.redraw_pending.set(false);
        debug!("scheduler: destroyed, dropped {} active task(s)", dropped);
    }

    // ----- inspection -----

    pub fn active_count(&self) -> usize {
        self.inner.active.borrow().len()
    }

    pub fn is_idle(&self) -> bool {
        self.inner.active.borrow().is_empty()
    }

    pub fn is_active(&self, task: &AnimationTask) -> bool {
        self.inner.active.borrow().iter().any(|t| t.ptr_eq(task))
    }

    pub fn last_frame_ms(&self) -> u64 {
        self.inner.last_frame_ms.get()
    }

    pub fn snapshot(&self) -> SchedulerSnapshot {
        let tasks: Vec<AnimationTask> = self.inner.active.borrow().clone();
        let active = tasks.iter().map(TaskSnapshot::of).collect();
        SchedulerSnapshot {
            last_frame_ms: self.last_frame_ms(),
            redraw_pending: self.inner.redraw_pending.get(),
            duration_scale: self.config().duration_scale,
            active,
        }
    }
}

impl fmt::Debug for AnimationScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnimationScheduler")
            .field("config", &self.config())
            .field("active", &self.active_count())
            .field("last_frame_ms", &self.last_frame_ms())
            .field("redraw_pending", &self.inner.redraw_pending.get())
            .finish()
    }
}
