//! AnimationTask: one interpolated value over time.
//!
//! Timing math (per applied frame, all in milliseconds):
//! - `scaled_duration = duration * duration_scale`
//! - `scaled_delay = start_delay * duration_scale`
//! - `clamped = min(elapsed - scaled_delay, scaled_duration)`
//! - `clamped < 0` → still inside the start delay, nothing is reported
//! - otherwise `fraction = interpolator(clamped / scaled_duration)` (1 for a
//!   zero duration), update listeners fire, and the task ends naturally once
//!   `clamped == scaled_duration`.
//!
//! The value is read lazily: `start() + fraction * (end() - start())` against
//! the current results of the endpoint suppliers.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use log::trace;

use crate::ids::{ListenerId, TaskId};
use crate::interp::Interpolator;
use crate::listener::{AnimationListener, ListenerList, OnEnd, OnStart};
use crate::scheduler::{AnimationScheduler, SchedulerInner};
use crate::state::TaskState;

/// Duration given to tasks that never set one.
pub const DEFAULT_DURATION_MS: u64 = 300;

type ValueSupplier = Rc<dyn Fn() -> f32>;
type UpdateListener = dyn Fn(&AnimationTask);
type LifecycleListener = dyn AnimationListener<AnimationTask>;

struct TaskInner {
    id: TaskId,
    scheduler: Weak<SchedulerInner>,
    state: Cell<TaskState>,
    /// Bumped on every start so a pass can tell a restarted run from its own.
    run: Cell<u32>,
    duration_ms: Cell<u64>,
    start_delay_ms: Cell<u64>,
    elapsed_ms: Cell<u64>,
    animated_fraction: Cell<f32>,
    completed_naturally: Cell<bool>,
    /// Set once `cancel` or `end` takes hold of the current run; nested calls
    /// from listeners are then no-ops.
    finishing: Cell<bool>,
    interpolator: RefCell<Interpolator>,
    start_value: RefCell<ValueSupplier>,
    end_value: RefCell<ValueSupplier>,
    update_listeners: RefCell<ListenerList<UpdateListener>>,
    listeners: RefCell<ListenerList<LifecycleListener>>,
}

/// Handle to a time-based interpolation driven by an [`AnimationScheduler`].
///
/// Cloning the handle shares the task. The task keeps only a weak reference
/// to its scheduler; once the scheduler is gone, `start` is a silent no-op.
#[derive(Clone)]
pub struct AnimationTask {
    inner: Rc<TaskInner>,
}

impl AnimationTask {
    /// Create an inert task (state `Ended`) animating 0 → 1 over the default duration.
    pub fn new(scheduler: &AnimationScheduler) -> Self {
        let inner = TaskInner {
            id: scheduler.alloc_task_id(),
            scheduler: scheduler.downgrade(),
            state: Cell::new(TaskState::Ended),
            run: Cell::new(0),
            duration_ms: Cell::new(DEFAULT_DURATION_MS),
            start_delay_ms: Cell::new(0),
            elapsed_ms: Cell::new(0),
            animated_fraction: Cell::new(0.0),
            completed_naturally: Cell::new(false),
            finishing: Cell::new(false),
            interpolator: RefCell::new(Interpolator::default()),
            start_value: RefCell::new(Rc::new(|| 0.0)),
            end_value: RefCell::new(Rc::new(|| 1.0)),
            update_listeners: RefCell::new(ListenerList::new()),
            listeners: RefCell::new(ListenerList::new()),
        };
        Self {
            inner: Rc::new(inner),
        }
    }

    /// Fixed endpoints plus one update listener receiving the animated value.
    pub fn of_float(
        scheduler: &AnimationScheduler,
        start: f32,
        end: f32,
        duration_ms: i64,
        on_value: impl Fn(f32) + 'static,
    ) -> Self {
        let task = Self::new(scheduler);
        task.set_values(start, end);
        task.set_duration(duration_ms);
        task.add_update_listener(move |t| on_value(t.value()));
        task
    }

    /// Endpoints evaluated lazily on every read.
    pub fn of_suppliers(
        scheduler: &AnimationScheduler,
        start: impl Fn() -> f32 + 'static,
        end: impl Fn() -> f32 + 'static,
        duration_ms: i64,
    ) -> Self {
        let task = Self::new(scheduler);
        task.set_start_supplier(start);
        task.set_end_supplier(end);
        task.set_duration(duration_ms);
        task
    }

    pub fn with_interpolator(self, interpolator: Interpolator) -> Self {
        self.set_interpolator(interpolator);
        self
    }

    pub fn with_start_delay(self, delay_ms: i64) -> Self {
        self.set_start_delay(delay_ms);
        self
    }

    // ----- configuration -----

    /// Negative durations clamp to zero.
    pub fn set_duration(&self, duration_ms: i64) {
        self.inner.duration_ms.set(duration_ms.max(0) as u64);
    }

    /// Negative delays clamp to zero.
    pub fn set_start_delay(&self, delay_ms: i64) {
        self.inner.start_delay_ms.set(delay_ms.max(0) as u64);
    }

    pub fn set_interpolator(&self, interpolator: Interpolator) {
        *self.inner.interpolator.borrow_mut() = interpolator;
    }

    pub fn set_values(&self, start: f32, end: f32) {
        self.set_start_supplier(move || start);
        self.set_end_supplier(move || end);
    }

    pub fn set_start_supplier(&self, start: impl Fn() -> f32 + 'static) {
        *self.inner.start_value.borrow_mut() = Rc::new(start);
    }

    pub fn set_end_supplier(&self, end: impl Fn() -> f32 + 'static) {
        *self.inner.end_value.borrow_mut() = Rc::new(end);
    }

    // ----- accessors -----

    #[inline]
    pub fn id(&self) -> TaskId {
        self.inner.id
    }

    #[inline]
    pub fn state(&self) -> TaskState {
        self.inner.state.get()
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.state().is_running()
    }

    /// True between `start` and the end of the run, start delay included.
    #[inline]
    pub fn is_started(&self) -> bool {
        self.state() != TaskState::Ended
    }

    pub fn duration_ms(&self) -> u64 {
        self.inner.duration_ms.get()
    }

    pub fn start_delay_ms(&self) -> u64 {
        self.inner.start_delay_ms.get()
    }

    /// Start delay plus duration, before scaling.
    pub fn total_duration_ms(&self) -> u64 {
        self.start_delay_ms().saturating_add(self.duration_ms())
    }

    /// Time accumulated since `start`, start delay included.
    pub fn elapsed_ms(&self) -> u64 {
        self.inner.elapsed_ms.get()
    }

    pub fn animated_fraction(&self) -> f32 {
        self.inner.animated_fraction.get()
    }

    pub fn completed_naturally(&self) -> bool {
        self.inner.completed_naturally.get()
    }

    pub fn interpolator(&self) -> Interpolator {
        self.inner.interpolator.borrow().clone()
    }

    pub fn start_value(&self) -> f32 {
        let supplier = Rc::clone(&self.inner.start_value.borrow());
        supplier()
    }

    pub fn end_value(&self) -> f32 {
        let supplier = Rc::clone(&self.inner.end_value.borrow());
        supplier()
    }

    /// Current interpolated value against the live endpoint suppliers.
    pub fn value(&self) -> f32 {
        let start = self.start_value();
        start + self.animated_fraction() * (self.end_value() - start)
    }

    /// Whether both handles refer to the same task.
    #[inline]
    pub fn ptr_eq(&self, other: &AnimationTask) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    // ----- listeners -----

    /// Called once per applied frame, and once more on an explicit early `end`.
    pub fn add_update_listener(&self, listener: impl Fn(&AnimationTask) + 'static) -> ListenerId {
        self.inner
            .update_listeners
            .borrow_mut()
            .add(Rc::new(listener))
    }

    pub fn remove_update_listener(&self, id: ListenerId) -> bool {
        self.inner.update_listeners.borrow_mut().remove(id)
    }

    pub fn add_listener(
        &self,
        listener: impl AnimationListener<AnimationTask> + 'static,
    ) -> ListenerId {
        self.inner.listeners.borrow_mut().add(Rc::new(listener))
    }

    pub fn add_start_listener(&self, f: impl Fn(&AnimationTask) + 'static) -> ListenerId {
        self.add_listener(OnStart(f))
    }

    pub fn add_end_listener(&self, f: impl Fn(&AnimationTask) + 'static) -> ListenerId {
        self.add_listener(OnEnd(f))
    }

    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.inner.listeners.borrow_mut().remove(id)
    }

    /// Drop every update and lifecycle listener.
    pub fn remove_all_listeners(&self) {
        self.inner.update_listeners.borrow_mut().clear();
        self.inner.listeners.borrow_mut().clear();
    }

    // ----- lifecycle -----

    /// Begin a run. No-op unless the task is `Ended`, or if its scheduler is gone.
    ///
    /// Resets elapsed time and the animated fraction, registers with the
    /// scheduler, then fires start callbacks. In test mode the scheduler then
    /// drives the task straight to `Ended` before this returns.
    pub fn start(&self) {
        if !self.state().can_start() {
            return;
        }
        let Some(scheduler) = self.inner.scheduler.upgrade() else {
            trace!("task {:?}: start ignored, scheduler dropped", self.id());
            return;
        };
        let scheduler = AnimationScheduler::from_inner(scheduler);

        let run = self.inner.run.get().wrapping_add(1);
        self.inner.run.set(run);
        self.inner.elapsed_ms.set(0);
        self.inner.animated_fraction.set(0.0);
        self.inner.completed_naturally.set(false);
        self.inner.finishing.set(false);
        self.inner.state.set(TaskState::Started);
        self.inner.state.set(TaskState::Running);
        trace!("task {:?}: started", self.id());

        scheduler.register(self);

        let listeners = self.inner.listeners.borrow().snapshot();
        for listener in listeners {
            listener.on_start(self);
        }

        // A start listener may already have canceled or ended this run.
        if self.is_running() && self.inner.run.get() == run {
            scheduler.fast_forward_if_testing(self);
        }
    }

    /// Stop where the task is. The animated fraction keeps its last value.
    pub fn cancel(&self) {
        if !self.state().can_finish() || self.inner.finishing.get() {
            return;
        }
        self.inner.finishing.set(true);
        self.inner.state.set(TaskState::Canceled);
        trace!(
            "task {:?}: canceled at fraction {}",
            self.id(),
            self.animated_fraction()
        );
        let listeners = self.inner.listeners.borrow().snapshot();
        for listener in listeners {
            listener.on_cancel(self);
        }
        self.finish();
    }

    /// Finish the run now.
    ///
    /// An explicit early end (neither canceled nor completed naturally) jumps
    /// the fraction to 1 and fires one final update before the end callbacks.
    pub fn end(&self) {
        if !self.state().can_finish() || self.inner.finishing.get() {
            return;
        }
        self.inner.finishing.set(true);
        self.finish();
    }

    fn finish(&self) {
        let was_canceled = self.state() == TaskState::Canceled;
        if !was_canceled && !self.completed_naturally() {
            self.inner.animated_fraction.set(1.0);
            self.notify_update();
        }

        // End listeners see a settled task they may start again.
        self.inner.state.set(TaskState::Ended);
        self.inner.finishing.set(false);
        trace!(
            "task {:?}: ended (canceled: {}, natural: {})",
            self.id(),
            was_canceled,
            self.completed_naturally()
        );
        if let Some(scheduler) = self.inner.scheduler.upgrade() {
            AnimationScheduler::from_inner(scheduler).deregister(self);
        }
        let listeners = self.inner.listeners.borrow().snapshot();
        for listener in listeners {
            listener.on_end(self);
        }
    }

    /// Apply one frame's worth of time. Only meaningful while `Running`.
    pub(crate) fn advance(&self, delta_ms: u64) {
        if !self.is_running() {
            return;
        }
        let inner = &self.inner;
        let run = inner.run.get();
        let elapsed = inner.elapsed_ms.get().saturating_add(delta_ms);
        inner.elapsed_ms.set(elapsed);

        let scale = self.duration_scale();
        let scaled_duration = inner.duration_ms.get() as f64 * scale;
        let scaled_delay = inner.start_delay_ms.get() as f64 * scale;
        let clamped = (elapsed as f64 - scaled_delay).min(scaled_duration);
        if clamped < 0.0 {
            return;
        }

        let fraction = if scaled_duration > 0.0 {
            let interpolator = self.interpolator();
            interpolator.apply((clamped / scaled_duration) as f32)
        } else {
            1.0
        };
        inner.animated_fraction.set(fraction);
        self.notify_update();

        if clamped == scaled_duration && self.is_running() && inner.run.get() == run {
            inner.completed_naturally.set(true);
            self.end();
        }
    }

    fn notify_update(&self) {
        let run = self.inner.run.get();
        let listeners = self.inner.update_listeners.borrow().snapshot();
        for listener in listeners {
            // Canceling from a listener silences the rest of this fan-out.
            if !self.is_running() || self.inner.run.get() != run {
                break;
            }
            listener(self);
        }
    }

    fn duration_scale(&self) -> f64 {
        self.inner
            .scheduler
            .upgrade()
            .map(|inner| AnimationScheduler::from_inner(inner).config().duration_scale as f64)
            .unwrap_or(1.0)
    }
}

impl fmt::Debug for AnimationTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnimationTask")
            .field("id", &self.id())
            .field("state", &self.state())
            .field("duration_ms", &self.duration_ms())
            .field("start_delay_ms", &self.start_delay_ms())
            .field("elapsed_ms", &self.elapsed_ms())
            .field("animated_fraction", &self.animated_fraction())
            .field("update_listeners", &self.inner.update_listeners.borrow().len())
            .field("listeners", &self.inner.listeners.borrow().len())
            .finish()
    }
}
