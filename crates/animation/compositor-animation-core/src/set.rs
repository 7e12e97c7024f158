//! AnimationSet: sequential or parallel composition of tasks.
//!
//! A set watches its children through a lifecycle listener attached at
//! construction. In `Sequential` order each child starts when the previous
//! one ends without being canceled; in `Together` order every child starts
//! at once and the set ends with the last of them. Canceling any child while
//! the set runs cancels the whole set.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use log::trace;
use serde::{Deserialize, Serialize};

use crate::ids::ListenerId;
use crate::listener::{AnimationListener, ListenerList, OnEnd, OnStart};
use crate::task::AnimationTask;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SetOrdering {
    Sequential,
    Together,
}

type SetListener = dyn AnimationListener<AnimationSet>;

struct SetInner {
    ordering: SetOrdering,
    children: Vec<AnimationTask>,
    running: Cell<bool>,
    /// Set while the set itself is canceling or ending its children.
    finishing: Cell<bool>,
    /// Sequential: index of the child currently playing.
    cursor: Cell<usize>,
    /// Together: children that have not ended yet in this run.
    pending: RefCell<Vec<bool>>,
    listeners: RefCell<ListenerList<SetListener>>,
}

/// Composition of [`AnimationTask`]s played in order or all at once.
#[derive(Clone)]
pub struct AnimationSet {
    inner: Rc<SetInner>,
}

struct ChildWatcher {
    set: Weak<SetInner>,
}

impl ChildWatcher {
    fn set(&self) -> Option<AnimationSet> {
        self.set.upgrade().map(|inner| AnimationSet { inner })
    }
}

impl AnimationListener<AnimationTask> for ChildWatcher {
    fn on_cancel(&self, task: &AnimationTask) {
        if let Some(set) = self.set() {
            set.child_canceled(task);
        }
    }

    fn on_end(&self, task: &AnimationTask) {
        if let Some(set) = self.set() {
            set.child_ended(task);
        }
    }
}

impl AnimationSet {
    pub fn new(ordering: SetOrdering, children: Vec<AnimationTask>) -> Self {
        let len = children.len();
        let inner = Rc::new(SetInner {
            ordering,
            children,
            running: Cell::new(false),
            finishing: Cell::new(false),
            cursor: Cell::new(0),
            pending: RefCell::new(vec![false; len]),
            listeners: RefCell::new(ListenerList::new()),
        });
        for child in &inner.children {
            child.add_listener(ChildWatcher {
                set: Rc::downgrade(&inner),
            });
        }
        Self { inner }
    }

    /// Play children one after another.
    pub fn sequential(children: Vec<AnimationTask>) -> Self {
        Self::new(SetOrdering::Sequential, children)
    }

    /// Play all children at once.
    pub fn together(children: Vec<AnimationTask>) -> Self {
        Self::new(SetOrdering::Together, children)
    }

    pub fn ordering(&self) -> SetOrdering {
        self.inner.ordering
    }

    pub fn children(&self) -> &[AnimationTask] {
        &self.inner.children
    }

    pub fn is_running(&self) -> bool {
        self.inner.running.get()
    }

    /// Unscaled length of one run: the sum of child totals in sequence, the
    /// longest child when played together.
    pub fn total_duration_ms(&self) -> u64 {
        let totals = self.inner.children.iter().map(AnimationTask::total_duration_ms);
        match self.inner.ordering {
            SetOrdering::Sequential => totals.fold(0, u64::saturating_add),
            SetOrdering::Together => totals.max().unwrap_or(0),
        }
    }

    pub fn add_listener(&self, listener: impl AnimationListener<AnimationSet> + 'static) -> ListenerId {
        self.inner.listeners.borrow_mut().add(Rc::new(listener))
    }

    pub fn add_start_listener(&self, f: impl Fn(&AnimationSet) + 'static) -> ListenerId {
        self.add_listener(OnStart(f))
    }

    pub fn add_end_listener(&self, f: impl Fn(&AnimationSet) + 'static) -> ListenerId {
        self.add_listener(OnEnd(f))
    }

    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.inner.listeners.borrow_mut().remove(id)
    }

    pub fn start(&self) {
        if self.is_running() {
            return;
        }
        self.inner.running.set(true);
        self.inner.finishing.set(false);
        trace!(
            "set: starting {} child task(s) ({:?})",
            self.inner.children.len(),
            self.inner.ordering
        );
        let listeners = self.inner.listeners.borrow().snapshot();
        for listener in listeners {
            listener.on_start(self);
        }
        if !self.is_running() {
            return;
        }

        match self.inner.ordering {
            SetOrdering::Sequential => {
                self.inner.cursor.set(0);
                self.start_child_at(0);
            }
            SetOrdering::Together => {
                let len = self.inner.children.len();
                *self.inner.pending.borrow_mut() = vec![true; len];
                if len == 0 {
                    self.finish();
                    return;
                }
                for child in &self.inner.children {
                    if !self.is_running() {
                        break;
                    }
                    child.start();
                }
            }
        }
    }

    /// Cancel every running child and end the set. No further child starts.
    pub fn cancel(&self) {
        if !self.is_running() || self.inner.finishing.get() {
            return;
        }
        self.inner.finishing.set(true);
        let listeners = self.inner.listeners.borrow().snapshot();
        for listener in &listeners {
            listener.on_cancel(self);
        }
        for child in &self.inner.children {
            // A child already mid-cancel finishes on its own.
            if child.is_running() {
                child.cancel();
            }
        }
        self.finish();
    }

    /// Jump every unfinished child to its end value, in order, and end the set.
    pub fn end(&self) {
        if !self.is_running() || self.inner.finishing.get() {
            return;
        }
        self.inner.finishing.set(true);
        let unfinished: Vec<AnimationTask> = match self.inner.ordering {
            SetOrdering::Sequential => self.inner.children[self.inner.cursor.get()..].to_vec(),
            SetOrdering::Together => {
                let pending = self.inner.pending.borrow().clone();
                self.inner
                    .children
                    .iter()
                    .zip(pending)
                    .filter_map(|(child, pending)| pending.then(|| child.clone()))
                    .collect()
            }
        };
        for child in &unfinished {
            if !child.is_started() {
                child.start();
            }
            child.end();
        }
        self.finish();
    }

    fn start_child_at(&self, index: usize) {
        match self.inner.children.get(index) {
            Some(child) => child.start(),
            None => self.finish(),
        }
    }

    fn finish(&self) {
        self.inner.running.set(false);
        self.inner.finishing.set(false);
        trace!("set: ended");
        let listeners = self.inner.listeners.borrow().snapshot();
        for listener in listeners {
            listener.on_end(self);
        }
    }

    fn child_index(&self, task: &AnimationTask) -> Option<usize> {
        self.inner.children.iter().position(|c| c.ptr_eq(task))
    }

    fn child_canceled(&self, _task: &AnimationTask) {
        if self.is_running() && !self.inner.finishing.get() {
            self.cancel();
        }
    }

    fn child_ended(&self, task: &AnimationTask) {
        if !self.is_running() || self.inner.finishing.get() {
            return;
        }
        let Some(index) = self.child_index(task) else {
            return;
        };
        match self.inner.ordering {
            SetOrdering::Sequential => {
                if index == self.inner.cursor.get() {
                    let next = index + 1;
                    self.inner.cursor.set(next);
                    self.start_child_at(next);
                }
            }
            SetOrdering::Together => {
                let done = {
                    let mut pending = self.inner.pending.borrow_mut();
                    pending[index] = false;
                    pending.iter().all(|p| !p)
                };
                if done {
                    self.finish();
                }
            }
        }
    }
}

impl fmt::Debug for AnimationSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnimationSet")
            .field("ordering", &self.inner.ordering)
            .field("children", &self.inner.children.len())
            .field("running", &self.is_running())
            .field("cursor", &self.inner.cursor.get())
            .finish()
    }
}
