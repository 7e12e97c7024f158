//! Listener registration and snapshot fan-out.
//!
//! Listener lists are copied before every fan-out so a callback may add or
//! remove listeners (or start and cancel tasks) without invalidating the
//! iteration in progress.

use std::rc::Rc;

use crate::ids::{IdAllocator, ListenerId};

/// Lifecycle callbacks for an animation (a task or a set).
/// Every method defaults to a no-op, so implementors override only what they need.
pub trait AnimationListener<A: ?Sized> {
    fn on_start(&self, _animation: &A) {}
    fn on_cancel(&self, _animation: &A) {}
    fn on_end(&self, _animation: &A) {}
}

/// Closure adapter fired on start only.
pub struct OnStart<F>(pub F);

impl<A: ?Sized, F: Fn(&A)> AnimationListener<A> for OnStart<F> {
    fn on_start(&self, animation: &A) {
        (self.0)(animation)
    }
}

/// Closure adapter fired on cancel only.
pub struct OnCancel<F>(pub F);

impl<A: ?Sized, F: Fn(&A)> AnimationListener<A> for OnCancel<F> {
    fn on_cancel(&self, animation: &A) {
        (self.0)(animation)
    }
}

/// Closure adapter fired on end only. End fires after cancel too.
pub struct OnEnd<F>(pub F);

impl<A: ?Sized, F: Fn(&A)> AnimationListener<A> for OnEnd<F> {
    fn on_end(&self, animation: &A) {
        (self.0)(animation)
    }
}

/// Ordered listener storage keyed by [`ListenerId`].
pub(crate) struct ListenerList<L: ?Sized> {
    ids: IdAllocator,
    entries: Vec<(ListenerId, Rc<L>)>,
}

impl<L: ?Sized> ListenerList<L> {
    pub(crate) fn new() -> Self {
        Self {
            ids: IdAllocator::new(),
            entries: Vec::new(),
        }
    }

    pub(crate) fn add(&mut self, listener: Rc<L>) -> ListenerId {
        let id = self.ids.alloc_listener();
        self.entries.push((id, listener));
        id
    }

    pub(crate) fn remove(&mut self, id: ListenerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry, _)| *entry != id);
        self.entries.len() != before
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Copy of the current listeners, in registration order.
    pub(crate) fn snapshot(&self) -> Vec<Rc<L>> {
        self.entries.iter().map(|(_, l)| Rc::clone(l)).collect()
    }
}
