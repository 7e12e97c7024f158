//! Float property bindings: tasks that write their animated value straight
//! into a target object on every applied frame.
//!
//! Targets are shared (`Rc<T>`), so properties write through interior
//! mutability (typically a `Cell<f32>` field).

use std::cell::Cell;
use std::rc::Rc;

use crate::scheduler::AnimationScheduler;
use crate::task::AnimationTask;

/// Named float accessor on a target type.
pub trait FloatProperty<T: ?Sized> {
    fn name(&self) -> &str;
    fn get(&self, target: &T) -> f32;
    fn set(&self, target: &T, value: f32);
}

/// [`FloatProperty`] built from a getter/setter pair.
pub struct FnProperty<T: ?Sized> {
    name: &'static str,
    getter: fn(&T) -> f32,
    setter: fn(&T, f32),
}

impl<T: ?Sized> FnProperty<T> {
    pub const fn new(name: &'static str, getter: fn(&T) -> f32, setter: fn(&T, f32)) -> Self {
        Self {
            name,
            getter,
            setter,
        }
    }
}

impl<T: ?Sized> FloatProperty<T> for FnProperty<T> {
    fn name(&self) -> &str {
        self.name
    }

    fn get(&self, target: &T) -> f32 {
        (self.getter)(target)
    }

    fn set(&self, target: &T, value: f32) {
        (self.setter)(target, value)
    }
}

impl AnimationTask {
    /// Animate `property` on `target` from `start` to `end`.
    pub fn of_property<T, P>(
        scheduler: &AnimationScheduler,
        target: Rc<T>,
        property: P,
        start: f32,
        end: f32,
        duration_ms: i64,
    ) -> Self
    where
        T: ?Sized + 'static,
        P: FloatProperty<T> + 'static,
    {
        let task = Self::new(scheduler);
        task.set_values(start, end);
        task.set_duration(duration_ms);
        task.add_update_listener(move |t| property.set(&target, t.value()));
        task
    }

    /// Animate `property` on `target` from whatever value it holds when the
    /// task starts (captured once per run) to `end`.
    pub fn of_property_from_current<T, P>(
        scheduler: &AnimationScheduler,
        target: Rc<T>,
        property: P,
        end: f32,
        duration_ms: i64,
    ) -> Self
    where
        T: ?Sized + 'static,
        P: FloatProperty<T> + 'static,
    {
        let property = Rc::new(property);
        let captured = Rc::new(Cell::new(property.get(&target)));

        let task = Self::new(scheduler);
        task.set_duration(duration_ms);
        {
            let captured = Rc::clone(&captured);
            task.set_start_supplier(move || captured.get());
        }
        task.set_end_supplier(move || end);
        {
            let (captured, property, target) =
                (Rc::clone(&captured), Rc::clone(&property), Rc::clone(&target));
            task.add_start_listener(move |_| captured.set(property.get(&target)));
        }
        task.add_update_listener(move |t| property.set(&target, t.value()));
        task
    }
}
