use std::cell::Cell;
use std::rc::Rc;

use approx::assert_abs_diff_eq;
use compositor_animation_core::{
    AnimationScheduler, AnimationTask, FloatProperty, FnProperty, Interpolator, ManualClock,
    SchedulerConfig, TaskState,
};

struct Tab {
    draw_x: Cell<f32>,
    alpha: Cell<f32>,
}

impl Tab {
    fn new(x: f32) -> Rc<Self> {
        Rc::new(Self {
            draw_x: Cell::new(x),
            alpha: Cell::new(1.0),
        })
    }
}

fn draw_x() -> FnProperty<Tab> {
    fn get(tab: &Tab) -> f32 {
        tab.draw_x.get()
    }
    fn set(tab: &Tab, x: f32) {
        tab.draw_x.set(x)
    }
    FnProperty::new("draw_x", get, set)
}

/// Hand-written property to exercise the trait directly.
struct Alpha;

impl FloatProperty<Tab> for Alpha {
    fn name(&self) -> &str {
        "alpha"
    }
    fn get(&self, tab: &Tab) -> f32 {
        tab.alpha.get()
    }
    fn set(&self, tab: &Tab, value: f32) {
        tab.alpha.set(value.clamp(0.0, 1.0))
    }
}

fn scheduler() -> AnimationScheduler {
    AnimationScheduler::new(SchedulerConfig::default(), Rc::new(ManualClock::new(0)), || {})
}

#[test]
fn property_follows_every_frame() {
    let s = scheduler();
    let tab = Tab::new(0.0);
    let task = AnimationTask::of_property(&s, Rc::clone(&tab), draw_x(), 0.0, 120.0, 200)
        .with_interpolator(Interpolator::linear());

    task.start();
    assert_eq!(tab.draw_x.get(), 0.0);

    s.advance_frame_by(50);
    assert_abs_diff_eq!(tab.draw_x.get(), 30.0, epsilon = 1e-4);
    s.advance_frame_by(150);
    assert_abs_diff_eq!(tab.draw_x.get(), 120.0, epsilon = 1e-4);
    assert_eq!(task.state(), TaskState::Ended);
}

#[test]
fn canceled_property_keeps_its_last_value() {
    let s = scheduler();
    let tab = Tab::new(1.0);
    let task = AnimationTask::of_property(&s, Rc::clone(&tab), Alpha, 1.0, 0.0, 100)
        .with_interpolator(Interpolator::linear());

    task.start();
    s.advance_frame_by(25);
    task.cancel();
    s.advance_frame_by(100);

    assert_abs_diff_eq!(tab.alpha.get(), 0.75, epsilon = 1e-6);
}

#[test]
fn explicit_end_writes_the_end_value() {
    let s = scheduler();
    let tab = Tab::new(10.0);
    let task = AnimationTask::of_property(&s, Rc::clone(&tab), draw_x(), 10.0, 40.0, 100);
    task.start();
    task.end();
    assert_eq!(tab.draw_x.get(), 40.0);
}

#[test]
fn from_current_captures_the_value_at_start() {
    let s = scheduler();
    let tab = Tab::new(5.0);
    let task = AnimationTask::of_property_from_current(&s, Rc::clone(&tab), draw_x(), 15.0, 100)
        .with_interpolator(Interpolator::linear());

    // Moved after construction; the run starts from here.
    tab.draw_x.set(9.0);
    task.start();
    assert_eq!(task.start_value(), 9.0);

    s.advance_frame_by(50);
    assert_abs_diff_eq!(tab.draw_x.get(), 12.0, epsilon = 1e-4);
    // The property itself changes every frame; the start point does not.
    assert_eq!(task.start_value(), 9.0);

    s.advance_frame_by(50);
    assert_abs_diff_eq!(tab.draw_x.get(), 15.0, epsilon = 1e-4);

    // A second run starts from the previous end.
    task.start();
    assert_abs_diff_eq!(task.start_value(), 15.0, epsilon = 1e-4);
}

#[test]
fn properties_in_test_mode_land_on_the_end_value() {
    let s = AnimationScheduler::new(SchedulerConfig::testing(), Rc::new(ManualClock::new(0)), || {});
    let tab = Tab::new(0.0);
    let task = AnimationTask::of_property(&s, Rc::clone(&tab), Alpha, 1.0, 0.5, 300);
    tab.alpha.set(0.2);
    task.start();
    assert_eq!(tab.alpha.get(), 0.5);
}
