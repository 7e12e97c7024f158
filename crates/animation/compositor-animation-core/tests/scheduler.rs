use std::cell::Cell;
use std::rc::Rc;

use approx::assert_abs_diff_eq;
use compositor_animation_core::{
    AnimationScheduler, AnimationTask, Interpolator, ManualClock, SchedulerConfig,
    SchedulerSnapshot, TaskState,
};

struct Harness {
    scheduler: AnimationScheduler,
    clock: Rc<ManualClock>,
    redraws: Rc<Cell<u32>>,
}

fn harness(config: SchedulerConfig) -> Harness {
    let clock = Rc::new(ManualClock::new(1_000));
    let redraws = Rc::new(Cell::new(0));
    let r = Rc::clone(&redraws);
    let scheduler = AnimationScheduler::new(config, clock.clone(), move || r.set(r.get() + 1));
    Harness {
        scheduler,
        clock,
        redraws,
    }
}

fn linear_task(s: &AnimationScheduler, duration_ms: i64) -> AnimationTask {
    let task = AnimationTask::new(s).with_interpolator(Interpolator::linear());
    task.set_duration(duration_ms);
    task
}

#[test]
fn shorter_task_ends_first() {
    let h = harness(SchedulerConfig::default());
    let short = linear_task(&h.scheduler, 40);
    let long = linear_task(&h.scheduler, 90);
    short.start();
    long.start();

    assert!(!h.scheduler.advance_frame_by(45));
    assert_eq!(short.state(), TaskState::Ended);
    assert_eq!(long.state(), TaskState::Running);
    assert_eq!(h.scheduler.active_count(), 1);

    assert!(h.scheduler.advance_frame_by(50));
    assert_eq!(long.state(), TaskState::Ended);
    assert!(h.scheduler.is_idle());
}

#[test]
fn registrations_in_one_frame_share_a_redraw() {
    let h = harness(SchedulerConfig::default());
    let tasks: Vec<_> = (0..3).map(|_| linear_task(&h.scheduler, 100)).collect();
    for task in &tasks {
        task.start();
    }
    assert_eq!(h.redraws.get(), 1);

    h.scheduler.advance_frame_by(10);
    assert_eq!(h.redraws.get(), 2);

    // Still animating: the next pass is already on its way.
    let late = linear_task(&h.scheduler, 100);
    late.start();
    assert_eq!(h.redraws.get(), 2);

    h.scheduler.advance_frame_by(200);
    assert_eq!(h.redraws.get(), 3);
    assert!(h.scheduler.is_idle());

    // Idle again, so a new start must ask for a frame.
    late.start();
    assert_eq!(h.redraws.get(), 4);
}

#[test]
fn every_pass_requests_a_redraw() {
    let h = harness(SchedulerConfig::default());
    assert!(h.scheduler.advance_frame_by(16));
    assert!(h.scheduler.advance_frame_by(16));
    assert_eq!(h.redraws.get(), 2);
}

#[test]
fn starts_inside_a_pass_ride_on_its_redraw() {
    let h = harness(SchedulerConfig::default());
    let first = linear_task(&h.scheduler, 10);
    let second = linear_task(&h.scheduler, 10);
    let next = second.clone();
    first.add_end_listener(move |_| next.start());

    first.start();
    assert_eq!(h.redraws.get(), 1);
    h.scheduler.advance_frame_by(15);

    assert_eq!(h.redraws.get(), 2);
    assert_eq!(second.state(), TaskState::Running);
    // Tasks started mid-pass are not advanced by that pass.
    assert_eq!(second.elapsed_ms(), 0);
    assert!(h.scheduler.is_active(&second));
}

#[test]
fn wall_clock_frames_use_the_clock_delta() {
    let h = harness(SchedulerConfig::default());
    let task = linear_task(&h.scheduler, 100);

    // A long idle gap before the first registration is not counted.
    h.clock.set(9_000);
    task.start();
    assert_eq!(h.scheduler.last_frame_ms(), 9_000);

    h.clock.advance(40);
    h.scheduler.advance_frame();
    assert_eq!(task.elapsed_ms(), 40);
    assert_abs_diff_eq!(task.animated_fraction(), 0.4, epsilon = 1e-6);
    assert_eq!(h.scheduler.last_frame_ms(), 9_040);

    h.clock.advance(60);
    assert!(h.scheduler.advance_frame());
    assert_eq!(task.state(), TaskState::Ended);
}

#[test]
fn clock_going_backwards_yields_zero_delta() {
    let h = harness(SchedulerConfig::default());
    let task = linear_task(&h.scheduler, 100);
    task.start();
    h.clock.set(500);
    h.scheduler.advance_frame();
    assert_eq!(task.elapsed_ms(), 0);
    assert_eq!(task.state(), TaskState::Running);
}

#[test]
fn test_mode_completes_tasks_on_start() {
    let h = harness(SchedulerConfig::testing());
    let updates = Rc::new(Cell::new(0));
    let ends = Rc::new(Cell::new(0));
    let task = linear_task(&h.scheduler, 5_000).with_start_delay(1_000);
    task.set_values(3.0, 7.0);
    {
        let u = Rc::clone(&updates);
        task.add_update_listener(move |_| u.set(u.get() + 1));
        let e = Rc::clone(&ends);
        task.add_end_listener(move |_| e.set(e.get() + 1));
    }

    task.start();

    assert_eq!(task.state(), TaskState::Ended);
    assert!(task.completed_naturally());
    assert_eq!(task.animated_fraction(), 1.0);
    assert_eq!(task.value(), 7.0);
    assert_eq!(updates.get(), 1);
    assert_eq!(ends.get(), 1);
    assert!(h.scheduler.is_idle());
}

#[test]
fn test_mode_fast_forwards_after_start_callbacks() {
    let h = harness(SchedulerConfig::testing());
    let task = linear_task(&h.scheduler, 100);
    let observed = Rc::new(Cell::new(None));
    let (o, sched) = (Rc::clone(&observed), h.scheduler.clone());
    task.add_start_listener(move |t| o.set(Some((t.state(), sched.is_active(t)))));

    task.start();

    assert_eq!(observed.get(), Some((TaskState::Running, true)));
    assert_eq!(task.state(), TaskState::Ended);
    assert!(h.scheduler.is_idle());
}

#[test]
fn test_mode_flushes_tasks_already_running() {
    let h = harness(SchedulerConfig::default());
    let running = linear_task(&h.scheduler, 100);
    running.start();
    h.scheduler.advance_frame_by(10);

    h.scheduler.set_test_mode(true);
    let fresh = linear_task(&h.scheduler, 100);
    fresh.start();

    assert_eq!(running.state(), TaskState::Ended);
    assert_eq!(fresh.state(), TaskState::Ended);
    assert!(h.scheduler.config().test_mode);
}

#[test]
fn duration_scale_applies_from_the_next_frame() {
    let h = harness(SchedulerConfig::default());
    let task = linear_task(&h.scheduler, 100);
    task.start();
    h.scheduler.advance_frame_by(20);
    assert_abs_diff_eq!(task.animated_fraction(), 0.2, epsilon = 1e-6);

    h.scheduler.set_duration_scale(2.0);
    h.scheduler.advance_frame_by(20);
    assert_abs_diff_eq!(task.animated_fraction(), 0.2, epsilon = 1e-6);
    assert_eq!(h.scheduler.config().duration_scale, 2.0);
}

#[test]
fn zero_scale_finishes_on_the_next_frame() {
    let h = harness(SchedulerConfig::default().with_duration_scale(0.0));
    let task = linear_task(&h.scheduler, 400).with_start_delay(100);
    task.start();
    h.scheduler.advance_frame_by(0);
    assert_eq!(task.state(), TaskState::Ended);
    assert_eq!(task.animated_fraction(), 1.0);
}

#[test]
fn invalid_scales_are_sanitized() {
    let h = harness(SchedulerConfig::default());
    h.scheduler.set_duration_scale(-3.0);
    assert_eq!(h.scheduler.config().duration_scale, 0.0);
    h.scheduler.set_duration_scale(f32::NAN);
    assert_eq!(h.scheduler.config().duration_scale, 1.0);
}

#[test]
fn registration_is_idempotent() {
    let h = harness(SchedulerConfig::default());
    let task = linear_task(&h.scheduler, 100);
    task.start();
    h.scheduler.register_and_start(&task);
    assert_eq!(h.scheduler.active_count(), 1);

    let idle = linear_task(&h.scheduler, 100);
    h.scheduler.register_and_start(&idle);
    assert!(!h.scheduler.is_active(&idle));
}

#[test]
fn end_all_fires_callbacks() {
    let h = harness(SchedulerConfig::default());
    let ends = Rc::new(Cell::new(0));
    let tasks: Vec<_> = (0..3)
        .map(|i| {
            let task = linear_task(&h.scheduler, 100 * (i + 1));
            let e = Rc::clone(&ends);
            task.add_end_listener(move |_| e.set(e.get() + 1));
            task.start();
            task
        })
        .collect();
    h.scheduler.advance_frame_by(50);

    h.scheduler.end_all();

    assert_eq!(ends.get(), 3);
    assert!(h.scheduler.is_idle());
    for task in &tasks {
        assert_eq!(task.animated_fraction(), 1.0);
        assert!(!task.completed_naturally());
    }
}

#[test]
fn destroy_drops_tasks_silently() {
    let h = harness(SchedulerConfig::default());
    let task = linear_task(&h.scheduler, 100);
    let ends = Rc::new(Cell::new(0));
    let e = Rc::clone(&ends);
    task.add_end_listener(move |_| e.set(e.get() + 1));
    task.start();
    h.scheduler.advance_frame_by(10);

    h.scheduler.destroy();

    assert!(h.scheduler.is_idle());
    assert_eq!(ends.get(), 0);
    // The task is orphaned mid-run; no frames reach it any more.
    assert_eq!(task.state(), TaskState::Running);
    h.scheduler.advance_frame_by(500);
    assert_abs_diff_eq!(task.animated_fraction(), 0.1, epsilon = 1e-6);
}

#[test]
fn snapshot_reports_active_tasks() {
    let h = harness(SchedulerConfig::default().with_duration_scale(1.5));
    let a = linear_task(&h.scheduler, 100);
    let b = linear_task(&h.scheduler, 300);
    a.set_values(0.0, 10.0);
    a.start();
    b.start();
    h.scheduler.advance_frame_by(75);

    let snap = h.scheduler.snapshot();
    assert_eq!(snap.active.len(), 2);
    assert_eq!(snap.duration_scale, 1.5);
    assert!(snap.redraw_pending);
    let a_snap = snap.find(a.id()).unwrap();
    assert_eq!(a_snap.state, TaskState::Running);
    assert_eq!(a_snap.elapsed_ms, 75);
    assert_abs_diff_eq!(a_snap.animated_fraction, 0.5, epsilon = 1e-6);
    assert_abs_diff_eq!(a_snap.value, 5.0, epsilon = 1e-5);

    let json = serde_json::to_string(&snap).unwrap();
    let back: SchedulerSnapshot = serde_json::from_str(&json).unwrap();
    assert_eq!(back, snap);

    h.scheduler.advance_frame_by(1_000);
    let snap = h.scheduler.snapshot();
    assert!(snap.is_idle());
    assert!(!snap.redraw_pending);
}
