use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use cadence::prelude::*;

fn targets(n: usize) -> Vec<NodeId> {
    let mut scene = SceneGraph::new();
    (0..n).map(|_| scene.create_node()).collect()
}

fn counter() -> Rc<RefCell<u32>> {
    Rc::new(RefCell::new(0))
}

fn counting(hits: &Rc<RefCell<u32>>) -> impl FnMut(f32) -> Result<()> {
    let hits = Rc::clone(hits);
    move |_| {
        *hits.borrow_mut() += 1;
        Ok(())
    }
}

#[test]
fn update_priority_order() {
    let scheduler = Scheduler::new();
    let t = targets(3);
    let log = Rc::new(RefCell::new(Vec::new()));

    for &(target, priority, name) in &[(t[1], 10, "b"), (t[2], 0, "c"), (t[0], -10, "a")] {
        let log = Rc::clone(&log);
        scheduler.schedule_update(target, priority, false, move |_| {
            log.borrow_mut().push(name);
            Ok(())
        });
    }

    scheduler.update(0.016).unwrap();
    assert_eq!(*log.borrow(), vec!["a", "c", "b"]);
}

#[test]
fn priority_buckets_sorted_ascending() {
    let scheduler = Scheduler::new();
    let t = targets(4);
    let log = Rc::new(RefCell::new(Vec::new()));

    for &(target, priority) in &[(t[0], -1), (t[1], -10), (t[2], 5), (t[3], 1)] {
        let log = Rc::clone(&log);
        scheduler.schedule_update(target, priority, false, move |_| {
            log.borrow_mut().push(priority);
            Ok(())
        });
    }

    scheduler.update(0.016).unwrap();
    assert_eq!(*log.borrow(), vec![-10, -1, 1, 5]);
}

#[test]
fn reschedule_updates_interval_in_place() {
    let scheduler = Scheduler::new();
    let t = targets(1);
    let first = counter();
    let second = counter();

    let params = TimerParams {
        interval: 100.0,
        ..Default::default()
    };
    scheduler.schedule(t[0], "tick", params, counting(&first));
    assert!(scheduler.is_scheduled(t[0], "tick"));

    // Same key again: only the interval of the existing timer changes.
    let params = TimerParams {
        interval: 0.0,
        ..Default::default()
    };
    scheduler.schedule(t[0], "tick", params, counting(&second));
    assert!(scheduler.is_scheduled(t[0], "tick"));

    scheduler.update(0.1).unwrap(); // arming tick
    scheduler.update(0.1).unwrap();
    scheduler.update(0.1).unwrap();

    assert_eq!(*first.borrow(), 2);
    assert_eq!(*second.borrow(), 0);
}

#[test]
fn zero_interval_fires_every_frame() {
    let scheduler = Scheduler::new();
    let t = targets(1);
    let hits = counter();

    scheduler.schedule(t[0], "tick", TimerParams::default(), counting(&hits));

    for _ in 0..5 {
        scheduler.update(0.016).unwrap();
    }

    // The first tick arms the timer, the remaining four fire.
    assert_eq!(*hits.borrow(), 4);
}

#[test]
fn one_shot_fires_after_delay_then_unschedules() {
    let scheduler = Scheduler::new();
    let t = targets(1);
    let hits = counter();

    scheduler.schedule_once(t[0], "boom", 0.5, counting(&hits));

    scheduler.update(0.3).unwrap(); // arming tick
    scheduler.update(0.3).unwrap(); // 0.3 < 0.5
    assert_eq!(*hits.borrow(), 0);

    scheduler.update(0.3).unwrap(); // 0.6 >= 0.5
    assert_eq!(*hits.borrow(), 1);
    assert!(!scheduler.is_scheduled(t[0], "boom"));

    scheduler.update(0.3).unwrap();
    assert_eq!(*hits.borrow(), 1);
}

#[test]
fn pause_suppresses_and_resume_restores() {
    let scheduler = Scheduler::new();
    let t = targets(1);
    let timer_hits = counter();
    let update_hits = counter();

    scheduler.schedule(t[0], "tick", TimerParams::default(), counting(&timer_hits));
    scheduler.schedule_update(t[0], 0, false, counting(&update_hits));
    scheduler.update(0.016).unwrap(); // arm the timer

    scheduler.pause_target(t[0]);
    assert!(scheduler.is_target_paused(t[0]));

    scheduler.update(0.016).unwrap();
    scheduler.update(0.016).unwrap();
    assert_eq!(*timer_hits.borrow(), 0);
    assert_eq!(*update_hits.borrow(), 1);

    scheduler.resume_target(t[0]);
    assert!(!scheduler.is_target_paused(t[0]));

    scheduler.update(0.016).unwrap();
    assert_eq!(*timer_hits.borrow(), 1);
    assert_eq!(*update_hits.borrow(), 2);
}

#[test]
fn unschedule_self_from_callback() {
    let scheduler = Arc::new(Scheduler::new());
    let t = targets(1);
    let hits = counter();

    let this = Arc::clone(&scheduler);
    let target = t[0];
    let counted = Rc::clone(&hits);
    scheduler.schedule(target, "self-destruct", TimerParams::default(), move |_| {
        *counted.borrow_mut() += 1;
        this.unschedule(target, "self-destruct");
        Ok(())
    });

    scheduler.update(0.016).unwrap(); // arm
    scheduler.update(0.016).unwrap(); // fires once, removes itself
    scheduler.update(0.016).unwrap();

    assert_eq!(*hits.borrow(), 1);
    assert!(!scheduler.is_scheduled(target, "self-destruct"));
}

#[test]
fn unschedule_sibling_mid_pass() {
    let scheduler = Arc::new(Scheduler::new());
    let t = targets(1);
    let survivor_hits = counter();
    let victim_hits = counter();

    let this = Arc::clone(&scheduler);
    let target = t[0];
    let counted = Rc::clone(&survivor_hits);
    scheduler.schedule(target, "survivor", TimerParams::default(), move |_| {
        *counted.borrow_mut() += 1;
        this.unschedule(target, "victim");
        Ok(())
    });
    scheduler.schedule(target, "victim", TimerParams::default(), counting(&victim_hits));

    scheduler.update(0.016).unwrap(); // arm both
    scheduler.update(0.016).unwrap(); // survivor fires and removes victim first

    assert_eq!(*survivor_hits.borrow(), 1);
    assert_eq!(*victim_hits.borrow(), 0);
}

#[test]
fn pause_all_with_min_priority_filters_updates() {
    let scheduler = Scheduler::new();
    let t = targets(4);
    let neg = counter();
    let zero = counter();
    let pos = counter();
    let timer = counter();

    scheduler.schedule_update(t[0], -5, false, counting(&neg));
    scheduler.schedule_update(t[1], 0, false, counting(&zero));
    scheduler.schedule_update(t[2], 5, false, counting(&pos));
    scheduler.schedule(t[3], "tick", TimerParams::default(), counting(&timer));
    scheduler.update(0.016).unwrap(); // arm the timer

    let affected = scheduler.pause_all_targets_with_min_priority(0);
    assert_eq!(affected.len(), 3); // zero, pos and the timer target

    scheduler.update(0.016).unwrap();
    assert_eq!(*neg.borrow(), 2);
    assert_eq!(*zero.borrow(), 1);
    assert_eq!(*pos.borrow(), 1);
    assert_eq!(*timer.borrow(), 0);

    scheduler.resume_targets(&affected);
    scheduler.update(0.016).unwrap();
    assert_eq!(*zero.borrow(), 2);
    assert_eq!(*pos.borrow(), 2);
    assert_eq!(*timer.borrow(), 1);
}

#[test]
fn unschedule_all_with_min_priority() {
    let scheduler = Scheduler::new();
    let t = targets(4);
    let neg = counter();
    let zero = counter();
    let pos = counter();
    let timer = counter();

    scheduler.schedule_update(t[0], -5, false, counting(&neg));
    scheduler.schedule_update(t[1], 0, false, counting(&zero));
    scheduler.schedule_update(t[2], 5, false, counting(&pos));
    scheduler.schedule(t[3], "tick", TimerParams::default(), counting(&timer));
    scheduler.update(0.016).unwrap(); // arm the timer

    // Timers go unconditionally, update callbacks only at >= 1.
    scheduler.unschedule_all_with_min_priority(1);

    assert!(!scheduler.is_scheduled(t[3], "tick"));
    assert!(scheduler.has_update(t[0]));
    assert!(scheduler.has_update(t[1]));
    assert!(!scheduler.has_update(t[2]));

    scheduler.update(0.016).unwrap();
    assert_eq!(*neg.borrow(), 2);
    assert_eq!(*zero.borrow(), 2);
    assert_eq!(*pos.borrow(), 1);
    assert_eq!(*timer.borrow(), 0);
}

#[test]
fn stress_cancelled_timers_never_fire() {
    use rand::Rng;

    let scheduler = Scheduler::new();
    let t = targets(8);
    let hits: Vec<_> = (0..t.len()).map(|_| counter()).collect();
    let mut rng = rand::thread_rng();

    for _ in 0..200 {
        let i = rng.gen_range(0, t.len());
        match rng.gen_range(0, 4) {
            0 => scheduler.schedule(t[i], "stress", TimerParams::default(), counting(&hits[i])),
            1 => scheduler.unschedule(t[i], "stress"),
            2 => scheduler.pause_target(t[i]),
            _ => scheduler.update(0.016).unwrap(),
        }
    }

    // Freeze everything; the counters must not move afterwards.
    scheduler.unschedule_all();
    let frozen: Vec<u32> = hits.iter().map(|v| *v.borrow()).collect();

    for _ in 0..10 {
        scheduler.update(0.016).unwrap();
    }

    let after: Vec<u32> = hits.iter().map(|v| *v.borrow()).collect();
    assert_eq!(frozen, after);
}
