use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use cadence::prelude::*;

fn targets(n: usize) -> Vec<NodeId> {
    let mut scene = SceneGraph::new();
    (0..n).map(|_| scene.create_node()).collect()
}

#[test]
fn tween_delivers_progress_and_completes() {
    let manager = ActionManager::new();
    let t = targets(1);
    let seen = Rc::new(RefCell::new(Vec::new()));

    let log = Rc::clone(&seen);
    let tween = Tween::new(1.0, move |v| {
        log.borrow_mut().push(v);
        Ok(())
    });

    manager.add_action(t[0], Box::new(tween), false);
    assert_eq!(manager.running_actions(t[0]), 1);

    for _ in 0..3 {
        manager.update(0.4).unwrap();
    }

    let seen = seen.borrow();
    assert_eq!(seen.len(), 3);
    assert!((seen[0] - 0.4).abs() < 1e-6);
    assert!((seen[1] - 0.8).abs() < 1e-6);
    assert!((seen[2] - 1.0).abs() < 1e-6);
    assert_eq!(manager.running_actions(t[0]), 0);
}

#[test]
fn composite_counts_as_one_running_action() {
    let manager = ActionManager::new();
    let t = targets(1);

    let seq = Sequence::new(vec![
        Box::new(Delay::new(1.0)),
        Box::new(Invoke::new(|| Ok(()))),
        Box::new(Delay::new(1.0)),
    ]);

    manager.add_action(t[0], Box::new(seq), false);
    assert_eq!(manager.running_actions(t[0]), 1);

    manager.update(0.1).unwrap();
    assert_eq!(manager.running_actions(t[0]), 1);
}

#[test]
fn sequence_fires_followup_in_the_completing_frame() {
    let manager = ActionManager::new();
    let t = targets(1);
    let fired = Rc::new(RefCell::new(false));

    let flag = Rc::clone(&fired);
    let seq = Sequence::new(vec![
        Box::new(Delay::new(0.5)),
        Box::new(Invoke::new(move || {
            *flag.borrow_mut() = true;
            Ok(())
        })),
    ]);

    manager.add_action(t[0], Box::new(seq), false);

    manager.update(0.3).unwrap();
    assert!(!*fired.borrow());

    manager.update(0.3).unwrap();
    assert!(*fired.borrow());
    assert_eq!(manager.running_actions(t[0]), 0);
}

#[test]
fn remove_all_from_inside_a_step() {
    let manager = Arc::new(ActionManager::new());
    let t = targets(1);
    let hits = Rc::new(RefCell::new(0));

    let this = Arc::clone(&manager);
    let target = t[0];
    let counted = Rc::clone(&hits);
    manager.add_action(
        target,
        Box::new(Invoke::new(move || {
            *counted.borrow_mut() += 1;
            this.remove_all_actions_from_target(target);
            Ok(())
        })),
        false,
    );
    manager.add_action(target, Box::new(Delay::new(10.0)), false);

    manager.update(0.016).unwrap();
    assert_eq!(manager.running_actions(target), 0);

    manager.update(0.016).unwrap();
    assert_eq!(*hits.borrow(), 1);
}

#[test]
fn removal_by_tag() {
    let manager = ActionManager::new();
    let t = targets(1);

    manager.add_action_with_tag(t[0], 7, Box::new(Delay::new(10.0)), false);
    manager.add_action_with_tag(t[0], 7, Box::new(Delay::new(10.0)), false);
    manager.add_action_with_tag(t[0], 9, Box::new(Delay::new(10.0)), false);
    assert_eq!(manager.running_actions(t[0]), 3);

    manager.remove_action_by_tag(t[0], 7);
    assert_eq!(manager.running_actions(t[0]), 2);

    manager.remove_actions_by_tag(t[0], 7);
    assert_eq!(manager.running_actions(t[0]), 1);

    manager.remove_actions_by_tag(t[0], 9);
    assert_eq!(manager.running_actions(t[0]), 0);
}

#[test]
fn paused_targets_do_not_step() {
    let manager = ActionManager::new();
    let t = targets(1);

    manager.add_action(t[0], Box::new(Delay::new(1.0)), true);
    assert!(manager.is_target_paused(t[0]));

    for _ in 0..20 {
        manager.update(0.1).unwrap();
    }
    assert_eq!(manager.running_actions(t[0]), 1);

    manager.resume_target(t[0]);
    for _ in 0..12 {
        manager.update(0.1).unwrap();
    }
    assert_eq!(manager.running_actions(t[0]), 0);
}

#[test]
fn pause_all_returns_the_affected_set() {
    let manager = ActionManager::new();
    let t = targets(2);
    let hits = Rc::new(RefCell::new(0));

    for target in &t {
        let counted = Rc::clone(&hits);
        manager.add_action(
            *target,
            Box::new(Invoke::new(move || {
                *counted.borrow_mut() += 1;
                Ok(())
            })),
            false,
        );
    }

    let affected = manager.pause_all_targets();
    assert_eq!(affected.len(), 2);

    manager.update(0.016).unwrap();
    assert_eq!(*hits.borrow(), 0);

    manager.resume_targets(&affected);
    manager.update(0.016).unwrap();
    assert_eq!(*hits.borrow(), 2);
}

#[test]
fn repeat_forever_keeps_running() {
    let manager = ActionManager::new();
    let t = targets(1);
    let hits = Rc::new(RefCell::new(0));

    let counted = Rc::clone(&hits);
    let repeat = RepeatAction::forever(Box::new(Invoke::new(move || {
        *counted.borrow_mut() += 1;
        Ok(())
    })));

    manager.add_action(t[0], Box::new(repeat), false);

    for _ in 0..5 {
        manager.update(0.016).unwrap();
    }

    assert_eq!(manager.running_actions(t[0]), 1);
    assert_eq!(*hits.borrow(), 5);
}
