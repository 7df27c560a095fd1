use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use crate::errors::Result;
use crate::scene::NodeId;
use crate::utils::{FastHashMap, FastHashSet, HashValue};

use super::timer::{Repeat, Timer, TimerParams};

type UpdateCallback = Box<dyn FnMut(f32) -> Result<()>>;

/// A named timer attached to a target. The interval lives outside the timer
/// state in an atomic cell, so an in-place re-schedule never has to touch a
/// timer that might be in the middle of firing.
struct TimerSlot {
    key: HashValue<str>,
    cancelled: AtomicBool,
    interval: AtomicU32,
    timer: Mutex<Timer>,
}

impl TimerSlot {
    #[inline]
    fn interval(&self) -> f32 {
        f32::from_bits(self.interval.load(Ordering::Relaxed))
    }

    #[inline]
    fn set_interval(&self, v: f32) {
        self.interval.store(v.to_bits(), Ordering::Relaxed);
    }

    #[inline]
    fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    #[inline]
    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

/// A per-frame update callback registered at a fixed priority.
struct UpdateSlot {
    priority: i32,
    paused: AtomicBool,
    cancelled: AtomicBool,
    callback: Mutex<UpdateCallback>,
}

/// All the timers of one target, in registration order.
struct TimerBucket {
    paused: bool,
    timers: Vec<Arc<TimerSlot>>,
}

#[derive(Default)]
struct SchedulerState {
    timers: FastHashMap<NodeId, TimerBucket>,
    updates: FastHashMap<NodeId, Arc<UpdateSlot>>,
    neg: Vec<Arc<UpdateSlot>>,
    zero: Vec<Arc<UpdateSlot>>,
    pos: Vec<Arc<UpdateSlot>>,
}

/// Drives named timers and priority-ordered per-frame callbacks for opaque
/// targets.
///
/// `update(dt)` iterates a snapshot of strong references taken at the top
/// of the pass. Anything unscheduled mid-pass is flagged and skipped from
/// that point on, while the snapshot's own reference keeps it alive until
/// the pass completes, so a callback may freely unschedule itself, its
/// siblings, or anything else without pulling the rug out from under the
/// running iteration. Anything scheduled mid-pass is not part of the
/// snapshot and first fires on the next frame.
pub struct Scheduler {
    state: Mutex<SchedulerState>,
}

impl Default for Scheduler {
    fn default() -> Self {
        Scheduler::new()
    }
}

impl Scheduler {
    /// Constructs a new, empty `Scheduler`.
    pub fn new() -> Self {
        Scheduler {
            state: Mutex::new(SchedulerState::default()),
        }
    }

    /// Registers a named timer on `target`.
    ///
    /// If `target` already owns a timer under `key`, only the interval of
    /// the existing timer is updated; no duplicate is created and the
    /// elapsed time, repeat and delay state are left untouched.
    pub fn schedule<F>(&self, target: NodeId, key: &str, params: TimerParams, callback: F)
    where
        F: FnMut(f32) -> Result<()> + 'static,
    {
        debug_assert!(!key.is_empty(), "timer keys must not be empty");
        if let Repeat::Times(n) = params.repeat {
            debug_assert!(n > 0, "a timer must fire at least once");
        }

        let key = HashValue::from(key);
        let mut state = self.state.lock().unwrap();
        let bucket = state.timers.entry(target).or_insert_with(|| TimerBucket {
            paused: params.paused,
            timers: Vec::new(),
        });

        if let Some(slot) = bucket.timers.iter().find(|v| v.key == key) {
            trace!(
                "[Scheduler] re-scheduling a timer in place; interval becomes {}s.",
                params.interval
            );
            slot.set_interval(params.interval);
            return;
        }

        bucket.timers.push(Arc::new(TimerSlot {
            key,
            cancelled: AtomicBool::new(false),
            interval: AtomicU32::new(params.interval.to_bits()),
            timer: Mutex::new(Timer::new(params, Box::new(callback))),
        }));
    }

    /// Registers a timer that fires once after `delay` seconds and then
    /// unschedules itself.
    pub fn schedule_once<F>(&self, target: NodeId, key: &str, delay: f32, callback: F)
    where
        F: FnMut(f32) -> Result<()> + 'static,
    {
        let params = TimerParams {
            interval: 0.0,
            repeat: Repeat::Times(1),
            delay,
            paused: false,
        };

        self.schedule(target, key, params, callback);
    }

    /// Registers the per-frame update callback of `target` at `priority`.
    ///
    /// Negative priorities fire before priority zero, positive ones after;
    /// within the negative and positive buckets entries are ordered
    /// ascending by priority, ties in registration order. A target carries
    /// at most one update callback: re-registering at the same priority
    /// only refreshes the paused flag, re-registering at a different one
    /// replaces the old entry with the new callback.
    pub fn schedule_update<F>(&self, target: NodeId, priority: i32, paused: bool, callback: F)
    where
        F: FnMut(f32) -> Result<()> + 'static,
    {
        let mut state = self.state.lock().unwrap();

        if let Some(slot) = state.updates.get(&target) {
            if slot.priority == priority {
                slot.paused.store(paused, Ordering::Relaxed);
                return;
            }

            debug!(
                "[Scheduler] re-registering the update callback of {} at priority {} (was {}).",
                target, priority, slot.priority
            );
            Self::remove_update_locked(&mut state, target);
        }

        let slot = Arc::new(UpdateSlot {
            priority,
            paused: AtomicBool::new(paused),
            cancelled: AtomicBool::new(false),
            callback: Mutex::new(Box::new(callback)),
        });

        state.updates.insert(target, slot.clone());

        if priority < 0 {
            Self::insert_sorted(&mut state.neg, slot);
        } else if priority == 0 {
            state.zero.push(slot);
        } else {
            Self::insert_sorted(&mut state.pos, slot);
        }
    }

    /// Removes the timer scheduled on `target` under `key`. Unknown targets
    /// and keys are ignored.
    pub fn unschedule(&self, target: NodeId, key: &str) {
        debug_assert!(!key.is_empty(), "timer keys must not be empty");

        let key = HashValue::from(key);
        let mut state = self.state.lock().unwrap();

        let empty = if let Some(bucket) = state.timers.get_mut(&target) {
            if let Some(index) = bucket.timers.iter().position(|v| v.key == key) {
                bucket.timers[index].cancel();
                bucket.timers.remove(index);
            }

            bucket.timers.is_empty()
        } else {
            false
        };

        if empty {
            state.timers.remove(&target);
        }
    }

    /// Removes the per-frame update callback of `target`, if any.
    pub fn unschedule_update(&self, target: NodeId) {
        let mut state = self.state.lock().unwrap();
        Self::remove_update_locked(&mut state, target);
    }

    /// Removes every timer and the update callback of `target`.
    pub fn unschedule_all_for_target(&self, target: NodeId) {
        let mut state = self.state.lock().unwrap();

        if let Some(bucket) = state.timers.remove(&target) {
            for slot in bucket.timers {
                slot.cancel();
            }
        }

        Self::remove_update_locked(&mut state, target);
    }

    /// Removes everything from the scheduler.
    pub fn unschedule_all(&self) {
        self.unschedule_all_with_min_priority(i32::min_value());
    }

    /// Removes every timer, plus every update callback whose priority is at
    /// least `min_priority`.
    pub fn unschedule_all_with_min_priority(&self, min_priority: i32) {
        let mut state = self.state.lock().unwrap();

        for (_, bucket) in state.timers.drain() {
            for slot in bucket.timers {
                slot.cancel();
            }
        }

        let removed: Vec<NodeId> = state
            .updates
            .iter()
            .filter(|(_, slot)| slot.priority >= min_priority)
            .map(|(target, _)| *target)
            .collect();

        for target in removed {
            Self::remove_update_locked(&mut state, target);
        }
    }

    /// Returns true if `target` owns a timer under `key`.
    pub fn is_scheduled(&self, target: NodeId, key: &str) -> bool {
        let key = HashValue::from(key);
        let state = self.state.lock().unwrap();

        state
            .timers
            .get(&target)
            .map(|bucket| bucket.timers.iter().any(|v| v.key == key))
            .unwrap_or(false)
    }

    /// Returns true if `target` has a per-frame update callback registered.
    pub fn has_update(&self, target: NodeId) -> bool {
        self.state.lock().unwrap().updates.contains_key(&target)
    }

    /// Suppresses firing for `target` without unregistering anything. Its
    /// entries keep their slots and ordering.
    pub fn pause_target(&self, target: NodeId) {
        self.set_target_paused(target, true);
    }

    /// Lifts the suppression set by `pause_target`.
    pub fn resume_target(&self, target: NodeId) {
        self.set_target_paused(target, false);
    }

    /// Returns true if `target` is currently paused.
    pub fn is_target_paused(&self, target: NodeId) -> bool {
        let state = self.state.lock().unwrap();

        if let Some(bucket) = state.timers.get(&target) {
            return bucket.paused;
        }

        state
            .updates
            .get(&target)
            .map(|slot| slot.paused.load(Ordering::Relaxed))
            .unwrap_or(false)
    }

    /// Pauses every known target, returning the affected set so the caller
    /// can later resume exactly those targets.
    pub fn pause_all_targets(&self) -> Vec<NodeId> {
        self.pause_all_targets_with_min_priority(i32::min_value())
    }

    /// Pauses every timer target, plus every update target whose priority
    /// is at least `min_priority`. Returns the affected set.
    pub fn pause_all_targets_with_min_priority(&self, min_priority: i32) -> Vec<NodeId> {
        let mut state = self.state.lock().unwrap();
        let mut affected = FastHashSet::default();

        for (target, bucket) in state.timers.iter_mut() {
            bucket.paused = true;
            affected.insert(*target);
        }

        for (target, slot) in state.updates.iter() {
            if slot.priority >= min_priority {
                slot.paused.store(true, Ordering::Relaxed);
                affected.insert(*target);
            }
        }

        affected.into_iter().collect()
    }

    /// Resumes a set of targets previously returned by one of the
    /// `pause_all_targets*` calls.
    pub fn resume_targets(&self, targets: &[NodeId]) {
        for target in targets {
            self.resume_target(*target);
        }
    }

    /// Advances the scheduler by `dt` seconds: negative-priority updates,
    /// then zero, then positive, then every armed timer. Paused targets are
    /// skipped in place. The first callback error aborts the pass.
    pub fn update(&self, dt: f32) -> Result<()> {
        let (neg, zero, pos, timers) = {
            let state = self.state.lock().unwrap();
            let timers = state
                .timers
                .iter()
                .map(|(target, bucket)| (*target, bucket.timers.clone()))
                .collect::<Vec<_>>();

            (
                state.neg.clone(),
                state.zero.clone(),
                state.pos.clone(),
                timers,
            )
        };

        for slot in neg.iter().chain(zero.iter()).chain(pos.iter()) {
            if slot.cancelled.load(Ordering::Relaxed) || slot.paused.load(Ordering::Relaxed) {
                continue;
            }

            let mut callback = slot.callback.lock().unwrap();
            (callback)(dt)?;
        }

        for (target, slots) in timers {
            let skip = {
                let state = self.state.lock().unwrap();
                match state.timers.get(&target) {
                    Some(bucket) => bucket.paused,
                    None => true,
                }
            };

            if skip {
                continue;
            }

            for slot in slots {
                self.fire_timer(target, &slot, dt)?;
            }
        }

        Ok(())
    }

    fn fire_timer(&self, target: NodeId, slot: &Arc<TimerSlot>, dt: f32) -> Result<()> {
        if slot.is_cancelled() {
            return Ok(());
        }

        let exhausted = {
            let mut timer = slot.timer.lock().unwrap();
            timer.tick(dt, slot.interval())?
        };

        if exhausted {
            trace!("[Scheduler] a timer of {} exhausted its repeat count.", target);
            self.remove_timer_slot(target, slot);
        }

        Ok(())
    }

    fn remove_timer_slot(&self, target: NodeId, slot: &Arc<TimerSlot>) {
        slot.cancel();

        let mut state = self.state.lock().unwrap();
        let empty = if let Some(bucket) = state.timers.get_mut(&target) {
            bucket.timers.retain(|v| !Arc::ptr_eq(v, slot));
            bucket.timers.is_empty()
        } else {
            false
        };

        if empty {
            state.timers.remove(&target);
        }
    }

    fn remove_update_locked(state: &mut SchedulerState, target: NodeId) {
        if let Some(slot) = state.updates.remove(&target) {
            slot.cancelled.store(true, Ordering::Relaxed);

            let list = if slot.priority < 0 {
                &mut state.neg
            } else if slot.priority == 0 {
                &mut state.zero
            } else {
                &mut state.pos
            };

            list.retain(|v| !Arc::ptr_eq(v, &slot));
        }
    }

    fn insert_sorted(list: &mut Vec<Arc<UpdateSlot>>, slot: Arc<UpdateSlot>) {
        let at = list
            .iter()
            .position(|v| v.priority > slot.priority)
            .unwrap_or_else(|| list.len());

        list.insert(at, slot);
    }

    fn set_target_paused(&self, target: NodeId, paused: bool) {
        let mut state = self.state.lock().unwrap();

        if let Some(bucket) = state.timers.get_mut(&target) {
            bucket.paused = paused;
        }

        if let Some(slot) = state.updates.get(&target) {
            slot.paused.store(paused, Ordering::Relaxed);
        }
    }
}
