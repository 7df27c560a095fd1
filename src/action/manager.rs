use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use smallvec::SmallVec;

use crate::errors::Result;
use crate::scene::NodeId;
use crate::utils::{FastHashMap, ObjectPool};

use super::Action;

impl_handle!(ActionHandle);

struct ActionSlot {
    target: NodeId,
    tag: Option<i32>,
    cancelled: AtomicBool,
    action: Mutex<Box<dyn Action>>,
}

/// All the running actions of one target, in the order they were added.
struct ActionBucket {
    paused: bool,
    actions: SmallVec<[ActionHandle; 4]>,
}

#[derive(Default)]
struct ManagerState {
    slots: ObjectPool<ActionHandle, Arc<ActionSlot>>,
    buckets: FastHashMap<NodeId, ActionBucket>,
}

/// Owns and advances every running action, grouped per target.
///
/// Removal is always safe, even from inside the removed action's own
/// `step`: the slot is flagged and kept alive by the pass's snapshot
/// reference until the enclosing `update` returns, and it never steps
/// again afterwards.
pub struct ActionManager {
    state: Mutex<ManagerState>,
}

impl Default for ActionManager {
    fn default() -> Self {
        ActionManager::new()
    }
}

impl ActionManager {
    /// Constructs a new, empty `ActionManager`.
    pub fn new() -> Self {
        ActionManager {
            state: Mutex::new(ManagerState::default()),
        }
    }

    /// Attaches `action` to `target` and immediately runs its `start` hook.
    /// If this is the first action of `target`, the target starts out with
    /// the given paused state.
    pub fn add_action(
        &self,
        target: NodeId,
        action: Box<dyn Action>,
        paused: bool,
    ) -> ActionHandle {
        self.add(target, None, action, paused)
    }

    /// Same as `add_action`, additionally tagging the action so it can be
    /// removed by tag later.
    pub fn add_action_with_tag(
        &self,
        target: NodeId,
        tag: i32,
        action: Box<dyn Action>,
        paused: bool,
    ) -> ActionHandle {
        self.add(target, Some(tag), action, paused)
    }

    /// Removes a single action. Stale handles are ignored.
    pub fn remove_action(&self, handle: ActionHandle) {
        let mut state = self.state.lock().unwrap();
        Self::remove_locked(&mut state, handle);
    }

    /// Removes the first action of `target` carrying `tag`.
    pub fn remove_action_by_tag(&self, target: NodeId, tag: i32) {
        let mut state = self.state.lock().unwrap();

        let mut found = None;
        if let Some(bucket) = state.buckets.get(&target) {
            for handle in bucket.actions.iter() {
                if let Some(slot) = state.slots.get(*handle) {
                    if slot.tag == Some(tag) {
                        found = Some(*handle);
                        break;
                    }
                }
            }
        }

        if let Some(handle) = found {
            Self::remove_locked(&mut state, handle);
        }
    }

    /// Removes every action of `target` carrying `tag`.
    pub fn remove_actions_by_tag(&self, target: NodeId, tag: i32) {
        let mut state = self.state.lock().unwrap();

        let mut found = Vec::new();
        if let Some(bucket) = state.buckets.get(&target) {
            for handle in bucket.actions.iter() {
                if let Some(slot) = state.slots.get(*handle) {
                    if slot.tag == Some(tag) {
                        found.push(*handle);
                    }
                }
            }
        }

        for handle in found {
            Self::remove_locked(&mut state, handle);
        }
    }

    /// Removes every action of `target`.
    pub fn remove_all_actions_from_target(&self, target: NodeId) {
        let mut state = self.state.lock().unwrap();

        if let Some(bucket) = state.buckets.remove(&target) {
            for handle in bucket.actions {
                if let Some(slot) = state.slots.free(handle) {
                    slot.cancelled.store(true, Ordering::Relaxed);
                }
            }
        }
    }

    /// Removes every action of every target.
    pub fn remove_all_actions(&self) {
        let mut state = self.state.lock().unwrap();

        let buckets: Vec<_> = state.buckets.drain().collect();
        for (_, bucket) in buckets {
            for handle in bucket.actions {
                if let Some(slot) = state.slots.free(handle) {
                    slot.cancelled.store(true, Ordering::Relaxed);
                }
            }
        }
    }

    /// Returns the number of actions running on `target`. A composite
    /// counts as one.
    pub fn running_actions(&self, target: NodeId) -> usize {
        let state = self.state.lock().unwrap();
        state
            .buckets
            .get(&target)
            .map(|bucket| bucket.actions.len())
            .unwrap_or(0)
    }

    /// Suppresses stepping for `target` without removing anything.
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
        state
            .buckets
            .get(&target)
            .map(|bucket| bucket.paused)
            .unwrap_or(false)
    }

    /// Pauses every target owning actions, returning the affected set so
    /// the caller can later resume exactly those targets.
    pub fn pause_all_targets(&self) -> Vec<NodeId> {
        let mut state = self.state.lock().unwrap();
        let mut affected = Vec::with_capacity(state.buckets.len());

        for (target, bucket) in state.buckets.iter_mut() {
            bucket.paused = true;
            affected.push(*target);
        }

        affected
    }

    /// Resumes a set of targets previously returned by `pause_all_targets`.
    pub fn resume_targets(&self, targets: &[NodeId]) {
        for target in targets {
            self.resume_target(*target);
        }
    }

    /// Steps every action of every non-paused target by `dt` seconds,
    /// removing the ones that report completion. The first error aborts
    /// the pass.
    pub fn update(&self, dt: f32) -> Result<()> {
        let snapshot = {
            let state = self.state.lock().unwrap();
            state
                .buckets
                .iter()
                .map(|(target, bucket)| {
                    let slots = bucket
                        .actions
                        .iter()
                        .filter_map(|handle| {
                            state.slots.get(*handle).map(|slot| (*handle, slot.clone()))
                        })
                        .collect::<Vec<_>>();

                    (*target, slots)
                })
                .collect::<Vec<_>>()
        };

        for (target, slots) in snapshot {
            let skip = {
                let state = self.state.lock().unwrap();
                match state.buckets.get(&target) {
                    Some(bucket) => bucket.paused,
                    None => true,
                }
            };

            if skip {
                continue;
            }

            for (handle, slot) in slots {
                self.step_action(handle, &slot, dt)?;
            }
        }

        Ok(())
    }

    fn step_action(&self, handle: ActionHandle, slot: &Arc<ActionSlot>, dt: f32) -> Result<()> {
        if slot.cancelled.load(Ordering::Relaxed) {
            return Ok(());
        }

        let finished = {
            let mut action = slot.action.lock().unwrap();
            action.step(dt)?;

            if slot.cancelled.load(Ordering::Relaxed) {
                // Removed from within its own step; the snapshot keeps it
                // alive until the pass completes, nothing more to do here.
                false
            } else if action.is_done() {
                action.stop();
                true
            } else {
                false
            }
        };

        if finished {
            trace!("[ActionManager] an action of {} ran to completion.", slot.target);
            self.remove_action(handle);
        }

        Ok(())
    }

    fn add(
        &self,
        target: NodeId,
        tag: Option<i32>,
        action: Box<dyn Action>,
        paused: bool,
    ) -> ActionHandle {
        let slot = Arc::new(ActionSlot {
            target,
            tag,
            cancelled: AtomicBool::new(false),
            action: Mutex::new(action),
        });

        let handle = {
            let mut state = self.state.lock().unwrap();
            let handle = state.slots.create(slot.clone());
            let bucket = state.buckets.entry(target).or_insert_with(|| ActionBucket {
                paused,
                actions: SmallVec::new(),
            });

            bucket.actions.push(handle);
            handle
        };

        // The start hook runs outside the state lock, so an action is free
        // to query or mutate the manager from `start`.
        slot.action.lock().unwrap().start(target);
        handle
    }

    fn remove_locked(state: &mut ManagerState, handle: ActionHandle) {
        if let Some(slot) = state.slots.free(handle) {
            slot.cancelled.store(true, Ordering::Relaxed);

            let empty = if let Some(bucket) = state.buckets.get_mut(&slot.target) {
                bucket.actions.retain(|v| *v != handle);
                bucket.actions.is_empty()
            } else {
                false
            };

            if empty {
                state.buckets.remove(&slot.target);
            }
        }
    }

    fn set_target_paused(&self, target: NodeId, paused: bool) {
        let mut state = self.state.lock().unwrap();

        if let Some(bucket) = state.buckets.get_mut(&target) {
            bucket.paused = paused;
        }
    }
}
