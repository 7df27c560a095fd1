use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use smallvec::SmallVec;

use crate::errors::Result;
use crate::scene::{NodeId, SceneGraph};
use crate::utils::{FastHashMap, HashValue, ObjectPool};

use super::events::{Event, EventData, Touch, TouchPhase};
use super::listener::{EventListener, ListenerCallbacks, ListenerKey};

impl_handle!(ListenerHandle);

#[derive(Debug, Clone, Copy)]
enum Priority {
    Fixed(i32),
    SceneGraph(NodeId),
}

struct ListenerSlot {
    key: ListenerKey,
    priority: Priority,
    swallow: bool,
    enabled: AtomicBool,
    paused: AtomicBool,
    registered: AtomicBool,
    claimed: Mutex<SmallVec<[u8; 4]>>,
    callbacks: Mutex<ListenerCallbacks>,
}

impl ListenerSlot {
    fn is_active(&self) -> bool {
        self.registered.load(Ordering::Relaxed)
            && self.enabled.load(Ordering::Relaxed)
            && !self.paused.load(Ordering::Relaxed)
    }

    fn node(&self) -> Option<NodeId> {
        match self.priority {
            Priority::SceneGraph(v) => Some(v),
            Priority::Fixed(_) => None,
        }
    }

    fn fixed_priority(&self) -> i32 {
        match self.priority {
            Priority::Fixed(v) => v,
            Priority::SceneGraph(_) => 0,
        }
    }

    fn claims(&self, id: u8) -> bool {
        self.claimed.lock().unwrap().contains(&id)
    }

    fn claim(&self, id: u8) {
        self.claimed.lock().unwrap().push(id);
    }

    fn release(&self, id: u8) {
        self.claimed.lock().unwrap().retain(|v| *v != id);
    }
}

/// Listeners of one key, split by priority kind. Both sublists are sorted
/// lazily: mutations only raise a dirty flag, and the next dispatch that
/// needs the group purges unregistered slots and re-sorts.
#[derive(Default)]
struct ListenerGroup {
    /// Sorted ascending by fixed priority.
    fixed: Vec<Arc<ListenerSlot>>,
    /// Sorted by derived node priority, the topmost node first.
    scene: Vec<Arc<ListenerSlot>>,
    fixed_dirty: bool,
    scene_dirty: bool,
}

#[derive(Debug, Clone, Copy)]
enum DispatchPhase {
    Idle,
    Dispatching { depth: u32 },
}

impl Default for DispatchPhase {
    fn default() -> Self {
        DispatchPhase::Idle
    }
}

#[derive(Default)]
struct DispatcherState {
    slots: ObjectPool<ListenerHandle, Arc<ListenerSlot>>,
    groups: FastHashMap<ListenerKey, ListenerGroup>,
    node_listeners: FastHashMap<NodeId, SmallVec<[ListenerHandle; 4]>>,
    pending: Vec<Arc<ListenerSlot>>,
    phase: DispatchPhase,
}

/// Maintains every registered event listener, caches their dispatch order
/// and delivers events in priority order with early-stop support.
///
/// Dispatch order within a listener key is always: fixed listeners with a
/// negative priority (ascending), scene-graph listeners (topmost node
/// first), fixed listeners with a positive priority (ascending). The first
/// listener to call `Event::stop_propagation` wins.
///
/// A dispatch pass never observes listener-set mutations made from inside
/// its own callbacks: additions are queued until the outermost dispatch
/// ends, removals flip the registered flag immediately (the listener will
/// not fire again) while the pass's own strong reference keeps the removed
/// slot alive until it completes.
pub struct EventDispatcher {
    state: Mutex<DispatcherState>,
}

impl Default for EventDispatcher {
    fn default() -> Self {
        EventDispatcher::new()
    }
}

impl EventDispatcher {
    /// Constructs a new, empty `EventDispatcher`.
    pub fn new() -> Self {
        EventDispatcher {
            state: Mutex::new(DispatcherState::default()),
        }
    }

    /// Registers `listener` with a priority derived from the render order
    /// of `node` in the running scene. Nodes drawn later (on top) hear
    /// events earlier.
    pub fn add_listener_with_scene_graph_priority(
        &self,
        listener: EventListener,
        node: NodeId,
    ) -> ListenerHandle {
        self.add(listener, Priority::SceneGraph(node))
    }

    /// Registers `listener` with an externally assigned priority. Negative
    /// priorities fire before every scene-graph listener, positive ones
    /// after; zero is reserved.
    pub fn add_listener_with_fixed_priority(
        &self,
        listener: EventListener,
        priority: i32,
    ) -> ListenerHandle {
        debug_assert!(
            priority != 0,
            "fixed priority 0 is reserved for scene-graph listeners"
        );

        self.add(listener, Priority::Fixed(priority))
    }

    /// Unregisters a single listener. Stale handles are ignored.
    pub fn remove_listener(&self, handle: ListenerHandle) {
        let mut state = self.state.lock().unwrap();
        Self::remove_locked(&mut state, handle);
    }

    /// Unregisters every scene-graph listener associated with `node`.
    pub fn remove_listeners_for_target(&self, node: NodeId) {
        let mut state = self.state.lock().unwrap();

        let handles: Vec<ListenerHandle> = state
            .node_listeners
            .get(&node)
            .map(|v| v.iter().cloned().collect())
            .unwrap_or_default();

        for handle in handles {
            Self::remove_locked(&mut state, handle);
        }
    }

    /// Unregisters every listener of one listener key, e.g. every keyboard
    /// listener at once.
    pub fn remove_listeners_by_key(&self, key: ListenerKey) {
        let mut state = self.state.lock().unwrap();

        let handles: Vec<ListenerHandle> = state
            .slots
            .iter()
            .filter(|(_, slot)| slot.key == key)
            .map(|(handle, _)| handle)
            .collect();

        for handle in handles {
            Self::remove_locked(&mut state, handle);
        }
    }

    /// Unregisters every listener of the custom event `name`.
    pub fn remove_custom_listeners(&self, name: &str) {
        self.remove_listeners_by_key(ListenerKey::Custom(HashValue::from(name)));
    }

    /// Unregisters everything.
    pub fn remove_all_listeners(&self) {
        let mut state = self.state.lock().unwrap();

        let handles: Vec<ListenerHandle> = state.slots.handles().collect();
        for handle in handles {
            Self::remove_locked(&mut state, handle);
        }
    }

    /// Enables or disables a listener without unregistering it.
    pub fn set_enabled(&self, handle: ListenerHandle, enabled: bool) {
        let state = self.state.lock().unwrap();

        if let Some(slot) = state.slots.get(handle) {
            slot.enabled.store(enabled, Ordering::Relaxed);
        }
    }

    /// Returns true if the listener is registered and enabled.
    pub fn is_enabled(&self, handle: ListenerHandle) -> bool {
        let state = self.state.lock().unwrap();

        state
            .slots
            .get(handle)
            .map(|slot| slot.enabled.load(Ordering::Relaxed))
            .unwrap_or(false)
    }

    /// Suppresses the scene-graph listeners of `node` without
    /// unregistering them.
    pub fn pause_target(&self, node: NodeId) {
        self.set_target_paused(node, true);
    }

    /// Lifts the suppression set by `pause_target`.
    pub fn resume_target(&self, node: NodeId) {
        self.set_target_paused(node, false);
    }

    /// Invalidates the cached scene-graph dispatch order after a z-order
    /// change. The invalidation is deliberately coarse; every group
    /// re-sorts lazily on its next dispatch.
    pub fn set_dirty_for_node(&self, _node: NodeId) {
        let mut state = self.state.lock().unwrap();

        for group in state.groups.values_mut() {
            group.scene_dirty = true;
        }
    }

    /// Returns the number of registered listeners.
    pub fn len(&self) -> usize {
        self.state.lock().unwrap().slots.len()
    }

    /// Returns true if no listener is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Delivers `event` to the interested listeners in priority order,
    /// stopping as soon as one of them stops the propagation. Touch events
    /// are routed through `dispatch_touch`.
    pub fn dispatch_event(&self, scene: &SceneGraph, event: &mut Event) -> Result<()> {
        let key = match *event.data() {
            EventData::Touch { phase, ref touches } => {
                let touches = touches.clone();
                return self.dispatch_touch(scene, phase, &touches);
            }
            EventData::Keyboard { .. } => ListenerKey::Keyboard,
            EventData::Mouse(_) => ListenerKey::Mouse,
            EventData::Custom { ref name } => ListenerKey::Custom(HashValue::from(&**name)),
        };

        let snapshot = self.sorted_snapshot(scene, key);
        if snapshot.is_empty() {
            return Ok(());
        }

        let _guard = self.enter_dispatch();

        for slot in &snapshot {
            if !slot.is_active() {
                continue;
            }

            event.set_current_target(slot.node());

            {
                // A listener already running further up the stack (a nested
                // dispatch of its own event) is skipped, not re-entered.
                let mut callbacks = match slot.callbacks.try_lock() {
                    Ok(v) => v,
                    Err(_) => continue,
                };

                if let ListenerCallbacks::Event(ref mut callback) = *callbacks {
                    callback(event)?;
                }
            }

            if event.is_stopped() {
                break;
            }
        }

        event.set_current_target(None);
        Ok(())
    }

    /// Convenience shortcut dispatching a custom event under `name`.
    pub fn dispatch_custom(&self, scene: &SceneGraph, name: &str) -> Result<()> {
        let mut event = Event::custom(name);
        self.dispatch_event(scene, &mut event)
    }

    /// Delivers one phase of a touch gesture.
    ///
    /// Every original touch walks the one-by-one listeners in priority
    /// order. A listener claims a touch by returning true from its began
    /// callback and keeps receiving the later phases of that touch until
    /// it ends or is cancelled. Once a swallowing listener claims a touch,
    /// the touch disappears from the set observed by lower-priority and
    /// all-at-once listeners.
    pub fn dispatch_touch(
        &self,
        scene: &SceneGraph,
        phase: TouchPhase,
        touches: &[Touch],
    ) -> Result<()> {
        let one_by_one = self.sorted_snapshot(scene, ListenerKey::TouchOneByOne);
        let all_at_once = self.sorted_snapshot(scene, ListenerKey::TouchAllAtOnce);

        if one_by_one.is_empty() && all_at_once.is_empty() {
            return Ok(());
        }

        let _guard = self.enter_dispatch();

        let mut event = Event::touch(phase, touches);
        let mut mutable: SmallVec<[Touch; 4]> = touches.iter().cloned().collect();

        'touches: for touch in touches {
            for slot in &one_by_one {
                // A swallowed touch is invisible from this point on.
                if !mutable.iter().any(|v| v.id == touch.id) {
                    break;
                }

                if !slot.is_active() {
                    continue;
                }

                event.set_current_target(slot.node());

                match phase {
                    TouchPhase::Began => {
                        let claimed = {
                            let mut callbacks = match slot.callbacks.try_lock() {
                                Ok(v) => v,
                                Err(_) => continue,
                            };

                            if let ListenerCallbacks::TouchOneByOne { ref mut began, .. } =
                                *callbacks
                            {
                                began(touch, &mut event)?
                            } else {
                                false
                            }
                        };

                        if claimed && slot.registered.load(Ordering::Relaxed) {
                            slot.claim(touch.id);

                            if slot.swallow {
                                mutable.retain(|v| v.id != touch.id);
                            }
                        }
                    }
                    TouchPhase::Moved => {
                        if slot.claims(touch.id) {
                            {
                                let mut callbacks = match slot.callbacks.try_lock() {
                                    Ok(v) => v,
                                    Err(_) => continue,
                                };

                                if let ListenerCallbacks::TouchOneByOne { ref mut moved, .. } =
                                    *callbacks
                                {
                                    if let Some(ref mut moved) = *moved {
                                        moved(touch, &mut event)?;
                                    }
                                }
                            }

                            if slot.swallow {
                                mutable.retain(|v| v.id != touch.id);
                            }
                        }
                    }
                    TouchPhase::Ended | TouchPhase::Cancelled => {
                        if slot.claims(touch.id) {
                            {
                                let mut callbacks = match slot.callbacks.try_lock() {
                                    Ok(v) => v,
                                    Err(_) => continue,
                                };

                                if let ListenerCallbacks::TouchOneByOne {
                                    ref mut ended,
                                    ref mut cancelled,
                                    ..
                                } = *callbacks
                                {
                                    let callback = if phase == TouchPhase::Ended {
                                        ended
                                    } else {
                                        cancelled
                                    };

                                    if let Some(ref mut callback) = *callback {
                                        callback(touch, &mut event)?;
                                    }
                                }
                            }

                            slot.release(touch.id);

                            if slot.swallow {
                                mutable.retain(|v| v.id != touch.id);
                            }
                        }
                    }
                }

                if event.is_stopped() {
                    break 'touches;
                }
            }
        }

        if !all_at_once.is_empty() && !mutable.is_empty() && !event.is_stopped() {
            for slot in &all_at_once {
                if !slot.is_active() {
                    continue;
                }

                event.set_current_target(slot.node());

                {
                    let mut callbacks = match slot.callbacks.try_lock() {
                        Ok(v) => v,
                        Err(_) => continue,
                    };

                    if let ListenerCallbacks::TouchAllAtOnce {
                        ref mut began,
                        ref mut moved,
                        ref mut ended,
                        ref mut cancelled,
                    } = *callbacks
                    {
                        let callback = match phase {
                            TouchPhase::Began => began,
                            TouchPhase::Moved => moved,
                            TouchPhase::Ended => ended,
                            TouchPhase::Cancelled => cancelled,
                        };

                        if let Some(ref mut callback) = *callback {
                            callback(&mutable, &mut event)?;
                        }
                    }
                }

                if event.is_stopped() {
                    break;
                }
            }
        }

        Ok(())
    }

    fn add(&self, listener: EventListener, priority: Priority) -> ListenerHandle {
        let slot = Arc::new(ListenerSlot {
            key: listener.key,
            priority,
            swallow: listener.swallow,
            enabled: AtomicBool::new(true),
            paused: AtomicBool::new(false),
            registered: AtomicBool::new(true),
            claimed: Mutex::new(SmallVec::new()),
            callbacks: Mutex::new(listener.callbacks),
        });

        let mut state = self.state.lock().unwrap();
        let handle = state.slots.create(slot.clone());

        if let Priority::SceneGraph(node) = priority {
            state
                .node_listeners
                .entry(node)
                .or_insert_with(SmallVec::new)
                .push(handle);
        }

        match state.phase {
            DispatchPhase::Idle => Self::insert_locked(&mut state, slot),
            DispatchPhase::Dispatching { .. } => {
                trace!("[EventDispatcher] queueing a listener added mid-dispatch.");
                state.pending.push(slot);
            }
        }

        handle
    }

    fn insert_locked(state: &mut DispatcherState, slot: Arc<ListenerSlot>) {
        let group = state
            .groups
            .entry(slot.key)
            .or_insert_with(ListenerGroup::default);

        match slot.priority {
            Priority::Fixed(_) => {
                group.fixed.push(slot);
                group.fixed_dirty = true;
            }
            Priority::SceneGraph(_) => {
                group.scene.push(slot);
                group.scene_dirty = true;
            }
        }
    }

    fn remove_locked(state: &mut DispatcherState, handle: ListenerHandle) {
        if let Some(slot) = state.slots.free(handle) {
            slot.registered.store(false, Ordering::Relaxed);

            if let Priority::SceneGraph(node) = slot.priority {
                let empty = if let Some(handles) = state.node_listeners.get_mut(&node) {
                    handles.retain(|v| *v != handle);
                    handles.is_empty()
                } else {
                    false
                };

                if empty {
                    state.node_listeners.remove(&node);
                }
            }

            // Structural erasure from the sorted vectors is deferred; the
            // next sort of the group purges unregistered slots.
            if let Some(group) = state.groups.get_mut(&slot.key) {
                group.fixed_dirty = true;
                group.scene_dirty = true;
            }
        }
    }

    /// Builds the firing order for `key`, re-sorting lazily if the group
    /// went dirty since the last dispatch.
    fn sorted_snapshot(&self, scene: &SceneGraph, key: ListenerKey) -> Vec<Arc<ListenerSlot>> {
        let mut state = self.state.lock().unwrap();

        let needs_scene_sort = state
            .groups
            .get(&key)
            .map(|group| group.scene_dirty)
            .unwrap_or(false);

        let priorities = if needs_scene_sort {
            Some(Self::node_priorities(scene, &state.node_listeners))
        } else {
            None
        };

        let group = match state.groups.get_mut(&key) {
            Some(group) => group,
            None => return Vec::new(),
        };

        if let Some(priorities) = priorities {
            group.scene.retain(|v| v.registered.load(Ordering::Relaxed));
            group.scene.sort_by_key(|slot| {
                let priority = slot
                    .node()
                    .and_then(|node| priorities.get(&node).cloned())
                    .unwrap_or(0);

                ::std::cmp::Reverse(priority)
            });
            group.scene_dirty = false;
        }

        if group.fixed_dirty {
            group.fixed.retain(|v| v.registered.load(Ordering::Relaxed));
            group.fixed.sort_by_key(|slot| slot.fixed_priority());
            group.fixed_dirty = false;
        }

        let split = group
            .fixed
            .iter()
            .position(|v| v.fixed_priority() >= 0)
            .unwrap_or_else(|| group.fixed.len());

        let mut snapshot = Vec::with_capacity(group.fixed.len() + group.scene.len());
        snapshot.extend(group.fixed[..split].iter().cloned());
        snapshot.extend(group.scene.iter().cloned());
        snapshot.extend(group.fixed[split..].iter().cloned());
        snapshot
    }

    /// Walks the scene in render order and assigns every node owning at
    /// least one listener a strictly increasing priority index. Nodes are
    /// grouped by global z first; within a group the render order decides.
    fn node_priorities(
        scene: &SceneGraph,
        node_listeners: &FastHashMap<NodeId, SmallVec<[ListenerHandle; 4]>>,
    ) -> FastHashMap<NodeId, i32> {
        let mut order = Vec::new();
        scene.visit(&mut |id| {
            if node_listeners.contains_key(&id) {
                order.push(id);
            }
        });

        order.sort_by(|a, b| {
            scene
                .global_z(*a)
                .partial_cmp(&scene.global_z(*b))
                .unwrap_or(::std::cmp::Ordering::Equal)
        });

        let mut priorities = FastHashMap::default();
        for (index, id) in order.iter().enumerate() {
            priorities.insert(*id, index as i32 + 1);
        }

        priorities
    }

    fn enter_dispatch(&self) -> DispatchGuard {
        let mut state = self.state.lock().unwrap();

        state.phase = match state.phase {
            DispatchPhase::Idle => DispatchPhase::Dispatching { depth: 1 },
            DispatchPhase::Dispatching { depth } => DispatchPhase::Dispatching { depth: depth + 1 },
        };

        DispatchGuard { owner: self }
    }

    fn set_target_paused(&self, node: NodeId, paused: bool) {
        let state = self.state.lock().unwrap();

        if let Some(handles) = state.node_listeners.get(&node) {
            for handle in handles {
                if let Some(slot) = state.slots.get(*handle) {
                    slot.paused.store(paused, Ordering::Relaxed);
                }
            }
        }
    }
}

/// Tracks one dispatch pass; queued listener additions are flushed when the
/// outermost pass ends, errors included.
struct DispatchGuard<'a> {
    owner: &'a EventDispatcher,
}

impl<'a> Drop for DispatchGuard<'a> {
    fn drop(&mut self) {
        let mut state = self.owner.state.lock().unwrap();

        let finished = match state.phase {
            DispatchPhase::Dispatching { depth } if depth > 1 => {
                state.phase = DispatchPhase::Dispatching { depth: depth - 1 };
                false
            }
            _ => {
                state.phase = DispatchPhase::Idle;
                true
            }
        };

        if finished {
            let pending: Vec<_> = state.pending.drain(..).collect();
            for slot in pending {
                if slot.registered.load(Ordering::Relaxed) {
                    EventDispatcher::insert_locked(&mut state, slot);
                }
            }
        }
    }
}
