use std::sync::Arc;

use crate::action::{Action, ActionHandle, ActionManager};
use crate::errors::Result;
use crate::event::{Event, EventDispatcher, Touch, TouchPhase};
use crate::scene::{NodeId, SceneGraph};
use crate::sched::Scheduler;

/// Binds the scene graph and the three frame-driven systems in one place.
///
/// The systems are `Arc`-shared so user callbacks can hold their own
/// references and re-enter them while a pass is running, whether to
/// unschedule themselves, queue follow-up actions or register listeners.
///
/// A typical game loop calls `advance(dt)` once per frame and routes input
/// through the `dispatch*` methods as it arrives.
pub struct Engine {
    scene: SceneGraph,
    scheduler: Arc<Scheduler>,
    actions: Arc<ActionManager>,
    events: Arc<EventDispatcher>,
}

impl Default for Engine {
    fn default() -> Self {
        Engine::new()
    }
}

impl Engine {
    /// Constructs a new `Engine` with an empty scene.
    pub fn new() -> Self {
        Engine {
            scene: SceneGraph::new(),
            scheduler: Arc::new(Scheduler::new()),
            actions: Arc::new(ActionManager::new()),
            events: Arc::new(EventDispatcher::new()),
        }
    }

    /// Returns the scene graph.
    #[inline]
    pub fn scene(&self) -> &SceneGraph {
        &self.scene
    }

    /// Returns the scene graph mutably. Prefer the engine's z-order setters
    /// for z changes, which keep the event dispatch order in sync.
    #[inline]
    pub fn scene_mut(&mut self) -> &mut SceneGraph {
        &mut self.scene
    }

    /// Returns the scheduler.
    #[inline]
    pub fn scheduler(&self) -> &Arc<Scheduler> {
        &self.scheduler
    }

    /// Returns the action manager.
    #[inline]
    pub fn actions(&self) -> &Arc<ActionManager> {
        &self.actions
    }

    /// Returns the event dispatcher.
    #[inline]
    pub fn events(&self) -> &Arc<EventDispatcher> {
        &self.events
    }

    /// Advances one frame: per-frame updates and timers first, then the
    /// running actions.
    pub fn advance(&mut self, dt: f32) -> Result<()> {
        self.scheduler.update(dt)?;
        self.actions.update(dt)
    }

    /// Delivers `event` through the dispatcher against the current scene.
    pub fn dispatch(&mut self, event: &mut Event) -> Result<()> {
        self.events.dispatch_event(&self.scene, event)
    }

    /// Delivers one phase of a touch gesture.
    pub fn dispatch_touch(&mut self, phase: TouchPhase, touches: &[Touch]) -> Result<()> {
        self.events.dispatch_touch(&self.scene, phase, touches)
    }

    /// Delivers a custom event under `name`.
    pub fn dispatch_custom(&mut self, name: &str) -> Result<()> {
        self.events.dispatch_custom(&self.scene, name)
    }

    /// Creates a detached node usable as a scheduling target or as a scene
    /// element.
    pub fn create_node(&mut self) -> NodeId {
        self.scene.create_node()
    }

    /// Attaches `action` to `target` and starts it immediately.
    pub fn run_action(&mut self, target: NodeId, action: Box<dyn Action>) -> ActionHandle {
        self.actions.add_action(target, action, false)
    }

    /// Sets the z-order of `node` relative to its siblings and invalidates
    /// the cached event dispatch order.
    pub fn set_local_z(&mut self, node: NodeId, z: i32) {
        self.scene.set_local_z(node, z);
        self.events.set_dirty_for_node(node);
    }

    /// Sets the z-order of `node` across the whole scene and invalidates
    /// the cached event dispatch order.
    pub fn set_global_z(&mut self, node: NodeId, z: f32) {
        self.scene.set_global_z(node, z);
        self.events.set_dirty_for_node(node);
    }

    /// Suspends timers, update callbacks, actions and listeners of `node`.
    pub fn pause_node(&mut self, node: NodeId) {
        self.scheduler.pause_target(node);
        self.actions.pause_target(node);
        self.events.pause_target(node);
    }

    /// Resumes everything suspended by `pause_node`.
    pub fn resume_node(&mut self, node: NodeId) {
        self.scheduler.resume_target(node);
        self.actions.resume_target(node);
        self.events.resume_target(node);
    }

    /// Destroys `node` and its subtree, tearing every freed node out of the
    /// scheduler, the action manager and the event dispatcher.
    pub fn destroy_node(&mut self, node: NodeId) {
        for freed in self.scene.destroy_node(node) {
            self.scheduler.unschedule_all_for_target(freed);
            self.actions.remove_all_actions_from_target(freed);
            self.events.remove_listeners_for_target(freed);
        }
    }
}
