//! # Cadence
//!
//! Cadence is the beating heart of a small 2D scene-graph engine: the
//! frame scheduler, the action/tween system and the event dispatcher,
//! without any rendering attached.
//!
//! ## Frame model
//!
//! Everything is single-threaded and cooperative. An external game loop
//! drives the world once per frame, calling `Scheduler::update`, then
//! `ActionManager::update`, with `EventDispatcher::dispatch_event` invoked
//! as input arrives, all on the thread owning the scene. The `Engine`
//! facade binds the three systems and the `SceneGraph` together and
//! performs that sequence for you.
//!
//! ## Re-entrancy
//!
//! Callbacks routinely reach back into the system that is firing them: a
//! timer unschedules itself, an action queues a follow-up, a listener
//! removes a sibling. All three systems share the same discipline to make
//! that safe. A pass iterates a snapshot of strong references taken at
//! its start, removals flip a flag and defer the actual drop until the
//! pass completes, and listener additions queue up until the outermost
//! dispatch ends. No pass ever observes a mutation made from inside one of
//! its own callbacks.

#[macro_use]
extern crate failure;
#[macro_use]
extern crate log;
#[macro_use]
extern crate serde;

#[macro_use]
pub mod utils;
pub mod errors;

pub mod action;
pub mod event;
pub mod math;
pub mod scene;
pub mod sched;

pub mod prelude;

mod engine;

pub use self::engine::Engine;
