//! Actions: polymorphic units of change applied to a target over time.
//!
//! An action is handed to the `ActionManager` and advanced once per frame
//! until it reports completion. Composites (`Sequence`, `RepeatAction`)
//! wrap other actions and count as a single running action on their target.

pub mod basic;
pub mod tween;

mod manager;

pub use self::basic::{Delay, Invoke, RepeatAction, Sequence};
pub use self::manager::{ActionHandle, ActionManager};
pub use self::tween::{Ease, Tween};

pub mod prelude {
    pub use super::{Action, ActionHandle, ActionManager};
    pub use super::{Delay, Ease, Invoke, RepeatAction, Sequence, Tween};
}

use crate::errors::Result;
use crate::scene::NodeId;

/// A polymorphic unit of change applied to a target over time, either
/// instantaneous or of finite duration.
///
/// The lifecycle is a fixed state machine: `start` fires exactly once when
/// the action is attached to its target, `step` once per frame afterwards,
/// and once `is_done` reports true the owning manager calls `stop` and
/// removes the action. Restartable actions reset themselves in `start`, so
/// composites like `RepeatAction` can run them again.
pub trait Action: 'static {
    /// Called once when the action is attached to its target.
    fn start(&mut self, target: NodeId);

    /// Advances the action by `dt` seconds.
    fn step(&mut self, dt: f32) -> Result<()>;

    /// Returns true once the action has run to completion.
    fn is_done(&self) -> bool;

    /// Called right before the action is removed from its manager, whether
    /// it completed or was removed explicitly.
    fn stop(&mut self) {}
}
