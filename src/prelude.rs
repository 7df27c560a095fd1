pub use crate::errors::Result;

pub use crate::action::{Action, ActionHandle, ActionManager};
pub use crate::action::{Delay, Ease, Invoke, RepeatAction, Sequence, Tween};

pub use crate::event::{Event, EventData, EventDispatcher, EventListener};
pub use crate::event::{Key, ListenerHandle, ListenerKey, MouseButton, MouseEvent, Touch, TouchPhase};

pub use crate::math::{vec2, Vector2};
pub use crate::scene::{NodeId, SceneGraph};
pub use crate::sched::{Repeat, Scheduler, TimerParams};

pub use crate::utils::prelude::*;

pub use crate::Engine;
