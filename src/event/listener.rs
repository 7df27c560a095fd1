use crate::errors::Result;
use crate::utils::HashValue;

use super::events::{Event, Touch};

/// Identifies the group of listeners an event is delivered to: one group
/// per built-in event class, plus one per custom event name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListenerKey {
    Keyboard,
    Mouse,
    TouchOneByOne,
    TouchAllAtOnce,
    Custom(HashValue<str>),
}

pub(crate) type EventCallback = Box<dyn FnMut(&mut Event) -> Result<()>>;
pub(crate) type TouchBeganCallback = Box<dyn FnMut(&Touch, &mut Event) -> Result<bool>>;
pub(crate) type TouchCallback = Box<dyn FnMut(&Touch, &mut Event) -> Result<()>>;
pub(crate) type TouchesCallback = Box<dyn FnMut(&[Touch], &mut Event) -> Result<()>>;

pub(crate) enum ListenerCallbacks {
    Event(EventCallback),
    TouchOneByOne {
        began: TouchBeganCallback,
        moved: Option<TouchCallback>,
        ended: Option<TouchCallback>,
        cancelled: Option<TouchCallback>,
    },
    TouchAllAtOnce {
        began: Option<TouchesCallback>,
        moved: Option<TouchesCallback>,
        ended: Option<TouchesCallback>,
        cancelled: Option<TouchesCallback>,
    },
}

/// A registered interest in one class of events, built with one of the
/// per-class constructors and handed to the `EventDispatcher` with either
/// a fixed or a scene-graph priority.
pub struct EventListener {
    pub(crate) key: ListenerKey,
    pub(crate) callbacks: ListenerCallbacks,
    pub(crate) swallow: bool,
}

impl EventListener {
    /// A listener receiving every keyboard event.
    pub fn keyboard<F>(callback: F) -> Self
    where
        F: FnMut(&mut Event) -> Result<()> + 'static,
    {
        EventListener {
            key: ListenerKey::Keyboard,
            callbacks: ListenerCallbacks::Event(Box::new(callback)),
            swallow: false,
        }
    }

    /// A listener receiving every mouse event.
    pub fn mouse<F>(callback: F) -> Self
    where
        F: FnMut(&mut Event) -> Result<()> + 'static,
    {
        EventListener {
            key: ListenerKey::Mouse,
            callbacks: ListenerCallbacks::Event(Box::new(callback)),
            swallow: false,
        }
    }

    /// A listener receiving custom events dispatched under `name`.
    pub fn custom<N, F>(name: N, callback: F) -> Self
    where
        N: AsRef<str>,
        F: FnMut(&mut Event) -> Result<()> + 'static,
    {
        EventListener {
            key: ListenerKey::Custom(HashValue::from(name.as_ref())),
            callbacks: ListenerCallbacks::Event(Box::new(callback)),
            swallow: false,
        }
    }

    /// A listener negotiating individual touches. `began` is consulted for
    /// every new touch; returning true claims the touch, and the listener
    /// then receives the moved/ended/cancelled phases of that touch until
    /// it is released.
    pub fn touch_one_by_one<F>(began: F) -> Self
    where
        F: FnMut(&Touch, &mut Event) -> Result<bool> + 'static,
    {
        EventListener {
            key: ListenerKey::TouchOneByOne,
            callbacks: ListenerCallbacks::TouchOneByOne {
                began: Box::new(began),
                moved: None,
                ended: None,
                cancelled: None,
            },
            swallow: false,
        }
    }

    /// A listener receiving the touches of each phase in one batch, after
    /// the one-by-one listeners had their turn.
    pub fn touch_all_at_once() -> Self {
        EventListener {
            key: ListenerKey::TouchAllAtOnce,
            callbacks: ListenerCallbacks::TouchAllAtOnce {
                began: None,
                moved: None,
                ended: None,
                cancelled: None,
            },
            swallow: false,
        }
    }

    /// Claimed touches are removed from the set observed by lower-priority
    /// and all-at-once listeners. Only meaningful on one-by-one listeners.
    pub fn swallow_touches(mut self) -> Self {
        debug_assert!(
            self.key == ListenerKey::TouchOneByOne,
            "only one-by-one touch listeners could swallow touches"
        );

        self.swallow = true;
        self
    }

    /// Installs the moved-phase callback of a one-by-one listener.
    pub fn on_touch_moved<F>(mut self, callback: F) -> Self
    where
        F: FnMut(&Touch, &mut Event) -> Result<()> + 'static,
    {
        match self.callbacks {
            ListenerCallbacks::TouchOneByOne { ref mut moved, .. } => {
                *moved = Some(Box::new(callback));
            }
            _ => debug_assert!(false, "not a one-by-one touch listener"),
        }

        self
    }

    /// Installs the ended-phase callback of a one-by-one listener.
    pub fn on_touch_ended<F>(mut self, callback: F) -> Self
    where
        F: FnMut(&Touch, &mut Event) -> Result<()> + 'static,
    {
        match self.callbacks {
            ListenerCallbacks::TouchOneByOne { ref mut ended, .. } => {
                *ended = Some(Box::new(callback));
            }
            _ => debug_assert!(false, "not a one-by-one touch listener"),
        }

        self
    }

    /// Installs the cancelled-phase callback of a one-by-one listener.
    pub fn on_touch_cancelled<F>(mut self, callback: F) -> Self
    where
        F: FnMut(&Touch, &mut Event) -> Result<()> + 'static,
    {
        match self.callbacks {
            ListenerCallbacks::TouchOneByOne { ref mut cancelled, .. } => {
                *cancelled = Some(Box::new(callback));
            }
            _ => debug_assert!(false, "not a one-by-one touch listener"),
        }

        self
    }

    /// Installs the began-phase callback of an all-at-once listener.
    pub fn on_touches_began<F>(mut self, callback: F) -> Self
    where
        F: FnMut(&[Touch], &mut Event) -> Result<()> + 'static,
    {
        match self.callbacks {
            ListenerCallbacks::TouchAllAtOnce { ref mut began, .. } => {
                *began = Some(Box::new(callback));
            }
            _ => debug_assert!(false, "not an all-at-once touch listener"),
        }

        self
    }

    /// Installs the moved-phase callback of an all-at-once listener.
    pub fn on_touches_moved<F>(mut self, callback: F) -> Self
    where
        F: FnMut(&[Touch], &mut Event) -> Result<()> + 'static,
    {
        match self.callbacks {
            ListenerCallbacks::TouchAllAtOnce { ref mut moved, .. } => {
                *moved = Some(Box::new(callback));
            }
            _ => debug_assert!(false, "not an all-at-once touch listener"),
        }

        self
    }

    /// Installs the ended-phase callback of an all-at-once listener.
    pub fn on_touches_ended<F>(mut self, callback: F) -> Self
    where
        F: FnMut(&[Touch], &mut Event) -> Result<()> + 'static,
    {
        match self.callbacks {
            ListenerCallbacks::TouchAllAtOnce { ref mut ended, .. } => {
                *ended = Some(Box::new(callback));
            }
            _ => debug_assert!(false, "not an all-at-once touch listener"),
        }

        self
    }

    /// Installs the cancelled-phase callback of an all-at-once listener.
    pub fn on_touches_cancelled<F>(mut self, callback: F) -> Self
    where
        F: FnMut(&[Touch], &mut Event) -> Result<()> + 'static,
    {
        match self.callbacks {
            ListenerCallbacks::TouchAllAtOnce { ref mut cancelled, .. } => {
                *cancelled = Some(Box::new(callback));
            }
            _ => debug_assert!(false, "not an all-at-once touch listener"),
        }

        self
    }
}
