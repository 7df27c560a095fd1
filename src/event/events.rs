use cgmath::Vector2;
use inlinable_string::InlinableString;
use smallvec::SmallVec;

use crate::scene::NodeId;

/// Symbolic name for a keyboard key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    Key0,
    Key1,
    Key2,
    Key3,
    Key4,
    Key5,
    Key6,
    Key7,
    Key8,
    Key9,

    A,
    B,
    C,
    D,
    E,
    F,
    G,
    H,
    I,
    J,
    K,
    L,
    M,
    N,
    O,
    P,
    Q,
    R,
    S,
    T,
    U,
    V,
    W,
    X,
    Y,
    Z,

    Escape,
    Return,
    Space,
    Tab,
    /// The Backspace key, right over Enter.
    Back,

    Left,
    Up,
    Right,
    Down,

    LShift,
    RShift,
    LControl,
    RControl,
    LAlt,
    RAlt,
}

/// Symbolic name for a mouse button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    Other(u8),
}

/// The enumerations of events that come from the mouse.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum MouseEvent {
    Moved {
        position: Vector2<f32>,
    },
    Pressed {
        button: MouseButton,
        position: Vector2<f32>,
    },
    Released {
        button: MouseButton,
        position: Vector2<f32>,
    },
    Wheel {
        delta: Vector2<f32>,
    },
}

/// The phase of a touch gesture being dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TouchPhase {
    Began,
    Moved,
    Ended,
    Cancelled,
}

/// A single touch point, tracked by id across the phases of a gesture.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Touch {
    pub id: u8,
    pub location: Vector2<f32>,
    pub previous_location: Vector2<f32>,
}

impl Touch {
    pub fn new(id: u8, location: Vector2<f32>) -> Self {
        Touch {
            id,
            location,
            previous_location: location,
        }
    }

    /// Returns how far the touch travelled since the previous phase.
    #[inline]
    pub fn delta(&self) -> Vector2<f32> {
        self.location - self.previous_location
    }
}

/// The payload of a dispatched event.
///
/// Custom events carry a name only; any associated data travels in the
/// closures of the listeners interested in it.
#[derive(Debug, Clone)]
pub enum EventData {
    Keyboard {
        key: Key,
        pressed: bool,
    },
    Mouse(MouseEvent),
    Touch {
        phase: TouchPhase,
        touches: SmallVec<[Touch; 4]>,
    },
    Custom {
        name: InlinableString,
    },
}

/// An event travelling through the dispatcher. Any listener may stop the
/// remaining propagation with `stop_propagation`.
#[derive(Debug)]
pub struct Event {
    data: EventData,
    stopped: bool,
    current_target: Option<NodeId>,
}

impl Event {
    /// Constructs a new `Event` from its payload.
    pub fn new(data: EventData) -> Self {
        Event {
            data,
            stopped: false,
            current_target: None,
        }
    }

    /// Constructs a keyboard event.
    pub fn keyboard(key: Key, pressed: bool) -> Self {
        Event::new(EventData::Keyboard { key, pressed })
    }

    /// Constructs a mouse event.
    pub fn mouse(v: MouseEvent) -> Self {
        Event::new(EventData::Mouse(v))
    }

    /// Constructs a touch event.
    pub fn touch(phase: TouchPhase, touches: &[Touch]) -> Self {
        Event::new(EventData::Touch {
            phase,
            touches: touches.iter().cloned().collect(),
        })
    }

    /// Constructs a custom event from its name.
    pub fn custom<T: Into<InlinableString>>(name: T) -> Self {
        Event::new(EventData::Custom { name: name.into() })
    }

    /// Returns the payload.
    #[inline]
    pub fn data(&self) -> &EventData {
        &self.data
    }

    /// Prevents any further listener from observing this event during the
    /// current dispatch.
    #[inline]
    pub fn stop_propagation(&mut self) {
        self.stopped = true;
    }

    /// Returns true if some listener stopped the propagation.
    #[inline]
    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// Returns the node of the scene-graph listener currently handling the
    /// event, if any.
    #[inline]
    pub fn current_target(&self) -> Option<NodeId> {
        self.current_target
    }

    #[inline]
    pub(crate) fn set_current_target(&mut self, v: Option<NodeId>) {
        self.current_target = v;
    }
}
