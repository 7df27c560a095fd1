//! Math types, re-exported from `cgmath`.

pub use cgmath::prelude::*;
pub use cgmath::{vec2, Vector2};
