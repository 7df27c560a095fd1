//! A minimal retained node graph: parent/child links and z-ordering.
//!
//! The graph answers two questions for the frame systems. First, "who is
//! this target?": `NodeId` is the opaque identity that every timer, action
//! and event listener registration is keyed on. Second, "in what order
//! would this node be drawn?": the render-order walk drives scene-graph
//! event priorities.
//!
//! There are deliberately no transforms, no visibility and no draw data in
//! here; those belong to the presentation layers built on top.

mod graph;

pub use self::graph::{Node, SceneGraph};

pub mod prelude {
    pub use super::{NodeId, SceneGraph};
}

impl_handle!(NodeId);
