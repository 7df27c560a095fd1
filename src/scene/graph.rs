use crate::errors::Result;
use crate::utils::ObjectPool;

use super::NodeId;

/// Per-node record. Children keep their insertion order; the render-order
/// walk sorts by `local_z` on the fly, so re-ordering a node is a plain
/// field write.
#[derive(Debug, Clone)]
pub struct Node {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    local_z: i32,
    global_z: f32,
}

impl Default for Node {
    fn default() -> Self {
        Node {
            parent: None,
            children: Vec::new(),
            local_z: 0,
            global_z: 0.0,
        }
    }
}

/// The retained node tree. Handles are versioned, so a stale `NodeId` held
/// by a timer or listener after its node dies simply stops resolving.
pub struct SceneGraph {
    nodes: ObjectPool<NodeId, Node>,
    root: NodeId,
}

impl Default for SceneGraph {
    fn default() -> Self {
        SceneGraph::new()
    }
}

impl SceneGraph {
    /// Constructs a new graph with a single root node.
    pub fn new() -> Self {
        let mut nodes = ObjectPool::new();
        let root = nodes.create(Node::default());
        SceneGraph { nodes, root }
    }

    /// Returns the root node.
    #[inline]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Creates a detached node. A detached node is a perfectly valid
    /// scheduling target; it only needs to be attached if it should take
    /// part in render-order event priorities.
    pub fn create_node(&mut self) -> NodeId {
        self.nodes.create(Node::default())
    }

    /// Returns true if `node` is alive.
    #[inline]
    pub fn contains(&self, node: NodeId) -> bool {
        self.nodes.contains(node)
    }

    /// Returns the number of alive nodes, root included.
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns the parent of `node`, if any.
    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(node).and_then(|v| v.parent)
    }

    /// Returns the children of `node` in insertion order.
    pub fn children(&self, node: NodeId) -> &[NodeId] {
        self.nodes
            .get(node)
            .map(|v| v.children.as_slice())
            .unwrap_or(&[])
    }

    /// Links `child` under `parent`, detaching it from its previous parent
    /// first.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        if !self.nodes.contains(parent) || !self.nodes.contains(child) {
            bail!("both nodes must be alive to link them");
        }

        if parent == child || self.is_ancestor(child, parent) {
            bail!("linking {} under {} would form a cycle", child, parent);
        }

        self.unlink(child);

        if let Some(v) = self.nodes.get_mut(child) {
            v.parent = Some(parent);
        }

        if let Some(v) = self.nodes.get_mut(parent) {
            v.children.push(child);
        }

        Ok(())
    }

    /// Returns true if `ancestor` sits on `node`'s parent chain.
    pub fn is_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut cursor = self.parent(node);
        while let Some(v) = cursor {
            if v == ancestor {
                return true;
            }

            cursor = self.parent(v);
        }

        false
    }

    /// Returns true if `node` is reachable from the root.
    pub fn is_attached(&self, node: NodeId) -> bool {
        node == self.root || self.is_ancestor(self.root, node)
    }

    /// Detaches `node` from its parent. Its children stay with it.
    pub fn remove_from_parent(&mut self, node: NodeId) {
        self.unlink(node);
    }

    /// Frees `node` and its whole subtree, returning every freed id.
    ///
    /// Callers owning timers/actions/listeners keyed on those ids are
    /// expected to tear them down as well; `Engine::destroy_node` does so.
    pub fn destroy_node(&mut self, node: NodeId) -> Vec<NodeId> {
        debug_assert!(node != self.root, "the root node could not be destroyed");

        if node == self.root || !self.nodes.contains(node) {
            return Vec::new();
        }

        self.unlink(node);

        let mut freed = Vec::new();
        let mut stack = vec![node];
        while let Some(id) = stack.pop() {
            if let Some(v) = self.nodes.free(id) {
                stack.extend(v.children);
                freed.push(id);
            }
        }

        freed
    }

    /// Sets the z-order of `node` relative to its siblings.
    pub fn set_local_z(&mut self, node: NodeId, z: i32) {
        if let Some(v) = self.nodes.get_mut(node) {
            v.local_z = z;
        }
    }

    /// Returns the local z-order of `node`, or 0 if it is dead.
    pub fn local_z(&self, node: NodeId) -> i32 {
        self.nodes.get(node).map(|v| v.local_z).unwrap_or(0)
    }

    /// Sets the z-order of `node` across the whole scene. Nodes sharing a
    /// `global_z` keep their relative render order.
    pub fn set_global_z(&mut self, node: NodeId, z: f32) {
        if let Some(v) = self.nodes.get_mut(node) {
            v.global_z = z;
        }
    }

    /// Returns the global z-order of `node`, or 0 if it is dead.
    pub fn global_z(&self, node: NodeId) -> f32 {
        self.nodes.get(node).map(|v| v.global_z).unwrap_or(0.0)
    }

    /// Visits the attached tree in render order: children with a negative
    /// `local_z` first, then the node itself, then the remaining children.
    pub fn visit<F>(&self, f: &mut F)
    where
        F: FnMut(NodeId),
    {
        self.visit_node(self.root, f);
    }

    fn visit_node<F>(&self, node: NodeId, f: &mut F)
    where
        F: FnMut(NodeId),
    {
        let mut children = self.children(node).to_vec();
        children.sort_by_key(|v| self.local_z(*v));

        let pivot = children
            .iter()
            .position(|v| self.local_z(*v) >= 0)
            .unwrap_or_else(|| children.len());

        for child in &children[..pivot] {
            self.visit_node(*child, f);
        }

        f(node);

        for child in &children[pivot..] {
            self.visit_node(*child, f);
        }
    }

    fn unlink(&mut self, node: NodeId) {
        let parent = self.nodes.get(node).and_then(|v| v.parent);

        if let Some(parent) = parent {
            if let Some(v) = self.nodes.get_mut(parent) {
                v.children.retain(|c| *c != node);
            }
        }

        if let Some(v) = self.nodes.get_mut(node) {
            v.parent = None;
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn hierarchy() {
        let mut scene = SceneGraph::new();
        let a = scene.create_node();
        let b = scene.create_node();

        scene.add_child(scene.root(), a).unwrap();
        scene.add_child(a, b).unwrap();

        assert_eq!(scene.parent(b), Some(a));
        assert!(scene.is_ancestor(scene.root(), b));
        assert!(scene.is_attached(b));

        assert!(scene.add_child(b, a).is_err());

        scene.remove_from_parent(a);
        assert!(!scene.is_attached(a));
        assert_eq!(scene.parent(b), Some(a));
    }

    #[test]
    fn visit_order() {
        let mut scene = SceneGraph::new();
        let below = scene.create_node();
        let above = scene.create_node();
        let child = scene.create_node();

        scene.add_child(scene.root(), above).unwrap();
        scene.add_child(scene.root(), below).unwrap();
        scene.add_child(above, child).unwrap();
        scene.set_local_z(below, -1);

        let mut order = Vec::new();
        scene.visit(&mut |v| order.push(v));

        assert_eq!(order, vec![below, scene.root(), above, child]);
    }

    #[test]
    fn destroy_subtree() {
        let mut scene = SceneGraph::new();
        let a = scene.create_node();
        let b = scene.create_node();

        scene.add_child(scene.root(), a).unwrap();
        scene.add_child(a, b).unwrap();

        let freed = scene.destroy_node(a);
        assert_eq!(freed.len(), 2);
        assert!(!scene.contains(a));
        assert!(!scene.contains(b));
        assert_eq!(scene.children(scene.root()), &[]);
    }
}
