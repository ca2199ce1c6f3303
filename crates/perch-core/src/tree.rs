//! # Node tree
//!
//! Perch keeps an explicit, owned tree of nodes instead of remounting views.
//! A node that should not be painted stays in the tree with `visible = false`.
//!
//! The tree has two fixed children under its root: `body()` for regular
//! content and `overlay()` for floating panels. Mounting a panel under the
//! overlay takes it out of the normal hierarchy, so anchor containment and
//! ancestor clipping never apply to it.
//!
//! ```rust
//! use perch_core::*;
//!
//! let mut tree = NodeTree::new();
//! let button = tree
//!     .insert(tree.body(), Node::new("button").class("select-trigger"))
//!     .unwrap();
//! tree.set_rect(button, Rect::new(100.0, 500.0, 100.0, 40.0)).unwrap();
//!
//! let anchor = tree.measure(button).unwrap();
//! assert_eq!(anchor.bottom, 540.0);
//! ```

use slotmap::{SlotMap, new_key_type};
use smallvec::SmallVec;

use crate::{AnchorRect, Error, Rect, Result, Size};

new_key_type! {
    pub struct NodeId;
}

#[derive(Clone, Debug, Default)]
pub struct Node {
    pub tag: String,
    pub id: Option<String>,
    pub classes: SmallVec<[String; 4]>,
    pub attrs: SmallVec<[(String, String); 2]>,
    pub visible: bool,
    pub rect: Option<Rect>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            visible: true,
            ..Default::default()
        }
    }
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
    pub fn class(mut self, class: impl Into<String>) -> Self {
        self.classes.push(class.into());
        self
    }
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.push((name.into(), value.into()));
        self
    }
    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }
    pub fn rect(mut self, rect: Rect) -> Self {
        self.rect = Some(rect);
        self
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    pub fn attr_value(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

pub struct NodeTree {
    nodes: SlotMap<NodeId, Node>,
    root: NodeId,
    body: NodeId,
    overlay: NodeId,
}

impl Default for NodeTree {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeTree {
    pub fn new() -> Self {
        let mut nodes = SlotMap::with_key();
        let root = nodes.insert(Node::new("html"));
        let body = nodes.insert(Node {
            parent: Some(root),
            ..Node::new("body")
        });
        let overlay = nodes.insert(Node {
            parent: Some(root),
            ..Node::new("div").attr("data-overlay", "")
        });
        nodes[root].children = vec![body, overlay];
        Self {
            nodes,
            root,
            body,
            overlay,
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }
    pub fn body(&self) -> NodeId {
        self.body
    }
    /// Portal layer for floating panels and masks.
    pub fn overlay(&self) -> NodeId {
        self.overlay
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node> {
        self.nodes.get_mut(id).ok_or(Error::UnknownNode(id))
    }

    /// Insert `node` as the last child of `parent`.
    pub fn insert(&mut self, parent: NodeId, mut node: Node) -> Result<NodeId> {
        if !self.nodes.contains_key(parent) {
            return Err(Error::UnknownNode(parent));
        }
        node.parent = Some(parent);
        node.children.clear();
        let id = self.nodes.insert(node);
        self.nodes[parent].children.push(id);
        Ok(id)
    }

    /// Move `child` (and its subtree) under `parent`.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        if !self.nodes.contains_key(parent) {
            return Err(Error::UnknownNode(parent));
        }
        if !self.nodes.contains_key(child) {
            return Err(Error::UnknownNode(child));
        }
        if self.contains(child, parent) {
            log::warn!("append_child: {child:?} is an ancestor of {parent:?}; ignoring");
            return Ok(());
        }
        self.detach(child);
        self.nodes[child].parent = Some(parent);
        self.nodes[parent].children.push(child);
        Ok(())
    }

    fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes.get_mut(id).and_then(|n| n.parent.take())
            && let Some(p) = self.nodes.get_mut(parent)
        {
            p.children.retain(|c| *c != id);
        }
    }

    /// Remove `id` and every node below it.
    pub fn remove(&mut self, id: NodeId) -> Result<()> {
        if !self.nodes.contains_key(id) {
            return Err(Error::UnknownNode(id));
        }
        if id == self.root || id == self.body || id == self.overlay {
            log::warn!("remove: {id:?} is a fixed root node; ignoring");
            return Ok(());
        }
        self.detach(id);
        let mut stack = vec![id];
        while let Some(n) = stack.pop() {
            if let Some(node) = self.nodes.remove(n) {
                stack.extend(node.children);
            }
        }
        Ok(())
    }

    /// `id` followed by its parent chain up to the root.
    pub fn self_and_ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        let start = self.nodes.contains_key(id).then_some(id);
        std::iter::successors(start, |n| self.nodes.get(*n).and_then(|node| node.parent))
    }

    /// Inclusive containment: a node contains itself.
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        self.self_and_ancestors(node).any(|n| n == ancestor)
    }

    pub fn set_rect(&mut self, id: NodeId, rect: Rect) -> Result<()> {
        self.node_mut(id)?.rect = Some(rect);
        Ok(())
    }

    pub fn rect(&self, id: NodeId) -> Option<Rect> {
        self.nodes.get(id).and_then(|n| n.rect)
    }

    pub fn set_visible(&mut self, id: NodeId, visible: bool) -> Result<()> {
        self.node_mut(id)?.visible = visible;
        Ok(())
    }

    pub fn is_visible(&self, id: NodeId) -> bool {
        self.nodes.get(id).is_some_and(|n| n.visible)
    }

    /// Bounding box of a laid-out node, or `None` before its first layout pass.
    pub fn measure(&self, id: NodeId) -> Option<AnchorRect> {
        self.rect(id).map(AnchorRect::from)
    }

    /// Measured size; zero until the node has been laid out.
    pub fn measure_size(&self, id: NodeId) -> Size {
        self.rect(id).map(|r| r.size()).unwrap_or_default()
    }
}
