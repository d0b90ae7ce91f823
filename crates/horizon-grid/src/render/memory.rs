//! In-memory render backend.
//!
//! [`MemoryBackend`] keeps the render tree as plain data. It is the default
//! backend of the grid, useful for headless hosts and for inspecting what the
//! grid rendered.

use std::collections::{BTreeMap, BTreeSet};

use slotmap::SlotMap;

use super::backend::{NodeId, NodeKind, RenderBackend};
use crate::format::CellContent;

/// A node of the in-memory render tree.
#[derive(Debug, Clone)]
pub struct MemoryNode {
    /// What the node represents.
    pub kind: NodeKind,
    /// Parent node, `None` for roots and detached nodes.
    pub parent: Option<NodeId>,
    /// Children in attach order.
    pub children: Vec<NodeId>,
    /// Current content.
    pub content: CellContent,
    /// Css classes set by the grid.
    pub classes: BTreeSet<String>,
    /// Css classes requested by the last content.
    pub content_classes: Vec<String>,
    /// Attributes requested by the last content.
    pub attrs: BTreeMap<String, String>,
    /// Tooltip requested by the last content.
    pub tool_tip: Option<String>,
    /// Left offset in pixels.
    pub left: f32,
    /// Top offset in pixels.
    pub top: f32,
    /// Width in pixels.
    pub width: f32,
    /// Height in pixels.
    pub height: f32,
    /// Visibility flag.
    pub visible: bool,
}

impl MemoryNode {
    fn new(kind: NodeKind, parent: Option<NodeId>) -> Self {
        Self {
            kind,
            parent,
            children: Vec::new(),
            content: CellContent::empty(),
            classes: BTreeSet::new(),
            content_classes: Vec::new(),
            attrs: BTreeMap::new(),
            tool_tip: None,
            left: 0.0,
            top: 0.0,
            width: 0.0,
            height: 0.0,
            visible: true,
        }
    }

    /// Returns `true` if the node carries `class`, from the grid or its content.
    pub fn has_class(&self, class: &str) -> bool {
        self.classes.contains(class) || self.content_classes.iter().any(|c| c == class)
    }

    /// The text or markup of the node's content.
    pub fn text(&self) -> &str {
        self.content.text()
    }
}

/// A render backend that keeps the tree in memory.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    nodes: SlotMap<NodeId, MemoryNode>,
    created: usize,
    removed: usize,
}

impl MemoryBackend {
    /// Create an empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a live node.
    pub fn node(&self, id: NodeId) -> Option<&MemoryNode> {
        self.nodes.get(id)
    }

    /// Returns `true` if the node has not been removed.
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Children of a node (empty for unknown nodes).
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(id)
            .map(|node| node.children.as_slice())
            .unwrap_or(&[])
    }

    /// Text of a node's content (empty for unknown nodes).
    pub fn text(&self, id: NodeId) -> &str {
        self.nodes.get(id).map_or("", MemoryNode::text)
    }

    /// Returns `true` if the node exists and carries `class`.
    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.nodes.get(id).is_some_and(|node| node.has_class(class))
    }

    /// Returns `true` if the node is reachable from a root without a
    /// detached ancestor in between.
    pub fn is_attached(&self, id: NodeId) -> bool {
        let mut current = id;
        loop {
            let Some(node) = self.nodes.get(current) else {
                return false;
            };
            match node.parent {
                Some(parent) => current = parent,
                None => return matches!(node.kind, NodeKind::Viewport(_) | NodeKind::Header(_)),
            }
        }
    }

    /// Row indices of the row nodes attached to `canvas`, in attach order.
    pub fn row_indices(&self, canvas: NodeId) -> Vec<usize> {
        self.children(canvas)
            .iter()
            .filter_map(|child| match self.nodes.get(*child)?.kind {
                NodeKind::Row { row } => Some(row),
                _ => None,
            })
            .collect()
    }

    /// Number of live nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of nodes created so far.
    pub fn created_count(&self) -> usize {
        self.created
    }

    /// Number of nodes removed so far.
    pub fn removed_count(&self) -> usize {
        self.removed
    }

    fn unlink(&mut self, node: NodeId) {
        let Some(parent) = self.nodes.get_mut(node).and_then(|n| n.parent.take()) else {
            return;
        };
        if let Some(parent) = self.nodes.get_mut(parent) {
            parent.children.retain(|child| *child != node);
        }
    }
}

impl RenderBackend for MemoryBackend {
    fn create_node(&mut self, parent: Option<NodeId>, kind: NodeKind) -> NodeId {
        let parent = parent.filter(|p| self.nodes.contains_key(*p));
        let id = self.nodes.insert(MemoryNode::new(kind, parent));
        if let Some(parent) = parent.and_then(|p| self.nodes.get_mut(p)) {
            parent.children.push(id);
        }
        self.created += 1;
        id
    }

    fn set_content(&mut self, node: NodeId, content: &CellContent) {
        let Some(node) = self.nodes.get_mut(node) else {
            return;
        };
        node.content_classes = content.classes().map(str::to_string).collect();
        match content {
            CellContent::Html(_) => {
                node.attrs.clear();
                node.tool_tip = None;
            }
            CellContent::Result(result) => {
                node.attrs = result.add_attrs.clone();
                node.tool_tip = result.tool_tip.clone();
            }
        }
        node.content = content.clone();
    }

    fn set_class(&mut self, node: NodeId, class: &str, enabled: bool) {
        if let Some(node) = self.nodes.get_mut(node) {
            if enabled {
                node.classes.insert(class.to_string());
            } else {
                node.classes.remove(class);
            }
        }
    }

    fn set_position(&mut self, node: NodeId, left: f32, top: f32) {
        if let Some(node) = self.nodes.get_mut(node) {
            node.left = left;
            node.top = top;
        }
    }

    fn set_size(&mut self, node: NodeId, width: f32, height: f32) {
        if let Some(node) = self.nodes.get_mut(node) {
            node.width = width;
            node.height = height;
        }
    }

    fn set_visible(&mut self, node: NodeId, visible: bool) {
        if let Some(node) = self.nodes.get_mut(node) {
            node.visible = visible;
        }
    }

    fn append_child(&mut self, parent: NodeId, child: NodeId) {
        if !self.nodes.contains_key(parent) || !self.nodes.contains_key(child) {
            return;
        }
        self.unlink(child);
        if let Some(node) = self.nodes.get_mut(child) {
            node.parent = Some(parent);
        }
        if let Some(parent) = self.nodes.get_mut(parent) {
            parent.children.push(child);
        }
    }

    fn detach(&mut self, node: NodeId) {
        self.unlink(node);
    }

    fn remove_node(&mut self, node: NodeId) {
        self.unlink(node);
        let mut stack = vec![node];
        while let Some(id) = stack.pop() {
            if let Some(removed) = self.nodes.remove(id) {
                self.removed += 1;
                stack.extend(removed.children);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::FormatterResult;
    use crate::render::PaneId;

    #[test]
    fn test_tree_building() {
        let mut backend = MemoryBackend::new();
        let viewport = backend.create_node(None, NodeKind::Viewport(PaneId::TOP_LEFT));
        let canvas = backend.create_node(Some(viewport), NodeKind::Canvas(PaneId::TOP_LEFT));
        let row = backend.create_node(Some(canvas), NodeKind::Row { row: 3 });
        let cell = backend.create_node(Some(row), NodeKind::Cell { row: 3, cell: 0 });

        assert_eq!(backend.row_indices(canvas), vec![3]);
        assert!(backend.is_attached(cell));

        backend.detach(row);
        assert!(backend.row_indices(canvas).is_empty());
        assert!(!backend.is_attached(cell));
        assert!(backend.contains(cell));

        backend.append_child(canvas, row);
        assert!(backend.is_attached(cell));

        backend.remove_node(row);
        assert!(!backend.contains(cell));
        assert_eq!(backend.removed_count(), 2);
        assert_eq!(backend.node_count(), 2);
    }

    #[test]
    fn test_content_classes_replaced() {
        let mut backend = MemoryBackend::new();
        let cell = backend.create_node(None, NodeKind::Cell { row: 0, cell: 0 });

        backend.set_content(cell, &CellContent::Result(FormatterResult::text("a").with_class("warn")));
        assert!(backend.has_class(cell, "warn"));
        assert_eq!(backend.text(cell), "a");

        backend.set_content(cell, &CellContent::Html("b".into()));
        assert!(!backend.has_class(cell, "warn"));
        assert_eq!(backend.text(cell), "b");
    }
}
