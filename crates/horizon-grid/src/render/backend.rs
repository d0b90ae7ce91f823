//! The render backend contract.
//!
//! The grid never draws anything itself. It drives a retained tree of nodes
//! (pane viewports, canvases, rows and cells) through [`RenderBackend`], and a
//! backend maps those nodes onto whatever actually displays them.

use slotmap::new_key_type;

use crate::format::CellContent;

new_key_type! {
    /// Handle of a node in the render tree.
    pub struct NodeId;
}

/// Horizontal half of the pane grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PaneColumn {
    /// Frozen columns (or everything, without frozen columns).
    Left,
    /// Scrolling columns next to frozen ones.
    Right,
}

/// Vertical half of the pane grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PaneRow {
    /// Top pane (frozen rows, or everything without frozen rows).
    Top,
    /// Bottom pane.
    Bottom,
}

/// One of up to four panes a layout splits the grid into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PaneId {
    /// Horizontal half.
    pub column: PaneColumn,
    /// Vertical half.
    pub row: PaneRow,
}

impl PaneId {
    /// Top-left pane; the only pane of the basic layout.
    pub const TOP_LEFT: PaneId = PaneId::new(PaneColumn::Left, PaneRow::Top);
    /// Top-right pane.
    pub const TOP_RIGHT: PaneId = PaneId::new(PaneColumn::Right, PaneRow::Top);
    /// Bottom-left pane.
    pub const BOTTOM_LEFT: PaneId = PaneId::new(PaneColumn::Left, PaneRow::Bottom);
    /// Bottom-right pane.
    pub const BOTTOM_RIGHT: PaneId = PaneId::new(PaneColumn::Right, PaneRow::Bottom);
    /// All panes in creation order.
    pub const ALL: [PaneId; 4] = [
        PaneId::TOP_LEFT,
        PaneId::TOP_RIGHT,
        PaneId::BOTTOM_LEFT,
        PaneId::BOTTOM_RIGHT,
    ];

    /// Create a pane id.
    pub const fn new(column: PaneColumn, row: PaneRow) -> Self {
        Self { column, row }
    }
}

/// What a node represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// Scrollable viewport of a pane.
    Viewport(PaneId),
    /// Canvas inside a pane viewport; parent of row nodes.
    Canvas(PaneId),
    /// Column header strip of a pane.
    Header(PaneId),
    /// A row (one node per pane column the row spans).
    Row {
        /// Data row index.
        row: usize,
    },
    /// A cell inside a row node.
    Cell {
        /// Data row index.
        row: usize,
        /// First column covered by the cell.
        cell: usize,
    },
}

/// A retained render tree the grid drives.
pub trait RenderBackend {
    /// Create a node, optionally attached to `parent`.
    fn create_node(&mut self, parent: Option<NodeId>, kind: NodeKind) -> NodeId;

    /// Replace the content of a cell node.
    fn set_content(&mut self, node: NodeId, content: &CellContent);

    /// Add or remove a css class.
    fn set_class(&mut self, node: NodeId, class: &str, enabled: bool);

    /// Position a node relative to its parent.
    fn set_position(&mut self, node: NodeId, left: f32, top: f32);

    /// Size a node.
    fn set_size(&mut self, node: NodeId, width: f32, height: f32);

    /// Show or hide a node.
    fn set_visible(&mut self, node: NodeId, visible: bool);

    /// Attach `child` as the last child of `parent`, detaching it first.
    fn append_child(&mut self, parent: NodeId, child: NodeId);

    /// Detach a node from its parent, keeping it (and its subtree) alive.
    fn detach(&mut self, node: NodeId);

    /// Destroy a node and its subtree.
    fn remove_node(&mut self, node: NodeId);
}
