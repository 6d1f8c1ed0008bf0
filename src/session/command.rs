use std::path::PathBuf;

use crate::export::ExportFormat;
use crate::graph_utils::graph::{Edge, EdgeId, EdgeKind, FontSize, Node, NodeId, NodeShape, Position};
use crate::graph_utils::viewport::ViewportRequest;

/// Everything the toolbar, context menus and keyboard can ask of a session.
/// Shortcuts resolve to these same values, so there is one code path per action.
#[derive(Clone, Debug, PartialEq)]
pub enum EditorCommand {
    AddNode(NodeShape),
    UpdateLabel { id: NodeId, label: String, description: Option<String> },
    UpdateColor { id: NodeId, color: String },
    UpdateShape { id: NodeId, shape: NodeShape },
    UpdateFontSize { id: NodeId, font_size: FontSize },
    MoveNode { id: NodeId, position: Position },
    DeleteNode(NodeId),
    DeleteEdge(EdgeId),
    Connect { source: NodeId, target: NodeId },
    SetEdgeKind(EdgeKind),
    SetEdgeAnimated(bool),
    Select(Vec<NodeId>),
    ClearSelection,
    Undo,
    Redo,
    Copy,
    Paste,
    Clear { confirmed: bool },
    Save,
    Rename(String),
    Export { format: ExportFormat, dir: Option<PathBuf> },
    ImportJson(String),
    OpenSearch,
    Search(String),
    CenterOn(NodeId),
    ZoomIn,
    ZoomOut,
    FitView,
}

#[derive(Clone, Debug, PartialEq)]
pub enum CommandOutcome {
    /// The command ran and changed nothing, or referenced a missing id.
    Unchanged,
    Changed,
    NodeAdded(Node),
    EdgeAdded(Edge),
    Pasted(Vec<Node>),
    Copied(usize),
    Saved(bool),
    Exported(Option<PathBuf>),
    Matches(Vec<Node>),
    Viewport(ViewportRequest),
    /// The host should open its search box.
    SearchRequested,
    /// Destructive command sent without confirmation.
    NeedsConfirmation,
}
