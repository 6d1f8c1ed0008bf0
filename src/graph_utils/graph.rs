use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// Basic type aliases for clarity
pub type NodeId = String;
pub type EdgeId = String;

pub const DEFAULT_NODE_LABEL: &str = "Novo Nó";
pub const DEFAULT_NODE_COLOR: &str = "#6366f1";
pub const DEFAULT_EDGE_STROKE: &str = "#94a3b8";

// New nodes land somewhere in this square so they don't stack perfectly
const SPAWN_MIN: f64 = 100.0;
const SPAWN_MAX: f64 = 500.0;

/// Mint a collision-resistant id. UUIDv7 is a millisecond timestamp followed
/// by random bits, so ids sort by creation time and are never reused.
pub fn mint_id(prefix: &str) -> String {
    format!("{}_{}", prefix, Uuid::now_v7().simple())
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self { Self { x, y } }

    pub fn offset(self, dx: f64, dy: f64) -> Self {
        Self { x: self.x + dx, y: self.y + dy }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeShape {
    #[default]
    Rectangle,
    Pill,
    Circle,
    Diamond,
    Hexagon,
}

impl NodeShape {
    pub const ALL: [NodeShape; 5] = [
        NodeShape::Rectangle,
        NodeShape::Pill,
        NodeShape::Circle,
        NodeShape::Diamond,
        NodeShape::Hexagon,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            NodeShape::Rectangle => "rectangle",
            NodeShape::Pill => "pill",
            NodeShape::Circle => "circle",
            NodeShape::Diamond => "diamond",
            NodeShape::Hexagon => "hexagon",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        let lower = s.trim().to_lowercase();
        Self::ALL.into_iter().find(|shape| shape.as_str() == lower)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontSize {
    Small,
    #[default]
    Medium,
    Large,
}

impl FontSize {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "small" | "sm" => Some(FontSize::Small),
            "medium" | "md" => Some(FontSize::Medium),
            "large" | "lg" => Some(FontSize::Large),
            _ => None,
        }
    }

    pub fn points(self) -> f64 {
        match self {
            FontSize::Small => 12.0,
            FontSize::Medium => 14.0,
            FontSize::Large => 18.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodeData {
    pub label: String,
    #[serde(default)]
    pub description: Option<String>,
    pub color: String,
    #[serde(default)]
    pub shape: NodeShape,
    #[serde(default, rename = "fontSize")]
    pub font_size: FontSize,
}

impl Default for NodeData {
    fn default() -> Self {
        Self {
            label: DEFAULT_NODE_LABEL.to_string(),
            description: None,
            color: DEFAULT_NODE_COLOR.to_string(),
            shape: NodeShape::default(),
            font_size: FontSize::default(),
        }
    }
}

/// A positioned vertex. Nodes are plain data; every mutation goes through
/// [`MindMap`] by id.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub position: Position,
    pub data: NodeData,
    // UI-only, never persisted or exported
    #[serde(skip)]
    pub selected: bool,
}

impl Node {
    pub fn label(&self) -> &str { &self.data.label }
    pub fn description(&self) -> Option<&str> { self.data.description.as_deref() }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeKind {
    Bezier,
    Straight,
    Step,
    #[default]
    Smoothstep,
}

impl EdgeKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "bezier" | "default" => Some(EdgeKind::Bezier),
            "straight" => Some(EdgeKind::Straight),
            "step" => Some(EdgeKind::Step),
            "smoothstep" => Some(EdgeKind::Smoothstep),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArrowHead {
    None,
    Arrow,
    #[default]
    ArrowClosed,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EdgeStyle {
    pub stroke: String,
    #[serde(rename = "strokeWidth")]
    pub stroke_width: f32,
}

impl Default for EdgeStyle {
    fn default() -> Self {
        Self { stroke: DEFAULT_EDGE_STROKE.to_string(), stroke_width: 2.0 }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub id: EdgeId,
    pub source: NodeId,
    pub target: NodeId,
    #[serde(rename = "type", default)]
    pub kind: EdgeKind,
    #[serde(default)]
    pub animated: bool,
    #[serde(default)]
    pub style: EdgeStyle,
    #[serde(rename = "markerEnd", default)]
    pub marker_end: ArrowHead,
}

/// What `connect` stamps on new edges; changed from the toolbar.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EdgeDefaults {
    pub kind: EdgeKind,
    pub animated: bool,
    pub style: EdgeStyle,
    pub marker_end: ArrowHead,
}

/// The in-memory document of one mind map. Node and edge order is insertion
/// order, which search results and exports preserve.
#[derive(Clone, Debug)]
pub struct MindMap {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    edge_defaults: EdgeDefaults,
    rng: StdRng,
}

impl Default for MindMap {
    fn default() -> Self { Self::new() }
}

impl MindMap {
    // Instantiate a new, empty mind map
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    // Deterministic spawn positions for tests
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        MindMap {
            nodes: Vec::new(),
            edges: Vec::new(),
            edge_defaults: EdgeDefaults::default(),
            rng,
        }
    }

    pub fn nodes(&self) -> &[Node] { &self.nodes }
    pub fn edges(&self) -> &[Edge] { &self.edges }
    pub fn node_count(&self) -> usize { self.nodes.len() }
    pub fn edge_count(&self) -> usize { self.edges.len() }
    pub fn is_empty(&self) -> bool { self.nodes.is_empty() && self.edges.is_empty() }

    pub fn get_node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn get_edge(&self, id: &str) -> Option<&Edge> {
        self.edges.iter().find(|e| e.id == id)
    }

    fn node_mut(&mut self, id: &str) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|n| n.id == id)
    }

    pub fn edge_defaults(&self) -> &EdgeDefaults { &self.edge_defaults }

    pub fn set_default_edge_kind(&mut self, kind: EdgeKind) {
        self.edge_defaults.kind = kind;
    }

    pub fn set_default_edge_animated(&mut self, animated: bool) {
        self.edge_defaults.animated = animated;
    }

    // Add a node with default data at a jittered position and return a copy
    pub fn add_node(&mut self, shape: NodeShape) -> Node {
        let position = Position::new(
            self.rng.gen_range(SPAWN_MIN..SPAWN_MAX),
            self.rng.gen_range(SPAWN_MIN..SPAWN_MAX),
        );
        let node = Node {
            id: mint_id("node"),
            position,
            data: NodeData { shape, ..NodeData::default() },
            selected: false,
        };
        debug!("add node {} ({})", node.id, shape.as_str());
        self.nodes.push(node.clone());
        node
    }

    // Insert fully formed nodes (paste, import). Ids already present are skipped.
    pub fn insert_nodes(&mut self, nodes: impl IntoIterator<Item = Node>) -> usize {
        let mut inserted = 0;
        for node in nodes {
            if self.get_node(&node.id).is_some() {
                continue;
            }
            self.nodes.push(node);
            inserted += 1;
        }
        inserted
    }

    pub fn update_node_label(&mut self, id: &str, label: impl Into<String>, description: Option<String>) -> bool {
        let Some(node) = self.node_mut(id) else { return false };
        node.data.label = label.into();
        if let Some(desc) = description {
            node.data.description = if desc.trim().is_empty() { None } else { Some(desc) };
        }
        true
    }

    pub fn update_node_color(&mut self, id: &str, color: impl Into<String>) -> bool {
        if let Some(node) = self.node_mut(id) {
            node.data.color = color.into();
            true
        } else {
            false
        }
    }

    pub fn update_node_shape(&mut self, id: &str, shape: NodeShape) -> bool {
        if let Some(node) = self.node_mut(id) {
            node.data.shape = shape;
            true
        } else {
            false
        }
    }

    pub fn update_node_font_size(&mut self, id: &str, font_size: FontSize) -> bool {
        if let Some(node) = self.node_mut(id) {
            node.data.font_size = font_size;
            true
        } else {
            false
        }
    }

    pub fn move_node(&mut self, id: &str, position: Position) -> bool {
        if let Some(node) = self.node_mut(id) {
            node.position = position;
            true
        } else {
            false
        }
    }

    // Delete operations
    pub fn delete_node(&mut self, id: &str) -> bool {
        let before = self.nodes.len();
        self.nodes.retain(|n| n.id != id);
        if self.nodes.len() == before {
            return false;
        }
        // Cascade delete edges touching this node
        let edges_before = self.edges.len();
        self.edges.retain(|e| e.source != id && e.target != id);
        debug!("delete node {} (+{} edges)", id, edges_before - self.edges.len());
        true
    }

    pub fn delete_edge(&mut self, id: &str) -> bool {
        let before = self.edges.len();
        self.edges.retain(|e| e.id != id);
        self.edges.len() != before
    }

    // Connect two existing, distinct nodes; returns the new edge
    pub fn connect(&mut self, source: &str, target: &str) -> Option<Edge> {
        if source == target || self.get_node(source).is_none() || self.get_node(target).is_none() {
            return None;
        }
        let defaults = &self.edge_defaults;
        let edge = Edge {
            id: mint_id("edge"),
            source: source.to_string(),
            target: target.to_string(),
            kind: defaults.kind,
            animated: defaults.animated,
            style: defaults.style.clone(),
            marker_end: defaults.marker_end,
        };
        debug!("connect {} -> {} as {}", source, target, edge.id);
        self.edges.push(edge.clone());
        Some(edge)
    }

    // Destructive: callers confirm with the user first
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.edges.clear();
    }

    /// Replace the whole document, e.g. from a history snapshot or a load.
    /// Edges with a missing endpoint are dropped.
    pub fn replace(&mut self, nodes: Vec<Node>, edges: Vec<Edge>) {
        self.nodes = nodes;
        self.edges = edges;
        self.prune_dangling_edges();
    }

    fn prune_dangling_edges(&mut self) {
        let nodes = &self.nodes;
        self.edges.retain(|e| {
            nodes.iter().any(|n| n.id == e.source) && nodes.iter().any(|n| n.id == e.target)
        });
    }

    // Selection helpers
    pub fn select_only(&mut self, id: &str) -> bool {
        if self.get_node(id).is_none() {
            return false;
        }
        for node in &mut self.nodes {
            node.selected = node.id == id;
        }
        true
    }

    pub fn set_selected(&mut self, ids: &[NodeId]) -> usize {
        let mut count = 0;
        for node in &mut self.nodes {
            node.selected = ids.contains(&node.id);
            if node.selected { count += 1; }
        }
        count
    }

    pub fn clear_selection(&mut self) {
        for node in &mut self.nodes {
            node.selected = false;
        }
    }

    pub fn selected_nodes(&self) -> Vec<&Node> {
        self.nodes.iter().filter(|n| n.selected).collect()
    }

    pub fn has_selection(&self) -> bool {
        self.nodes.iter().any(|n| n.selected)
    }
}
