use super::graph::{Node, Position};

pub const MIN_ZOOM: f64 = 0.1;
pub const MAX_ZOOM: f64 = 4.0;
pub const ZOOM_STEP: f64 = 1.2;
pub const CENTER_TRANSITION_MS: u64 = 800;
pub const FIT_PADDING: f64 = 80.0;

/// Instruction for the canvas: move the camera here over `duration_ms`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewportRequest {
    pub center: Position,
    pub zoom: f64,
    pub duration_ms: u64,
}

/// Camera state in canvas space: the point at the middle of the screen,
/// the zoom factor and the on-screen size used by `fit`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub center: Position,
    pub zoom: f64,
    pub width: f64,
    pub height: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self { center: Position::new(300.0, 300.0), zoom: 1.0, width: 1280.0, height: 720.0 }
    }
}

impl Viewport {
    pub fn zoom_in(&mut self) -> ViewportRequest {
        self.zoom = (self.zoom * ZOOM_STEP).clamp(MIN_ZOOM, MAX_ZOOM);
        self.request(0)
    }

    pub fn zoom_out(&mut self) -> ViewportRequest {
        self.zoom = (self.zoom / ZOOM_STEP).clamp(MIN_ZOOM, MAX_ZOOM);
        self.request(0)
    }

    // Smooth recentre at the current zoom
    pub fn center_on(&mut self, position: Position) -> ViewportRequest {
        self.center = position;
        self.request(CENTER_TRANSITION_MS)
    }

    /// Frame every node. Zoom never exceeds 1.0 so small maps are not blown up.
    pub fn fit(&mut self, nodes: &[Node]) -> ViewportRequest {
        if let Some((min, max)) = bounds(nodes) {
            let w = (max.x - min.x) + 2.0 * FIT_PADDING;
            let h = (max.y - min.y) + 2.0 * FIT_PADDING;
            let zoom = (self.width / w).min(self.height / h).min(1.0);
            self.zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
            self.center = Position::new((min.x + max.x) / 2.0, (min.y + max.y) / 2.0);
        }
        self.request(CENTER_TRANSITION_MS)
    }

    fn request(&self, duration_ms: u64) -> ViewportRequest {
        ViewportRequest { center: self.center, zoom: self.zoom, duration_ms }
    }
}

/// Axis-aligned bounds of node anchor points.
pub fn bounds(nodes: &[Node]) -> Option<(Position, Position)> {
    let first = nodes.first()?;
    let mut min = first.position;
    let mut max = first.position;
    for n in &nodes[1..] {
        min.x = min.x.min(n.position.x);
        min.y = min.y.min(n.position.y);
        max.x = max.x.max(n.position.x);
        max.y = max.y.max(n.position.y);
    }
    Some((min, max))
}
