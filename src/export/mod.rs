//! Export of a mind map to image and data files.
//!
//! Every format is produced independently from a read-only view of the graph.
//! SVG is built by hand; PNG rasterizes that same SVG with `resvg`, so both
//! images share layout and background.

use std::collections::HashSet;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use resvg::tiny_skia::{Pixmap, Transform};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use time::macros::format_description;

use crate::graph_utils::graph::{ArrowHead, Edge, EdgeKind, Node, NodeShape};

const CANVAS_PADDING: f64 = 40.0;
const MIN_NODE_WIDTH: f64 = 120.0;

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("failed to render image: {0}")]
    Render(String),
    #[error("failed to encode output: {0}")]
    Encode(String),
    #[error("failed to serialize graph: {0}")]
    Serialize(String),
    #[error("invalid document: {0}")]
    Invalid(String),
    #[error("failed to write export: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ExportFormat {
    Png,
    Svg,
    Json,
    Csv,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 4] = [ExportFormat::Png, ExportFormat::Svg, ExportFormat::Json, ExportFormat::Csv];

    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Png => "png",
            ExportFormat::Svg => "svg",
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ExportFormat::Png => "PNG",
            ExportFormat::Svg => "SVG",
            ExportFormat::Json => "JSON",
            ExportFormat::Csv => "CSV",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        let lower = s.trim().to_lowercase();
        Self::ALL.into_iter().find(|f| f.extension() == lower)
    }
}

/// The structured export document; also accepted back by [`import_json`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExportDocument {
    pub title: String,
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    #[serde(rename = "exportedAt")]
    pub exported_at: String,
}

pub fn export_json(title: &str, nodes: &[Node], edges: &[Edge], exported_at: &str) -> Result<String, ExportError> {
    let doc = ExportDocument {
        title: title.to_string(),
        nodes: nodes.to_vec(),
        edges: edges.to_vec(),
        exported_at: exported_at.to_string(),
    };
    let mut s = serde_json::to_string_pretty(&doc).map_err(|e| ExportError::Serialize(e.to_string()))?;
    s.push('\n');
    Ok(s)
}

/// Parse an export document. Documents that repeat a node or edge id are
/// rejected.
pub fn import_json(text: &str) -> Result<ExportDocument, ExportError> {
    let doc: ExportDocument = serde_json::from_str(text).map_err(|e| ExportError::Serialize(e.to_string()))?;
    if let Some(dup) = first_duplicate(doc.nodes.iter().map(|n| n.id.as_str())) {
        return Err(ExportError::Invalid(format!("duplicate node id {}", dup)));
    }
    if let Some(dup) = first_duplicate(doc.edges.iter().map(|e| e.id.as_str())) {
        return Err(ExportError::Invalid(format!("duplicate edge id {}", dup)));
    }
    Ok(doc)
}

fn first_duplicate<'a>(ids: impl Iterator<Item = &'a str>) -> Option<String> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Some(id.to_string());
        }
    }
    None
}

// Writes <stem>_nodes.csv and <stem>_edges.csv next to base_path
pub fn export_csv(nodes: &[Node], edges: &[Edge], base_path: &Path) -> Result<(PathBuf, PathBuf), ExportError> {
    let parent = base_path.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(parent)?;
    let stem = base_path.file_stem().and_then(|s| s.to_str()).unwrap_or("mindmap");
    let nodes_path = parent.join(format!("{}_nodes.csv", stem));
    let edges_path = parent.join(format!("{}_edges.csv", stem));
    let csv_err = |e: csv::Error| ExportError::Encode(e.to_string());
    {
        let mut wtr = csv::Writer::from_path(&nodes_path).map_err(csv_err)?;
        wtr.write_record(["id", "x", "y", "shape", "label", "description", "color", "fontSize"]).map_err(csv_err)?;
        for n in nodes {
            let font = serde_json::to_value(n.data.font_size)
                .ok()
                .and_then(|v| v.as_str().map(str::to_string))
                .unwrap_or_default();
            wtr.write_record([
                n.id.clone(),
                n.position.x.to_string(),
                n.position.y.to_string(),
                n.data.shape.as_str().to_string(),
                n.data.label.clone(),
                n.data.description.clone().unwrap_or_default(),
                n.data.color.clone(),
                font,
            ])
            .map_err(csv_err)?;
        }
        wtr.flush()?;
    }
    {
        let mut wtr = csv::Writer::from_path(&edges_path).map_err(csv_err)?;
        wtr.write_record(["id", "source", "target", "type", "animated"]).map_err(csv_err)?;
        for e in edges {
            wtr.write_record([
                e.id.clone(),
                e.source.clone(),
                e.target.clone(),
                edge_kind_name(e.kind).to_string(),
                e.animated.to_string(),
            ])
            .map_err(csv_err)?;
        }
        wtr.flush()?;
    }
    Ok((nodes_path, edges_path))
}

fn edge_kind_name(kind: EdgeKind) -> &'static str {
    match kind {
        EdgeKind::Bezier => "bezier",
        EdgeKind::Straight => "straight",
        EdgeKind::Step => "step",
        EdgeKind::Smoothstep => "smoothstep",
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
struct NodeBox {
    x: f64,
    y: f64,
    w: f64,
    h: f64,
}

impl NodeBox {
    fn cx(&self) -> f64 { self.x + self.w / 2.0 }
    fn cy(&self) -> f64 { self.y + self.h / 2.0 }
}

// Positions are the node's top-left corner; size follows label length and font
fn node_box(node: &Node) -> NodeBox {
    let pt = node.data.font_size.points();
    let chars = node.data.label.chars().count() as f64;
    let mut w = (chars * pt * 0.6 + 32.0).max(MIN_NODE_WIDTH);
    let mut h = pt * 2.6;
    if node.data.description.is_some() {
        h += pt * 1.4;
    }
    match node.data.shape {
        NodeShape::Circle => {
            let d = w.max(h);
            w = d;
            h = d;
        }
        NodeShape::Diamond => {
            w *= 1.4;
            h *= 1.8;
        }
        NodeShape::Hexagon => w += h * 0.6,
        NodeShape::Rectangle | NodeShape::Pill => {}
    }
    NodeBox { x: node.position.x, y: node.position.y, w, h }
}

fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

/// Render the fitted view of the graph as a standalone SVG document.
pub fn render_svg(nodes: &[Node], edges: &[Edge], background: &str) -> String {
    let boxes: Vec<(&Node, NodeBox)> = nodes.iter().map(|n| (n, node_box(n))).collect();
    let (min_x, min_y, max_x, max_y) = if boxes.is_empty() {
        (0.0, 0.0, 200.0, 100.0)
    } else {
        boxes.iter().fold(
            (f64::MAX, f64::MAX, f64::MIN, f64::MIN),
            |(a, b, c, d), (_, bx)| (a.min(bx.x), b.min(bx.y), c.max(bx.x + bx.w), d.max(bx.y + bx.h)),
        )
    };
    let ox = min_x - CANVAS_PADDING;
    let oy = min_y - CANVAS_PADDING;
    let width = (max_x - min_x + 2.0 * CANVAS_PADDING).ceil();
    let height = (max_y - min_y + 2.0 * CANVAS_PADDING).ceil();

    // String formatting into a String never fails
    let mut svg = String::new();
    let _ = writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="{ox:.2} {oy:.2} {w} {h}">"#,
        w = width,
        h = height,
        ox = ox,
        oy = oy
    );
    let _ = writeln!(
        svg,
        r#"  <rect x="{:.2}" y="{:.2}" width="{}" height="{}" fill="{}"/>"#,
        ox,
        oy,
        width,
        height,
        escape_xml(background)
    );

    svg.push_str("  <defs>\n");
    for (i, e) in edges.iter().enumerate() {
        let fill = escape_xml(&e.style.stroke);
        match e.marker_end {
            ArrowHead::None => {}
            ArrowHead::Arrow => {
                let _ = writeln!(
                    svg,
                    r#"    <marker id="arrow-{i}" viewBox="0 0 10 10" refX="9" refY="5" markerWidth="8" markerHeight="8" orient="auto"><path d="M0,0 L10,5 L0,10" fill="none" stroke="{fill}" stroke-width="1.5"/></marker>"#
                );
            }
            ArrowHead::ArrowClosed => {
                let _ = writeln!(
                    svg,
                    r#"    <marker id="arrow-{i}" viewBox="0 0 10 10" refX="9" refY="5" markerWidth="8" markerHeight="8" orient="auto"><path d="M0,0 L10,5 L0,10 z" fill="{fill}"/></marker>"#
                );
            }
        }
    }
    svg.push_str("  </defs>\n");

    for (i, e) in edges.iter().enumerate() {
        let src = boxes.iter().find(|(n, _)| n.id == e.source).map(|(_, b)| *b);
        let dst = boxes.iter().find(|(n, _)| n.id == e.target).map(|(_, b)| *b);
        let (Some(s), Some(t)) = (src, dst) else { continue };
        // source handle at the bottom, target handle at the top
        let (sx, sy) = (s.cx(), s.y + s.h);
        let (tx, ty) = (t.cx(), t.y);
        let my = (sy + ty) / 2.0;
        let d = match e.kind {
            EdgeKind::Straight => format!("M{sx:.2},{sy:.2} L{tx:.2},{ty:.2}"),
            EdgeKind::Bezier => format!("M{sx:.2},{sy:.2} C{sx:.2},{my:.2} {tx:.2},{my:.2} {tx:.2},{ty:.2}"),
            EdgeKind::Step | EdgeKind::Smoothstep => {
                format!("M{sx:.2},{sy:.2} L{sx:.2},{my:.2} L{tx:.2},{my:.2} L{tx:.2},{ty:.2}")
            }
        };
        let join = if e.kind == EdgeKind::Smoothstep { "round" } else { "miter" };
        let marker = if e.marker_end == ArrowHead::None { String::new() } else { format!(r#" marker-end="url(#arrow-{i})""#) };
        let dash = if e.animated { r#" stroke-dasharray="6 4""# } else { "" };
        let _ = writeln!(
            svg,
            r#"  <path d="{d}" fill="none" stroke="{}" stroke-width="{}" stroke-linejoin="{join}"{dash}{marker}/>"#,
            escape_xml(&e.style.stroke),
            e.style.stroke_width
        );
    }

    for (n, b) in &boxes {
        let fill = escape_xml(&n.data.color);
        let stroke = r##"stroke="#1e293b" stroke-width="1.5""##;
        let shape = match n.data.shape {
            NodeShape::Rectangle => format!(
                r#"<rect x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}" rx="6" fill="{fill}" {stroke}/>"#,
                b.x, b.y, b.w, b.h
            ),
            NodeShape::Pill => format!(
                r#"<rect x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}" rx="{:.2}" fill="{fill}" {stroke}/>"#,
                b.x, b.y, b.w, b.h, b.h / 2.0
            ),
            NodeShape::Circle => format!(
                r#"<circle cx="{:.2}" cy="{:.2}" r="{:.2}" fill="{fill}" {stroke}/>"#,
                b.cx(), b.cy(), b.w / 2.0
            ),
            NodeShape::Diamond => format!(
                r#"<polygon points="{:.2},{:.2} {:.2},{:.2} {:.2},{:.2} {:.2},{:.2}" fill="{fill}" {stroke}/>"#,
                b.cx(), b.y, b.x + b.w, b.cy(), b.cx(), b.y + b.h, b.x, b.cy()
            ),
            NodeShape::Hexagon => {
                let inset = b.h * 0.3;
                format!(
                    r#"<polygon points="{:.2},{:.2} {:.2},{:.2} {:.2},{:.2} {:.2},{:.2} {:.2},{:.2} {:.2},{:.2}" fill="{fill}" {stroke}/>"#,
                    b.x + inset, b.y, b.x + b.w - inset, b.y, b.x + b.w, b.cy(),
                    b.x + b.w - inset, b.y + b.h, b.x + inset, b.y + b.h, b.x, b.cy()
                )
            }
        };
        let _ = writeln!(svg, "  <g>\n    {}", shape);
        let pt = n.data.font_size.points();
        let label_y = if n.data.description.is_some() { b.cy() - pt * 0.3 } else { b.cy() + pt * 0.35 };
        let _ = writeln!(
            svg,
            r##"    <text x="{:.2}" y="{:.2}" font-family="sans-serif" font-size="{}" font-weight="600" fill="#ffffff" text-anchor="middle">{}</text>"##,
            b.cx(),
            label_y,
            pt,
            escape_xml(&n.data.label)
        );
        if let Some(desc) = &n.data.description {
            let _ = writeln!(
                svg,
                r##"    <text x="{:.2}" y="{:.2}" font-family="sans-serif" font-size="{}" fill="#e2e8f0" text-anchor="middle">{}</text>"##,
                b.cx(),
                label_y + pt * 1.3,
                (pt * 0.8).round(),
                escape_xml(desc)
            );
        }
        svg.push_str("  </g>\n");
    }

    svg.push_str("</svg>\n");
    svg
}

/// Rasterize an SVG document produced by [`render_svg`].
pub fn render_png(svg: &str, scale: f32) -> Result<Vec<u8>, ExportError> {
    if scale <= 0.0 || !scale.is_finite() {
        return Err(ExportError::Render(format!("invalid scale {}", scale)));
    }
    let mut options = resvg::usvg::Options::default();
    options.fontdb_mut().load_system_fonts();
    let tree = resvg::usvg::Tree::from_str(svg, &options)
        .map_err(|e| ExportError::Render(format!("failed to parse generated SVG: {e}")))?;

    let size = tree.size().to_int_size();
    let width = ((size.width() as f32) * scale).ceil() as u32;
    let height = ((size.height() as f32) * scale).ceil() as u32;
    let mut pixmap = Pixmap::new(width.max(1), height.max(1))
        .ok_or_else(|| ExportError::Render(format!("failed to allocate {width}x{height} surface")))?;
    resvg::render(&tree, Transform::from_scale(scale, scale), &mut pixmap.as_mut());
    pixmap.encode_png().map_err(|e| ExportError::Encode(e.to_string()))
}

pub fn file_stamp() -> String {
    let fmt = format_description!("[year][month][day]_[hour][minute][second]");
    OffsetDateTime::now_utc().format(fmt).unwrap_or_else(|_| "unknown".to_string())
}

// Filesystem-safe lowercase slug of a title
pub fn slug(title: &str) -> String {
    let mut out = String::new();
    for c in title.chars() {
        if c.is_alphanumeric() {
            out.extend(c.to_lowercase());
        } else if !out.ends_with('-') && !out.is_empty() {
            out.push('-');
        }
    }
    let trimmed = out.trim_end_matches('-');
    if trimmed.is_empty() { "mindmap".to_string() } else { trimmed.to_string() }
}

// Exports within the same second get a numeric suffix instead of
// overwriting each other
fn unused_export_path(dir: &Path, stem: &str, format: ExportFormat) -> PathBuf {
    let taken = |stem: &str| match format {
        ExportFormat::Csv => dir.join(format!("{}_nodes.csv", stem)).exists(),
        _ => dir.join(format!("{}.{}", stem, format.extension())).exists(),
    };
    let mut candidate = stem.to_string();
    let mut n = 1;
    while taken(&candidate) {
        n += 1;
        candidate = format!("{}-{}", stem, n);
    }
    dir.join(format!("{}.{}", candidate, format.extension()))
}

/// Write one export file (two for CSV) under `dir` and return the primary path.
pub fn export_to_dir(
    format: ExportFormat,
    title: &str,
    nodes: &[Node],
    edges: &[Edge],
    background: &str,
    exported_at: &str,
    dir: &Path,
) -> Result<PathBuf, ExportError> {
    std::fs::create_dir_all(dir)?;
    let path = unused_export_path(dir, &format!("{}_{}", slug(title), file_stamp()), format);
    match format {
        ExportFormat::Png => {
            let png = render_png(&render_svg(nodes, edges, background), 2.0)?;
            std::fs::write(&path, png)?;
        }
        ExportFormat::Svg => std::fs::write(&path, render_svg(nodes, edges, background))?,
        ExportFormat::Json => std::fs::write(&path, export_json(title, nodes, edges, exported_at)?)?,
        ExportFormat::Csv => {
            let (nodes_path, _) = export_csv(nodes, edges, &path)?;
            return Ok(nodes_path);
        }
    }
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph_utils::graph::{MindMap, NodeShape};

    fn sample() -> MindMap {
        let mut map = MindMap::with_seed(11);
        let a = map.add_node(NodeShape::Circle);
        let b = map.add_node(NodeShape::Hexagon);
        map.update_node_label(&a.id, "Tom & <Jerry>", Some("cat \"and\" mouse".into()));
        map.connect(&a.id, &b.id);
        map
    }

    #[test]
    fn json_export_has_required_fields() {
        let map = sample();
        let s = export_json("Plan", map.nodes(), map.edges(), "2026-01-01T00:00:00Z").expect("json");
        let v: serde_json::Value = serde_json::from_str(&s).expect("parse");
        assert_eq!(v["title"], "Plan");
        assert_eq!(v["exportedAt"], "2026-01-01T00:00:00Z");
        let node = &v["nodes"][0];
        assert!(node["id"].is_string());
        assert!(node["position"]["x"].is_number());
        assert_eq!(node["data"]["label"], "Tom & <Jerry>");
        assert_eq!(node["data"]["description"], "cat \"and\" mouse");
        assert_eq!(node["data"]["shape"], "circle");
        assert!(node["data"]["color"].is_string());
        assert!(node.get("selected").is_none());
        assert_eq!(v["edges"].as_array().map(|a| a.len()), Some(1));
        // nodes without a description still carry the key
        let bare = &v["nodes"][1]["data"];
        assert!(bare.get("description").is_some_and(|d| d.is_null()));
        for key in ["label", "color", "shape"] {
            assert!(bare.get(key).is_some(), "missing {}", key);
        }
    }

    #[test]
    fn import_reads_back_export() {
        let map = sample();
        let s = export_json("Plan", map.nodes(), map.edges(), "x").expect("json");
        let doc = import_json(&s).expect("import");
        assert_eq!(doc.nodes, map.nodes());
        assert_eq!(doc.edges, map.edges());
    }

    #[test]
    fn import_rejects_repeated_ids() {
        let map = sample();
        let mut nodes = map.nodes().to_vec();
        nodes.push(nodes[0].clone());
        let s = export_json("Plan", &nodes, map.edges(), "x").expect("json");
        assert!(matches!(import_json(&s), Err(ExportError::Invalid(_))));

        let mut edges = map.edges().to_vec();
        edges.push(edges[0].clone());
        let s = export_json("Plan", map.nodes(), &edges, "x").expect("json");
        assert!(matches!(import_json(&s), Err(ExportError::Invalid(_))));
    }

    #[test]
    fn same_second_exports_do_not_overwrite() {
        let dir = tempfile::tempdir().expect("tempdir");
        let map = sample();
        for format in [ExportFormat::Json, ExportFormat::Csv] {
            let first = export_to_dir(format, "Plan", map.nodes(), map.edges(), "#fff", "x", dir.path()).expect("first");
            let second = export_to_dir(format, "Plan", map.nodes(), map.edges(), "#fff", "x", dir.path()).expect("second");
            assert_ne!(first, second);
            assert!(first.exists() && second.exists());
        }
        let stem = unused_export_path(dir.path(), "a", ExportFormat::Svg);
        assert_eq!(stem, dir.path().join("a.svg"));
    }

    #[test]
    fn svg_escapes_text_and_paints_background() {
        let map = sample();
        let svg = render_svg(map.nodes(), map.edges(), "#0f172a");
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains(r##"fill="#0f172a""##));
        assert!(svg.contains("Tom &amp; &lt;Jerry&gt;"));
        assert!(svg.contains("<circle"));
        assert!(svg.contains("<polygon"));
        assert!(svg.contains("marker-end=\"url(#arrow-0)\""));
    }

    #[test]
    fn png_is_rendered() {
        let map = sample();
        let png = render_png(&render_svg(map.nodes(), map.edges(), "#ffffff"), 1.0).expect("png");
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
    }

    #[test]
    fn png_rejects_bad_scale_and_bad_svg() {
        assert!(matches!(render_png("<svg", 1.0), Err(ExportError::Render(_))));
        assert!(matches!(render_png("<svg/>", 0.0), Err(ExportError::Render(_))));
    }

    #[test]
    fn csv_writes_two_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        let map = sample();
        let (np, ep) = export_csv(map.nodes(), map.edges(), &dir.path().join("plan.csv")).expect("csv");
        let nodes = std::fs::read_to_string(np).expect("nodes");
        let edges = std::fs::read_to_string(ep).expect("edges");
        assert_eq!(nodes.lines().count(), 3);
        assert!(edges.lines().next().is_some_and(|h| h.starts_with("id,source,target")));
    }

    #[test]
    fn slug_is_filesystem_safe() {
        assert_eq!(slug("My Plan / 2026!"), "my-plan-2026");
        assert_eq!(slug("   "), "mindmap");
    }
}
