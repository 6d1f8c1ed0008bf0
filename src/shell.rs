//! Line-oriented command language for driving a session from a terminal.

use std::path::PathBuf;

use anyhow::{anyhow, bail, Result};

use crate::export::ExportFormat;
use crate::graph_utils::graph::{EdgeKind, FontSize, MindMap, Node, NodeShape, Position};
use crate::session::command::{CommandOutcome, EditorCommand};
use crate::session::keymap::Shortcut;

#[derive(Clone, Debug, PartialEq)]
pub enum ShellCommand {
    Editor(EditorCommand),
    Key(Shortcut),
    Import(PathBuf),
    List,
    Help,
    Quit,
}

pub const HELP: &str = "\
add [shape]                 add a node (rectangle|pill|circle|diamond|hexagon)
label <id> <text> [| desc]  set label and optional description
color <id> <color>          set fill color
shape <id> <shape>          change shape
font <id> <small|medium|large>
move <id> <x> <y>           move a node
delete <id>                 delete a node and its edges
unlink <edge-id>            delete an edge
connect <src> <dst>         connect two nodes
edge-type <kind>            default edge type (bezier|straight|step|smoothstep)
animate <on|off>            animate new edges
select <id>...              select nodes      deselect   clear selection
copy | paste | undo | redo
clear!                      remove everything (clear asks for confirmation)
save                        save now
title <text>                rename
export <png|svg|json|csv> [dir]
import <file.json>          replace the map with an exported JSON file
find <text>                 search labels and descriptions
center <id>                 select a node and center on it
zoom <in|out|fit>
key <chord>                 run a keyboard shortcut, e.g. key Ctrl+Z
list | help | quit";

fn arg<'a>(args: &[&'a str], i: usize, what: &str) -> Result<&'a str> {
    args.get(i).copied().ok_or_else(|| anyhow!("missing {}", what))
}

fn parse_shape(s: &str) -> Result<NodeShape> {
    NodeShape::parse(s).ok_or_else(|| anyhow!("unknown shape: {}", s))
}

fn parse_f64(s: &str) -> Result<f64> {
    s.parse::<f64>().map_err(|_| anyhow!("not a number: {}", s))
}

/// Parse one input line. Blank lines and `#` comments yield `None`.
pub fn parse_line(line: &str) -> Result<Option<ShellCommand>> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }
    let (head, rest) = match trimmed.split_once(char::is_whitespace) {
        Some((h, r)) => (h, r.trim()),
        None => (trimmed, ""),
    };
    let args: Vec<&str> = rest.split_whitespace().collect();
    let editor = |c: EditorCommand| -> Result<Option<ShellCommand>> { Ok(Some(ShellCommand::Editor(c))) };

    match head.to_lowercase().as_str() {
        "add" => {
            let shape = match args.first() {
                Some(s) => parse_shape(s)?,
                None => NodeShape::default(),
            };
            editor(EditorCommand::AddNode(shape))
        }
        "label" => {
            let id = arg(&args, 0, "node id")?.to_string();
            let text = rest[id.len()..].trim();
            if text.is_empty() {
                bail!("missing label text");
            }
            let (label, description) = match text.split_once('|') {
                Some((l, d)) => (l.trim().to_string(), Some(d.trim().to_string())),
                None => (text.to_string(), None),
            };
            editor(EditorCommand::UpdateLabel { id, label, description })
        }
        "color" => editor(EditorCommand::UpdateColor {
            id: arg(&args, 0, "node id")?.to_string(),
            color: arg(&args, 1, "color")?.to_string(),
        }),
        "shape" => editor(EditorCommand::UpdateShape {
            id: arg(&args, 0, "node id")?.to_string(),
            shape: parse_shape(arg(&args, 1, "shape")?)?,
        }),
        "font" => {
            let id = arg(&args, 0, "node id")?.to_string();
            let size = arg(&args, 1, "font size")?;
            let font_size = FontSize::parse(size).ok_or_else(|| anyhow!("unknown font size: {}", size))?;
            editor(EditorCommand::UpdateFontSize { id, font_size })
        }
        "move" => {
            let id = arg(&args, 0, "node id")?.to_string();
            let x = parse_f64(arg(&args, 1, "x")?)?;
            let y = parse_f64(arg(&args, 2, "y")?)?;
            editor(EditorCommand::MoveNode { id, position: Position::new(x, y) })
        }
        "delete" | "rm" => editor(EditorCommand::DeleteNode(arg(&args, 0, "node id")?.to_string())),
        "unlink" => editor(EditorCommand::DeleteEdge(arg(&args, 0, "edge id")?.to_string())),
        "connect" | "link" => editor(EditorCommand::Connect {
            source: arg(&args, 0, "source id")?.to_string(),
            target: arg(&args, 1, "target id")?.to_string(),
        }),
        "edge-type" => {
            let k = arg(&args, 0, "edge type")?;
            let kind = EdgeKind::parse(k).ok_or_else(|| anyhow!("unknown edge type: {}", k))?;
            editor(EditorCommand::SetEdgeKind(kind))
        }
        "animate" => match arg(&args, 0, "on|off")? {
            "on" | "true" => editor(EditorCommand::SetEdgeAnimated(true)),
            "off" | "false" => editor(EditorCommand::SetEdgeAnimated(false)),
            other => bail!("expected on|off, got {}", other),
        },
        "select" => {
            if args.is_empty() {
                bail!("missing node ids");
            }
            editor(EditorCommand::Select(args.iter().map(|s| s.to_string()).collect()))
        }
        "deselect" => editor(EditorCommand::ClearSelection),
        "copy" => editor(EditorCommand::Copy),
        "paste" => editor(EditorCommand::Paste),
        "undo" => editor(EditorCommand::Undo),
        "redo" => editor(EditorCommand::Redo),
        "clear" => editor(EditorCommand::Clear { confirmed: false }),
        "clear!" => editor(EditorCommand::Clear { confirmed: true }),
        "save" => editor(EditorCommand::Save),
        "title" | "rename" => {
            if rest.is_empty() {
                bail!("missing title");
            }
            editor(EditorCommand::Rename(rest.to_string()))
        }
        "export" => {
            let f = arg(&args, 0, "format")?;
            let format = ExportFormat::parse(f).ok_or_else(|| anyhow!("unknown export format: {}", f))?;
            let dir = args.get(1).map(PathBuf::from);
            editor(EditorCommand::Export { format, dir })
        }
        "import" => Ok(Some(ShellCommand::Import(PathBuf::from(arg(&args, 0, "file")?)))),
        "find" | "search" => {
            if rest.is_empty() {
                bail!("missing search text");
            }
            editor(EditorCommand::Search(rest.to_string()))
        }
        "center" => editor(EditorCommand::CenterOn(arg(&args, 0, "node id")?.to_string())),
        "zoom" => match arg(&args, 0, "in|out|fit")? {
            "in" => editor(EditorCommand::ZoomIn),
            "out" => editor(EditorCommand::ZoomOut),
            "fit" => editor(EditorCommand::FitView),
            other => bail!("expected in|out|fit, got {}", other),
        },
        "key" => {
            let chord: Shortcut = arg(&args, 0, "shortcut")?.parse()?;
            Ok(Some(ShellCommand::Key(chord)))
        }
        "list" | "ls" => Ok(Some(ShellCommand::List)),
        "help" | "?" => Ok(Some(ShellCommand::Help)),
        "quit" | "exit" => Ok(Some(ShellCommand::Quit)),
        other => Err(anyhow!("unrecognized command: {}", other)),
    }
}

pub fn format_node(node: &Node) -> String {
    let mut s = format!(
        "{} [{}] \"{}\" at ({:.0}, {:.0}) {}",
        node.id,
        node.data.shape.as_str(),
        node.data.label,
        node.position.x,
        node.position.y,
        node.data.color
    );
    if let Some(d) = &node.data.description {
        s.push_str(&format!(" - {}", d));
    }
    if node.selected {
        s.push_str(" *");
    }
    s
}

pub fn format_graph(map: &MindMap) -> String {
    let mut lines = Vec::with_capacity(map.node_count() + map.edge_count() + 1);
    lines.push(format!("{} node(s), {} edge(s)", map.node_count(), map.edge_count()));
    for n in map.nodes() {
        lines.push(format!("  {}", format_node(n)));
    }
    for e in map.edges() {
        lines.push(format!("  {}: {} -> {}", e.id, e.source, e.target));
    }
    lines.join("\n")
}

pub fn describe_outcome(outcome: &CommandOutcome) -> String {
    match outcome {
        CommandOutcome::Unchanged => "no change".to_string(),
        CommandOutcome::Changed => "ok".to_string(),
        CommandOutcome::NodeAdded(n) => format!("added {}", format_node(n)),
        CommandOutcome::EdgeAdded(e) => format!("connected {} -> {} ({})", e.source, e.target, e.id),
        CommandOutcome::Pasted(nodes) => {
            let ids: Vec<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
            format!("pasted {}", ids.join(", "))
        }
        CommandOutcome::Copied(0) => "nothing selected".to_string(),
        CommandOutcome::Copied(n) => format!("copied {} node(s)", n),
        CommandOutcome::Saved(true) => "saved".to_string(),
        CommandOutcome::Saved(false) => "save failed".to_string(),
        CommandOutcome::Exported(Some(p)) => format!("wrote {}", p.display()),
        CommandOutcome::Exported(None) => "export failed".to_string(),
        CommandOutcome::Matches(nodes) if nodes.is_empty() => "no matches".to_string(),
        CommandOutcome::Matches(nodes) => nodes.iter().map(format_node).collect::<Vec<_>>().join("\n"),
        CommandOutcome::Viewport(req) => format!(
            "view center ({:.0}, {:.0}) zoom {:.2}",
            req.center.x, req.center.y, req.zoom
        ),
        CommandOutcome::SearchRequested => "usage: find <text>".to_string(),
        CommandOutcome::NeedsConfirmation => "this removes everything; run `clear!` to confirm".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn editor_cmd(line: &str) -> EditorCommand {
        match parse_line(line) {
            Ok(Some(ShellCommand::Editor(c))) => c,
            other => panic!("unexpected parse of {:?}: {:?}", line, other),
        }
    }

    #[test]
    fn blank_and_comment_lines_are_skipped() {
        assert!(parse_line("   ").expect("ok").is_none());
        assert!(parse_line("# note").expect("ok").is_none());
    }

    #[test]
    fn label_with_description() {
        assert_eq!(
            editor_cmd("label n1 Big idea | more detail"),
            EditorCommand::UpdateLabel {
                id: "n1".into(),
                label: "Big idea".into(),
                description: Some("more detail".into()),
            }
        );
        assert!(parse_line("label n1").is_err());
    }

    #[test]
    fn parses_geometry_and_shapes() {
        assert_eq!(editor_cmd("add circle"), EditorCommand::AddNode(NodeShape::Circle));
        assert_eq!(editor_cmd("add"), EditorCommand::AddNode(NodeShape::Rectangle));
        assert_eq!(
            editor_cmd("move n1 10 -20.5"),
            EditorCommand::MoveNode { id: "n1".into(), position: Position::new(10.0, -20.5) }
        );
        assert!(parse_line("add blob").is_err());
        assert!(parse_line("move n1 x 2").is_err());
    }

    #[test]
    fn clear_needs_bang_to_confirm() {
        assert_eq!(editor_cmd("clear"), EditorCommand::Clear { confirmed: false });
        assert_eq!(editor_cmd("clear!"), EditorCommand::Clear { confirmed: true });
    }

    #[test]
    fn key_and_export() {
        assert_eq!(
            parse_line("key Ctrl+Shift+Z").expect("ok"),
            Some(ShellCommand::Key(Shortcut::primary_shift('z')))
        );
        assert_eq!(
            editor_cmd("export svg /tmp/out"),
            EditorCommand::Export { format: ExportFormat::Svg, dir: Some(PathBuf::from("/tmp/out")) }
        );
        assert!(parse_line("export gif").is_err());
        assert!(parse_line("frobnicate").is_err());
    }
}
