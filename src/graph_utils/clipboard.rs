use super::graph::{mint_id, Node, Position};

pub const DEFAULT_PASTE_OFFSET: Position = Position { x: 50.0, y: 50.0 };

/// Session-scoped copy buffer. Holds node snapshots only; edges between
/// copied nodes are not carried over.
#[derive(Clone, Debug, Default)]
pub struct Clipboard {
    buffer: Vec<Node>,
}

impl Clipboard {
    pub fn new() -> Self { Self::default() }

    /// Copy the selected nodes. An empty selection leaves the previous
    /// buffer in place and returns 0.
    pub fn copy_selection(&mut self, nodes: &[Node]) -> usize {
        let copied: Vec<Node> = nodes.iter().filter(|n| n.selected).cloned().collect();
        if copied.is_empty() {
            return 0;
        }
        self.buffer = copied;
        self.buffer.len()
    }

    /// Fresh copies of the buffer: new ids, shifted by `offset`, unselected.
    /// The buffer itself is kept for repeated pastes.
    pub fn paste(&self, offset: Position) -> Vec<Node> {
        self.buffer
            .iter()
            .map(|src| Node {
                id: mint_id("node"),
                position: src.position.offset(offset.x, offset.y),
                data: src.data.clone(),
                selected: false,
            })
            .collect()
    }

    pub fn has_content(&self) -> bool { !self.buffer.is_empty() }
    pub fn len(&self) -> usize { self.buffer.len() }
    pub fn is_empty(&self) -> bool { self.buffer.is_empty() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph_utils::graph::{MindMap, NodeShape};

    #[test]
    fn empty_selection_keeps_buffer() {
        let mut map = MindMap::with_seed(9);
        let a = map.add_node(NodeShape::Rectangle);
        map.select_only(&a.id);
        let mut clip = Clipboard::new();
        assert_eq!(clip.copy_selection(map.nodes()), 1);
        map.clear_selection();
        assert_eq!(clip.copy_selection(map.nodes()), 0);
        assert_eq!(clip.len(), 1);
    }

    #[test]
    fn paste_mints_ids_and_offsets() {
        let mut map = MindMap::with_seed(9);
        let a = map.add_node(NodeShape::Diamond);
        map.select_only(&a.id);
        let mut clip = Clipboard::new();
        clip.copy_selection(map.nodes());
        let pasted = clip.paste(DEFAULT_PASTE_OFFSET);
        assert_eq!(pasted.len(), 1);
        let p = &pasted[0];
        assert_ne!(p.id, a.id);
        assert!(!p.selected);
        assert_eq!(p.position, a.position.offset(50.0, 50.0));
        assert_eq!(p.data, a.data);
        // paste does not drain the buffer
        assert!(clip.has_content());
    }
}
