use std::collections::VecDeque;

use super::graph::{Edge, MindMap, Node};

pub const DEFAULT_HISTORY_LIMIT: usize = 50;

/// Immutable copy of a graph at one point in time. Selection flags are
/// cleared on capture so undo never resurrects a stale selection.
#[derive(Clone, Debug, PartialEq)]
pub struct Snapshot {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

impl Snapshot {
    pub fn new(nodes: &[Node], edges: &[Edge]) -> Self {
        let nodes = nodes
            .iter()
            .cloned()
            .map(|mut n| {
                n.selected = false;
                n
            })
            .collect();
        Self { nodes, edges: edges.to_vec() }
    }

    pub fn of(map: &MindMap) -> Self {
        Self::new(map.nodes(), map.edges())
    }
}

/// Linear undo/redo over bounded snapshots.
///
/// The cursor always points at the entry matching the live graph. Pushing
/// while the cursor is behind the tail drops the redo branch; pushing past
/// the limit evicts the oldest entry.
#[derive(Clone, Debug)]
pub struct HistoryStack {
    entries: VecDeque<Snapshot>,
    cursor: usize,
    limit: usize,
}

impl Default for HistoryStack {
    fn default() -> Self { Self::new(DEFAULT_HISTORY_LIMIT) }
}

impl HistoryStack {
    pub fn new(limit: usize) -> Self {
        Self { entries: VecDeque::new(), cursor: 0, limit: limit.max(1) }
    }

    pub fn push_state(&mut self, nodes: &[Node], edges: &[Edge]) {
        self.push(Snapshot::new(nodes, edges));
    }

    pub fn push(&mut self, snapshot: Snapshot) {
        if !self.entries.is_empty() {
            self.entries.truncate(self.cursor + 1);
        }
        self.entries.push_back(snapshot);
        while self.entries.len() > self.limit {
            self.entries.pop_front();
        }
        self.cursor = self.entries.len() - 1;
    }

    pub fn undo(&mut self) -> Option<Snapshot> {
        if !self.can_undo() {
            return None;
        }
        self.cursor -= 1;
        self.entries.get(self.cursor).cloned()
    }

    pub fn redo(&mut self) -> Option<Snapshot> {
        if !self.can_redo() {
            return None;
        }
        self.cursor += 1;
        self.entries.get(self.cursor).cloned()
    }

    // Loaded state becomes the floor: nothing before it is reachable
    pub fn reset(&mut self, nodes: &[Node], edges: &[Edge]) {
        self.entries.clear();
        self.entries.push_back(Snapshot::new(nodes, edges));
        self.cursor = 0;
    }

    pub fn can_undo(&self) -> bool { self.cursor > 0 }

    pub fn can_redo(&self) -> bool { self.cursor + 1 < self.entries.len() }

    pub fn current(&self) -> Option<&Snapshot> { self.entries.get(self.cursor) }

    pub fn cursor(&self) -> usize { self.cursor }
    pub fn len(&self) -> usize { self.entries.len() }
    pub fn is_empty(&self) -> bool { self.entries.is_empty() }
    pub fn limit(&self) -> usize { self.limit }
}
