//! The editing session: one open mind map bound to a store and a notifier.
//!
//! Commands mutate the [`MindMap`], push a history snapshot and mark the
//! save tracker dirty. Store failures stop here and become notices; they
//! never reach the graph or the caller as errors.

pub mod command;
pub mod keymap;
pub mod notify;

use std::path::{Path, PathBuf};
use std::time::Instant;

use log::{debug, info, warn};

use crate::export::{self, ExportFormat};
use crate::graph_utils::clipboard::Clipboard;
use crate::graph_utils::graph::{Edge, EdgeKind, FontSize, MindMap, Node, NodeShape, Position};
use crate::graph_utils::history::{HistoryStack, Snapshot};
use crate::graph_utils::search;
use crate::graph_utils::viewport::{Viewport, ViewportRequest};
use crate::persistence::autosave::{SaveState, SaveTicket, SaveTracker, SaveTrigger};
use crate::persistence::settings::EditorSettings;
use crate::persistence::store::{now_rfc3339, GraphStore, StoreError, StoredGraph};

use command::{CommandOutcome, EditorCommand};
use keymap::Shortcut;
use notify::{NoticeKind, Notifier};

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("mind map {0} not found")]
    NotFound(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Read-only state the host UI renders from.
#[derive(Debug, Clone, Copy)]
pub struct SessionView<'a> {
    pub nodes: &'a [Node],
    pub edges: &'a [Edge],
    pub title: &'a str,
    pub dirty: bool,
    pub save_state: SaveState,
    pub can_undo: bool,
    pub can_redo: bool,
    pub can_paste: bool,
}

pub struct EditorSession<S: GraphStore, N: Notifier> {
    graph_id: String,
    title: String,
    graph: MindMap,
    history: HistoryStack,
    clipboard: Clipboard,
    tracker: SaveTracker,
    viewport: Viewport,
    settings: EditorSettings,
    store: S,
    notifier: N,
}

impl<S: GraphStore, N: Notifier> EditorSession<S, N> {
    /// Start an empty, clean session for a graph that has not been saved yet.
    pub fn new(store: S, notifier: N, settings: EditorSettings, graph_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self::with_graph(store, notifier, settings, graph_id, title, MindMap::new())
    }

    /// Like [`EditorSession::new`] with a caller-supplied graph (seeded in tests).
    pub fn with_graph(
        store: S,
        notifier: N,
        settings: EditorSettings,
        graph_id: impl Into<String>,
        title: impl Into<String>,
        mut graph: MindMap,
    ) -> Self {
        graph.set_default_edge_kind(settings.default_edge_kind);
        graph.set_default_edge_animated(settings.default_edge_animated);
        let mut history = HistoryStack::new(settings.history_limit);
        history.reset(graph.nodes(), graph.edges());
        Self {
            graph_id: graph_id.into(),
            title: title.into(),
            graph,
            history,
            clipboard: Clipboard::new(),
            tracker: SaveTracker::new(settings.autosave_delay()),
            viewport: Viewport::default(),
            settings,
            store,
            notifier,
        }
    }

    /// Load `graph_id` from the store. A missing graph is reported through
    /// the notifier and returned as [`SessionError::NotFound`] so the host
    /// can navigate away.
    pub async fn open(store: S, notifier: N, settings: EditorSettings, graph_id: impl Into<String>) -> Result<Self, SessionError> {
        let graph_id = graph_id.into();
        let loaded = store.load_graph(&graph_id).await;
        match loaded {
            Ok(doc) => {
                info!("loaded mind map {} ({} nodes, {} edges)", graph_id, doc.nodes.len(), doc.edges.len());
                let mut session = Self::new(store, notifier, settings, graph_id, doc.title.clone());
                session.hydrate(doc);
                Ok(session)
            }
            Err(StoreError::NotFound(_)) => {
                notifier.notify(NoticeKind::Error, "Mind map not found");
                Err(SessionError::NotFound(graph_id))
            }
            Err(e) => {
                notifier.notify(NoticeKind::Error, &format!("Failed to load mind map: {}", e));
                Err(e.into())
            }
        }
    }

    /// Re-read the graph from the store, dropping local edits and history.
    pub async fn reload(&mut self) -> Result<(), SessionError> {
        let loaded = self.store.load_graph(&self.graph_id).await;
        match loaded {
            Ok(doc) => {
                self.hydrate(doc);
                Ok(())
            }
            Err(StoreError::NotFound(_)) => {
                self.notifier.notify(NoticeKind::Error, "Mind map not found");
                Err(SessionError::NotFound(self.graph_id.clone()))
            }
            Err(e) => {
                self.notifier.notify(NoticeKind::Error, &format!("Failed to load mind map: {}", e));
                Err(e.into())
            }
        }
    }

    fn hydrate(&mut self, doc: StoredGraph) {
        self.title = doc.title;
        self.graph.replace(doc.nodes, doc.edges);
        self.history.reset(self.graph.nodes(), self.graph.edges());
        self.tracker.reset_clean();
    }

    // Accessors
    pub fn graph_id(&self) -> &str { &self.graph_id }
    pub fn title(&self) -> &str { &self.title }
    pub fn graph(&self) -> &MindMap { &self.graph }
    pub fn history(&self) -> &HistoryStack { &self.history }
    pub fn clipboard(&self) -> &Clipboard { &self.clipboard }
    pub fn viewport(&self) -> &Viewport { &self.viewport }
    pub fn settings(&self) -> &EditorSettings { &self.settings }
    pub fn store(&self) -> &S { &self.store }
    pub fn notifier(&self) -> &N { &self.notifier }
    pub fn save_state(&self) -> SaveState { self.tracker.state() }
    pub fn is_dirty(&self) -> bool { self.tracker.is_dirty() }
    pub fn autosave_deadline(&self) -> Option<Instant> { self.tracker.deadline() }

    pub fn view(&self) -> SessionView<'_> {
        SessionView {
            nodes: self.graph.nodes(),
            edges: self.graph.edges(),
            title: &self.title,
            dirty: self.tracker.is_dirty(),
            save_state: self.tracker.state(),
            can_undo: self.history.can_undo(),
            can_redo: self.history.can_redo(),
            can_paste: self.clipboard.has_content(),
        }
    }

    // Every discrete document change ends here
    fn commit(&mut self) {
        self.history.push(Snapshot::of(&self.graph));
        self.tracker.mark_dirty(Instant::now());
    }

    fn commit_if(&mut self, changed: bool) -> bool {
        if changed {
            self.commit();
        }
        changed
    }

    // Graph commands
    pub fn add_node(&mut self, shape: NodeShape) -> Node {
        let node = self.graph.add_node(shape);
        self.commit();
        node
    }

    pub fn update_node_label(&mut self, id: &str, label: impl Into<String>, description: Option<String>) -> bool {
        let changed = self.graph.update_node_label(id, label, description);
        self.commit_if(changed)
    }

    pub fn update_node_color(&mut self, id: &str, color: impl Into<String>) -> bool {
        let changed = self.graph.update_node_color(id, color);
        self.commit_if(changed)
    }

    pub fn update_node_shape(&mut self, id: &str, shape: NodeShape) -> bool {
        let changed = self.graph.update_node_shape(id, shape);
        self.commit_if(changed)
    }

    pub fn update_node_font_size(&mut self, id: &str, font_size: FontSize) -> bool {
        let changed = self.graph.update_node_font_size(id, font_size);
        self.commit_if(changed)
    }

    // Called once at drag end, not per pointer move
    pub fn move_node(&mut self, id: &str, position: Position) -> bool {
        let changed = self.graph.move_node(id, position);
        self.commit_if(changed)
    }

    pub fn delete_node(&mut self, id: &str) -> bool {
        let changed = self.graph.delete_node(id);
        self.commit_if(changed)
    }

    pub fn delete_edge(&mut self, id: &str) -> bool {
        let changed = self.graph.delete_edge(id);
        self.commit_if(changed)
    }

    pub fn connect(&mut self, source: &str, target: &str) -> Option<Edge> {
        let edge = self.graph.connect(source, target)?;
        self.commit();
        Some(edge)
    }

    pub fn set_default_edge_kind(&mut self, kind: EdgeKind) {
        self.graph.set_default_edge_kind(kind);
    }

    pub fn set_default_edge_animated(&mut self, animated: bool) {
        self.graph.set_default_edge_animated(animated);
    }

    /// Remove every node and edge. Hosts must have confirmed with the user.
    pub fn clear(&mut self) {
        if self.graph.is_empty() {
            return;
        }
        self.graph.clear();
        self.commit();
    }

    // History
    pub fn undo(&mut self) -> bool {
        let Some(snapshot) = self.history.undo() else { return false };
        self.graph.replace(snapshot.nodes, snapshot.edges);
        self.tracker.mark_dirty(Instant::now());
        true
    }

    pub fn redo(&mut self) -> bool {
        let Some(snapshot) = self.history.redo() else { return false };
        self.graph.replace(snapshot.nodes, snapshot.edges);
        self.tracker.mark_dirty(Instant::now());
        true
    }

    pub fn can_undo(&self) -> bool { self.history.can_undo() }
    pub fn can_redo(&self) -> bool { self.history.can_redo() }

    // Selection and clipboard
    pub fn select(&mut self, ids: &[String]) -> usize {
        self.graph.set_selected(ids)
    }

    pub fn clear_selection(&mut self) {
        self.graph.clear_selection();
    }

    pub fn copy(&mut self) -> usize {
        let count = self.clipboard.copy_selection(self.graph.nodes());
        if count > 0 {
            self.notifier.notify(NoticeKind::Success, &format!("{} node(s) copied", count));
        }
        count
    }

    pub fn paste(&mut self) -> Vec<Node> {
        let pasted = self.clipboard.paste(self.settings.paste_offset());
        if pasted.is_empty() {
            return pasted;
        }
        self.graph.insert_nodes(pasted.iter().cloned());
        self.commit();
        self.notifier.notify(NoticeKind::Success, &format!("{} node(s) pasted", pasted.len()));
        pasted
    }

    // Search and navigation
    pub fn search(&self, query: &str) -> Vec<Node> {
        search::search(query, self.graph.nodes()).into_iter().cloned().collect()
    }

    pub fn select_and_center(&mut self, id: &str) -> Option<ViewportRequest> {
        if !self.graph.select_only(id) {
            return None;
        }
        let position = self.graph.get_node(id)?.position;
        Some(self.viewport.center_on(position))
    }

    pub fn zoom_in(&mut self) -> ViewportRequest { self.viewport.zoom_in() }
    pub fn zoom_out(&mut self) -> ViewportRequest { self.viewport.zoom_out() }

    pub fn fit_view(&mut self) -> ViewportRequest {
        self.viewport.fit(self.graph.nodes())
    }

    // Persistence

    /// Take the current document for writing. `None` when a save is already
    /// in flight (the request is queued) or an auto-save has nothing to do.
    pub fn begin_save(&mut self, trigger: SaveTrigger) -> Option<(SaveTicket, StoredGraph)> {
        let ticket = self.tracker.begin(trigger)?;
        let payload = StoredGraph::new(self.title.clone(), self.graph.nodes().to_vec(), self.graph.edges().to_vec()).stamped();
        debug!("saving {} at revision {} ({:?})", self.graph_id, ticket.revision, trigger);
        Some((ticket, payload))
    }

    /// Apply the outcome of a write started with [`EditorSession::begin_save`].
    /// Returns a queued follow-up trigger the caller should run next.
    pub fn finish_save(
        &mut self,
        ticket: SaveTicket,
        payload: &StoredGraph,
        result: Result<(), StoreError>,
        now: Instant,
    ) -> Option<SaveTrigger> {
        let ok = result.is_ok();
        match (&result, ticket.trigger) {
            (Ok(()), SaveTrigger::Manual) => {
                info!("saved {}", self.graph_id);
                self.notifier.notify(NoticeKind::Success, "Mind map saved");
            }
            (Ok(()), SaveTrigger::Auto) => info!("auto-saved {}", self.graph_id),
            (Err(e), SaveTrigger::Manual) => {
                log::error!("save of {} failed: {}", self.graph_id, e);
                self.notifier.notify(NoticeKind::Error, &format!("Failed to save: {}", e));
            }
            (Err(e), SaveTrigger::Auto) => warn!("auto-save of {} failed: {}", self.graph_id, e),
        }
        if ok {
            // saved state becomes an undo checkpoint unless it already is one
            let snapshot = Snapshot::new(&payload.nodes, &payload.edges);
            if self.history.current() != Some(&snapshot) && snapshot == Snapshot::of(&self.graph) {
                self.history.push(snapshot);
            }
        }
        self.tracker.complete(ticket, ok, now)
    }

    async fn run_save(&mut self, trigger: SaveTrigger, now: Instant) -> bool {
        let mut trigger = trigger;
        let mut ok = false;
        loop {
            let Some((ticket, payload)) = self.begin_save(trigger) else { return ok };
            let result = self.store.save_graph(&self.graph_id, &payload).await;
            ok = result.is_ok();
            match self.finish_save(ticket, &payload, result, now) {
                Some(next) => trigger = next,
                None => return ok,
            }
        }
    }

    /// Explicit save; cancels the pending auto-save deadline.
    pub async fn save(&mut self) -> bool {
        self.run_save(SaveTrigger::Manual, Instant::now()).await
    }

    /// Drive the auto-save timer. Hosts call this from their event loop.
    pub async fn tick(&mut self, now: Instant) -> bool {
        if !self.tracker.is_due(now) {
            return false;
        }
        self.run_save(SaveTrigger::Auto, now).await
    }

    /// Rename the graph. Titles of graphs never saved travel with the next save.
    pub async fn rename(&mut self, title: &str) -> bool {
        let title = title.trim();
        if title.is_empty() || title == self.title {
            return false;
        }
        let previous = std::mem::replace(&mut self.title, title.to_string());
        match self.store.update_title(&self.graph_id, title).await {
            Ok(()) => {
                self.notifier.notify(NoticeKind::Success, "Title updated");
                true
            }
            Err(StoreError::NotFound(_)) => {
                self.tracker.mark_dirty(Instant::now());
                true
            }
            Err(e) => {
                // keep the title the store still holds
                self.title = previous;
                self.notifier.notify(NoticeKind::Error, &format!("Failed to update title: {}", e));
                false
            }
        }
    }

    /// Flush pending edits before the session goes away.
    pub async fn close(mut self) -> bool {
        if !self.tracker.is_dirty() {
            return true;
        }
        self.run_save(SaveTrigger::Auto, Instant::now()).await
    }

    // Export / import

    /// Write one export; each format reports its own notice and never
    /// touches the document.
    pub fn export(&self, format: ExportFormat, dir: Option<&Path>) -> Option<PathBuf> {
        let dir = dir.map(Path::to_path_buf).unwrap_or_else(|| self.settings.export_dir());
        let result = export::export_to_dir(
            format,
            &self.title,
            self.graph.nodes(),
            self.graph.edges(),
            &self.settings.export_background,
            &now_rfc3339(),
            &dir,
        );
        match result {
            Ok(path) => {
                info!("exported {} to {}", format.label(), path.display());
                self.notifier.notify(NoticeKind::Success, &format!("{} exported to {}", format.label(), path.display()));
                Some(path)
            }
            Err(e) => {
                log::error!("{} export failed: {}", format.label(), e);
                self.notifier.notify(NoticeKind::Error, &format!("{} export failed: {}", format.label(), e));
                None
            }
        }
    }

    /// Replace the document with a JSON export. Undoable as one step.
    pub fn import_json(&mut self, text: &str) -> bool {
        match export::import_json(text) {
            Ok(doc) => {
                self.graph.replace(doc.nodes, doc.edges);
                self.commit();
                self.notifier.notify(NoticeKind::Success, &format!("Imported {} node(s)", self.graph.node_count()));
                true
            }
            Err(e) => {
                self.notifier.notify(NoticeKind::Error, &format!("Import failed: {}", e));
                false
            }
        }
    }

    // Command dispatch shared by toolbar and keyboard

    pub async fn execute(&mut self, cmd: EditorCommand) -> CommandOutcome {
        let changed = |b: bool| if b { CommandOutcome::Changed } else { CommandOutcome::Unchanged };
        match cmd {
            EditorCommand::AddNode(shape) => CommandOutcome::NodeAdded(self.add_node(shape)),
            EditorCommand::UpdateLabel { id, label, description } => changed(self.update_node_label(&id, label, description)),
            EditorCommand::UpdateColor { id, color } => changed(self.update_node_color(&id, color)),
            EditorCommand::UpdateShape { id, shape } => changed(self.update_node_shape(&id, shape)),
            EditorCommand::UpdateFontSize { id, font_size } => changed(self.update_node_font_size(&id, font_size)),
            EditorCommand::MoveNode { id, position } => changed(self.move_node(&id, position)),
            EditorCommand::DeleteNode(id) => changed(self.delete_node(&id)),
            EditorCommand::DeleteEdge(id) => changed(self.delete_edge(&id)),
            EditorCommand::Connect { source, target } => match self.connect(&source, &target) {
                Some(edge) => CommandOutcome::EdgeAdded(edge),
                None => CommandOutcome::Unchanged,
            },
            EditorCommand::SetEdgeKind(kind) => {
                self.set_default_edge_kind(kind);
                CommandOutcome::Unchanged
            }
            EditorCommand::SetEdgeAnimated(animated) => {
                self.set_default_edge_animated(animated);
                CommandOutcome::Unchanged
            }
            EditorCommand::Select(ids) => {
                self.select(&ids);
                CommandOutcome::Unchanged
            }
            EditorCommand::ClearSelection => {
                self.clear_selection();
                CommandOutcome::Unchanged
            }
            EditorCommand::Undo => changed(self.undo()),
            EditorCommand::Redo => changed(self.redo()),
            EditorCommand::Copy => CommandOutcome::Copied(self.copy()),
            EditorCommand::Paste => {
                let pasted = self.paste();
                if pasted.is_empty() { CommandOutcome::Unchanged } else { CommandOutcome::Pasted(pasted) }
            }
            EditorCommand::Clear { confirmed: false } => CommandOutcome::NeedsConfirmation,
            EditorCommand::Clear { confirmed: true } => {
                let had_content = !self.graph.is_empty();
                self.clear();
                changed(had_content)
            }
            EditorCommand::Save => CommandOutcome::Saved(self.save().await),
            EditorCommand::Rename(title) => changed(self.rename(&title).await),
            EditorCommand::Export { format, dir } => CommandOutcome::Exported(self.export(format, dir.as_deref())),
            EditorCommand::ImportJson(text) => changed(self.import_json(&text)),
            EditorCommand::OpenSearch => CommandOutcome::SearchRequested,
            EditorCommand::Search(query) => CommandOutcome::Matches(self.search(&query)),
            EditorCommand::CenterOn(id) => match self.select_and_center(&id) {
                Some(req) => CommandOutcome::Viewport(req),
                None => CommandOutcome::Unchanged,
            },
            EditorCommand::ZoomIn => CommandOutcome::Viewport(self.zoom_in()),
            EditorCommand::ZoomOut => CommandOutcome::Viewport(self.zoom_out()),
            EditorCommand::FitView => CommandOutcome::Viewport(self.fit_view()),
        }
    }

    /// Keyboard entry point; unbound chords return `None`.
    pub async fn handle_shortcut(&mut self, shortcut: &Shortcut) -> Option<CommandOutcome> {
        let cmd = keymap::command_for(shortcut)?;
        Some(self.execute(cmd).await)
    }
}
