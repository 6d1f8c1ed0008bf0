use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use ron::ser::PrettyConfig;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::graph_utils::graph::{Edge, Node};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("graph {0} not found")]
    NotFound(String),
    #[error("write rejected: {0}")]
    Write(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialize(String),
}

/// Plain remote representation of one mind map. Transient node fields are
/// not part of it (`selected` is skipped by serde).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StoredGraph {
    pub title: String,
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    #[serde(default, rename = "updatedAt", skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl StoredGraph {
    pub fn new(title: impl Into<String>, nodes: Vec<Node>, edges: Vec<Edge>) -> Self {
        let nodes = nodes
            .into_iter()
            .map(|mut n| {
                n.selected = false;
                n
            })
            .collect();
        Self { title: title.into(), nodes, edges, updated_at: None }
    }

    pub fn stamped(mut self) -> Self {
        self.updated_at = Some(now_rfc3339());
        self
    }
}

pub fn now_rfc3339() -> String {
    OffsetDateTime::now_utc().format(&Rfc3339).unwrap_or_else(|_| "unknown".to_string())
}

/// Where graphs live. The editing session only talks to this trait, so tests
/// and the shell can swap in memory- or file-backed stores.
#[allow(async_fn_in_trait)]
pub trait GraphStore {
    async fn load_graph(&self, id: &str) -> Result<StoredGraph, StoreError>;
    async fn save_graph(&self, id: &str, graph: &StoredGraph) -> Result<(), StoreError>;
    async fn update_title(&self, id: &str, title: &str) -> Result<(), StoreError>;
}

impl<T: GraphStore> GraphStore for Arc<T> {
    async fn load_graph(&self, id: &str) -> Result<StoredGraph, StoreError> {
        (**self).load_graph(id).await
    }

    async fn save_graph(&self, id: &str, graph: &StoredGraph) -> Result<(), StoreError> {
        (**self).save_graph(id, graph).await
    }

    async fn update_title(&self, id: &str, title: &str) -> Result<(), StoreError> {
        (**self).update_title(id, title).await
    }
}

// In-process store, handy for tests and scratch sessions
#[derive(Debug, Default)]
pub struct MemoryGraphStore {
    graphs: Mutex<HashMap<String, StoredGraph>>,
}

impl MemoryGraphStore {
    pub fn new() -> Self { Self::default() }

    pub fn insert(&self, id: impl Into<String>, graph: StoredGraph) {
        if let Ok(mut graphs) = self.graphs.lock() {
            graphs.insert(id.into(), graph);
        }
    }

    pub fn get(&self, id: &str) -> Option<StoredGraph> {
        self.graphs.lock().ok().and_then(|g| g.get(id).cloned())
    }

    pub fn len(&self) -> usize {
        self.graphs.lock().map(|g| g.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool { self.len() == 0 }
}

fn poisoned() -> StoreError {
    StoreError::Write("store lock poisoned".to_string())
}

impl GraphStore for MemoryGraphStore {
    async fn load_graph(&self, id: &str) -> Result<StoredGraph, StoreError> {
        let graphs = self.graphs.lock().map_err(|_| poisoned())?;
        graphs.get(id).cloned().ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn save_graph(&self, id: &str, graph: &StoredGraph) -> Result<(), StoreError> {
        let mut graphs = self.graphs.lock().map_err(|_| poisoned())?;
        graphs.insert(id.to_string(), graph.clone());
        Ok(())
    }

    async fn update_title(&self, id: &str, title: &str) -> Result<(), StoreError> {
        let mut graphs = self.graphs.lock().map_err(|_| poisoned())?;
        let graph = graphs.get_mut(id).ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        graph.title = title.to_string();
        Ok(())
    }
}

/// One RON file per graph under a directory, written atomically.
#[derive(Debug, Clone)]
pub struct FileGraphStore {
    dir: PathBuf,
}

impl FileGraphStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path { &self.dir }

    pub fn path_for(&self, id: &str) -> PathBuf {
        // keep ids from escaping the store directory
        let safe: String = id
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.dir.join(format!("{}.ron", safe))
    }

    pub async fn list_ids(&self) -> anyhow::Result<Vec<String>> {
        let mut ids = Vec::new();
        if !tokio::fs::try_exists(&self.dir).await? {
            return Ok(ids);
        }
        let mut rd = tokio::fs::read_dir(&self.dir).await?;
        while let Some(entry) = rd.next_entry().await? {
            let p = entry.path();
            if p.extension().and_then(|e| e.to_str()) == Some("ron")
                && let Some(stem) = p.file_stem().and_then(|s| s.to_str())
            {
                ids.push(stem.to_string());
            }
        }
        ids.sort();
        Ok(ids)
    }

    async fn read(&self, id: &str) -> Result<StoredGraph, StoreError> {
        let path = self.path_for(id);
        let buf = match tokio::fs::read_to_string(&path).await {
            Ok(buf) => buf,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound(id.to_string()));
            }
            Err(e) => return Err(e.into()),
        };
        ron::from_str(&buf).map_err(|e| StoreError::Serialize(e.to_string()))
    }

    async fn write(&self, id: &str, graph: &StoredGraph) -> Result<(), StoreError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let pretty = PrettyConfig::new().separate_tuple_members(true);
        let s = ron::ser::to_string_pretty(graph, pretty).map_err(|e| StoreError::Serialize(e.to_string()))?;
        atomic_write(&self.path_for(id), s.as_bytes()).await?;
        Ok(())
    }
}

async fn atomic_write(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let tmp_path = path.with_extension("ron.tmp");
    tokio::fs::write(&tmp_path, data).await?;
    tokio::fs::rename(tmp_path, path).await?;
    Ok(())
}

impl GraphStore for FileGraphStore {
    async fn load_graph(&self, id: &str) -> Result<StoredGraph, StoreError> {
        self.read(id).await
    }

    async fn save_graph(&self, id: &str, graph: &StoredGraph) -> Result<(), StoreError> {
        self.write(id, graph).await
    }

    async fn update_title(&self, id: &str, title: &str) -> Result<(), StoreError> {
        let mut graph = self.read(id).await?;
        graph.title = title.to_string();
        self.write(id, &graph).await
    }
}
