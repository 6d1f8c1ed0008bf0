use std::fs;
use std::io::{Read, Write};
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::graph_utils::graph::{EdgeKind, Position};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditorSettings {
    // Inactivity before an automatic save
    #[serde(default = "EditorSettings::default_autosave_delay_secs")]
    pub autosave_delay_secs: u64,
    #[serde(default = "EditorSettings::default_history_limit")]
    pub history_limit: usize,
    #[serde(default = "EditorSettings::default_paste_offset")]
    pub paste_offset: (f64, f64),
    // If None, use OS temporary directory for exports
    #[serde(default)]
    pub export_override: Option<PathBuf>,
    // If None, graphs go to the per-user state dir
    #[serde(default)]
    pub store_override: Option<PathBuf>,
    #[serde(default = "EditorSettings::default_background")]
    pub export_background: String,
    #[serde(default)]
    pub default_edge_kind: EdgeKind,
    #[serde(default)]
    pub default_edge_animated: bool,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            autosave_delay_secs: Self::default_autosave_delay_secs(),
            history_limit: Self::default_history_limit(),
            paste_offset: Self::default_paste_offset(),
            export_override: None,
            store_override: None,
            export_background: Self::default_background(),
            default_edge_kind: EdgeKind::default(),
            default_edge_animated: false,
        }
    }
}

impl EditorSettings {
    fn config_dir() -> PathBuf {
        #[cfg(target_os = "macos")]
        {
            // ~/Library/Application Support/Mind-Loom
            let home = std::env::var_os("HOME").map(PathBuf::from).unwrap_or_else(|| PathBuf::from("~"));
            return home.join("Library").join("Application Support").join("Mind-Loom");
        }
        #[cfg(target_os = "windows")]
        {
            if let Ok(appdata) = std::env::var("APPDATA") {
                return PathBuf::from(appdata).join("Mind-Loom");
            }
            return PathBuf::from("Mind-Loom");
        }
        #[cfg(all(unix, not(target_os = "macos")))]
        {
            // $XDG_CONFIG_HOME/mind-loom or ~/.config/mind-loom
            if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
                return PathBuf::from(xdg).join("mind-loom");
            }
            let home = std::env::var_os("HOME").map(PathBuf::from).unwrap_or_else(|| PathBuf::from("~"));
            return home.join(".config").join("mind-loom");
        }
    }

    fn store_default_dir() -> PathBuf {
        #[cfg(all(unix, not(target_os = "macos")))]
        {
            if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
                return PathBuf::from(xdg).join("mind-loom").join("graphs");
            }
        }
        Self::config_dir().join("graphs")
    }

    pub fn settings_path() -> PathBuf {
        Self::config_dir().join("settings.json")
    }

    pub fn load() -> anyhow::Result<Self> {
        let path = Self::settings_path();
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    pub fn load_from(path: &std::path::Path) -> anyhow::Result<Self> {
        let mut f = fs::File::open(path)?;
        let mut s = String::new();
        f.read_to_string(&mut s)?;
        let v: Self = serde_json::from_str(&s)?;
        Ok(v)
    }

    pub fn save_to(&self, path: &std::path::Path) -> anyhow::Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        let s = serde_json::to_string_pretty(self)?;
        let mut f = fs::File::create(path)?;
        f.write_all(s.as_bytes())?;
        Ok(())
    }

    pub fn autosave_delay(&self) -> Duration {
        Duration::from_secs(self.autosave_delay_secs)
    }

    pub fn paste_offset(&self) -> Position {
        Position::new(self.paste_offset.0, self.paste_offset.1)
    }

    /// Default export directory when no override is set: OS temporary directory.
    /// Example: {temp_dir}/Mind-Loom/exports
    pub fn export_default_dir() -> PathBuf {
        let mut p = std::env::temp_dir();
        p.push("Mind-Loom");
        p.push("exports");
        p
    }

    pub fn export_dir(&self) -> PathBuf {
        if let Some(p) = &self.export_override { return p.clone(); }
        Self::export_default_dir()
    }

    pub fn store_dir(&self) -> PathBuf {
        if let Some(p) = &self.store_override { return p.clone(); }
        Self::store_default_dir()
    }

    pub(crate) fn default_autosave_delay_secs() -> u64 { 30 }
    pub(crate) fn default_history_limit() -> usize { 50 }
    pub(crate) fn default_paste_offset() -> (f64, f64) { (50.0, 50.0) }
    pub(crate) fn default_background() -> String { "#ffffff".to_string() }
}
