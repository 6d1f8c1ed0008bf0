//! Mind-Loom: the editing core of a mind-map editor.
//!
//! A [`session::EditorSession`] owns one [`graph_utils::graph::MindMap`] with
//! its undo history and clipboard, saves it through an injected
//! [`persistence::store::GraphStore`] on demand or after inactivity, and
//! exports it as PNG, SVG, JSON or CSV.

pub mod export;
pub mod graph_utils;
pub mod persistence;
pub mod session;
pub mod shell;
