pub mod clipboard;
pub mod graph;
pub mod history;
pub mod search;
pub mod viewport;
