pub mod autosave;
pub mod settings;
pub mod store;
