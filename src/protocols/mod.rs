//! Collaborator layer - the boundaries between the shell core and the outside.
//!
//! This module provides:
//! - `UpdateSource` trait: orchestrator → update provider boundary
//! - `ShellPresenter` trait: shell → dialog surface boundary
//! - `SaveFileHandler` trait: shell → layout persistence boundary, with a JSON
//!   file implementation
//! - `manifest`: an `UpdateSource` backed by a local JSON manifest

pub mod manifest;
pub mod presenter;
pub mod save_file;
pub mod update_source;

pub use presenter::{LogPresenter, ShellPresenter};
pub use save_file::{DashboardData, JsonSaveFile, SaveFileHandler};
pub use update_source::UpdateSource;
