//! Runtime modules for the dashboard core.
//!
//! The runtime domain handles workspaces and their tiles, the plugin sweep,
//! the update workflow and the channels that carry background results into
//! the visible-state context.

pub mod progress;
pub mod sweeper;
pub mod ui_queue;
pub mod updater;
pub mod workspace;
pub mod workspace_manager;
