//! Plugin management domain.
//!
//! Tracks which plugin instances are known and loaded, and turns the
//! loaded → unloaded transition into a one-shot sweep request.

pub mod registry;
pub mod watcher;
