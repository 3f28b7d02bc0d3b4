//! API types shared between the visible-state owner and background workers.
//!
//! This module defines stable types for presenters, update sources and
//! plugin loaders, isolating orchestration details from them.

pub mod types;
