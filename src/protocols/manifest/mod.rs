//! Local manifest update source.
//!
//! Reads a JSON release manifest and copies the artifact it names, which is
//! enough for side-loaded installs and for exercising the update workflow
//! end to end.

mod source;

pub use source::{ManifestUpdateSource, UpdateManifest};
