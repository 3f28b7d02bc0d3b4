//! SaveFileHandler trait: shell → layout persistence boundary.
//!
//! The on-disk format belongs to the implementation; the shell only hands
//! over and receives `DashboardData`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::api::types::ShellError;
use crate::runtime::workspace::Workspace;

/// Everything needed to restore a dashboard layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardData {
    /// Position of the split between the side drawer and the tabs (0.0 - 1.0)
    pub divider_position: f64,
    /// Open workspaces in tab order
    pub workspaces: Vec<Workspace>,
}

/// Layout persistence collaborator.
pub trait SaveFileHandler {
    /// Save to the current file, asking for one if none is set.
    fn save(&mut self, data: &DashboardData) -> Result<(), ShellError>;

    /// Ask for a new file and save to it.
    fn save_as(&mut self, data: &DashboardData) -> Result<(), ShellError>;

    /// Load a layout. `Ok(None)` means the user cancelled.
    fn load(&mut self) -> Result<Option<DashboardData>, ShellError>;

    /// Forget the current file.
    fn clear(&mut self);
}

/// `SaveFileHandler` writing pretty JSON files into a layouts directory.
///
/// `save_as` always starts a new file; `save` reuses the current one.
#[derive(Debug)]
pub struct JsonSaveFile {
    dir: PathBuf,
    current: Option<PathBuf>,
}

impl JsonSaveFile {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            current: None,
        }
    }

    /// Continue working on an existing layout file.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        Self {
            dir,
            current: Some(path),
        }
    }

    pub fn current_path(&self) -> Option<&Path> {
        self.current.as_deref()
    }

    fn write(&self, path: &Path, data: &DashboardData) -> Result<(), ShellError> {
        std::fs::create_dir_all(&self.dir).map_err(|e| ShellError::IoError {
            message: format!("Failed to create layouts directory: {e}"),
        })?;
        let json = serde_json::to_string_pretty(data).map_err(|e| ShellError::IoError {
            message: format!("Failed to serialize layout: {e}"),
        })?;
        std::fs::write(path, json).map_err(|e| ShellError::IoError {
            message: format!("Failed to write layout '{}': {e}", path.display()),
        })?;
        log::info!(
            "Layout saved: path={}, workspaces={}",
            path.display(),
            data.workspaces.len()
        );
        Ok(())
    }
}

impl SaveFileHandler for JsonSaveFile {
    fn save(&mut self, data: &DashboardData) -> Result<(), ShellError> {
        match self.current.clone() {
            Some(path) => self.write(&path, data),
            None => self.save_as(data),
        }
    }

    fn save_as(&mut self, data: &DashboardData) -> Result<(), ShellError> {
        let path = self
            .dir
            .join(format!("layout-{}.json", uuid::Uuid::new_v4()));
        self.write(&path, data)?;
        self.current = Some(path);
        Ok(())
    }

    fn load(&mut self) -> Result<Option<DashboardData>, ShellError> {
        let Some(path) = self.current.as_ref() else {
            log::debug!("No layout file selected, nothing to load");
            return Ok(None);
        };
        let content = std::fs::read_to_string(path).map_err(|e| ShellError::IoError {
            message: format!("Failed to read layout '{}': {e}", path.display()),
        })?;
        let data = serde_json::from_str(&content).map_err(|e| ShellError::InvalidInput {
            message: format!("Invalid layout file '{}': {e}", path.display()),
        })?;
        Ok(Some(data))
    }

    fn clear(&mut self) {
        self.current = None;
    }
}
