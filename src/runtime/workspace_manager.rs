//! WorkspaceManager - the ordered collection of open workspace tabs.
//!
//! Owned by the visible-state context and mutated only through `&mut self`,
//! so no locking is involved.

use crate::api::types::{ComponentName, ShellError, TileId, WorkspaceId};
use crate::runtime::workspace::Workspace;

/// Title used when a new layout has no tab templates.
pub const PLACEHOLDER_TAB_TITLE: &str = "Tab 1";

/// Ordered collection of open workspaces plus the selected tab.
#[derive(Debug, Default)]
pub struct WorkspaceManager {
    /// Workspaces in tab order
    workspaces: Vec<Workspace>,
    /// Index of the selected tab
    selected: Option<usize>,
}

impl WorkspaceManager {
    /// Creates an empty WorkspaceManager.
    pub fn new() -> Self {
        log::debug!("Initializing WorkspaceManager");
        Self::default()
    }

    /// Creates a new workspace tab at the end and selects it.
    ///
    /// # Errors
    /// * `ShellError::InvalidInput` - If the title is empty
    pub fn create_workspace(&mut self, title: &str) -> Result<WorkspaceId, ShellError> {
        if title.trim().is_empty() {
            return Err(ShellError::InvalidInput {
                message: "Workspace title cannot be empty".to_string(),
            });
        }

        let workspace = Workspace::new(title.trim());
        let workspace_id = workspace.workspace_id().clone();
        self.workspaces.push(workspace);
        self.selected = Some(self.workspaces.len() - 1);

        log::info!(
            "Workspace created: id={workspace_id}, total_workspaces={}",
            self.workspaces.len()
        );
        Ok(workspace_id)
    }

    /// Closes a workspace and returns it.
    pub fn close_workspace(&mut self, workspace_id: &str) -> Result<Workspace, ShellError> {
        let index = self.index_of(workspace_id)?;
        let closed = self.workspaces.remove(index);

        self.selected = match self.selected {
            _ if self.workspaces.is_empty() => None,
            Some(selected) if selected > index => Some(selected - 1),
            Some(selected) => Some(selected.min(self.workspaces.len() - 1)),
            None => None,
        };

        log::info!(
            "Workspace closed: id={workspace_id}, remaining={}",
            self.workspaces.len()
        );
        Ok(closed)
    }

    /// Replaces every open workspace at once (loading a layout).
    ///
    /// Returns the workspaces that were open before.
    pub fn replace_all(&mut self, workspaces: Vec<Workspace>) -> Vec<Workspace> {
        self.selected = if workspaces.is_empty() { None } else { Some(0) };
        let previous = std::mem::replace(&mut self.workspaces, workspaces);
        log::info!(
            "Workspaces replaced: closed={}, opened={}",
            previous.len(),
            self.workspaces.len()
        );
        previous
    }

    /// Starts a fresh layout with one empty tab per title, or a single
    /// placeholder tab when `titles` is empty.
    pub fn new_layout(&mut self, titles: &[String]) -> Vec<Workspace> {
        let workspaces = if titles.is_empty() {
            vec![Workspace::new(PLACEHOLDER_TAB_TITLE)]
        } else {
            titles.iter().map(|title| Workspace::new(title.as_str())).collect()
        };
        self.replace_all(workspaces)
    }

    pub fn workspaces(&self) -> &[Workspace] {
        &self.workspaces
    }

    pub fn workspaces_mut(&mut self) -> &mut [Workspace] {
        &mut self.workspaces
    }

    pub fn get(&self, workspace_id: &str) -> Option<&Workspace> {
        self.workspaces
            .iter()
            .find(|w| w.workspace_id() == workspace_id)
    }

    pub fn get_mut(&mut self, workspace_id: &str) -> Option<&mut Workspace> {
        self.workspaces
            .iter_mut()
            .find(|w| w.workspace_id() == workspace_id)
    }

    pub fn is_empty(&self) -> bool {
        self.workspaces.is_empty()
    }

    pub fn len(&self) -> usize {
        self.workspaces.len()
    }

    /// Selects the tab at `index`. Out-of-range indices are ignored.
    pub fn select(&mut self, index: usize) -> bool {
        if index < self.workspaces.len() {
            self.selected = Some(index);
            true
        } else {
            false
        }
    }

    pub fn selected(&self) -> Option<&Workspace> {
        self.selected.and_then(|index| self.workspaces.get(index))
    }

    /// Places a tile for `component` on the selected tab.
    ///
    /// # Errors
    /// * `ShellError::NoWorkspaceOpen` - If no tab is open
    pub fn add_component_to_active(
        &mut self,
        component: impl Into<ComponentName>,
    ) -> Result<TileId, ShellError> {
        let index = self.selected.ok_or(ShellError::NoWorkspaceOpen)?;
        let workspace = self
            .workspaces
            .get_mut(index)
            .ok_or(ShellError::NoWorkspaceOpen)?;
        Ok(workspace.add_tile(component))
    }

    fn index_of(&self, workspace_id: &str) -> Result<usize, ShellError> {
        self.workspaces
            .iter()
            .position(|w| w.workspace_id() == workspace_id)
            .ok_or_else(|| ShellError::WorkspaceNotFound {
                workspace_id: workspace_id.to_string(),
            })
    }
}
