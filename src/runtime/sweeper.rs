//! WorkspaceSweeper - removes the tiles of an unloaded plugin from every open workspace.
//!
//! Each workspace is handled in two passes: candidate tile ids are collected
//! into an owned list while the workspace is only borrowed immutably, then the
//! list is applied with a mutable borrow. Removing while traversing cannot be
//! expressed.

use std::collections::BTreeSet;

use crate::api::types::{ComponentName, PluginDescriptor, PluginId, TileId, WorkspaceId};
use crate::runtime::workspace::Workspace;
use crate::runtime::workspace_manager::WorkspaceManager;

/// What to remove: the identity and contributed names of an unloaded plugin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepRequest {
    pub plugin_id: PluginId,
    pub components: BTreeSet<ComponentName>,
}

impl From<&PluginDescriptor> for SweepRequest {
    fn from(descriptor: &PluginDescriptor) -> Self {
        Self {
            plugin_id: descriptor.plugin_id.clone(),
            components: descriptor.components.clone(),
        }
    }
}

/// Tiles removed by one sweep, grouped by workspace.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub removed: Vec<(WorkspaceId, Vec<TileId>)>,
}

impl SweepReport {
    pub fn removed_count(&self) -> usize {
        self.removed.iter().map(|(_, tiles)| tiles.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.removed.is_empty()
    }

    pub fn merge(&mut self, other: SweepReport) {
        self.removed.extend(other.removed);
    }
}

/// Stateless sweep over a `WorkspaceManager`.
#[derive(Debug, Default, Clone, Copy)]
pub struct WorkspaceSweeper;

impl WorkspaceSweeper {
    /// Remove every tile whose component name the plugin contributed.
    ///
    /// Runs to completion on the calling (visible-state) thread. Sweeping the
    /// same plugin again finds nothing and changes nothing.
    pub fn sweep(&self, workspaces: &mut WorkspaceManager, request: &SweepRequest) -> SweepReport {
        if workspaces.is_empty() {
            log::debug!(
                "No workspace open, nothing to sweep: plugin_id={}",
                request.plugin_id
            );
            return SweepReport::default();
        }

        let mut report = SweepReport::default();
        for workspace in workspaces.workspaces_mut() {
            let candidates = Self::collect_candidates(workspace, &request.components);
            if candidates.is_empty() {
                continue;
            }

            let removed = workspace.remove_tiles(&candidates);
            log::debug!(
                "Removed plugin tiles: plugin_id={}, workspace_id={}, removed={removed}",
                request.plugin_id,
                workspace.workspace_id()
            );
            report.removed.push((workspace.workspace_id().clone(), candidates));
        }

        log::info!(
            "Plugin sweep finished: plugin_id={}, tiles_removed={}",
            request.plugin_id,
            report.removed_count()
        );
        report
    }

    fn collect_candidates(
        workspace: &Workspace,
        components: &BTreeSet<ComponentName>,
    ) -> Vec<TileId> {
        workspace
            .tiles()
            .iter()
            .filter(|tile| components.contains(tile.component()))
            .map(|tile| tile.tile_id().clone())
            .collect()
    }
}
