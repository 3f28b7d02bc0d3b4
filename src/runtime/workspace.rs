//! Workspace - a single dashboard tab and the tiles placed on it.
//!
//! A tile only remembers the component name of its content. The name is a
//! plain string used for matching against plugin contributions; it does not
//! own or reference the content object.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::types::{ComponentName, TileId, WorkspaceId};

/// A placed widget wrapping content of a given component kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tile {
    tile_id: TileId,
    component: ComponentName,
}

impl Tile {
    pub fn new(component: impl Into<ComponentName>) -> Self {
        Self {
            tile_id: Uuid::new_v4().to_string(),
            component: component.into(),
        }
    }

    pub fn tile_id(&self) -> &TileId {
        &self.tile_id
    }

    /// Component name of the tile's content.
    pub fn component(&self) -> &str {
        &self.component
    }
}

/// State for a single workspace tab.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workspace {
    /// Unique identifier for this workspace
    workspace_id: WorkspaceId,
    /// Tab title
    title: String,
    /// Tiles in placement order
    tiles: Vec<Tile>,
}

impl Workspace {
    /// Creates an empty workspace with a fresh UUID.
    pub fn new(title: impl Into<String>) -> Self {
        let workspace_id = Uuid::new_v4().to_string();
        let title = title.into();
        log::debug!("Creating workspace: id={workspace_id}, title={title}");

        Self {
            workspace_id,
            title,
            tiles: Vec::new(),
        }
    }

    pub fn workspace_id(&self) -> &WorkspaceId {
        &self.workspace_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    /// Place a new tile for `component` at the end of the workspace.
    pub fn add_tile(&mut self, component: impl Into<ComponentName>) -> TileId {
        let tile = Tile::new(component);
        let tile_id = tile.tile_id.clone();
        self.tiles.push(tile);
        tile_id
    }

    /// Remove every tile whose id is in `tile_ids`, keeping the order of the
    /// rest. Returns the number of tiles removed.
    pub fn remove_tiles(&mut self, tile_ids: &[TileId]) -> usize {
        let before = self.tiles.len();
        self.tiles.retain(|tile| !tile_ids.contains(&tile.tile_id));
        before - self.tiles.len()
    }

    /// Component names of all tiles, in placement order.
    pub fn component_names(&self) -> impl Iterator<Item = &str> {
        self.tiles.iter().map(Tile::component)
    }
}
