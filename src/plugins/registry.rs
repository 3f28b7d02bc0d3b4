//! Plugin Registry - the known plugins and their loaded flags.
//!
//! The registry lives in the visible-state context. Every mutation queues a
//! `RegistryEvent`; the owner drains them with `drain_events()` and feeds the
//! lifecycle watcher.
//!
//! # Lifecycle
//!
//! ```text
//! install ──► Available ──load──► Loaded ──unload──► Unloaded (retired)
//!                                                        │
//!        install (fresh instance, same id) ◄─────────────┘
//! ```

use std::collections::VecDeque;

use serde::Serialize;

use crate::api::types::{PluginDescriptor, PluginId, ShellError};

const MAX_PLUGIN_ID_LEN: usize = 64;

/// Lifecycle state of one plugin instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PluginState {
    /// Known but never loaded
    Available,
    Loaded,
    /// Unloaded; this instance cannot be loaded again
    Unloaded,
}

impl PluginState {
    pub fn is_loaded(self) -> bool {
        self == PluginState::Loaded
    }
}

/// Change notification emitted by the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryEvent {
    /// A plugin instance joined the known-plugins collection
    Added {
        descriptor: PluginDescriptor,
        loaded: bool,
    },
    /// The loaded flag of a known plugin changed
    LoadedChanged { plugin_id: PluginId, loaded: bool },
}

#[derive(Debug, Clone)]
struct PluginEntry {
    descriptor: PluginDescriptor,
    state: PluginState,
}

/// Known plugins in installation order.
#[derive(Debug, Default)]
pub struct PluginRegistry {
    known: Vec<PluginEntry>,
    events: VecDeque<RegistryEvent>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate a plugin ID.
    ///
    /// Plugin ids are lowercase slugs (`a-z`, `0-9`, inner `-`) of at most
    /// 64 bytes.
    pub fn validate_plugin_id(plugin_id: &str) -> Result<(), ShellError> {
        let reason = match plugin_id.as_bytes() {
            [] => "is empty".to_string(),
            bytes if bytes.len() > MAX_PLUGIN_ID_LEN => {
                format!("is longer than {MAX_PLUGIN_ID_LEN} bytes")
            }
            [b'-', ..] | [.., b'-'] => "starts or ends with '-'".to_string(),
            _ => match plugin_id
                .chars()
                .find(|c| !matches!(c, 'a'..='z' | '0'..='9' | '-'))
            {
                Some(c) => format!("contains {c:?}"),
                None => return Ok(()),
            },
        };

        Err(ShellError::InvalidInput {
            message: format!("Plugin id '{plugin_id}' {reason}"),
        })
    }

    /// Add a plugin instance to the known plugins.
    ///
    /// A retired instance with the same id is replaced by the new one.
    ///
    /// # Errors
    /// * `ShellError::InvalidInput` - Invalid id, or a live instance with this id exists
    pub fn install(&mut self, descriptor: PluginDescriptor) -> Result<(), ShellError> {
        Self::validate_plugin_id(&descriptor.plugin_id)?;

        let entry = PluginEntry {
            descriptor: descriptor.clone(),
            state: PluginState::Available,
        };

        match self.position(&descriptor.plugin_id) {
            Some(index) if self.known[index].state != PluginState::Unloaded => {
                return Err(ShellError::InvalidInput {
                    message: format!("Plugin already installed: {}", descriptor.plugin_id),
                });
            }
            Some(index) => self.known[index] = entry,
            None => self.known.push(entry),
        }

        log::info!(
            "Plugin installed: plugin_id={}, version={}, components={}",
            descriptor.plugin_id,
            descriptor.version,
            descriptor.components.len()
        );
        self.events.push_back(RegistryEvent::Added {
            descriptor,
            loaded: false,
        });
        Ok(())
    }

    /// Install a plugin instance and load it immediately.
    pub fn install_loaded(&mut self, descriptor: PluginDescriptor) -> Result<(), ShellError> {
        let plugin_id = descriptor.plugin_id.clone();
        self.install(descriptor)?;
        self.load(&plugin_id)
    }

    /// Mark a known plugin as loaded. Loading a loaded plugin is a no-op.
    ///
    /// # Errors
    /// * `ShellError::PluginNotFound` - Unknown id
    /// * `ShellError::PluginRetired` - This instance was already unloaded
    pub fn load(&mut self, plugin_id: &str) -> Result<(), ShellError> {
        let index = self.require(plugin_id)?;
        match self.known[index].state {
            PluginState::Loaded => Ok(()),
            PluginState::Unloaded => Err(ShellError::PluginRetired {
                plugin_id: plugin_id.to_string(),
            }),
            PluginState::Available => {
                self.known[index].state = PluginState::Loaded;
                log::info!("Plugin loaded: plugin_id={plugin_id}");
                self.events.push_back(RegistryEvent::LoadedChanged {
                    plugin_id: plugin_id.to_string(),
                    loaded: true,
                });
                Ok(())
            }
        }
    }

    /// Unload a plugin. Returns whether the loaded flag changed.
    ///
    /// # Errors
    /// * `ShellError::PluginNotFound` - Unknown id
    pub fn unload(&mut self, plugin_id: &str) -> Result<bool, ShellError> {
        let index = self.require(plugin_id)?;
        if !self.known[index].state.is_loaded() {
            log::debug!("Unload ignored, plugin not loaded: plugin_id={plugin_id}");
            return Ok(false);
        }

        self.known[index].state = PluginState::Unloaded;
        log::info!("Plugin unloaded: plugin_id={plugin_id}");
        self.events.push_back(RegistryEvent::LoadedChanged {
            plugin_id: plugin_id.to_string(),
            loaded: false,
        });
        Ok(true)
    }

    pub fn state(&self, plugin_id: &str) -> Option<PluginState> {
        self.position(plugin_id).map(|index| self.known[index].state)
    }

    pub fn descriptor(&self, plugin_id: &str) -> Option<&PluginDescriptor> {
        self.position(plugin_id)
            .map(|index| &self.known[index].descriptor)
    }

    /// Every known plugin with its state, in installation order.
    pub fn known_plugins(&self) -> impl Iterator<Item = (&PluginDescriptor, PluginState)> {
        self.known.iter().map(|entry| (&entry.descriptor, entry.state))
    }

    /// Snapshot of the currently loaded plugins.
    pub fn loaded_plugins(&self) -> impl Iterator<Item = &PluginDescriptor> {
        self.known
            .iter()
            .filter(|entry| entry.state.is_loaded())
            .map(|entry| &entry.descriptor)
    }

    /// Take every event queued since the last call, oldest first.
    pub fn drain_events(&mut self) -> Vec<RegistryEvent> {
        self.events.drain(..).collect()
    }

    fn position(&self, plugin_id: &str) -> Option<usize> {
        self.known
            .iter()
            .position(|entry| entry.descriptor.plugin_id == plugin_id)
    }

    fn require(&self, plugin_id: &str) -> Result<usize, ShellError> {
        self.position(plugin_id)
            .ok_or_else(|| ShellError::PluginNotFound {
                plugin_id: plugin_id.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(id: &str) -> PluginDescriptor {
        PluginDescriptor::new(id, ["Widget"])
    }

    #[test]
    fn test_validate_plugin_id_valid() {
        assert!(PluginRegistry::validate_plugin_id("base-widgets").is_ok());
        assert!(PluginRegistry::validate_plugin_id("networktables").is_ok());
        assert!(PluginRegistry::validate_plugin_id("plugin-123").is_ok());
        assert!(PluginRegistry::validate_plugin_id("a").is_ok());
    }

    #[test]
    fn test_validate_plugin_id_invalid() {
        assert!(PluginRegistry::validate_plugin_id("").is_err());
        assert!(PluginRegistry::validate_plugin_id(&"a".repeat(65)).is_err());
        assert!(PluginRegistry::validate_plugin_id("Plugin").is_err());
        assert!(PluginRegistry::validate_plugin_id("plugin_name").is_err());
        assert!(PluginRegistry::validate_plugin_id("../etc").is_err());
        assert!(PluginRegistry::validate_plugin_id("-plugin").is_err());
        assert!(PluginRegistry::validate_plugin_id("plugin-").is_err());
        assert!(PluginRegistry::validate_plugin_id(&"a".repeat(64)).is_ok());
    }

    #[test]
    fn test_lifecycle_emits_events() {
        let mut registry = PluginRegistry::new();
        registry.install_loaded(descriptor("base")).unwrap();
        assert!(registry.unload("base").unwrap());

        let events = registry.drain_events();
        assert_eq!(
            events,
            vec![
                RegistryEvent::Added {
                    descriptor: descriptor("base"),
                    loaded: false
                },
                RegistryEvent::LoadedChanged {
                    plugin_id: "base".to_string(),
                    loaded: true
                },
                RegistryEvent::LoadedChanged {
                    plugin_id: "base".to_string(),
                    loaded: false
                },
            ]
        );
        assert!(registry.drain_events().is_empty());
    }

    #[test]
    fn test_unloaded_instance_cannot_be_reloaded() {
        let mut registry = PluginRegistry::new();
        registry.install_loaded(descriptor("base")).unwrap();
        registry.unload("base").unwrap();

        assert_eq!(
            registry.load("base"),
            Err(ShellError::PluginRetired {
                plugin_id: "base".to_string()
            })
        );
        assert!(!registry.unload("base").unwrap());
    }

    #[test]
    fn test_fresh_instance_replaces_retired_one() {
        let mut registry = PluginRegistry::new();
        registry.install_loaded(descriptor("base")).unwrap();
        assert!(registry.install(descriptor("base")).is_err());

        registry.unload("base").unwrap();
        registry.install_loaded(descriptor("base")).unwrap();

        assert_eq!(registry.state("base"), Some(PluginState::Loaded));
        assert_eq!(registry.known_plugins().count(), 1);
    }

    #[test]
    fn test_unknown_plugin() {
        let mut registry = PluginRegistry::new();
        assert!(matches!(
            registry.unload("ghost"),
            Err(ShellError::PluginNotFound { .. })
        ));
        assert!(registry.state("ghost").is_none());
    }

    #[test]
    fn test_loaded_plugins_snapshot() {
        let mut registry = PluginRegistry::new();
        registry.install_loaded(descriptor("a")).unwrap();
        registry.install(descriptor("b")).unwrap();
        registry.install_loaded(descriptor("c")).unwrap();

        let loaded: Vec<_> = registry
            .loaded_plugins()
            .map(|d| d.plugin_id.as_str())
            .collect();
        assert_eq!(loaded, vec!["a", "c"]);
    }
}
