//! PluginLifecycleWatcher - one-shot unload observers keyed by plugin id.
//!
//! Each watched plugin has a single armed entry. The entry fires on the first
//! loaded → unloaded transition observed after registration, then removes
//! itself. A freshly installed instance with the same id re-arms it.

use std::collections::HashMap;

use crate::api::types::{PluginDescriptor, PluginId};
use crate::plugins::registry::{PluginRegistry, RegistryEvent};
use crate::runtime::sweeper::SweepRequest;

#[derive(Debug)]
struct ArmedWatch {
    request: SweepRequest,
    /// Loaded flag as last observed; a transition needs `true` here
    last_loaded: bool,
}

/// Turns registry events into sweep requests.
///
/// Never touches workspace state itself.
#[derive(Debug, Default)]
pub struct PluginLifecycleWatcher {
    watches: HashMap<PluginId, ArmedWatch>,
}

impl PluginLifecycleWatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm watches for every plugin currently known to `registry`.
    pub fn watch_known(&mut self, registry: &PluginRegistry) {
        for (descriptor, state) in registry.known_plugins() {
            self.watch(descriptor, state.is_loaded());
        }
    }

    /// Arm (or re-arm) the watch for one plugin.
    ///
    /// Registration alone never fires, even if `loaded` is already false.
    pub fn watch(&mut self, descriptor: &PluginDescriptor, loaded: bool) {
        log::debug!(
            "Watching plugin for unload: plugin_id={}, loaded={loaded}",
            descriptor.plugin_id
        );
        self.watches.insert(
            descriptor.plugin_id.clone(),
            ArmedWatch {
                request: SweepRequest::from(descriptor),
                last_loaded: loaded,
            },
        );
    }

    /// Apply one registry event. Returns a sweep request when a watched
    /// plugin just went from loaded to unloaded.
    pub fn handle(&mut self, event: &RegistryEvent) -> Option<SweepRequest> {
        match event {
            RegistryEvent::Added { descriptor, loaded } => {
                self.watch(descriptor, *loaded);
                None
            }
            RegistryEvent::LoadedChanged { plugin_id, loaded } => {
                self.on_loaded_changed(plugin_id, *loaded)
            }
        }
    }

    /// Observe a new loaded flag for `plugin_id`.
    ///
    /// Fires on the first loaded → unloaded transition only, then stops
    /// watching the plugin.
    pub fn on_loaded_changed(&mut self, plugin_id: &str, loaded: bool) -> Option<SweepRequest> {
        let watch = self.watches.get_mut(plugin_id)?;
        let was_loaded = std::mem::replace(&mut watch.last_loaded, loaded);
        if loaded || !was_loaded {
            return None;
        }

        let watch = self.watches.remove(plugin_id)?;
        log::info!("Plugin unload observed: plugin_id={plugin_id}");
        Some(watch.request)
    }

    pub fn is_watching(&self, plugin_id: &str) -> bool {
        self.watches.contains_key(plugin_id)
    }

    pub fn watched_count(&self) -> usize {
        self.watches.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(id: &str) -> PluginDescriptor {
        PluginDescriptor::new(id, [format!("{id}-widget")])
    }

    fn unloaded(id: &str) -> RegistryEvent {
        RegistryEvent::LoadedChanged {
            plugin_id: id.to_string(),
            loaded: false,
        }
    }

    fn loaded(id: &str) -> RegistryEvent {
        RegistryEvent::LoadedChanged {
            plugin_id: id.to_string(),
            loaded: true,
        }
    }

    #[test]
    fn test_registration_never_fires() {
        let mut watcher = PluginLifecycleWatcher::new();
        watcher.watch(&descriptor("a"), false);
        assert!(watcher.handle(&unloaded("a")).is_none());
        assert!(watcher.is_watching("a"));
    }

    #[test]
    fn test_fires_once_on_transition() {
        let mut watcher = PluginLifecycleWatcher::new();
        watcher.watch(&descriptor("a"), true);

        let request = watcher.handle(&unloaded("a")).unwrap();
        assert_eq!(request.plugin_id, "a");
        assert!(request.components.contains("a-widget"));

        assert!(watcher.handle(&unloaded("a")).is_none());
        assert!(!watcher.is_watching("a"));
    }

    #[test]
    fn test_available_plugin_fires_after_load_then_unload() {
        let mut watcher = PluginLifecycleWatcher::new();
        watcher.handle(&RegistryEvent::Added {
            descriptor: descriptor("late"),
            loaded: false,
        });

        assert!(watcher.handle(&loaded("late")).is_none());
        assert!(watcher.handle(&unloaded("late")).is_some());
    }

    #[test]
    fn test_readded_instance_rearms() {
        let mut watcher = PluginLifecycleWatcher::new();
        watcher.watch(&descriptor("a"), true);
        assert!(watcher.handle(&unloaded("a")).is_some());

        watcher.handle(&RegistryEvent::Added {
            descriptor: descriptor("a"),
            loaded: false,
        });
        watcher.handle(&loaded("a"));
        assert!(watcher.handle(&unloaded("a")).is_some());
    }

    #[test]
    fn test_unknown_plugin_is_ignored() {
        let mut watcher = PluginLifecycleWatcher::new();
        assert!(watcher.handle(&unloaded("ghost")).is_none());
        assert!(watcher.handle(&loaded("ghost")).is_none());
        assert_eq!(watcher.watched_count(), 0);
    }

    #[test]
    fn test_watch_known_covers_registry() {
        let mut registry = PluginRegistry::new();
        registry.install_loaded(descriptor("a")).unwrap();
        registry.install(descriptor("b")).unwrap();

        let mut watcher = PluginLifecycleWatcher::new();
        watcher.watch_known(&registry);

        assert_eq!(watcher.watched_count(), 2);
        assert!(watcher.handle(&unloaded("a")).is_some());
        assert!(watcher.handle(&unloaded("b")).is_none());
    }
}
