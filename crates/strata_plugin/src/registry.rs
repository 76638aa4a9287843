//! Plugin registry.
//!
//! Registries are constructed explicitly and owned by the compile session;
//! there is no process-wide default. Names are unique: registering a name
//! twice is a caller error and the first entry is kept.

use crate::plugin::Plugin;
use crate::resolver::{PluginResolution, PluginResolver};
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::{PoisonError, RwLock};
use tracing::debug;

static PLUGIN_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z][A-Za-z0-9_.-]*$")
        .unwrap_or_else(|err| panic!("plugin name pattern: {err}"))
});

/// Error from registry operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// Plugin already registered
    AlreadyRegistered {
        /// Plugin name
        name: String,
    },
    /// Plugin name is not a valid key
    InvalidName {
        /// Plugin name
        name: String,
    },
}

impl std::fmt::Display for RegistryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AlreadyRegistered { name } => write!(f, "Plugin already registered: {}", name),
            Self::InvalidName { name } => write!(f, "Invalid plugin name: '{}'", name),
        }
    }
}

impl std::error::Error for RegistryError {}

/// Latent conflict between two registered plugins
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct RegistryConflict {
    /// Plugin declaring the conflict
    pub plugin: String,
    /// Registered plugin it conflicts with
    pub conflicts_with: String,
}

impl std::fmt::Display for RegistryConflict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Plugin '{}' conflicts with registered plugin '{}'",
            self.plugin, self.conflicts_with
        )
    }
}

/// Registry of plugins by name
#[derive(Debug, Default)]
pub struct PluginRegistry {
    /// Registered plugins in registration order
    plugins: IndexMap<String, Plugin>,
}

impl PluginRegistry {
    /// Create a new empty registry
    #[must_use]
    pub fn new() -> Self {
        Self {
            plugins: IndexMap::new(),
        }
    }

    /// Register a plugin
    ///
    /// # Errors
    ///
    /// Returns error if the name is taken or malformed; the registry is unchanged
    pub fn register(&mut self, plugin: Plugin) -> Result<(), RegistryError> {
        let name = plugin.name().to_string();
        if !PLUGIN_NAME.is_match(&name) {
            return Err(RegistryError::InvalidName { name });
        }
        if self.plugins.contains_key(&name) {
            return Err(RegistryError::AlreadyRegistered { name });
        }

        debug!(plugin = %name, version = %plugin.version(), "Registered plugin");
        self.plugins.insert(name, plugin);
        Ok(())
    }

    /// Unregister a plugin; returns whether anything was removed
    pub fn unregister(&mut self, name: &str) -> bool {
        let removed = self.plugins.shift_remove(name).is_some();
        if removed {
            debug!(plugin = name, "Unregistered plugin");
        }
        removed
    }

    /// Get a plugin by name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Plugin> {
        self.plugins.get(name)
    }

    /// Check if a plugin is registered
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.plugins.contains_key(name)
    }

    /// All plugins in registration order
    pub fn all(&self) -> impl Iterator<Item = &Plugin> {
        self.plugins.values()
    }

    /// All registered names in registration order
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.plugins.keys().map(String::as_str).collect()
    }

    /// Get the count of registered plugins
    #[must_use]
    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    /// Check if registry is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    /// Scan every registered plugin's declared conflicts against the registry
    ///
    /// Reports latent conflicts whether or not the plugins are ever
    /// requested together.
    #[must_use]
    pub fn conflicts(&self) -> Vec<RegistryConflict> {
        self.plugins
            .values()
            .flat_map(|plugin| {
                plugin
                    .metadata
                    .conflicts
                    .iter()
                    .filter(|other| self.contains(other))
                    .map(move |other| RegistryConflict {
                        plugin: plugin.name().to_string(),
                        conflicts_with: other.clone(),
                    })
            })
            .collect()
    }

    /// Resolve requested plugins against this registry
    #[must_use]
    pub fn resolve<S: AsRef<str>>(&self, requested: &[S]) -> PluginResolution {
        PluginResolver::new(self).resolve(requested)
    }
}

/// Registry shared between threads
///
/// Writers take the lock exclusively, so a resolution never observes a
/// half-applied registration.
#[derive(Debug, Default)]
pub struct SharedRegistry {
    inner: RwLock<PluginRegistry>,
}

impl SharedRegistry {
    /// Create a new shared registry
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(PluginRegistry::new()),
        }
    }

    /// Register a plugin
    ///
    /// # Errors
    ///
    /// Returns error if the plugin cannot be registered
    pub fn register(&self, plugin: Plugin) -> Result<(), RegistryError> {
        let mut registry = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        registry.register(plugin)
    }

    /// Unregister a plugin
    pub fn unregister(&self, name: &str) -> bool {
        let mut registry = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        registry.unregister(name)
    }

    /// Resolve against a consistent snapshot of the registry
    #[must_use]
    pub fn resolve<S: AsRef<str>>(&self, requested: &[S]) -> PluginResolution {
        let registry = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        registry.resolve(requested)
    }

    /// List all registered plugin names
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let registry = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        registry.names().into_iter().map(String::from).collect()
    }
}

impl From<PluginRegistry> for SharedRegistry {
    fn from(registry: PluginRegistry) -> Self {
        Self {
            inner: RwLock::new(registry),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use strata_core::Version;

    fn make_plugin(name: &str) -> Plugin {
        Plugin::new(name, Version::new(1, 0, 0))
    }

    #[test]
    fn test_registry_new() {
        let registry = PluginRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn test_registry_register() {
        let mut registry = PluginRegistry::new();
        registry.register(make_plugin("jsx")).unwrap();
        assert_eq!(registry.len(), 1);
        assert!(registry.contains("jsx"));
        assert_eq!(registry.get("jsx").unwrap().name(), "jsx");
    }

    #[test]
    fn test_registry_register_duplicate_keeps_first() {
        let mut registry = PluginRegistry::new();
        registry
            .register(make_plugin("jsx").with_description("first"))
            .unwrap();
        let err = registry
            .register(make_plugin("jsx").with_description("second"))
            .unwrap_err();

        assert_eq!(
            err,
            RegistryError::AlreadyRegistered {
                name: "jsx".to_string()
            }
        );
        assert_eq!(registry.len(), 1);
        assert_eq!(
            registry.get("jsx").unwrap().metadata.description.as_deref(),
            Some("first")
        );
    }

    #[test]
    fn test_registry_rejects_bad_names() {
        let mut registry = PluginRegistry::new();
        for name in ["", "has space", "9lives", "-dash"] {
            assert!(matches!(
                registry.register(make_plugin(name)),
                Err(RegistryError::InvalidName { .. })
            ));
        }
        assert!(registry.register(make_plugin("A")).is_ok());
        assert!(registry.register(make_plugin("dom-events_2.x")).is_ok());
    }

    #[test]
    fn test_registry_unregister_is_idempotent() {
        let mut registry = PluginRegistry::new();
        registry.register(make_plugin("jsx")).unwrap();
        assert!(registry.unregister("jsx"));
        assert!(!registry.unregister("jsx"));
        assert!(!registry.contains("jsx"));
    }

    #[test]
    fn test_registry_names_in_order() {
        let mut registry = PluginRegistry::new();
        for name in ["c", "a", "b"] {
            registry.register(make_plugin(name)).unwrap();
        }
        assert_eq!(registry.names(), vec!["c", "a", "b"]);
        assert_eq!(registry.all().count(), 3);
    }

    #[test]
    fn test_registry_conflict_scan() {
        let mut registry = PluginRegistry::new();
        registry
            .register(make_plugin("jsx").conflicts_with("templates").conflicts_with("absent"))
            .unwrap();
        registry.register(make_plugin("templates")).unwrap();
        registry
            .register(make_plugin("canvas").conflicts_with("jsx"))
            .unwrap();

        let conflicts = registry.conflicts();
        assert_eq!(conflicts.len(), 2);
        assert_eq!(conflicts[0].plugin, "jsx");
        assert_eq!(conflicts[0].conflicts_with, "templates");
        assert_eq!(
            conflicts[1].to_string(),
            "Plugin 'canvas' conflicts with registered plugin 'jsx'"
        );

        registry.unregister("templates");
        assert_eq!(registry.conflicts().len(), 1);
    }

    #[test]
    fn test_shared_registry() {
        let shared = Arc::new(SharedRegistry::new());
        let handles: Vec<_> = ["a", "b", "c", "d"]
            .into_iter()
            .map(|name| {
                let shared = Arc::clone(&shared);
                std::thread::spawn(move || shared.register(make_plugin(name)))
            })
            .collect();
        for handle in handles {
            handle.join().unwrap().unwrap();
        }

        assert_eq!(shared.names().len(), 4);
        assert!(shared.register(make_plugin("a")).is_err());
        assert_eq!(shared.resolve(&["a", "b"]).names(), vec!["a", "b"]);
        assert!(shared.unregister("a"));
    }
}
