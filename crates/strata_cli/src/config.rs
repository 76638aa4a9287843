//! Session configuration.
//!
//! Loaded from an optional JSON file; command-line flags override it.

use color_eyre::eyre::{Result, WrapErr};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Settings for one compile/validate session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
    /// Laws to check; `None` checks every built-in law
    pub laws: Option<Vec<String>>,
    /// Plugins to resolve
    pub plugins: Vec<String>,
    /// Fail when resolution reports conflicts
    pub deny_conflicts: bool,
    /// Fail when resolution truncates a dependency cycle
    pub deny_cycles: bool,
    /// Fail when a requested or depended-on plugin is missing
    pub deny_missing: bool,
}

impl SessionConfig {
    /// Load a config file
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or is not a valid config
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("reading config {}", path.display()))?;
        serde_json::from_str(&text).wrap_err_with(|| format!("parsing config {}", path.display()))
    }

    /// Load a config file if given, otherwise defaults
    ///
    /// # Errors
    ///
    /// Returns error if a given file cannot be loaded
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        path.map_or_else(|| Ok(Self::default()), Self::load)
    }

    /// Replace the law selection when flags name any laws
    #[must_use]
    pub fn with_laws(mut self, laws: Vec<String>) -> Self {
        if !laws.is_empty() {
            self.laws = Some(laws);
        }
        self
    }

    /// Replace the plugin selection when flags name any plugins
    #[must_use]
    pub fn with_plugins(mut self, plugins: Vec<String>) -> Self {
        if !plugins.is_empty() {
            self.plugins = plugins;
        }
        self
    }
}
