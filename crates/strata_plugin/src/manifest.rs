//! Declarative plugin manifests.
//!
//! A manifest carries everything about a plugin that can be written down
//! without code: metadata and syntax patterns. Hooks and transforms are
//! attached by the host after loading.

use crate::plugin::{Plugin, PluginError, PluginMetadata};
use serde::{Deserialize, Serialize};

/// Syntax pattern as written in a manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyntaxDecl {
    /// Extension name
    pub name: String,
    /// Regular expression source
    pub pattern: String,
}

/// Plugin manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginManifest {
    /// Plugin metadata
    #[serde(flatten)]
    pub metadata: PluginMetadata,
    /// Syntax patterns
    #[serde(default)]
    pub syntax: Vec<SyntaxDecl>,
}

impl PluginManifest {
    /// Parse a JSON array of manifests
    ///
    /// # Errors
    ///
    /// Returns error if the JSON is not a list of manifests
    pub fn parse_list(json: &str) -> Result<Vec<Self>, PluginError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Build the plugin described by this manifest
    ///
    /// # Errors
    ///
    /// Returns error if a syntax pattern does not compile
    pub fn into_plugin(self) -> Result<Plugin, PluginError> {
        self.syntax
            .into_iter()
            .try_fold(Plugin::from_metadata(self.metadata), |plugin, decl| {
                plugin.with_syntax(decl.name, &decl.pattern)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::Version;

    const MANIFEST: &str = r#"[
        {
            "name": "jsx",
            "version": "1.0.0",
            "dependencies": ["dom"],
            "syntax": [{"name": "tag", "pattern": "<[a-z]+>"}]
        },
        {"name": "dom", "version": "0.3.1", "conflicts": ["canvas"]}
    ]"#;

    #[test]
    fn test_parse_list() {
        let manifests = PluginManifest::parse_list(MANIFEST).unwrap();
        assert_eq!(manifests.len(), 2);
        assert_eq!(manifests[0].metadata.name, "jsx");
        assert_eq!(manifests[0].syntax.len(), 1);
        assert_eq!(manifests[1].metadata.version, Version::new(0, 3, 1));
        assert_eq!(manifests[1].metadata.conflicts, vec!["canvas"]);
    }

    #[test]
    fn test_into_plugin() {
        let manifest = PluginManifest::parse_list(MANIFEST).unwrap().remove(0);
        let plugin = manifest.into_plugin().unwrap();
        assert_eq!(plugin.name(), "jsx");
        assert!(plugin.syntax[0].pattern.is_match("<div>"));
        assert!(plugin.hooks.phases().is_empty());
    }

    #[test]
    fn test_bad_manifest() {
        assert!(matches!(
            PluginManifest::parse_list(r#"{"name": "x"}"#),
            Err(PluginError::Manifest(_))
        ));

        let bad = r#"[{"name": "x", "version": "1.0.0",
                       "syntax": [{"name": "p", "pattern": "["}]}]"#;
        let manifest = PluginManifest::parse_list(bad).unwrap().remove(0);
        assert!(matches!(
            manifest.into_plugin(),
            Err(PluginError::InvalidPattern { .. })
        ));
    }
}
