//! Plugin definitions: metadata, syntax extensions, transforms and hooks.

use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use strata_core::{Item, Program, Version};

/// Hook over raw source or emitted code
pub type SourceHook = Arc<dyn Fn(String) -> String + Send + Sync>;

/// Hook over a whole program
pub type ProgramHook = Arc<dyn Fn(Program) -> Program + Send + Sync>;

/// Transform over a single top-level item
pub type ItemTransform = Arc<dyn Fn(Item) -> Item + Send + Sync>;

/// Error building a plugin
#[derive(Debug, Clone, thiserror::Error)]
pub enum PluginError {
    /// Syntax pattern did not compile
    #[error("Invalid syntax pattern '{name}' in plugin {plugin}: {source}")]
    InvalidPattern {
        /// Plugin name
        plugin: String,
        /// Extension name
        name: String,
        /// Regex compile error
        #[source]
        source: regex::Error,
    },

    /// Manifest could not be read
    #[error("Invalid plugin manifest: {0}")]
    Manifest(String),
}

impl From<serde_json::Error> for PluginError {
    fn from(err: serde_json::Error) -> Self {
        Self::Manifest(err.to_string())
    }
}

/// Plugin metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginMetadata {
    /// Unique registry key
    pub name: String,
    /// Plugin version
    pub version: Version,
    /// Short description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Plugins that must not be active alongside this one
    #[serde(default)]
    pub conflicts: Vec<String>,
    /// Plugins that must be resolved before this one, in order
    #[serde(default)]
    pub dependencies: Vec<String>,
}

impl PluginMetadata {
    /// Create metadata with no relations
    #[must_use]
    pub fn new(name: impl Into<String>, version: Version) -> Self {
        Self {
            name: name.into(),
            version,
            description: None,
            conflicts: Vec::new(),
            dependencies: Vec::new(),
        }
    }
}

/// A named syntax pattern contributed to the parser
#[derive(Debug, Clone)]
pub struct SyntaxExtension {
    /// Extension name
    pub name: String,
    /// Compiled pattern
    pub pattern: Regex,
}

impl SyntaxExtension {
    /// Source of the pattern
    #[must_use]
    pub fn pattern_str(&self) -> &str {
        self.pattern.as_str()
    }
}

/// Lifecycle phase a hook is attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HookPhase {
    /// Raw source, before parsing
    BeforeParse,
    /// Program, right after parsing
    AfterParse,
    /// Program, right before code generation
    BeforeGenerate,
    /// Emitted code, after generation
    AfterGenerate,
}

impl HookPhase {
    /// All phases in lifecycle order
    pub const ALL: [HookPhase; 4] = [
        HookPhase::BeforeParse,
        HookPhase::AfterParse,
        HookPhase::BeforeGenerate,
        HookPhase::AfterGenerate,
    ];

    /// Phase name as used in hook tables
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            HookPhase::BeforeParse => "beforeParse",
            HookPhase::AfterParse => "afterParse",
            HookPhase::BeforeGenerate => "beforeGenerate",
            HookPhase::AfterGenerate => "afterGenerate",
        }
    }
}

impl fmt::Display for HookPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HookPhase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|phase| phase.as_str() == s)
            .ok_or_else(|| format!("Unknown hook phase: {}", s))
    }
}

/// Phases whose hooks transform a program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProgramPhase {
    /// After parsing
    AfterParse,
    /// Before code generation
    BeforeGenerate,
}

impl From<ProgramPhase> for HookPhase {
    fn from(phase: ProgramPhase) -> Self {
        match phase {
            ProgramPhase::AfterParse => HookPhase::AfterParse,
            ProgramPhase::BeforeGenerate => HookPhase::BeforeGenerate,
        }
    }
}

/// Phases whose hooks transform text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourcePhase {
    /// Before parsing
    BeforeParse,
    /// After code generation
    AfterGenerate,
}

impl From<SourcePhase> for HookPhase {
    fn from(phase: SourcePhase) -> Self {
        match phase {
            SourcePhase::BeforeParse => HookPhase::BeforeParse,
            SourcePhase::AfterGenerate => HookPhase::AfterGenerate,
        }
    }
}

/// Optional lifecycle hooks; each one must be total over its input
#[derive(Clone, Default)]
pub struct PluginHooks {
    /// Rewrites raw source
    pub before_parse: Option<SourceHook>,
    /// Rewrites the parsed program
    pub after_parse: Option<ProgramHook>,
    /// Rewrites the program handed to the generator
    pub before_generate: Option<ProgramHook>,
    /// Rewrites emitted code
    pub after_generate: Option<SourceHook>,
}

impl PluginHooks {
    /// Program hook for a phase
    #[must_use]
    pub fn program_hook(&self, phase: ProgramPhase) -> Option<&ProgramHook> {
        match phase {
            ProgramPhase::AfterParse => self.after_parse.as_ref(),
            ProgramPhase::BeforeGenerate => self.before_generate.as_ref(),
        }
    }

    /// Source hook for a phase
    #[must_use]
    pub fn source_hook(&self, phase: SourcePhase) -> Option<&SourceHook> {
        match phase {
            SourcePhase::BeforeParse => self.before_parse.as_ref(),
            SourcePhase::AfterGenerate => self.after_generate.as_ref(),
        }
    }

    /// Phases that have a hook attached
    #[must_use]
    pub fn phases(&self) -> Vec<HookPhase> {
        HookPhase::ALL
            .into_iter()
            .filter(|phase| match phase {
                HookPhase::BeforeParse => self.before_parse.is_some(),
                HookPhase::AfterParse => self.after_parse.is_some(),
                HookPhase::BeforeGenerate => self.before_generate.is_some(),
                HookPhase::AfterGenerate => self.after_generate.is_some(),
            })
            .collect()
    }
}

impl fmt::Debug for PluginHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.phases()).finish()
    }
}

/// A plugin definition
#[derive(Clone)]
pub struct Plugin {
    /// Metadata
    pub metadata: PluginMetadata,
    /// Syntax extensions
    pub syntax: Vec<SyntaxExtension>,
    /// Item transforms keyed by item kind
    pub transforms: IndexMap<String, ItemTransform>,
    /// Lifecycle hooks
    pub hooks: PluginHooks,
}

impl Plugin {
    /// Create a plugin with no extensions
    #[must_use]
    pub fn new(name: impl Into<String>, version: Version) -> Self {
        Self::from_metadata(PluginMetadata::new(name, version))
    }

    /// Create a plugin from metadata
    #[must_use]
    pub fn from_metadata(metadata: PluginMetadata) -> Self {
        Self {
            metadata,
            syntax: Vec::new(),
            transforms: IndexMap::new(),
            hooks: PluginHooks::default(),
        }
    }

    /// Registry key
    #[must_use]
    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    /// Plugin version
    #[must_use]
    pub fn version(&self) -> Version {
        self.metadata.version
    }

    /// Set the description
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.metadata.description = Some(description.into());
        self
    }

    /// Declare a dependency
    #[must_use]
    pub fn depends_on(mut self, name: impl Into<String>) -> Self {
        self.metadata.dependencies.push(name.into());
        self
    }

    /// Declare a conflict
    #[must_use]
    pub fn conflicts_with(mut self, name: impl Into<String>) -> Self {
        self.metadata.conflicts.push(name.into());
        self
    }

    /// Add a syntax extension
    ///
    /// # Errors
    ///
    /// Returns error if the pattern is not a valid regular expression
    pub fn with_syntax(
        mut self,
        name: impl Into<String>,
        pattern: &str,
    ) -> Result<Self, PluginError> {
        let name = name.into();
        let pattern = Regex::new(pattern).map_err(|source| PluginError::InvalidPattern {
            plugin: self.metadata.name.clone(),
            name: name.clone(),
            source,
        })?;
        self.syntax.push(SyntaxExtension { name, pattern });
        Ok(self)
    }

    /// Add a transform for items of `kind`
    #[must_use]
    pub fn with_transform<F>(mut self, kind: impl Into<String>, transform: F) -> Self
    where
        F: Fn(Item) -> Item + Send + Sync + 'static,
    {
        self.transforms.insert(kind.into(), Arc::new(transform));
        self
    }

    /// Attach a before-parse hook
    #[must_use]
    pub fn before_parse<F>(mut self, hook: F) -> Self
    where
        F: Fn(String) -> String + Send + Sync + 'static,
    {
        self.hooks.before_parse = Some(Arc::new(hook));
        self
    }

    /// Attach an after-parse hook
    #[must_use]
    pub fn after_parse<F>(mut self, hook: F) -> Self
    where
        F: Fn(Program) -> Program + Send + Sync + 'static,
    {
        self.hooks.after_parse = Some(Arc::new(hook));
        self
    }

    /// Attach a before-generate hook
    #[must_use]
    pub fn before_generate<F>(mut self, hook: F) -> Self
    where
        F: Fn(Program) -> Program + Send + Sync + 'static,
    {
        self.hooks.before_generate = Some(Arc::new(hook));
        self
    }

    /// Attach an after-generate hook
    #[must_use]
    pub fn after_generate<F>(mut self, hook: F) -> Self
    where
        F: Fn(String) -> String + Send + Sync + 'static,
    {
        self.hooks.after_generate = Some(Arc::new(hook));
        self
    }
}

impl fmt::Debug for Plugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Plugin")
            .field("metadata", &self.metadata)
            .field("syntax", &self.syntax)
            .field("transforms", &self.transforms.keys().collect::<Vec<_>>())
            .field("hooks", &self.hooks)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::{Block, Location};

    #[test]
    fn test_plugin_builder() {
        let plugin = Plugin::new("macros", Version::new(1, 0, 0))
            .with_description("Macro expansion")
            .depends_on("core")
            .conflicts_with("legacy_macros")
            .with_syntax("macro_call", r"\w+!\(")
            .unwrap()
            .after_parse(|program| program);

        assert_eq!(plugin.name(), "macros");
        assert_eq!(plugin.version(), Version::new(1, 0, 0));
        assert_eq!(plugin.metadata.dependencies, vec!["core"]);
        assert_eq!(plugin.metadata.conflicts, vec!["legacy_macros"]);
        assert_eq!(plugin.syntax[0].pattern_str(), r"\w+!\(");
        assert_eq!(plugin.hooks.phases(), vec![HookPhase::AfterParse]);
    }

    #[test]
    fn test_invalid_pattern() {
        let err = Plugin::new("broken", Version::default())
            .with_syntax("open_paren", "(")
            .unwrap_err();
        assert!(matches!(err, PluginError::InvalidPattern { .. }));
        assert!(err.to_string().contains("open_paren"));
    }

    #[test]
    fn test_hooks_by_phase() {
        let plugin = Plugin::new("shout", Version::default())
            .before_parse(|src| src.to_uppercase())
            .before_generate(|program| program);

        assert!(plugin.hooks.source_hook(SourcePhase::BeforeParse).is_some());
        assert!(plugin.hooks.source_hook(SourcePhase::AfterGenerate).is_none());
        assert!(plugin.hooks.program_hook(ProgramPhase::BeforeGenerate).is_some());
        assert!(plugin.hooks.program_hook(ProgramPhase::AfterParse).is_none());

        let hook = plugin.hooks.source_hook(SourcePhase::BeforeParse).unwrap();
        assert_eq!(hook("abc".to_string()), "ABC");
    }

    #[test]
    fn test_transform_registered_by_kind() {
        let plugin = Plugin::new("relocate", Version::default()).with_transform("block", |item| {
            match item {
                Item::Block(mut block) => {
                    block.location = Location::new(0, 0);
                    Item::Block(block)
                }
                other => other,
            }
        });
        let transform = plugin.transforms.get("block").unwrap();
        let out = transform(Item::Block(Block::named("a", Location::new(5, 5))));
        assert_eq!(out.location(), Some(Location::new(0, 0)));
    }

    #[test]
    fn test_hook_phase_names() {
        assert_eq!(HookPhase::BeforeParse.to_string(), "beforeParse");
        assert_eq!("afterGenerate".parse::<HookPhase>().unwrap(), HookPhase::AfterGenerate);
        assert!("duringParse".parse::<HookPhase>().is_err());
        assert_eq!(HookPhase::from(ProgramPhase::AfterParse), HookPhase::AfterParse);
        assert_eq!(
            serde_json::to_string(&HookPhase::BeforeGenerate).unwrap(),
            "\"beforeGenerate\""
        );
    }

    #[test]
    fn test_metadata_from_json() {
        let meta: PluginMetadata =
            serde_json::from_str(r#"{"name": "jsx", "version": "0.2.0", "dependencies": ["dom"]}"#)
                .unwrap();
        assert_eq!(meta.name, "jsx");
        assert_eq!(meta.version, Version::new(0, 2, 0));
        assert_eq!(meta.dependencies, vec!["dom"]);
        assert!(meta.conflicts.is_empty());
    }
}
