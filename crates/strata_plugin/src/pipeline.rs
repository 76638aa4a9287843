//! Applies resolved plugins to sources and programs.
//!
//! Every stage folds left to right in resolved order: each plugin's hook
//! receives the previous plugin's output. Plugins without a hook for the
//! phase are skipped. Hook output is not validated here.

use crate::plugin::{Plugin, ProgramPhase, SourcePhase};
use crate::resolver::PluginResolution;
use serde::{Deserialize, Serialize};
use strata_core::{Item, Program};
use tracing::trace;

/// A syntax extension match in raw source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyntaxMatch {
    /// Contributing plugin
    pub plugin: String,
    /// Extension name
    pub extension: String,
    /// Byte offset of the match start
    pub start: usize,
    /// Byte offset one past the match end
    pub end: usize,
    /// Matched text
    pub text: String,
}

/// Ordered set of plugins applied during a compile session
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    plugins: Vec<Plugin>,
}

impl Pipeline {
    /// Create a pipeline over plugins already in resolved order
    #[must_use]
    pub fn new(plugins: Vec<Plugin>) -> Self {
        Self { plugins }
    }

    /// Plugins in application order
    #[must_use]
    pub fn plugins(&self) -> &[Plugin] {
        &self.plugins
    }

    /// Fold a program through every hook registered for `phase`
    #[must_use]
    pub fn run_program(&self, phase: ProgramPhase, program: Program) -> Program {
        self.plugins.iter().fold(program, |program, plugin| {
            match plugin.hooks.program_hook(phase) {
                Some(hook) => {
                    trace!(
                        plugin = plugin.name(),
                        phase = %crate::HookPhase::from(phase),
                        "Applying hook"
                    );
                    hook(program)
                }
                None => program,
            }
        })
    }

    /// Fold text through every hook registered for `phase`
    #[must_use]
    pub fn run_source(&self, phase: SourcePhase, source: String) -> String {
        self.plugins.iter().fold(source, |source, plugin| {
            match plugin.hooks.source_hook(phase) {
                Some(hook) => {
                    trace!(
                        plugin = plugin.name(),
                        phase = %crate::HookPhase::from(phase),
                        "Applying hook"
                    );
                    hook(source)
                }
                None => source,
            }
        })
    }

    /// Run before-parse hooks over raw source
    #[must_use]
    pub fn run_before_parse(&self, source: String) -> String {
        self.run_source(SourcePhase::BeforeParse, source)
    }

    /// Run after-parse hooks over the parsed program
    #[must_use]
    pub fn run_after_parse(&self, program: Program) -> Program {
        self.run_program(ProgramPhase::AfterParse, program)
    }

    /// Run before-generate hooks over the program handed to the generator
    #[must_use]
    pub fn run_before_generate(&self, program: Program) -> Program {
        self.run_program(ProgramPhase::BeforeGenerate, program)
    }

    /// Run after-generate hooks over emitted code
    #[must_use]
    pub fn run_after_generate(&self, code: String) -> String {
        self.run_source(SourcePhase::AfterGenerate, code)
    }

    /// Map every top-level item through the transforms keyed by its kind
    #[must_use]
    pub fn apply_transforms(&self, program: Program) -> Program {
        let items = program
            .items
            .into_iter()
            .map(|item| {
                self.plugins.iter().fold(item, |item, plugin| {
                    match plugin.transforms.get(item.kind()).cloned() {
                        Some(transform) => transform(item),
                        None => item,
                    }
                })
            })
            .collect();
        Program { items }
    }

    /// Find every syntax extension match in `source`, plugin by plugin
    #[must_use]
    pub fn scan_syntax(&self, source: &str) -> Vec<SyntaxMatch> {
        let mut matches = Vec::new();
        for plugin in &self.plugins {
            for extension in &plugin.syntax {
                matches.extend(extension.pattern.find_iter(source).map(|m| SyntaxMatch {
                    plugin: plugin.name().to_string(),
                    extension: extension.name.clone(),
                    start: m.start(),
                    end: m.end(),
                    text: m.as_str().to_string(),
                }));
            }
        }
        matches
    }
}

impl From<PluginResolution> for Pipeline {
    fn from(resolution: PluginResolution) -> Self {
        Self::new(resolution.resolved)
    }
}

impl From<&PluginResolution> for Pipeline {
    fn from(resolution: &PluginResolution) -> Self {
        Self::new(resolution.resolved.clone())
    }
}
