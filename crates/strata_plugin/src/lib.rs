//! STRATA Plugin System
//!
//! Optional syntax and transform extensions. Plugins are registered in an
//! explicitly constructed registry, resolved dependency-first for each
//! compile session, and applied to programs through a left-to-right
//! pipeline.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod manifest;
pub mod pipeline;
pub mod plugin;
pub mod registry;
pub mod resolver;

pub use manifest::{PluginManifest, SyntaxDecl};
pub use pipeline::{Pipeline, SyntaxMatch};
pub use plugin::{
    HookPhase, ItemTransform, Plugin, PluginError, PluginHooks, PluginMetadata, ProgramHook,
    ProgramPhase, SourceHook, SourcePhase, SyntaxExtension,
};
pub use registry::{PluginRegistry, RegistryConflict, RegistryError, SharedRegistry};
pub use resolver::{
    ConflictPolicy, PluginConflict, PluginResolution, PluginResolver, ResolutionReport,
};
