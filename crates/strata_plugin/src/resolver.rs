//! Dependency-first plugin resolution.
//!
//! Requested names are expanded depth-first: every declared dependency is
//! resolved (and therefore appears earlier in the output) before its
//! dependent. A shared `seen` set guarantees termination on cyclic
//! graphs; cycles it truncates are reported separately from missing
//! plugins. Conflicts are advisory and never change the resolved order.

use crate::plugin::Plugin;
use crate::registry::PluginRegistry;
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, trace, warn};

/// What the caller is expected to do about a conflict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictPolicy {
    /// Treat as an error
    Error,
}

/// Conflict detected during resolution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginConflict {
    /// Declaring plugin first, then the already-resolved plugin
    pub names: [String; 2],
    /// Resolution policy tag
    pub resolution: ConflictPolicy,
}

impl std::fmt::Display for PluginConflict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Plugin '{}' conflicts with '{}' ({:?})",
            self.names[0], self.names[1], self.resolution
        )
    }
}

/// Result of resolving a set of requested plugins
#[derive(Debug, Clone, Default)]
pub struct PluginResolution {
    /// Plugins in dependency-first order
    pub resolved: Vec<Plugin>,
    /// Conflicts between resolved plugins
    pub conflicts: Vec<PluginConflict>,
    /// Requested or depended-on names that are not registered
    pub missing: Vec<String>,
    /// Dependency cycles cut short, each as a path ending where it started
    pub cycles: Vec<Vec<String>>,
}

impl PluginResolution {
    /// Names of resolved plugins in order
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.resolved.iter().map(Plugin::name).collect()
    }

    /// Check if any conflict was detected
    #[must_use]
    pub fn has_conflicts(&self) -> bool {
        !self.conflicts.is_empty()
    }

    /// Nothing missing and no cycles
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty() && self.cycles.is_empty()
    }

    /// Serializable summary
    #[must_use]
    pub fn report(&self) -> ResolutionReport {
        ResolutionReport {
            resolved: self.names().into_iter().map(String::from).collect(),
            conflicts: self.conflicts.clone(),
            missing: self.missing.clone(),
            cycles: self.cycles.clone(),
        }
    }
}

/// Plain-data view of a resolution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionReport {
    /// Resolved plugin names in order
    pub resolved: Vec<String>,
    /// Detected conflicts
    pub conflicts: Vec<PluginConflict>,
    /// Missing names
    pub missing: Vec<String>,
    /// Truncated cycles
    pub cycles: Vec<Vec<String>>,
}

/// Resolves requested names against a registry snapshot
#[derive(Debug, Clone, Copy)]
pub struct PluginResolver<'r> {
    registry: &'r PluginRegistry,
}

impl<'r> PluginResolver<'r> {
    /// Create a resolver over a registry
    #[must_use]
    pub fn new(registry: &'r PluginRegistry) -> Self {
        Self { registry }
    }

    /// Resolve requested names in the order given
    ///
    /// One accumulator is shared across all requested names, so a plugin
    /// reachable from several requests appears once.
    #[must_use]
    pub fn resolve<S: AsRef<str>>(&self, requested: &[S]) -> PluginResolution {
        let mut state = ResolveState::default();
        for name in requested {
            self.visit(name.as_ref(), &mut state);
        }

        debug!(
            resolved = state.resolution.resolved.len(),
            conflicts = state.resolution.conflicts.len(),
            missing = state.resolution.missing.len(),
            cycles = state.resolution.cycles.len(),
            "Resolved plugins"
        );
        state.resolution
    }

    // Iterative DFS: each frame is a plugin being expanded and the index of
    // its next dependency. Dependencies are entered pre-order and the plugin
    // is appended once its last dependency is done.
    fn visit(&self, root: &str, state: &mut ResolveState) {
        let Some(plugin) = self.enter(root, state) else {
            return;
        };

        let mut frames: Vec<(&'r Plugin, usize)> = vec![(plugin, 0)];
        while let Some(frame) = frames.last_mut() {
            let plugin = frame.0;
            match plugin.metadata.dependencies.get(frame.1) {
                Some(dependency) => {
                    frame.1 += 1;
                    trace!(
                        plugin = plugin.name(),
                        dependency = %dependency,
                        "Resolving dependency"
                    );
                    if let Some(next) = self.enter(dependency, state) {
                        frames.push((next, 0));
                    }
                }
                None => {
                    frames.pop();
                    self.finish(plugin, state);
                }
            }
        }
    }

    /// Mark `name` seen; returns the plugin when it still needs expanding
    fn enter(&self, name: &str, state: &mut ResolveState) -> Option<&'r Plugin> {
        if state.seen.contains(name) {
            if let Some(start) = state.stack.get_index_of(name) {
                let mut cycle: Vec<String> = state.stack.iter().skip(start).cloned().collect();
                cycle.push(name.to_string());
                warn!(cycle = %cycle.join(" -> "), "Plugin dependency cycle truncated");
                state.resolution.cycles.push(cycle);
            }
            return None;
        }
        state.seen.insert(name.to_string());

        let Some(plugin) = self.registry.get(name) else {
            warn!(plugin = name, "Requested plugin is not registered");
            state.resolution.missing.push(name.to_string());
            return None;
        };

        state.stack.insert(name.to_string());
        Some(plugin)
    }

    fn finish(&self, plugin: &'r Plugin, state: &mut ResolveState) {
        let name = plugin.name();
        state.stack.pop();

        for other in &plugin.metadata.conflicts {
            if state.resolved_names.contains(other.as_str()) {
                state.resolution.conflicts.push(PluginConflict {
                    names: [name.to_string(), other.clone()],
                    resolution: ConflictPolicy::Error,
                });
            }
        }

        state.resolved_names.insert(name.to_string());
        state.resolution.resolved.push(plugin.clone());
    }
}

#[derive(Default)]
struct ResolveState {
    resolution: PluginResolution,
    resolved_names: HashSet<String>,
    seen: HashSet<String>,
    // Names currently being expanded, outermost first
    stack: IndexSet<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use strata_core::Version;

    fn plugin(name: &str, deps: &[&str], conflicts: &[&str]) -> Plugin {
        let base = Plugin::new(name, Version::new(1, 0, 0));
        let base = deps.iter().fold(base, |p, d| p.depends_on(*d));
        conflicts.iter().fold(base, |p, c| p.conflicts_with(*c))
    }

    fn registry(plugins: Vec<Plugin>) -> PluginRegistry {
        let mut registry = PluginRegistry::new();
        for p in plugins {
            registry.register(p).unwrap();
        }
        registry
    }

    #[test]
    fn test_dependencies_precede_dependents() {
        let registry = registry(vec![
            plugin("A", &["B", "C"], &[]),
            plugin("B", &[], &[]),
            plugin("C", &[], &[]),
        ]);
        let resolution = registry.resolve(&["A"]);
        assert_eq!(resolution.names(), vec!["B", "C", "A"]);
        assert!(resolution.conflicts.is_empty());
        assert!(resolution.is_complete());
    }

    #[test]
    fn test_missing_dependency_still_resolves_dependent() {
        let registry = registry(vec![plugin("A", &["ghost", "B"], &[]), plugin("B", &[], &[])]);
        let resolution = registry.resolve(&["A", "nope"]);
        assert_eq!(resolution.names(), vec!["B", "A"]);
        assert_eq!(resolution.missing, vec!["ghost", "nope"]);
        assert!(!resolution.is_complete());
    }

    #[test]
    fn test_mutual_dependency_terminates() {
        let registry = registry(vec![plugin("A", &["B"], &[]), plugin("B", &["A"], &[])]);
        let resolution = registry.resolve(&["A", "B"]);
        assert_eq!(resolution.names(), vec!["B", "A"]);
        assert!(resolution.missing.is_empty());
        assert_eq!(resolution.cycles, vec![vec!["A", "B", "A"]]);
    }

    #[test]
    fn test_self_dependency_is_a_cycle() {
        let registry = registry(vec![plugin("loop", &["loop"], &[])]);
        let resolution = registry.resolve(&["loop"]);
        assert_eq!(resolution.names(), vec!["loop"]);
        assert_eq!(resolution.cycles, vec![vec!["loop", "loop"]]);
    }

    #[test]
    fn test_diamond_is_not_a_cycle() {
        let registry = registry(vec![
            plugin("top", &["left", "right"], &[]),
            plugin("left", &["base"], &[]),
            plugin("right", &["base"], &[]),
            plugin("base", &[], &[]),
        ]);
        let resolution = registry.resolve(&["top"]);
        assert_eq!(resolution.names(), vec!["base", "left", "right", "top"]);
        assert!(resolution.cycles.is_empty());
    }

    #[test]
    fn test_conflicts_are_directional_and_advisory() {
        let registry = registry(vec![
            plugin("jsx", &[], &[]),
            plugin("templates", &[], &["jsx"]),
        ]);

        let resolution = registry.resolve(&["jsx", "templates"]);
        assert_eq!(resolution.names(), vec!["jsx", "templates"]);
        assert_eq!(resolution.conflicts.len(), 1);
        assert_eq!(resolution.conflicts[0].names, ["templates".to_string(), "jsx".to_string()]);
        assert_eq!(resolution.conflicts[0].resolution, ConflictPolicy::Error);

        // The declaring plugin resolved first: nothing to compare against yet.
        let resolution = registry.resolve(&["templates", "jsx"]);
        assert_eq!(resolution.names(), vec!["templates", "jsx"]);
        assert!(!resolution.has_conflicts());
    }

    #[test]
    fn test_mutual_conflict_declarations() {
        let registry = registry(vec![plugin("a", &[], &["b"]), plugin("b", &[], &["a"])]);
        let resolution = registry.resolve(&["a", "b"]);
        assert_eq!(resolution.conflicts.len(), 1);
        assert_eq!(resolution.conflicts[0].names, ["b".to_string(), "a".to_string()]);
    }

    #[test]
    fn test_resolution_does_not_mutate_registry() {
        let registry = registry(vec![plugin("A", &["B"], &[]), plugin("B", &[], &[])]);
        let before = registry.names().join(",");
        let first = registry.resolve(&["A"]).report();
        let second = registry.resolve(&["A"]).report();
        assert_eq!(first, second);
        assert_eq!(registry.names().join(","), before);
    }

    #[test]
    fn test_report_serializes_policy_tag() {
        let registry = registry(vec![plugin("a", &[], &[]), plugin("b", &[], &["a"])]);
        let json = serde_json::to_string(&registry.resolve(&["a", "b"]).report()).unwrap();
        assert!(json.contains(r#""resolution":"error""#));
    }

    #[test]
    fn test_long_dependency_chain() {
        const LEN: usize = 100_000;
        let mut registry = PluginRegistry::new();
        for i in 0..LEN {
            let mut p = Plugin::new(format!("p{}", i), Version::new(1, 0, 0));
            if i + 1 < LEN {
                p = p.depends_on(format!("p{}", i + 1));
            }
            registry.register(p).unwrap();
        }

        let resolution = registry.resolve(&["p0"]);
        let names = resolution.names();
        assert_eq!(names.len(), LEN);
        assert_eq!(names[0], format!("p{}", LEN - 1));
        assert_eq!(names[LEN - 1], "p0");
        assert!(resolution.is_complete());
    }

    #[test]
    fn test_long_cycle_is_recorded() {
        const LEN: usize = 10_000;
        let mut registry = PluginRegistry::new();
        for i in 0..LEN {
            let next = format!("p{}", (i + 1) % LEN);
            registry
                .register(Plugin::new(format!("p{}", i), Version::default()).depends_on(next))
                .unwrap();
        }

        let resolution = registry.resolve(&["p0"]);
        assert_eq!(resolution.resolved.len(), LEN);
        assert_eq!(resolution.cycles.len(), 1);
        assert_eq!(resolution.cycles[0].len(), LEN + 1);
        assert_eq!(resolution.cycles[0][0], "p0");
        assert_eq!(resolution.cycles[0][LEN], "p0");
    }

    proptest! {
        #[test]
        fn prop_resolution_terminates_without_duplicates(
            edges in proptest::collection::vec((0usize..8, 0usize..8), 0..24),
            requested in proptest::collection::vec(0usize..10, 1..6),
        ) {
            let names: Vec<String> = (0..8).map(|i| format!("p{}", i)).collect();
            let mut plugins: Vec<Plugin> = names
                .iter()
                .map(|n| Plugin::new(n.as_str(), Version::default()))
                .collect();
            for (from, to) in edges {
                let dep = names[to].clone();
                plugins[from] = plugins[from].clone().depends_on(dep);
            }
            let registry = registry(plugins);
            let requested: Vec<String> = requested.iter().map(|i| format!("p{}", i)).collect();

            let resolution = registry.resolve(&requested);
            let resolved = resolution.names();
            let unique: HashSet<&str> = resolved.iter().copied().collect();
            prop_assert_eq!(unique.len(), resolved.len());

            // Every dependency outside a cycle appears before its dependent
            let cyclic: HashSet<&str> = resolution
                .cycles
                .iter()
                .flatten()
                .map(String::as_str)
                .collect();
            for (pos, name) in resolved.iter().enumerate() {
                if cyclic.contains(name) {
                    continue;
                }
                let plugin = registry.get(name).unwrap();
                for dep in &plugin.metadata.dependencies {
                    if let Some(dep_pos) = resolved.iter().position(|n| *n == dep.as_str()) {
                        prop_assert!(dep_pos < pos);
                    }
                }
            }

            // p8 and p9 are never registered
            for name in &resolution.missing {
                prop_assert!(name == "p8" || name == "p9");
            }
        }
    }
}
