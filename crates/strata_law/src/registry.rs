//! Law registry: built-ins plus caller-supplied laws.

use crate::builtin::BuiltinLaw;
use crate::law::Law;
use indexmap::IndexMap;
use std::str::FromStr;

/// Registry resolving law names to implementations
///
/// Caller-supplied laws shadow built-ins of the same name.
#[derive(Default)]
pub struct LawRegistry {
    /// Extension laws by name
    extensions: IndexMap<String, Box<dyn Law>>,
}

impl LawRegistry {
    /// Create a registry holding only the built-in laws
    #[must_use]
    pub fn new() -> Self {
        Self {
            extensions: IndexMap::new(),
        }
    }

    /// Add or replace an extension law; returns the law it replaced
    pub fn insert(&mut self, law: Box<dyn Law>) -> Option<Box<dyn Law>> {
        let name = law.name().to_string();
        self.extensions.insert(name, law)
    }

    /// Remove an extension law
    pub fn remove(&mut self, name: &str) -> Option<Box<dyn Law>> {
        self.extensions.shift_remove(name)
    }

    /// Resolve a name: extension first, then built-in
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&dyn Law> {
        if let Some(law) = self.extensions.get(name) {
            return Some(law.as_ref());
        }
        BuiltinLaw::from_str(name)
            .ok()
            .map(|law| law.as_static() as &dyn Law)
    }

    /// Check if a name resolves
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Whether a built-in name is shadowed by an extension
    #[must_use]
    pub fn is_overridden(&self, name: &str) -> bool {
        self.extensions.contains_key(name) && BuiltinLaw::from_str(name).is_ok()
    }

    /// Built-in names followed by extension-only names
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = BuiltinLaw::names().into_iter().map(String::from).collect();
        names.extend(
            self.extensions
                .keys()
                .filter(|name| BuiltinLaw::from_str(name).is_err())
                .cloned(),
        );
        names
    }
}

impl std::fmt::Debug for LawRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LawRegistry")
            .field("extensions", &self.extensions.keys().collect::<Vec<_>>())
            .finish()
    }
}
