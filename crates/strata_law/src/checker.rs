//! Law checker.
//!
//! Builds the verification context once, then evaluates the requested laws
//! in the order given. Unknown law names become violations instead of
//! errors, so one bad name never hides the results of the others.

use crate::builtin::BuiltinLaw;
use crate::context::VerificationContext;
use crate::law::{Law, LawResult, LawViolation};
use crate::registry::LawRegistry;
use strata_core::Program;
use tracing::{debug, warn};

/// Evaluates laws against programs
#[derive(Debug, Default)]
pub struct LawChecker {
    registry: LawRegistry,
}

impl LawChecker {
    /// Create a checker with only the built-in laws
    #[must_use]
    pub fn new() -> Self {
        Self {
            registry: LawRegistry::new(),
        }
    }

    /// Create a checker over an existing registry
    #[must_use]
    pub fn with_registry(registry: LawRegistry) -> Self {
        Self { registry }
    }

    /// Add a caller-supplied law (overrides a built-in of the same name)
    #[must_use]
    pub fn with_law(mut self, law: impl Law + 'static) -> Self {
        self.registry.insert(Box::new(law));
        self
    }

    /// Access the registry
    #[must_use]
    pub fn registry(&self) -> &LawRegistry {
        &self.registry
    }

    /// Check a program against all built-in laws
    #[must_use]
    pub fn check_all(&self, program: &Program) -> LawResult {
        self.check(program, &BuiltinLaw::names())
    }

    /// Check a program against the named laws, in the order given
    #[must_use]
    pub fn check<S: AsRef<str>>(&self, program: &Program, laws: &[S]) -> LawResult {
        let ctx = VerificationContext::build(program);
        debug!(
            proposals = ctx.proposals.len(),
            blocks = ctx.declarations.len(),
            phase = %ctx.phase,
            epoch = ctx.epoch.as_u64(),
            "Built verification context"
        );

        let mut violations = Vec::new();
        for name in laws {
            let name = name.as_ref();
            match self.registry.get(name) {
                Some(law) => {
                    let found = law.check(&ctx);
                    debug!(law = name, violations = found.len(), "Checked law");
                    violations.extend(found);
                }
                None => {
                    warn!(law = name, "Unknown law requested");
                    violations.push(LawViolation::new(name, format!("Unknown law: {}", name)));
                }
            }
        }

        LawResult::from_violations(violations)
    }

    /// Check with an optional law selection; `None` means all built-ins
    #[must_use]
    pub fn check_selected(&self, program: &Program, laws: Option<&[String]>) -> LawResult {
        match laws {
            Some(laws) => self.check(program, laws),
            None => self.check_all(program),
        }
    }
}
