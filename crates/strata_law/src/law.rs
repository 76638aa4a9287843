//! Law trait and verification results.

use crate::context::VerificationContext;
use serde::{Deserialize, Serialize};
use std::fmt;
use strata_core::Location;

/// A named, pure verification rule
///
/// Implementations must not keep state between calls: the same context
/// always yields the same violations in the same order.
pub trait Law: Send + Sync {
    /// Registry name of the law
    fn name(&self) -> &str;

    /// Evaluate the law against a context
    fn check(&self, ctx: &VerificationContext<'_>) -> Vec<LawViolation>;
}

/// Law backed by a closure, for caller-supplied rules
pub struct FnLaw<F> {
    name: String,
    check: F,
}

impl<F> FnLaw<F>
where
    F: Fn(&VerificationContext<'_>) -> Vec<LawViolation> + Send + Sync,
{
    /// Create a named law from a function
    #[must_use]
    pub fn new(name: impl Into<String>, check: F) -> Self {
        Self {
            name: name.into(),
            check,
        }
    }
}

impl<F> Law for FnLaw<F>
where
    F: Fn(&VerificationContext<'_>) -> Vec<LawViolation> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn check(&self, ctx: &VerificationContext<'_>) -> Vec<LawViolation> {
        (self.check)(ctx)
    }
}

/// A single law violation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LawViolation {
    /// Name of the violated law
    pub law: String,
    /// Human-readable message
    pub message: String,
    /// Offending declaration, if known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
}

impl LawViolation {
    /// Create a violation without a location
    #[must_use]
    pub fn new(law: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            law: law.into(),
            message: message.into(),
            location: None,
        }
    }

    /// Attach a location
    #[must_use]
    pub fn at(mut self, location: Option<Location>) -> Self {
        self.location = location;
        self
    }
}

impl fmt::Display for LawViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.law, self.message)?;
        if let Some(location) = self.location {
            write!(f, " at {}", location)?;
        }
        Ok(())
    }
}

/// Aggregate result of a law check
///
/// Validity is always derived from the violations, including when decoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawLawResult")]
pub struct LawResult {
    valid: bool,
    violations: Vec<LawViolation>,
}

#[derive(Deserialize)]
struct RawLawResult {
    #[serde(default)]
    violations: Vec<LawViolation>,
}

impl From<RawLawResult> for LawResult {
    fn from(raw: RawLawResult) -> Self {
        Self::from_violations(raw.violations)
    }
}

impl Default for LawResult {
    fn default() -> Self {
        Self::from_violations(Vec::new())
    }
}

impl LawResult {
    /// Build a result; validity is derived from the violations
    #[must_use]
    pub fn from_violations(violations: Vec<LawViolation>) -> Self {
        Self {
            valid: violations.is_empty(),
            violations,
        }
    }

    /// True iff there are no violations
    #[must_use]
    pub fn valid(&self) -> bool {
        self.valid
    }

    /// Violations in law order, then discovery order
    #[must_use]
    pub fn violations(&self) -> &[LawViolation] {
        &self.violations
    }

    /// Violations raised by one law
    pub fn violations_of<'s>(&'s self, law: &'s str) -> impl Iterator<Item = &'s LawViolation> {
        self.violations.iter().filter(move |v| v.law == law)
    }

    /// Get summary
    #[must_use]
    pub fn summary(&self) -> String {
        if self.valid {
            "All laws hold".to_string()
        } else {
            format!("{} law violation(s)", self.violations.len())
        }
    }
}
