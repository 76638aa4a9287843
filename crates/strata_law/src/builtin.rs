//! Built-in laws.

use crate::context::VerificationContext;
use crate::law::{Law, LawViolation};
use indexmap::IndexMap;
use std::fmt;
use std::str::FromStr;
use strata_core::{Location, Phase};

/// The closed set of built-in laws, in registration order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinLaw {
    /// Block identifiers are unique among identified blocks
    UniqueIds,
    /// Proposed phases are reachable from the reference phase
    ValidPhaseTransitions,
    /// No proposal targets an epoch below the reference epoch
    MonotonicEpochs,
    /// Genesis cannot be re-targeted once past epoch zero
    ImmutableGenesis,
    /// Reference resolution; checked by the resolver, always empty here
    ExistenceIsExplicit,
    /// Closed-world references; checked by the resolver, always empty here
    ClosedWorld,
    /// Orphan detection; checked by the resolver, always empty here
    NoOrphanBlocks,
    /// Schema typing; checked by the type checker, always empty here
    SchemaCompliance,
}

pub(crate) static BUILTINS: [BuiltinLaw; 8] = BuiltinLaw::ALL;

impl BuiltinLaw {
    /// All built-in laws in registration order
    pub const ALL: [BuiltinLaw; 8] = [
        BuiltinLaw::UniqueIds,
        BuiltinLaw::ValidPhaseTransitions,
        BuiltinLaw::MonotonicEpochs,
        BuiltinLaw::ImmutableGenesis,
        BuiltinLaw::ExistenceIsExplicit,
        BuiltinLaw::ClosedWorld,
        BuiltinLaw::NoOrphanBlocks,
        BuiltinLaw::SchemaCompliance,
    ];

    /// Registry name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            BuiltinLaw::UniqueIds => "unique_ids",
            BuiltinLaw::ValidPhaseTransitions => "valid_phase_transitions",
            BuiltinLaw::MonotonicEpochs => "monotonic_epochs",
            BuiltinLaw::ImmutableGenesis => "immutable_genesis",
            BuiltinLaw::ExistenceIsExplicit => "existence_is_explicit",
            BuiltinLaw::ClosedWorld => "closed_world",
            BuiltinLaw::NoOrphanBlocks => "no_orphan_blocks",
            BuiltinLaw::SchemaCompliance => "schema_compliance",
        }
    }

    /// Names of all built-in laws in registration order
    #[must_use]
    pub fn names() -> Vec<&'static str> {
        Self::ALL.iter().map(|law| law.as_str()).collect()
    }

    /// Static instance, for handing out `&'static dyn Law`
    #[must_use]
    pub fn as_static(self) -> &'static BuiltinLaw {
        &BUILTINS[self as usize]
    }
}

impl fmt::Display for BuiltinLaw {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BuiltinLaw {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|law| law.as_str() == s)
            .ok_or_else(|| s.to_string())
    }
}

impl Law for BuiltinLaw {
    fn name(&self) -> &str {
        self.as_str()
    }

    fn check(&self, ctx: &VerificationContext<'_>) -> Vec<LawViolation> {
        match self {
            BuiltinLaw::UniqueIds => unique_ids(ctx),
            BuiltinLaw::ValidPhaseTransitions => valid_phase_transitions(ctx),
            BuiltinLaw::MonotonicEpochs => monotonic_epochs(ctx),
            BuiltinLaw::ImmutableGenesis => immutable_genesis(ctx),
            BuiltinLaw::ExistenceIsExplicit
            | BuiltinLaw::ClosedWorld
            | BuiltinLaw::NoOrphanBlocks
            | BuiltinLaw::SchemaCompliance => Vec::new(),
        }
    }
}

fn unique_ids(ctx: &VerificationContext<'_>) -> Vec<LawViolation> {
    let mut first_seen: IndexMap<&str, Location> = IndexMap::new();
    let mut violations = Vec::new();

    for block in &ctx.declarations {
        let Some(id) = block.id.as_deref() else {
            continue;
        };
        match first_seen.get(id) {
            Some(first) => violations.push(
                LawViolation::new(
                    BuiltinLaw::UniqueIds.as_str(),
                    format!("Duplicate block id '{}' (first declared at {})", id, first),
                )
                .at(Some(block.location)),
            ),
            None => {
                first_seen.insert(id, block.location);
            }
        }
    }

    violations
}

fn valid_phase_transitions(ctx: &VerificationContext<'_>) -> Vec<LawViolation> {
    ctx.proposals
        .iter()
        .filter(|proposal| !ctx.phase.can_transition_to(proposal.phase))
        .map(|proposal| {
            LawViolation::new(
                BuiltinLaw::ValidPhaseTransitions.as_str(),
                format!(
                    "Invalid phase transition from {} to {}",
                    ctx.phase, proposal.phase
                ),
            )
            .at(proposal.location)
        })
        .collect()
}

// Compares against the terminal epoch only, not the preceding proposal.
fn monotonic_epochs(ctx: &VerificationContext<'_>) -> Vec<LawViolation> {
    ctx.proposals
        .iter()
        .filter(|proposal| proposal.epoch < ctx.epoch)
        .map(|proposal| {
            LawViolation::new(
                BuiltinLaw::MonotonicEpochs.as_str(),
                format!(
                    "Epoch {} is lower than reference epoch {}",
                    proposal.epoch.as_u64(),
                    ctx.epoch.as_u64()
                ),
            )
            .at(proposal.location)
        })
        .collect()
}

fn immutable_genesis(ctx: &VerificationContext<'_>) -> Vec<LawViolation> {
    if ctx.phase != Phase::Genesis || !ctx.epoch.is_past_genesis() {
        return Vec::new();
    }

    ctx.proposals
        .iter()
        .filter(|proposal| proposal.phase == Phase::Genesis)
        .map(|proposal| {
            LawViolation::new(
                BuiltinLaw::ImmutableGenesis.as_str(),
                format!(
                    "Genesis is immutable after epoch 0 (reference epoch {})",
                    ctx.epoch.as_u64()
                ),
            )
            .at(proposal.location)
        })
        .collect()
}
