//! Execution phases and epochs.
//!
//! The phase tag space is closed. Legal transitions form a fixed directed
//! graph; a self-transition is always legal.
//!
//! ```text
//! genesis ──> executing ──> compressing
//!                ^   \           |
//!                |    v          v
//!                └── projecting <┘
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Execution phase of a program state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Initial phase, before anything executes
    #[default]
    #[serde(alias = "initial")]
    Genesis,
    /// Units are executing
    Executing,
    /// State is being compressed
    Compressing,
    /// State is being projected outward
    Projecting,
}

impl Phase {
    /// Every phase, in declaration order
    pub const ALL: [Phase; 4] = [
        Phase::Genesis,
        Phase::Executing,
        Phase::Compressing,
        Phase::Projecting,
    ];

    /// Phases reachable in one step (self-transitions excluded)
    #[must_use]
    pub const fn successors(self) -> &'static [Phase] {
        match self {
            Phase::Genesis => &[Phase::Executing],
            Phase::Executing => &[Phase::Compressing, Phase::Projecting],
            Phase::Compressing => &[Phase::Projecting],
            Phase::Projecting => &[Phase::Executing],
        }
    }

    /// Whether moving from `self` to `next` is legal
    #[must_use]
    pub fn can_transition_to(self, next: Phase) -> bool {
        self == next || self.successors().contains(&next)
    }

    /// Lowercase tag as written in source
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Phase::Genesis => "genesis",
            Phase::Executing => "executing",
            Phase::Compressing => "compressing",
            Phase::Projecting => "projecting",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown phase tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseParseError(pub String);

impl fmt::Display for PhaseParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unknown phase: {}", self.0)
    }
}

impl std::error::Error for PhaseParseError {}

impl FromStr for Phase {
    type Err = PhaseParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "genesis" | "initial" => Ok(Phase::Genesis),
            "executing" => Ok(Phase::Executing),
            "compressing" => Ok(Phase::Compressing),
            "projecting" => Ok(Phase::Projecting),
            other => Err(PhaseParseError(other.to_string())),
        }
    }
}

/// Epoch - monotonically advancing version counter of program state
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Epoch(u64);

impl Epoch {
    /// The initial epoch
    pub const GENESIS: Epoch = Epoch(0);

    /// Create from raw value
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Get raw value
    #[must_use]
    pub const fn as_u64(&self) -> u64 {
        self.0
    }

    /// Whether the program has advanced past the initial epoch
    #[must_use]
    pub const fn is_past_genesis(&self) -> bool {
        self.0 > 0
    }

    /// Next epoch
    #[must_use]
    pub fn next(&self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

impl fmt::Display for Epoch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{}", self.0)
    }
}

impl From<u64> for Epoch {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const EDGES: [(Phase, Phase); 5] = [
        (Phase::Genesis, Phase::Executing),
        (Phase::Executing, Phase::Compressing),
        (Phase::Executing, Phase::Projecting),
        (Phase::Compressing, Phase::Projecting),
        (Phase::Projecting, Phase::Executing),
    ];

    #[test]
    fn test_documented_edges_are_legal() {
        for (from, to) in EDGES {
            assert!(from.can_transition_to(to), "{} -> {}", from, to);
        }
    }

    #[test]
    fn test_self_transition_always_legal() {
        for phase in Phase::ALL {
            assert!(phase.can_transition_to(phase));
        }
    }

    #[test]
    fn test_nothing_returns_to_genesis() {
        for phase in Phase::ALL {
            assert!(!phase.successors().contains(&Phase::Genesis));
        }
        assert!(!Phase::Projecting.can_transition_to(Phase::Compressing));
    }

    #[test]
    fn test_phase_parse() {
        assert_eq!("genesis".parse::<Phase>().unwrap(), Phase::Genesis);
        assert_eq!("initial".parse::<Phase>().unwrap(), Phase::Genesis);
        assert_eq!("projecting".parse::<Phase>().unwrap(), Phase::Projecting);
        assert!("Executing".parse::<Phase>().is_err());
    }

    #[test]
    fn test_phase_serde() {
        assert_eq!(
            serde_json::to_string(&Phase::Compressing).unwrap(),
            "\"compressing\""
        );
        let p: Phase = serde_json::from_str("\"initial\"").unwrap();
        assert_eq!(p, Phase::Genesis);
    }

    #[test]
    fn test_epoch() {
        assert_eq!(Epoch::default(), Epoch::GENESIS);
        assert!(!Epoch::GENESIS.is_past_genesis());
        assert!(Epoch::new(3).is_past_genesis());
        assert_eq!(Epoch::new(3).next(), Epoch::new(4));
        assert!(Epoch::new(1) < Epoch::new(2));
        assert_eq!(serde_json::to_string(&Epoch::new(7)).unwrap(), "7");
        assert_eq!(format!("{}", Epoch::new(7)), "E7");
    }

    proptest::proptest! {
        #[test]
        fn prop_adjacency_matches_table(
            from in proptest::sample::select(Phase::ALL.to_vec()),
            to in proptest::sample::select(Phase::ALL.to_vec())
        ) {
            let listed = EDGES.contains(&(from, to));
            prop_assert_eq!(from.successors().contains(&to), listed);
            prop_assert_eq!(from.can_transition_to(to), from == to || listed);
        }

        #[test]
        fn prop_phase_tag_roundtrip(phase in proptest::sample::select(Phase::ALL.to_vec())) {
            prop_assert_eq!(phase.as_str().parse::<Phase>().unwrap(), phase);
        }

        #[test]
        fn prop_epoch_next_is_greater(n in 0u64..u64::MAX) {
            prop_assert!(Epoch::new(n).next() > Epoch::new(n));
        }
    }
}
