//! STRATA Core Types
//!
//! The program model handed over by the parser: named blocks, ordered
//! state proposals, the closed phase set and epoch counters.
//! This crate contains pure types and logic with no I/O.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod location;
pub mod phase;
pub mod program;
pub mod version;

// Re-exports
pub use error::{CoreError, CoreResult};
pub use location::Location;
pub use phase::{Epoch, Phase, PhaseParseError};
pub use program::{Block, Item, Program, StateProposal};
pub use version::{Version, VersionError};
