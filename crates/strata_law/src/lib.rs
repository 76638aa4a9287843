//! STRATA Law Verification
//!
//! Every state proposal in a program must satisfy a registry of named,
//! pure laws before code is generated. Violations are data: checking
//! never fails, it reports.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod builtin;
pub mod checker;
pub mod context;
pub mod law;
pub mod registry;

pub use builtin::BuiltinLaw;
pub use checker::LawChecker;
pub use context::VerificationContext;
pub use law::{FnLaw, Law, LawResult, LawViolation};
pub use registry::LawRegistry;
