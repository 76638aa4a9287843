//! Source locations attached by the parser.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Line/column position of a declaration (1-based, as the parser reports it)
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Location {
    /// Line number
    pub line: u32,
    /// Column number
    pub column: u32,
}

impl Location {
    /// Create a new location
    #[must_use]
    pub const fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}
