//! Program model produced by the parser.
//!
//! A [`Program`] is an ordered list of top-level [`Item`]s. The core never
//! mutates a program in place: laws borrow it, pipeline hooks consume one
//! program and return a new one.

use crate::error::CoreResult;
use crate::location::Location;
use crate::phase::{Epoch, Phase};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A declared atomic unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    /// Identifier; anonymous blocks exist but cannot be referenced
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Where the block was declared
    #[serde(default)]
    pub location: Location,
    /// Structural body, opaque to verification
    #[serde(default)]
    pub body: IndexMap<String, serde_json::Value>,
}

impl Block {
    /// Create an identified block
    #[must_use]
    pub fn named(id: impl Into<String>, location: Location) -> Self {
        Self {
            id: Some(id.into()),
            location,
            body: IndexMap::new(),
        }
    }

    /// Create an anonymous block
    #[must_use]
    pub fn anonymous(location: Location) -> Self {
        Self {
            id: None,
            location,
            body: IndexMap::new(),
        }
    }

    /// Add a body field
    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.body.insert(key.into(), value);
        self
    }
}

/// A proposed transition to a new phase and epoch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateProposal {
    /// Target phase
    pub phase: Phase,
    /// Target epoch
    #[serde(default)]
    pub epoch: Epoch,
    /// Blocks introduced by the transition
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub blocks: Vec<Block>,
    /// Where the proposal was declared
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
}

impl StateProposal {
    /// Create a proposal
    #[must_use]
    pub fn new(phase: Phase, epoch: u64) -> Self {
        Self {
            phase,
            epoch: Epoch::new(epoch),
            blocks: Vec::new(),
            location: None,
        }
    }

    /// Set the location
    #[must_use]
    pub fn at(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    /// Attach a block
    #[must_use]
    pub fn with_block(mut self, block: Block) -> Self {
        self.blocks.push(block);
        self
    }
}

/// Top-level program item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Item {
    /// Block declaration
    Block(Block),
    /// State proposal
    State(StateProposal),
    /// Any other item kind; carried through untouched
    Other {
        /// Item kind as named by the parser
        kind: String,
        /// Where the item was declared
        #[serde(default, skip_serializing_if = "Option::is_none")]
        location: Option<Location>,
        /// Raw payload
        #[serde(default)]
        payload: serde_json::Value,
    },
}

impl Item {
    /// Kind name used to key transform handlers
    #[must_use]
    pub fn kind(&self) -> &str {
        match self {
            Item::Block(_) => "block",
            Item::State(_) => "state",
            Item::Other { kind, .. } => kind,
        }
    }

    /// Declared location, if any
    #[must_use]
    pub fn location(&self) -> Option<Location> {
        match self {
            Item::Block(block) => Some(block.location),
            Item::State(state) => state.location,
            Item::Other { location, .. } => *location,
        }
    }
}

impl From<Block> for Item {
    fn from(block: Block) -> Self {
        Item::Block(block)
    }
}

impl From<StateProposal> for Item {
    fn from(state: StateProposal) -> Self {
        Item::State(state)
    }
}

/// Parsed program
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Program {
    /// Top-level items in source order
    #[serde(default)]
    pub items: Vec<Item>,
}

impl Program {
    /// Create an empty program
    #[must_use]
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Append an item
    #[must_use]
    pub fn with_item(mut self, item: impl Into<Item>) -> Self {
        self.items.push(item.into());
        self
    }

    /// Top-level blocks in source order
    pub fn blocks(&self) -> impl Iterator<Item = &Block> {
        self.items.iter().filter_map(|item| match item {
            Item::Block(block) => Some(block),
            _ => None,
        })
    }

    /// State proposals in source order
    pub fn proposals(&self) -> impl Iterator<Item = &StateProposal> {
        self.items.iter().filter_map(|item| match item {
            Item::State(state) => Some(state),
            _ => None,
        })
    }

    /// Number of top-level items
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if the program has no items
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Decode a program from JSON
    ///
    /// # Errors
    ///
    /// Returns error if the JSON does not describe a program
    pub fn from_json(json: &str) -> CoreResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Encode the program as pretty JSON
    ///
    /// # Errors
    ///
    /// Returns error if a body value cannot be encoded
    pub fn to_json(&self) -> CoreResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
