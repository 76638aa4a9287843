//! Verification context built once per check.
//!
//! The reference phase/epoch is a snapshot of the program's terminal
//! state: the last proposal in program order, or genesis at epoch zero.
//! Every law sees the same reference point.

use indexmap::IndexMap;
use strata_core::{Block, Epoch, Item, Phase, Program, StateProposal};

/// Flat view of a program for law evaluation
#[derive(Debug, Clone, PartialEq)]
pub struct VerificationContext<'a> {
    /// Identified blocks by id (indexing only; a later duplicate replaces the entry)
    pub blocks: IndexMap<&'a str, &'a Block>,
    /// Every identified block in program order, duplicates included
    pub declarations: Vec<&'a Block>,
    /// State proposals in program order
    pub proposals: Vec<&'a StateProposal>,
    /// Reference phase
    pub phase: Phase,
    /// Reference epoch
    pub epoch: Epoch,
}

impl<'a> VerificationContext<'a> {
    /// Build the context in a single pass over the program
    #[must_use]
    pub fn build(program: &'a Program) -> Self {
        let mut blocks = IndexMap::new();
        let mut declarations = Vec::new();
        let mut proposals = Vec::new();

        for item in &program.items {
            match item {
                Item::Block(block) => {
                    if let Some(id) = block.id.as_deref() {
                        blocks.insert(id, block);
                        declarations.push(block);
                    }
                }
                Item::State(state) => proposals.push(state),
                Item::Other { .. } => {}
            }
        }

        let (phase, epoch) = proposals
            .last()
            .map(|last| (last.phase, last.epoch))
            .unwrap_or((Phase::Genesis, Epoch::GENESIS));

        Self {
            blocks,
            declarations,
            proposals,
            phase,
            epoch,
        }
    }

    /// Look up a block by id
    #[must_use]
    pub fn block(&self, id: &str) -> Option<&'a Block> {
        self.blocks.get(id).copied()
    }
}

impl<'a> From<&'a Program> for VerificationContext<'a> {
    fn from(program: &'a Program) -> Self {
        Self::build(program)
    }
}
