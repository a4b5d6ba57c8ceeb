//! Chain state owned by the scheduler.

use aln_04_block_model::Block;

/// Finalized blocks by height, genesis first.
#[derive(Debug, Default)]
pub struct ChainState {
    blocks: Vec<Block>,
}

impl ChainState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_initialized(&self) -> bool {
        !self.blocks.is_empty()
    }

    pub fn tip(&self) -> Option<&Block> {
        self.blocks.last()
    }

    /// Height of the tip, 0 before genesis.
    pub fn height(&self) -> u64 {
        self.tip().map(Block::height).unwrap_or(0)
    }

    /// Append a finalized block. The caller guarantees linkage.
    pub fn push(&mut self, block: Block) {
        self.blocks.push(block);
    }

    pub fn get(&self, height: u64) -> Option<&Block> {
        usize::try_from(height).ok().and_then(|i| self.blocks.get(i))
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }
}
