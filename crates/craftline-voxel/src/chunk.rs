//! Sparse per-chunk block storage with mesh-dirty tracking and versioning.
//!
//! Only non-air cells are stored; reading an absent cell yields
//! [`BlockType::Air`] and writing Air removes the entry.

use rustc_hash::FxHashMap;

use crate::block::BlockType;
use crate::coords::LocalPos;

/// Dirty-flag bit: the chunk's mesh no longer matches its blocks.
pub const MESH_DIRTY: u8 = 0b0000_0001;

/// A 16×64×16 column of blocks.
#[derive(Clone, Debug, Default)]
pub struct Chunk {
    blocks: FxHashMap<LocalPos, BlockType>,
    dirty: u8,
    version: u64,
}

impl Chunk {
    /// An all-air chunk.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, local: LocalPos) -> BlockType {
        self.blocks.get(&local).copied().unwrap_or(BlockType::Air)
    }

    /// Writes `block` at `local` and returns the previous value.
    ///
    /// The chunk is marked [`MESH_DIRTY`] and its version bumped only when
    /// the stored value actually changes.
    pub fn set(&mut self, local: LocalPos, block: BlockType) -> BlockType {
        let previous = if block.is_air() {
            self.blocks.remove(&local)
        } else {
            self.blocks.insert(local, block)
        }
        .unwrap_or(BlockType::Air);

        if previous != block {
            self.dirty |= MESH_DIRTY;
            self.version += 1;
        }
        previous
    }

    /// Writes `block` only if the cell is currently air. Returns whether it wrote.
    pub fn set_if_air(&mut self, local: LocalPos, block: BlockType) -> bool {
        if self.blocks.contains_key(&local) {
            return false;
        }
        self.set(local, block);
        true
    }

    /// Number of stored (non-air) cells.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Iterates over stored (non-air) cells in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (LocalPos, BlockType)> + '_ {
        self.blocks.iter().map(|(pos, block)| (*pos, *block))
    }

    pub fn is_dirty(&self, flag: u8) -> bool {
        self.dirty & flag != 0
    }

    pub fn mark_dirty(&mut self, flag: u8) {
        self.dirty |= flag;
    }

    pub fn clear_dirty(&mut self, flag: u8) {
        self.dirty &= !flag;
    }

    /// Monotonic counter bumped on every effective block change.
    pub fn version(&self) -> u64 {
        self.version
    }
}
