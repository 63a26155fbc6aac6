//! The chunk store and the block accessor that fronts it.
//!
//! [`World`] owns every loaded [`Chunk`], keyed by [`ChunkPos`] in an
//! [`FxHashMap`]. All block reads and writes in world coordinates go through
//! [`World::get_block`] and [`World::set_block`].

use rustc_hash::FxHashMap;

use crate::block::BlockType;
use crate::chunk::Chunk;
use crate::coords::{BlockPos, ChunkPos, LocalPos};

/// Read-only block lookup in world coordinates.
///
/// Unloaded chunks and positions outside the vertical range read as Air.
pub trait BlockAccess {
    fn get_block(&self, pos: BlockPos) -> BlockType;
}

/// Block writes in world coordinates.
///
/// Writes into unloaded chunks are no-ops that return `None`.
pub trait BlockWrite: BlockAccess {
    fn set_block(&mut self, pos: BlockPos, block: BlockType) -> Option<BlockEdit>;
}

/// Record of an applied [`World::set_block`] call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlockEdit {
    pub pos: BlockPos,
    pub chunk: ChunkPos,
    pub local: LocalPos,
    pub previous: BlockType,
    pub current: BlockType,
}

impl BlockEdit {
    /// Whether the write changed the stored block.
    pub fn changed(&self) -> bool {
        self.previous != self.current
    }
}

/// Sparse map of loaded chunks. At most one chunk per coordinate.
#[derive(Debug, Default)]
pub struct World {
    chunks: FxHashMap<ChunkPos, Chunk>,
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a chunk, replacing any chunk already at `pos`.
    pub fn insert_chunk(&mut self, pos: ChunkPos, chunk: Chunk) {
        self.chunks.insert(pos, chunk);
    }

    /// Removes and returns the chunk at `pos`.
    pub fn remove_chunk(&mut self, pos: ChunkPos) -> Option<Chunk> {
        self.chunks.remove(&pos)
    }

    pub fn chunk(&self, pos: ChunkPos) -> Option<&Chunk> {
        self.chunks.get(&pos)
    }

    pub fn chunk_mut(&mut self, pos: ChunkPos) -> Option<&mut Chunk> {
        self.chunks.get_mut(&pos)
    }

    pub fn contains_chunk(&self, pos: ChunkPos) -> bool {
        self.chunks.contains_key(&pos)
    }

    pub fn loaded_count(&self) -> usize {
        self.chunks.len()
    }

    pub fn loaded_positions(&self) -> impl Iterator<Item = ChunkPos> + '_ {
        self.chunks.keys().copied()
    }

    /// Positions of loaded chunks with `flag` set.
    pub fn dirty_positions(&self, flag: u8) -> Vec<ChunkPos> {
        self.chunks
            .iter()
            .filter(|(_, chunk)| chunk.is_dirty(flag))
            .map(|(pos, _)| *pos)
            .collect()
    }

    /// Sets `flag` on the chunk at `pos` if it is loaded. Returns whether it was.
    pub fn mark_dirty(&mut self, pos: ChunkPos, flag: u8) -> bool {
        match self.chunks.get_mut(&pos) {
            Some(chunk) => {
                chunk.mark_dirty(flag);
                true
            }
            None => false,
        }
    }

    /// Block at a world position. Air when the chunk is not loaded.
    pub fn get_block(&self, pos: BlockPos) -> BlockType {
        let Some((chunk_pos, local)) = pos.split() else {
            return BlockType::Air;
        };
        self.chunks
            .get(&chunk_pos)
            .map_or(BlockType::Air, |chunk| chunk.get(local))
    }

    /// Writes a block at a world position.
    ///
    /// Returns `None` without side effects when the owning chunk is not
    /// loaded or `y` is outside the world. Writing never creates a chunk.
    pub fn set_block(&mut self, pos: BlockPos, block: BlockType) -> Option<BlockEdit> {
        let (chunk_pos, local) = pos.split()?;
        let Some(chunk) = self.chunks.get_mut(&chunk_pos) else {
            tracing::trace!("Ignoring write to unloaded chunk {:?}", chunk_pos);
            return None;
        };
        let previous = chunk.set(local, block);
        Some(BlockEdit {
            pos,
            chunk: chunk_pos,
            local,
            previous,
            current: block,
        })
    }
}

impl BlockAccess for World {
    fn get_block(&self, pos: BlockPos) -> BlockType {
        World::get_block(self, pos)
    }
}

impl BlockWrite for World {
    fn set_block(&mut self, pos: BlockPos, block: BlockType) -> Option<BlockEdit> {
        World::set_block(self, pos, block)
    }
}
