//! The client's view of the world: loaded chunks, their meshes, and the
//! generator that fills in new chunks as the player moves.
//!
//! Every write goes through [`BlockWrite::set_block`], which rebuilds the
//! meshes the edit touches before returning.

use craftline_mesh::MeshStore;
use craftline_terrain::TerrainSynthesizer;
use craftline_voxel::{
    BlockAccess, BlockEdit, BlockPos, BlockType, BlockWrite, ChunkLoadTickResult, ChunkLoader,
    ChunkPos, MESH_DIRTY, World,
};

/// Horizontal neighbors whose border faces depend on a chunk.
const SEAM_NEIGHBORS: [(i32, i32); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

pub struct LocalWorld {
    world: World,
    meshes: MeshStore,
    terrain: TerrainSynthesizer,
    loader: ChunkLoader,
}

impl LocalWorld {
    pub fn new(seed: u32, render_distance: u32) -> Self {
        Self {
            world: World::new(),
            meshes: MeshStore::new(),
            terrain: TerrainSynthesizer::new(seed),
            loader: ChunkLoader::new(render_distance),
        }
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn meshes(&self) -> &MeshStore {
        &self.meshes
    }

    pub fn seed(&self) -> u32 {
        self.terrain.seed()
    }

    /// Generates and meshes chunks entering the render distance of `center`,
    /// and drops chunks (and meshes) that fell out of range.
    ///
    /// Loaded neighbors of every added or evicted chunk are re-meshed too,
    /// since their border faces were culled against the old state.
    pub fn update_chunks(&mut self, center: ChunkPos) -> ChunkLoadTickResult {
        let terrain = &self.terrain;
        let result = self
            .loader
            .tick(center, &mut self.world, |pos| terrain.generate_chunk(pos));

        for pos in &result.unloaded {
            self.meshes.release(*pos);
        }
        for pos in &result.loaded {
            self.world.mark_dirty(*pos, MESH_DIRTY);
        }
        for pos in result.loaded.iter().chain(&result.unloaded) {
            for (dx, dz) in SEAM_NEIGHBORS {
                self.world.mark_dirty(pos.offset(dx, dz), MESH_DIRTY);
            }
        }
        self.meshes.rebuild_dirty(&mut self.world);

        if !result.loaded.is_empty() || !result.unloaded.is_empty() {
            tracing::debug!(
                "Chunks around {:?}: +{} -{} ({} loaded)",
                center,
                result.loaded.len(),
                result.unloaded.len(),
                self.world.loaded_count()
            );
        }
        result
    }

    /// Total faces across every chunk mesh.
    pub fn face_count(&self) -> usize {
        self.world
            .loaded_positions()
            .filter_map(|pos| self.meshes.get(pos))
            .map(|mesh| mesh.face_count())
            .sum()
    }
}

impl BlockAccess for LocalWorld {
    fn get_block(&self, pos: BlockPos) -> BlockType {
        self.world.get_block(pos)
    }
}

impl BlockWrite for LocalWorld {
    fn set_block(&mut self, pos: BlockPos, block: BlockType) -> Option<BlockEdit> {
        let edit = self.world.set_block(pos, block)?;
        self.meshes.apply_edit(&mut self.world, &edit);
        Some(edit)
    }
}
