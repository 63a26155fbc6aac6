//! Owns the derived mesh of every loaded chunk and keeps it current.
//!
//! Block edits mark the affected chunks [`MESH_DIRTY`]; [`MeshStore::rebuild_dirty`]
//! rebuilds them and clears the flag. The version each mesh was built from is
//! recorded so stale meshes can be detected.

use craftline_voxel::{BlockEdit, ChunkPos, MESH_DIRTY, World};
use rustc_hash::FxHashMap;

use crate::chunk_mesh::ChunkMesh;
use crate::invalidation::MeshInvalidator;
use crate::mesher::build_chunk_mesh;

#[derive(Debug)]
struct MeshEntry {
    mesh: ChunkMesh,
    meshed_version: u64,
}

/// Per-chunk mesh cache.
#[derive(Debug, Default)]
pub struct MeshStore {
    meshes: FxHashMap<ChunkPos, MeshEntry>,
    rebuilds: u64,
}

impl MeshStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, pos: ChunkPos) -> Option<&ChunkMesh> {
        self.meshes.get(&pos).map(|entry| &entry.mesh)
    }

    pub fn len(&self) -> usize {
        self.meshes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }

    /// Total meshes built since creation.
    pub fn rebuild_count(&self) -> u64 {
        self.rebuilds
    }

    /// Whether the stored mesh for `pos` predates the chunk's current blocks.
    pub fn is_stale(&self, world: &World, pos: ChunkPos) -> bool {
        match (self.meshes.get(&pos), world.chunk(pos)) {
            (Some(entry), Some(chunk)) => entry.meshed_version != chunk.version(),
            (None, Some(_)) => true,
            _ => false,
        }
    }

    /// Builds (or rebuilds) the mesh of a loaded chunk and clears its dirty flag.
    ///
    /// Returns `false` when the chunk is not loaded.
    pub fn rebuild(&mut self, world: &mut World, pos: ChunkPos) -> bool {
        let Some(mesh) = build_chunk_mesh(world, pos) else {
            return false;
        };
        let Some(chunk) = world.chunk_mut(pos) else {
            return false;
        };
        chunk.clear_dirty(MESH_DIRTY);
        let meshed_version = chunk.version();

        tracing::trace!("Rebuilt mesh {:?}: {} faces", pos, mesh.face_count());
        self.meshes.insert(
            pos,
            MeshEntry {
                mesh,
                meshed_version,
            },
        );
        self.rebuilds += 1;
        true
    }

    /// Rebuilds every loaded chunk flagged [`MESH_DIRTY`]. Returns what was rebuilt.
    pub fn rebuild_dirty(&mut self, world: &mut World) -> Vec<ChunkPos> {
        let mut dirty = world.dirty_positions(MESH_DIRTY);
        dirty.sort();
        dirty.retain(|pos| self.rebuild(world, *pos));
        dirty
    }

    /// Marks the chunks affected by `edit` dirty and rebuilds them.
    ///
    /// Unloaded neighbors are skipped. Returns the rebuilt chunks, edited
    /// chunk first.
    pub fn apply_edit(&mut self, world: &mut World, edit: &BlockEdit) -> Vec<ChunkPos> {
        let mut rebuilt = Vec::new();
        for pos in MeshInvalidator::invalidate(edit.chunk, edit.local) {
            if world.mark_dirty(pos, MESH_DIRTY) && self.rebuild(world, pos) {
                rebuilt.push(pos);
            }
        }
        rebuilt
    }

    /// Drops the mesh of an evicted chunk.
    pub fn release(&mut self, pos: ChunkPos) -> Option<ChunkMesh> {
        self.meshes.remove(&pos).map(|entry| entry.mesh)
    }
}
