//! Determines which chunk meshes an edit makes stale.

use craftline_voxel::{CHUNK_SIZE, ChunkPos, LocalPos};

use crate::face_direction::FaceDirection;

/// Maps a block edit to the chunks whose meshes must be rebuilt.
pub struct MeshInvalidator;

impl MeshInvalidator {
    /// Chunks to rebuild after an edit at `local` inside `edited`.
    ///
    /// The edited chunk is always first. An edit on a horizontal chunk
    /// border also lists the chunk across that border, since its border
    /// faces were culled against the edited cell. Chunks span the full
    /// world height, so y never crosses a chunk.
    pub fn invalidate(edited: ChunkPos, local: LocalPos) -> Vec<ChunkPos> {
        let mut dirty = vec![edited];
        let last = (CHUNK_SIZE - 1) as u8;

        if local.x == 0 {
            dirty.push(neighbor(edited, FaceDirection::NegX));
        }
        if local.x == last {
            dirty.push(neighbor(edited, FaceDirection::PosX));
        }
        if local.z == 0 {
            dirty.push(neighbor(edited, FaceDirection::NegZ));
        }
        if local.z == last {
            dirty.push(neighbor(edited, FaceDirection::PosZ));
        }
        dirty
    }
}

fn neighbor(pos: ChunkPos, dir: FaceDirection) -> ChunkPos {
    let (dx, _, dz) = dir.delta();
    pos.offset(dx, dz)
}
