//! Face-culled chunk meshing.
//!
//! An opaque block shows a face wherever its neighbor is Air, Water, or
//! Leaves. Water and Leaves always show all six faces. Neighbors are read
//! through [`BlockAccess`], so culling crosses chunk borders; an unloaded
//! neighbor reads as Air and leaves the face exposed.

use craftline_voxel::{BlockAccess, BlockPos, BlockType, ChunkPos, Transparency, World};

use crate::chunk_mesh::ChunkMesh;
use crate::face_direction::FaceDirection;
use crate::visible_faces::VisibleFaces;

/// Faces of `block` at `pos` that must be rendered.
pub fn compute_visible_faces(
    world: &impl BlockAccess,
    pos: BlockPos,
    block: BlockType,
) -> VisibleFaces {
    match block.transparency() {
        Transparency::Empty => VisibleFaces::NONE,
        Transparency::Translucent => VisibleFaces::ALL,
        Transparency::Opaque => {
            let mut faces = VisibleFaces::NONE;
            for dir in FaceDirection::ALL {
                if world.get_block(dir.neighbor(pos)).exposes_neighbor_faces() {
                    faces.set_visible(dir);
                }
            }
            faces
        }
    }
}

/// Builds the mesh for the chunk at `pos`, or `None` if it is not loaded.
pub fn build_chunk_mesh(world: &World, pos: ChunkPos) -> Option<ChunkMesh> {
    let chunk = world.chunk(pos)?;
    let mut mesh = ChunkMesh::new();

    // Sorted so identical block data always yields identical buffers.
    let mut cells: Vec<_> = chunk.iter().collect();
    cells.sort_unstable_by_key(|(local, _)| *local);

    for (local, block) in cells {
        let world_pos = pos.block_at(local);
        for dir in compute_visible_faces(world, world_pos, block).iter() {
            mesh.push_face(world_pos, dir, block);
        }
    }
    Some(mesh)
}
