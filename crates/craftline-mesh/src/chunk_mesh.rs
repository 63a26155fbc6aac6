//! Renderable geometry for one chunk: a list of unit block faces plus the
//! vertex and index buffers built from them.

use craftline_voxel::{BlockPos, BlockType};

use crate::face_direction::FaceDirection;

/// A single vertex in world space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    /// Block type for material lookup.
    pub block: BlockType,
}

/// One emitted block face.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MeshFace {
    pub pos: BlockPos,
    pub direction: FaceDirection,
    pub block: BlockType,
}

/// Corner offsets of each face, counter-clockwise seen from outside.
fn face_corners(direction: FaceDirection) -> [[i32; 3]; 4] {
    match direction {
        FaceDirection::PosX => [[1, 0, 0], [1, 1, 0], [1, 1, 1], [1, 0, 1]],
        FaceDirection::NegX => [[0, 0, 1], [0, 1, 1], [0, 1, 0], [0, 0, 0]],
        FaceDirection::PosY => [[0, 1, 1], [1, 1, 1], [1, 1, 0], [0, 1, 0]],
        FaceDirection::NegY => [[0, 0, 0], [1, 0, 0], [1, 0, 1], [0, 0, 1]],
        FaceDirection::PosZ => [[1, 0, 1], [1, 1, 1], [0, 1, 1], [0, 0, 1]],
        FaceDirection::NegZ => [[0, 0, 0], [0, 1, 0], [1, 1, 0], [1, 0, 0]],
    }
}

/// Mesh output of a chunk meshing pass.
#[derive(Clone, Debug, Default)]
pub struct ChunkMesh {
    pub faces: Vec<MeshFace>,
    pub vertices: Vec<MeshVertex>,
    /// Triangle list, 6 indices per face.
    pub indices: Vec<u32>,
}

impl ChunkMesh {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends the quad for one face of the block at `pos`.
    pub fn push_face(&mut self, pos: BlockPos, direction: FaceDirection, block: BlockType) {
        let base = self.vertices.len() as u32;
        let normal = direction.normal();
        for [cx, cy, cz] in face_corners(direction) {
            self.vertices.push(MeshVertex {
                position: [
                    (pos.x + cx) as f32,
                    (pos.y + cy) as f32,
                    (pos.z + cz) as f32,
                ],
                normal,
                block,
            });
        }
        self.indices
            .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        self.faces.push(MeshFace {
            pos,
            direction,
            block,
        });
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    /// Faces emitted for the block at `pos`.
    pub fn faces_of(&self, pos: BlockPos) -> impl Iterator<Item = &MeshFace> {
        self.faces.iter().filter(move |face| face.pos == pos)
    }
}
