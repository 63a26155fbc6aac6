//! Face-culled chunk meshing and mesh cache maintenance.

pub mod chunk_mesh;
pub mod face_direction;
pub mod invalidation;
pub mod mesh_store;
pub mod mesher;
pub mod visible_faces;

pub use chunk_mesh::{ChunkMesh, MeshFace, MeshVertex};
pub use face_direction::FaceDirection;
pub use invalidation::MeshInvalidator;
pub use mesh_store::MeshStore;
pub use mesher::{build_chunk_mesh, compute_visible_faces};
pub use visible_faces::VisibleFaces;
