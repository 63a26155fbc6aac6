//! Block types, sparse chunk storage, and the chunk-keyed world map.

pub mod block;
pub mod chunk;
pub mod chunk_loading;
pub mod coords;
pub mod world;

pub use block::{BlockType, Transparency, UnknownBlockId};
pub use chunk::{Chunk, MESH_DIRTY};
pub use chunk_loading::{ChunkLoadTickResult, ChunkLoader};
pub use coords::{BlockPos, CHUNK_SIZE, ChunkPos, LocalPos, WORLD_HEIGHT};
pub use world::{BlockAccess, BlockEdit, BlockWrite, World};
