//! Per-chunk random streams derived from the world seed.
//!
//! Every session that loads the same chunk with the same world seed sees the
//! same random draws, regardless of load order. The mix is a fixed
//! SplitMix64 finalizer.

use craftline_voxel::ChunkPos;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

fn splitmix64(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Combine the world seed and chunk coordinate into a well-mixed `u64`.
pub fn derive_chunk_seed(world_seed: u32, pos: ChunkPos) -> u64 {
    let packed = (u64::from(pos.x as u32) << 32) | u64::from(pos.z as u32);
    splitmix64(splitmix64(u64::from(world_seed)) ^ packed)
}

/// Deterministic RNG for one chunk.
pub fn chunk_rng(world_seed: u32, pos: ChunkPos) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(derive_chunk_seed(world_seed, pos))
}
