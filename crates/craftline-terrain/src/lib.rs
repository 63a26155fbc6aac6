//! Deterministic procedural terrain: seeded 2D noise, layered column heights,
//! and tree placement.

mod generator;
mod heightmap;
mod noise;
mod seed;
mod trees;

pub use generator::TerrainSynthesizer;
pub use heightmap::{HeightSampler, Octave};
pub use noise::NoiseField;
pub use seed::{chunk_rng, derive_chunk_seed};
pub use trees::{TreeParams, TreePlacer};
