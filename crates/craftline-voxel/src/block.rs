//! The closed set of block types and their static attributes.
//!
//! Blocks travel over the wire as their integer id, so [`BlockType`]
//! (de)serializes as a bare `u8`.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How a block interacts with face culling.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Transparency {
    /// Empty space. Never rendered.
    Empty,
    /// Hides the faces of neighbors behind it.
    Opaque,
    /// Rendered on every side and never hides neighbors (water, leaves).
    Translucent,
}

/// A single block kind. Discriminants are the wire ids.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(try_from = "u8", into = "u8")]
#[repr(u8)]
pub enum BlockType {
    #[default]
    Air = 0,
    Grass = 1,
    Dirt = 2,
    Stone = 3,
    Wood = 4,
    Leaves = 5,
    Sand = 6,
    Water = 7,
    Cobblestone = 8,
    Planks = 9,
}

/// Returned when a wire id names no block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("unknown block id {0}")]
pub struct UnknownBlockId(pub u8);

/// Break time used for ids without a dedicated entry.
const FALLBACK_BREAK_MS: u64 = 500;

impl BlockType {
    /// Every block type in id order.
    pub const ALL: [BlockType; 10] = [
        BlockType::Air,
        BlockType::Grass,
        BlockType::Dirt,
        BlockType::Stone,
        BlockType::Wood,
        BlockType::Leaves,
        BlockType::Sand,
        BlockType::Water,
        BlockType::Cobblestone,
        BlockType::Planks,
    ];

    /// Wire id.
    pub const fn id(self) -> u8 {
        self as u8
    }

    /// Looks up a block by wire id.
    pub fn from_id(id: u8) -> Option<Self> {
        Self::ALL.get(id as usize).copied()
    }

    /// Time a viewer must hold the break input before the block disappears.
    pub fn break_duration(self) -> Duration {
        let ms = match self {
            BlockType::Grass | BlockType::Dirt | BlockType::Sand => 400,
            BlockType::Stone => 1200,
            BlockType::Wood => 800,
            BlockType::Leaves => 200,
            BlockType::Water => 100,
            BlockType::Cobblestone => 1500,
            BlockType::Planks => 600,
            BlockType::Air => FALLBACK_BREAK_MS,
        };
        Duration::from_millis(ms)
    }

    /// Human-readable name shown in the hotbar and break overlay.
    pub fn display_name(self) -> &'static str {
        match self {
            BlockType::Air => "Air",
            BlockType::Grass => "Grass",
            BlockType::Dirt => "Dirt",
            BlockType::Stone => "Stone",
            BlockType::Wood => "Wood",
            BlockType::Leaves => "Leaves",
            BlockType::Sand => "Sand",
            BlockType::Water => "Water",
            BlockType::Cobblestone => "Cobble",
            BlockType::Planks => "Planks",
        }
    }

    pub fn transparency(self) -> Transparency {
        match self {
            BlockType::Air => Transparency::Empty,
            BlockType::Water | BlockType::Leaves => Transparency::Translucent,
            _ => Transparency::Opaque,
        }
    }

    pub fn is_air(self) -> bool {
        self == BlockType::Air
    }

    /// Whether a neighbor of this type leaves the adjacent face exposed.
    pub fn exposes_neighbor_faces(self) -> bool {
        self.transparency() != Transparency::Opaque
    }

    /// Whether a ray stops at this block. Air and water are passed through.
    pub fn is_targetable(self) -> bool {
        !matches!(self, BlockType::Air | BlockType::Water)
    }
}

impl TryFrom<u8> for BlockType {
    type Error = UnknownBlockId;

    fn try_from(id: u8) -> Result<Self, Self::Error> {
        Self::from_id(id).ok_or(UnknownBlockId(id))
    }
}

impl From<BlockType> for u8 {
    fn from(block: BlockType) -> Self {
        block.id()
    }
}

impl std::fmt::Display for BlockType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}
