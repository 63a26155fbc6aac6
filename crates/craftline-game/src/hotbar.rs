//! Nine-slot block selection for placement.

use craftline_voxel::BlockType;

pub const HOTBAR_SLOTS: [BlockType; 9] = [
    BlockType::Grass,
    BlockType::Dirt,
    BlockType::Stone,
    BlockType::Cobblestone,
    BlockType::Wood,
    BlockType::Planks,
    BlockType::Leaves,
    BlockType::Sand,
    BlockType::Water,
];

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Hotbar {
    selected: usize,
}

impl Hotbar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected_slot(&self) -> usize {
        self.selected
    }

    pub fn selected(&self) -> BlockType {
        HOTBAR_SLOTS[self.selected]
    }

    /// Selects slot `index` (0-based). Out-of-range indices are ignored.
    pub fn select(&mut self, index: usize) -> Option<BlockType> {
        let block = *HOTBAR_SLOTS.get(index)?;
        self.selected = index;
        Some(block)
    }

    /// Moves the selection by `delta` slots, wrapping at either end.
    pub fn scroll(&mut self, delta: i32) -> BlockType {
        let len = HOTBAR_SLOTS.len() as i32;
        self.selected = (self.selected as i32 + delta).rem_euclid(len) as usize;
        self.selected()
    }
}
