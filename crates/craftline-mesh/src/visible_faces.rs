//! Bitmask for tracking which of a block's six faces are visible.

use crate::face_direction::FaceDirection;

/// Bit 0 = +X, Bit 1 = −X, Bit 2 = +Y, Bit 3 = −Y, Bit 4 = +Z, Bit 5 = −Z.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct VisibleFaces(pub u8);

impl VisibleFaces {
    pub const NONE: Self = Self(0);
    pub const ALL: Self = Self(0b0011_1111);

    pub fn is_visible(self, direction: FaceDirection) -> bool {
        self.0 & (1 << direction as u8) != 0
    }

    pub fn set_visible(&mut self, direction: FaceDirection) {
        self.0 |= 1 << direction as u8;
    }

    /// Number of visible faces (0–6).
    pub fn count(self) -> u32 {
        self.0.count_ones()
    }

    /// Visible directions in [`FaceDirection::ALL`] order.
    pub fn iter(self) -> impl Iterator<Item = FaceDirection> {
        FaceDirection::ALL
            .into_iter()
            .filter(move |dir| self.is_visible(*dir))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts() {
        assert_eq!(VisibleFaces::NONE.count(), 0);
        assert_eq!(VisibleFaces::ALL.count(), 6);
    }

    #[test]
    fn test_set_and_iterate() {
        let mut vf = VisibleFaces::NONE;
        vf.set_visible(FaceDirection::PosZ);
        vf.set_visible(FaceDirection::NegX);
        assert!(vf.is_visible(FaceDirection::PosZ));
        assert!(!vf.is_visible(FaceDirection::NegZ));
        let dirs: Vec<_> = vf.iter().collect();
        assert_eq!(dirs, vec![FaceDirection::NegX, FaceDirection::PosZ]);
    }

    #[test]
    fn test_all_from_individual_bits() {
        let mut vf = VisibleFaces::NONE;
        for dir in FaceDirection::ALL {
            vf.set_visible(dir);
        }
        assert_eq!(vf, VisibleFaces::ALL);
    }
}
