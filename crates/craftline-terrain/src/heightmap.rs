//! Layered column heights from a [`NoiseField`].
//!
//! Each column's surface height is a base level plus the weighted sum of
//! three octaves (coarse, medium, fine), floored to a whole block.

use crate::noise::NoiseField;

/// One noise layer: sample at `coord * frequency`, weight by `amplitude`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Octave {
    pub frequency: f64,
    pub amplitude: f64,
}

impl Octave {
    pub const fn new(frequency: f64, amplitude: f64) -> Self {
        Self {
            frequency,
            amplitude,
        }
    }
}

/// Default rolling-hills profile.
pub const DEFAULT_OCTAVES: [Octave; 3] = [
    Octave::new(0.01, 20.0),
    Octave::new(0.05, 5.0),
    Octave::new(0.1, 2.0),
];

/// Surface level around which the octaves oscillate.
pub const DEFAULT_BASE_HEIGHT: f64 = 20.0;

/// Computes the surface height of world columns.
#[derive(Clone, Debug)]
pub struct HeightSampler {
    noise: NoiseField,
    base: f64,
    octaves: Vec<Octave>,
}

impl HeightSampler {
    /// Sampler with the default base height and octaves.
    pub fn new(seed: u32) -> Self {
        Self::with_octaves(seed, DEFAULT_BASE_HEIGHT, DEFAULT_OCTAVES.to_vec())
    }

    pub fn with_octaves(seed: u32, base: f64, octaves: Vec<Octave>) -> Self {
        Self {
            noise: NoiseField::new(seed),
            base,
            octaves,
        }
    }

    /// Number of solid blocks in column `(x, z)`: the topmost is at `height - 1`.
    pub fn height(&self, x: i32, z: i32) -> i32 {
        let (x, z) = (f64::from(x), f64::from(z));
        let total = self.octaves.iter().fold(self.base, |acc, octave| {
            acc + self.noise.noise2d(x * octave.frequency, z * octave.frequency) * octave.amplitude
        });
        total.floor() as i32
    }

    /// Highest height any column can reach.
    pub fn max_height(&self) -> i32 {
        let sum: f64 = self.octaves.iter().map(|o| o.amplitude.abs()).sum();
        (self.base + sum).floor() as i32
    }

    pub fn noise(&self) -> &NoiseField {
        &self.noise
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heights_stay_within_amplitude_band() {
        let sampler = HeightSampler::new(12345);
        for x in (-300..300).step_by(7) {
            for z in (-300..300).step_by(11) {
                let h = sampler.height(x, z);
                assert!((-7..=47).contains(&h), "height {h} at ({x}, {z})");
            }
        }
        assert_eq!(sampler.max_height(), 47);
    }

    #[test]
    fn test_heights_are_deterministic() {
        let a = HeightSampler::new(9);
        let b = HeightSampler::new(9);
        for x in -50..50 {
            assert_eq!(a.height(x, x * 3), b.height(x, x * 3));
        }
    }

    #[test]
    fn test_origin_height_is_base() {
        let sampler = HeightSampler::new(12345);
        assert_eq!(sampler.height(0, 0), 20);
    }

    #[test]
    fn test_flat_profile() {
        let sampler = HeightSampler::with_octaves(1, 12.5, Vec::new());
        assert_eq!(sampler.height(40, -40), 12);
    }

    #[test]
    fn test_terrain_varies() {
        let sampler = HeightSampler::new(12345);
        let heights: std::collections::BTreeSet<i32> =
            (0..200).map(|x| sampler.height(x * 5, x * 3)).collect();
        assert!(heights.len() > 5);
    }
}
