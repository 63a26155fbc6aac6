//! Seeded 2D simplex noise.
//!
//! The permutation table is produced by a Fisher-Yates shuffle driven by the
//! Park-Miller "minimal standard" generator (`s = s * 16807 mod (2^31 - 1)`),
//! so it depends on the seed alone.

/// Park-Miller modulus.
const LCG_MODULUS: u64 = 2_147_483_647;
/// Park-Miller multiplier.
const LCG_MULTIPLIER: u64 = 16_807;
/// Scales the summed corner contributions to roughly `[-1, 1]`.
const OUTPUT_SCALE: f64 = 70.0;

/// A continuous scalar field over the plane, fixed by its seed.
#[derive(Clone)]
pub struct NoiseField {
    seed: u32,
    perm: [u8; 512],
}

impl NoiseField {
    pub fn new(seed: u32) -> Self {
        let mut p: [u8; 256] = std::array::from_fn(|i| i as u8);
        let mut state = u64::from(seed);
        for i in (1..256usize).rev() {
            state = state * LCG_MULTIPLIER % LCG_MODULUS;
            let n = (state % (i as u64 + 1)) as usize;
            p.swap(i, n);
        }
        let perm = std::array::from_fn(|i| p[i & 255]);
        Self { seed, perm }
    }

    pub fn seed(&self) -> u32 {
        self.seed
    }

    /// Samples the field. The result is clamped to `[-1, 1]`.
    pub fn noise2d(&self, x: f64, y: f64) -> f64 {
        let f2 = 0.5 * (3.0_f64.sqrt() - 1.0);
        let g2 = (3.0 - 3.0_f64.sqrt()) / 6.0;

        // Skew into simplex cell space.
        let s = (x + y) * f2;
        let i = (x + s).floor();
        let j = (y + s).floor();

        let t = (i + j) * g2;
        let x0 = x - (i - t);
        let y0 = y - (j - t);

        let (i1, j1) = if x0 > y0 { (1, 0) } else { (0, 1) };

        let x1 = x0 - i1 as f64 + g2;
        let y1 = y0 - j1 as f64 + g2;
        let x2 = x0 - 1.0 + 2.0 * g2;
        let y2 = y0 - 1.0 + 2.0 * g2;

        let ii = (i as i64 & 255) as usize;
        let jj = (j as i64 & 255) as usize;

        let h0 = self.perm[ii + self.perm[jj] as usize];
        let h1 = self.perm[ii + i1 + self.perm[jj + j1] as usize];
        let h2 = self.perm[ii + 1 + self.perm[jj + 1] as usize];

        let n0 = corner(h0, x0, y0);
        let n1 = corner(h1, x1, y1);
        let n2 = corner(h2, x2, y2);

        (OUTPUT_SCALE * (n0 + n1 + n2)).clamp(-1.0, 1.0)
    }
}

impl std::fmt::Debug for NoiseField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NoiseField").field("seed", &self.seed).finish()
    }
}

fn corner(hash: u8, x: f64, y: f64) -> f64 {
    let t = 0.5 - x * x - y * y;
    if t < 0.0 {
        0.0
    } else {
        let t2 = t * t;
        t2 * t2 * grad(hash, x, y)
    }
}

/// One of eight gradient directions selected by the low bits of `hash`.
fn grad(hash: u8, x: f64, y: f64) -> f64 {
    let h = hash & 7;
    let (u, v) = if h < 4 { (x, y) } else { (y, x) };
    let u = if h & 1 != 0 { -u } else { u };
    let v = if h & 2 != 0 { -2.0 * v } else { 2.0 * v };
    u + v
}
