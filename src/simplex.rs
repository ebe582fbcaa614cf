//! Seeded 2D simplex noise and fractal (fBm) summation.
//!
//! The permutation table is derived from a 32-bit seed with a linear
//! congruential generator driving a Fisher-Yates shuffle, so a given seed
//! yields the same terrain on every platform and every run.

use ::noise::{NoiseFn, Seedable};

// =============================================================================
// CONSTANTS
// =============================================================================

/// Skew factor for 2D: (sqrt(3) - 1) / 2
const F2: f64 = 0.366_025_403_784_438_6;
/// Unskew factor for 2D: (3 - sqrt(3)) / 6
const G2: f64 = 0.211_324_865_405_187_1;

/// Scales the summed corner contributions into [-1, 1].
const OUTPUT_SCALE: f64 = 70.0;

// LCG multiplier/increment (Numerical Recipes)
const LCG_MUL: u32 = 1_664_525;
const LCG_INC: u32 = 1_013_904_223;

const GRADIENTS: [[f64; 2]; 12] = [
    [1.0, 1.0], [-1.0, 1.0], [1.0, -1.0], [-1.0, -1.0],
    [1.0, 0.0], [-1.0, 0.0], [1.0, 0.0], [-1.0, 0.0],
    [0.0, 1.0], [0.0, -1.0], [0.0, 1.0], [0.0, -1.0],
];

// =============================================================================
// GENERATOR
// =============================================================================

/// Immutable simplex noise source: a seed plus the permutation table derived
/// from it. Sampling never mutates, so one instance can be shared freely.
#[derive(Clone)]
pub struct SeededNoise {
    seed: u32,
    perm: [u8; 512],
}

impl std::fmt::Debug for SeededNoise {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SeededNoise").field("seed", &self.seed).finish_non_exhaustive()
    }
}

impl SeededNoise {
    pub fn new(seed: u32) -> Self {
        Self {
            seed,
            perm: build_permutation(seed),
        }
    }

    pub fn seed(&self) -> u32 {
        self.seed
    }

    /// Coherent noise at (x, y), in [-1, 1].
    pub fn sample(&self, x: f64, y: f64) -> f64 {
        // Skew input space to find the simplex cell
        let s = (x + y) * F2;
        let i = (x + s).floor();
        let j = (y + s).floor();
        let t = (i + j) * G2;
        let x0 = x - (i - t);
        let y0 = y - (j - t);

        // Which of the two triangles of the rhombus we are in
        let (i1, j1) = if x0 > y0 { (1usize, 0usize) } else { (0, 1) };

        let x1 = x0 - i1 as f64 + G2;
        let y1 = y0 - j1 as f64 + G2;
        let x2 = x0 - 1.0 + 2.0 * G2;
        let y2 = y0 - 1.0 + 2.0 * G2;

        let ii = (i as i64).rem_euclid(256) as usize;
        let jj = (j as i64).rem_euclid(256) as usize;

        let gi0 = self.perm[ii + self.perm[jj] as usize] as usize % 12;
        let gi1 = self.perm[ii + i1 + self.perm[jj + j1] as usize] as usize % 12;
        let gi2 = self.perm[ii + 1 + self.perm[jj + 1] as usize] as usize % 12;

        let n0 = corner(gi0, x0, y0);
        let n1 = corner(gi1, x1, y1);
        let n2 = corner(gi2, x2, y2);

        (OUTPUT_SCALE * (n0 + n1 + n2)).clamp(-1.0, 1.0)
    }

    /// Fractional Brownian motion: `octaves` samples at frequencies growing by
    /// `lacunarity` and amplitudes shrinking by `persistence`, divided by the
    /// total amplitude so the result stays in [-1, 1].
    pub fn fbm(&self, x: f64, y: f64, octaves: u32, lacunarity: f64, persistence: f64) -> f64 {
        let mut total = 0.0;
        let mut amplitude = 1.0;
        let mut frequency = 1.0;
        let mut max_value = 0.0;

        for _ in 0..octaves {
            total += amplitude * self.sample(x * frequency, y * frequency);
            max_value += f64::abs(amplitude);
            amplitude *= persistence;
            frequency *= lacunarity;
        }

        if max_value == 0.0 {
            return 0.0;
        }
        (total / max_value).clamp(-1.0, 1.0)
    }
}

fn corner(gradient: usize, x: f64, y: f64) -> f64 {
    let t = 0.5 - x * x - y * y;
    if t < 0.0 {
        return 0.0;
    }
    let t2 = t * t;
    let g = GRADIENTS[gradient];
    t2 * t2 * (g[0] * x + g[1] * y)
}

/// Fisher-Yates shuffle of 0..=255 driven by an LCG, duplicated to 512
/// entries so lookups at `index + 1` never need a wrap.
fn build_permutation(seed: u32) -> [u8; 512] {
    let mut base: [u8; 256] = std::array::from_fn(|i| i as u8);
    let mut state = seed;

    for i in (1..256).rev() {
        state = state.wrapping_mul(LCG_MUL).wrapping_add(LCG_INC);
        let j = (state >> 8) as usize % (i + 1);
        base.swap(i, j);
    }

    std::array::from_fn(|i| base[i & 255])
}

// =============================================================================
// NOISE CRATE INTEROP
// =============================================================================

impl NoiseFn<f64, 2> for SeededNoise {
    fn get(&self, point: [f64; 2]) -> f64 {
        self.sample(point[0], point[1])
    }
}

impl Seedable for SeededNoise {
    fn set_seed(self, seed: u32) -> Self {
        if seed == self.seed {
            return self;
        }
        Self::new(seed)
    }

    fn seed(&self) -> u32 {
        self.seed
    }
}

impl Default for SeededNoise {
    fn default() -> Self {
        Self::new(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_permutation_is_a_permutation() {
        let perm = build_permutation(42);
        let mut seen = [false; 256];
        for &v in &perm[..256] {
            seen[v as usize] = true;
        }
        assert!(seen.iter().all(|&s| s));
        assert_eq!(&perm[..256], &perm[256..]);
    }

    #[test]
    fn test_same_seed_same_output() {
        let a = SeededNoise::new(7);
        let b = SeededNoise::new(7);
        for k in 0..100 {
            let x = k as f64 * 0.37 - 11.0;
            let y = k as f64 * 0.91 + 3.0;
            assert_eq!(a.sample(x, y).to_bits(), b.sample(x, y).to_bits());
        }
    }

    #[test]
    fn test_different_seeds_differ() {
        let a = SeededNoise::new(1);
        let b = SeededNoise::new(2);
        let differs = (0..50).any(|k| {
            let x = k as f64 * 0.73;
            a.sample(x, x * 0.5) != b.sample(x, x * 0.5)
        });
        assert!(differs);
    }

    #[test]
    fn test_sample_and_fbm_bounded() {
        let noise = SeededNoise::new(1234);
        let mut rng = ChaCha8Rng::seed_from_u64(99);
        for _ in 0..10_000 {
            let x = rng.gen_range(-1000.0..1000.0);
            let y = rng.gen_range(-1000.0..1000.0);
            let octaves = rng.gen_range(1..=6);
            let s = noise.sample(x, y);
            let f = noise.fbm(x, y, octaves, 2.0, 0.5);
            assert!((-1.0..=1.0).contains(&s), "sample {s} out of range");
            assert!((-1.0..=1.0).contains(&f), "fbm {f} out of range");
        }
    }

    #[test]
    fn test_noise_is_not_flat() {
        let noise = SeededNoise::new(5);
        let values: Vec<f64> = (0..200).map(|k| noise.sample(k as f64 * 0.13, 0.7)).collect();
        let min = values.iter().cloned().fold(f64::MAX, f64::min);
        let max = values.iter().cloned().fold(f64::MIN, f64::max);
        assert!(max - min > 0.5);
    }

    #[test]
    fn test_zero_octaves_is_zero() {
        let noise = SeededNoise::new(3);
        assert_eq!(noise.fbm(1.5, 2.5, 0, 2.0, 0.5), 0.0);
    }

    #[test]
    fn test_single_octave_fbm_equals_sample() {
        let noise = SeededNoise::new(11);
        assert_eq!(noise.fbm(0.3, 4.2, 1, 2.0, 0.5), noise.sample(0.3, 4.2));
    }

    #[test]
    fn test_noise_fn_interop() {
        fn probe<N: NoiseFn<f64, 2>>(source: &N) -> f64 {
            source.get([0.25, 0.75])
        }
        let noise = SeededNoise::default().set_seed(17);
        assert_eq!(Seedable::seed(&noise), 17);
        assert_eq!(probe(&noise), noise.sample(0.25, 0.75));
    }
}
