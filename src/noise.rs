//! Lattice gradient noise plus the small hashes used for grain and star fields.

use glam::Vec2;

// Skew/unskew factors for the 2D simplex lattice and the 1/41 gradient ring.
const SKEW: f32 = 0.366_025_4; // 0.5 * (sqrt(3) - 1)
const UNSKEW: f32 = 0.211_324_87; // (3 - sqrt(3)) / 6
const UNSKEW_2: f32 = -0.577_350_26; // -1 + 2 * UNSKEW
const GRAD_RING: f32 = 0.024_390_243; // 1 / 41

#[inline]
pub fn fract(x: f32) -> f32 {
    x - x.floor()
}

#[inline]
fn mod289(x: f32) -> f32 {
    x - (x * (1.0 / 289.0)).floor() * 289.0
}

#[inline]
fn permute(x: f32) -> f32 {
    mod289(((x * 34.0) + 1.0) * x)
}

/// 2D simplex noise, roughly in [-1, 1]. Deterministic and continuous; the
/// permutation polynomial repeats every 289 lattice cells.
pub fn simplex2(v: Vec2) -> f32 {
    let i = (v + Vec2::splat(v.x * SKEW + v.y * SKEW)).floor();
    let x0 = v - i + Vec2::splat(i.x * UNSKEW + i.y * UNSKEW);

    let i1 = if x0.x > x0.y {
        Vec2::new(1.0, 0.0)
    } else {
        Vec2::new(0.0, 1.0)
    };
    let x1 = x0 + Vec2::splat(UNSKEW) - i1;
    let x2 = x0 + Vec2::splat(UNSKEW_2);

    let ix = mod289(i.x);
    let iy = mod289(i.y);
    let hashes = [
        permute(permute(iy) + ix),
        permute(permute(iy + i1.y) + ix + i1.x),
        permute(permute(iy + 1.0) + ix + 1.0),
    ];
    let corners = [x0, x1, x2];

    let mut total = 0.0;
    for (corner, hash) in corners.iter().zip(hashes) {
        let mut m = (0.5 - corner.length_squared()).max(0.0);
        m *= m;
        m *= m;

        let x = 2.0 * fract(hash * GRAD_RING) - 1.0;
        let h = x.abs() - 0.5;
        let a0 = x - (x + 0.5).floor();
        // Normalise the gradient length without a sqrt.
        m *= 1.792_842_9 - 0.853_734_7 * (a0 * a0 + h * h);

        total += m * (a0 * corner.x + h * corner.y);
    }
    130.0 * total
}

/// Cheap value hash in [0, 1) (Hoskins' "hash without sine").
pub fn hash12(p: Vec2) -> f32 {
    let mut x = fract(p.x * 0.1031);
    let mut y = fract(p.y * 0.1031);
    let mut z = fract(p.x * 0.1031);
    let d = x * (y + 33.33) + y * (z + 33.33) + z * (x + 33.33);
    x += d;
    y += d;
    z += d;
    fract((x + y) * z)
}

/// Classic `fract(sin(dot(p, k)) * 43758.5453)` hash in [0, 1).
pub fn sine_hash(p: Vec2, k: Vec2) -> f32 {
    fract(p.dot(k).sin() * 43_758.547)
}

/// Park-Miller minimal standard generator, used for static layouts only.
#[derive(Debug, Clone)]
pub struct SeededRng {
    state: i64,
}

impl SeededRng {
    const MODULUS: i64 = 2_147_483_647;

    pub fn new(seed: i64) -> Self {
        let mut state = seed % Self::MODULUS;
        if state <= 0 {
            state += Self::MODULUS - 1;
        }
        Self { state }
    }

    /// Next value in [0, 1).
    pub fn next_f32(&mut self) -> f32 {
        self.state = (self.state * 16_807) % Self::MODULUS;
        ((self.state - 1) as f64 / (Self::MODULUS - 1) as f64) as f32
    }
}
