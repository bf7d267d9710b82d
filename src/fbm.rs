//! Fractional Brownian motion and layered domain warping on top of `simplex2`.

use glam::Vec2;

use crate::noise::simplex2;

/// Octave stack: frequency doubles and amplitude halves per octave.
///
/// `octaves` may be fractional; the loop visits octave `i` while `i < octaves`
/// and never more than `max_octaves`, so 2.5 means three octaves.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fbm {
    pub octaves: f32,
    pub amplitude: f32,
    pub max_octaves: u32,
}

impl Default for Fbm {
    fn default() -> Self {
        Self {
            octaves: 4.0,
            amplitude: 0.5,
            max_octaves: 6,
        }
    }
}

impl Fbm {
    pub fn new(octaves: f32) -> Self {
        Self {
            octaves,
            ..Self::default()
        }
    }

    pub fn with_amplitude(mut self, amplitude: f32) -> Self {
        self.amplitude = amplitude;
        self
    }

    pub fn with_max_octaves(mut self, max_octaves: u32) -> Self {
        self.max_octaves = max_octaves;
        self
    }

    pub fn sample(&self, p: Vec2) -> f32 {
        self.sample_offset(p, Vec2::ZERO)
    }

    /// Like `sample`, but adds `offset` to every octave's coordinate after scaling.
    pub fn sample_offset(&self, p: Vec2, offset: Vec2) -> f32 {
        let mut value = 0.0;
        let mut amplitude = self.amplitude;
        let mut frequency = 1.0;
        for i in 0..self.max_octaves {
            // Also stops on NaN.
            if !((i as f32) < self.octaves) {
                break;
            }
            value += amplitude * simplex2(p * frequency + offset);
            frequency *= 2.0;
            amplitude *= 0.5;
        }
        value
    }

    /// Upper bound on |sample| given a noise bound of `noise_max`.
    pub fn bound(&self, noise_max: f32) -> f32 {
        let octaves = self.octaves.clamp(0.0, self.max_octaves as f32).ceil() as i32;
        let geometric = 2.0 * (1.0 - 0.5f32.powi(octaves));
        self.amplitude.abs() * geometric * noise_max
    }
}

/// Shorthand for the common stack (amplitude 0.5, at most 6 octaves).
pub fn fbm(p: Vec2, octaves: f32) -> f32 {
    Fbm::new(octaves).sample(p)
}

/// Constant offset and per-second drift for one warp coordinate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WarpLayer {
    pub bias: Vec2,
    pub drift: Vec2,
}

impl WarpLayer {
    pub const fn new(bias: Vec2, drift: Vec2) -> Self {
        Self { bias, drift }
    }
}

/// Result of evaluating a domain warp at one point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Warped {
    /// Displacement produced by the last warp layer.
    pub offset: Vec2,
    /// Final scalar field value.
    pub value: f32,
}

/// `fbm(p + s * fbm2(p + s * fbm2(...)))`: each layer yields a 2D offset that
/// displaces the input to the next one.
#[derive(Debug, Clone, PartialEq)]
pub struct DomainWarp {
    pub fbm: Fbm,
    pub strength: f32,
    pub layers: Vec<[WarpLayer; 2]>,
    pub output: WarpLayer,
}

impl DomainWarp {
    /// Two warp layers with slowly drifting biases, as used by the warp exploration.
    pub fn two_layer(strength: f32, detail: f32) -> Self {
        Self {
            fbm: Fbm::new(detail),
            strength,
            layers: vec![
                [
                    WarpLayer::new(Vec2::ZERO, Vec2::new(0.12, 0.08)),
                    WarpLayer::new(Vec2::new(5.2, 1.3), Vec2::new(-0.08, 0.1)),
                ],
                [
                    WarpLayer::new(Vec2::new(1.7, 9.2), Vec2::new(0.05, -0.06)),
                    WarpLayer::new(Vec2::new(8.3, 2.8), Vec2::new(-0.04, 0.07)),
                ],
            ],
            output: WarpLayer::new(Vec2::ZERO, Vec2::new(0.02, 0.03)),
        }
    }

    pub fn sample(&self, p: Vec2, time: f32) -> Warped {
        let mut offset = Vec2::ZERO;
        for [lx, ly] in &self.layers {
            let base = p + self.strength * offset;
            offset = Vec2::new(
                self.fbm.sample(base + lx.bias + time * lx.drift),
                self.fbm.sample(base + ly.bias + time * ly.drift),
            );
        }
        let value = self
            .fbm
            .sample(p + self.strength * offset + self.output.bias + time * self.output.drift);
        Warped { offset, value }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_octaves_is_zero() {
        for i in 0..50 {
            let p = Vec2::new(i as f32 * 0.7, -(i as f32) * 0.3);
            assert_eq!(fbm(p, 0.0), 0.0);
            assert_eq!(fbm(p, -3.0), 0.0);
            assert_eq!(fbm(p, f32::NAN), 0.0);
        }
    }

    #[test]
    fn fractional_octaves_round_up() {
        let p = Vec2::new(1.3, 2.9);
        assert_eq!(fbm(p, 2.5), fbm(p, 3.0));
        assert_eq!(fbm(p, 0.2), fbm(p, 1.0));
    }

    #[test]
    fn octave_count_is_capped() {
        let p = Vec2::new(-4.1, 0.77);
        let capped = Fbm::new(40.0).with_max_octaves(5);
        assert_eq!(capped.sample(p), Fbm::new(5.0).with_max_octaves(5).sample(p));
    }

    #[test]
    fn stays_within_geometric_bound() {
        let stack = Fbm::new(6.0);
        let limit = stack.bound(1.05);
        assert!(limit < 1.05);
        for iy in 0..40 {
            for ix in 0..40 {
                let p = Vec2::new(ix as f32 * 0.29 - 5.0, iy as f32 * 0.41 - 7.0);
                assert!(stack.sample(p).abs() <= limit);
            }
        }
    }

    #[test]
    fn warp_is_deterministic_and_moves_with_time() {
        let warp = DomainWarp::two_layer(1.2, 3.0);
        let p = Vec2::new(0.4, 1.1);
        assert_eq!(warp.sample(p, 2.0), warp.sample(p, 2.0));
        assert_ne!(warp.sample(p, 0.0).value, warp.sample(p, 10.0).value);
    }

    #[test]
    fn zero_strength_warp_ignores_offsets() {
        let warp = DomainWarp::two_layer(0.0, 3.0);
        let p = Vec2::new(2.0, -1.0);
        let direct = Fbm::new(3.0).sample(p + Vec2::new(0.02, 0.03) * 4.0);
        assert_eq!(warp.sample(p, 4.0).value, direct);
    }
}
