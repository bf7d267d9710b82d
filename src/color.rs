//! OKLCH color specs and the small shading helpers every exploration shares.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Perceptual color: lightness in [0, 1], chroma >= 0, hue in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Oklch {
    pub l: f32,
    pub c: f32,
    pub h: f32,
}

impl Oklch {
    pub const fn new(l: f32, c: f32, h: f32) -> Self {
        Self { l, c, h }
    }

    /// Unclamped linear RGB, computed in f64.
    fn linear_unclamped(self) -> [f64; 3] {
        let l = self.l as f64;
        let c = self.c as f64;
        let h = (self.h as f64).to_radians();
        let a = c * h.cos();
        let b = c * h.sin();

        let l_ = l + 0.396_337_777_4 * a + 0.215_803_757_3 * b;
        let m_ = l - 0.105_561_345_8 * a - 0.063_854_172_8 * b;
        let s_ = l - 0.089_484_177_5 * a - 1.291_485_548 * b;

        let l3 = l_ * l_ * l_;
        let m3 = m_ * m_ * m_;
        let s3 = s_ * s_ * s_;

        [
            4.076_741_662_1 * l3 - 3.307_711_591_3 * m3 + 0.230_969_929_2 * s3,
            -1.268_438_004_6 * l3 + 2.609_757_401_1 * m3 - 0.341_319_396_5 * s3,
            -0.004_196_086_3 * l3 - 0.703_418_614_7 * m3 + 1.707_614_701 * s3,
        ]
    }

    /// Linear RGB with every channel clamped to [0, 1]. Out-of-gamut colors clip.
    pub fn to_linear_rgb(self) -> Vec3 {
        let [r, g, b] = self.linear_unclamped();
        Vec3::new(
            r.clamp(0.0, 1.0) as f32,
            g.clamp(0.0, 1.0) as f32,
            b.clamp(0.0, 1.0) as f32,
        )
    }

    /// Gamma-encoded sRGB, for consumers that composite in display space.
    pub fn to_srgb(self) -> Vec3 {
        let lin = self.to_linear_rgb();
        Vec3::new(
            linear_to_srgb(lin.x),
            linear_to_srgb(lin.y),
            linear_to_srgb(lin.z),
        )
    }

    /// Whether the color survives conversion without clipping.
    pub fn in_gamut(self) -> bool {
        const EPS: f64 = 1e-4;
        self.linear_unclamped()
            .iter()
            .all(|v| (-EPS..=1.0 + EPS).contains(v))
    }

    pub fn with_lightness(self, l: f32) -> Self {
        Self { l, ..self }
    }
}

/// sRGB transfer function for a single linear channel.
pub fn linear_to_srgb(x: f32) -> f32 {
    if x <= 0.003_130_8 {
        12.92 * x
    } else {
        1.055 * x.powf(1.0 / 2.4) - 0.055
    }
}

pub fn srgb_to_linear(x: f32) -> f32 {
    if x <= 0.040_45 {
        x / 12.92
    } else {
        ((x + 0.055) / 1.055).powf(2.4)
    }
}

/// Rec. 601 luma weights.
pub fn luma601(c: Vec3) -> f32 {
    c.dot(Vec3::new(0.299, 0.587, 0.114))
}

/// Rec. 709 luminance weights.
pub fn luma709(c: Vec3) -> f32 {
    c.dot(Vec3::new(0.2126, 0.7152, 0.0722))
}

/// Hermite step; reversed edges (`e0 > e1`) give a falling ramp.
pub fn smoothstep(e0: f32, e1: f32, x: f32) -> f32 {
    if e0 == e1 {
        return if x < e0 { 0.0 } else { 1.0 };
    }
    let t = ((x - e0) / (e1 - e0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

pub fn mix(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

pub fn mix3(a: Vec3, b: Vec3, t: f32) -> Vec3 {
    a + (b - a) * t
}

pub fn rgb_to_hsv(c: Vec3) -> Vec3 {
    let (r, g, b) = (c.x, c.y, c.z);
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;
    let eps = 1.0e-10;

    let hue = if delta <= 0.0 {
        0.0
    } else if max == r {
        ((g - b) / delta).rem_euclid(6.0) / 6.0
    } else if max == g {
        ((b - r) / delta + 2.0) / 6.0
    } else {
        ((r - g) / delta + 4.0) / 6.0
    };
    Vec3::new(hue, delta / (max + eps), max)
}

pub fn hsv_to_rgb(c: Vec3) -> Vec3 {
    let channel = |offset: f32| {
        let p = (((c.x + offset) * 6.0).rem_euclid(6.0) - 3.0).abs();
        c.z * mix(1.0, (p - 1.0).clamp(0.0, 1.0), c.y)
    };
    Vec3::new(channel(1.0), channel(2.0 / 3.0), channel(1.0 / 3.0))
}

/// Parses `#rrggbb` into sRGB in [0, 1].
pub fn hex_rgb(hex: &str) -> Option<Vec3> {
    let digits = hex.strip_prefix('#').unwrap_or(hex);
    if digits.len() != 6 {
        return None;
    }
    let channel = |i: usize| {
        u8::from_str_radix(digits.get(i..i + 2)?, 16)
            .ok()
            .map(|v| v as f32 / 255.0)
    };
    Some(Vec3::new(channel(0)?, channel(2)?, channel(4)?))
}
