//! A glowing ring mark that breathes on a named easing curve.

use std::str::FromStr;

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::color::{hex_rgb, mix3};
use crate::config::{Config, Param, Template};
use crate::surface::Shader;

pub const DEFAULTS: &Template = &[
    ("theme", Param::Choice("dark")),
    ("speed", Param::Num(1.0)),
    ("easing", Param::Choice("ease-in-out")),
    ("glowIntensity", Param::Num(0.8)),
    ("glowSize", Param::Num(4.0)),
    ("glowL", Param::Num(0.7)),
    ("glowC", Param::Num(0.15)),
    ("glowH", Param::Num(145.0)),
];

/// Seconds per half cycle at speed 1.
const BASE_PERIOD: f32 = 1.2;
/// Frame size the glow radius is specified against.
const REFERENCE_SIDE: f32 = 400.0;

pub fn is_motion_active(cfg: &Config) -> bool {
    cfg.num("speed") > 0.0
}

// ------------------------- Easing -------------------------

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum Easing {
    Linear,
    Ease,
    EaseIn,
    EaseOut,
    EaseInOut,
    QuadIn,
    QuadOut,
    QuadInOut,
    CubicIn,
    CubicOut,
    CubicInOut,
    QuartIn,
    QuartOut,
    QuartInOut,
    CircIn,
    CircOut,
    CircInOut,
    BackIn,
    BackOut,
    BackInOut,
}

impl Default for Easing {
    fn default() -> Self {
        Easing::EaseInOut
    }
}

impl Easing {
    pub const ALL: [Easing; 20] = [
        Easing::Linear,
        Easing::Ease,
        Easing::EaseIn,
        Easing::EaseOut,
        Easing::EaseInOut,
        Easing::QuadIn,
        Easing::QuadOut,
        Easing::QuadInOut,
        Easing::CubicIn,
        Easing::CubicOut,
        Easing::CubicInOut,
        Easing::QuartIn,
        Easing::QuartOut,
        Easing::QuartInOut,
        Easing::CircIn,
        Easing::CircOut,
        Easing::CircInOut,
        Easing::BackIn,
        Easing::BackOut,
        Easing::BackInOut,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Easing::Linear => "linear",
            Easing::Ease => "ease",
            Easing::EaseIn => "ease-in",
            Easing::EaseOut => "ease-out",
            Easing::EaseInOut => "ease-in-out",
            Easing::QuadIn => "quad-in",
            Easing::QuadOut => "quad-out",
            Easing::QuadInOut => "quad-in-out",
            Easing::CubicIn => "cubic-in",
            Easing::CubicOut => "cubic-out",
            Easing::CubicInOut => "cubic-in-out",
            Easing::QuartIn => "quart-in",
            Easing::QuartOut => "quart-out",
            Easing::QuartInOut => "quart-in-out",
            Easing::CircIn => "circ-in",
            Easing::CircOut => "circ-out",
            Easing::CircInOut => "circ-in-out",
            Easing::BackIn => "back-in",
            Easing::BackOut => "back-out",
            Easing::BackInOut => "back-in-out",
        }
    }

    /// Cubic-bezier control points (x1, y1, x2, y2).
    pub fn control_points(&self) -> [f32; 4] {
        match self {
            Easing::Linear => [0.0, 0.0, 1.0, 1.0],
            Easing::Ease => [0.25, 0.1, 0.25, 1.0],
            Easing::EaseIn => [0.42, 0.0, 1.0, 1.0],
            Easing::EaseOut => [0.0, 0.0, 0.58, 1.0],
            Easing::EaseInOut => [0.42, 0.0, 0.58, 1.0],
            Easing::QuadIn => [0.55, 0.085, 0.68, 0.53],
            Easing::QuadOut => [0.25, 0.46, 0.45, 0.94],
            Easing::QuadInOut => [0.455, 0.03, 0.515, 0.955],
            Easing::CubicIn => [0.55, 0.055, 0.675, 0.19],
            Easing::CubicOut => [0.215, 0.61, 0.355, 1.0],
            Easing::CubicInOut => [0.645, 0.045, 0.355, 1.0],
            Easing::QuartIn => [0.895, 0.03, 0.685, 0.22],
            Easing::QuartOut => [0.165, 0.84, 0.44, 1.0],
            Easing::QuartInOut => [0.77, 0.0, 0.175, 1.0],
            Easing::CircIn => [0.6, 0.04, 0.98, 0.335],
            Easing::CircOut => [0.075, 0.82, 0.165, 1.0],
            Easing::CircInOut => [0.785, 0.135, 0.15, 0.86],
            Easing::BackIn => [0.6, -0.28, 0.735, 0.045],
            Easing::BackOut => [0.175, 0.885, 0.32, 1.275],
            Easing::BackInOut => [0.68, -0.55, 0.265, 1.55],
        }
    }

    pub fn apply(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        if *self == Easing::Linear {
            return t;
        }
        let [x1, y1, x2, y2] = self.control_points();
        let s = solve_bezier_x(x1, x2, t);
        bezier(y1, y2, s)
    }
}

impl FromStr for Easing {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Easing::ALL
            .into_iter()
            .find(|e| e.label() == s.trim())
            .ok_or_else(|| format!("unknown easing `{s}`"))
    }
}

/// One coordinate of a cubic bezier from (0,0) to (1,1).
fn bezier(p1: f32, p2: f32, s: f32) -> f32 {
    let u = 1.0 - s;
    3.0 * u * u * s * p1 + 3.0 * u * s * s * p2 + s * s * s
}

fn bezier_slope(p1: f32, p2: f32, s: f32) -> f32 {
    let u = 1.0 - s;
    3.0 * u * u * p1 + 6.0 * u * s * (p2 - p1) + 3.0 * s * s * (1.0 - p2)
}

/// Curve parameter whose x equals `x`: Newton steps, bisection fallback.
fn solve_bezier_x(x1: f32, x2: f32, x: f32) -> f32 {
    let mut s = x;
    for _ in 0..8 {
        let err = bezier(x1, x2, s) - x;
        if err.abs() < 1e-6 {
            return s;
        }
        let slope = bezier_slope(x1, x2, s);
        if slope.abs() < 1e-6 {
            break;
        }
        s -= err / slope;
        if !(0.0..=1.0).contains(&s) {
            break;
        }
    }
    let (mut lo, mut hi) = (0.0f32, 1.0f32);
    s = x;
    for _ in 0..40 {
        let v = bezier(x1, x2, s);
        if (v - x).abs() < 1e-6 {
            break;
        }
        if v < x {
            lo = s;
        } else {
            hi = s;
        }
        s = (lo + hi) * 0.5;
    }
    s
}

// ------------------------- Mark -------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Theme {
    Dark,
    Light,
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dark" => Ok(Theme::Dark),
            "light" => Ok(Theme::Light),
            other => Err(format!("unknown theme `{other}`")),
        }
    }
}

/// Pulse progress in [0, 1]: eased, alternating direction each half cycle.
pub fn pulse(easing: Easing, speed: f32, time: f32) -> f32 {
    if !(speed > 0.0) {
        return 0.0;
    }
    let period = BASE_PERIOD / speed;
    let phase = (time / period).rem_euclid(2.0);
    let u = if phase < 1.0 { phase } else { 2.0 - phase };
    easing.apply(u)
}

pub struct Scene {
    center: Vec2,
    radius: f32,
    stroke: f32,
    dot: f32,
    opacity: f32,
    glow_sigma: f32,
    glow_intensity: f32,
    background: Vec3,
    mark: Vec3,
    shadow: Vec3,
}

impl Scene {
    pub fn new(cfg: &Config, (width, height): (u32, u32), time: f32) -> Self {
        let side = (width as f32).min(height as f32);
        let easing = cfg.choice("easing", Easing::default());
        let theme = cfg.choice("theme", Theme::Dark);
        let e = pulse(easing, cfg.num("speed"), time);

        let glow = cfg.color("glow");
        let shadow = match theme {
            Theme::Dark => glow,
            Theme::Light => glow.with_lightness((glow.l + 0.25).min(0.95)),
        };
        let background = match theme {
            Theme::Dark => "#0a0a0a",
            Theme::Light => "#fafafa",
        };

        let radius = side * 0.18 * (0.92 + 0.08 * e);
        // Glow grows from glowSize to twice that at the peak.
        let glow_px = cfg.num("glowSize").max(0.0) * (1.0 + e) * side / REFERENCE_SIDE;
        Self {
            center: Vec2::new(width as f32 * 0.5, height as f32 * 0.5),
            radius,
            stroke: radius * 0.22,
            dot: radius * 0.28,
            opacity: (0.7 + 0.3 * e).clamp(0.0, 1.0),
            glow_sigma: glow_px,
            glow_intensity: cfg.num("glowIntensity").clamp(0.0, 1.0),
            background: hex_rgb(background).unwrap_or(Vec3::ZERO),
            mark: glow.to_srgb(),
            shadow: shadow.to_srgb(),
        }
    }

    fn distance(&self, pixel: Vec2) -> f32 {
        let d = pixel.distance(self.center);
        let ring = (d - self.radius).abs() - self.stroke * 0.5;
        ring.min(d - self.dot)
    }
}

impl Shader for Scene {
    fn shade(&self, pixel: Vec2) -> Vec3 {
        let sd = self.distance(pixel);
        let mut color = self.background;
        if self.glow_sigma > 0.0 {
            let g = (-(sd.max(0.0) / self.glow_sigma).powi(2)).exp();
            color = mix3(color, self.shadow, g * self.glow_intensity * self.opacity);
        }
        mix3(color, self.mark, (0.5 - sd).clamp(0.0, 1.0) * self.opacity)
    }
}
