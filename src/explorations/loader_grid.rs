//! Gallery of 3x3 cell loaders, each lighting its cells on a delay pattern.

use glam::{Vec2, Vec3};

use crate::color::{hex_rgb, mix3};
use crate::config::{Config, Param, Template};
use crate::surface::Shader;

pub const DEFAULTS: &Template = &[
    ("speed", Param::Num(1.0)),
    ("glowIntensity", Param::Num(0.7)),
    ("glowSize", Param::Num(8.0)),
    ("glowL", Param::Num(0.7)),
    ("glowC", Param::Num(0.2)),
    ("glowH", Param::Num(145.0)),
    ("pattern", Param::Choice("all")),
];

/// Cell delays (ms) in reading order and the fade duration (ms).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pattern {
    pub name: &'static str,
    pub delays: [f32; 9],
    pub duration: f32,
}

pub const PATTERNS: [Pattern; 9] = [
    Pattern {
        name: "wave-lr",
        delays: [0., 100., 200., 0., 100., 200., 0., 100., 200.],
        duration: 600.,
    },
    Pattern {
        name: "wave-rl",
        delays: [200., 100., 0., 200., 100., 0., 200., 100., 0.],
        duration: 600.,
    },
    Pattern {
        name: "wave-tb",
        delays: [0., 0., 0., 100., 100., 100., 200., 200., 200.],
        duration: 600.,
    },
    Pattern {
        name: "wave-bt",
        delays: [200., 200., 200., 100., 100., 100., 0., 0., 0.],
        duration: 600.,
    },
    Pattern {
        name: "spiral-cw",
        delays: [0., 50., 100., 350., 400., 150., 300., 250., 200.],
        duration: 500.,
    },
    Pattern {
        name: "spiral-ccw",
        delays: [0., 350., 100., 50., 400., 250., 150., 200., 300.],
        duration: 500.,
    },
    Pattern {
        name: "diagonal-tl",
        delays: [0., 100., 200., 100., 200., 300., 200., 300., 400.],
        duration: 500.,
    },
    Pattern {
        name: "pulse-center",
        delays: [200., 100., 200., 100., 0., 100., 200., 100., 200.],
        duration: 400.,
    },
    Pattern {
        name: "corners",
        delays: [0., 150., 0., 150., 300., 150., 0., 150., 0.],
        duration: 400.,
    },
];

const DIM: f32 = 0.15;
/// Pause between cycles, ms.
const CYCLE_PAUSE: f32 = 200.0;
/// Cells above this opacity get the glow.
const LIT: f32 = 0.5;
const BACKGROUND: &str = "#0a0a0a";

pub fn is_motion_active(cfg: &Config) -> bool {
    cfg.num("speed") > 0.0
}

pub fn find_pattern(name: &str) -> Option<&'static Pattern> {
    PATTERNS.iter().find(|p| p.name == name)
}

/// Opacity of one cell at `t_ms`: dim, then a half-sine swell over
/// `2 * duration` once the delay has passed, then a short pause.
pub fn cell_opacity(delay: f32, duration: f32, speed: f32, t_ms: f32) -> f32 {
    if !(speed > 0.0) {
        return DIM;
    }
    let delay = delay / speed;
    let duration = duration / speed;
    let cycle = duration * 2.0 + delay + CYCLE_PAUSE;
    let in_cycle = t_ms.rem_euclid(cycle) - delay;
    if in_cycle >= 0.0 && in_cycle < duration * 2.0 {
        let progress = in_cycle / (duration * 2.0);
        DIM + (1.0 - DIM) * (progress * std::f32::consts::PI).sin()
    } else {
        DIM
    }
}

/// Signed distance to a rounded box centred at the origin.
fn rounded_box(p: Vec2, half: Vec2, radius: f32) -> f32 {
    let q = p.abs() - half + Vec2::splat(radius);
    q.max(Vec2::ZERO).length() + q.x.max(q.y).min(0.0) - radius
}

struct Loader {
    center: Vec2,
    cell: f32,
    pitch: f32,
    opacities: [f32; 9],
}

impl Loader {
    fn cell_center(&self, i: usize) -> Vec2 {
        let col = (i % 3) as f32 - 1.0;
        let row = (i / 3) as f32 - 1.0;
        self.center + Vec2::new(col, row) * self.pitch
    }
}

pub struct Scene {
    tile: Vec2,
    columns: usize,
    loaders: Vec<Loader>,
    background: Vec3,
    glow: Vec3,
    glow_intensity: f32,
    glow_blur: f32,
    glow_spread: f32,
}

impl Scene {
    pub fn new(cfg: &Config, (width, height): (u32, u32), time: f32) -> Self {
        let size = Vec2::new(width as f32, height as f32);
        let speed = cfg.num("speed");
        let t_ms = time * 1000.0;

        let chosen: Vec<&Pattern> = match cfg.text("pattern").and_then(find_pattern) {
            Some(p) => vec![p],
            None => PATTERNS.iter().collect(),
        };
        let columns = if chosen.len() == 1 { 1 } else { 3 };
        let rows = chosen.len().div_ceil(columns);
        let tile = size / Vec2::new(columns as f32, rows as f32);
        let side = tile.min_element() * if columns == 1 { 0.5 } else { 0.4 };
        let pitch = side / 3.0;

        let loaders = chosen
            .iter()
            .enumerate()
            .map(|(i, p)| {
                let slot = Vec2::new((i % columns) as f32, (i / columns) as f32);
                Loader {
                    center: (slot + Vec2::splat(0.5)) * tile,
                    cell: pitch * 0.82,
                    pitch,
                    opacities: p.delays.map(|d| cell_opacity(d, p.duration, speed, t_ms)),
                }
            })
            .collect();

        let glow_size = cfg.num("glowSize").max(0.0);
        Self {
            tile,
            columns,
            loaders,
            background: hex_rgb(BACKGROUND).unwrap_or(Vec3::ZERO),
            glow: cfg.color("glow").to_srgb(),
            glow_intensity: cfg.num("glowIntensity").clamp(0.0, 1.0),
            glow_blur: glow_size,
            glow_spread: glow_size * 0.25,
        }
    }

    fn glow_falloff(&self, sd: f32) -> f32 {
        let d = (sd - self.glow_spread).max(0.0);
        let sigma = self.glow_blur * 0.5;
        if sigma <= 0.0 {
            return if d <= 0.0 { 1.0 } else { 0.0 };
        }
        (-(d / sigma).powi(2)).exp()
    }
}

impl Shader for Scene {
    fn shade(&self, pixel: Vec2) -> Vec3 {
        let slot = (pixel / self.tile).floor();
        let index = slot.y.max(0.0) as usize * self.columns + (slot.x.max(0.0) as usize).min(self.columns - 1);
        let mut color = self.background;
        let Some(loader) = self.loaders.get(index) else {
            return color;
        };

        let half = Vec2::splat(loader.cell * 0.5);
        let radius = loader.cell * 0.15;
        for (i, &opacity) in loader.opacities.iter().enumerate() {
            if opacity > LIT {
                let sd = rounded_box(pixel - loader.cell_center(i), half, radius);
                color = mix3(color, self.glow, self.glow_falloff(sd) * self.glow_intensity * opacity);
            }
        }
        for (i, &opacity) in loader.opacities.iter().enumerate() {
            let sd = rounded_box(pixel - loader.cell_center(i), half, radius);
            let coverage = (0.5 - sd).clamp(0.0, 1.0);
            color = mix3(color, self.glow, coverage * opacity);
        }
        color
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Value;

    #[test]
    fn opacity_follows_half_sine() {
        // 600 ms fade, no delay: peak at 600 ms
        assert_eq!(cell_opacity(0.0, 600.0, 1.0, 0.0), DIM);
        assert!((cell_opacity(0.0, 600.0, 1.0, 600.0) - 1.0).abs() < 1e-5);
        // pause at the end of the 1400 ms cycle
        assert_eq!(cell_opacity(0.0, 600.0, 1.0, 1300.0), DIM);
        // wraps
        assert_eq!(cell_opacity(0.0, 600.0, 1.0, 1400.0 + 600.0), cell_opacity(0.0, 600.0, 1.0, 600.0));
    }

    #[test]
    fn delay_holds_cell_dim() {
        assert_eq!(cell_opacity(200.0, 600.0, 1.0, 150.0), DIM);
        assert!(cell_opacity(200.0, 600.0, 1.0, 500.0) > DIM);
    }

    #[test]
    fn speed_scales_the_cycle() {
        let slow = cell_opacity(0.0, 600.0, 1.0, 300.0);
        let fast = cell_opacity(0.0, 600.0, 2.0, 150.0);
        assert!((slow - fast).abs() < 1e-5);
    }

    #[test]
    fn stopped_loaders_rest_dim() {
        for t in [0.0, 123.0, 999.0] {
            assert_eq!(cell_opacity(0.0, 600.0, 0.0, t), DIM);
            assert_eq!(cell_opacity(0.0, 600.0, -1.0, t), DIM);
        }
    }

    #[test]
    fn every_pattern_is_findable() {
        for p in &PATTERNS {
            assert_eq!(find_pattern(p.name), Some(p));
        }
        assert!(find_pattern("zigzag").is_none());
    }

    #[test]
    fn single_pattern_uses_whole_frame() {
        let mut cfg = Config::from_template(DEFAULTS);
        cfg.set("pattern", Value::Text("corners".into()));
        let scene = Scene::new(&cfg, (90, 90), 0.0);
        assert_eq!(scene.loaders.len(), 1);
        assert_eq!(scene.loaders[0].center, Vec2::new(45.0, 45.0));

        let gallery = Scene::new(&Config::from_template(DEFAULTS), (90, 90), 0.0);
        assert_eq!(gallery.loaders.len(), 9);
    }

    #[test]
    fn cell_centres_are_lit_with_the_glow_color() {
        let mut cfg = Config::from_template(DEFAULTS);
        cfg.set("pattern", Value::Text("wave-lr".into()));
        // first column peaks at 600 ms
        let scene = Scene::new(&cfg, (120, 120), 0.6);
        let loader = &scene.loaders[0];
        let lit = scene.shade(loader.cell_center(0));
        assert!((lit - scene.glow).abs().max_element() < 1e-3);
    }
}
