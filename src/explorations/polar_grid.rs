//! Rings x spokes lattice of glowing nodes over a radial gradient.
//!
//! Composited like a 2D canvas: display-encoded sRGB, source-over alpha.

use std::f32::consts::TAU;

use glam::{Vec2, Vec3};

use crate::color::mix3;
use crate::config::{Config, Param, Template};
use crate::noise::{hash12, SeededRng};
use crate::surface::Shader;

pub const DEFAULTS: &Template = &[
    ("ringCount", Param::Num(6.0)),
    ("spokeCount", Param::Num(12.0)),
    ("gridRadius", Param::Num(0.78)),
    ("nodeBrightness", Param::Num(0.65)),
    ("nodeSize", Param::Num(1.6)),
    ("gridBrightness", Param::Num(0.25)),
    ("nodeRandomness", Param::Num(0.0)),
    ("bgL", Param::Num(0.18)),
    ("bgC", Param::Num(0.05)),
    ("bgH", Param::Num(275.0)),
    ("gridL", Param::Num(0.9)),
    ("gridC", Param::Num(0.02)),
    ("gridH", Param::Num(100.0)),
    ("nodeL", Param::Num(0.92)),
    ("nodeC", Param::Num(0.08)),
    ("nodeH", Param::Num(90.0)),
    ("rotationSpeed", Param::Num(0.0)),
    ("twinkleRate", Param::Num(0.0)),
    ("pulseAmplitude", Param::Num(0.0)),
    ("seed", Param::Num(42.0)),
];

/// One speck per this many pixels.
const SPECKLE_AREA: f32 = 7000.0;
const SPECKLE_ALPHA: f32 = 0.12;
const BUCKET: f32 = 32.0;

pub fn is_motion_active(cfg: &Config) -> bool {
    cfg.num("rotationSpeed") != 0.0 || cfg.num("twinkleRate") > 0.0 || cfg.num("pulseAmplitude") > 0.0
}

fn ring_count(cfg: &Config) -> u32 {
    cfg.num("ringCount").round().clamp(2.0, 60.0) as u32
}

fn spoke_count(cfg: &Config) -> u32 {
    cfg.num("spokeCount").round().clamp(4.0, 120.0) as u32
}

/// Node in polar form, relative to the grid centre.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Node {
    pub ring: u32,
    pub spoke: u32,
    pub angle: f32,
    pub radius: f32,
}

/// Lattice positions blended toward uniform random disc placement by
/// `nodeRandomness`. Depends only on the config, never on time.
pub fn layout(cfg: &Config, grid_radius: f32) -> Vec<Node> {
    let rings = ring_count(cfg);
    let spokes = spoke_count(cfg);
    let randomness = cfg.num("nodeRandomness").clamp(0.0, 1.0);
    let mut rng = SeededRng::new(cfg.num("seed").round() as i64);

    let mut nodes = Vec::with_capacity((rings * spokes) as usize);
    for ring in 1..=rings {
        let ring_radius = grid_radius * ring as f32 / rings as f32;
        for spoke in 0..spokes {
            let angle = TAU * spoke as f32 / spokes as f32;
            let jitter = (rng.next_f32() - 0.5) * 0.02 * grid_radius;
            let random_angle = rng.next_f32() * TAU;
            let random_radius = rng.next_f32().sqrt() * grid_radius;

            let lattice = Vec2::from_angle(angle) * (ring_radius + jitter * (1.0 - randomness));
            let scattered = Vec2::from_angle(random_angle) * random_radius;
            let p = lattice * (1.0 - randomness) + scattered * randomness;
            nodes.push(Node {
                ring,
                spoke,
                angle: p.y.atan2(p.x),
                radius: p.length(),
            });
        }
    }
    nodes
}

#[derive(Debug, Clone, Copy)]
struct Dot {
    pos: Vec2,
    size: f32,
    alpha: f32,
}

pub struct Scene {
    center: Vec2,
    radius: f32,
    rings: u32,
    spokes: u32,
    spoke_phase: f32,
    stops: [Vec3; 3],
    speckle_seed: Vec2,
    grid: Vec3,
    grid_alpha: f32,
    node: Vec3,
    dots: Vec<Dot>,
    buckets: Vec<Vec<usize>>,
    cols: usize,
    rows: usize,
}

impl Scene {
    pub fn new(cfg: &Config, (width, height): (u32, u32), time: f32) -> Self {
        let (w, h) = (width as f32, height as f32);
        let center = Vec2::new(w * 0.5, h * 0.5);
        let radius = w.min(h) * cfg.num("gridRadius") * 0.5;
        let rotation = cfg.num("rotationSpeed") * 0.2;

        let bg = cfg.color("bg");
        let stops = [
            bg.with_lightness((bg.l + 0.08).clamp(0.0, 1.0)).to_srgb(),
            bg.to_srgb(),
            bg.with_lightness((bg.l - 0.1).clamp(0.0, 1.0)).to_srgb(),
        ];

        let brightness = cfg.num("nodeBrightness").clamp(0.05, 1.0);
        let twinkle = cfg.num("twinkleRate").clamp(0.0, 1.0);
        let twinkle_speed = 0.6 + twinkle * 2.8;
        let pulse = cfg.num("pulseAmplitude");
        let node_size = cfg.num("nodeSize");

        let dots = layout(cfg, radius)
            .into_iter()
            .map(|n| {
                let phase = n.ring as f32 * 0.9 + n.spoke as f32 * 0.35;
                let flicker = ((time * twinkle_speed + phase).sin() + 1.0) * 0.5;
                let intensity = 0.3 + flicker * 0.7;
                let r = n.radius * (1.0 + (time * 1.6 + n.ring as f32).sin() * pulse * 0.08);
                Dot {
                    pos: center + Vec2::from_angle(n.angle + time * rotation) * r,
                    size: node_size * (1.0 - twinkle * 0.35 + twinkle * intensity),
                    alpha: brightness * (1.0 - twinkle + twinkle * intensity),
                }
            })
            .collect::<Vec<_>>();

        let cols = (w / BUCKET).ceil().max(1.0) as usize;
        let rows = (h / BUCKET).ceil().max(1.0) as usize;
        let mut buckets = vec![Vec::new(); cols * rows];
        for (i, dot) in dots.iter().enumerate() {
            let reach = dot.size.abs() + 1.0;
            let lo = ((dot.pos - Vec2::splat(reach)) / BUCKET).floor();
            let hi = ((dot.pos + Vec2::splat(reach)) / BUCKET).floor();
            if hi.x < 0.0 || hi.y < 0.0 || lo.x >= cols as f32 || lo.y >= rows as f32 {
                continue;
            }
            let (x0, y0) = (lo.x.max(0.0) as usize, lo.y.max(0.0) as usize);
            let x1 = (hi.x as usize).min(cols - 1);
            let y1 = (hi.y as usize).min(rows - 1);
            for by in y0..=y1 {
                for bx in x0..=x1 {
                    buckets[by * cols + bx].push(i);
                }
            }
        }

        Self {
            center,
            radius,
            rings: ring_count(cfg),
            spokes: spoke_count(cfg),
            spoke_phase: time * rotation,
            stops,
            speckle_seed: Vec2::splat(cfg.num("seed") * 0.618),
            grid: cfg.color("grid").to_srgb(),
            grid_alpha: 0.22 * cfg.num("gridBrightness").clamp(0.0, 1.0),
            node: cfg.color("node").to_srgb(),
            dots,
            buckets,
            cols,
            rows,
        }
    }

    fn background(&self, dist: f32) -> Vec3 {
        let r0 = self.radius * 0.1;
        let r1 = self.radius * 1.4;
        let t = if r1 > r0 {
            ((dist - r0) / (r1 - r0)).clamp(0.0, 1.0)
        } else {
            1.0
        };
        if t < 0.6 {
            mix3(self.stops[0], self.stops[1], t / 0.6)
        } else {
            mix3(self.stops[1], self.stops[2], (t - 0.6) / 0.4)
        }
    }

    fn ring_coverage(&self, dist: f32) -> f32 {
        let spacing = self.radius / self.rings as f32;
        if spacing <= 0.0 || dist > self.radius + 1.0 {
            return 0.0;
        }
        let k = (dist / spacing).round().clamp(1.0, self.rings as f32);
        (1.0 - (dist - k * spacing).abs()).clamp(0.0, 1.0)
    }

    fn spoke_coverage(&self, offset: Vec2, dist: f32) -> f32 {
        if dist > self.radius + 0.5 {
            return 0.0;
        }
        let step = TAU / self.spokes as f32;
        let angle = offset.y.atan2(offset.x) - self.spoke_phase;
        let delta = angle - (angle / step).round() * step;
        let along = dist * delta.cos();
        if along < 0.0 || along > self.radius {
            return 0.0;
        }
        (1.0 - dist * delta.sin().abs()).clamp(0.0, 1.0)
    }
}

impl Shader for Scene {
    fn shade(&self, pixel: Vec2) -> Vec3 {
        let offset = pixel - self.center;
        let dist = offset.length();
        let mut color = self.background(dist);

        if hash12(pixel.floor() + self.speckle_seed) < 1.0 / SPECKLE_AREA {
            color = mix3(color, Vec3::ONE, SPECKLE_ALPHA);
        }

        color = mix3(color, self.grid, self.grid_alpha * self.ring_coverage(dist));
        color = mix3(color, self.grid, self.grid_alpha * self.spoke_coverage(offset, dist));

        let bx = ((pixel.x / BUCKET) as usize).min(self.cols - 1);
        let by = ((pixel.y / BUCKET) as usize).min(self.rows - 1);
        for &i in &self.buckets[by * self.cols + bx] {
            let dot = self.dots[i];
            let coverage = (dot.size + 0.5 - pixel.distance(dot.pos)).clamp(0.0, 1.0);
            color = mix3(color, self.node, dot.alpha.clamp(0.0, 1.0) * coverage);
        }
        color
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Value;

    fn defaults() -> Config {
        Config::from_template(DEFAULTS)
    }

    #[test]
    fn layout_is_seeded() {
        let cfg = defaults();
        assert_eq!(layout(&cfg, 100.0), layout(&cfg, 100.0));
        let mut other = defaults();
        other.set("seed", Value::Number(7.0));
        assert_ne!(layout(&cfg, 100.0), layout(&other, 100.0));
    }

    #[test]
    fn layout_respects_clamped_counts() {
        let mut cfg = defaults();
        cfg.set("ringCount", Value::Number(1.0));
        cfg.set("spokeCount", Value::Number(500.0));
        let nodes = layout(&cfg, 50.0);
        assert_eq!(nodes.len(), 2 * 120);
    }

    #[test]
    fn lattice_nodes_sit_near_their_rings() {
        let cfg = defaults();
        for n in layout(&cfg, 120.0) {
            let ring_radius = 120.0 * n.ring as f32 / 6.0;
            assert!((n.radius - ring_radius).abs() <= 0.01 * 120.0 + 1e-3);
        }
    }

    #[test]
    fn full_randomness_stays_inside_disc() {
        let mut cfg = defaults();
        cfg.set("nodeRandomness", Value::Number(1.0));
        for n in layout(&cfg, 80.0) {
            assert!(n.radius <= 80.0 + 1e-3);
        }
    }

    #[test]
    fn motion_rules() {
        let mut cfg = defaults();
        assert!(!is_motion_active(&cfg));
        cfg.set("rotationSpeed", Value::Number(-0.5));
        assert!(is_motion_active(&cfg));
        cfg.set("rotationSpeed", Value::Number(0.0));
        cfg.set("twinkleRate", Value::Number(0.2));
        assert!(is_motion_active(&cfg));
    }

    #[test]
    fn node_pixels_are_brighter_than_background() {
        let cfg = defaults();
        let scene = Scene::new(&cfg, (200, 200), 0.0);
        let dot = scene.dots[0];
        let on = scene.shade(dot.pos);
        let off = scene.background(dot.pos.distance(scene.center));
        assert!(on.x > off.x);
    }
}
