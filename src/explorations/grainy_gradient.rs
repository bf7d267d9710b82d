//! Three OKLCH colors blended by drifting fbm fields, finished with grain.

use std::str::FromStr;

use glam::{Vec2, Vec3};

use crate::color::smoothstep;
use crate::config::{Config, Param, Template};
use crate::error::RenderError;
use crate::fbm::Fbm;
use crate::passes::{BayerSize, GrainParams, GrainPattern, Pass, Pipeline};
use crate::surface::Shader;

pub const DEFAULTS: &Template = &[
    ("color1L", Param::Num(0.65)),
    ("color1C", Param::Num(0.2)),
    ("color1H", Param::Num(280.0)),
    ("color2L", Param::Num(0.7)),
    ("color2C", Param::Num(0.18)),
    ("color2H", Param::Num(180.0)),
    ("color3L", Param::Num(0.55)),
    ("color3C", Param::Num(0.22)),
    ("color3H", Param::Num(30.0)),
    ("speed", Param::Num(0.3)),
    ("blobSize", Param::Num(0.8)),
    ("softness", Param::Num(0.5)),
    ("complexity", Param::Num(2.0)),
    ("grainStyle", Param::Choice("film")),
    ("grainIntensity", Param::Num(0.15)),
    ("halftoneSize", Param::Num(4.0)),
];

/// Per-field (offset, drift).
const FIELDS: [(Vec2, Vec2); 3] = [
    (Vec2::new(0.0, 0.0), Vec2::new(0.15, 0.1)),
    (Vec2::new(3.7, 1.2), Vec2::new(-0.1, 0.12)),
    (Vec2::new(1.4, 4.3), Vec2::new(0.08, -0.11)),
];

const MIN_WEIGHT: f32 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrainStyle {
    Film,
    Ordered,
    Halftone,
}

impl FromStr for GrainStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "film" => Ok(GrainStyle::Film),
            "ordered" => Ok(GrainStyle::Ordered),
            "halftone" => Ok(GrainStyle::Halftone),
            other => Err(format!("unknown grain style `{other}`")),
        }
    }
}

pub fn is_motion_active(cfg: &Config) -> bool {
    let film = cfg.choice("grainStyle", GrainStyle::Film) == GrainStyle::Film;
    cfg.num("speed") != 0.0 || (film && cfg.num("grainIntensity") > 0.0)
}

pub struct Scene {
    size: Vec2,
    aspect: f32,
    clock: f32,
    time: f32,
    colors: [Vec3; 3],
    blob: f32,
    softness: f32,
    fbm: Fbm,
    pipeline: Pipeline,
}

impl Scene {
    pub fn new(cfg: &Config, (width, height): (u32, u32), time: f32) -> Result<Self, RenderError> {
        let pattern = match cfg.choice("grainStyle", GrainStyle::Film) {
            GrainStyle::Film => GrainPattern::Hash,
            GrainStyle::Ordered => GrainPattern::Ordered(BayerSize::Four),
            GrainStyle::Halftone => GrainPattern::Dots {
                cell_size: cfg.num("halftoneSize"),
            },
        };
        let pipeline = Pipeline::build(vec![Pass::Grain(GrainParams {
            intensity: cfg.num("grainIntensity"),
            size: 1.0,
            animated: true,
            rate: 100.0,
            pattern,
        })])?;

        Ok(Self {
            size: Vec2::new(width as f32, height as f32),
            aspect: width as f32 / height as f32,
            clock: time,
            time: time * cfg.num("speed"),
            colors: [
                cfg.color("color1").to_linear_rgb(),
                cfg.color("color2").to_linear_rgb(),
                cfg.color("color3").to_linear_rgb(),
            ],
            blob: cfg.num("blobSize"),
            softness: cfg.num("softness"),
            fbm: Fbm::new(cfg.num("complexity"))
                .with_amplitude(0.6)
                .with_max_octaves(5),
            pipeline,
        })
    }

    /// Normalised blend weights at a noise coordinate.
    fn weights(&self, p: Vec2) -> [f32; 3] {
        let drift = Vec2::splat(self.time * 0.05);
        let mut w = FIELDS.map(|(offset, speed)| {
            let n = self.fbm.sample_offset(p + offset + self.time * speed, drift);
            smoothstep(-self.softness, self.softness, n).max(MIN_WEIGHT)
        });
        let total: f32 = w.iter().sum();
        for v in &mut w {
            *v /= total;
        }
        w
    }
}

impl Shader for Scene {
    fn shade(&self, pixel: Vec2) -> Vec3 {
        let uv = Vec2::new(pixel.x / self.size.x, 1.0 - pixel.y / self.size.y);
        let p = Vec2::new(uv.x * self.aspect, uv.y) * self.blob;
        let [w1, w2, w3] = self.weights(p);
        let color = self.colors[0] * w1 + self.colors[1] * w2 + self.colors[2] * w3;
        self.pipeline.apply(color, pixel, self.clock)
    }
}
