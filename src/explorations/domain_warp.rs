//! Domain-warped swirls: noise fed into noise coordinates, tinted from one base color.

use glam::{Vec2, Vec3};

use crate::color::{mix3, smoothstep};
use crate::config::{Config, Param, Template};
use crate::error::RenderError;
use crate::fbm::DomainWarp;
use crate::passes::{GrainParams, GrainPattern, Pass, Pipeline};
use crate::surface::Shader;

pub const DEFAULTS: &Template = &[
    ("baseColorL", Param::Num(0.55)),
    ("baseColorC", Param::Num(0.15)),
    ("baseColorH", Param::Num(80.0)),
    ("colorRange", Param::Num(0.2)),
    ("colorShift", Param::Num(15.0)),
    ("warpStrength", Param::Num(1.2)),
    ("warpScale", Param::Num(2.0)),
    ("warpDetail", Param::Num(3.0)),
    ("lightX", Param::Num(0.6)),
    ("lightY", Param::Num(0.3)),
    ("lightIntensity", Param::Num(0.3)),
    ("lightSize", Param::Num(0.4)),
    ("speed", Param::Num(0.15)),
    ("grainIntensity", Param::Num(0.12)),
    ("grainSize", Param::Num(1.0)),
];

const LIGHT_TINT: Vec3 = Vec3::new(1.0, 0.98, 0.95);

pub fn is_motion_active(cfg: &Config) -> bool {
    cfg.num("speed") != 0.0 || cfg.num("grainIntensity") > 0.0
}

pub struct Scene {
    size: Vec2,
    aspect: f32,
    clock: f32,
    time: f32,
    scale: f32,
    warp: DomainWarp,
    dark: Vec3,
    light: Vec3,
    light_pos: Vec2,
    light_size: f32,
    light_intensity: f32,
    pipeline: Pipeline,
}

impl Scene {
    pub fn new(cfg: &Config, (width, height): (u32, u32), time: f32) -> Result<Self, RenderError> {
        let aspect = width as f32 / height as f32;
        let base = cfg.color("baseColor").to_linear_rgb();
        let range = cfg.num("colorRange");
        let shift = cfg.num("colorShift") / 360.0;

        let mut light = base * (1.0 + range * 0.8) + Vec3::splat(range * 0.3);
        light.x += shift * 0.3;
        light.z -= shift * 0.2;

        let pipeline = Pipeline::build(vec![Pass::Grain(GrainParams {
            intensity: cfg.num("grainIntensity"),
            size: cfg.num("grainSize"),
            animated: true,
            rate: 43.0,
            pattern: GrainPattern::Hash,
        })])?;

        Ok(Self {
            size: Vec2::new(width as f32, height as f32),
            aspect,
            clock: time,
            time: time * cfg.num("speed"),
            scale: cfg.num("warpScale"),
            warp: DomainWarp::two_layer(cfg.num("warpStrength"), cfg.num("warpDetail")),
            dark: base * (1.0 - range),
            light,
            light_pos: Vec2::new(cfg.num("lightX") * aspect, cfg.num("lightY")),
            light_size: cfg.num("lightSize"),
            light_intensity: cfg.num("lightIntensity"),
            pipeline,
        })
    }
}

impl Shader for Scene {
    fn shade(&self, pixel: Vec2) -> Vec3 {
        let uv = Vec2::new(pixel.x / self.size.x, 1.0 - pixel.y / self.size.y);
        let aspect_uv = Vec2::new(uv.x * self.aspect, uv.y);

        let f = self.warp.sample(aspect_uv * self.scale, self.time).value;
        let mut color = mix3(self.dark, self.light, f * 0.5 + 0.5);
        // Fold shading
        color *= 0.85 + 0.3 * smoothstep(-0.5, 0.5, f);

        let spread = self.light_size * self.light_size * 0.5;
        if spread > 0.0 {
            let d = aspect_uv.distance(self.light_pos);
            color += LIGHT_TINT * (-d * d / spread).exp() * self.light_intensity;
        }

        self.pipeline.apply(color, pixel, self.clock)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Value;

    #[test]
    fn highlight_brightens_the_light_position() {
        let mut cfg = Config::from_template(DEFAULTS);
        cfg.set("grainIntensity", Value::Number(0.0));
        cfg.set("lightIntensity", Value::Number(0.8));
        cfg.set("lightSize", Value::Number(0.1));
        let scene = Scene::new(&cfg, (100, 100), 0.0).unwrap();
        // lightY is measured from the bottom edge
        let at_light = scene.shade(Vec2::new(60.5, 70.5));
        let far = scene.shade(Vec2::new(5.5, 5.5));
        assert!(at_light.length() > far.length());
    }

    #[test]
    fn bad_grain_size_fails_to_build() {
        let mut cfg = Config::from_template(DEFAULTS);
        cfg.set("grainSize", Value::Number(0.0));
        assert!(matches!(Scene::new(&cfg, (8, 8), 0.0), Err(RenderError::Pipeline(_))));
    }

    #[test]
    fn still_without_speed_or_grain() {
        let mut cfg = Config::from_template(DEFAULTS);
        assert!(is_motion_active(&cfg));
        cfg.set("speed", Value::Number(0.0));
        cfg.set("grainIntensity", Value::Number(0.0));
        assert!(!is_motion_active(&cfg));
    }
}
