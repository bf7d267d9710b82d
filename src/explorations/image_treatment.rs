//! Photo treatments: the full stylization pipeline applied to a source image.

use std::str::FromStr;

use glam::{Vec2, Vec3};

use crate::assets::SourceImage;
use crate::config::{Config, Param, Template};
use crate::error::RenderError;
use crate::passes::{
    BayerSize, ColorAdjustParams, DitherParams, GrainParams, GrainPattern, HalftoneMode,
    HalftoneParams, Pass, PixelShape, PixelateParams, Pipeline, PosterizeParams,
};
use crate::surface::Shader;

pub const DEFAULT_IMAGE: &str = "flower1";

pub const DEFAULTS: &Template = &[
    ("image", Param::Choice(DEFAULT_IMAGE)),
    ("grainAmount", Param::Num(0.0)),
    ("grainSize", Param::Num(1.0)),
    ("grainAnimated", Param::Flag(false)),
    ("ditherMode", Param::Choice("none")),
    ("ditherIntensity", Param::Num(0.5)),
    ("ditherColors", Param::Num(4.0)),
    ("halftoneAmount", Param::Num(0.0)),
    ("halftoneSize", Param::Num(6.0)),
    ("halftoneAngle", Param::Num(45.0)),
    ("halftoneCMYK", Param::Flag(false)),
    ("pixelSize", Param::Num(1.0)),
    ("pixelShape", Param::Choice("square")),
    ("brightness", Param::Num(1.0)),
    ("posterize", Param::Num(32.0)),
    ("saturation", Param::Num(1.0)),
    ("contrast", Param::Num(1.0)),
    ("asciiSize", Param::Num(0.0)),
    ("asciiColor", Param::Flag(true)),
];

/// Posterize at or above this many levels is treated as off.
pub const POSTERIZE_OFF: f32 = 32.0;

pub fn is_motion_active(cfg: &Config) -> bool {
    cfg.flag("grainAnimated") && cfg.num("grainAmount") > 0.0
}

/// `ditherMode`: `none` or a Bayer matrix name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DitherMode(pub Option<BayerSize>);

impl FromStr for DitherMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim() == "none" {
            Ok(DitherMode(None))
        } else {
            s.parse().map(|m| DitherMode(Some(m)))
        }
    }
}

/// Reads `key`, treating 0 (or a missing key) as `fallback`.
fn num_or(cfg: &Config, key: &str, fallback: f32) -> f32 {
    let n = cfg.num(key);
    if n == 0.0 {
        fallback
    } else {
        n
    }
}

/// Pass list in the fixed treatment order; disabled stages are left out.
pub fn passes(cfg: &Config) -> Vec<Pass> {
    let mut passes = vec![Pass::ColorAdjust(ColorAdjustParams {
        brightness: cfg.num("brightness"),
        saturation: cfg.num("saturation"),
        contrast: cfg.num("contrast"),
    })];

    let levels = num_or(cfg, "posterize", POSTERIZE_OFF);
    if levels < POSTERIZE_OFF {
        passes.push(Pass::Posterize(PosterizeParams { levels }));
    }

    if cfg.num("halftoneAmount") > 0.0 {
        passes.push(Pass::Halftone(HalftoneParams {
            amount: cfg.num("halftoneAmount"),
            cell_size: num_or(cfg, "halftoneSize", 6.0),
            angle_deg: cfg.num("halftoneAngle"),
            mode: if cfg.flag("halftoneCMYK") {
                HalftoneMode::Cmyk
            } else {
                HalftoneMode::Mono
            },
        }));
    }

    if let DitherMode(Some(matrix)) = cfg.choice("ditherMode", DitherMode(None)) {
        passes.push(Pass::Dither(DitherParams {
            matrix,
            levels: num_or(cfg, "ditherColors", 4.0),
            intensity: cfg.num("ditherIntensity"),
        }));
    }

    if cfg.num("grainAmount") > 0.0 {
        passes.push(Pass::Grain(GrainParams {
            intensity: cfg.num("grainAmount"),
            size: num_or(cfg, "grainSize", 1.0),
            animated: cfg.flag("grainAnimated"),
            rate: 1.0,
            pattern: GrainPattern::Hash,
        }));
    }

    let cell_size = cfg.num("pixelSize");
    if cell_size > 1.0 {
        passes.push(Pass::Pixelate(PixelateParams {
            cell_size,
            shape: cfg.choice("pixelShape", PixelShape::Square),
        }));
    }
    passes
}

pub struct Scene<'a> {
    image: &'a SourceImage,
    size: Vec2,
    time: f32,
    pipeline: Pipeline,
}

impl<'a> Scene<'a> {
    pub fn new(
        cfg: &Config,
        image: &'a SourceImage,
        (width, height): (u32, u32),
        time: f32,
    ) -> Result<Self, RenderError> {
        Ok(Self {
            image,
            size: Vec2::new(width as f32, height as f32),
            time,
            pipeline: Pipeline::build(passes(cfg))?,
        })
    }
}

impl Shader for Scene<'_> {
    fn shade(&self, pixel: Vec2) -> Vec3 {
        let at = self.pipeline.sample_point(pixel);
        let color = self.image.sample(at / self.size);
        self.pipeline.apply(color, pixel, self.time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Value;

    fn names(cfg: &Config) -> Vec<&'static str> {
        passes(cfg).iter().map(Pass::name).collect()
    }

    #[test]
    fn defaults_only_adjust_color() {
        let cfg = Config::from_template(DEFAULTS);
        assert_eq!(names(&cfg), vec!["color-adjust"]);
    }

    #[test]
    fn everything_enabled_keeps_treatment_order() {
        let mut cfg = Config::from_template(DEFAULTS);
        cfg.set("posterize", Value::Number(6.0));
        cfg.set("halftoneAmount", Value::Number(0.5));
        cfg.set("ditherMode", Value::Text("bayer8".into()));
        cfg.set("grainAmount", Value::Number(0.2));
        cfg.set("pixelSize", Value::Number(4.0));
        cfg.set("pixelShape", Value::Text("diamond".into()));
        assert_eq!(
            names(&cfg),
            vec!["color-adjust", "posterize", "halftone", "dither", "grain", "pixelate"]
        );
        assert!(Pipeline::build(passes(&cfg)).is_ok());
    }

    #[test]
    fn one_dither_color_is_rejected() {
        let mut cfg = Config::from_template(DEFAULTS);
        cfg.set("ditherMode", Value::Text("bayer2".into()));
        cfg.set("ditherColors", Value::Number(1.0));
        assert!(Pipeline::build(passes(&cfg)).is_err());
    }

    #[test]
    fn zero_means_off_or_default() {
        let mut cfg = Config::from_template(DEFAULTS);
        cfg.set("posterize", Value::Number(0.0));
        cfg.set("grainAmount", Value::Number(0.3));
        cfg.set("grainSize", Value::Number(0.0));
        cfg.set("halftoneAmount", Value::Number(0.4));
        cfg.set("halftoneSize", Value::Number(0.0));
        cfg.set("ditherMode", Value::Text("bayer4".into()));
        cfg.set("ditherColors", Value::Number(0.0));
        assert_eq!(names(&cfg), vec!["color-adjust", "halftone", "dither", "grain"]);
        assert!(Pipeline::build(passes(&cfg)).is_ok());
    }

    #[test]
    fn parses_dither_modes() {
        assert_eq!("none".parse::<DitherMode>(), Ok(DitherMode(None)));
        assert_eq!("bayer4".parse::<DitherMode>(), Ok(DitherMode(Some(BayerSize::Four))));
        assert!("floyd".parse::<DitherMode>().is_err());
    }

    #[test]
    fn animated_grain_needs_an_amount() {
        let mut cfg = Config::from_template(DEFAULTS);
        cfg.set("grainAnimated", Value::Bool(true));
        assert!(!is_motion_active(&cfg));
        cfg.set("grainAmount", Value::Number(0.1));
        assert!(is_motion_active(&cfg));
    }
}
