//! Per-pixel stylization passes and the ordered pipeline that composes them.
//!
//! Every pass is a pure function of the incoming color, the fragment's pixel
//! position and the animation time. Pixelation is the one pass that also
//! touches *where* the source is sampled: `Pipeline::sample_point` snaps the
//! lookup coordinate, and the shape mask is applied at the pass's own slot in
//! `Pipeline::apply`.

use std::fmt;
use std::str::FromStr;

use glam::{Vec2, Vec3};

use crate::color::{hsv_to_rgb, luma601, luma709, mix3, rgb_to_hsv, smoothstep};
use crate::error::PipelineError;
use crate::noise::{fract, hash12};

const BAYER2: [u32; 4] = [0, 2, 3, 1];
const BAYER4: [u32; 16] = [0, 8, 2, 10, 12, 4, 14, 6, 3, 11, 1, 9, 15, 7, 13, 5];

/// Ordered-dither threshold matrix size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BayerSize {
    Two,
    Four,
    Eight,
}

impl BayerSize {
    pub fn side(self) -> u32 {
        match self {
            BayerSize::Two => 2,
            BayerSize::Four => 4,
            BayerSize::Eight => 8,
        }
    }

    /// Matrix entry at integer pixel (x, y); wraps every `side()` pixels.
    pub fn index(self, x: u32, y: u32) -> u32 {
        match self {
            BayerSize::Two => BAYER2[((y % 2) * 2 + x % 2) as usize],
            BayerSize::Four => BAYER4[((y % 4) * 4 + x % 4) as usize],
            BayerSize::Eight => {
                let (x, y) = (x % 8, y % 8);
                let quad = (y / 4) * 2 + x / 4;
                BAYER4[((y % 4) * 4 + x % 4) as usize] + 16 * BAYER2[quad as usize]
            }
        }
    }

    /// Threshold in [0, 1) for a pixel-space position.
    pub fn threshold(self, pixel: Vec2) -> f32 {
        let side = self.side() as f32;
        let x = pixel.x.floor().rem_euclid(side) as u32;
        let y = pixel.y.floor().rem_euclid(side) as u32;
        let n = self.side();
        self.index(x, y) as f32 / (n * n) as f32
    }
}

impl FromStr for BayerSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bayer2" | "2" => Ok(BayerSize::Two),
            "bayer4" | "4" => Ok(BayerSize::Four),
            "bayer8" | "8" => Ok(BayerSize::Eight),
            other => Err(format!("unknown Bayer matrix `{other}`")),
        }
    }
}

impl fmt::Display for BayerSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bayer{}", self.side())
    }
}

/// Source of the signed grain offset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GrainPattern {
    /// Per-pixel hash noise.
    Hash,
    /// Bayer threshold pattern centred on zero.
    Ordered(BayerSize),
    /// Unrotated hard-edged dots sized by luminance: -0.3 inside, 0.1 outside.
    Dots { cell_size: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GrainParams {
    pub intensity: f32,
    /// Pixels per grain cell.
    pub size: f32,
    /// Re-seed the hash every frame.
    pub animated: bool,
    /// Seed = fract(time * rate) when animated.
    pub rate: f32,
    pub pattern: GrainPattern,
}

impl Default for GrainParams {
    fn default() -> Self {
        Self {
            intensity: 0.1,
            size: 1.0,
            animated: true,
            rate: 1.0,
            pattern: GrainPattern::Hash,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DitherParams {
    pub matrix: BayerSize,
    /// Output levels per channel, >= 2.
    pub levels: f32,
    pub intensity: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HalftoneMode {
    Mono,
    Cmyk,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HalftoneParams {
    pub amount: f32,
    pub cell_size: f32,
    pub angle_deg: f32,
    pub mode: HalftoneMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelShape {
    Square,
    Circle,
    Diamond,
}

impl FromStr for PixelShape {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "square" => Ok(PixelShape::Square),
            "circle" => Ok(PixelShape::Circle),
            "diamond" => Ok(PixelShape::Diamond),
            other => Err(format!("unknown pixel shape `{other}`")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelateParams {
    pub cell_size: f32,
    pub shape: PixelShape,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PosterizeParams {
    pub levels: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorAdjustParams {
    pub brightness: f32,
    pub saturation: f32,
    pub contrast: f32,
}

impl Default for ColorAdjustParams {
    fn default() -> Self {
        Self {
            brightness: 1.0,
            saturation: 1.0,
            contrast: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Pass {
    Grain(GrainParams),
    Dither(DitherParams),
    Halftone(HalftoneParams),
    Pixelate(PixelateParams),
    Posterize(PosterizeParams),
    ColorAdjust(ColorAdjustParams),
}

impl Pass {
    pub fn name(&self) -> &'static str {
        match self {
            Pass::Grain(_) => "grain",
            Pass::Dither(_) => "dither",
            Pass::Halftone(_) => "halftone",
            Pass::Pixelate(_) => "pixelate",
            Pass::Posterize(_) => "posterize",
            Pass::ColorAdjust(_) => "color-adjust",
        }
    }

    fn validate(&self) -> Result<(), PipelineError> {
        let pass = self.name();
        let finite = |field: &'static str, value: f32| {
            if value.is_finite() {
                Ok(())
            } else {
                Err(PipelineError::InvalidParameter {
                    pass,
                    field,
                    requirement: "finite",
                    value,
                })
            }
        };
        let positive = |field: &'static str, value: f32| {
            finite(field, value)?;
            if value > 0.0 {
                Ok(())
            } else {
                Err(PipelineError::InvalidParameter {
                    pass,
                    field,
                    requirement: "> 0",
                    value,
                })
            }
        };
        let at_least_two = |field: &'static str, value: f32| {
            finite(field, value)?;
            if value >= 2.0 {
                Ok(())
            } else {
                Err(PipelineError::InvalidParameter {
                    pass,
                    field,
                    requirement: ">= 2",
                    value,
                })
            }
        };

        match self {
            Pass::Grain(p) => {
                finite("intensity", p.intensity)?;
                positive("size", p.size)?;
                finite("rate", p.rate)?;
                if let GrainPattern::Dots { cell_size } = p.pattern {
                    positive("cell_size", cell_size)?;
                }
                Ok(())
            }
            Pass::Dither(p) => {
                at_least_two("levels", p.levels)?;
                finite("intensity", p.intensity)
            }
            Pass::Halftone(p) => {
                finite("amount", p.amount)?;
                positive("cell_size", p.cell_size)?;
                finite("angle_deg", p.angle_deg)
            }
            Pass::Pixelate(p) => positive("cell_size", p.cell_size),
            Pass::Posterize(p) => at_least_two("levels", p.levels),
            Pass::ColorAdjust(p) => {
                finite("brightness", p.brightness)?;
                finite("saturation", p.saturation)?;
                finite("contrast", p.contrast)
            }
        }
    }

    pub fn apply(&self, color: Vec3, pixel: Vec2, time: f32) -> Vec3 {
        match self {
            Pass::Grain(p) => grain(color, pixel, time, p),
            Pass::Dither(p) => dither(color, pixel, p),
            Pass::Halftone(p) => halftone(color, pixel, p),
            Pass::Pixelate(p) => color * pixel_mask(pixel, p),
            Pass::Posterize(p) => posterize(color, p.levels),
            Pass::ColorAdjust(p) => color_adjust(color, p),
        }
    }
}

/// Validated, ordered list of passes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Pipeline {
    passes: Vec<Pass>,
}

impl Pipeline {
    pub fn build(passes: Vec<Pass>) -> Result<Self, PipelineError> {
        for pass in &passes {
            pass.validate()?;
        }
        Ok(Self { passes })
    }

    pub fn passes(&self) -> &[Pass] {
        &self.passes
    }

    pub fn is_empty(&self) -> bool {
        self.passes.is_empty()
    }

    /// Where the source should be sampled for this fragment.
    pub fn sample_point(&self, pixel: Vec2) -> Vec2 {
        self.passes.iter().fold(pixel, |p, pass| match pass {
            Pass::Pixelate(params) => pixelate_point(p, params.cell_size),
            _ => p,
        })
    }

    /// Runs every pass in order, then clamps to [0, 1].
    pub fn apply(&self, color: Vec3, pixel: Vec2, time: f32) -> Vec3 {
        self.passes
            .iter()
            .fold(color, |c, pass| pass.apply(c, pixel, time))
            .clamp(Vec3::ZERO, Vec3::ONE)
    }
}

pub fn grain(color: Vec3, pixel: Vec2, time: f32, params: &GrainParams) -> Vec3 {
    if params.intensity == 0.0 {
        return color;
    }
    let cell = pixel / params.size;
    let offset = match params.pattern {
        GrainPattern::Hash => {
            let seed = if params.animated {
                fract(time * params.rate)
            } else {
                0.0
            };
            hash12(cell + Vec2::splat(seed)) - 0.5
        }
        GrainPattern::Ordered(matrix) => matrix.threshold(cell) - 0.5,
        GrainPattern::Dots { cell_size } => {
            let center = ((pixel / cell_size).floor() + 0.5) * cell_size;
            let radius = cell_size * 0.5 * (1.0 - luma709(color));
            if pixel.distance(center) < radius {
                -0.3
            } else {
                0.1
            }
        }
    };
    color + Vec3::splat(offset * params.intensity)
}

pub fn dither(color: Vec3, pixel: Vec2, params: &DitherParams) -> Vec3 {
    let steps = params.levels - 1.0;
    let threshold = params.matrix.threshold(pixel);
    let quantized = (color * steps + Vec3::splat(threshold * params.intensity)).floor() / steps;
    mix3(color, quantized, params.intensity)
}

fn rotate(p: Vec2, radians: f32) -> Vec2 {
    let (s, c) = radians.sin_cos();
    Vec2::new(p.x * c - p.y * s, p.x * s + p.y * c)
}

/// Anti-aliased disk coverage for one screen at `angle`.
fn dot_coverage(pixel: Vec2, angle: f32, cell_size: f32, radius: f32) -> f32 {
    if radius <= 1e-4 {
        return 0.0;
    }
    let rotated = rotate(pixel, angle);
    let cell = Vec2::new(
        rotated.x.rem_euclid(cell_size),
        rotated.y.rem_euclid(cell_size),
    );
    let dist = cell.distance(Vec2::splat(cell_size * 0.5));
    // Edge width shrinks with tiny dots so they fade out instead of leaving a 1px blob.
    let aa = radius.min(1.0);
    1.0 - smoothstep(radius - aa, radius + aa, dist)
}

pub fn halftone(color: Vec3, pixel: Vec2, params: &HalftoneParams) -> Vec3 {
    if params.amount <= 0.0 {
        return color;
    }
    let base = params.angle_deg.to_radians();
    let max_radius = params.cell_size * 0.5;
    let printed = match params.mode {
        HalftoneMode::Mono => {
            let ink = 1.0 - luma601(color);
            Vec3::splat(1.0 - dot_coverage(pixel, base, params.cell_size, max_radius * ink))
        }
        HalftoneMode::Cmyk => {
            let rgb = color.clamp(Vec3::ZERO, Vec3::ONE);
            let k = 1.0 - rgb.max_element();
            let cmy = if k < 1.0 {
                (Vec3::ONE - rgb - Vec3::splat(k)) / (1.0 - k)
            } else {
                Vec3::ZERO
            };
            let screen = |deg: f32, ink: f32| {
                dot_coverage(pixel, base + deg.to_radians(), params.cell_size, max_radius * ink)
            };
            let c = screen(15.0, cmy.x);
            let m = screen(75.0, cmy.y);
            let y = screen(0.0, cmy.z);
            let black = screen(45.0, k);
            Vec3::new(1.0 - c, 1.0 - m, 1.0 - y) * (1.0 - black)
        }
    };
    mix3(color, printed, params.amount)
}

/// Cell centre for `pixel`; identity when `cell_size <= 1`.
pub fn pixelate_point(pixel: Vec2, cell_size: f32) -> Vec2 {
    if cell_size <= 1.0 {
        return pixel;
    }
    (pixel / cell_size).floor() * cell_size + Vec2::splat(cell_size * 0.5)
}

pub fn pixel_mask(pixel: Vec2, params: &PixelateParams) -> f32 {
    if params.cell_size <= 1.0 {
        return 1.0;
    }
    let size = params.cell_size;
    let local = Vec2::new(pixel.x.rem_euclid(size), pixel.y.rem_euclid(size)) - Vec2::splat(size * 0.5);
    let radius = size * 0.45;
    let dist = match params.shape {
        PixelShape::Square => return 1.0,
        PixelShape::Circle => local.length(),
        PixelShape::Diamond => local.x.abs() + local.y.abs(),
    };
    smoothstep(radius + 1.0, radius - 1.0, dist)
}

/// Rounds each channel to `levels` evenly spaced values and clamps.
pub fn posterize(color: Vec3, levels: f32) -> Vec3 {
    let steps = levels - 1.0;
    ((color * steps + Vec3::splat(0.5)).floor() / steps).clamp(Vec3::ZERO, Vec3::ONE)
}

pub fn color_adjust(color: Vec3, params: &ColorAdjustParams) -> Vec3 {
    let mut c = color * params.brightness;
    if params.saturation != 1.0 {
        let mut hsv = rgb_to_hsv(c);
        hsv.y *= params.saturation;
        c = hsv_to_rgb(hsv);
    }
    if params.contrast != 1.0 {
        c = (c - Vec3::splat(0.5)) * params.contrast + Vec3::splat(0.5);
    }
    c
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn bayer_matrices_are_permutations() {
        for size in [BayerSize::Two, BayerSize::Four, BayerSize::Eight] {
            let n = size.side();
            let mut seen = HashSet::new();
            for y in 0..n {
                for x in 0..n {
                    seen.insert(size.index(x, y));
                }
            }
            let expected: HashSet<u32> = (0..n * n).collect();
            assert_eq!(seen, expected, "{size}");
        }
    }

    #[test]
    fn bayer_thresholds_wrap() {
        let size = BayerSize::Eight;
        assert_eq!(size.threshold(Vec2::new(3.5, 6.5)), size.threshold(Vec2::new(11.5, 14.5)));
        assert_eq!(BayerSize::Four.threshold(Vec2::new(0.5, 0.5)), 0.0);
        assert_eq!(BayerSize::Four.threshold(Vec2::new(1.5, 0.5)), 0.5);
    }

    #[test]
    fn parses_matrix_names() {
        assert_eq!("bayer4".parse::<BayerSize>(), Ok(BayerSize::Four));
        assert_eq!("8".parse::<BayerSize>(), Ok(BayerSize::Eight));
        assert!("bayer3".parse::<BayerSize>().is_err());
        assert_eq!("Circle".parse::<PixelShape>(), Ok(PixelShape::Circle));
    }

    #[test]
    fn two_level_posterize_is_binary() {
        for i in 0..=100 {
            let v = i as f32 / 100.0;
            let out = posterize(Vec3::new(v, 1.0 - v, v * 0.5), 2.0);
            for ch in out.to_array() {
                assert!(ch == 0.0 || ch == 1.0, "{ch}");
            }
        }
    }

    #[test]
    fn posterize_clamps_out_of_range_input() {
        let out = posterize(Vec3::new(-0.4, 1.7, 0.5), 4.0);
        assert!(out.min_element() >= 0.0 && out.max_element() <= 1.0);
    }

    #[test]
    fn zero_intensity_grain_is_identity() {
        let params = GrainParams {
            intensity: 0.0,
            ..GrainParams::default()
        };
        let c = Vec3::new(0.2, 0.4, 0.6);
        assert_eq!(grain(c, Vec2::new(10.5, 3.5), 1.3, &params), c);
    }

    #[test]
    fn static_grain_ignores_time() {
        let params = GrainParams {
            animated: false,
            ..GrainParams::default()
        };
        let c = Vec3::splat(0.5);
        let p = Vec2::new(17.5, 4.5);
        assert_eq!(grain(c, p, 0.0, &params), grain(c, p, 9.7, &params));
    }

    #[test]
    fn full_dither_quantizes_to_levels() {
        let params = DitherParams {
            matrix: BayerSize::Four,
            levels: 4.0,
            intensity: 1.0,
        };
        for y in 0..8 {
            for x in 0..8 {
                let pixel = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
                let out = dither(Vec3::new(0.37, 0.52, 0.81), pixel, &params);
                for ch in out.to_array() {
                    let scaled = ch * 3.0;
                    assert!((scaled - scaled.round()).abs() < 1e-5, "{ch}");
                }
            }
        }
    }

    #[test]
    fn zero_intensity_dither_is_identity() {
        let params = DitherParams {
            matrix: BayerSize::Two,
            levels: 4.0,
            intensity: 0.0,
        };
        let c = Vec3::new(0.1, 0.5, 0.9);
        assert_eq!(dither(c, Vec2::new(1.5, 0.5), &params), c);
    }

    #[test]
    fn halftone_white_stays_white() {
        for mode in [HalftoneMode::Mono, HalftoneMode::Cmyk] {
            let params = HalftoneParams {
                amount: 1.0,
                cell_size: 6.0,
                angle_deg: 45.0,
                mode,
            };
            for i in 0..12 {
                let p = Vec2::new(i as f32 + 0.5, (i * 3) as f32 + 0.5);
                let out = halftone(Vec3::ONE, p, &params);
                assert!(out.min_element() > 0.99, "{mode:?} {out:?}");
            }
        }
    }

    #[test]
    fn halftone_black_inks_cell_centres() {
        let params = HalftoneParams {
            amount: 1.0,
            cell_size: 8.0,
            angle_deg: 0.0,
            mode: HalftoneMode::Mono,
        };
        let out = halftone(Vec3::ZERO, Vec2::new(4.0, 4.0), &params);
        assert_eq!(out, Vec3::ZERO);
    }

    #[test]
    fn pixelate_snaps_to_cell_centres() {
        assert_eq!(pixelate_point(Vec2::new(13.2, 2.9), 8.0), Vec2::new(12.0, 4.0));
        assert_eq!(pixelate_point(Vec2::new(13.2, 2.9), 1.0), Vec2::new(13.2, 2.9));
        let circle = PixelateParams {
            cell_size: 10.0,
            shape: PixelShape::Circle,
        };
        assert_eq!(pixel_mask(Vec2::new(5.0, 5.0), &circle), 1.0);
        assert_eq!(pixel_mask(Vec2::new(0.2, 0.2), &circle), 0.0);
        let square = PixelateParams {
            shape: PixelShape::Square,
            ..circle
        };
        assert_eq!(pixel_mask(Vec2::new(0.2, 0.2), &square), 1.0);
    }

    #[test]
    fn neutral_color_adjust_is_identity() {
        let c = Vec3::new(0.3, 0.6, 0.2);
        assert_eq!(color_adjust(c, &ColorAdjustParams::default()), c);
        let grey = color_adjust(
            c,
            &ColorAdjustParams {
                saturation: 0.0,
                ..ColorAdjustParams::default()
            },
        );
        assert!((grey.x - grey.y).abs() < 1e-5 && (grey.y - grey.z).abs() < 1e-5);
    }

    #[test]
    fn build_rejects_bad_parameters() {
        let err = Pipeline::build(vec![Pass::Posterize(PosterizeParams { levels: 1.0 })]).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::InvalidParameter { pass: "posterize", field: "levels", .. }
        ));
        assert!(Pipeline::build(vec![Pass::Pixelate(PixelateParams {
            cell_size: 0.0,
            shape: PixelShape::Square,
        })])
        .is_err());
        assert!(Pipeline::build(vec![Pass::Grain(GrainParams {
            intensity: f32::NAN,
            ..GrainParams::default()
        })])
        .is_err());
    }

    #[test]
    fn empty_pipeline_only_clamps() {
        let pipeline = Pipeline::build(Vec::new()).unwrap();
        assert!(pipeline.is_empty());
        assert_eq!(pipeline.apply(Vec3::new(-0.2, 0.5, 1.4), Vec2::ZERO, 0.0), Vec3::new(0.0, 0.5, 1.0));
        assert_eq!(pipeline.sample_point(Vec2::new(3.3, 4.4)), Vec2::new(3.3, 4.4));
    }

    #[test]
    fn order_matters() {
        let a = Pass::Posterize(PosterizeParams { levels: 2.0 });
        let b = Pass::ColorAdjust(ColorAdjustParams {
            brightness: 0.5,
            ..ColorAdjustParams::default()
        });
        let first = Pipeline::build(vec![a, b]).unwrap();
        let second = Pipeline::build(vec![b, a]).unwrap();
        let c = Vec3::splat(0.8);
        // posterize(0.8) = 1 then halved; halving first gives 0.4 -> 0
        assert_eq!(first.apply(c, Vec2::ZERO, 0.0), Vec3::splat(0.5));
        assert_eq!(second.apply(c, Vec2::ZERO, 0.0), Vec3::ZERO);
    }
}
