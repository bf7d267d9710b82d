use std::collections::BTreeSet;

use explorations::color::Oklch;
use explorations::fbm::fbm;
use explorations::passes::{
    posterize, BayerSize, ColorAdjustParams, DitherParams, GrainParams, GrainPattern,
    HalftoneMode, HalftoneParams, PixelShape, PixelateParams, PosterizeParams,
};
use explorations::{Pass, Pipeline, PipelineError};
use glam::{Vec2, Vec3};

fn sample_pixels() -> impl Iterator<Item = Vec2> {
    (0..24).flat_map(|y| (0..24).map(move |x| Vec2::new(x as f32 * 3.7 + 0.5, y as f32 * 5.3 + 0.5)))
}

#[test]
fn black_with_grain_off_stays_black() {
    let black = Oklch::new(0.0, 0.0, 0.0).to_linear_rgb();
    assert_eq!(black, Vec3::ZERO);
    let pipeline = Pipeline::build(vec![Pass::Grain(GrainParams {
        intensity: 0.0,
        ..Default::default()
    })])
    .unwrap();
    for time in [0.0, 0.016, 1.0, 37.25, 1e4] {
        for pixel in sample_pixels() {
            assert_eq!(pipeline.apply(black, pixel, time), Vec3::ZERO);
        }
    }
}

#[test]
fn achromatic_axis_endpoints() {
    assert_eq!(Oklch::new(0.0, 0.0, 123.0).to_linear_rgb(), Vec3::ZERO);
    let white = Oklch::new(1.0, 0.0, 0.0).to_linear_rgb();
    assert!((white - Vec3::ONE).abs().max_element() < 1e-4);
}

#[test]
fn oklch_channels_stay_in_unit_range() {
    for li in 0..=10 {
        for ci in 0..=8 {
            for hi in 0..36 {
                let c = Oklch::new(li as f32 / 10.0, ci as f32 * 0.05, hi as f32 * 10.0).to_linear_rgb();
                assert!(c.min_element() >= 0.0 && c.max_element() <= 1.0, "{c:?}");
            }
        }
    }
}

#[test]
fn bayer_matrices_are_permutations() {
    for (matrix, n) in [(BayerSize::Two, 2u32), (BayerSize::Four, 4), (BayerSize::Eight, 8)] {
        let seen: BTreeSet<u32> = (0..n)
            .flat_map(|y| (0..n).map(move |x| matrix.index(x, y)))
            .collect();
        assert_eq!(seen, (0..n * n).collect::<BTreeSet<_>>(), "{matrix}");
    }
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
fn fine_posterize_is_invisible() {
    for i in 0..=255 {
        let v = i as f32 / 255.0;
        let c = Vec3::splat(v);
        assert!((posterize(c, 256.0) - c).abs().max_element() <= 0.5 / 255.0 + 1e-6);
    }
}

#[test]
fn fbm_is_bounded_and_zero_octaves_vanish() {
    for p in sample_pixels() {
        let p = p * 0.05;
        assert_eq!(fbm(p, 0.0), 0.0);
        for octaves in 1..=6 {
            // amplitudes 0.5, 0.25, ... sum to under twice the first
            assert!(fbm(p, octaves as f32).abs() <= 2.0 * 0.5 * 1.05);
        }
    }
}

#[test]
fn build_rejects_bad_descriptors() {
    let err = Pipeline::build(vec![
        Pass::ColorAdjust(ColorAdjustParams::default()),
        Pass::Posterize(PosterizeParams { levels: 1.0 }),
    ])
    .unwrap_err();
    assert!(matches!(
        err,
        PipelineError::InvalidParameter { pass: "posterize", field: "levels", .. }
    ));

    assert!(Pipeline::build(vec![Pass::Pixelate(PixelateParams {
        cell_size: 0.0,
        shape: PixelShape::Square,
    })])
    .is_err());

    assert!(Pipeline::build(vec![Pass::Halftone(HalftoneParams {
        amount: f32::NAN,
        cell_size: 6.0,
        angle_deg: 45.0,
        mode: HalftoneMode::Mono,
    })])
    .is_err());
}

#[test]
fn pass_order_matters() {
    let adjust = Pass::ColorAdjust(ColorAdjustParams {
        brightness: 0.5,
        ..Default::default()
    });
    let poster = Pass::Posterize(PosterizeParams { levels: 2.0 });
    let a = Pipeline::build(vec![adjust, poster]).unwrap();
    let b = Pipeline::build(vec![poster, adjust]).unwrap();
    let c = Vec3::splat(0.8);
    let p = Vec2::new(0.5, 0.5);
    // 0.8 * 0.5 = 0.4 -> 0, versus 0.8 -> 1 then halved
    assert_eq!(a.apply(c, p, 0.0), Vec3::ZERO);
    assert_eq!(b.apply(c, p, 0.0), Vec3::splat(0.5));
}

#[test]
fn pipeline_output_is_clamped_and_repeatable() {
    let pipeline = Pipeline::build(vec![
        Pass::ColorAdjust(ColorAdjustParams {
            brightness: 1.4,
            saturation: 1.6,
            contrast: 1.8,
        }),
        Pass::Dither(DitherParams {
            matrix: BayerSize::Eight,
            levels: 4.0,
            intensity: 0.7,
        }),
        Pass::Grain(GrainParams {
            intensity: 0.4,
            size: 1.0,
            animated: true,
            rate: 100.0,
            pattern: GrainPattern::Hash,
        }),
    ])
    .unwrap();
    for pixel in sample_pixels() {
        let c = Vec3::new(0.9, 0.2, 0.6);
        let out = pipeline.apply(c, pixel, 2.5);
        assert!(out.min_element() >= 0.0 && out.max_element() <= 1.0);
        assert_eq!(out, pipeline.apply(c, pixel, 2.5));
    }
}
