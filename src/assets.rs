//! Source images for the image-treatment exploration.

use std::path::{Path, PathBuf};

use glam::{Vec2, Vec3};
use image::RgbImage;

use crate::error::AssetError;

/// Extensions tried, in order, for a bare image name.
pub const IMAGE_EXTENSIONS: [&str; 2] = ["jpg", "png"];

#[derive(Debug, Clone)]
pub struct SourceImage {
    name: String,
    pixels: RgbImage,
}

impl SourceImage {
    pub fn new(name: impl Into<String>, pixels: RgbImage) -> Self {
        Self {
            name: name.into(),
            pixels,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    fn texel(&self, x: i64, y: i64) -> Vec3 {
        let (w, h) = self.pixels.dimensions();
        let x = x.clamp(0, w as i64 - 1) as u32;
        let y = y.clamp(0, h as i64 - 1) as u32;
        let p = self.pixels.get_pixel(x, y).0;
        Vec3::new(p[0] as f32, p[1] as f32, p[2] as f32) / 255.0
    }

    /// Bilinear, clamp-to-edge lookup; `uv` is in [0, 1] with v pointing down.
    pub fn sample(&self, uv: Vec2) -> Vec3 {
        let (w, h) = self.pixels.dimensions();
        if w == 0 || h == 0 {
            return Vec3::ZERO;
        }
        let size = Vec2::new(w as f32, h as f32);
        // past the edge every lookup clamps anyway
        let p = (uv * size - Vec2::splat(0.5)).clamp(Vec2::splat(-1.0), size);
        let base = p.floor();
        let f = p - base;
        let (x0, y0) = (base.x as i64, base.y as i64);

        let top = self.texel(x0, y0).lerp(self.texel(x0 + 1, y0), f.x);
        let bottom = self.texel(x0, y0 + 1).lerp(self.texel(x0 + 1, y0 + 1), f.x);
        top.lerp(bottom, f.y)
    }
}

/// Loaded resources an exploration may need while rendering.
#[derive(Debug, Clone, Default)]
pub struct Assets {
    pub image: Option<SourceImage>,
}

impl Assets {
    pub fn with_image(image: SourceImage) -> Self {
        Self { image: Some(image) }
    }
}

/// Resolves `name` under `dir`: an explicit extension is used as-is,
/// otherwise each of `IMAGE_EXTENSIONS` is tried in order.
pub fn candidate_paths(dir: &Path, name: &str) -> Vec<PathBuf> {
    let direct = dir.join(name);
    if Path::new(name).extension().is_some() {
        return vec![direct];
    }
    IMAGE_EXTENSIONS
        .iter()
        .map(|ext| dir.join(format!("{name}.{ext}")))
        .collect()
}

/// Loads the first candidate that decodes. A file that exists but fails to
/// decode falls through to the next format; its error is returned only when
/// nothing else loads.
pub fn load_image(dir: &Path, name: &str) -> Result<SourceImage, AssetError> {
    let tried = candidate_paths(dir, name);
    let mut decode_error = None;
    for (i, path) in tried.iter().enumerate() {
        if !path.is_file() {
            continue;
        }
        if i > 0 {
            log::warn!("`{name}`: falling back to {path:?}");
        }
        match image::open(path) {
            Ok(decoded) => {
                log::info!("loaded image `{name}` from {path:?}");
                return Ok(SourceImage::new(name, decoded.to_rgb8()));
            }
            Err(source) => {
                log::warn!("could not decode {path:?}: {source}");
                if decode_error.is_none() {
                    decode_error = Some(AssetError::Decode {
                        path: path.clone(),
                        source,
                    });
                }
            }
        }
    }
    Err(decode_error.unwrap_or_else(|| AssetError::NotFound {
        name: name.to_string(),
        tried,
    }))
}

/// Largest size with the image's aspect ratio that fits in `max_w` x `max_h`.
pub fn fit_within(image: (u32, u32), max_w: u32, max_h: u32) -> (u32, u32) {
    let (iw, ih) = image;
    if iw == 0 || ih == 0 {
        return (max_w, max_h);
    }
    let scale = (max_w as f64 / iw as f64).min(max_h as f64 / ih as f64);
    let w = ((iw as f64 * scale).round() as u32).max(1);
    let h = ((ih as f64 * scale).round() as u32).max(1);
    (w, h)
}
