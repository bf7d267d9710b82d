use std::path::Path;

use glam::{Vec2, Vec3};
use image::{ImageResult, Rgba, RgbaImage};

use crate::error::RenderError;

/// Anything with a pixel grid that can receive finished colors.
pub trait Surface {
    fn dimensions(&self) -> (u32, u32);
    /// Stores a color in [0, 1] at (x, y), top-left origin.
    fn put(&mut self, x: u32, y: u32, rgb: Vec3);
}

/// Per-fragment color function. `pixel` is the pixel centre, top-left origin.
pub trait Shader {
    fn shade(&self, pixel: Vec2) -> Vec3;
}

/// Quantizes a [0, 1] channel to a byte.
pub fn to_byte(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Shades every pixel of `surface`, clamping the result.
pub fn rasterize<Sh, S>(shader: &Sh, surface: &mut S) -> Result<(), RenderError>
where
    Sh: Shader + ?Sized,
    S: Surface + ?Sized,
{
    let (width, height) = surface.dimensions();
    if width == 0 || height == 0 {
        return Err(RenderError::EmptySurface { width, height });
    }
    for y in 0..height {
        for x in 0..width {
            let pixel = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
            let c = shader.shade(pixel);
            // NaN from a degenerate parameter would otherwise reach the byte cast.
            let c = if c.is_nan() { Vec3::ZERO } else { c };
            surface.put(x, y, c.clamp(Vec3::ZERO, Vec3::ONE));
        }
    }
    Ok(())
}

/// Off-screen RGBA8 canvas backed by `image::RgbaImage`.
#[derive(Debug, Clone)]
pub struct ImageSurface {
    image: RgbaImage,
}

impl ImageSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbaImage::new(width, height),
        }
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }

    /// Re-allocates when the size changes; contents are not preserved.
    pub fn resize(&mut self, width: u32, height: u32) {
        if self.image.dimensions() != (width, height) {
            self.image = RgbaImage::new(width, height);
        }
    }

    pub fn save(&self, path: &Path) -> ImageResult<()> {
        self.image.save(path)
    }
}

impl Surface for ImageSurface {
    fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    fn put(&mut self, x: u32, y: u32, rgb: Vec3) {
        self.image.put_pixel(
            x,
            y,
            Rgba([to_byte(rgb.x), to_byte(rgb.y), to_byte(rgb.z), 255]),
        );
    }
}
