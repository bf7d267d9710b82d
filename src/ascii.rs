//! Character-cell rendition of a finished frame for terminals.

use std::fmt::Write;

use image::RgbaImage;

/// Darkest to brightest.
pub const RAMP: &str = " .:-=+*#%@";

/// Glyph for a 0..=1 luminance.
pub fn glyph(lum: f32) -> char {
    let ramp = RAMP.as_bytes();
    let idx = (lum.clamp(0.0, 1.0) * (ramp.len() - 1) as f32).floor() as usize;
    ramp[idx.min(ramp.len() - 1)] as char
}

/// One glyph per `cell`-pixel square, sampled at the cell centre. With
/// `colored`, each glyph carries a truecolor escape of its sampled pixel.
pub fn render_ascii(image: &RgbaImage, cell: u32, colored: bool) -> String {
    let cell = cell.max(1);
    let (width, height) = image.dimensions();
    let cols = width / cell;
    let rows = height / cell;
    let mut out = String::with_capacity((cols as usize + 1) * rows as usize);
    let mut last: Option<[u8; 3]> = None;

    for row in 0..rows {
        for col in 0..cols {
            let px = col * cell + cell / 2;
            let py = row * cell + cell / 2;
            let [r, g, b, _] = image.get_pixel(px, py).0;
            let lum = (0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32) / 255.0;
            if colored && last != Some([r, g, b]) {
                // infallible for String
                let _ = write!(out, "\x1b[38;2;{r};{g};{b}m");
                last = Some([r, g, b]);
            }
            out.push(glyph(lum));
        }
        if colored {
            out.push_str("\x1b[0m");
            last = None;
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn ramp_endpoints() {
        assert_eq!(glyph(0.0), ' ');
        assert_eq!(glyph(1.0), '@');
        assert_eq!(glyph(0.5), '=');
    }

    #[test]
    fn grid_is_floor_of_cells() {
        let img = RgbaImage::from_pixel(10, 7, Rgba([255, 255, 255, 255]));
        let text = render_ascii(&img, 3, false);
        assert_eq!(text, "@@@\n@@@\n");
    }

    #[test]
    fn colored_output_resets_each_row() {
        let img = RgbaImage::from_pixel(4, 4, Rgba([10, 20, 30, 255]));
        let text = render_ascii(&img, 2, true);
        let first = text.lines().next().unwrap();
        assert!(first.starts_with("\x1b[38;2;10;20;30m"));
        assert!(first.ends_with("\x1b[0m"));
        // the escape is emitted once per row
        assert_eq!(first.matches("\x1b[38;2;").count(), 1);
    }
}
