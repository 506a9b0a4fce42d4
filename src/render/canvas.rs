use std::fs;
use std::path::{Path, PathBuf};

use image::{ImageFormat, Rgb, RgbImage};

use super::RenderError;
use super::font::{GLYPH_ADVANCE, GLYPH_WIDTH, glyph, text_width};

pub(super) const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
pub(super) const BLACK: Rgb<u8> = Rgb([0, 0, 0]);
pub(super) const GRID: Rgb<u8> = Rgb([225, 225, 225]);
/// Default line color for single-series plots.
pub(super) const SERIES_BLUE: Rgb<u8> = Rgb([31, 119, 180]);

/// RGB drawing surface with clipped primitives.
pub(super) struct Canvas {
    image: RgbImage,
}

impl Canvas {
    pub(super) fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbImage::from_pixel(width.max(1), height.max(1), WHITE),
        }
    }

    pub(super) fn width(&self) -> u32 {
        self.image.width()
    }

    pub(super) fn put(&mut self, x: i64, y: i64, color: Rgb<u8>) {
        if x < 0 || y < 0 {
            return;
        }
        let (x, y) = (x as u32, y as u32);
        if x < self.image.width() && y < self.image.height() {
            self.image.put_pixel(x, y, color);
        }
    }

    pub(super) fn fill_rect(&mut self, x: i64, y: i64, width: u32, height: u32, color: Rgb<u8>) {
        for dy in 0..height as i64 {
            for dx in 0..width as i64 {
                self.put(x + dx, y + dy, color);
            }
        }
    }

    pub(super) fn stroke_rect(&mut self, x: i64, y: i64, width: u32, height: u32, color: Rgb<u8>) {
        if width == 0 || height == 0 {
            return;
        }
        let right = x + width as i64 - 1;
        let bottom = y + height as i64 - 1;
        self.hline(x, right, y, color);
        self.hline(x, right, bottom, color);
        self.vline(x, y, bottom, color);
        self.vline(right, y, bottom, color);
    }

    pub(super) fn hline(&mut self, x0: i64, x1: i64, y: i64, color: Rgb<u8>) {
        let (start, end) = (x0.min(x1), x0.max(x1));
        for x in start..=end {
            self.put(x, y, color);
        }
    }

    pub(super) fn vline(&mut self, x: i64, y0: i64, y1: i64, color: Rgb<u8>) {
        let (start, end) = (y0.min(y1), y0.max(y1));
        for y in start..=end {
            self.put(x, y, color);
        }
    }

    /// Bresenham line between two points, inclusive.
    pub(super) fn line(&mut self, from: (i64, i64), to: (i64, i64), color: Rgb<u8>) {
        let (mut x, mut y) = from;
        let dx = (to.0 - x).abs();
        let dy = -(to.1 - y).abs();
        let sx = if x < to.0 { 1 } else { -1 };
        let sy = if y < to.1 { 1 } else { -1 };
        let mut err = dx + dy;
        loop {
            self.put(x, y, color);
            if x == to.0 && y == to.1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x += sx;
            }
            if e2 <= dx {
                err += dx;
                y += sy;
            }
        }
    }

    /// Draw `text` with its top-left corner at `(x, y)`.
    pub(super) fn text(&mut self, x: i64, y: i64, text: &str, scale: u32, color: Rgb<u8>) {
        let scale = scale.max(1);
        let mut pen_x = x;
        for ch in text.chars() {
            let rows = glyph(ch);
            for (row, bits) in rows.iter().enumerate() {
                for col in 0..GLYPH_WIDTH {
                    if bits & (1 << (GLYPH_WIDTH - 1 - col)) != 0 {
                        self.fill_rect(
                            pen_x + (col * scale) as i64,
                            y + (row as u32 * scale) as i64,
                            scale,
                            scale,
                            color,
                        );
                    }
                }
            }
            pen_x += (GLYPH_ADVANCE * scale) as i64;
        }
    }

    /// Draw `text` rotated a quarter turn counter-clockwise, reading bottom
    /// to top, with its bounding box's top-left corner at `(x, y)`.
    pub(super) fn text_vertical(&mut self, x: i64, y: i64, text: &str, scale: u32, color: Rgb<u8>) {
        let scale = scale.max(1);
        let length = text_width(text, scale) as i64;
        let mut pen_y = y + length;
        for ch in text.chars() {
            let rows = glyph(ch);
            for (row, bits) in rows.iter().enumerate() {
                for col in 0..GLYPH_WIDTH {
                    if bits & (1 << (GLYPH_WIDTH - 1 - col)) != 0 {
                        self.fill_rect(
                            x + (row as u32 * scale) as i64,
                            pen_y - ((col + 1) * scale) as i64,
                            scale,
                            scale,
                            color,
                        );
                    }
                }
            }
            pen_y -= (GLYPH_ADVANCE * scale) as i64;
        }
    }

    /// Encode as PNG next to `path` and move it into place once complete.
    ///
    /// On failure the temporary file is removed and `path` is untouched.
    pub(super) fn save_png(&self, path: &Path) -> Result<PathBuf, RenderError> {
        let tmp = temp_sibling(path);
        if let Err(source) = self.image.save_with_format(&tmp, ImageFormat::Png) {
            let _ = fs::remove_file(&tmp);
            return Err(RenderError::Encode {
                path: path.to_path_buf(),
                source,
            });
        }
        if let Err(source) = fs::rename(&tmp, path) {
            let _ = fs::remove_file(&tmp);
            return Err(RenderError::Io {
                path: path.to_path_buf(),
                source,
            });
        }
        Ok(path.to_path_buf())
    }

    #[cfg(test)]
    pub(super) fn pixel(&self, x: u32, y: u32) -> Rgb<u8> {
        *self.image.get_pixel(x, y)
    }
}

fn temp_sibling(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "plot".to_string());
    path.with_file_name(format!(".{name}.{}.tmp", std::process::id()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn drawing_outside_the_canvas_is_clipped() {
        let mut canvas = Canvas::new(10, 10);
        canvas.line((-5, -5), (20, 20), BLACK);
        canvas.fill_rect(8, 8, 10, 10, BLACK);
        assert_eq!(canvas.pixel(0, 0), BLACK);
        assert_eq!(canvas.pixel(9, 9), BLACK);
        assert_eq!(canvas.pixel(9, 0), WHITE);
    }

    #[test]
    fn text_sets_glyph_pixels() {
        let mut canvas = Canvas::new(20, 10);
        canvas.text(0, 0, "-", 1, BLACK);
        // The dash is the fourth row of the glyph.
        assert_eq!(canvas.pixel(0, 3), BLACK);
        assert_eq!(canvas.pixel(4, 3), BLACK);
        assert_eq!(canvas.pixel(0, 2), WHITE);
    }

    #[test]
    fn vertical_text_runs_upward() {
        let mut canvas = Canvas::new(10, 20);
        canvas.text_vertical(0, 0, "-", 1, BLACK);
        // Rotated dash becomes a vertical stroke in column 3.
        assert_eq!(canvas.pixel(3, 0), BLACK);
        assert_eq!(canvas.pixel(3, 4), BLACK);
        assert_eq!(canvas.pixel(2, 2), WHITE);
    }

    #[test]
    fn save_leaves_only_the_final_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("plot.png");
        let saved = Canvas::new(4, 3).save_png(&path).unwrap();
        assert_eq!(saved, path);
        let entries: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
        let decoded = image::open(&path).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (4, 3));
    }

    #[test]
    fn save_into_missing_directory_fails_without_output() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing").join("plot.png");
        let err = Canvas::new(4, 4).save_png(&path).unwrap_err();
        assert!(matches!(err, RenderError::Encode { .. }));
        assert!(!path.exists());
    }
}
