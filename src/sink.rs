//! Output surfaces the renderer draws into.
//!
//! The renderer never touches a display directly. It hands finished pixels
//! to a [`PixelSink`], which may be an in-memory image, a PNG file on disk,
//! or a live window framebuffer.

use std::path::{Path, PathBuf};

use image::{Rgba, RgbaImage};
use serde::{Deserialize, Serialize};

use crate::error::{RenderError, Result};

/// Rectangle in pixel space
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// Rectangle covering a whole `width` x `height` surface.
    pub fn full(width: u32, height: u32) -> Self {
        Self::new(0, 0, width, height)
    }

    pub fn area(&self) -> u32 {
        self.width * self.height
    }

    pub fn contains(&self, px: u32, py: u32) -> bool {
        px >= self.x && px < self.x + self.width && py >= self.y && py < self.y + self.height
    }
}

/// A surface that accepts RGBA pixels.
pub trait PixelSink {
    /// Fails when the surface cannot be drawn to. Checked once when a
    /// renderer is created.
    fn ensure_ready(&self) -> Result<()> {
        Ok(())
    }

    /// Prepare for a frame of `width` x `height` physical pixels.
    fn begin_frame(&mut self, width: u32, height: u32) -> Result<()>;

    fn set_pixel(&mut self, x: u32, y: u32, rgba: [u8; 4]);

    /// Copy tightly packed RGBA bytes (`rect.area() * 4` of them) into `rect`.
    fn write_buffer(&mut self, rect: PixelRect, pixels: &[u8]) {
        for (i, px) in pixels.chunks_exact(4).take(rect.area() as usize).enumerate() {
            let i = i as u32;
            let x = rect.x + i % rect.width;
            let y = rect.y + i / rect.width;
            self.set_pixel(x, y, [px[0], px[1], px[2], px[3]]);
        }
    }

    /// Called once a frame is complete.
    fn present(&mut self) -> Result<()> {
        Ok(())
    }
}

/// In-memory surface.
impl PixelSink for RgbaImage {
    fn begin_frame(&mut self, width: u32, height: u32) -> Result<()> {
        if self.dimensions() != (width, height) {
            *self = RgbaImage::new(width, height);
        }
        Ok(())
    }

    fn set_pixel(&mut self, x: u32, y: u32, rgba: [u8; 4]) {
        if x < self.width() && y < self.height() {
            self.put_pixel(x, y, Rgba(rgba));
        }
    }

    fn write_buffer(&mut self, rect: PixelRect, pixels: &[u8]) {
        let full = PixelRect::full(self.width(), self.height());
        if rect == full && pixels.len() == self.as_raw().len() {
            self.copy_from_slice(pixels);
            return;
        }
        for (i, px) in pixels.chunks_exact(4).take(rect.area() as usize).enumerate() {
            let i = i as u32;
            PixelSink::set_pixel(self, rect.x + i % rect.width, rect.y + i / rect.width, [px[0], px[1], px[2], px[3]]);
        }
    }
}

/// Surface that encodes each presented frame to a PNG file.
#[derive(Debug)]
pub struct PngFileSink {
    path: PathBuf,
    frame: RgbaImage,
}

impl PngFileSink {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            frame: RgbaImage::new(0, 0),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn frame(&self) -> &RgbaImage {
        &self.frame
    }
}

impl PixelSink for PngFileSink {
    fn ensure_ready(&self) -> Result<()> {
        let parent = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => return Ok(()),
        };
        if parent.is_dir() {
            Ok(())
        } else {
            Err(RenderError::SurfaceUnavailable(format!(
                "output directory {} does not exist",
                parent.display()
            )))
        }
    }

    fn begin_frame(&mut self, width: u32, height: u32) -> Result<()> {
        self.frame.begin_frame(width, height)
    }

    fn set_pixel(&mut self, x: u32, y: u32, rgba: [u8; 4]) {
        PixelSink::set_pixel(&mut self.frame, x, y, rgba);
    }

    fn write_buffer(&mut self, rect: PixelRect, pixels: &[u8]) {
        self.frame.write_buffer(rect, pixels);
    }

    fn present(&mut self) -> Result<()> {
        self.frame.save(&self.path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pixel_rect_contains() {
        let rect = PixelRect::new(10, 20, 100, 50);
        assert!(rect.contains(10, 20));
        assert!(rect.contains(109, 69));
        assert!(!rect.contains(110, 70));
        assert!(!rect.contains(9, 20));
        assert_eq!(rect.area(), 5000);
    }

    #[test]
    fn test_image_sink_full_write() {
        let mut sink = RgbaImage::new(0, 0);
        sink.begin_frame(2, 2).unwrap();
        let pixels: Vec<u8> = (0..16).collect();
        sink.write_buffer(PixelRect::full(2, 2), &pixels);
        assert_eq!(sink.get_pixel(1, 1).0, [12, 13, 14, 15]);
    }

    #[test]
    fn test_image_sink_partial_write() {
        let mut sink = RgbaImage::new(4, 4);
        sink.write_buffer(PixelRect::new(2, 1, 2, 1), &[1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(sink.get_pixel(2, 1).0, [1, 2, 3, 4]);
        assert_eq!(sink.get_pixel(3, 1).0, [5, 6, 7, 8]);
        assert_eq!(sink.get_pixel(0, 0).0, [0, 0, 0, 0]);
    }

    #[test]
    fn test_png_sink_rejects_missing_directory() {
        let sink = PngFileSink::new("/definitely/not/a/real/dir/map.png");
        assert!(matches!(sink.ensure_ready(), Err(RenderError::SurfaceUnavailable(_))));
        assert!(PngFileSink::new("map.png").ensure_ready().is_ok());
    }

    #[test]
    fn test_png_sink_writes_file() {
        let path = std::env::temp_dir().join(format!("relief_map_sink_{}.png", std::process::id()));
        let mut sink = PngFileSink::new(&path);
        sink.ensure_ready().unwrap();
        sink.begin_frame(3, 2).unwrap();
        sink.set_pixel(1, 1, [255, 0, 0, 255]);
        sink.present().unwrap();
        assert_eq!(sink.path(), path.as_path());
        assert_eq!(sink.frame().get_pixel(1, 1).0, [255, 0, 0, 255]);

        let loaded = image::open(&path).unwrap().to_rgba8();
        assert_eq!(loaded.dimensions(), (3, 2));
        assert_eq!(loaded.get_pixel(1, 1).0, [255, 0, 0, 255]);
        let _ = std::fs::remove_file(&path);
    }
}
