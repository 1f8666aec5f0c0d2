//! The page model.
//!
//! A page is background content plus the ordered list of stamps placed
//! on it. Stamps are kept as placement records over the full-resolution
//! source bitmap and composited at rasterization time, so a render at
//! any DPI carries the stamp at that DPI instead of an upscaled copy of
//! a low-resolution flatten.

use image::imageops::{self, FilterType};
use image::GrayImage;

use crate::qr::StampConfig;

/// Base rendering resolution; one point is one pixel.
pub const BASE_DPI: u32 = 72;

/// One stamp: the source bitmap and where it sits, in points.
#[derive(Debug, Clone)]
struct Stamp {
    bitmap: GrayImage,
    x_pt: f32,
    y_pt: f32,
    size_pt: f32,
}

#[derive(Debug, Clone)]
pub struct Page {
    width_pt: f32,
    height_pt: f32,
    base: GrayImage,
    base_dpi: u32,
    stamps: Vec<Stamp>,
}

impl Page {
    /// A blank white page. 612x792pt is US Letter.
    pub fn blank(width_pt: f32, height_pt: f32) -> Self {
        let base = GrayImage::from_pixel(
            width_pt.max(1.0) as u32,
            height_pt.max(1.0) as u32,
            image::Luma([255u8]),
        );
        Self {
            width_pt,
            height_pt,
            base,
            base_dpi: BASE_DPI,
            stamps: Vec::new(),
        }
    }

    /// A page whose content is an existing raster at the given DPI,
    /// e.g. a flattened scan. The raster carries no stamp records.
    pub fn from_raster(raster: GrayImage, dpi: u32) -> Self {
        let dpi = dpi.max(1);
        let to_pt = BASE_DPI as f32 / dpi as f32;
        Self {
            width_pt: raster.width() as f32 * to_pt,
            height_pt: raster.height() as f32 * to_pt,
            base: raster,
            base_dpi: dpi,
            stamps: Vec::new(),
        }
    }

    pub fn width_pt(&self) -> f32 {
        self.width_pt
    }

    pub fn height_pt(&self) -> f32 {
        self.height_pt
    }

    /// Source bitmaps of the stamps, oldest first.
    pub fn embedded(&self) -> impl DoubleEndedIterator<Item = &GrayImage> + ExactSizeIterator {
        self.stamps.iter().map(|stamp| &stamp.bitmap)
    }

    /// Place a QR bitmap at the configured position.
    ///
    /// The prior page content is untouched; the stamp is recorded with
    /// its full-resolution source bitmap and drawn over the base at
    /// render time.
    pub fn stamp(&mut self, qr: &GrayImage, config: &StampConfig) {
        let (x_pt, y_pt) = config.placement(self.width_pt, self.height_pt);
        self.stamps.push(Stamp {
            bitmap: qr.clone(),
            x_pt,
            y_pt,
            size_pt: config.size_pt.max(1.0),
        });
    }

    /// Render the page at the requested DPI, compositing every stamp
    /// from its source bitmap.
    pub fn rasterize(&self, dpi: u32) -> GrayImage {
        let mut canvas = if dpi == self.base_dpi {
            self.base.clone()
        } else {
            let scale = dpi as f32 / self.base_dpi as f32;
            let width = ((self.base.width() as f32 * scale) as u32).max(1);
            let height = ((self.base.height() as f32 * scale) as u32).max(1);
            imageops::resize(&self.base, width, height, FilterType::Triangle)
        };

        let pt_scale = dpi as f32 / BASE_DPI as f32;
        for stamp in &self.stamps {
            let size_px = ((stamp.size_pt * pt_scale) as u32).max(1);
            // Nearest keeps the module edges crisp.
            let scaled = imageops::resize(&stamp.bitmap, size_px, size_px, FilterType::Nearest);
            imageops::overlay(
                &mut canvas,
                &scaled,
                (stamp.x_pt * pt_scale).max(0.0) as i64,
                (stamp.y_pt * pt_scale).max(0.0) as i64,
            );
        }
        canvas
    }

    /// Pixel count of a rasterization at the given DPI, without rendering.
    pub fn raster_pixels(&self, dpi: u32) -> u64 {
        let scale = dpi as f64 / BASE_DPI as f64;
        let width = (self.width_pt as f64 * scale) as u64;
        let height = (self.height_pt as f64 * scale) as u64;
        width.max(1) * height.max(1)
    }
}
