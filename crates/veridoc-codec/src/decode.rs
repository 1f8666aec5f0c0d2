//! Multi-strategy credential decoding.
//!
//! Strategy order, most reliable first:
//! 1. Embedded raster objects, newest first. The stamp is usually the
//!    last object added, and the stored bitmap has no rendering
//!    artifacts.
//! 2. Rasterize the whole page at high DPI and scan the bitmap. If the
//!    raster would blow past the pixel cap, drop to the fallback DPI
//!    before rendering.
//!
//! Within any single image, `rqrr` runs first and `bardecoder` second;
//! the two backends fail on different kinds of damage.

use image::GrayImage;
use tracing::{debug, warn};

use crate::error::CodecError;
use crate::page::Page;
use crate::payload::CredentialPayload;

/// Knobs for the rasterization fallback.
#[derive(Debug, Clone, Copy)]
pub struct DecodeConfig {
    /// Preferred rasterization DPI; 300 is print quality.
    pub render_dpi: u32,
    /// DPI used when the preferred raster would exceed the pixel cap.
    pub fallback_dpi: u32,
    /// Upper bound on raster size, in pixels.
    pub max_pixels: u64,
}

impl Default for DecodeConfig {
    fn default() -> Self {
        Self {
            render_dpi: 300,
            fallback_dpi: 150,
            max_pixels: 20_000_000,
        }
    }
}

impl DecodeConfig {
    /// The DPI the rasterization strategy will actually use for a page.
    pub fn effective_dpi(&self, page: &Page) -> u32 {
        if page.raster_pixels(self.render_dpi) > self.max_pixels {
            warn!(
                render_dpi = self.render_dpi,
                fallback_dpi = self.fallback_dpi,
                "raster would exceed pixel cap, dropping to fallback DPI"
            );
            self.fallback_dpi
        } else {
            self.render_dpi
        }
    }
}

/// Extract the raw QR content from a page.
pub fn decode_page(page: &Page, config: &DecodeConfig) -> Result<String, CodecError> {
    let embedded_count = page.embedded().len();
    for (index, object) in page.embedded().enumerate().rev() {
        if let Some(content) = decode_image(object) {
            debug!(index, "credential decoded from embedded object");
            return Ok(content);
        }
    }

    if embedded_count > 0 {
        warn!("no embedded object decoded, falling back to page rasterization");
    }

    let raster = page.rasterize(config.effective_dpi(page));
    if let Some(content) = decode_image(&raster) {
        return Ok(content);
    }

    Err(CodecError::DecodeNotFound)
}

/// Extract and parse the credential from a page.
pub fn decode_payload(page: &Page, config: &DecodeConfig) -> Result<CredentialPayload, CodecError> {
    let content = decode_page(page, config)?;
    CredentialPayload::parse_str(&content)
}

/// Run both decoder backends against one bitmap.
fn decode_image(image: &GrayImage) -> Option<String> {
    if let Some(content) = decode_rqrr(image) {
        return Some(content);
    }
    decode_bardecoder(image)
}

fn decode_rqrr(image: &GrayImage) -> Option<String> {
    let mut prepared = rqrr::PreparedImage::prepare(image.clone());
    for grid in prepared.detect_grids() {
        match grid.decode() {
            Ok((_meta, content)) => return Some(content),
            Err(e) => debug!(error = %e, "rqrr grid decode failed"),
        }
    }
    None
}

thread_local! {
    // The default decoder pipeline is built from non-Send trait objects,
    // so the once-init lives per thread rather than in a process global.
    static BARDECODER: bardecoder::Decoder<image24::DynamicImage, image24::GrayImage, String> =
        bardecoder::default_decoder();
}

fn decode_bardecoder(image: &GrayImage) -> Option<String> {
    // bardecoder builds against the older image line, so the buffer is
    // rebuilt with that crate's types at the boundary.
    let buffer =
        image24::GrayImage::from_raw(image.width(), image.height(), image.as_raw().clone())?;
    let dynamic = image24::DynamicImage::ImageLuma8(buffer);
    BARDECODER.with(|decoder| {
        decoder
            .decode(&dynamic)
            .into_iter()
            .find_map(|result| result.ok())
    })
}
