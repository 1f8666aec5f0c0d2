//! QR rendering and stamp placement.

use image::{GrayImage, Luma};
use qrcode::{EcLevel, QrCode};
use serde::{Deserialize, Serialize};

use crate::error::CodecError;

/// Pixels per QR module in the rendered bitmap.
const MODULE_PX: u32 = 10;

/// Where on the page the stamp lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StampPosition {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
    Center,
}

/// Stamp geometry in PDF points (72 points per inch).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StampConfig {
    /// Stamp edge length in points.
    pub size_pt: f32,
    /// Distance from the page edge in points.
    pub margin_pt: f32,
    pub position: StampPosition,
}

impl Default for StampConfig {
    fn default() -> Self {
        Self {
            size_pt: 100.0,
            // 36pt is half an inch.
            margin_pt: 36.0,
            position: StampPosition::TopRight,
        }
    }
}

impl StampConfig {
    /// Top-left corner of the stamp for a page of the given size.
    pub fn placement(&self, page_width_pt: f32, page_height_pt: f32) -> (f32, f32) {
        let (size, margin) = (self.size_pt, self.margin_pt);
        match self.position {
            StampPosition::TopLeft => (margin, margin),
            StampPosition::TopRight => (page_width_pt - margin - size, margin),
            StampPosition::BottomLeft => (margin, page_height_pt - margin - size),
            StampPosition::BottomRight => (
                page_width_pt - margin - size,
                page_height_pt - margin - size,
            ),
            StampPosition::Center => (
                (page_width_pt - size) / 2.0,
                (page_height_pt - size) / 2.0,
            ),
        }
    }
}

/// Render a wire payload as a QR bitmap.
///
/// Error-correction level H survives roughly 30% symbol damage, which is
/// the margin a printed document needs once it has been folded, smudged,
/// or scanned through a phone camera. The renderer adds the standard
/// quiet zone.
pub fn render_qr(data: &str) -> Result<GrayImage, CodecError> {
    let code = QrCode::with_error_correction_level(data.as_bytes(), EcLevel::H)?;
    Ok(code
        .render::<Luma<u8>>()
        .quiet_zone(true)
        .module_dimensions(MODULE_PX, MODULE_PX)
        .build())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_produces_square_bitmap() {
        let img = render_qr(r#"{"id":"doc","hash":"abc","sig":"sig"}"#).unwrap();
        assert_eq!(img.width(), img.height());
        assert!(img.width() > 0);
    }

    #[test]
    fn test_render_has_both_tones() {
        let img = render_qr("payload").unwrap();
        let mut has_dark = false;
        let mut has_light = false;
        for pixel in img.pixels() {
            match pixel.0[0] {
                0..=127 => has_dark = true,
                _ => has_light = true,
            }
        }
        assert!(has_dark && has_light);
    }

    #[test]
    fn test_oversized_payload_is_render_error() {
        // Level H tops out well under 2KB of binary data.
        let huge = "x".repeat(4096);
        assert!(matches!(render_qr(&huge), Err(CodecError::Render(_))));
    }

    #[test]
    fn test_default_placement_is_top_right() {
        let config = StampConfig::default();
        let (x, y) = config.placement(612.0, 792.0);
        assert_eq!((x, y), (612.0 - 36.0 - 100.0, 36.0));
    }

    #[test]
    fn test_all_placements_stay_on_a4_letter() {
        let config = StampConfig::default();
        for position in [
            StampPosition::TopLeft,
            StampPosition::TopRight,
            StampPosition::BottomLeft,
            StampPosition::BottomRight,
            StampPosition::Center,
        ] {
            let config = StampConfig { position, ..config };
            let (x, y) = config.placement(612.0, 792.0);
            assert!(x >= 0.0 && x + config.size_pt <= 612.0);
            assert!(y >= 0.0 && y + config.size_pt <= 792.0);
        }
    }
}
