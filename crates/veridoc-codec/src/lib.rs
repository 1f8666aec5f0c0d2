//! # VeriDoc Codec
//!
//! The credential travels as a QR code printed on the document itself.
//! This crate owns the round trip: the payload wire shapes, QR rendering
//! at error-correction level H, stamping the code onto a page, and the
//! multi-strategy decode pipeline that reads it back from scans.
//!
//! Decoding is deliberately paranoid: it tries the page's embedded
//! raster objects first (no rendering artifacts), then a high-DPI
//! rasterization, and within each image runs two independent decoder
//! backends. A printed document gets folded, smudged, and re-scanned;
//! level H plus redundant decoders is what keeps it readable.

pub mod decode;
pub mod error;
pub mod page;
pub mod payload;
pub mod qr;

pub use decode::{decode_page, decode_payload, DecodeConfig};
pub use error::CodecError;
pub use page::Page;
pub use payload::{CredentialPayload, EncodeOptions, DID_PREFIX, URN_PREFIX};
pub use qr::{render_qr, StampConfig, StampPosition};
