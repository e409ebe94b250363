//! Batched QR raster encoding.
//!
//! Payloads are encoded in fixed-size batches: every encode inside a batch
//! runs in parallel, batches themselves run strictly one after another.
//! That caps the number of simultaneously open pixel buffers at one
//! batch's width no matter how many entries a document has.

use crate::QrCodeEntry;
use crate::debug::DebugLogger;
use image::{GrayImage, Luma};
use qrcode::{EcLevel, QrCode};
use rayon::prelude::*;
use std::collections::HashMap;

/// Entries encoded concurrently per batch.
pub const ENCODE_BATCH_SIZE: usize = 50;
/// Target edge length of the rendered raster, in pixels.
pub const QR_PIXEL_WIDTH: u32 = 256;
/// Quiet zone around the symbol, in modules.
pub const QR_QUIET_ZONE_MODULES: u32 = 2;

/// Encode every entry's payload into a grayscale raster, keyed by entry id.
///
/// A payload that fails to encode is logged and skipped; the renderer
/// tolerates the missing key and draws that cell without an image.
pub fn encode_entries(
    entries: &[QrCodeEntry],
    logger: Option<&DebugLogger>,
) -> HashMap<String, GrayImage> {
    let mut images = HashMap::with_capacity(entries.len());
    for batch in entries.chunks(ENCODE_BATCH_SIZE) {
        let encoded: Vec<(&str, Result<GrayImage, qrcode::types::QrError>)> = batch
            .par_iter()
            .map(|entry| (entry.id.as_str(), encode_payload(&entry.payload)))
            .collect();
        for (id, result) in encoded {
            match result {
                Ok(image) => {
                    images.insert(id.to_string(), image);
                }
                Err(err) => {
                    if let Some(logger) = logger {
                        logger.log_event(
                            "encode.skip",
                            &[("id", id), ("error", &err.to_string())],
                        );
                        logger.increment("encode.skipped", 1);
                    }
                }
            }
        }
    }
    images
}

/// Render one payload as a square grayscale raster with a quiet zone,
/// scaled up to roughly [`QR_PIXEL_WIDTH`] pixels (module-aligned, never
/// below one pixel per module).
fn encode_payload(payload: &str) -> Result<GrayImage, qrcode::types::QrError> {
    let code = QrCode::with_error_correction_level(payload.as_bytes(), EcLevel::M)?;
    let modules = code.to_colors();
    let module_count = code.width() as u32;
    let total_modules = module_count + 2 * QR_QUIET_ZONE_MODULES;
    let scale = (QR_PIXEL_WIDTH / total_modules).max(1);
    let img_size = total_modules * scale;

    let mut img = GrayImage::from_pixel(img_size, img_size, Luma([255u8]));
    for (i, color) in modules.iter().enumerate() {
        if *color != qrcode::Color::Dark {
            continue;
        }
        let x = (i as u32 % module_count + QR_QUIET_ZONE_MODULES) * scale;
        let y = (i as u32 / module_count + QR_QUIET_ZONE_MODULES) * scale;
        for dy in 0..scale {
            for dx in 0..scale {
                img.put_pixel(x + dx, y + dy, Luma([0u8]));
            }
        }
    }
    Ok(img)
}
