//! Test fixtures: small image blobs and verdicts.

use imghost_core::{CategoryScore, ModerationVerdict};

/// Minimal valid 1x1 PNG bytes.
pub fn create_minimal_png() -> Vec<u8> {
    vec![
        0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
        0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x02, 0x00, 0x00, 0x00, 0x90,
        0x77, 0x53, 0xDE, 0x00, 0x00, 0x00, 0x0C, 0x49, 0x44, 0x41, 0x54, 0x08, 0xD7, 0x63, 0xF8,
        0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x01, 0x00, 0x18, 0xDD, 0x8D, 0x89, 0x00, 0x00, 0x00,
        0x00, 0x49, 0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
    ]
}

/// JPEG-looking bytes: SOI marker, a JFIF APP0 segment, EOI marker.
/// `seed` varies the payload so distinct fixtures hash differently.
pub fn create_test_jpeg(seed: u8) -> Vec<u8> {
    let mut jpeg = vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10];
    jpeg.extend_from_slice(b"JFIF\0");
    jpeg.extend_from_slice(&[0x01, 0x01, 0x00, 0x00, 0x01, 0x00, 0x01, 0x00, seed]);
    jpeg.extend_from_slice(&[0xFF, 0xD9]);
    jpeg
}

pub fn clean_verdict() -> ModerationVerdict {
    ModerationVerdict::clean(0.02)
}

/// Verdict for an image the classifier scores as 92% unsafe.
pub fn flagged_verdict() -> ModerationVerdict {
    ModerationVerdict::new(
        true,
        vec![CategoryScore {
            label: "unsafe".to_string(),
            score: 0.92,
        }],
        0.92,
    )
}
