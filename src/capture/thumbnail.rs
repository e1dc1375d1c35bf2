//! Source thumbnails
//!
//! Converts a raw BGRA frame into the small base64 PNG shipped with
//! each capture source.

use base64::Engine;

/// Largest thumbnail edge in pixels
const MAX_EDGE: u32 = 320;

/// Downscale a BGRA frame with nearest-neighbor sampling so that its
/// longest edge is at most `max_edge`.
fn downscale_bgra(data: &[u8], width: u32, height: u32, max_edge: u32) -> (Vec<u8>, u32, u32) {
    if width <= max_edge && height <= max_edge {
        return (data.to_vec(), width, height);
    }

    let scale = (max_edge as f64 / width.max(height) as f64).min(1.0);
    let out_w = ((width as f64 * scale) as u32).max(1);
    let out_h = ((height as f64 * scale) as u32).max(1);

    let mut out = Vec::with_capacity((out_w * out_h * 4) as usize);
    for y in 0..out_h {
        let src_y = (y as u64 * height as u64 / out_h as u64) as u32;
        for x in 0..out_w {
            let src_x = (x as u64 * width as u64 / out_w as u64) as u32;
            let offset = ((src_y * width + src_x) * 4) as usize;
            out.extend_from_slice(&data[offset..offset + 4]);
        }
    }

    (out, out_w, out_h)
}

/// Encode a raw BGRA frame as a base64 PNG thumbnail.
///
/// Returns None on malformed input rather than failing source
/// enumeration.
pub fn encode_thumbnail(data: &[u8], width: u32, height: u32) -> Option<String> {
    if width == 0 || height == 0 || data.len() < (width * height * 4) as usize {
        return None;
    }

    let (scaled, out_w, out_h) = downscale_bgra(data, width, height, MAX_EDGE);

    // BGRA -> RGBA
    let mut rgba = scaled;
    for pixel in rgba.chunks_exact_mut(4) {
        pixel.swap(0, 2);
    }

    let mut png_bytes = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut png_bytes, out_w, out_h);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder.write_header().ok()?;
        writer.write_image_data(&rgba).ok()?;
    }

    Some(base64::engine::general_purpose::STANDARD.encode(png_bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_thumbnail_small_frame() {
        // 2x2 BGRA frame
        let data = vec![255u8; 2 * 2 * 4];

        let thumbnail = encode_thumbnail(&data, 2, 2);

        assert!(thumbnail.is_some());
        assert!(!thumbnail.unwrap().is_empty());
    }

    #[test]
    fn test_encode_thumbnail_rejects_short_buffer() {
        assert!(encode_thumbnail(&[0u8; 4], 2, 2).is_none());
        assert!(encode_thumbnail(&[], 0, 0).is_none());
    }

    #[test]
    fn test_downscale_caps_longest_edge() {
        let data = vec![0u8; 1920 * 1080 * 4];

        let (scaled, w, h) = downscale_bgra(&data, 1920, 1080, 320);

        assert_eq!(w, 320);
        assert!(h <= 320);
        assert_eq!(scaled.len(), (w * h * 4) as usize);
    }
}
