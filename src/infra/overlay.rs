use image::{Rgb, RgbImage, Rgba};

/// Semi-transparent green used to mark road pixels.
pub const ROAD_OVERLAY: Rgba<u8> = Rgba([0, 255, 0, 127]);

/// Alpha-blend `color` over every pixel of `frame` where `mask` is set.
/// `mask` is row-major with one entry per pixel; unmasked pixels are
/// copied unchanged.
pub fn overlay_mask(frame: &RgbImage, mask: &[bool], color: Rgba<u8>) -> RgbImage {
    let (w, h) = frame.dimensions();
    debug_assert_eq!(mask.len(), (w * h) as usize);

    let alpha = color[3] as f32 / 255.0;
    let mut out = frame.clone();
    for (px, &road) in out.pixels_mut().zip(mask) {
        if !road {
            continue;
        }
        let blend = |under: u8, over: u8| -> u8 {
            (under as f32 * (1.0 - alpha) + over as f32 * alpha).round() as u8
        };
        *px = Rgb([blend(px[0], color[0]), blend(px[1], color[1]), blend(px[2], color[2])]);
    }
    out
}
