//! Compositing operators for layering one canvas onto another

use image::{Rgba, RgbaImage};

/// How overlay pixels combine with the pixels beneath them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompositeOp {
    /// Replace destination pixels, alpha included
    Copy,
    /// Standard alpha compositing (source over destination)
    #[default]
    Over,
    /// Darkens underlying colors: result = base * blend
    Multiply,
    /// Lightens underlying colors: result = 1 - (1 - base) * (1 - blend)
    Screen,
    /// Combines multiply/screen based on base brightness
    Overlay,
    /// Additive blending: result = min(1, base + blend)
    Add,
    /// Subtractive blending: result = max(0, base - blend)
    Subtract,
    /// Color difference: result = abs(base - blend)
    Difference,
    /// Keeps darker color: result = min(base, blend)
    Darken,
    /// Keeps lighter color: result = max(base, blend)
    Lighten,
}

impl CompositeOp {
    /// Parse an operator name
    pub fn from_str(s: &str) -> Option<CompositeOp> {
        match s.to_lowercase().as_str() {
            "copy" | "src" => Some(CompositeOp::Copy),
            "over" | "src-over" | "normal" => Some(CompositeOp::Over),
            "multiply" => Some(CompositeOp::Multiply),
            "screen" => Some(CompositeOp::Screen),
            "overlay" => Some(CompositeOp::Overlay),
            "add" | "plus" => Some(CompositeOp::Add),
            "subtract" | "minus" => Some(CompositeOp::Subtract),
            "difference" => Some(CompositeOp::Difference),
            "darken" => Some(CompositeOp::Darken),
            "lighten" => Some(CompositeOp::Lighten),
            _ => None,
        }
    }

    /// Blend a single color channel (values are 0.0-1.0)
    fn blend_channel(&self, base: f32, blend: f32) -> f32 {
        match self {
            CompositeOp::Copy | CompositeOp::Over => blend,
            CompositeOp::Multiply => base * blend,
            CompositeOp::Screen => 1.0 - (1.0 - base) * (1.0 - blend),
            CompositeOp::Overlay => {
                if base < 0.5 {
                    2.0 * base * blend
                } else {
                    1.0 - 2.0 * (1.0 - base) * (1.0 - blend)
                }
            }
            CompositeOp::Add => (base + blend).min(1.0),
            CompositeOp::Subtract => (base - blend).max(0.0),
            CompositeOp::Difference => (base - blend).abs(),
            CompositeOp::Darken => base.min(blend),
            CompositeOp::Lighten => base.max(blend),
        }
    }
}

/// Blend `src` onto `dst` with the given operator; `src_alpha` is 0.0-1.0.
///
/// The blended color is laid over the destination with porter-duff
/// source-over. `Copy` skips blending and returns `src` unchanged.
pub(crate) fn blend_pixels(src: &Rgba<u8>, dst: &Rgba<u8>, op: CompositeOp, src_alpha: f32) -> Rgba<u8> {
    if op == CompositeOp::Copy {
        return *src;
    }

    let dst_alpha = dst[3] as f32 / 255.0;
    let out_alpha = src_alpha + dst_alpha * (1.0 - src_alpha);
    if out_alpha == 0.0 {
        return Rgba([0, 0, 0, 0]);
    }

    let channel = |i: usize| -> u8 {
        let s = src[i] as f32 / 255.0;
        let d = dst[i] as f32 / 255.0;
        let blended = op.blend_channel(d, s);
        let result = (blended * src_alpha + d * dst_alpha * (1.0 - src_alpha)) / out_alpha;
        (result.clamp(0.0, 1.0) * 255.0).round() as u8
    };

    Rgba([channel(0), channel(1), channel(2), (out_alpha * 255.0).round() as u8])
}

/// Composite `src` onto `dst` with its top-left corner at (`x`, `y`).
///
/// Offsets may be negative; overlay pixels that fall outside `dst` are
/// clipped.
pub(crate) fn composite_image(dst: &mut RgbaImage, src: &RgbaImage, op: CompositeOp, x: i64, y: i64) {
    let (dst_w, dst_h) = (i64::from(dst.width()), i64::from(dst.height()));

    for (sx, sy, pixel) in src.enumerate_pixels() {
        let dx = x + i64::from(sx);
        let dy = y + i64::from(sy);
        if dx < 0 || dy < 0 || dx >= dst_w || dy >= dst_h {
            continue;
        }
        let (dx, dy) = (dx as u32, dy as u32);

        if op == CompositeOp::Copy {
            dst.put_pixel(dx, dy, *pixel);
            continue;
        }
        if pixel[3] == 0 {
            continue;
        }

        let blended = blend_pixels(pixel, dst.get_pixel(dx, dy), op, pixel[3] as f32 / 255.0);
        dst.put_pixel(dx, dy, blended);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(w: u32, h: u32, color: [u8; 4]) -> RgbaImage {
        RgbaImage::from_pixel(w, h, Rgba(color))
    }

    #[test]
    fn test_from_str() {
        assert_eq!(CompositeOp::from_str("copy"), Some(CompositeOp::Copy));
        assert_eq!(CompositeOp::from_str("Over"), Some(CompositeOp::Over));
        assert_eq!(CompositeOp::from_str("plus"), Some(CompositeOp::Add));
        assert_eq!(CompositeOp::from_str("dissolve"), None);
    }

    #[test]
    fn test_copy_replaces_alpha() {
        let mut dst = solid(2, 2, [255, 255, 255, 255]);
        let src = solid(2, 2, [255, 0, 0, 128]);
        composite_image(&mut dst, &src, CompositeOp::Copy, 0, 0);
        assert_eq!(*dst.get_pixel(1, 1), Rgba([255, 0, 0, 128]));
    }

    #[test]
    fn test_over_half_red_on_white() {
        let mut dst = solid(1, 1, [255, 255, 255, 255]);
        let src = solid(1, 1, [255, 0, 0, 128]);
        composite_image(&mut dst, &src, CompositeOp::Over, 0, 0);
        assert_eq!(*dst.get_pixel(0, 0), Rgba([255, 127, 127, 255]));
    }

    #[test]
    fn test_over_skips_transparent() {
        let mut dst = solid(1, 1, [10, 20, 30, 255]);
        let src = solid(1, 1, [255, 0, 0, 0]);
        composite_image(&mut dst, &src, CompositeOp::Over, 0, 0);
        assert_eq!(*dst.get_pixel(0, 0), Rgba([10, 20, 30, 255]));
    }

    #[test]
    fn test_negative_offset_clips() {
        let mut dst = solid(4, 4, [0, 0, 0, 255]);
        let src = solid(3, 3, [255, 255, 255, 255]);
        composite_image(&mut dst, &src, CompositeOp::Copy, -2, -2);

        assert_eq!(*dst.get_pixel(0, 0), Rgba([255, 255, 255, 255]));
        assert_eq!(*dst.get_pixel(1, 1), Rgba([0, 0, 0, 255]));
        assert_eq!(*dst.get_pixel(1, 0), Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn test_offset_past_edge_clips() {
        let mut dst = solid(4, 4, [0, 0, 0, 255]);
        let src = solid(3, 3, [255, 255, 255, 255]);
        composite_image(&mut dst, &src, CompositeOp::Over, 3, 3);

        assert_eq!(*dst.get_pixel(3, 3), Rgba([255, 255, 255, 255]));
        assert_eq!(*dst.get_pixel(2, 2), Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn test_blend_modes() {
        let gray = Rgba([128, 128, 128, 255]);
        let white = Rgba([255, 255, 255, 255]);
        let black = Rgba([0, 0, 0, 255]);

        assert_eq!(blend_pixels(&white, &gray, CompositeOp::Multiply, 1.0), gray);
        assert_eq!(blend_pixels(&black, &gray, CompositeOp::Screen, 1.0), gray);
        assert_eq!(blend_pixels(&white, &gray, CompositeOp::Add, 1.0), white);
        assert_eq!(blend_pixels(&white, &gray, CompositeOp::Subtract, 1.0), black);
        assert_eq!(blend_pixels(&white, &gray, CompositeOp::Darken, 1.0), gray);
        assert_eq!(blend_pixels(&black, &gray, CompositeOp::Lighten, 1.0), gray);
        assert_eq!(blend_pixels(&white, &white, CompositeOp::Difference, 1.0), black);
    }
}
