//! Encoding canvas frames to bytes

use crate::canvas::{CanvasError, Frame, ImageFormat};
use base64::Engine;
use image::codecs::gif::{GifEncoder, Repeat};
use image::{Delay, DynamicImage, ImageOutputFormat, RgbaImage};
use std::io::Cursor;

/// Encode frames as an animated GIF.
///
/// Each frame keeps its own delay (ticks of 1/100 s). The loop count comes
/// from the first frame: 0 loops forever.
pub(crate) fn encode_gif(frames: &[Frame]) -> Result<Vec<u8>, CanvasError> {
    let wrap = |source| CanvasError::Encode { format: ImageFormat::Gif, source };
    let mut buf = Vec::new();

    {
        let mut encoder = GifEncoder::new(&mut buf);
        let repeat = match frames.first().map(|f| f.iterations) {
            Some(0) | None => Repeat::Infinite,
            Some(n) => Repeat::Finite(u16::try_from(n).unwrap_or(u16::MAX)),
        };
        encoder.set_repeat(repeat).map_err(wrap)?;

        for frame in frames {
            let delay = Delay::from_numer_denom_ms(frame.delay.saturating_mul(10), 1);
            encoder
                .encode_frame(image::Frame::from_parts(frame.image.clone(), 0, 0, delay))
                .map_err(wrap)?;
        }
    }

    tracing::debug!(frames = frames.len(), bytes = buf.len(), "encoded gif");
    Ok(buf)
}

/// Encode one frame as PNG.
pub(crate) fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, CanvasError> {
    let mut buf = Vec::new();
    DynamicImage::ImageRgba8(image.clone())
        .write_to(&mut Cursor::new(&mut buf), ImageOutputFormat::Png)
        .map_err(|source| CanvasError::Encode { format: ImageFormat::Png, source })?;
    Ok(buf)
}

/// Encode one frame as JPEG; alpha is discarded.
pub(crate) fn encode_jpeg(image: &RgbaImage) -> Result<Vec<u8>, CanvasError> {
    let rgb = DynamicImage::ImageRgba8(image.clone()).to_rgb8();
    let mut buf = Vec::new();
    DynamicImage::ImageRgb8(rgb)
        .write_to(&mut Cursor::new(&mut buf), ImageOutputFormat::Jpeg(90))
        .map_err(|source| CanvasError::Encode { format: ImageFormat::Jpeg, source })?;
    Ok(buf)
}

/// Wrap one frame in an SVG document as an embedded base64 PNG.
pub(crate) fn encode_svg(image: &RgbaImage) -> Result<Vec<u8>, CanvasError> {
    let png = encode_png(image)?;
    let data = base64::engine::general_purpose::STANDARD.encode(png);
    let (w, h) = image.dimensions();

    let svg = format!(
        concat!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"no\"?>\n",
            "<svg xmlns=\"http://www.w3.org/2000/svg\" xmlns:xlink=\"http://www.w3.org/1999/xlink\" ",
            "width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\">\n",
            "  <image width=\"{w}\" height=\"{h}\" xlink:href=\"data:image/png;base64,{data}\"/>\n",
            "</svg>\n"
        ),
        w = w,
        h = h,
        data = data
    );
    Ok(svg.into_bytes())
}

/// Encode a single frame in `format`.
pub(crate) fn encode_frame(frame: &Frame, format: ImageFormat) -> Result<Vec<u8>, CanvasError> {
    match format {
        ImageFormat::Gif => encode_gif(std::slice::from_ref(frame)),
        ImageFormat::Png => encode_png(&frame.image),
        ImageFormat::Jpeg => encode_jpeg(&frame.image),
        ImageFormat::Svg => encode_svg(&frame.image),
    }
}
