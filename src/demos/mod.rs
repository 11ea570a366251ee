//! Image demos served as HTTP-style responses
//!
//! Each demo builds canvases, encodes them and returns the bytes with
//! their content type. Errors are returned unchanged; the caller decides
//! how to surface them (see [`server_error`]).

use crate::canvas::{Canvas, CanvasError, CompositeOp, Draw};
use image::{Rgba, RgbaImage};
use std::io::{self, Write};

/// Encoded demo output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DemoResponse {
    pub status: u16,
    pub content_type: String,
    pub body: Vec<u8>,
}

impl DemoResponse {
    pub fn ok(content_type: impl Into<String>, body: Vec<u8>) -> Self {
        Self { status: 200, content_type: content_type.into(), body }
    }

    /// Write a complete HTTP/1.1 response: status line, headers, body.
    pub fn write_http<W: Write>(&self, w: &mut W) -> io::Result<()> {
        write!(w, "HTTP/1.1 {} {}\r\n", self.status, reason_phrase(self.status))?;
        write!(w, "Content-Type: {}\r\n", self.content_type)?;
        write!(w, "Content-Length: {}\r\n", self.body.len())?;
        w.write_all(b"Connection: close\r\n\r\n")?;
        w.write_all(&self.body)?;
        w.flush()
    }
}

fn reason_phrase(status: u16) -> &'static str {
    match status {
        200 => "OK",
        404 => "Not Found",
        500 => "Internal Server Error",
        _ => "Unknown",
    }
}

/// A `500` response carrying `message` as plain text.
pub fn server_error(message: &str) -> DemoResponse {
    DemoResponse {
        status: 500,
        content_type: "text/plain; charset=utf-8".to_string(),
        body: format!("{}\n", message).into_bytes(),
    }
}

/// A registered demo.
pub struct Demo {
    pub name: &'static str,
    pub description: &'static str,
    pub run: fn() -> Result<DemoResponse, CanvasError>,
}

/// Every demo, in listing order.
pub const DEMOS: &[Demo] = &[
    Demo {
        name: "animated-gif",
        description: "Two-frame red/green GIF looping forever",
        run: animated_gif,
    },
    Demo {
        name: "stack-overflow.svg",
        description: "Half-transparent rectangle copied onto a white SVG canvas",
        run: composite_svg,
    },
    Demo {
        name: "types",
        description: "Rectangle drawn on a canvas whose format comes from a variable",
        run: typed_format,
    },
    Demo {
        name: "allrgb",
        description: "4096x4096 PNG holding every 24-bit colour exactly once",
        run: all_rgb,
    },
];

/// Look up a demo by name.
pub fn find(name: &str) -> Option<&'static Demo> {
    DEMOS.iter().find(|d| d.name == name)
}

/// Run a demo by name; `None` if no such demo exists.
pub fn run(name: &str) -> Option<Result<DemoResponse, CanvasError>> {
    find(name).map(|demo| (demo.run)())
}

const SIZE: u32 = 300;

/// The red rectangle shared by the composite and typed-format demos.
fn half_red_square() -> Result<Draw, CanvasError> {
    let mut draw = Draw::new();
    draw.set_stroke_width(0.0);
    draw.set_fill_color("#ff0000")?;
    draw.set_fill_opacity(0.5);
    draw.rectangle(50, 50, 249, 249);
    Ok(draw)
}

/// Red frame looping forever, then a green frame with a 10-tick delay.
pub fn animated_gif() -> Result<DemoResponse, CanvasError> {
    let mut image = Canvas::from_color(SIZE, SIZE, "#ff0000")?;
    image.set_format("gif")?;
    image.set_iterations(0);

    let mut frame = Canvas::from_color(SIZE, SIZE, "#00ff00")?;
    frame.set_format("gif")?;
    frame.set_delay(10);

    image.add_image(frame);

    let content_type = image.mime_type()?;
    Ok(DemoResponse::ok(content_type, image.images_blob()?))
}

/// White SVG canvas with a PNG overlay copied over it.
pub fn composite_svg() -> Result<DemoResponse, CanvasError> {
    let mut image = Canvas::from_color(SIZE, SIZE, "#ffffff")?;
    image.set_format("svg")?;

    let mut overlay = Canvas::from_color(SIZE, SIZE, "#ffffff")?;
    overlay.set_format("png")?;
    overlay.draw(&half_red_square()?);

    image.composite(&overlay.current_image(), CompositeOp::Copy, 0, 0);

    Ok(DemoResponse::ok("image/svg+xml", image.blob()?))
}

/// Format picked from a variable; the response type is whatever the canvas reports.
pub fn typed_format() -> Result<DemoResponse, CanvasError> {
    let format = "svg";

    let mut image = Canvas::from_color(SIZE, SIZE, "#ffffff")?;
    image.set_format(format)?;
    image.draw(&half_red_square()?);

    let content_type = image.mime_type()?;
    Ok(DemoResponse::ok(content_type, image.blob()?))
}

/// Side of the all-colours image: 4096 * 4096 = 2^24 pixels.
pub const ALL_RGB_SIZE: u32 = 4096;

/// Position of `(r, g, b)` in the all-colours image.
///
/// Red picks a 16-column strip, the high nibble of green the column inside
/// it, the low nibble of green a 256-row band and blue the row in the band.
pub fn all_rgb_position(r: u8, g: u8, b: u8) -> (u32, u32) {
    let (r, g, b) = (u32::from(r), u32::from(g), u32::from(b));
    (r * 16 + g / 16, (g % 16) * 256 + b)
}

/// Canvas where every 24-bit colour appears at [`all_rgb_position`].
pub fn all_rgb_canvas() -> Result<Canvas, CanvasError> {
    let image = RgbaImage::from_fn(ALL_RGB_SIZE, ALL_RGB_SIZE, |x, y| {
        let r = x / 16;
        let g = (x % 16) * 16 + y / 256;
        let b = y % 256;
        Rgba([r as u8, g as u8, b as u8, 255])
    });
    let mut canvas = Canvas::from_image(image)?;
    canvas.set_format("png")?;
    Ok(canvas)
}

/// Every 24-bit colour in one PNG.
pub fn all_rgb() -> Result<DemoResponse, CanvasError> {
    let canvas = all_rgb_canvas()?;
    let content_type = canvas.mime_type()?;
    Ok(DemoResponse::ok(content_type, canvas.blob()?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_demo() {
        assert!(find("animated-gif").is_some());
        assert!(find("stack-overflow.svg").is_some());
        assert!(find("types").is_some());
        assert!(find("nope").is_none());
        assert!(run("nope").is_none());
    }

    #[test]
    fn test_write_http() {
        let response = DemoResponse::ok("image/gif", b"GIF89a".to_vec());
        let mut out = Vec::new();
        response.write_http(&mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(text.contains("Content-Type: image/gif\r\n"));
        assert!(text.contains("Content-Length: 6\r\n"));
        assert!(text.ends_with("\r\n\r\nGIF89a"));
    }

    #[test]
    fn test_server_error() {
        let response = server_error("image format has not been set");
        assert_eq!(response.status, 500);
        assert_eq!(response.content_type, "text/plain; charset=utf-8");

        let mut out = Vec::new();
        response.write_http(&mut out).unwrap();
        assert!(String::from_utf8(out).unwrap().starts_with("HTTP/1.1 500 Internal Server Error"));
    }

    #[test]
    fn test_all_rgb_positions() {
        assert_eq!(all_rgb_position(0, 0, 0), (0, 0));
        assert_eq!(all_rgb_position(255, 255, 255), (4095, 4095));
        assert_eq!(all_rgb_position(1, 0, 0), (16, 0));
        assert_eq!(all_rgb_position(0, 17, 3), (1, 259));
        assert_eq!(all_rgb_position(200, 100, 50), (3206, 1074));
    }

    #[test]
    fn test_all_rgb_canvas_holds_every_colour_once() {
        let canvas = all_rgb_canvas().unwrap();
        let image = canvas.image();
        assert_eq!(image.dimensions(), (ALL_RGB_SIZE, ALL_RGB_SIZE));

        for (r, g, b) in [(0, 0, 0), (255, 255, 255), (200, 100, 50), (18, 52, 86)] {
            let (x, y) = all_rgb_position(r, g, b);
            assert_eq!(*image.get_pixel(x, y), Rgba([r, g, b, 255]));
        }

        let mut seen = vec![0u64; (1 << 24) / 64];
        for pixel in image.pixels() {
            let [r, g, b, _] = pixel.0;
            let index = (usize::from(r) << 16) | (usize::from(g) << 8) | usize::from(b);
            let bit = 1u64 << (index % 64);
            assert_eq!(seen[index / 64] & bit, 0, "colour {:06x} appears twice", index);
            seen[index / 64] |= bit;
        }
        assert!(seen.iter().all(|word| *word == u64::MAX));
    }

    #[test]
    fn test_typed_format_reports_svg() {
        let response = typed_format().unwrap();
        assert_eq!(response.content_type, "image/svg+xml");
        assert!(response.body.starts_with(b"<?xml"));
    }
}
