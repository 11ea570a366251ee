//! In-memory image canvases
//!
//! A [`Canvas`] is an ordered stack of frames, like an image list in an
//! image-processing library. Setters act on the *current* frame, which is
//! the most recently created or appended one. [`Canvas::images_blob`]
//! encodes the whole stack (an animated GIF), [`Canvas::blob`] only the
//! current frame.
//!
//! ```
//! use pixelpipe::canvas::{Canvas, Draw};
//!
//! let mut canvas = Canvas::from_color(300, 300, "#ffffff").unwrap();
//! canvas.set_format("svg").unwrap();
//!
//! let mut draw = Draw::new();
//! draw.set_fill_color("#ff0000").unwrap();
//! draw.set_fill_opacity(0.5);
//! draw.set_stroke_width(0.0);
//! draw.rectangle(50, 50, 249, 249);
//! canvas.draw(&draw);
//!
//! assert_eq!(canvas.mime_type().unwrap(), "image/svg+xml");
//! assert!(!canvas.blob().unwrap().is_empty());
//! ```

pub mod composite;
pub mod draw;
pub mod encode;
pub mod format;
pub mod pixel;

pub use composite::CompositeOp;
pub use draw::{Draw, Primitive};
pub use format::ImageFormat;
pub use pixel::{parse_color, with_opacity, ColorError};

use image::{Rgba, RgbaImage};
use thiserror::Error;

/// Largest accepted width or height
pub const MAX_DIMENSION: u32 = 16_384;

/// Error from canvas operations
#[derive(Debug, Error)]
pub enum CanvasError {
    /// Encoding or MIME lookup before `set_format`
    #[error("image format has not been set")]
    FormatNotSet,
    /// Zero or oversized dimensions
    #[error("invalid canvas dimensions {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },
    /// Unknown format name
    #[error("unsupported image format '{0}'")]
    UnsupportedFormat(String),
    /// Frame index past the end of the stack
    #[error("frame index {index} out of range ({count} frames)")]
    IndexOutOfRange { index: usize, count: usize },
    /// Malformed colour string
    #[error(transparent)]
    Color(#[from] ColorError),
    /// The encoder failed
    #[error("failed to encode {format}: {source}")]
    Encode {
        format: ImageFormat,
        #[source]
        source: image::ImageError,
    },
}

/// One image in a canvas stack.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// RGBA pixels
    pub image: RgbaImage,
    /// Output format, unset until `set_format`
    pub format: Option<ImageFormat>,
    /// Delay before the next frame, in ticks of 1/100 s
    pub delay: u32,
    /// Animation loop count; 0 loops forever
    pub iterations: u32,
}

impl Frame {
    fn new(image: RgbaImage) -> Self {
        Self { image, format: None, delay: 0, iterations: 0 }
    }
}

/// A stack of frames with a current-frame cursor.
#[derive(Debug, Clone, PartialEq)]
pub struct Canvas {
    frames: Vec<Frame>,
    current: usize,
}

impl Canvas {
    /// Create a single-frame canvas filled with `background`.
    pub fn new(width: u32, height: u32, background: Rgba<u8>) -> Result<Self, CanvasError> {
        if width == 0 || height == 0 || width > MAX_DIMENSION || height > MAX_DIMENSION {
            return Err(CanvasError::InvalidDimensions { width, height });
        }
        let image = RgbaImage::from_pixel(width, height, background);
        Ok(Self { frames: vec![Frame::new(image)], current: 0 })
    }

    /// Create a single-frame canvas holding `image`.
    pub fn from_image(image: RgbaImage) -> Result<Self, CanvasError> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 || width > MAX_DIMENSION || height > MAX_DIMENSION {
            return Err(CanvasError::InvalidDimensions { width, height });
        }
        Ok(Self { frames: vec![Frame::new(image)], current: 0 })
    }

    /// Create a single-frame canvas from a colour string.
    pub fn from_color(width: u32, height: u32, background: &str) -> Result<Self, CanvasError> {
        Self::new(width, height, parse_color(background)?)
    }

    fn frame(&self) -> &Frame {
        &self.frames[self.current]
    }

    fn frame_mut(&mut self) -> &mut Frame {
        &mut self.frames[self.current]
    }

    pub fn width(&self) -> u32 {
        self.frame().image.width()
    }

    pub fn height(&self) -> u32 {
        self.frame().image.height()
    }

    /// Pixels of the current frame.
    pub fn image(&self) -> &RgbaImage {
        &self.frame().image
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    /// Move the cursor to another frame.
    pub fn set_current(&mut self, index: usize) -> Result<(), CanvasError> {
        if index >= self.frames.len() {
            return Err(CanvasError::IndexOutOfRange { index, count: self.frames.len() });
        }
        self.current = index;
        Ok(())
    }

    /// Set the current frame's format by name (`gif`, `png`, `svg`, `jpeg`/`jpg`).
    pub fn set_format(&mut self, format: &str) -> Result<(), CanvasError> {
        let parsed = ImageFormat::from_str(format)
            .ok_or_else(|| CanvasError::UnsupportedFormat(format.to_string()))?;
        self.frame_mut().format = Some(parsed);
        Ok(())
    }

    pub fn format(&self) -> Option<ImageFormat> {
        self.frame().format
    }

    /// Delay before the next frame, in ticks of 1/100 s.
    pub fn set_delay(&mut self, ticks: u32) {
        self.frame_mut().delay = ticks;
    }

    pub fn delay(&self) -> u32 {
        self.frame().delay
    }

    /// Loop count for animations; 0 loops forever.
    pub fn set_iterations(&mut self, iterations: u32) {
        self.frame_mut().iterations = iterations;
    }

    pub fn iterations(&self) -> u32 {
        self.frame().iterations
    }

    /// Append every frame of `other`; the last appended frame becomes current.
    pub fn add_image(&mut self, other: Canvas) {
        self.frames.extend(other.frames);
        self.current = self.frames.len() - 1;
    }

    /// A single-frame canvas holding a copy of the current frame.
    pub fn current_image(&self) -> Canvas {
        Canvas { frames: vec![self.frame().clone()], current: 0 }
    }

    /// Render `draw` onto the current frame.
    pub fn draw(&mut self, draw: &Draw) {
        draw.apply(&mut self.frame_mut().image);
    }

    /// Composite the current frame of `overlay` onto the current frame,
    /// top-left at (`x`, `y`). Parts outside this canvas are clipped.
    pub fn composite(&mut self, overlay: &Canvas, op: CompositeOp, x: i64, y: i64) {
        let src = &overlay.frame().image;
        composite::composite_image(&mut self.frame_mut().image, src, op, x, y);
    }

    /// MIME type of the current frame's format.
    pub fn mime_type(&self) -> Result<&'static str, CanvasError> {
        self.format().map(|f| f.mime_type()).ok_or(CanvasError::FormatNotSet)
    }

    /// Encode the current frame in its format.
    pub fn blob(&self) -> Result<Vec<u8>, CanvasError> {
        let format = self.format().ok_or(CanvasError::FormatNotSet)?;
        encode::encode_frame(self.frame(), format)
    }

    /// Encode the whole stack in the first frame's format.
    ///
    /// Formats without animation get the first frame only.
    pub fn images_blob(&self) -> Result<Vec<u8>, CanvasError> {
        let first = &self.frames[0];
        let format = first.format.ok_or(CanvasError::FormatNotSet)?;
        if format.supports_animation() {
            encode::encode_gif(&self.frames)
        } else {
            encode::encode_frame(first, format)
        }
    }
}
