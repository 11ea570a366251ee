//! Output formats a canvas can be encoded to

use std::fmt;

/// Encoded image format of a canvas frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageFormat {
    /// Palette-based, supports animation
    Gif,
    Png,
    /// Raster frame embedded in an SVG document
    Svg,
    /// Lossy, alpha is dropped
    Jpeg,
}

impl ImageFormat {
    /// Every supported format.
    pub const ALL: [ImageFormat; 4] =
        [ImageFormat::Gif, ImageFormat::Png, ImageFormat::Svg, ImageFormat::Jpeg];

    /// Parse a format name (case-insensitive, `jpg` accepted)
    pub fn from_str(s: &str) -> Option<ImageFormat> {
        match s.trim().to_lowercase().as_str() {
            "gif" => Some(ImageFormat::Gif),
            "png" => Some(ImageFormat::Png),
            "svg" => Some(ImageFormat::Svg),
            "jpeg" | "jpg" => Some(ImageFormat::Jpeg),
            _ => None,
        }
    }

    /// MIME type sent as `Content-Type`
    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageFormat::Gif => "image/gif",
            ImageFormat::Png => "image/png",
            ImageFormat::Svg => "image/svg+xml",
            ImageFormat::Jpeg => "image/jpeg",
        }
    }

    /// Canonical lowercase name, also used as the file extension
    pub fn name(&self) -> &'static str {
        match self {
            ImageFormat::Gif => "gif",
            ImageFormat::Png => "png",
            ImageFormat::Svg => "svg",
            ImageFormat::Jpeg => "jpeg",
        }
    }

    /// Whether every frame of a canvas ends up in the encoded output
    pub fn supports_animation(&self) -> bool {
        matches!(self, ImageFormat::Gif)
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
