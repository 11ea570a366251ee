//! Colour parsing for canvas backgrounds and drawing
//!
//! Accepts the same strings an image tool usually does:
//! - Hex: `#RGB`, `#RGBA`, `#RRGGBB`, `#RRGGBBAA`
//! - Functional: `rgb()`, `rgba()`, `hsl()`, `hwb()` and friends
//! - Named: `red`, `white`, `transparent`, ...

use image::Rgba;
use lightningcss::traits::Parse;
use lightningcss::values::color::{CssColor, FloatColor};
use thiserror::Error;

/// Error type for colour parsing failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ColorError {
    /// Input string was empty
    #[error("empty color string")]
    Empty,
    /// Invalid length (must be 3, 4, 6, or 8 hex chars after #)
    #[error("invalid color length {0}, expected 3, 4, 6, or 8")]
    InvalidLength(usize),
    /// Contains non-hex characters
    #[error("invalid hex character '{0}'")]
    InvalidHex(char),
    /// Not a CSS colour
    #[error("invalid color '{0}'")]
    Css(String),
}

/// Parse a colour string into RGBA.
///
/// # Examples
///
/// ```
/// use pixelpipe::canvas::parse_color;
///
/// assert_eq!(parse_color("#ff0000").unwrap(), image::Rgba([255, 0, 0, 255]));
/// assert_eq!(parse_color("#0F08").unwrap(), image::Rgba([0, 255, 0, 136]));
/// assert_eq!(parse_color("white").unwrap(), image::Rgba([255, 255, 255, 255]));
/// ```
pub fn parse_color(s: &str) -> Result<Rgba<u8>, ColorError> {
    let s = s.trim();
    if s.is_empty() {
        return Err(ColorError::Empty);
    }

    match s.strip_prefix('#') {
        Some(hex) => parse_hex(hex),
        None => parse_css(s),
    }
}

fn parse_hex(hex: &str) -> Result<Rgba<u8>, ColorError> {
    if let Some(c) = hex.chars().find(|c| !c.is_ascii_hexdigit()) {
        return Err(ColorError::InvalidHex(c));
    }

    // Only ASCII hex digits remain, so byte offsets are char offsets
    let channels: Vec<u8> = match hex.len() {
        3 | 4 => hex.chars().filter_map(|c| c.to_digit(16)).map(|d| d as u8 * 17).collect(),
        6 | 8 => (0..hex.len())
            .step_by(2)
            .filter_map(|i| u8::from_str_radix(&hex[i..i + 2], 16).ok())
            .collect(),
        n => return Err(ColorError::InvalidLength(n)),
    };

    let alpha = channels.get(3).copied().unwrap_or(255);
    Ok(Rgba([channels[0], channels[1], channels[2], alpha]))
}

fn parse_css(s: &str) -> Result<Rgba<u8>, ColorError> {
    let invalid = || ColorError::Css(s.to_string());

    let color = CssColor::parse_string(s).map_err(|_| invalid())?;
    match color.to_rgb().map_err(|_| invalid())? {
        CssColor::RGBA(rgba) => Ok(Rgba([rgba.red, rgba.green, rgba.blue, rgba.alpha])),
        CssColor::Float(float) => match float.as_ref() {
            FloatColor::RGB(rgb) => Ok(Rgba([
                unit_to_u8(rgb.r),
                unit_to_u8(rgb.g),
                unit_to_u8(rgb.b),
                unit_to_u8(rgb.alpha),
            ])),
            _ => Err(invalid()),
        },
        _ => Err(invalid()),
    }
}

fn unit_to_u8(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Scale a colour's alpha by `opacity` (clamped to 0.0-1.0).
pub fn with_opacity(color: Rgba<u8>, opacity: f32) -> Rgba<u8> {
    let Rgba([r, g, b, a]) = color;
    Rgba([r, g, b, (a as f32 * opacity.clamp(0.0, 1.0)).round() as u8])
}
