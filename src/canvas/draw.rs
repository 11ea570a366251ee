//! Drawing commands applied to a canvas frame

use crate::canvas::composite::{blend_pixels, CompositeOp};
use crate::canvas::pixel::{parse_color, with_opacity, ColorError};
use image::{Rgba, RgbaImage};

/// A shape queued on a [`Draw`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    /// Axis-aligned rectangle; both corners are inclusive
    Rectangle { x1: i64, y1: i64, x2: i64, y2: i64 },
}

/// Fill/stroke settings plus the shapes to draw with them.
///
/// Defaults: opaque black fill, no stroke colour, stroke width 1.
#[derive(Debug, Clone)]
pub struct Draw {
    fill: Rgba<u8>,
    fill_opacity: f32,
    stroke: Rgba<u8>,
    stroke_width: f32,
    primitives: Vec<Primitive>,
}

impl Default for Draw {
    fn default() -> Self {
        Self {
            fill: Rgba([0, 0, 0, 255]),
            fill_opacity: 1.0,
            stroke: Rgba([0, 0, 0, 0]),
            stroke_width: 1.0,
            primitives: vec![],
        }
    }
}

impl Draw {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fill(&mut self, color: Rgba<u8>) {
        self.fill = color;
    }

    pub fn set_fill_color(&mut self, color: &str) -> Result<(), ColorError> {
        self.fill = parse_color(color)?;
        Ok(())
    }

    /// Opacity multiplied into the fill alpha (clamped to 0.0-1.0)
    pub fn set_fill_opacity(&mut self, opacity: f32) {
        self.fill_opacity = opacity.clamp(0.0, 1.0);
    }

    pub fn set_stroke(&mut self, color: Rgba<u8>) {
        self.stroke = color;
    }

    pub fn set_stroke_color(&mut self, color: &str) -> Result<(), ColorError> {
        self.stroke = parse_color(color)?;
        Ok(())
    }

    /// Stroke width in pixels; 0 disables the stroke
    pub fn set_stroke_width(&mut self, width: f32) {
        self.stroke_width = width.max(0.0);
    }

    /// Queue a rectangle with inclusive corners; corners may be given in any order.
    pub fn rectangle(&mut self, x1: i64, y1: i64, x2: i64, y2: i64) {
        self.primitives.push(Primitive::Rectangle {
            x1: x1.min(x2),
            y1: y1.min(y2),
            x2: x1.max(x2),
            y2: y1.max(y2),
        });
    }

    pub fn primitives(&self) -> &[Primitive] {
        &self.primitives
    }

    pub fn fill(&self) -> Rgba<u8> {
        self.fill
    }

    pub fn fill_opacity(&self) -> f32 {
        self.fill_opacity
    }

    pub fn stroke_width(&self) -> f32 {
        self.stroke_width
    }

    /// Render every queued primitive onto `image`.
    pub(crate) fn apply(&self, image: &mut RgbaImage) {
        let fill = with_opacity(self.fill, self.fill_opacity);
        let stroke_px = if self.stroke[3] > 0 { self.stroke_width.round() as i64 } else { 0 };

        for primitive in &self.primitives {
            match *primitive {
                Primitive::Rectangle { x1, y1, x2, y2 } => {
                    fill_rect(image, fill, stroke_px, self.stroke, (x1, y1, x2, y2));
                }
            }
        }
    }
}

fn fill_rect(
    image: &mut RgbaImage,
    fill: Rgba<u8>,
    stroke_px: i64,
    stroke: Rgba<u8>,
    (x1, y1, x2, y2): (i64, i64, i64, i64),
) {
    let max_x = i64::from(image.width()) - 1;
    let max_y = i64::from(image.height()) - 1;

    for y in y1.max(0)..=y2.min(max_y) {
        for x in x1.max(0)..=x2.min(max_x) {
            let on_stroke = stroke_px > 0
                && (x < x1 + stroke_px || x > x2 - stroke_px || y < y1 + stroke_px || y > y2 - stroke_px);
            let color = if on_stroke { stroke } else { fill };
            if color[3] == 0 {
                continue;
            }

            let (px, py) = (x as u32, y as u32);
            let blended = blend_pixels(&color, image.get_pixel(px, py), CompositeOp::Over, color[3] as f32 / 255.0);
            image.put_pixel(px, py, blended);
        }
    }
}
