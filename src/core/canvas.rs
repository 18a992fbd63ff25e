use bytemuck::{Pod, Zeroable};

use super::dimensions::Dimensions;

/// One RGBA8 pixel
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Pod, Zeroable)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const TRANSPARENT: Rgba = Rgba::new(0, 0, 0, 0);
    pub const BLACK: Rgba = Rgba::new(0, 0, 0, 255);
    pub const WHITE: Rgba = Rgba::new(255, 255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Build from unit-range RGB
    pub fn from_unit(rgb: [f32; 3], a: u8) -> Self {
        let to_byte = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        Self::new(to_byte(rgb[0]), to_byte(rgb[1]), to_byte(rgb[2]), a)
    }
}

/// 2D drawing operations for the overlay surface
/// Coordinates are surface pixels, rectangles cover `[x, x + width)` after rounding
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    /// Fill entire canvas with color and drop recorded text
    Clear(Rgba),

    /// Filled rectangle
    FillRect { x: f32, y: f32, width: f32, height: f32, color: Rgba },

    /// Rectangle outline, stroke drawn inside the rectangle edges
    StrokeRect { x: f32, y: f32, width: f32, height: f32, line_width: f32, color: Rgba },

    /// Text run anchored at its top-left corner
    Text { x: f32, y: f32, text: String, color: Rgba },
}

/// Text recorded on the canvas; glyphs are left to the presenting surface
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub x: f32,
    pub y: f32,
    pub text: String,
    pub color: Rgba,
}

/// CPU drawing surface - pixel buffer plus recorded text runs
#[derive(Debug, Clone)]
pub struct Canvas {
    pixels: Vec<Rgba>,
    texts: Vec<TextRun>,
    width: u32,
    height: u32,
}

impl Canvas {
    /// Create new transparent canvas with dimensions
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            pixels: vec![Rgba::TRANSPARENT; width as usize * height as usize],
            texts: Vec::new(),
            width,
            height,
        }
    }

    /// Add draw operation - functional style
    pub fn draw(mut self, op: DrawOp) -> Self {
        self.apply(&op);
        self
    }

    /// Resize the backing store; any size change wipes the contents
    pub fn resize(&mut self, size: Dimensions) {
        if size.width == self.width && size.height == self.height {
            return;
        }
        *self = Canvas::new(size.width, size.height);
    }

    /// Execute single draw operation
    pub fn apply(&mut self, op: &DrawOp) {
        match op {
            DrawOp::Clear(color) => self.clear(*color),
            DrawOp::FillRect { x, y, width, height, color } => {
                self.fill_rect(*x, *y, *width, *height, *color)
            }
            DrawOp::StrokeRect { x, y, width, height, line_width, color } => {
                self.stroke_rect(*x, *y, *width, *height, *line_width, *color)
            }
            DrawOp::Text { x, y, text, color } => self.texts.push(TextRun {
                x: *x,
                y: *y,
                text: text.clone(),
                color: *color,
            }),
        }
    }

    /// Execute operations in order
    pub fn apply_all<'a>(&mut self, ops: impl IntoIterator<Item = &'a DrawOp>) {
        for op in ops {
            self.apply(op);
        }
    }

    fn clear(&mut self, color: Rgba) {
        self.pixels.fill(color);
        self.texts.clear();
    }

    fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32, color: Rgba) {
        if !(width > 0.0 && height > 0.0) {
            return;
        }

        let clamp_x = |v: f32| (v.round() as i64).clamp(0, self.width as i64) as usize;
        let clamp_y = |v: f32| (v.round() as i64).clamp(0, self.height as i64) as usize;

        let (x0, x1) = (clamp_x(x), clamp_x(x + width));
        let (y0, y1) = (clamp_y(y), clamp_y(y + height));

        for row in y0..y1 {
            let start = row * self.width as usize;
            self.pixels[start + x0..start + x1].fill(color);
        }
    }

    fn stroke_rect(&mut self, x: f32, y: f32, width: f32, height: f32, line_width: f32, color: Rgba) {
        let lw = line_width.max(1.0);

        // Too thin for a hollow outline
        if width <= 2.0 * lw || height <= 2.0 * lw {
            self.fill_rect(x, y, width, height, color);
            return;
        }

        self.fill_rect(x, y, width, lw, color);
        self.fill_rect(x, y + height - lw, width, lw, color);
        self.fill_rect(x, y + lw, lw, height - 2.0 * lw, color);
        self.fill_rect(x + width - lw, y + lw, lw, height - 2.0 * lw, color);
    }

    /// Pixel at (x, y), `None` outside the canvas
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels.get((y * self.width + x) as usize).copied()
    }

    /// Copy a region as RGBA bytes, clipped to the canvas
    pub fn read_region(&self, x: u32, y: u32, width: u32, height: u32) -> Vec<u8> {
        let x1 = x.saturating_add(width).min(self.width);
        let y1 = y.saturating_add(height).min(self.height);
        let mut out = Vec::new();

        for row in y.min(y1)..y1 {
            let start = (row * self.width) as usize;
            let slice = &self.pixels[start + x.min(x1) as usize..start + x1 as usize];
            out.extend_from_slice(bytemuck::cast_slice(slice));
        }

        out
    }

    /// True when every pixel is fully transparent and no text is recorded
    pub fn is_blank(&self) -> bool {
        self.texts.is_empty() && self.pixels.iter().all(|p| p.a == 0)
    }

    pub fn pixels(&self) -> &[Rgba] {
        &self.pixels
    }

    /// Pixel buffer as raw RGBA bytes
    pub fn bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.pixels)
    }

    pub fn texts(&self) -> &[TextRun] {
        &self.texts
    }

    /// Get canvas dimensions
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Rgba = Rgba::new(255, 0, 0, 255);

    #[test]
    fn canvas_creation() {
        let canvas = Canvas::new(100, 50);
        assert_eq!(canvas.dimensions(), (100, 50));
        assert_eq!(canvas.pixels().len(), 100 * 50);
        assert_eq!(canvas.bytes().len(), 100 * 50 * 4);
        assert!(canvas.is_blank());
    }

    #[test]
    fn canvas_clear() {
        let canvas = Canvas::new(10, 10).draw(DrawOp::Clear(RED));

        assert_eq!(&canvas.bytes()[0..4], &[255, 0, 0, 255]);
        assert_eq!(canvas.pixel(9, 9), Some(RED));
    }

    #[test]
    fn canvas_fill_rect_rounds_edges() {
        let canvas = Canvas::new(10, 10).draw(DrawOp::FillRect {
            x: 1.6,
            y: 2.0,
            width: 3.0,
            height: 2.0,
            color: RED,
        });

        // Covers x in [2, 5), y in [2, 4)
        assert_eq!(canvas.pixel(1, 2), Some(Rgba::TRANSPARENT));
        assert_eq!(canvas.pixel(2, 2), Some(RED));
        assert_eq!(canvas.pixel(4, 3), Some(RED));
        assert_eq!(canvas.pixel(5, 3), Some(Rgba::TRANSPARENT));
        assert_eq!(canvas.pixel(4, 4), Some(Rgba::TRANSPARENT));
    }

    #[test]
    fn canvas_stroke_rect_is_hollow() {
        let canvas = Canvas::new(20, 20).draw(DrawOp::StrokeRect {
            x: 2.0,
            y: 2.0,
            width: 10.0,
            height: 10.0,
            line_width: 2.0,
            color: RED,
        });

        assert_eq!(canvas.pixel(2, 2), Some(RED));
        assert_eq!(canvas.pixel(11, 11), Some(RED));
        assert_eq!(canvas.pixel(3, 7), Some(RED));
        assert_eq!(canvas.pixel(7, 7), Some(Rgba::TRANSPARENT));
        assert_eq!(canvas.pixel(12, 12), Some(Rgba::TRANSPARENT));
    }

    #[test]
    fn canvas_bounds_checking() {
        let canvas = Canvas::new(10, 10).draw(DrawOp::FillRect {
            x: -5.0,
            y: 8.0,
            width: 100.0,
            height: 100.0,
            color: RED,
        });

        assert_eq!(canvas.pixel(0, 9), Some(RED));
        assert_eq!(canvas.pixel(0, 7), Some(Rgba::TRANSPARENT));
        assert_eq!(canvas.pixel(10, 10), None);
    }

    #[test]
    fn canvas_text_is_recorded_and_cleared() {
        let mut canvas = Canvas::new(10, 10).draw(DrawOp::Text {
            x: 1.0,
            y: 2.0,
            text: "person 91%".to_string(),
            color: Rgba::WHITE,
        });

        assert_eq!(canvas.texts().len(), 1);
        assert_eq!(canvas.texts()[0].text, "person 91%");
        assert!(!canvas.is_blank());

        canvas.apply(&DrawOp::Clear(Rgba::TRANSPARENT));
        assert!(canvas.is_blank());
    }

    #[test]
    fn canvas_read_region_clips() {
        let canvas = Canvas::new(4, 4).draw(DrawOp::Clear(RED));

        assert_eq!(canvas.read_region(0, 0, 2, 2).len(), 2 * 2 * 4);
        assert_eq!(canvas.read_region(3, 3, 5, 5).len(), 4);
        assert!(canvas.read_region(10, 10, 2, 2).is_empty());
    }

    #[test]
    fn canvas_resize_wipes_only_on_change() {
        let mut canvas = Canvas::new(4, 4).draw(DrawOp::Clear(RED));

        canvas.resize(Dimensions::new(4, 4));
        assert_eq!(canvas.pixel(0, 0), Some(RED));

        canvas.resize(Dimensions::new(8, 2));
        assert_eq!(canvas.dimensions(), (8, 2));
        assert!(canvas.is_blank());
    }

    #[test]
    fn rgba_from_unit() {
        assert_eq!(Rgba::from_unit([1.0, 0.5, 0.0], 255), Rgba::new(255, 128, 0, 255));
    }
}
