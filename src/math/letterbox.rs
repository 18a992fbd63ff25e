use glam::Vec2;

use crate::core::Dimensions;

/// Where the video lands inside the drawing surface and how detection
/// coordinates scale onto it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawGeometry {
    /// Size of the letterboxed video rectangle (drawWidth, drawHeight)
    pub draw_size: Vec2,
    /// Top-left of the video rectangle (offsetX, offsetY)
    pub offset: Vec2,
    /// Source-frame pixels to surface pixels (scaleX, scaleY)
    pub scale: Vec2,
}

impl DrawGeometry {
    pub fn draw_width(&self) -> f32 {
        self.draw_size.x
    }

    pub fn draw_height(&self) -> f32 {
        self.draw_size.y
    }

    pub fn offset_x(&self) -> f32 {
        self.offset.x
    }

    pub fn offset_y(&self) -> f32 {
        self.offset.y
    }

    pub fn scale_x(&self) -> f32 {
        self.scale.x
    }

    pub fn scale_y(&self) -> f32 {
        self.scale.y
    }

    /// Source-frame point to surface point
    pub fn to_surface(&self, point: Vec2) -> Vec2 {
        self.offset + point * self.scale
    }

    /// Surface point back to source-frame point
    pub fn to_source(&self, point: Vec2) -> Vec2 {
        (point - self.offset) / self.scale
    }

    /// Source-frame rectangle to surface rectangle, returns (top-left, size)
    pub fn map_rect(&self, origin: Vec2, size: Vec2) -> (Vec2, Vec2) {
        (self.to_surface(origin), size * self.scale)
    }

    /// Video rectangle as [x, y, width, height]
    pub fn rect(&self) -> [f32; 4] {
        [self.offset.x, self.offset.y, self.draw_size.x, self.draw_size.y]
    }
}

/// Fit a `native`-sized video into a `client`-sized surface without distortion
///
/// `frame_size` is the coordinate space detection boxes are expressed in; when
/// absent (or empty) the native size is used. Returns `None` while any size is
/// unknown, so callers skip the render instead of dividing by zero.
pub fn fit(client: Dimensions, native: Dimensions, frame_size: Option<Dimensions>) -> Option<DrawGeometry> {
    let video_aspect = native.aspect()?;
    let container_aspect = client.aspect()?;
    let container = client.as_vec2();

    let draw_size = if video_aspect > container_aspect {
        // Wider than the container: bars top and bottom
        Vec2::new(container.x, container.x / video_aspect)
    } else {
        // Bars left and right
        Vec2::new(container.y * video_aspect, container.y)
    }
    .min(container);

    let offset = ((container - draw_size) * 0.5).max(Vec2::ZERO);

    let source = frame_size.filter(|size| !size.is_empty()).unwrap_or(native);
    let scale = draw_size / source.as_vec2();

    Some(DrawGeometry {
        draw_size,
        offset,
        scale,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wide_video_in_square_surface() {
        let geometry = fit(Dimensions::new(800, 800), Dimensions::new(1600, 900), None).unwrap();

        assert_eq!(geometry.draw_width(), 800.0);
        assert!((geometry.draw_height() - 450.0).abs() < 0.01);
        assert_eq!(geometry.offset_x(), 0.0);
        assert!((geometry.offset_y() - 175.0).abs() < 0.01);
        assert_eq!(geometry.scale_x(), 0.5);
    }

    #[test]
    fn test_tall_video_pillarboxed() {
        let geometry = fit(Dimensions::new(1280, 720), Dimensions::new(720, 1280), None).unwrap();

        assert_eq!(geometry.offset_y(), 0.0);
        assert_eq!(geometry.draw_height(), 720.0);
        assert!((geometry.draw_width() - 405.0).abs() < 0.01);
        assert!((geometry.offset_x() - 437.5).abs() < 0.01);
    }

    #[test]
    fn test_frame_size_drives_scale() {
        let geometry = fit(
            Dimensions::new(1280, 720),
            Dimensions::new(1920, 1080),
            Some(Dimensions::new(640, 360)),
        )
        .unwrap();

        assert_eq!(geometry.scale, Vec2::new(2.0, 2.0));
    }

    #[test]
    fn test_zero_sizes_skip() {
        assert!(fit(Dimensions::new(1280, 720), Dimensions::new(0, 0), None).is_none());
        assert!(fit(Dimensions::new(0, 720), Dimensions::new(1920, 1080), None).is_none());
    }

    #[test]
    fn test_empty_frame_size_falls_back_to_native() {
        let geometry = fit(
            Dimensions::new(960, 540),
            Dimensions::new(1920, 1080),
            Some(Dimensions::new(0, 0)),
        )
        .unwrap();

        assert_eq!(geometry.scale, Vec2::new(0.5, 0.5));
    }
}
