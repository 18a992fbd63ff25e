use std::cell::RefCell;
use std::rc::Rc;

use log::trace;

use super::detection::{DetectionFrame, DetectionTrack};
use crate::config::OverlayConfig;
use crate::core::{Canvas, Dimensions, DrawOp, Rgba};
use crate::math::{fit, label_color, DrawGeometry};

/// Overlay surface shared between the renderer and passive readers (the perf probe)
pub type SharedSurface = Rc<RefCell<Canvas>>;

/// Sizes the renderer needs from the video element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Viewport {
    /// Client size of the drawing surface
    pub client: Dimensions,
    /// Intrinsic video size, empty until metadata loads
    pub native: Dimensions,
}

/// What a render pass did
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RenderOutcome {
    /// Overlay switched off, surface cleared
    Disabled,
    /// No detections loaded for this clip
    NoDetections,
    /// Video or surface size unknown
    NoGeometry,
    /// Nothing sampled at this instant
    NoFrame,
    /// Boxes drawn for the frame at `time_s`
    Drawn { time_s: f64, objects: usize },
}

/// Repaints the overlay surface for the current playback instant
pub struct OverlayRenderer {
    surface: SharedSurface,
    style: OverlayConfig,
    geometry: Option<DrawGeometry>,
}

impl OverlayRenderer {
    pub fn new(surface: SharedSurface, style: OverlayConfig) -> Self {
        Self {
            surface,
            style,
            geometry: None,
        }
    }

    /// Renderer with its own blank surface
    pub fn with_size(size: Dimensions, style: OverlayConfig) -> Self {
        Self::new(Rc::new(RefCell::new(Canvas::new(size.width, size.height))), style)
    }

    pub fn surface(&self) -> SharedSurface {
        Rc::clone(&self.surface)
    }

    /// Geometry used by the last render, `None` after a skipped one
    pub fn geometry(&self) -> Option<DrawGeometry> {
        self.geometry
    }

    pub fn style(&self) -> &OverlayConfig {
        &self.style
    }

    /// Match the surface to the client size
    pub fn resize(&mut self, client: Dimensions) {
        self.surface.borrow_mut().resize(client);
    }

    /// Wipe the surface and forget geometry
    pub fn clear(&mut self) {
        self.geometry = None;
        self.surface.borrow_mut().apply(&DrawOp::Clear(Rgba::TRANSPARENT));
    }

    /// Clear, refit, select, draw
    /// Same inputs always yield the same pixels
    pub fn render(
        &mut self,
        track: Option<&DetectionTrack>,
        enabled: bool,
        viewport: Viewport,
        current_time_s: f64,
    ) -> RenderOutcome {
        self.resize(viewport.client);
        self.clear();

        if !enabled {
            return RenderOutcome::Disabled;
        }
        let Some(track) = track else {
            return RenderOutcome::NoDetections;
        };
        let Some(geometry) = fit(viewport.client, viewport.native, track.frame_size()) else {
            return RenderOutcome::NoGeometry;
        };
        self.geometry = Some(geometry);

        let Some(frame) = track.select(current_time_s) else {
            return RenderOutcome::NoFrame;
        };

        let ops = frame_ops(&geometry, frame, &self.style);
        self.surface.borrow_mut().apply_all(&ops);

        trace!(
            "overlay t={:.2}s -> frame {:.2}s, {} objects",
            current_time_s,
            frame.time_s,
            frame.objects.len()
        );

        RenderOutcome::Drawn {
            time_s: frame.time_s,
            objects: frame.objects.len(),
        }
    }
}

/// Draw operations for every object in `frame`: outline, label plate, label text
pub fn frame_ops(geometry: &DrawGeometry, frame: &DetectionFrame, style: &OverlayConfig) -> Vec<DrawOp> {
    let [tr, tg, tb, ta] = style.text_color;
    let text_color = Rgba::new(tr, tg, tb, ta);
    let mut ops = Vec::with_capacity(frame.objects.len() * 3);

    for object in &frame.objects {
        let (origin, size) = geometry.map_rect(object.bbox.origin(), object.bbox.size());
        let color = label_color(&object.label);
        let caption = object.caption();

        ops.push(DrawOp::StrokeRect {
            x: origin.x,
            y: origin.y,
            width: size.x,
            height: size.y,
            line_width: style.line_width,
            color,
        });

        let label_y = origin.y - style.label_height;
        let plate_width = caption.chars().count() as f32 * style.char_width + 2.0 * style.label_padding;

        ops.push(DrawOp::FillRect {
            x: origin.x,
            y: label_y,
            width: plate_width,
            height: style.label_height,
            color: Rgba { a: style.plate_alpha, ..color },
        });
        ops.push(DrawOp::Text {
            x: origin.x + style.label_padding,
            y: label_y,
            text: caption,
            color: text_color,
        });
    }

    ops
}
