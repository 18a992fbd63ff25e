use log::{debug, info};

use super::detection::{DetectionResult, DetectionTrack};
use super::renderer::{OverlayRenderer, RenderOutcome, SharedSurface, Viewport};
use crate::core::Dimensions;

/// Overlay state for the clip currently loaded in the player
///
/// Single owner of the enabled flag and detection set. Only the toggle and
/// the clip-change handler mutate them; every playback event just re-renders.
pub struct OverlaySession {
    clip: Option<String>,
    enabled: bool,
    track: Option<DetectionTrack>,
    viewport: Viewport,
    current_time_s: f64,
    renderer: OverlayRenderer,
    last_outcome: Option<RenderOutcome>,
}

impl OverlaySession {
    pub fn new(renderer: OverlayRenderer) -> Self {
        let enabled = renderer.style().enabled;
        Self {
            clip: None,
            enabled,
            track: None,
            viewport: Viewport::default(),
            current_time_s: 0.0,
            renderer,
            last_outcome: None,
        }
    }

    /// Switch to another clip; everything tied to the old one is dropped
    pub fn load_clip(&mut self, clip_id: impl Into<String>) {
        let clip_id = clip_id.into();
        info!("overlay: clip changed to {}", clip_id);

        self.clip = Some(clip_id);
        self.track = None;
        self.current_time_s = 0.0;
        // Metadata of the new clip is unknown until the player reports it
        self.viewport.native = Dimensions::default();
        self.renderer.clear();
        self.last_outcome = None;
    }

    /// Install the analysis result for the current clip
    pub fn load_detections(&mut self, result: DetectionResult) -> RenderOutcome {
        let track = DetectionTrack::new(result);
        debug!(
            "overlay: {} frames / {} objects, interval {}s",
            track.frames().len(),
            track.object_count(),
            track.interval_s()
        );
        self.track = Some(track);
        self.render()
    }

    /// Toggle the overlay; turning it off also discards detections
    pub fn set_enabled(&mut self, enabled: bool) -> RenderOutcome {
        if self.enabled != enabled {
            info!("overlay: {}", if enabled { "enabled" } else { "disabled" });
        }
        self.enabled = enabled;
        if !enabled {
            self.track = None;
        }
        self.render()
    }

    /// Video metadata became available
    pub fn on_metadata(&mut self, native: Dimensions) -> RenderOutcome {
        self.viewport.native = native;
        self.render()
    }

    /// Surface was resized
    pub fn on_resize(&mut self, client: Dimensions) -> RenderOutcome {
        self.viewport.client = client;
        self.renderer.resize(client);
        self.render()
    }

    /// Playback time advanced (or jumped on seek)
    pub fn on_time_update(&mut self, current_time_s: f64) -> RenderOutcome {
        self.current_time_s = current_time_s;
        self.render()
    }

    pub fn render(&mut self) -> RenderOutcome {
        let outcome = self.renderer.render(
            self.track.as_ref(),
            self.enabled,
            self.viewport,
            self.current_time_s,
        );
        self.last_outcome = Some(outcome);
        outcome
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn has_detections(&self) -> bool {
        self.track.is_some()
    }

    pub fn clip(&self) -> Option<&str> {
        self.clip.as_deref()
    }

    pub fn current_time_s(&self) -> f64 {
        self.current_time_s
    }

    pub fn last_outcome(&self) -> Option<RenderOutcome> {
        self.last_outcome
    }

    pub fn renderer(&self) -> &OverlayRenderer {
        &self.renderer
    }

    pub fn surface(&self) -> SharedSurface {
        self.renderer.surface()
    }
}
