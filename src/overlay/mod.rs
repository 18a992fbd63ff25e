//! Detection overlay: bucket selection, letterboxed painting, clip ownership

pub mod detection;
pub mod playback;
pub mod renderer;
pub mod selector;
pub mod session;

pub use detection::{
    BoundingBox, DetectedObject, DetectionFrame, DetectionResult, DetectionTrack,
    DEFAULT_FRAME_INTERVAL_S,
};
pub use playback::{Playback, SharedPlayback};
pub use renderer::{frame_ops, OverlayRenderer, RenderOutcome, SharedSurface, Viewport};
pub use selector::{bucket_key, select};
pub use session::OverlaySession;
