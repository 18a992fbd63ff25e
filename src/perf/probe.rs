use std::cell::RefCell;

use crate::config::ProbeRegion;
use crate::core::Canvas;
use crate::error::{Error, Result};

/// Readable pixel surface
pub trait PixelSource {
    /// RGBA bytes of `region`, clipped to the surface
    fn read_region(&self, region: ProbeRegion) -> Result<Vec<u8>>;
}

impl PixelSource for RefCell<Canvas> {
    fn read_region(&self, region: ProbeRegion) -> Result<Vec<u8>> {
        let canvas = self
            .try_borrow()
            .map_err(|e| Error::PixelRead(format!("surface busy: {}", e)))?;
        let (width, height) = canvas.dimensions();
        let (x, y) = region.origin_in(width, height);
        Ok(canvas.read_region(x, y, region.width, region.height))
    }
}

/// Coarse redraw counter over a small pixel patch
///
/// The first sample is a baseline. Every later sample that differs from the
/// previous one counts as one draw, so several redraws between samples
/// collapse into one and a redraw with identical pixels is missed.
#[derive(Debug, Default)]
pub struct CanvasProbe {
    last: Option<Vec<u8>>,
    draws: u64,
    samples: u64,
}

impl CanvasProbe {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take one sample; read errors leave the counters untouched
    pub fn sample(&mut self, source: &dyn PixelSource, region: ProbeRegion) -> Result<bool> {
        let patch = source.read_region(region)?;
        self.samples += 1;

        let changed = match &self.last {
            Some(last) => *last != patch,
            None => false,
        };
        if changed {
            self.draws += 1;
        }
        self.last = Some(patch);
        Ok(changed)
    }

    pub fn draws(&self) -> u64 {
        self.draws
    }

    pub fn samples(&self) -> u64 {
        self.samples
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{DrawOp, Rgba};

    struct Unreadable;

    impl PixelSource for Unreadable {
        fn read_region(&self, _region: ProbeRegion) -> Result<Vec<u8>> {
            Err(Error::PixelRead("tainted".into()))
        }
    }

    #[test]
    fn test_counts_changes_after_baseline() {
        let surface = RefCell::new(Canvas::new(20, 20));
        let region = ProbeRegion::default();
        let mut probe = CanvasProbe::new();

        assert!(!probe.sample(&surface, region).unwrap());
        assert!(!probe.sample(&surface, region).unwrap());

        surface.borrow_mut().apply(&DrawOp::Clear(Rgba::WHITE));
        assert!(probe.sample(&surface, region).unwrap());
        assert!(!probe.sample(&surface, region).unwrap());

        assert_eq!(probe.draws(), 1);
        assert_eq!(probe.samples(), 4);
    }

    #[test]
    fn test_read_error_is_not_counted() {
        let mut probe = CanvasProbe::new();
        assert!(probe.sample(&Unreadable, ProbeRegion::default()).is_err());
        assert_eq!(probe.samples(), 0);
        assert_eq!(probe.draws(), 0);
    }

    #[test]
    fn test_busy_surface_is_read_error() {
        let surface = RefCell::new(Canvas::new(4, 4));
        let _writer = surface.borrow_mut();
        assert!(matches!(
            surface.read_region(ProbeRegion::default()),
            Err(Error::PixelRead(_))
        ));
    }
}
