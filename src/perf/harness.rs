use std::cell::RefCell;
use std::rc::{Rc, Weak};

use log::{debug, info, trace};
use serde::Serialize;

use super::probe::{CanvasProbe, PixelSource};
use super::report::PerfReport;
use crate::config::HarnessConfig;
use crate::core::{FrameCallback, FrameInterceptor, Host, TimerId};
use crate::error::{Error, Result};

/// Lifecycle of one measurement run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HarnessState {
    Idle,
    Running,
    Reporting,
    /// Terminal; measure again with a new harness
    Stopped,
}

/// Counters accumulated while a run is in progress
#[derive(Debug, Default)]
pub struct PerfMeasurement {
    frame_times_ms: Vec<f64>,
    jank_count: u64,
    started_ms: f64,
    last_frame_ms: f64,
    probe: CanvasProbe,
}

impl PerfMeasurement {
    fn starting_at(now_ms: f64) -> Self {
        Self {
            started_ms: now_ms,
            last_frame_ms: now_ms,
            ..Self::default()
        }
    }

    /// Record a frame seen at `now_ms`, returns its delta
    pub fn record_frame(&mut self, now_ms: f64, jank_threshold_ms: f64) -> f64 {
        let delta = now_ms - self.last_frame_ms;
        self.frame_times_ms.push(delta);
        if delta > jank_threshold_ms {
            self.jank_count += 1;
        }
        self.last_frame_ms = now_ms;
        delta
    }

    pub fn frame_times_ms(&self) -> &[f64] {
        &self.frame_times_ms
    }

    pub fn frame_count(&self) -> usize {
        self.frame_times_ms.len()
    }

    pub fn jank_count(&self) -> u64 {
        self.jank_count
    }

    pub fn canvas_draws(&self) -> u64 {
        self.probe.draws()
    }

    fn report(&self, now_ms: f64) -> PerfReport {
        PerfReport::compute(
            &self.frame_times_ms,
            self.jank_count,
            (now_ms - self.started_ms).max(0.0),
            self.probe.draws(),
            self.probe.samples(),
        )
    }
}

struct HarnessInner {
    config: HarnessConfig,
    state: HarnessState,
    measurement: PerfMeasurement,
    pixels: Option<Rc<dyn PixelSource>>,
    /// Interceptor displaced by ours, put back on uninstall
    displaced: Option<Option<Rc<dyn FrameInterceptor>>>,
    probe_timer: Option<TimerId>,
    window_timer: Option<TimerId>,
    report: Option<PerfReport>,
}

/// Observes frame callbacks for the owning harness and forwards them unchanged
struct FrameRecorder {
    inner: Weak<RefCell<HarnessInner>>,
    /// Interceptor installed before ours; still sees every callback
    next: Option<Rc<dyn FrameInterceptor>>,
}

impl FrameInterceptor for FrameRecorder {
    fn wrap(&self, callback: FrameCallback) -> FrameCallback {
        let callback = match &self.next {
            Some(next) => next.wrap(callback),
            None => callback,
        };
        let inner = self.inner.clone();
        Box::new(move |host, timestamp| {
            if let Some(inner) = inner.upgrade() {
                let mut inner = inner.borrow_mut();
                if inner.state == HarnessState::Running {
                    let threshold = inner.config.jank_threshold_ms;
                    let delta = inner.measurement.record_frame(host.now_ms(), threshold);
                    trace!("perf: frame delta {:.2}ms", delta);
                }
            }
            callback(host, timestamp);
        })
    }
}

/// Measures render-loop health by intercepting frame scheduling
///
/// Cloning yields another handle to the same run.
#[derive(Clone)]
pub struct PerfHarness {
    inner: Rc<RefCell<HarnessInner>>,
}

impl PerfHarness {
    pub fn new(config: HarnessConfig) -> Self {
        Self {
            inner: Rc::new(RefCell::new(HarnessInner {
                config,
                state: HarnessState::Idle,
                measurement: PerfMeasurement::default(),
                pixels: None,
                displaced: None,
                probe_timer: None,
                window_timer: None,
                report: None,
            })),
        }
    }

    /// Surface the canvas probe samples while running
    pub fn with_pixel_source(self, pixels: Rc<dyn PixelSource>) -> Self {
        self.inner.borrow_mut().pixels = Some(pixels);
        self
    }

    /// Install the frame recorder and arm the probe and window timers
    pub fn start(&self, host: &mut Host) -> Result<()> {
        let state = self.state();
        if state != HarnessState::Idle {
            return Err(Error::HarnessNotIdle(state));
        }

        let recorder = Rc::new(FrameRecorder {
            inner: Rc::downgrade(&self.inner),
            next: host.frame_interceptor(),
        });
        let displaced = host.install_frame_interceptor(recorder);

        let (probe_interval, window) = {
            let inner = self.inner.borrow();
            (inner.config.probe_interval_ms, inner.config.window_ms)
        };

        let weak = Rc::downgrade(&self.inner);
        let probe_timer = host.set_interval(
            probe_interval,
            Box::new(move |_| {
                if let Some(inner) = weak.upgrade() {
                    PerfHarness { inner }.sample_canvas();
                }
            }),
        );

        let weak = Rc::downgrade(&self.inner);
        let window_timer = host.set_timeout(
            window,
            Box::new(move |host| {
                if let Some(inner) = weak.upgrade() {
                    PerfHarness { inner }.finish(host);
                }
            }),
        );

        let mut inner = self.inner.borrow_mut();
        inner.measurement = PerfMeasurement::starting_at(host.now_ms());
        inner.displaced = Some(displaced);
        inner.probe_timer = Some(probe_timer);
        inner.window_timer = Some(window_timer);
        inner.report = None;
        inner.state = HarnessState::Running;

        info!("perf: measuring for {:.1}s", window / 1000.0);
        Ok(())
    }

    fn sample_canvas(&self) {
        let mut inner = self.inner.borrow_mut();
        if inner.state != HarnessState::Running {
            return;
        }
        let Some(pixels) = inner.pixels.clone() else {
            return;
        };

        let region = inner.config.probe_region;
        match inner.measurement.probe.sample(pixels.as_ref(), region) {
            Ok(true) => trace!("perf: canvas changed"),
            Ok(false) => {}
            Err(e) => debug!("perf: canvas probe skipped: {}", e),
        }
    }

    /// Manual stop; returns the report of the run it ended
    pub fn stop(&self, host: &mut Host) -> Option<PerfReport> {
        self.finish(host)
    }

    /// End a running measurement: uninstall, cancel timers, compute the report
    /// Does nothing unless running
    pub fn finish(&self, host: &mut Host) -> Option<PerfReport> {
        if self.state() != HarnessState::Running {
            return None;
        }

        self.inner.borrow_mut().state = HarnessState::Reporting;
        self.uninstall(host);

        let report = {
            let mut inner = self.inner.borrow_mut();
            let report = inner.measurement.report(host.now_ms());
            inner.report = Some(report.clone());
            inner.state = HarnessState::Stopped;
            report
        };

        info!(
            "perf: {} frames, {:.1} fps, {:.1}% jank, rated {:?}",
            report.frame_count, report.avg_fps, report.jank_rate, report.rating
        );
        Some(report)
    }

    /// Put back the displaced interceptor and release both timers
    fn uninstall(&self, host: &mut Host) {
        let (displaced, timers) = {
            let mut inner = self.inner.borrow_mut();
            (
                inner.displaced.take(),
                [inner.probe_timer.take(), inner.window_timer.take()],
            )
        };

        if let Some(previous) = displaced {
            host.restore_frame_interceptor(previous);
        }
        for timer in timers.into_iter().flatten() {
            host.clear_timer(timer);
        }
        debug!("perf: frame scheduling restored");
    }

    pub fn state(&self) -> HarnessState {
        self.inner.borrow().state
    }

    /// Report of the finished run, if any
    pub fn report(&self) -> Option<PerfReport> {
        self.inner.borrow().report.clone()
    }

    pub fn frame_count(&self) -> usize {
        self.inner.borrow().measurement.frame_count()
    }

    pub fn jank_count(&self) -> u64 {
        self.inner.borrow().measurement.jank_count()
    }

    pub fn canvas_draws(&self) -> u64 {
        self.inner.borrow().measurement.canvas_draws()
    }
}
