use std::cell::{Cell, RefCell};
use std::rc::Rc;

use clip_overlay::config::{HarnessConfig, OverlayConfig, ProbeRegion};
use clip_overlay::core::{
    Canvas, Dimensions, DrawOp, FrameCallback, FrameInterceptor, Host, ManualClock, RenderLoop, Rgba,
};
use clip_overlay::overlay::{
    BoundingBox, DetectedObject, DetectionFrame, DetectionResult, OverlayRenderer, OverlaySession,
};
use clip_overlay::perf::{
    FrameTimeStats, HarnessState, PerfConsole, PerfHarness, PerfMeasurement, PixelSource, Rating,
};
use clip_overlay::{Error, Result};

/// Mock interceptor counting the callbacks it wraps
#[derive(Default)]
struct CountingInterceptor {
    wrapped: Cell<u32>,
}

impl FrameInterceptor for CountingInterceptor {
    fn wrap(&self, callback: FrameCallback) -> FrameCallback {
        self.wrapped.set(self.wrapped.get() + 1);
        callback
    }
}

/// Mock surface that refuses every read
struct TaintedSurface;

impl PixelSource for TaintedSurface {
    fn read_region(&self, _region: ProbeRegion) -> Result<Vec<u8>> {
        Err(Error::PixelRead("cross-origin".into()))
    }
}

fn window(ms: f64) -> HarnessConfig {
    HarnessConfig {
        window_ms: ms,
        ..HarnessConfig::default()
    }
}

fn manual_host() -> Host {
    Host::new(Rc::new(ManualClock::new()), 60.0)
}

fn busy_loop(host: &mut Host, work_ms: f64) -> RenderLoop {
    RenderLoop::start(host, Box::new(move |host, _| host.spend(work_ms)))
}

// ============================================================================
// Statistics
// ============================================================================

#[test]
fn test_percentiles_from_sorted_list() {
    let stats = FrameTimeStats::from_samples(&[20.0, 50.0, 10.0, 15.0, 12.0]);

    assert_eq!(stats.p50_ms, 15.0);
    assert_eq!(stats.p95_ms, 50.0);
    assert_eq!(stats.p99_ms, 50.0);
    assert_eq!(stats.min_ms, 10.0);
    assert_eq!(stats.max_ms, 50.0);
    assert_eq!(stats.avg_ms, 21.4);
}

#[test]
fn test_jank_boundary() {
    let mut measurement = PerfMeasurement::default();

    measurement.record_frame(16.67, 16.67);
    assert_eq!(measurement.jank_count(), 0);

    measurement.record_frame(16.67 + 16.68, 16.67);
    assert_eq!(measurement.jank_count(), 1);
    assert_eq!(measurement.frame_count(), 2);
}

// ============================================================================
// Measurement runs
// ============================================================================

#[test]
fn test_healthy_loop_rates_excellent() {
    let mut host = manual_host();
    let harness = PerfHarness::new(window(1000.0));

    harness.start(&mut host).unwrap();
    let render_loop = busy_loop(&mut host, 2.0);
    host.run_for(1500.0);

    assert_eq!(harness.state(), HarnessState::Stopped);
    let report = harness.report().expect("window elapsed");

    assert!((59..=60).contains(&report.frame_count), "{} frames", report.frame_count);
    assert_eq!(report.jank_count, 0);
    assert_eq!(report.duration_ms, 1000.0);
    assert!((report.frame_time.avg_ms - 16.667).abs() < 0.01);
    assert_eq!(report.rating, Rating::Excellent);

    // The loop keeps running after measurement ends
    assert!(render_loop.frames() > report.frame_count as u64);
}

#[test]
fn test_slow_loop_is_janky() {
    let mut host = manual_host();
    let harness = PerfHarness::new(window(1000.0));

    harness.start(&mut host).unwrap();
    busy_loop(&mut host, 20.0);
    host.run_for(1000.0);

    let report = harness.report().unwrap();

    // Only the first frame fits the budget, then every other refresh is missed
    assert_eq!(report.frame_count, 30);
    assert_eq!(report.jank_count, 29);
    assert!((report.frame_time.p50_ms - 33.333).abs() < 0.01);
    assert_eq!(report.rating, Rating::Sluggish);
}

#[test]
fn test_zero_frames_report_is_zero() {
    let mut host = manual_host();
    let harness = PerfHarness::new(window(1000.0));

    harness.start(&mut host).unwrap();
    host.run_for(1000.0);

    let report = harness.report().unwrap();
    assert_eq!(report.frame_count, 0);
    assert_eq!(report.avg_fps, 0.0);
    assert_eq!(report.jank_rate, 0.0);
    assert_eq!(report.frame_time.p50_ms, 0.0);
    assert_eq!(report.frame_time.p95_ms, 0.0);
    assert_eq!(report.frame_time.p99_ms, 0.0);
    assert_eq!(report.rating, Rating::Poor);
}

#[test]
fn test_measurement_does_not_change_loop() {
    let mut plain_host = manual_host();
    let plain = busy_loop(&mut plain_host, 5.0);
    plain_host.run_for(2000.0);

    let mut measured_host = manual_host();
    let harness = PerfHarness::new(window(1000.0));
    harness.start(&mut measured_host).unwrap();
    let measured = busy_loop(&mut measured_host, 5.0);
    measured_host.run_for(2000.0);

    assert_eq!(plain.frames(), measured.frames());
    assert_eq!(plain_host.refreshes(), measured_host.refreshes());
}

// ============================================================================
// Install and restore
// ============================================================================

#[test]
fn test_restores_previous_interceptor() {
    let mut host = manual_host();
    let existing = Rc::new(CountingInterceptor::default());
    host.install_frame_interceptor(existing.clone());

    let harness = PerfHarness::new(window(500.0));
    harness.start(&mut host).unwrap();
    busy_loop(&mut host, 1.0);
    host.run_for(500.0);

    // Chained while measuring
    let frames = harness.frame_count();
    assert!(frames > 0);
    assert_eq!(existing.wrapped.get() as usize, frames + 1);

    // Back in charge afterwards, harness sees nothing new
    host.run_for(500.0);
    assert!(host.has_frame_interceptor());
    assert_eq!(harness.frame_count(), frames);
    assert!(existing.wrapped.get() as usize > frames + 1);
}

#[test]
fn test_no_side_effects_after_stop() {
    let mut host = manual_host();
    let harness = PerfHarness::new(window(10_000.0));

    harness.start(&mut host).unwrap();
    busy_loop(&mut host, 1.0);
    host.run_for(300.0);

    let report = harness.stop(&mut host).unwrap();
    assert_eq!(report.duration_ms, 300.0);
    assert!(!host.has_frame_interceptor());
    assert_eq!(host.active_timers(), 0);

    host.run_for(15_000.0);
    assert_eq!(harness.frame_count(), report.frame_count);
    assert_eq!(harness.report(), Some(report));
}

// ============================================================================
// Canvas probe
// ============================================================================

#[test]
fn test_probe_counts_visual_changes() {
    let mut host = manual_host();
    let surface = Rc::new(RefCell::new(Canvas::new(20, 20)));
    let harness = PerfHarness::new(window(1000.0)).with_pixel_source(surface.clone());

    harness.start(&mut host).unwrap();

    let canvas = surface.clone();
    host.set_timeout(250.0, Box::new(move |_| canvas.borrow_mut().apply(&DrawOp::Clear(Rgba::WHITE))));
    let canvas = surface.clone();
    host.set_timeout(550.0, Box::new(move |_| canvas.borrow_mut().apply(&DrawOp::Clear(Rgba::BLACK))));
    // Outside the probed patch
    let canvas = surface.clone();
    host.set_timeout(
        750.0,
        Box::new(move |_| {
            canvas.borrow_mut().apply(&DrawOp::FillRect {
                x: 15.0,
                y: 15.0,
                width: 5.0,
                height: 5.0,
                color: Rgba::WHITE,
            })
        }),
    );

    host.run_for(1000.0);

    let report = harness.report().unwrap();
    assert_eq!(report.canvas_draws, 2);
    assert_eq!(report.canvas_samples, 10);
}

/// Portrait clip on a landscape surface; the box's left edge crosses the centre
fn pillarboxed_session() -> Rc<RefCell<OverlaySession>> {
    let mut session = OverlaySession::new(OverlayRenderer::with_size(
        Dimensions::new(800, 450),
        OverlayConfig::default(),
    ));
    session.load_clip("portrait");
    session.on_resize(Dimensions::new(800, 450));
    session.on_metadata(Dimensions::new(1080, 1920));
    Rc::new(RefCell::new(session))
}

fn centre_box_result() -> DetectionResult {
    DetectionResult {
        detections: vec![DetectionFrame {
            time_s: 0.0,
            objects: vec![DetectedObject {
                label: "person".to_string(),
                score: 0.9,
                bbox: BoundingBox::new(540.0, 0.0, 200.0, 1920.0),
            }],
        }],
        frame_interval: 2.0,
        frame_width: 1080,
        frame_height: 1920,
    }
}

fn overlay_draws(region: ProbeRegion) -> u64 {
    let mut host = manual_host();
    let session = pillarboxed_session();
    let surface = session.borrow().surface();
    let harness = PerfHarness::new(HarnessConfig {
        probe_region: region,
        ..window(1000.0)
    })
    .with_pixel_source(surface);

    harness.start(&mut host).unwrap();
    let shown = session.clone();
    host.set_timeout(250.0, Box::new(move |_| {
        shown.borrow_mut().load_detections(centre_box_result());
    }));
    let hidden = session.clone();
    host.set_timeout(550.0, Box::new(move |_| {
        hidden.borrow_mut().set_enabled(false);
    }));
    host.run_for(1000.0);

    harness.report().unwrap().canvas_draws
}

#[test]
fn test_default_patch_sees_letterboxed_overlay() {
    assert_eq!(overlay_draws(ProbeRegion::default()), 2);
    // The corner patch sits in the pillar bars
    assert_eq!(overlay_draws(ProbeRegion::top_left(0, 0, 10, 10)), 0);
}

#[test]
fn test_unreadable_surface_is_ignored() {
    let mut host = manual_host();
    let harness = PerfHarness::new(window(1000.0)).with_pixel_source(Rc::new(TaintedSurface));

    harness.start(&mut host).unwrap();
    busy_loop(&mut host, 1.0);
    host.run_for(1000.0);

    let report = harness.report().unwrap();
    assert_eq!(report.canvas_draws, 0);
    assert_eq!(report.canvas_samples, 0);
    assert!(report.frame_count > 0);
}

// ============================================================================
// Console entry points
// ============================================================================

#[test]
fn test_console_force_stop() {
    let mut host = manual_host();
    let mut console = PerfConsole::new();
    let harness = PerfHarness::new(window(10_000.0));

    harness.start(&mut host).unwrap();
    console.register(harness.clone());
    busy_loop(&mut host, 1.0);
    host.run_for(2000.0);

    assert!(console.last_report().is_none());
    assert_eq!(console.state(), Some(HarnessState::Running));

    let report = console.stop(&mut host).unwrap();
    assert_eq!(console.state(), Some(HarnessState::Stopped));
    assert_eq!(console.last_report(), Some(report.clone()));

    // Stopping again yields the same report
    assert_eq!(console.stop(&mut host), Some(report));
}

#[test]
fn test_report_serializes() {
    let mut host = manual_host();
    let harness = PerfHarness::new(window(100.0));
    harness.start(&mut host).unwrap();
    host.run_for(100.0);

    let json = serde_json::to_value(harness.report().unwrap()).unwrap();
    assert_eq!(json["frame_count"], 0);
    assert_eq!(json["rating"], "Poor");
    assert!(json["generated_at"].is_string());
}
