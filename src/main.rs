use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};
use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

use clip_overlay::cli::{Cli, Command, OverlayArgs, PerfArgs, ReplayArgs, TelemetryArgs};
use clip_overlay::config::AppConfig;
use clip_overlay::core::{Dimensions, Host, ManualClock, RenderLoop, SystemClock, TimeSource};
use clip_overlay::loaders::{load_detection_result, load_stats_recording};
use clip_overlay::overlay::{OverlayRenderer, OverlaySession, Playback, RenderOutcome};
use clip_overlay::perf::{PerfConsole, PerfHarness, PixelSource};
use clip_overlay::telemetry::{Metric, ProcStatsSource, ReplayStatsSource, StatsSource, TelemetrySampler};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter)).init();

    let config = cli.app_config().context("Failed to load configuration")?;

    match &cli.command {
        Command::Overlay(args) => run_overlay(&config, args),
        Command::Perf(args) => run_perf(&config, args),
        Command::Telemetry(args) => run_telemetry(&config, args),
        Command::Replay(args) => run_replay(&config, args),
    }
}

fn clip_name(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "clip".to_string())
}

// === overlay ===

fn run_overlay(config: &AppConfig, args: &OverlayArgs) -> Result<()> {
    let result = load_detection_result(&args.detections)?;
    let sample_times: Vec<f64> = result.detections.iter().map(|frame| frame.time_s).collect();

    let mut host = Host::new(Rc::new(ManualClock::new()), config.host.refresh_hz);
    let renderer = OverlayRenderer::with_size(args.surface, config.overlay.clone());
    let session = Rc::new(RefCell::new(OverlaySession::new(renderer)));
    {
        let mut session = session.borrow_mut();
        session.load_clip(clip_name(&args.detections));
        session.on_resize(args.surface);
        session.on_metadata(args.native);
        session.load_detections(result);
    }

    let playback = Playback::new(Rc::clone(&session), args.duration, config.overlay.time_update_hz);
    Playback::play(&playback, &mut host);
    host.run_for(args.duration * 1000.0 + 1000.0);
    info!(
        "Played {:.1}s with {} time updates",
        playback.borrow().position_s(),
        playback.borrow().updates()
    );

    println!("\n=== Overlay ({} on {}) ===", args.native, args.surface);
    if let Some(geometry) = session.borrow().renderer().geometry() {
        println!(
            "Draw area: {:.0}x{:.0} at ({:.0}, {:.0})",
            geometry.draw_width(),
            geometry.draw_height(),
            geometry.offset_x(),
            geometry.offset_y()
        );
    }

    for time_s in sample_times {
        match Playback::seek(&playback, &mut host, time_s) {
            RenderOutcome::Drawn { time_s, objects } => {
                let surface = session.borrow().surface();
                let canvas = surface.borrow();
                let labels: Vec<&str> = canvas.texts().iter().map(|run| run.text.as_str()).collect();
                println!("{:>7.2}s  {} boxes  [{}]", time_s, objects, labels.join(", "));
            }
            other => println!("{:>7.2}s  {:?}", time_s, other),
        }
    }
    Ok(())
}

// === perf ===

fn run_perf(config: &AppConfig, args: &PerfArgs) -> Result<()> {
    let clock: Rc<dyn TimeSource> = if args.realtime {
        Rc::new(SystemClock::new())
    } else {
        Rc::new(ManualClock::new())
    };
    let mut host = Host::new(clock, config.host.refresh_hz);

    let renderer = OverlayRenderer::with_size(Default::default(), config.overlay.clone());
    let session = Rc::new(RefCell::new(OverlaySession::new(renderer)));
    let surface: Rc<dyn PixelSource> = session.borrow().surface();

    let harness = PerfHarness::new(config.harness.clone()).with_pixel_source(surface);
    let mut console = PerfConsole::new();
    harness.start(&mut host)?;
    console.register(harness.clone());

    let mut playback = None;
    if let Some(path) = &args.detections {
        let result = load_detection_result(path)?;
        let native = result.frame_size().unwrap_or(Dimensions::new(1280, 720));
        {
            let mut session = session.borrow_mut();
            session.load_clip(clip_name(path));
            session.on_resize(Dimensions::new(800, 450));
            session.on_metadata(native);
            session.load_detections(result);
        }

        let duration_s = config.harness.window_ms / 1000.0;
        let clip = Playback::new(Rc::clone(&session), duration_s, config.overlay.time_update_hz);
        Playback::play(&clip, &mut host);
        playback = Some(clip);
    }

    let work_ms = args.work_ms;
    let render_loop = RenderLoop::start(&mut host, Box::new(move |host, _| host.spend(work_ms)));

    host.run_for(config.harness.window_ms + host.refresh_interval_ms());
    render_loop.stop(&mut host);
    if let Some(clip) = &playback {
        Playback::pause(clip, &mut host);
    }

    let report = console
        .stop(&mut host)
        .context("Measurement produced no report")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        report.print_summary();
    }
    Ok(())
}

// === telemetry ===

fn print_telemetry(sampler: &TelemetrySampler) {
    println!("\n=== Telemetry ({} samples, {} failed) ===", sampler.len(), sampler.failures());
    for (metric, reading) in sampler.gauges() {
        println!(
            "{:10} {:>8.1} {:>9}  {}",
            metric.name(),
            reading.value,
            reading.level.label(),
            sampler.sparkline(metric).to_blocks()
        );
    }
    if let Some(inference) = sampler.latest_snapshot().and_then(|snapshot| snapshot.inference) {
        println!(
            "inference: {} total, last on {}, {:.0}% coral",
            inference.total_inferences,
            inference.last_device.as_deref().unwrap_or("-"),
            inference.recent_coral_pct
        );
    }
}

fn sample_for(config: &AppConfig, host: &mut Host, source: Rc<dyn StatsSource>, polls: u32) -> TelemetrySampler {
    let sampler = TelemetrySampler::new(source, config.telemetry.clone());
    sampler.start(host);

    let period = config.telemetry.poll_interval_ms;
    host.run_for(period * f64::from(polls.saturating_sub(1)) + period / 2.0);
    sampler.stop(host);
    sampler
}

fn run_telemetry(config: &AppConfig, args: &TelemetryArgs) -> Result<()> {
    let mut host = Host::new(Rc::new(SystemClock::new()), config.host.refresh_hz);
    let source = Rc::new(ProcStatsSource::with_root(&args.proc_root));

    let sampler = sample_for(config, &mut host, source, args.samples);
    if sampler.is_empty() {
        warn!("No samples collected from {:?}", args.proc_root);
    }
    print_telemetry(&sampler);
    Ok(())
}

fn run_replay(config: &AppConfig, args: &ReplayArgs) -> Result<()> {
    let snapshots = load_stats_recording(&args.recording)?;
    let polls = u32::try_from(snapshots.len()).context("Recording too long")?;

    let mut host = Host::new(Rc::new(ManualClock::new()), config.host.refresh_hz);
    let source = Rc::new(ReplayStatsSource::new(snapshots));

    let sampler = sample_for(config, &mut host, source, polls);
    print_telemetry(&sampler);

    let cpu = sampler.sparkline(Metric::Cpu);
    info!("Replayed {} points, cpu peak {:.1}%", cpu.len(), cpu.max);
    Ok(())
}
