//! Peakline CLI: inspect waveform data, simulate playback and zoom headlessly.

mod svg;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;

use peakline_core::clock::{ManualClock, PlaybackClock};
use peakline_core::config::ViewerOptions;
use peakline_core::events::ViewEvent;
use peakline_core::markers::Markers;
use peakline_core::render::SceneGraph;
use peakline_core::view::axis::format_time;
use peakline_core::view::{Easing, ViewContext, WaveformView, ZoomAdapter};
use peakline_core::waveform::WaveformData;

// ─── Top-level CLI ───────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "peakline",
    about = "Waveform view toolkit: inspect peaks, replay marker events, plan zooms",
    version,
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Summarize a waveform file and its zoom levels
    Inspect(InspectArgs),
    /// Simulate playback and print marker events as JSON lines
    Events(EventsArgs),
    /// Print the steps of a zoom transition
    Zoom(ZoomArgs),
    /// Render a zoom view to SVG
    Render(RenderArgs),
}

// ─── Shared arguments (embedded in each subcommand) ──────────────

#[derive(Parser, Debug)]
struct SharedArgs {
    /// Waveform peak file (audiowaveform JSON)
    waveform: PathBuf,

    /// Viewer options JSON file
    #[arg(long)]
    options: Option<PathBuf>,

    /// View width in pixels
    #[arg(long, default_value_t = 1000.0)]
    width: f64,

    /// Show verbose output
    #[arg(short, long, default_value_t = false)]
    verbose: bool,
}

// ─── Inspect ─────────────────────────────────────────────────────

#[derive(Parser, Debug)]
struct InspectArgs {
    #[command(flatten)]
    shared: SharedArgs,

    /// Marker file ({"points": [...], "segments": [...]})
    #[arg(long)]
    markers: Option<PathBuf>,
}

// ─── Events ──────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(about = "Play through a waveform and print every marker and seek event")]
struct EventsArgs {
    #[command(flatten)]
    shared: SharedArgs,

    /// Marker file ({"points": [...], "segments": [...]})
    #[arg(long)]
    markers: PathBuf,

    /// Playback start (seconds)
    #[arg(long, default_value_t = 0.0)]
    start: f64,

    /// Playback end (seconds, default: end of waveform)
    #[arg(long)]
    end: Option<f64>,

    /// Clock tick (seconds)
    #[arg(long, default_value_t = 0.02)]
    step: f64,

    /// User seek during playback: "AT:TO" in seconds, repeatable
    #[arg(long = "seek", value_parser = parse_seek)]
    seeks: Vec<(f64, f64)>,
}

// ─── Zoom ────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, ValueEnum)]
enum EasingArg {
    Linear,
    EaseOut,
    EaseInOut,
}

impl From<EasingArg> for Easing {
    fn from(e: EasingArg) -> Self {
        match e {
            EasingArg::Linear => Easing::Linear,
            EasingArg::EaseOut => Easing::EaseOut,
            EasingArg::EaseInOut => Easing::EaseInOut,
        }
    }
}

#[derive(Parser, Debug)]
#[command(about = "Show how the view moves from one scale to another")]
struct ZoomArgs {
    #[command(flatten)]
    shared: SharedArgs,

    /// Target scale (samples per pixel)
    #[arg(long)]
    to: f64,

    /// Starting scale (default: finest zoom level)
    #[arg(long)]
    from: Option<f64>,

    /// Playhead time the zoom is anchored on (seconds)
    #[arg(long, default_value_t = 0.0)]
    at: f64,

    /// Where the anchor sits across the width, 0.0-1.0
    #[arg(long, default_value_t = 0.5)]
    position: f64,

    /// Animate instead of jumping
    #[arg(long, default_value_t = false)]
    animated: bool,

    /// Animation length (ms)
    #[arg(long, default_value_t = 200)]
    duration_ms: u64,

    /// Animation frame rate
    #[arg(long, default_value_t = 60)]
    frame_rate: u32,

    #[arg(long, value_enum, default_value_t = EasingArg::Linear)]
    easing: EasingArg,

    /// Print steps as JSON lines
    #[arg(long, default_value_t = false)]
    json: bool,
}

// ─── Render ──────────────────────────────────────────────────────

#[derive(Parser, Debug)]
struct RenderArgs {
    #[command(flatten)]
    shared: SharedArgs,

    /// Output SVG path
    #[arg(short, long)]
    output: PathBuf,

    /// Marker file to overlay
    #[arg(long)]
    markers: Option<PathBuf>,

    /// Playhead time (seconds)
    #[arg(long, default_value_t = 0.0)]
    at: f64,

    /// Scale (samples per pixel, default: finest zoom level)
    #[arg(long)]
    scale: Option<f64>,

    /// Draw the whole waveform as an overview instead
    #[arg(long, default_value_t = false)]
    overview: bool,
}

// ─── Main ────────────────────────────────────────────────────────

fn main() {
    let cli = Cli::parse();

    // Init logging
    let log_level = match &cli.command {
        Command::Inspect(a) if a.shared.verbose => "debug",
        Command::Events(a) if a.shared.verbose => "debug",
        Command::Zoom(a) if a.shared.verbose => "debug",
        Command::Render(a) if a.shared.verbose => "debug",
        _ => "info",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    let result = match cli.command {
        Command::Inspect(args) => run_inspect(args),
        Command::Events(args) => run_events(args),
        Command::Zoom(args) => run_zoom(args),
        Command::Render(args) => run_render(args),
    };

    if let Err(e) = result {
        log::error!("{:#}", e);
        std::process::exit(1);
    }
}

// ─── Helpers ─────────────────────────────────────────────────────

/// Parse a seek spec "AT:TO".
fn parse_seek(s: &str) -> std::result::Result<(f64, f64), String> {
    let (at, to) = s
        .split_once(':')
        .ok_or_else(|| format!("expected AT:TO, got {s:?}"))?;
    let parse = |v: &str| -> std::result::Result<f64, String> {
        let t: f64 = v.trim().parse().map_err(|_| format!("not a time: {v:?}"))?;
        if !t.is_finite() || t < 0.0 {
            return Err(format!("time must be a non-negative number: {v:?}"));
        }
        Ok(t)
    };
    Ok((parse(at)?, parse(to)?))
}

fn load_options(path: Option<&Path>) -> Result<ViewerOptions> {
    match path {
        Some(p) => ViewerOptions::load(p),
        None => Ok(ViewerOptions::default()),
    }
}

fn load_markers(path: Option<&Path>) -> Result<Markers> {
    match path {
        Some(p) => Markers::load(p),
        None => Ok(Markers::new()),
    }
}

fn load_waveform(shared: &SharedArgs) -> Result<(Arc<WaveformData>, ViewerOptions)> {
    if !shared.waveform.exists() {
        bail!("File not found: {}", shared.waveform.display());
    }
    if !(shared.width.is_finite() && shared.width >= 1.0) {
        bail!("Width must be at least 1 pixel, got {}", shared.width);
    }
    let data = WaveformData::load(&shared.waveform)?;
    let options = load_options(shared.options.as_deref())?;
    Ok((Arc::new(data), options))
}

#[derive(Serialize)]
struct EventLine<'a> {
    /// Playback time when the event fired
    at: f64,
    #[serde(flatten)]
    event: &'a ViewEvent,
}

#[derive(Serialize)]
struct StepLine {
    step: usize,
    scale: f64,
    frame_offset: u64,
    start_time: f64,
    end_time: f64,
}

// ─── Inspect runner ──────────────────────────────────────────────

fn run_inspect(args: InspectArgs) -> Result<()> {
    let (data, options) = load_waveform(&args.shared)?;
    let markers = load_markers(args.markers.as_deref())?;
    let width = args.shared.width;

    println!("File:              {}", args.shared.waveform.display());
    println!("Sample rate:       {} Hz", data.sample_rate);
    println!("Samples per pixel: {}", data.samples_per_pixel);
    println!("Buckets:           {}", data.peaks.len());
    println!("Duration:          {}", format_time(data.duration_s(), 2));

    let overview = WaveformView::overview(Arc::clone(&data), &options, width, options.overview_height as f64)
        .context("Failed to build overview")?;
    println!("Overview scale:    {} samples/pixel at {} px", overview.scale(), width);

    println!();
    println!("Zoom levels at {} px:", width);
    let levels = options.zoom_level_list()?;
    for &level in levels.levels() {
        if level < data.samples_per_pixel {
            println!("  {:>6}  below waveform resolution", level);
            continue;
        }
        let seconds = width * level as f64 / data.sample_rate as f64;
        println!("  {:>6}  {} visible", level, format_time(seconds, 2));
    }

    if args.markers.is_some() {
        println!();
        println!("Points:   {}", markers.points().len());
        for p in markers.points() {
            println!("  {}  {}  {}", format_time(p.time, 2), p.id, p.label_text);
        }
        println!("Segments: {}", markers.segments().len());
        for s in markers.segments() {
            println!(
                "  {} - {}  {}  {}",
                format_time(s.start_time, 2),
                format_time(s.end_time, 2),
                s.id,
                s.label_text
            );
        }
    }
    Ok(())
}

// ─── Events runner ───────────────────────────────────────────────

fn run_events(args: EventsArgs) -> Result<()> {
    let (data, options) = load_waveform(&args.shared)?;
    let markers = Markers::load(&args.markers)?;
    if !(args.step.is_finite() && args.step > 0.0) {
        bail!("Step must be positive, got {}", args.step);
    }
    let end = args.end.unwrap_or_else(|| data.duration_s());

    let mut view = WaveformView::zoomable(data, &options, args.shared.width, options.zoomview_height as f64)
        .context("Failed to build zoom view")?;
    let mut clock = ManualClock::new(args.start);
    let mut scene = SceneGraph::new();
    let mut events: Vec<ViewEvent> = Vec::new();
    let mut pending_seeks = args.seeks.clone();
    pending_seeks.sort_by(|a, b| a.0.total_cmp(&b.0));
    pending_seeks.reverse();

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let mut total = 0usize;
    let mut ticks = 0usize;

    while clock.current_time() <= end {
        let now = clock.current_time();
        {
            let mut ctx = ViewContext::new(&clock, &markers, &mut scene, &mut events);
            view.sync(&mut ctx);
        }
        total += write_events(&mut out, now, &mut events)?;

        if let Some(&(at, to)) = pending_seeks.last() {
            if now >= at {
                pending_seeks.pop();
                log::debug!("User seek at {:.3}s to {:.3}s", now, to);
                events.push(ViewEvent::UserSeek { time: to });
                total += write_events(&mut out, now, &mut events)?;
                clock.seek(to);
                view.reset_marker_tracks();
                continue;
            }
        }

        clock.advance(args.step);
        ticks += 1;
    }

    log::info!("{} events over {} clock ticks", total, ticks);
    Ok(())
}

fn write_events(out: &mut impl std::io::Write, at: f64, events: &mut Vec<ViewEvent>) -> Result<usize> {
    let n = events.len();
    for event in events.drain(..) {
        let line = serde_json::to_string(&EventLine { at, event: &event })?;
        writeln!(out, "{}", line)?;
    }
    Ok(n)
}

// ─── Zoom runner ─────────────────────────────────────────────────

fn run_zoom(args: ZoomArgs) -> Result<()> {
    let (data, options) = load_waveform(&args.shared)?;
    let markers = Markers::new();
    let width = args.shared.width;

    let mut view = WaveformView::zoomable(data, &options, width, options.zoomview_height as f64)
        .context("Failed to build zoom view")?;
    let clock = ManualClock::new(args.at);
    let mut scene = SceneGraph::new();
    let mut events: Vec<ViewEvent> = Vec::new();

    let adapter = if args.animated {
        ZoomAdapter::Animated {
            duration_ms: args.duration_ms,
            frame_rate: args.frame_rate,
            easing: args.easing.into(),
        }
    } else {
        ZoomAdapter::Static
    };

    let mut ctx = ViewContext::new(&clock, &markers, &mut scene, &mut events);
    if let Some(from) = args.from {
        view.set_zoom(ZoomAdapter::Static, from, args.position, &mut ctx)
            .with_context(|| format!("Cannot start at scale {}", from))?;
    }
    print_step(&view, 0, args.json)?;

    view.set_zoom(adapter, args.to, args.position, &mut ctx)
        .with_context(|| format!("Cannot zoom to scale {}", args.to))?;
    let mut step = 1;
    if view.is_transitioning() {
        while view.advance_frame(&mut ctx) {
            print_step(&view, step, args.json)?;
            step += 1;
        }
    }
    print_step(&view, step, args.json)?;
    Ok(())
}

fn print_step(view: &WaveformView, step: usize, json: bool) -> Result<()> {
    let (start_time, end_time) = view.visible_time_range();
    let line = StepLine {
        step,
        scale: view.display_scale(),
        frame_offset: view.frame_offset(),
        start_time,
        end_time,
    };
    if json {
        println!("{}", serde_json::to_string(&line)?);
    } else {
        println!(
            "{:>3}  scale {:>10.2}  offset {:>10}  {} - {}",
            line.step,
            line.scale,
            line.frame_offset,
            format_time(line.start_time, 2),
            format_time(line.end_time, 2)
        );
    }
    Ok(())
}

// ─── Render runner ───────────────────────────────────────────────

fn run_render(args: RenderArgs) -> Result<()> {
    let (data, options) = load_waveform(&args.shared)?;
    let markers = load_markers(args.markers.as_deref())?;
    let width = args.shared.width;

    let clock = ManualClock::new(args.at);
    let mut scene = SceneGraph::new();
    let mut events: Vec<ViewEvent> = Vec::new();
    let mut ctx = ViewContext::new(&clock, &markers, &mut scene, &mut events);

    let (mut view, height) = if args.overview {
        let height = options.overview_height as f64;
        let view = WaveformView::overview(data, &options, width, height)?;
        (view, height)
    } else {
        let height = options.zoomview_height as f64;
        let mut view = WaveformView::zoomable(data, &options, width, height)?;
        if let Some(scale) = args.scale {
            view.set_zoom(ZoomAdapter::Static, scale, 0.5, &mut ctx)
                .with_context(|| format!("Cannot render at scale {}", scale))?;
        }
        (view, height)
    };
    view.sync_time(args.at, &mut ctx);
    view.render(&mut ctx);
    drop(ctx);

    let mut writer = svg::SvgWriter::new(width, height);
    scene.replay(&mut writer);
    let doc = writer.finish();
    std::fs::write(&args.output, doc)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;
    log::info!(
        "Rendered {} at {} samples/pixel to {}",
        args.shared.waveform.display(),
        view.scale(),
        args.output.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_seek() {
        assert_eq!(parse_seek("2.5:10"), Ok((2.5, 10.0)));
        assert_eq!(parse_seek(" 1 : 0 "), Ok((1.0, 0.0)));
        assert!(parse_seek("2.5").is_err());
        assert!(parse_seek("a:1").is_err());
        assert!(parse_seek("-1:1").is_err());
    }

    #[test]
    fn test_cli_parses_zoom() {
        let cli = Cli::try_parse_from([
            "peakline", "zoom", "song.json", "--to", "2048", "--animated", "--easing", "ease-out",
        ])
        .unwrap();
        match cli.command {
            Command::Zoom(args) => {
                assert_eq!(args.to, 2048.0);
                assert!(args.animated);
                assert!(matches!(args.easing, EasingArg::EaseOut));
                assert_eq!(args.shared.width, 1000.0);
            }
            _ => panic!("expected zoom"),
        }
    }

    #[test]
    fn test_cli_parses_repeated_seeks() {
        let cli = Cli::try_parse_from([
            "peakline", "events", "song.json", "--markers", "m.json", "--seek", "1:5", "--seek", "6:0",
        ])
        .unwrap();
        match cli.command {
            Command::Events(args) => assert_eq!(args.seeks, vec![(1.0, 5.0), (6.0, 0.0)]),
            _ => panic!("expected events"),
        }
    }

    #[test]
    fn test_write_events_flattens_event() {
        let mut out = Vec::new();
        let mut events = vec![ViewEvent::UserSeek { time: 3.0 }];
        assert_eq!(write_events(&mut out, 1.5, &mut events).unwrap(), 1);
        assert!(events.is_empty());
        let line = String::from_utf8(out).unwrap();
        let value: serde_json::Value = serde_json::from_str(line.trim()).unwrap();
        assert_eq!(value["at"], 1.5);
        assert_eq!(value["event"], "user_seek");
        assert_eq!(value["time"], 3.0);
    }
}
