//! Main application state and UI layout.

use std::path::Path;
use std::sync::Arc;

use anyhow::Context as _;
use eframe::egui;
use peakline_core::clock::PlaybackClock;
use peakline_core::config::ViewerOptions;
use peakline_core::events::ViewEvent;
use peakline_core::markers::{Markers, Point, Segment};
use peakline_core::render::SceneGraph;
use peakline_core::view::axis::format_time;
use peakline_core::view::{ViewContext, WaveformView, ZoomAdapter};
use peakline_core::waveform::{WaveformData, DEFAULT_SAMPLES_PER_PIXEL};

use crate::painter::show_scene;
use crate::playback::WallClock;

const MAX_LOG_LINES: usize = 500;
const INITIAL_WIDTH: f64 = 1000.0;

// ─── Demo content ────────────────────────────────────────────────

/// Synthesized tone with a slow envelope, shown until a file is opened.
fn demo_waveform() -> WaveformData {
    let sample_rate: u32 = 22050;
    let seconds: u32 = 30;
    let samples: Vec<f32> = (0..sample_rate * seconds)
        .map(|i| {
            let t = i as f32 / sample_rate as f32;
            let envelope = (t * 0.7).sin().abs() * (0.3 + 0.7 * (t * 3.1).sin().abs());
            envelope * (t * 220.0 * std::f32::consts::TAU).sin()
        })
        .collect();
    WaveformData::from_samples(&samples, sample_rate, DEFAULT_SAMPLES_PER_PIXEL)
}

fn demo_markers() -> Markers {
    let mut markers = Markers::new();
    for (label, start, end) in [("intro", 0.5, 4.0), ("verse", 4.0, 12.5), ("chorus", 12.5, 20.0)] {
        if let Err(e) = markers.add_segment(Segment::new(label, start, end).with_label(label)) {
            log::warn!("Demo segment {}: {}", label, e);
        }
    }
    for (i, time) in [2.0, 8.0, 16.0, 24.0].into_iter().enumerate() {
        let point = Point::new(format!("cue{}", i + 1), time).with_label(format!("Cue {}", i + 1));
        if let Err(e) = markers.add_point(point) {
            log::warn!("Demo point at {}: {}", time, e);
        }
    }
    markers
}

// ─── View panes ──────────────────────────────────────────────────

/// A view and the scene it paints into.
struct ViewPane {
    view: WaveformView,
    scene: SceneGraph,
}

impl ViewPane {
    fn new(view: WaveformView) -> Self {
        Self {
            view,
            scene: SceneGraph::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pane {
    Overview,
    Zoom,
}

fn build_panes(
    source: &Arc<WaveformData>,
    options: &ViewerOptions,
    width: f64,
) -> anyhow::Result<(ViewPane, ViewPane)> {
    let overview = WaveformView::overview(
        source.clone(),
        options,
        width,
        options.overview_height as f64,
    )
    .context("Failed to create overview")?;
    let zoomview = WaveformView::zoomable(
        source.clone(),
        options,
        width,
        options.zoomview_height as f64,
    )
    .context("Failed to create zoom view")?;
    Ok((ViewPane::new(overview), ViewPane::new(zoomview)))
}

// ─── Main app ────────────────────────────────────────────────────

pub struct PeaklineApp {
    options: ViewerOptions,
    source: Arc<WaveformData>,
    source_name: String,
    markers: Markers,
    overview: ViewPane,
    zoomview: ViewPane,
    clock: WallClock,
    events: Vec<ViewEvent>,
    event_log: Vec<String>,
    /// Zoom view needs a full render on the next frame
    dirty: bool,
    status: Option<String>,
    show_log: bool,
}

impl PeaklineApp {
    pub fn new(_cc: &eframe::CreationContext<'_>) -> Self {
        let options = ViewerOptions::default();
        let source = Arc::new(demo_waveform());
        let (overview, zoomview) = match build_panes(&source, &options, INITIAL_WIDTH) {
            Ok(panes) => panes,
            Err(e) => {
                log::error!("{:#}", e);
                std::process::exit(1);
            }
        };
        Self {
            clock: WallClock::new(source.duration_s()),
            options,
            source,
            source_name: "demo tone".into(),
            markers: demo_markers(),
            overview,
            zoomview,
            events: Vec::new(),
            event_log: Vec::new(),
            dirty: true,
            status: None,
            show_log: true,
        }
    }

    fn pane_mut(&mut self, pane: Pane) -> &mut ViewPane {
        match pane {
            Pane::Overview => &mut self.overview,
            Pane::Zoom => &mut self.zoomview,
        }
    }

    fn report(&mut self, err: anyhow::Error) {
        log::error!("{:#}", err);
        self.status = Some(format!("{:#}", err));
    }

    /// Rebuild both views for the current source and options.
    fn rebuild(&mut self) -> anyhow::Result<()> {
        let width = self.zoomview.view.width();
        let (overview, zoomview) = build_panes(&self.source, &self.options, width)?;
        self.overview = overview;
        self.zoomview = zoomview;
        self.dirty = true;
        Ok(())
    }

    // ─── File loading ────────────────────────────────────────────

    fn open_waveform(&mut self, path: &Path) {
        let result = WaveformData::load(path).and_then(|data| {
            let previous = std::mem::replace(&mut self.source, Arc::new(data));
            self.rebuild().inspect_err(|_| self.source = previous)
        });
        match result {
            Ok(()) => {
                self.clock = WallClock::new(self.source.duration_s());
                self.source_name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                self.status = None;
                log::info!("Opened {} ({:.2}s)", path.display(), self.source.duration_s());
            }
            Err(e) => self.report(e),
        }
    }

    fn open_markers(&mut self, path: &Path) {
        match Markers::load(path) {
            Ok(markers) => {
                log::info!(
                    "Loaded {} points and {} segments from {}",
                    markers.points().len(),
                    markers.segments().len(),
                    path.display()
                );
                self.markers = markers;
                self.zoomview.view.reset_marker_tracks();
                self.dirty = true;
                self.status = None;
            }
            Err(e) => self.report(e),
        }
    }

    fn open_options(&mut self, path: &Path) {
        let result = ViewerOptions::load(path).and_then(|options| {
            let previous = std::mem::replace(&mut self.options, options);
            self.rebuild().inspect_err(|_| self.options = previous)
        });
        match result {
            Ok(()) => {
                self.status = None;
                log::info!("Applied options from {}", path.display());
            }
            Err(e) => self.report(e),
        }
    }

    // ─── View driving ────────────────────────────────────────────

    fn fit_width(&mut self, width: f64) {
        if (width - self.zoomview.view.width()).abs() < 1.0 {
            return;
        }
        let overview_height = self.overview.view.height();
        let zoom_height = self.zoomview.view.height();
        let result = self
            .overview
            .view
            .resize(width, overview_height)
            .and_then(|_| self.zoomview.view.resize(width, zoom_height));
        match result {
            Ok(()) => self.dirty = true,
            Err(e) => self.report(e.into()),
        }
    }

    /// Advance animation and playback for one frame, then refresh scenes.
    fn sync_views(&mut self) {
        let ViewPane { view, scene } = &mut self.zoomview;
        let mut ctx = ViewContext::new(&self.clock, &self.markers, scene, &mut self.events);
        if view.is_transitioning() {
            view.advance_frame(&mut ctx);
        }
        view.sync(&mut ctx);
        if self.dirty && !view.is_transitioning() {
            view.render(&mut ctx);
            self.dirty = false;
        }
        let visible = view.visible_time_range();

        let ViewPane { view, scene } = &mut self.overview;
        view.set_highlight(Some(visible));
        let mut ctx = ViewContext::new(&self.clock, &self.markers, scene, &mut self.events);
        view.sync(&mut ctx);
        view.render(&mut ctx);
    }

    fn zoom(&mut self, zoom_in: bool) {
        let ViewPane { view, scene } = &mut self.zoomview;
        let mut ctx = ViewContext::new(&self.clock, &self.markers, scene, &mut self.events);
        let result = if zoom_in {
            view.zoom_in(&mut ctx)
        } else {
            view.zoom_out(&mut ctx)
        };
        if let Err(e) = result {
            self.report(e.into());
        }
    }

    fn handle_pointer(&mut self, ui: &egui::Ui, response: &egui::Response, pane: Pane) {
        let (pressed, released, moved, pos) = ui.input(|i| {
            (
                i.pointer.primary_pressed(),
                i.pointer.primary_released(),
                i.pointer.delta() != egui::Vec2::ZERO,
                i.pointer.interact_pos(),
            )
        });
        let left = response.rect.left();
        let ViewPane { view, scene } = match pane {
            Pane::Overview => &mut self.overview,
            Pane::Zoom => &mut self.zoomview,
        };
        let mut ctx = ViewContext::new(&self.clock, &self.markers, scene, &mut self.events);

        if let Some(pos) = pos {
            let x = (pos.x - left) as f64;
            if pressed && response.hovered() {
                view.on_pointer_down(x, &mut ctx);
            } else if moved && view.is_dragging() {
                view.on_pointer_move(x, &mut ctx);
            }
        }
        if released && view.is_dragging() {
            view.on_pointer_up(&mut ctx);
        }

        if pane == Pane::Zoom && response.hovered() {
            let (command, scroll) = ui.input(|i| (i.modifiers.command, i.raw_scroll_delta.y));
            if command && scroll != 0.0 {
                self.zoom(scroll > 0.0);
            }
        }
    }

    /// Act on queued view events and append them to the log.
    fn apply_events(&mut self) {
        if self.events.is_empty() {
            return;
        }
        let now = self.clock.current_time();
        for event in std::mem::take(&mut self.events) {
            let line = match &event {
                ViewEvent::PointEnter(p) | ViewEvent::PointExit(p) => {
                    format!("{} {} {}", event.name(), p.id, p.label_text)
                }
                ViewEvent::SegmentEnter(s) | ViewEvent::SegmentExit(s) => {
                    format!("{} {} {}", event.name(), s.id, s.label_text)
                }
                ViewEvent::UserSeek { time } => {
                    self.clock.seek(*time);
                    self.zoomview.view.reset_marker_tracks();
                    format!("user_seek {}", format_time(*time, 2))
                }
                ViewEvent::ZoomUpdate {
                    previous_scale,
                    current_scale,
                } => {
                    self.dirty = true;
                    format!("zoom.update {:.0} -> {:.0}", previous_scale, current_scale)
                }
            };
            log::debug!("{}", line);
            self.event_log.push(format!("{}  {}", format_time(now, 2), line));
        }
        if self.event_log.len() > MAX_LOG_LINES {
            let excess = self.event_log.len() - MAX_LOG_LINES;
            self.event_log.drain(..excess);
        }
    }

    fn set_animated(&mut self, animated: bool) {
        let adapter = if animated {
            ZoomAdapter::animated()
        } else {
            ZoomAdapter::Static
        };
        self.pane_mut(Pane::Zoom).view.set_zoom_adapter(adapter);
    }
}

impl eframe::App for PeaklineApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if self.clock.finished() {
            self.clock.pause();
        }
        if ctx.input(|i| i.key_pressed(egui::Key::Space)) {
            self.clock.toggle();
        }

        // Top menu bar
        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.label(egui::RichText::new("Peakline").strong());
                ui.separator();

                ui.menu_button("File", |ui| {
                    if ui.button("Open Waveform...").clicked() {
                        ui.close_menu();
                        if let Some(path) = rfd::FileDialog::new()
                            .add_filter("Waveform data", &["json"])
                            .pick_file()
                        {
                            self.open_waveform(&path);
                        }
                    }
                    if ui.button("Open Markers...").clicked() {
                        ui.close_menu();
                        if let Some(path) = rfd::FileDialog::new()
                            .add_filter("Markers", &["json"])
                            .pick_file()
                        {
                            self.open_markers(&path);
                        }
                    }
                    if ui.button("Open Options...").clicked() {
                        ui.close_menu();
                        if let Some(path) = rfd::FileDialog::new()
                            .add_filter("Viewer options", &["json"])
                            .pick_file()
                        {
                            self.open_options(&path);
                        }
                    }
                });

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    match &self.status {
                        Some(msg) => {
                            ui.colored_label(egui::Color32::RED, msg);
                        }
                        None => {
                            ui.label(self.source_name.as_str());
                        }
                    }
                });
            });
        });

        // Bottom transport bar
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                let label = if self.clock.is_playing() { "Pause" } else { "Play" };
                if ui.button(label).clicked() {
                    self.clock.toggle();
                }
                ui.monospace(format!(
                    "{} / {}",
                    format_time(self.clock.current_time(), 2),
                    format_time(self.source.duration_s(), 2)
                ));
                ui.separator();

                if ui.button("Zoom In").clicked() {
                    self.zoom(true);
                }
                if ui.button("Zoom Out").clicked() {
                    self.zoom(false);
                }
                let mut animated = matches!(
                    self.zoomview.view.zoom_adapter(),
                    ZoomAdapter::Animated { .. }
                );
                if ui.checkbox(&mut animated, "Animated").changed() {
                    self.set_animated(animated);
                }
                ui.label(format!("{:.0} samples/px", self.zoomview.view.scale()));
                ui.separator();

                if ui.selectable_label(self.show_log, "Events").clicked() {
                    self.show_log = !self.show_log;
                }
            });
        });

        // Event log panel
        if self.show_log {
            egui::TopBottomPanel::bottom("log_panel")
                .resizable(true)
                .min_height(80.0)
                .default_height(140.0)
                .show(ctx, |ui| {
                    egui::ScrollArea::vertical().stick_to_bottom(true).show(ui, |ui| {
                        for line in &self.event_log {
                            ui.monospace(line);
                        }
                        if self.event_log.is_empty() {
                            ui.weak("No events yet");
                        }
                    });
                });
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            self.fit_width(ui.available_width() as f64);
            self.sync_views();

            let background = egui::Color32::from_gray(250);
            let height = self.overview.view.height() as f32;
            let response = show_scene(ui, &self.overview.scene, height, background);
            self.handle_pointer(ui, &response, Pane::Overview);

            ui.add_space(8.0);

            let height = self.zoomview.view.height() as f32;
            let response = show_scene(ui, &self.zoomview.scene, height, background);
            self.handle_pointer(ui, &response, Pane::Zoom);
        });

        self.apply_events();

        if self.clock.is_playing()
            || self.zoomview.view.is_transitioning()
            || self.zoomview.view.is_dragging()
            || self.overview.view.is_dragging()
            || self.dirty
        {
            ctx.request_repaint();
        }
    }
}
