//! Overview and zoomable waveform views.
//!
//! A view owns its scale and frame offset and is their only writer. Collaborators
//! (clock, markers, renderer, event sink) are borrowed per call through
//! [`ViewContext`].

use std::sync::Arc;

use super::axis;
use super::drag::{DragMode, DragSeekHandler};
use super::mapper::CoordinateMapper;
use super::zoom::{ZoomAdapter, ZoomLevels, ZoomStep, ZoomSteps, ZoomTransition};
use crate::clock::PlaybackClock;
use crate::color::Color;
use crate::config::ViewerOptions;
use crate::error::{validate_scale, PeaklineError, Result};
use crate::events::{EventSink, ViewEvent};
use crate::markers::{Markers, PointEvents, PointTrack, SegmentEvents, SegmentTrack, TrackVariant};
use crate::render::{DrawContext, Layer, SceneRenderer};
use crate::waveform::WaveformData;

/// Distance the playhead is kept from the right edge during auto-scroll.
const AUTO_SCROLL_MARGIN_PX: f64 = 100.0;
const AXIS_TICK_HEIGHT: f32 = 6.0;
const LABEL_FONT_OFFSET: f32 = 12.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewKind {
    /// Scale chosen from the zoom levels; scrolls with playback.
    Zoomable,
    /// Whole waveform fitted to the width; zoom requests are rejected.
    Overview,
}

/// Collaborators borrowed for one view operation.
pub struct ViewContext<'a> {
    pub clock: &'a dyn PlaybackClock,
    pub markers: &'a Markers,
    pub renderer: &'a mut dyn SceneRenderer,
    pub sink: &'a mut dyn EventSink,
}

impl<'a> ViewContext<'a> {
    pub fn new(
        clock: &'a dyn PlaybackClock,
        markers: &'a Markers,
        renderer: &'a mut dyn SceneRenderer,
        sink: &'a mut dyn EventSink,
    ) -> Self {
        Self {
            clock,
            markers,
            renderer,
            sink,
        }
    }
}

pub struct WaveformView {
    kind: ViewKind,
    /// Peaks as loaded
    source: Arc<WaveformData>,
    /// Peaks resampled to the committed scale
    data: Arc<WaveformData>,
    /// Display scale and frame offset. Differs from `scale` mid-transition.
    mapper: CoordinateMapper,
    /// Target of the last accepted zoom request
    scale: f64,
    width: f64,
    height: f64,
    options: ViewerOptions,
    zoom_levels: ZoomLevels,
    transition: Option<ZoomSteps>,
    drag: DragSeekHandler,
    points: PointTrack,
    segments: SegmentTrack,
    emit_marker_events: bool,
    playhead_time: f64,
    highlight: Option<(f64, f64)>,
}

impl std::fmt::Debug for WaveformView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WaveformView")
            .field("kind", &self.kind)
            .field("scale", &self.scale)
            .field("display_scale", &self.mapper.scale())
            .field("frame_offset", &self.mapper.frame_offset())
            .field("width", &self.width)
            .field("height", &self.height)
            .field("transitioning", &self.transition.is_some())
            .finish()
    }
}

impl WaveformView {
    /// Zoom view starting at the finest configured level the data can show.
    pub fn zoomable(
        source: Arc<WaveformData>,
        options: &ViewerOptions,
        width: f64,
        height: f64,
    ) -> Result<Self> {
        let mut zoom_levels = options.zoom_level_list()?;
        zoom_levels.retain_at_least(source.samples_per_pixel);
        let scale = zoom_levels.current();
        let data = Arc::new(source.resample(scale)?);
        let mapper = CoordinateMapper::new(scale as f64, source.sample_rate, source.total_frames())?;
        log::debug!(
            "Zoom view {}x{} at {} samples/pixel, levels {:?}",
            width,
            height,
            scale,
            zoom_levels.levels()
        );
        Ok(Self::build(ViewKind::Zoomable, source, data, mapper, options, zoom_levels, width, height))
    }

    /// Overview fitting the whole waveform into `width`.
    pub fn overview(
        source: Arc<WaveformData>,
        options: &ViewerOptions,
        width: f64,
        height: f64,
    ) -> Result<Self> {
        let scale = fit_scale(&source, width);
        let data = Arc::new(source.resample(scale)?);
        let mapper = CoordinateMapper::new(scale as f64, source.sample_rate, source.total_frames())?;
        let zoom_levels = ZoomLevels::new(vec![scale])?;
        let mut view = Self::build(ViewKind::Overview, source, data, mapper, options, zoom_levels, width, height);
        view.emit_marker_events = false;
        Ok(view)
    }

    #[allow(clippy::too_many_arguments)]
    fn build(
        kind: ViewKind,
        source: Arc<WaveformData>,
        data: Arc<WaveformData>,
        mapper: CoordinateMapper,
        options: &ViewerOptions,
        zoom_levels: ZoomLevels,
        width: f64,
        height: f64,
    ) -> Self {
        let width = width.max(0.0);
        Self {
            kind,
            source,
            data,
            scale: mapper.scale(),
            mapper,
            width,
            height: height.max(0.0),
            options: options.clone(),
            zoom_levels,
            transition: None,
            drag: DragSeekHandler::new(width),
            points: PointTrack::new(),
            segments: SegmentTrack::new(),
            emit_marker_events: true,
            playhead_time: 0.0,
            highlight: None,
        }
    }

    // ─── Accessors ───────────────────────────────────────────────

    pub fn kind(&self) -> ViewKind {
        self.kind
    }

    /// Committed scale: the target of the last accepted zoom.
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Scale currently on screen. Equals [`Self::scale`] unless transitioning.
    pub fn display_scale(&self) -> f64 {
        self.mapper.scale()
    }

    pub fn frame_offset(&self) -> u64 {
        self.mapper.frame_offset()
    }

    pub fn mapper(&self) -> &CoordinateMapper {
        &self.mapper
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn zoom_levels(&self) -> &ZoomLevels {
        &self.zoom_levels
    }

    pub fn playhead_time(&self) -> f64 {
        self.playhead_time
    }

    pub fn is_transitioning(&self) -> bool {
        self.transition.is_some()
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_dragging()
    }

    pub fn visible_time_range(&self) -> (f64, f64) {
        self.mapper.visible_time_range(self.width)
    }

    pub fn drag_mode(&self) -> DragMode {
        match self.kind {
            ViewKind::Zoomable => self.options.drag_mode,
            ViewKind::Overview => DragMode::Seek,
        }
    }

    /// Adapter used by [`Self::zoom_in`] and [`Self::zoom_out`].
    pub fn set_zoom_adapter(&mut self, adapter: ZoomAdapter) {
        self.options.zoom_adapter = adapter;
    }

    pub fn zoom_adapter(&self) -> ZoomAdapter {
        self.options.zoom_adapter
    }

    /// Enable or disable marker enter/exit events from [`Self::sync_time`].
    /// Overviews start with them off, so only one view reports crossings.
    pub fn set_marker_events(&mut self, enabled: bool) {
        self.emit_marker_events = enabled;
        if !enabled {
            self.points.clear();
            self.segments.clear();
        }
    }

    // ─── Geometry ────────────────────────────────────────────────

    /// Change the view size. Finishes any zoom transition; overviews refit.
    pub fn resize(&mut self, width: f64, height: f64) -> Result<()> {
        self.finish_transition();
        let width = width.max(0.0);
        if self.kind == ViewKind::Overview {
            let scale = fit_scale(&self.source, width);
            let data = self.source.resample(scale)?;
            self.mapper = self.mapper.with_scale(scale as f64)?;
            self.data = Arc::new(data);
            self.scale = scale as f64;
            self.zoom_levels = ZoomLevels::new(vec![scale])?;
        }
        self.width = width;
        self.height = height.max(0.0);
        self.drag.set_width(width);
        self.clamp_offset();
        log::debug!("Resized {:?} view to {}x{}", self.kind, self.width, self.height);
        Ok(())
    }

    /// Set the first visible frame, clamped so the window stays inside the waveform.
    pub fn set_frame_offset(&mut self, frame_offset: u64) {
        self.finish_transition();
        let offset = self.mapper.clamp_frame_offset(frame_offset, self.width);
        self.mapper.set_frame_offset(offset);
    }

    /// Scroll so `time` is at the left edge, as far as the waveform allows.
    pub fn scroll_to_time(&mut self, time: f64) {
        if !time.is_finite() {
            log::warn!("Ignoring scroll to non-finite time {}", time);
            return;
        }
        let frame = self.mapper.time_to_frame(time);
        self.set_frame_offset(frame);
    }

    /// Range to outline on an overview, usually another view's visible range.
    pub fn set_highlight(&mut self, range: Option<(f64, f64)>) {
        self.highlight = range.map(|(start, end)| {
            let start = self.mapper.clamp_time(start);
            let end = self.mapper.clamp_time(end);
            (start.min(end), start.max(end))
        });
    }

    fn clamp_offset(&mut self) {
        let offset = self.mapper.clamp_frame_offset(self.mapper.frame_offset(), self.width);
        self.mapper.set_frame_offset(offset);
    }

    // ─── Zoom ────────────────────────────────────────────────────

    /// Zoom to `scale`, keeping the playhead at `relative_position` of the width.
    ///
    /// The anchor is the clock time, not whatever was under that pixel before. The
    /// time at `relative_position * width` is only unchanged by the zoom when the
    /// playhead was already drawn there; otherwise the view jumps to the playhead.
    ///
    /// A request while another transition runs abandons it and starts from the
    /// scale currently on screen. On error nothing changes.
    pub fn set_zoom(
        &mut self,
        adapter: ZoomAdapter,
        scale: f64,
        relative_position: f64,
        ctx: &mut ViewContext,
    ) -> Result<()> {
        let anchor_time = ctx.clock.current_time();
        self.zoom_to(adapter, scale, relative_position, anchor_time, ctx)?;
        self.zoom_levels.set_index(self.zoom_levels.nearest(scale));
        Ok(())
    }

    /// Step to the next finer zoom level. `Ok(false)` at the finest level.
    pub fn zoom_in(&mut self, ctx: &mut ViewContext) -> Result<bool> {
        self.zoom_by_level(-1, ctx)
    }

    /// Step to the next coarser zoom level. `Ok(false)` at the coarsest level.
    pub fn zoom_out(&mut self, ctx: &mut ViewContext) -> Result<bool> {
        self.zoom_by_level(1, ctx)
    }

    fn zoom_by_level(&mut self, delta: isize, ctx: &mut ViewContext) -> Result<bool> {
        if self.kind == ViewKind::Overview {
            return Err(PeaklineError::UnsupportedZoom);
        }
        let Some(level) = self.zoom_levels.peek(delta) else {
            return Ok(false);
        };
        // Keep the playhead in place if it is on screen, otherwise the centre.
        let playhead = ctx.clock.current_time();
        let playhead_px = self.mapper.time_to_pixels(playhead);
        let (relative, anchor) = if self.width > 0.0 && (0.0..self.width).contains(&playhead_px) {
            (playhead_px / self.width, playhead)
        } else {
            (0.5, self.mapper.pixels_to_time(self.width / 2.0))
        };
        let adapter = self.options.zoom_adapter;
        self.zoom_to(adapter, level as f64, relative, anchor, ctx)?;
        let index = self.zoom_levels.index().saturating_add_signed(delta);
        self.zoom_levels.set_index(index);
        Ok(true)
    }

    fn zoom_to(
        &mut self,
        adapter: ZoomAdapter,
        scale: f64,
        relative_position: f64,
        anchor_time: f64,
        ctx: &mut ViewContext,
    ) -> Result<()> {
        if self.kind == ViewKind::Overview {
            return Err(PeaklineError::UnsupportedZoom);
        }
        let scale = validate_scale(scale)?;
        let data = self.resampled(scale)?;
        let previous_scale = self.mapper.scale();
        let transition = ZoomTransition::new(
            previous_scale,
            scale,
            relative_position,
            anchor_time,
            &self.mapper,
            self.width,
        )?;
        let steps = adapter.start(transition)?;

        // Validated: from here on the request is committed.
        if self.transition.take().is_some() {
            log::debug!("Abandoning zoom transition at {}", previous_scale);
        }
        self.data = data;
        self.scale = scale;
        ctx.sink.emit(ViewEvent::ZoomUpdate {
            previous_scale,
            current_scale: scale,
        });

        if steps.is_instant() {
            let target = steps.target();
            self.apply_step(target);
            self.render(ctx);
        } else {
            self.transition = Some(steps);
        }
        Ok(())
    }

    /// Peaks for `scale`: resampled when the scale is a whole number, else the source.
    fn resampled(&self, scale: f64) -> Result<Arc<WaveformData>> {
        let minimum = self.source.samples_per_pixel;
        if scale < minimum as f64 {
            return Err(PeaklineError::ZoomBelowResolution {
                requested: scale.ceil() as u32,
                minimum,
            });
        }
        if scale == self.data.samples_per_pixel as f64 {
            return Ok(Arc::clone(&self.data));
        }
        if scale.fract() == 0.0 && scale <= u32::MAX as f64 {
            return Ok(Arc::new(self.source.resample(scale as u32)?));
        }
        Ok(Arc::clone(&self.source))
    }

    fn apply_step(&mut self, step: ZoomStep) {
        // Steps come from validated transitions, so the scale is positive.
        if let Ok(mapper) = self.mapper.with_scale(step.scale) {
            self.mapper = mapper;
        }
        self.mapper.set_frame_offset(step.frame_offset);
        self.clamp_offset();
    }

    fn finish_transition(&mut self) {
        if let Some(steps) = self.transition.take() {
            self.apply_step(steps.target());
        }
    }

    /// Advance an animated zoom by one frame. Returns true while frames remain.
    ///
    /// Intermediate steps redraw the waveform layer only; the final step redraws
    /// everything.
    pub fn advance_frame(&mut self, ctx: &mut ViewContext) -> bool {
        let Some(steps) = self.transition.as_mut() else {
            return false;
        };
        match steps.next() {
            Some(step) => {
                let done = steps.len() == 0;
                self.apply_step(step);
                if done {
                    self.transition = None;
                    self.render(ctx);
                } else {
                    self.redraw_waveform(ctx.renderer);
                }
                !done
            }
            None => {
                self.transition = None;
                self.render(ctx);
                false
            }
        }
    }

    // ─── Playback ────────────────────────────────────────────────

    /// Poll the clock and sync to its time.
    pub fn sync(&mut self, ctx: &mut ViewContext) -> bool {
        let time = ctx.clock.current_time();
        self.sync_time(time, ctx)
    }

    /// Move the playhead, emit marker crossings and auto-scroll.
    ///
    /// Returns true when the view scrolled.
    pub fn sync_time(&mut self, time: f64, ctx: &mut ViewContext) -> bool {
        if !time.is_finite() {
            log::warn!("Ignoring non-finite playback time {}", time);
            return false;
        }
        if time > self.mapper.duration() {
            log::trace!("Playback time {} past the end, clamping", time);
        }
        self.playhead_time = self.mapper.clamp_time(time);

        if self.emit_marker_events {
            self.points
                .update(PointEvents::collection(ctx.markers), time, &mut *ctx.sink);
            self.segments
                .update(SegmentEvents::collection(ctx.markers), time, &mut *ctx.sink);
        }

        let scrolled = self.kind == ViewKind::Zoomable
            && self.options.auto_scroll
            && !self.drag.is_dragging()
            && self.transition.is_none()
            && self.auto_scroll();
        if scrolled {
            self.render(ctx);
        } else {
            self.redraw_playhead(ctx.renderer);
        }
        scrolled
    }

    /// Page so the playhead stays on screen. Returns true when the offset changed.
    fn auto_scroll(&mut self) -> bool {
        let x = self.mapper.time_to_pixels(self.playhead_time);
        let margin = AUTO_SCROLL_MARGIN_PX.min(self.width / 4.0);
        if x >= 0.0 && x < self.width - margin {
            return false;
        }
        let playhead_frame = self.mapper.time_to_frame(self.playhead_time);
        let target = playhead_frame.saturating_sub((margin * self.mapper.scale()).round() as u64);
        let offset = self.mapper.clamp_frame_offset(target, self.width);
        if offset == self.mapper.frame_offset() {
            return false;
        }
        log::trace!("Auto-scroll to frame {}", offset);
        self.mapper.set_frame_offset(offset);
        true
    }

    /// Call after the clock jumps (a seek). Points skipped by the jump stay quiet;
    /// segments left behind still exit on the next sync.
    pub fn reset_marker_tracks(&mut self) {
        self.points.reset();
        self.segments.reset();
    }

    // ─── Pointer input ───────────────────────────────────────────

    pub fn on_pointer_down(&mut self, x: f64, ctx: &mut ViewContext) {
        match self.drag_mode() {
            DragMode::Seek => {
                self.drag.on_pointer_down(x, &self.mapper, &mut *ctx.sink);
                self.reset_marker_tracks();
            }
            DragMode::Scroll => {
                self.drag.begin(x, &self.mapper);
            }
        }
    }

    pub fn on_pointer_move(&mut self, x: f64, ctx: &mut ViewContext) {
        match self.drag_mode() {
            DragMode::Seek => {
                if self.drag.on_pointer_move(x, &self.mapper, &mut *ctx.sink).is_some() {
                    self.reset_marker_tracks();
                }
            }
            DragMode::Scroll => {
                if let Some(offset) = self.drag.scroll_offset(x, &self.mapper) {
                    self.set_frame_offset(offset);
                    self.render(ctx);
                }
            }
        }
    }

    /// End a drag. In scroll mode a click without movement seeks.
    pub fn on_pointer_up(&mut self, ctx: &mut ViewContext) {
        let Some(session) = self.drag.on_pointer_up() else {
            return;
        };
        if self.drag_mode() == DragMode::Scroll && session.last_px_x == session.origin_px_x {
            ctx.sink.emit(ViewEvent::UserSeek {
                time: session.current_time,
            });
            self.reset_marker_tracks();
        }
    }

    // ─── Rendering ───────────────────────────────────────────────

    /// Redraw every layer.
    pub fn render(&self, ctx: &mut ViewContext) {
        self.redraw_waveform(ctx.renderer);
        self.redraw_axis(ctx.renderer);
        self.redraw_markers(ctx.markers, ctx.renderer);
        self.redraw_highlight(ctx.renderer);
        self.redraw_playhead(ctx.renderer);
    }

    /// Peak envelope per pixel column at the display scale.
    pub fn peak_columns(&self) -> Vec<(f32, f32)> {
        let scale = self.mapper.scale();
        let data = if self.data.samples_per_pixel as f64 == scale {
            &self.data
        } else {
            &self.source
        };
        data.columns(self.mapper.frame_offset() as f64, scale, self.width.ceil() as usize)
    }

    fn redraw_waveform(&self, renderer: &mut dyn SceneRenderer) {
        let columns = self.peak_columns();
        let color = self.options.colors.waveform;
        let mid_y = self.height as f32 / 2.0;
        let half_height = self.height as f32 * 0.45;

        renderer.clear_layer(Layer::Waveform);
        renderer.create_shape(
            Layer::Waveform,
            Box::new(move |dc: &mut dyn DrawContext| {
                dc.set_stroke(color, 1.0);
                for (i, &(min, max)) in columns.iter().enumerate() {
                    if min > max {
                        continue;
                    }
                    let x = i as f32 + 0.5;
                    dc.move_to(x, mid_y - max * half_height);
                    dc.line_to(x, mid_y - min * half_height);
                    dc.stroke();
                }
            }),
        );
        renderer.draw_layer(Layer::Waveform);
    }

    fn redraw_axis(&self, renderer: &mut dyn SceneRenderer) {
        let ticks = axis::ticks(&self.mapper, self.width, self.options.axis.min_tick_spacing_px);
        let color = self.options.colors.axis;
        let show_labels = self.options.axis.show_labels;
        let height = self.height as f32;

        renderer.clear_layer(Layer::Axis);
        renderer.create_shape(
            Layer::Axis,
            Box::new(move |dc: &mut dyn DrawContext| {
                dc.set_stroke(color, 1.0);
                dc.set_fill(color);
                for tick in &ticks {
                    let x = tick.x as f32;
                    dc.move_to(x, 0.0);
                    dc.line_to(x, AXIS_TICK_HEIGHT);
                    dc.stroke();
                    dc.move_to(x, height - AXIS_TICK_HEIGHT);
                    dc.line_to(x, height);
                    dc.stroke();
                    if show_labels {
                        dc.fill_text(&tick.label, x + 3.0, LABEL_FONT_OFFSET);
                    }
                }
            }),
        );
        renderer.draw_layer(Layer::Axis);
    }

    fn redraw_markers(&self, markers: &Markers, renderer: &mut dyn SceneRenderer) {
        let (start, end) = self.visible_time_range();
        let height = self.height as f32;
        let width = self.width;

        renderer.clear_layer(Layer::Segments);
        for segment in markers.segments().in_range(start, end) {
            let x0 = self.mapper.time_to_pixels(segment.start_time).max(0.0) as f32;
            let x1 = self.mapper.time_to_pixels(segment.end_time).min(width) as f32;
            let color = segment.color.unwrap_or(self.options.colors.segment);
            let label = segment.label_text.clone();
            renderer.create_shape(
                Layer::Segments,
                Box::new(move |dc: &mut dyn DrawContext| {
                    dc.set_fill(color);
                    dc.fill_rect(x0, 0.0, (x1 - x0).max(1.0), height);
                    if !label.is_empty() {
                        dc.set_fill(color.with_alpha(255));
                        dc.fill_text(&label, x0 + 2.0, LABEL_FONT_OFFSET * 2.0);
                    }
                }),
            );
        }
        renderer.draw_layer(Layer::Segments);

        renderer.clear_layer(Layer::Points);
        for point in markers.points().in_range(start, end) {
            let x = self.mapper.time_to_pixels(point.time) as f32;
            let color = point.color.unwrap_or(self.options.colors.point);
            let label = point.label_text.clone();
            renderer.create_shape(
                Layer::Points,
                Box::new(move |dc: &mut dyn DrawContext| {
                    dc.set_stroke(color, 1.0);
                    dc.move_to(x, 0.0);
                    dc.line_to(x, height);
                    dc.stroke();
                    if !label.is_empty() {
                        dc.set_fill(color);
                        dc.fill_text(&label, x + 2.0, height - 4.0);
                    }
                }),
            );
        }
        renderer.draw_layer(Layer::Points);
    }

    fn redraw_highlight(&self, renderer: &mut dyn SceneRenderer) {
        renderer.clear_layer(Layer::Highlight);
        if let Some((start, end)) = self.highlight {
            let x0 = self.mapper.time_to_pixels(start) as f32;
            let x1 = self.mapper.time_to_pixels(end) as f32;
            let color = self.options.colors.highlight;
            let height = self.height as f32;
            renderer.create_shape(
                Layer::Highlight,
                Box::new(move |dc: &mut dyn DrawContext| {
                    dc.set_fill(color);
                    dc.fill_rect(x0, 0.0, (x1 - x0).max(1.0), height);
                }),
            );
        }
        renderer.draw_layer(Layer::Highlight);
    }

    fn redraw_playhead(&self, renderer: &mut dyn SceneRenderer) {
        renderer.clear_layer(Layer::Playhead);
        let x = self.mapper.time_to_pixels(self.playhead_time);
        if (0.0..=self.width).contains(&x) {
            let x = x as f32;
            let color: Color = self.options.colors.playhead;
            let height = self.height as f32;
            renderer.create_shape(
                Layer::Playhead,
                Box::new(move |dc: &mut dyn DrawContext| {
                    dc.set_stroke(color, 1.0);
                    dc.move_to(x, 0.0);
                    dc.line_to(x, height);
                    dc.stroke();
                }),
            );
        }
        renderer.draw_layer(Layer::Playhead);
    }
}

/// Whole-number scale fitting every frame into `width`, never finer than the data.
fn fit_scale(data: &WaveformData, width: f64) -> u32 {
    let width = width.max(1.0).floor() as u64;
    let fit = data.total_frames().div_ceil(width);
    fit.clamp(data.samples_per_pixel.max(1) as u64, u32::MAX as u64) as u32
}
