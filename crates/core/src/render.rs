//! Scene-graph renderer abstraction.
//!
//! Views never paint directly. They clear a [`Layer`], add shapes to it as draw
//! callbacks, and ask the renderer to draw the layer. A callback receives a
//! [`DrawContext`] when the host actually paints, so the same scene can be replayed
//! into egui, an SVG writer or a test recorder.

use crate::color::Color;

/// Render layers, bottom to top.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Layer {
    Waveform,
    Axis,
    Segments,
    Points,
    Highlight,
    Playhead,
}

impl Layer {
    /// Paint order.
    pub const ALL: [Layer; 6] = [
        Layer::Waveform,
        Layer::Axis,
        Layer::Segments,
        Layer::Points,
        Layer::Highlight,
        Layer::Playhead,
    ];

    fn index(self) -> usize {
        self as usize
    }
}

/// Minimal 2D drawing context handed to shape callbacks.
///
/// Coordinates are pixels relative to the view's top-left corner.
pub trait DrawContext {
    fn set_stroke(&mut self, color: Color, width: f32);
    fn set_fill(&mut self, color: Color);
    fn move_to(&mut self, x: f32, y: f32);
    fn line_to(&mut self, x: f32, y: f32);
    /// Stroke the path built since the last `move_to`.
    fn stroke(&mut self);
    fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32);
    fn fill_text(&mut self, text: &str, x: f32, y: f32);
}

pub type DrawCallback = Box<dyn Fn(&mut dyn DrawContext)>;

/// Retained-mode renderer consumed by views.
pub trait SceneRenderer {
    /// Remove every shape from a layer.
    fn clear_layer(&mut self, layer: Layer);
    /// Add a shape to a layer. It is painted on the next draw of that layer.
    fn create_shape(&mut self, layer: Layer, draw: DrawCallback);
    /// Mark a layer ready to paint.
    fn draw_layer(&mut self, layer: Layer);
}

/// In-memory scene: shapes per layer, replayed in layer order.
#[derive(Default)]
pub struct SceneGraph {
    layers: [Vec<DrawCallback>; 6],
    draw_counts: [u64; 6],
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shape_count(&self, layer: Layer) -> usize {
        self.layers[layer.index()].len()
    }

    /// How many times `draw_layer` has been called for a layer.
    pub fn draw_count(&self, layer: Layer) -> u64 {
        self.draw_counts[layer.index()]
    }

    /// Paint every layer, bottom to top.
    pub fn replay(&self, ctx: &mut dyn DrawContext) {
        for layer in Layer::ALL {
            self.replay_layer(layer, ctx);
        }
    }

    pub fn replay_layer(&self, layer: Layer, ctx: &mut dyn DrawContext) {
        for shape in &self.layers[layer.index()] {
            shape(ctx);
        }
    }
}

impl std::fmt::Debug for SceneGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let shapes: Vec<usize> = self.layers.iter().map(Vec::len).collect();
        f.debug_struct("SceneGraph")
            .field("shapes", &shapes)
            .field("draw_counts", &self.draw_counts)
            .finish()
    }
}

impl SceneRenderer for SceneGraph {
    fn clear_layer(&mut self, layer: Layer) {
        self.layers[layer.index()].clear();
    }

    fn create_shape(&mut self, layer: Layer, draw: DrawCallback) {
        self.layers[layer.index()].push(draw);
    }

    fn draw_layer(&mut self, layer: Layer) {
        self.draw_counts[layer.index()] += 1;
    }
}

/// A recorded drawing operation.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Stroke { color: Color, width: f32, path: Vec<(f32, f32)> },
    FillRect { color: Color, x: f32, y: f32, width: f32, height: f32 },
    Text { color: Color, text: String, x: f32, y: f32 },
}

/// [`DrawContext`] that records commands instead of painting.
#[derive(Debug, Clone)]
pub struct CommandRecorder {
    pub commands: Vec<DrawCommand>,
    stroke: (Color, f32),
    fill: Color,
    path: Vec<(f32, f32)>,
}

impl Default for CommandRecorder {
    fn default() -> Self {
        Self {
            commands: Vec::new(),
            stroke: (Color::BLACK, 1.0),
            fill: Color::BLACK,
            path: Vec::new(),
        }
    }
}

impl CommandRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn strokes(&self) -> impl Iterator<Item = &Vec<(f32, f32)>> {
        self.commands.iter().filter_map(|c| match c {
            DrawCommand::Stroke { path, .. } => Some(path),
            _ => None,
        })
    }

    pub fn rects(&self) -> impl Iterator<Item = &DrawCommand> {
        self.commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::FillRect { .. }))
    }

    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.commands.iter().filter_map(|c| match c {
            DrawCommand::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }
}

impl DrawContext for CommandRecorder {
    fn set_stroke(&mut self, color: Color, width: f32) {
        self.stroke = (color, width);
    }

    fn set_fill(&mut self, color: Color) {
        self.fill = color;
    }

    fn move_to(&mut self, x: f32, y: f32) {
        self.path.clear();
        self.path.push((x, y));
    }

    fn line_to(&mut self, x: f32, y: f32) {
        self.path.push((x, y));
    }

    fn stroke(&mut self) {
        if self.path.len() < 2 {
            return;
        }
        let (color, width) = self.stroke;
        self.commands.push(DrawCommand::Stroke {
            color,
            width,
            path: std::mem::take(&mut self.path),
        });
    }

    fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32) {
        self.commands.push(DrawCommand::FillRect {
            color: self.fill,
            x,
            y,
            width,
            height,
        });
    }

    fn fill_text(&mut self, text: &str, x: f32, y: f32) {
        self.commands.push(DrawCommand::Text {
            color: self.fill,
            text: text.to_string(),
            x,
            y,
        });
    }
}
