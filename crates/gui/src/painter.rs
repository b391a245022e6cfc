//! egui backend for the scene renderer.

use eframe::egui;
use peakline_core::color::Color;
use peakline_core::render::{DrawContext, SceneGraph};

pub fn to_color32(color: Color) -> egui::Color32 {
    egui::Color32::from_rgba_unmultiplied(color.r, color.g, color.b, color.a)
}

/// Paints draw callbacks with an `egui::Painter`, offset to a view's rectangle.
pub struct EguiDrawContext<'a> {
    painter: &'a egui::Painter,
    origin: egui::Pos2,
    stroke: egui::Stroke,
    fill: egui::Color32,
    path: Vec<egui::Pos2>,
}

impl<'a> EguiDrawContext<'a> {
    pub fn new(painter: &'a egui::Painter, rect: egui::Rect) -> Self {
        Self {
            painter,
            origin: rect.min,
            stroke: egui::Stroke::new(1.0, egui::Color32::WHITE),
            fill: egui::Color32::WHITE,
            path: Vec::new(),
        }
    }

    fn pos(&self, x: f32, y: f32) -> egui::Pos2 {
        self.origin + egui::vec2(x, y)
    }
}

impl DrawContext for EguiDrawContext<'_> {
    fn set_stroke(&mut self, color: Color, width: f32) {
        self.stroke = egui::Stroke::new(width, to_color32(color));
    }

    fn set_fill(&mut self, color: Color) {
        self.fill = to_color32(color);
    }

    fn move_to(&mut self, x: f32, y: f32) {
        self.path.clear();
        let p = self.pos(x, y);
        self.path.push(p);
    }

    fn line_to(&mut self, x: f32, y: f32) {
        let p = self.pos(x, y);
        self.path.push(p);
    }

    fn stroke(&mut self) {
        match self.path.len() {
            0 | 1 => {}
            2 => {
                self.painter.line_segment([self.path[0], self.path[1]], self.stroke);
            }
            _ => {
                self.painter
                    .add(egui::Shape::line(self.path.clone(), self.stroke));
            }
        }
        self.path.clear();
    }

    fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32) {
        let rect = egui::Rect::from_min_size(self.pos(x, y), egui::vec2(width, height));
        self.painter.rect_filled(rect, 0.0, self.fill);
    }

    fn fill_text(&mut self, text: &str, x: f32, y: f32) {
        self.painter.text(
            self.pos(x, y),
            egui::Align2::LEFT_BOTTOM,
            text,
            egui::FontId::proportional(10.0),
            self.fill,
        );
    }
}

/// Allocate a view-sized area and paint a scene into it.
pub fn show_scene(
    ui: &mut egui::Ui,
    scene: &SceneGraph,
    height: f32,
    background: egui::Color32,
) -> egui::Response {
    let desired_size = egui::vec2(ui.available_width(), height);
    let (rect, response) = ui.allocate_exact_size(desired_size, egui::Sense::click_and_drag());

    if !ui.is_rect_visible(rect) {
        return response;
    }

    let painter = ui.painter_at(rect);
    painter.rect_filled(rect, 0.0, background);
    let mut dc = EguiDrawContext::new(&painter, rect);
    scene.replay(&mut dc);
    response
}
