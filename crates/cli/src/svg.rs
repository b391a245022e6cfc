//! SVG output for a replayed scene.

use std::fmt::Write;

use peakline_core::color::Color;
use peakline_core::render::DrawContext;

/// [`DrawContext`] that accumulates SVG elements.
pub struct SvgWriter {
    width: f64,
    height: f64,
    body: String,
    stroke: (Color, f32),
    fill: Color,
    path: String,
}

impl SvgWriter {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            body: String::new(),
            stroke: (Color::BLACK, 1.0),
            fill: Color::BLACK,
            path: String::new(),
        }
    }

    /// Close the document.
    pub fn finish(self) -> String {
        format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\">\n\
             <rect width=\"100%\" height=\"100%\" fill=\"#ffffff\"/>\n{body}</svg>\n",
            w = self.width,
            h = self.height,
            body = self.body
        )
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

impl DrawContext for SvgWriter {
    fn set_stroke(&mut self, color: Color, width: f32) {
        self.stroke = (color, width);
    }

    fn set_fill(&mut self, color: Color) {
        self.fill = color;
    }

    fn move_to(&mut self, x: f32, y: f32) {
        self.path.clear();
        let _ = write!(self.path, "M{:.1} {:.1}", x, y);
    }

    fn line_to(&mut self, x: f32, y: f32) {
        let _ = write!(self.path, " L{:.1} {:.1}", x, y);
    }

    fn stroke(&mut self) {
        if !self.path.contains('L') {
            return;
        }
        let (color, width) = self.stroke;
        let _ = writeln!(
            self.body,
            "<path d=\"{}\" stroke=\"{}\" stroke-width=\"{}\" fill=\"none\"/>",
            self.path, color, width
        );
        self.path.clear();
    }

    fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32) {
        let _ = writeln!(
            self.body,
            "<rect x=\"{:.1}\" y=\"{:.1}\" width=\"{:.1}\" height=\"{:.1}\" fill=\"{}\"/>",
            x, y, width, height, self.fill
        );
    }

    fn fill_text(&mut self, text: &str, x: f32, y: f32) {
        let _ = writeln!(
            self.body,
            "<text x=\"{:.1}\" y=\"{:.1}\" fill=\"{}\" font-family=\"sans-serif\" font-size=\"10\">{}</text>",
            x,
            y,
            self.fill,
            escape(text)
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_svg_elements() {
        let mut svg = SvgWriter::new(100.0, 50.0);
        svg.set_stroke(Color::rgb(255, 0, 0), 1.0);
        svg.move_to(0.0, 0.0);
        svg.line_to(10.0, 5.0);
        svg.stroke();
        svg.move_to(3.0, 3.0);
        svg.stroke();
        svg.set_fill(Color::rgb(0, 0, 255));
        svg.fill_rect(1.0, 2.0, 3.0, 4.0);
        svg.fill_text("a<b", 0.0, 10.0);
        let doc = svg.finish();
        assert!(doc.contains("<path d=\"M0.0 0.0 L10.0 5.0\" stroke=\"#ff0000\""));
        assert_eq!(doc.matches("<path").count(), 1);
        assert!(doc.contains("fill=\"#0000ff\"/>"));
        assert!(doc.contains(">a&lt;b</text>"));
        assert!(doc.starts_with("<svg"));
    }
}
