//! Drawing-command recorder. The renderer issues primitives against a
//! [`Canvas`] in top-left page coordinates; the PDF serializer replays the
//! recorded commands per page. Recording instead of drawing directly keeps
//! page output byte-identical for identical inputs.

use crate::types::{Color, Pt, Size};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaintMode {
    Fill,
    Stroke,
    FillStroke,
}

#[derive(Debug, Clone)]
pub enum Command {
    SetFillColor(Color),
    SetStrokeColor(Color),
    SetLineWidth(Pt),
    SetFontName(String),
    SetFontSize(Pt),
    DrawRect {
        x: Pt,
        y: Pt,
        width: Pt,
        height: Pt,
        mode: PaintMode,
    },
    DrawLine {
        x1: Pt,
        y1: Pt,
        x2: Pt,
        y2: Pt,
    },
    DrawString {
        x: Pt,
        y: Pt,
        text: String,
    },
    DrawImage {
        x: Pt,
        y: Pt,
        width: Pt,
        height: Pt,
        resource_id: String,
    },
}

#[derive(Debug, Clone)]
pub struct Page {
    pub commands: Vec<Command>,
}

impl Page {
    fn new() -> Self {
        Self {
            commands: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Document {
    pub page_size: Size,
    pub pages: Vec<Page>,
}

#[derive(Debug, Clone)]
struct GraphicsState {
    fill_color: Color,
    stroke_color: Color,
    line_width: Pt,
    font_name: String,
    font_size: Pt,
}

impl GraphicsState {
    fn page_default() -> Self {
        Self {
            fill_color: Color::BLACK,
            stroke_color: Color::BLACK,
            line_width: Pt::from_f32(1.0),
            font_name: "Helvetica".to_string(),
            font_size: Pt::from_f32(12.0),
        }
    }
}

pub struct Canvas {
    page_size: Size,
    pages: Vec<Page>,
    current: Page,
    state: GraphicsState,
}

impl Canvas {
    pub fn new(page_size: Size) -> Self {
        Self {
            page_size,
            pages: Vec::new(),
            current: Page::new(),
            state: GraphicsState::page_default(),
        }
    }

    pub fn set_fill_color(&mut self, color: Color) {
        if self.state.fill_color == color {
            return;
        }
        self.state.fill_color = color;
        self.current.commands.push(Command::SetFillColor(color));
    }

    pub fn set_stroke_color(&mut self, color: Color) {
        if self.state.stroke_color == color {
            return;
        }
        self.state.stroke_color = color;
        self.current.commands.push(Command::SetStrokeColor(color));
    }

    pub fn set_line_width(&mut self, width: Pt) {
        let width = width.max(Pt::ZERO);
        if self.state.line_width == width {
            return;
        }
        self.state.line_width = width;
        self.current.commands.push(Command::SetLineWidth(width));
    }

    pub fn set_font(&mut self, name: &str, size: Pt) {
        if self.state.font_name != name {
            self.state.font_name = name.to_string();
            self.current
                .commands
                .push(Command::SetFontName(name.to_string()));
        }
        if self.state.font_size != size {
            self.state.font_size = size;
            self.current.commands.push(Command::SetFontSize(size));
        }
    }

    pub fn draw_rect(&mut self, x: Pt, y: Pt, width: Pt, height: Pt, mode: PaintMode) {
        self.current.commands.push(Command::DrawRect {
            x,
            y,
            width,
            height,
            mode,
        });
    }

    pub fn draw_line(&mut self, x1: Pt, y1: Pt, x2: Pt, y2: Pt) {
        self.current.commands.push(Command::DrawLine { x1, y1, x2, y2 });
    }

    pub fn draw_string(&mut self, x: Pt, y: Pt, text: impl Into<String>) {
        self.current.commands.push(Command::DrawString {
            x,
            y,
            text: text.into(),
        });
    }

    pub fn draw_image(&mut self, x: Pt, y: Pt, width: Pt, height: Pt, resource_id: &str) {
        self.current.commands.push(Command::DrawImage {
            x,
            y,
            width,
            height,
            resource_id: resource_id.to_string(),
        });
    }

    /// Close the current page and start a fresh one with default state.
    pub fn show_page(&mut self) {
        let current = std::mem::replace(&mut self.current, Page::new());
        self.pages.push(current);
        self.state = GraphicsState::page_default();
    }

    pub fn finish(mut self) -> Document {
        if !self.current.commands.is_empty() || self.pages.is_empty() {
            self.show_page();
        }
        Document {
            page_size: self.page_size,
            pages: self.pages,
        }
    }
}

/// Deterministic Helvetica width estimate: 0.6em per character, floored at
/// one point. Crude next to real metrics, but monotone in prefix length,
/// which is what ellipsis truncation relies on.
pub fn text_width(text: &str, font_size: Pt) -> Pt {
    let char_width = (font_size * 0.6).max(Pt::from_f32(1.0));
    char_width * text.chars().count() as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_state_setters_record_once() {
        let mut canvas = Canvas::new(Size::from_mm(210.0, 297.0));
        canvas.set_fill_color(Color::gray(0.5));
        canvas.set_fill_color(Color::gray(0.5));
        canvas.set_line_width(Pt::from_f32(0.2));
        canvas.set_line_width(Pt::from_f32(0.2));
        let doc = canvas.finish();
        assert_eq!(doc.pages.len(), 1);
        assert_eq!(doc.pages[0].commands.len(), 2);
    }

    #[test]
    fn show_page_resets_graphics_state() {
        let mut canvas = Canvas::new(Size::from_mm(210.0, 297.0));
        canvas.set_font("Helvetica-Bold", Pt::from_f32(14.0));
        canvas.show_page();
        canvas.set_font("Helvetica-Bold", Pt::from_f32(14.0));
        let doc = canvas.finish();
        // The second page re-records the font change.
        assert_eq!(doc.pages.len(), 2);
        assert!(
            doc.pages[1]
                .commands
                .iter()
                .any(|c| matches!(c, Command::SetFontName(name) if name == "Helvetica-Bold"))
        );
    }

    #[test]
    fn empty_canvas_still_finishes_with_one_page() {
        let doc = Canvas::new(Size::from_mm(210.0, 297.0)).finish();
        assert_eq!(doc.pages.len(), 1);
        assert!(doc.pages[0].commands.is_empty());
    }

    #[test]
    fn text_width_is_monotone_in_prefix_length() {
        let size = Pt::from_f32(7.0);
        let mut last = Pt::ZERO;
        let text = "warehouse-label-0042";
        for end in 1..=text.len() {
            let w = text_width(&text[..end], size);
            assert!(w > last);
            last = w;
        }
    }
}
