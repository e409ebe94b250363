//! Per-page rendering: header block, grid lines, QR cells, labels, and
//! the page-number footer, emitted as canvas commands in strict page
//! order.

use crate::canvas::{Canvas, Document, PaintMode, text_width};
use crate::layout::{
    FOOTER_FONT_SIZE_PT, FOOTER_OFFSET_MM, GRID_LINE_WIDTH_PT, HEADER_META_FONT_SIZE_PT,
    HEADER_NAME_FONT_SIZE_PT, LABEL_FONT_SIZE_PT, SheetLayout,
};
use crate::types::{Color, Pt};
use crate::{CompanyHeaderInfo, QrCodeEntry, SheetConfig};
use image::GrayImage;
use std::collections::HashMap;

const FONT_REGULAR: &str = "Helvetica";
const FONT_BOLD: &str = "Helvetica-Bold";

const HEADER_FILL: Color = Color {
    r: 0.96,
    g: 0.96,
    b: 0.96,
};
const HEADER_BORDER: Color = Color {
    r: 0.7,
    g: 0.7,
    b: 0.7,
};
const GRID_LINE: Color = Color {
    r: 0.8,
    g: 0.8,
    b: 0.8,
};
const FOOTER_TEXT: Color = Color {
    r: 0.45,
    g: 0.45,
    b: 0.45,
};

pub fn render_document(
    pages: &[&[QrCodeEntry]],
    images: &HashMap<String, GrayImage>,
    layout: &SheetLayout,
    config: &SheetConfig,
    total_entries: usize,
) -> Document {
    let mut canvas = Canvas::new(layout.page_size);
    for (index, page_entries) in pages.iter().enumerate() {
        if index == 0 {
            if let Some(header) = &config.header {
                draw_header(&mut canvas, layout, header, total_entries);
            }
        }
        draw_grid(&mut canvas, layout, config, page_entries, images, index);
        draw_footer(&mut canvas, layout, index, pages.len());
        canvas.show_page();
    }
    canvas.finish()
}

fn draw_header(
    canvas: &mut Canvas,
    layout: &SheetLayout,
    header: &CompanyHeaderInfo,
    total_entries: usize,
) {
    let pad = Pt::from_mm(4.0);
    // The reserved header height includes a 5mm gap before the grid.
    let block_height = layout.header_height - Pt::from_mm(5.0);

    canvas.set_fill_color(HEADER_FILL);
    canvas.set_stroke_color(HEADER_BORDER);
    canvas.set_line_width(Pt::from_f32(0.5));
    canvas.draw_rect(
        layout.margin,
        layout.margin,
        layout.avail_width,
        block_height,
        PaintMode::FillStroke,
    );

    let left = layout.margin + pad;
    let mut baseline = layout.margin + Pt::from_mm(9.0);

    canvas.set_fill_color(Color::BLACK);
    canvas.set_font(FONT_BOLD, Pt::from_f32(HEADER_NAME_FONT_SIZE_PT));
    canvas.draw_string(left, baseline, header.name.as_str());

    if let Some(filter) = &header.filter_description {
        let size = Pt::from_f32(HEADER_META_FONT_SIZE_PT);
        canvas.set_font(FONT_REGULAR, size);
        let width = text_width(filter, size);
        let x = layout.margin + layout.avail_width - pad - width;
        canvas.draw_string(x, baseline, filter.as_str());
    }

    canvas.set_font(FONT_REGULAR, Pt::from_f32(HEADER_META_FONT_SIZE_PT));
    if let Some(code) = &header.code {
        baseline = baseline + Pt::from_mm(7.0);
        canvas.draw_string(left, baseline, code.as_str());
    }
    baseline = baseline + Pt::from_mm(6.0);
    let exported = format!(
        "Exported {}",
        header.export_date.format("%Y-%m-%d %H:%M")
    );
    canvas.draw_string(left, baseline, exported);
    baseline = baseline + Pt::from_mm(6.0);
    canvas.draw_string(left, baseline, format!("{} QR codes", total_entries));
}

fn draw_grid(
    canvas: &mut Canvas,
    layout: &SheetLayout,
    config: &SheetConfig,
    entries: &[QrCodeEntry],
    images: &HashMap<String, GrayImage>,
    page_index: usize,
) {
    if entries.is_empty() {
        return;
    }
    let columns = layout.columns as usize;
    let actual_rows = entries.len().div_ceil(columns);

    let header_height = if page_index == 0 {
        layout.header_height
    } else {
        Pt::ZERO
    };
    let page_avail_height = layout.avail_height - header_height;
    let grid_height = layout.cell_height * actual_rows as i32;
    // The occupied block is centered in whatever vertical space this page
    // has left under its header.
    let start_y =
        layout.margin + header_height + ((page_avail_height - grid_height) / 2).max(Pt::ZERO);

    if config.show_grid_lines {
        let grid_width = layout.cell_width * layout.columns as i32;
        canvas.set_stroke_color(GRID_LINE);
        canvas.set_line_width(Pt::from_f32(GRID_LINE_WIDTH_PT));
        for row in 0..=actual_rows {
            let y = start_y + layout.cell_height * row as i32;
            canvas.draw_line(layout.margin, y, layout.margin + grid_width, y);
        }
        for col in 0..=columns {
            let x = layout.margin + layout.cell_width * col as i32;
            canvas.draw_line(x, start_y, x, start_y + grid_height);
        }
    }

    let padding = Pt::from_mm(crate::layout::CELL_PADDING_MM);
    for (i, entry) in entries.iter().enumerate() {
        let col = (i % columns) as i32;
        let row = (i / columns) as i32;
        let cell_x = layout.margin + layout.cell_width * col;
        let cell_y = start_y + layout.cell_height * row;

        // A payload that failed to encode has no image; the cell is still
        // laid out so its label (and grid slot) stay in place.
        if images.contains_key(&entry.id) {
            let image_x = cell_x + (layout.cell_width - layout.qr_size) / 2;
            canvas.draw_image(
                image_x,
                cell_y + padding,
                layout.qr_size,
                layout.qr_size,
                &entry.id,
            );
        }

        if config.show_labels {
            let size = Pt::from_f32(LABEL_FONT_SIZE_PT);
            let max_width = layout.cell_width - Pt::from_mm(2.0);
            let label = entry.label.as_deref().unwrap_or(&entry.payload);
            let label = truncate_label(label, max_width, size);
            let width = text_width(&label, size);
            canvas.set_fill_color(Color::BLACK);
            canvas.set_font(FONT_REGULAR, size);
            let x = cell_x + (layout.cell_width - width) / 2;
            let y = cell_y + padding * 2 + layout.qr_size + Pt::from_mm(4.0);
            canvas.draw_string(x, y, label);
        }
    }
}

fn draw_footer(canvas: &mut Canvas, layout: &SheetLayout, page_index: usize, total_pages: usize) {
    let size = Pt::from_f32(FOOTER_FONT_SIZE_PT);
    let text = format!("Page {} of {}", page_index + 1, total_pages);
    let width = text_width(&text, size);
    canvas.set_fill_color(FOOTER_TEXT);
    canvas.set_font(FONT_REGULAR, size);
    let x = layout.margin + layout.avail_width - width;
    let y = layout.page_size.height - Pt::from_mm(FOOTER_OFFSET_MM);
    canvas.draw_string(x, y, text);
}

/// Widest prefix of `text` that, with a trailing ellipsis, still measures
/// within `max_width`. A label that already fits comes back unchanged.
/// Binary search over char boundaries; the width measure is monotone in
/// prefix length, so this lands on the same string a char-by-char trim
/// would.
pub fn truncate_label(text: &str, max_width: Pt, font_size: Pt) -> String {
    if text.is_empty() {
        return String::new();
    }
    if text_width(text, font_size) <= max_width {
        return text.to_string();
    }
    if max_width <= Pt::ZERO {
        return String::new();
    }

    let ellipsis = "\u{2026}";
    if text_width(ellipsis, font_size) >= max_width {
        return ellipsis.to_string();
    }

    let mut boundaries: Vec<usize> = text.char_indices().map(|(idx, _)| idx).collect();
    boundaries.push(text.len());

    let mut lo = 0usize;
    let mut hi = boundaries.len() - 1;
    let mut best = 0usize;
    while lo <= hi {
        let mid = (lo + hi) / 2;
        let end = boundaries[mid];
        let mut candidate = String::with_capacity(end + ellipsis.len());
        candidate.push_str(&text[..end]);
        candidate.push_str(ellipsis);
        if text_width(&candidate, font_size) <= max_width {
            best = mid;
            lo = mid + 1;
        } else {
            if mid == 0 {
                break;
            }
            hi = mid - 1;
        }
    }

    let mut out = String::with_capacity(boundaries[best] + ellipsis.len());
    out.push_str(&text[..boundaries[best]]);
    out.push_str(ellipsis);
    out
}
