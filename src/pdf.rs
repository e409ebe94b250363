//! Streaming PDF 1.7 serializer for recorded canvas documents.
//!
//! Objects are written incrementally with their byte offsets recorded as
//! they go out, so the cross-reference table at the end is exact without
//! buffering the whole document. Fonts are base-14 Helvetica variants
//! (WinAnsi, no embedding); QR rasters become uncompressed 8-bit
//! DeviceGray image XObjects, deduplicated by content hash so a repeated
//! payload is embedded once no matter how many cells reference it.

use crate::canvas::{Command, Document, Page, PaintMode};
use crate::types::{Color, Pt, Size};
use image::GrayImage;
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashMap};
use std::io::{self, Write};

const PDF_CATALOG_ID: usize = 1;
const PDF_PAGES_ID: usize = 2;
const PDF_RESOURCES_ID: usize = 3;

/// Serialize `document` to an in-memory PDF. Returns the bytes and the
/// number of unique image XObjects embedded.
pub fn document_to_pdf(
    document: &Document,
    images: &HashMap<String, GrayImage>,
) -> io::Result<(Vec<u8>, usize)> {
    let mut bytes = Vec::new();
    let (_, embedded) = document_to_writer(document, images, &mut bytes)?;
    Ok((bytes, embedded))
}

/// Streaming variant: serialize straight into `writer`. Returns bytes
/// written and unique images embedded.
pub fn document_to_writer<W: Write>(
    document: &Document,
    images: &HashMap<String, GrayImage>,
    writer: &mut W,
) -> io::Result<(usize, usize)> {
    let mut stream = PdfStreamWriter::new(writer, document.page_size, images)?;
    for page in &document.pages {
        stream.add_page(page)?;
    }
    stream.finish()
}

struct FontResource {
    resource: String,
    obj_id: usize,
}

struct PdfStreamWriter<'a, W: Write> {
    writer: &'a mut W,
    offset: usize,
    /// Byte offset per object id; index 0 is the unused free entry.
    offsets: Vec<usize>,
    next_id: usize,
    page_size: Size,
    images: &'a HashMap<String, GrayImage>,

    fonts: BTreeMap<String, FontResource>,
    next_font_index: usize,
    image_resources: Vec<(String, usize)>,
    image_name_map: HashMap<String, String>,
    image_content_map: HashMap<[u8; 32], String>,
    next_image_index: usize,
    page_ids: Vec<usize>,
}

impl<'a, W: Write> PdfStreamWriter<'a, W> {
    fn new(
        writer: &'a mut W,
        page_size: Size,
        images: &'a HashMap<String, GrayImage>,
    ) -> io::Result<Self> {
        let mut offset = 0usize;
        write_bytes(writer, b"%PDF-1.7\n", &mut offset)?;
        write_bytes(writer, b"%\xE2\xE3\xCF\xD3\n", &mut offset)?;
        Ok(Self {
            writer,
            offset,
            offsets: vec![0; PDF_RESOURCES_ID + 1],
            next_id: PDF_RESOURCES_ID + 1,
            page_size,
            images,
            fonts: BTreeMap::new(),
            next_font_index: 1,
            image_resources: Vec::new(),
            image_name_map: HashMap::new(),
            image_content_map: HashMap::new(),
            next_image_index: 1,
            page_ids: Vec::new(),
        })
    }

    fn alloc_id(&mut self) -> usize {
        let id = self.next_id;
        self.next_id += 1;
        self.offsets.push(0);
        id
    }

    fn write_object(&mut self, obj_id: usize, body: &str) -> io::Result<()> {
        self.offsets[obj_id] = self.offset;
        write_str(
            self.writer,
            &format!("{} 0 obj\n{}\nendobj\n", obj_id, body),
            &mut self.offset,
        )
    }

    fn add_page(&mut self, page: &Page) -> io::Result<()> {
        let content = self.render_page(page)?;
        let content_id = self.alloc_id();
        let page_id = self.alloc_id();
        self.write_object(
            content_id,
            &format!(
                "<< /Length {} >>\nstream\n{}endstream",
                content.len(),
                content
            ),
        )?;
        self.write_object(
            page_id,
            &format!(
                "<< /Type /Page /Parent {} 0 R /MediaBox [0 0 {} {}] /Resources {} 0 R /Contents {} 0 R >>",
                PDF_PAGES_ID,
                fmt_pt(self.page_size.width),
                fmt_pt(self.page_size.height),
                PDF_RESOURCES_ID,
                content_id
            ),
        )?;
        self.page_ids.push(page_id);
        Ok(())
    }

    fn render_page(&mut self, page: &Page) -> io::Result<String> {
        let height = self.page_size.height;
        let mut out = String::new();
        let mut font_name = "Helvetica".to_string();
        let mut font_size = Pt::from_f32(12.0);
        for command in &page.commands {
            match command {
                Command::SetFillColor(color) => {
                    out.push_str(&format!("{} rg\n", fmt_color(*color)));
                }
                Command::SetStrokeColor(color) => {
                    out.push_str(&format!("{} RG\n", fmt_color(*color)));
                }
                Command::SetLineWidth(width) => {
                    out.push_str(&format!("{} w\n", fmt_pt(*width)));
                }
                Command::SetFontName(name) => {
                    font_name = name.clone();
                }
                Command::SetFontSize(size) => {
                    font_size = *size;
                }
                Command::DrawRect {
                    x,
                    y,
                    width,
                    height: h,
                    mode,
                } => {
                    let op = match mode {
                        PaintMode::Fill => "f",
                        PaintMode::Stroke => "S",
                        PaintMode::FillStroke => "B",
                    };
                    out.push_str(&format!(
                        "{} {} {} {} re {}\n",
                        fmt_pt(*x),
                        fmt_pt(height - *y - *h),
                        fmt_pt(*width),
                        fmt_pt(*h),
                        op
                    ));
                }
                Command::DrawLine { x1, y1, x2, y2 } => {
                    out.push_str(&format!(
                        "{} {} m {} {} l S\n",
                        fmt_pt(*x1),
                        fmt_pt(height - *y1),
                        fmt_pt(*x2),
                        fmt_pt(height - *y2)
                    ));
                }
                Command::DrawString { x, y, text } => {
                    let resource = self.ensure_font(&font_name)?;
                    out.push_str(&format!(
                        "BT /{} {} Tf {} {} Td ({}) Tj ET\n",
                        resource,
                        fmt_pt(font_size),
                        fmt_pt(*x),
                        fmt_pt(height - *y),
                        escape_pdf_text(text)
                    ));
                }
                Command::DrawImage {
                    x,
                    y,
                    width,
                    height: h,
                    resource_id,
                } => {
                    if let Some(name) = self.ensure_image(resource_id)? {
                        out.push_str(&format!(
                            "q {} 0 0 {} {} {} cm /{} Do Q\n",
                            fmt_pt(*width),
                            fmt_pt(*h),
                            fmt_pt(*x),
                            fmt_pt(height - *y - *h),
                            name
                        ));
                    }
                }
            }
        }
        Ok(out)
    }

    fn ensure_font(&mut self, name: &str) -> io::Result<String> {
        let base = base14_name(name);
        if let Some(font) = self.fonts.get(base) {
            return Ok(font.resource.clone());
        }
        let obj_id = self.alloc_id();
        let resource = format!("F{}", self.next_font_index);
        self.next_font_index += 1;
        self.write_object(
            obj_id,
            &format!(
                "<< /Type /Font /Subtype /Type1 /BaseFont /{} /Encoding /WinAnsiEncoding >>",
                base
            ),
        )?;
        self.fonts.insert(
            base.to_string(),
            FontResource {
                resource: resource.clone(),
                obj_id,
            },
        );
        Ok(resource)
    }

    fn ensure_image(&mut self, resource_id: &str) -> io::Result<Option<String>> {
        if let Some(name) = self.image_name_map.get(resource_id) {
            return Ok(Some(name.clone()));
        }
        let Some(image) = self.images.get(resource_id) else {
            return Ok(None);
        };

        let hash = hash_image(image);
        if let Some(name) = self.image_content_map.get(&hash) {
            let name = name.clone();
            self.image_name_map
                .insert(resource_id.to_string(), name.clone());
            return Ok(Some(name));
        }

        let obj_id = self.alloc_id();
        let name = format!("Im{}", self.next_image_index);
        self.next_image_index += 1;

        let data = image.as_raw();
        self.offsets[obj_id] = self.offset;
        write_str(
            self.writer,
            &format!(
                "{} 0 obj\n<< /Type /XObject /Subtype /Image /Width {} /Height {} /ColorSpace /DeviceGray /BitsPerComponent 8 /Length {} >>\nstream\n",
                obj_id,
                image.width(),
                image.height(),
                data.len()
            ),
            &mut self.offset,
        )?;
        write_bytes(self.writer, data, &mut self.offset)?;
        write_str(self.writer, "\nendstream\nendobj\n", &mut self.offset)?;

        self.image_resources.push((name.clone(), obj_id));
        self.image_content_map.insert(hash, name.clone());
        self.image_name_map
            .insert(resource_id.to_string(), name.clone());
        Ok(Some(name))
    }

    fn finish(mut self) -> io::Result<(usize, usize)> {
        let mut resources = String::from("<< /Font <<");
        for font in self.fonts.values() {
            resources.push_str(&format!(" /{} {} 0 R", font.resource, font.obj_id));
        }
        resources.push_str(" >>");
        if !self.image_resources.is_empty() {
            resources.push_str(" /XObject <<");
            for (name, obj_id) in &self.image_resources {
                resources.push_str(&format!(" /{} {} 0 R", name, obj_id));
            }
            resources.push_str(" >>");
        }
        resources.push_str(" >>");
        self.write_object(PDF_RESOURCES_ID, &resources)?;

        let kids = self
            .page_ids
            .iter()
            .map(|id| format!("{} 0 R", id))
            .collect::<Vec<_>>()
            .join(" ");
        self.write_object(
            PDF_PAGES_ID,
            &format!(
                "<< /Type /Pages /Kids [{}] /Count {} >>",
                kids,
                self.page_ids.len()
            ),
        )?;
        self.write_object(
            PDF_CATALOG_ID,
            &format!("<< /Type /Catalog /Pages {} 0 R >>", PDF_PAGES_ID),
        )?;

        let total_objects = self.next_id - 1;
        let xref_start = self.offset;
        let mut xref = format!("xref\n0 {}\n0000000000 65535 f \n", total_objects + 1);
        for id in 1..self.next_id {
            xref.push_str(&format!("{:010} 00000 n \n", self.offsets[id]));
        }
        write_str(self.writer, &xref, &mut self.offset)?;
        write_str(
            self.writer,
            &format!(
                "trailer\n<< /Size {} /Root {} 0 R >>\nstartxref\n{}\n%%EOF",
                total_objects + 1,
                PDF_CATALOG_ID,
                xref_start
            ),
            &mut self.offset,
        )?;
        self.writer.flush()?;
        Ok((self.offset, self.image_resources.len()))
    }
}

fn base14_name(name: &str) -> &'static str {
    match name {
        "Helvetica-Bold" => "Helvetica-Bold",
        "Helvetica-Oblique" => "Helvetica-Oblique",
        _ => "Helvetica",
    }
}

fn hash_image(image: &GrayImage) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(image.width().to_le_bytes());
    hasher.update(image.height().to_le_bytes());
    hasher.update(image.as_raw());
    hasher.finalize().into()
}

fn fmt_pt(value: Pt) -> String {
    fmt_f32(value.to_f32())
}

fn fmt_color(color: Color) -> String {
    format!(
        "{} {} {}",
        fmt_f32(color.r),
        fmt_f32(color.g),
        fmt_f32(color.b)
    )
}

fn fmt_f32(value: f32) -> String {
    let mut s = format!("{:.3}", value);
    while s.ends_with('0') {
        s.pop();
    }
    if s.ends_with('.') {
        s.pop();
    }
    if s == "-0" { "0".to_string() } else { s }
}

/// WinAnsi literal-string escaping. ASCII passes through, a handful of
/// typographic characters map to their WinAnsi byte as an octal escape,
/// anything unmappable becomes `?`.
fn escape_pdf_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 4);
    for ch in text.chars() {
        match ch {
            '(' | ')' | '\\' => {
                out.push('\\');
                out.push(ch);
            }
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\u{2026}' => out.push_str("\\205"),
            '\u{2013}' => out.push_str("\\226"),
            '\u{2014}' => out.push_str("\\227"),
            '\u{2018}' => out.push_str("\\221"),
            '\u{2019}' => out.push_str("\\222"),
            '\u{201C}' => out.push_str("\\223"),
            '\u{201D}' => out.push_str("\\224"),
            c if (c as u32) >= 0x20 && (c as u32) < 0x7F => out.push(c),
            c if (c as u32) >= 0xA0 && (c as u32) <= 0xFF => {
                out.push_str(&format!("\\{:03o}", c as u32));
            }
            _ => out.push('?'),
        }
    }
    out
}

fn write_bytes<W: Write>(writer: &mut W, data: &[u8], offset: &mut usize) -> io::Result<()> {
    writer.write_all(data)?;
    *offset += data.len();
    Ok(())
}

fn write_str<W: Write>(writer: &mut W, data: &str, offset: &mut usize) -> io::Result<()> {
    write_bytes(writer, data.as_bytes(), offset)
}
