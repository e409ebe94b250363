//! Deterministic QR-code label sheet generator: turns a list of payloads
//! plus a grid configuration into a multi-page printable PDF.

mod canvas;
mod debug;
mod encode;
mod error;
mod layout;
mod paginate;
mod pdf;
mod render;
mod types;

pub use debug::DebugLogger;
pub use error::QrSheetError;
pub use layout::{SheetLayout, calculate_max_columns, calculate_max_rows};
pub use paginate::page_count;
pub use types::{Color, Orientation, PageSize, Pt, Rect, Size};

use chrono::{DateTime, Local};

/// One item to print. Input order is print order; `id` must be unique
/// across the list and joins the entry to its encoded image.
#[derive(Debug, Clone)]
pub struct QrCodeEntry {
    pub id: String,
    pub payload: String,
    /// Caption under the image; the payload is shown when absent.
    pub label: Option<String>,
}

/// Metadata block drawn once at the top of the first page.
#[derive(Debug, Clone)]
pub struct CompanyHeaderInfo {
    pub name: String,
    pub code: Option<String>,
    /// Caller-supplied generation timestamp; the engine never reads the
    /// wall clock itself.
    pub export_date: DateTime<Local>,
    /// Human-readable summary of any filters applied to the source list.
    pub filter_description: Option<String>,
}

#[cfg(test)]
impl CompanyHeaderInfo {
    pub(crate) fn for_tests() -> Self {
        use chrono::TimeZone;
        Self {
            name: "Acme Logistics".to_string(),
            code: Some("ACME-01".to_string()),
            export_date: Local.with_ymd_and_hms(2025, 1, 15, 10, 30, 0).unwrap(),
            filter_description: Some("status=allocated".to_string()),
        }
    }
}

/// Grid configuration for one generated document.
///
/// The resolver performs no clamping: validate a chosen cell size against
/// [`calculate_max_columns`] / [`calculate_max_rows`] before generating,
/// or expect [`QrSheetError::InvalidConfiguration`].
#[derive(Debug, Clone)]
pub struct SheetConfig {
    pub page_size: PageSize,
    pub orientation: Orientation,
    /// Edge length of the square QR image, in millimeters.
    pub qr_cell_size_mm: f32,
    pub columns: u32,
    /// Fixed rows per page; computed from the available height when absent.
    pub rows: Option<u32>,
    pub show_labels: bool,
    pub show_grid_lines: bool,
    pub header: Option<CompanyHeaderInfo>,
}

impl Default for SheetConfig {
    fn default() -> Self {
        Self {
            page_size: PageSize::A4,
            orientation: Orientation::Portrait,
            qr_cell_size_mm: 30.0,
            columns: 4,
            rows: None,
            show_labels: true,
            show_grid_lines: true,
            header: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct DocumentMetrics {
    pub pages: usize,
    pub entries: usize,
    /// Unique image XObjects embedded (repeated payloads share one).
    pub images_embedded: usize,
    pub bytes: usize,
}

/// Generate the PDF for `entries` under `config`.
///
/// The whole pipeline — geometry resolution, batched QR encoding,
/// pagination, rendering, serialization — runs to completion in this
/// call. Identical inputs produce byte-identical output.
pub fn generate_document(
    entries: &[QrCodeEntry],
    config: &SheetConfig,
) -> Result<Vec<u8>, QrSheetError> {
    generate_inner(entries, config, None).map(|(bytes, _)| bytes)
}

/// Like [`generate_document`], also returning per-document metrics.
pub fn generate_document_with_metrics(
    entries: &[QrCodeEntry],
    config: &SheetConfig,
) -> Result<(Vec<u8>, DocumentMetrics), QrSheetError> {
    generate_inner(entries, config, None)
}

/// Like [`generate_document`], with skipped-encode events and a summary
/// written to `logger`.
pub fn generate_document_with_logs(
    entries: &[QrCodeEntry],
    config: &SheetConfig,
    logger: &DebugLogger,
) -> Result<Vec<u8>, QrSheetError> {
    generate_inner(entries, config, Some(logger)).map(|(bytes, _)| bytes)
}

/// Streaming variant: serialize straight into `writer` instead of an
/// in-memory buffer. Returns the number of bytes written.
pub fn generate_document_to_writer<W: std::io::Write>(
    entries: &[QrCodeEntry],
    config: &SheetConfig,
    writer: &mut W,
) -> Result<usize, QrSheetError> {
    let layout = SheetLayout::resolve(config)?;
    let images = encode::encode_entries(entries, None);
    let pages = paginate::paginate(entries, &layout);
    let document = render::render_document(&pages, &images, &layout, config, entries.len());
    let (written, _) = pdf::document_to_writer(&document, &images, writer)?;
    Ok(written)
}

/// The per-page id partition generation would use, without rendering
/// anything. Useful for print-preview grids and tests.
pub fn page_partition(
    entries: &[QrCodeEntry],
    config: &SheetConfig,
) -> Result<Vec<Vec<String>>, QrSheetError> {
    let layout = SheetLayout::resolve(config)?;
    Ok(paginate::paginate(entries, &layout)
        .into_iter()
        .map(|page| page.iter().map(|entry| entry.id.clone()).collect())
        .collect())
}

fn generate_inner(
    entries: &[QrCodeEntry],
    config: &SheetConfig,
    logger: Option<&DebugLogger>,
) -> Result<(Vec<u8>, DocumentMetrics), QrSheetError> {
    let layout = SheetLayout::resolve(config)?;
    let images = encode::encode_entries(entries, logger);
    let pages = paginate::paginate(entries, &layout);
    let document = render::render_document(&pages, &images, &layout, config, entries.len());
    let (bytes, images_embedded) = pdf::document_to_pdf(&document, &images)?;

    let metrics = DocumentMetrics {
        pages: pages.len(),
        entries: entries.len(),
        images_embedded,
        bytes: bytes.len(),
    };
    if let Some(logger) = logger {
        logger.increment("generate.entries", entries.len() as u64);
        logger.increment("generate.pages", pages.len() as u64);
        logger.increment("generate.images_embedded", images_embedded as u64);
        logger.increment("generate.bytes", bytes.len() as u64);
        logger.emit_summary("generate");
        logger.flush();
    }
    Ok((bytes, metrics))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries(n: usize) -> Vec<QrCodeEntry> {
        (0..n)
            .map(|i| QrCodeEntry {
                id: format!("id-{i}"),
                payload: format!("https://example.com/assets/{i}"),
                label: Some(format!("Asset {i}")),
            })
            .collect()
    }

    fn config_with_header() -> SheetConfig {
        let mut config = SheetConfig::default();
        config.header = Some(CompanyHeaderInfo::for_tests());
        config
    }

    #[test]
    fn empty_input_yields_one_page_document() {
        let (bytes, metrics) =
            generate_document_with_metrics(&[], &config_with_header()).unwrap();
        assert_eq!(metrics.pages, 1);
        assert_eq!(metrics.entries, 0);
        assert_eq!(metrics.images_embedded, 0);
        let pdf = String::from_utf8_lossy(&bytes);
        assert!(pdf.contains("/Count 1"));
        assert!(pdf.contains("(Acme Logistics) Tj"));
    }

    #[test]
    fn scenario_120_entries_produces_six_pages() {
        let all = entries(120);
        let (bytes, metrics) =
            generate_document_with_metrics(&all, &config_with_header()).unwrap();
        assert_eq!(metrics.pages, 6);
        assert_eq!(metrics.entries, 120);
        assert_eq!(metrics.images_embedded, 120);
        let pdf = String::from_utf8_lossy(&bytes);
        assert!(pdf.contains("/Count 6"));
        assert!(pdf.contains("(Page 6 of 6) Tj"));
    }

    #[test]
    fn generation_is_byte_identical_across_runs() {
        let all = entries(37);
        let config = config_with_header();
        let a = generate_document(&all, &config).unwrap();
        let b = generate_document(&all, &config).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn partition_preserves_order_and_completeness() {
        let all = entries(53);
        let pages = page_partition(&all, &config_with_header()).unwrap();
        let flattened: Vec<String> = pages.into_iter().flatten().collect();
        let original: Vec<String> = all.iter().map(|e| e.id.clone()).collect();
        assert_eq!(flattened, original);
    }

    #[test]
    fn encode_failure_does_not_abort_generation() {
        let mut all = entries(10);
        all[4].payload = "x".repeat(8000);
        let (bytes, metrics) = generate_document_with_metrics(&all, &config_with_header()).unwrap();
        assert_eq!(metrics.pages, 1);
        assert_eq!(metrics.images_embedded, 9);
        // The failing entry's label still prints with its cell.
        let pdf = String::from_utf8_lossy(&bytes);
        assert!(pdf.contains("(Asset 4) Tj"));
    }

    #[test]
    fn invalid_configuration_is_reported_not_clamped() {
        let mut config = SheetConfig::default();
        config.qr_cell_size_mm = 500.0;
        let err = generate_document(&entries(3), &config).unwrap_err();
        assert!(matches!(err, QrSheetError::InvalidConfiguration(_)));
    }

    #[test]
    fn writer_variant_matches_buffer_variant() {
        let all = entries(12);
        let config = config_with_header();
        let buffered = generate_document(&all, &config).unwrap();
        let mut streamed = Vec::new();
        let written = generate_document_to_writer(&all, &config, &mut streamed).unwrap();
        assert_eq!(written, streamed.len());
        assert_eq!(buffered, streamed);
    }

    #[test]
    fn repeated_payloads_embed_one_image() {
        let all: Vec<QrCodeEntry> = (0..6)
            .map(|i| QrCodeEntry {
                id: format!("copy-{i}"),
                payload: "https://example.com/shared".to_string(),
                label: None,
            })
            .collect();
        let (_, metrics) = generate_document_with_metrics(&all, &SheetConfig::default()).unwrap();
        assert_eq!(metrics.images_embedded, 1);
    }

    #[test]
    fn debug_logger_records_skips_and_summary() {
        let mut path = std::env::temp_dir();
        path.push(format!("qrsheet_generate_{}.log", std::process::id()));
        let logger = DebugLogger::new(&path).unwrap();

        let mut all = entries(5);
        all[0].payload = "x".repeat(8000);
        generate_document_with_logs(&all, &config_with_header(), &logger).unwrap();
        drop(logger);

        let log = std::fs::read_to_string(&path).unwrap();
        assert!(log.contains("\"type\":\"encode.skip\""));
        assert!(log.contains("\"id\":\"id-0\""));
        assert!(log.contains("\"generate.pages\":1"));
        let _ = std::fs::remove_file(path);
    }
}
