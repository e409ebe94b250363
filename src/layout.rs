//! Geometry resolver: translates a named page size, orientation, and cell
//! size into concrete measurements, and derives how many columns and rows
//! fit the printable area.
//!
//! All fixed constants live here so that pagination, rendering, and the
//! caller-facing validation helpers agree on the same numbers.

use crate::SheetConfig;
use crate::error::QrSheetError;
use crate::types::{Orientation, PageSize, Pt, Size, oriented_dimensions_mm, oriented_size};

/// Outer page margin, all four sides.
pub const MARGIN_MM: f32 = 10.0;
/// Padding inside a cell, above and below the QR image.
pub const CELL_PADDING_MM: f32 = 2.0;
/// Extra row height reserved under the image when labels are shown.
pub const LABEL_HEIGHT_MM: f32 = 6.0;
/// Height reserved for the company header block on the first page.
pub const HEADER_HEIGHT_MM: f32 = 40.0;
/// Baseline distance of the page-number footer from the bottom edge.
pub const FOOTER_OFFSET_MM: f32 = 10.0;

pub const GRID_LINE_WIDTH_PT: f32 = 0.2;
pub const LABEL_FONT_SIZE_PT: f32 = 7.0;
pub const FOOTER_FONT_SIZE_PT: f32 = 8.0;
pub const HEADER_NAME_FONT_SIZE_PT: f32 = 14.0;
pub const HEADER_META_FONT_SIZE_PT: f32 = 9.0;

/// Largest column count such that every cell still gets the minimum cell
/// width. Labels do not affect width, so they are ignored here.
pub fn calculate_max_columns(
    qr_cell_size_mm: f32,
    page_size: PageSize,
    orientation: Orientation,
) -> u32 {
    let (page_w, _) = oriented_dimensions_mm(page_size, orientation);
    let avail = page_w - 2.0 * MARGIN_MM;
    let min_cell = qr_cell_size_mm + 2.0 * CELL_PADDING_MM;
    if !(min_cell > 0.0) || avail < min_cell {
        return 0;
    }
    (avail / min_cell).floor() as u32
}

/// Vertical analogue of [`calculate_max_columns`]. When `has_header` is
/// true the fixed header block is subtracted first, which is what makes
/// the first page of a document shorter than the rest.
pub fn calculate_max_rows(
    qr_cell_size_mm: f32,
    page_size: PageSize,
    orientation: Orientation,
    show_labels: bool,
    has_header: bool,
) -> u32 {
    let (_, page_h) = oriented_dimensions_mm(page_size, orientation);
    let mut avail = page_h - 2.0 * MARGIN_MM;
    if has_header {
        avail -= HEADER_HEIGHT_MM;
    }
    let cell_h = cell_height_mm(qr_cell_size_mm, show_labels);
    if !(cell_h > 0.0) || avail < cell_h {
        return 0;
    }
    (avail / cell_h).floor() as u32
}

fn cell_height_mm(qr_cell_size_mm: f32, show_labels: bool) -> f32 {
    let label = if show_labels { LABEL_HEIGHT_MM } else { 0.0 };
    qr_cell_size_mm + 2.0 * CELL_PADDING_MM + label
}

/// Resolved measurements for one sheet configuration, consumed by the
/// paginator and the renderer.
#[derive(Debug, Clone, Copy)]
pub struct SheetLayout {
    pub page_size: Size,
    pub margin: Pt,
    pub avail_width: Pt,
    pub avail_height: Pt,
    /// Zero when no header is configured.
    pub header_height: Pt,
    pub columns: u32,
    pub cell_width: Pt,
    pub cell_height: Pt,
    pub qr_size: Pt,
    pub first_rows: u32,
    pub normal_rows: u32,
}

impl SheetLayout {
    pub fn resolve(config: &SheetConfig) -> Result<SheetLayout, QrSheetError> {
        if config.columns == 0 {
            return Err(QrSheetError::InvalidConfiguration(
                "columns must be at least 1".to_string(),
            ));
        }
        if !(config.qr_cell_size_mm > 0.0) {
            return Err(QrSheetError::InvalidConfiguration(format!(
                "qr cell size must be positive, got {}",
                config.qr_cell_size_mm
            )));
        }
        if calculate_max_columns(config.qr_cell_size_mm, config.page_size, config.orientation) == 0
        {
            return Err(QrSheetError::InvalidConfiguration(format!(
                "qr cell size {}mm does not fit the printable width",
                config.qr_cell_size_mm
            )));
        }

        let has_header = config.header.is_some();
        let max_normal = calculate_max_rows(
            config.qr_cell_size_mm,
            config.page_size,
            config.orientation,
            config.show_labels,
            false,
        );
        let normal_rows = config.rows.unwrap_or(max_normal);
        let first_rows = if has_header {
            let max_first = calculate_max_rows(
                config.qr_cell_size_mm,
                config.page_size,
                config.orientation,
                config.show_labels,
                true,
            );
            normal_rows.min(max_first)
        } else {
            normal_rows
        };
        if normal_rows == 0 || first_rows == 0 {
            return Err(QrSheetError::InvalidConfiguration(format!(
                "no rows fit a {:?} {:?} page with {}mm cells",
                config.page_size, config.orientation, config.qr_cell_size_mm
            )));
        }

        let page_size = oriented_size(config.page_size, config.orientation);
        let margin = Pt::from_mm(MARGIN_MM);
        let avail_width = page_size.width - margin * 2;
        let avail_height = page_size.height - margin * 2;
        let header_height = if has_header {
            Pt::from_mm(HEADER_HEIGHT_MM)
        } else {
            Pt::ZERO
        };

        Ok(SheetLayout {
            page_size,
            margin,
            avail_width,
            avail_height,
            header_height,
            columns: config.columns,
            cell_width: avail_width / config.columns as i32,
            cell_height: Pt::from_mm(cell_height_mm(
                config.qr_cell_size_mm,
                config.show_labels,
            )),
            qr_size: Pt::from_mm(config.qr_cell_size_mm),
            first_rows,
            normal_rows,
        })
    }

    pub fn first_page_capacity(&self) -> usize {
        self.columns as usize * self.first_rows as usize
    }

    pub fn normal_page_capacity(&self) -> usize {
        self.columns as usize * self.normal_rows as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SheetConfig;

    #[test]
    fn max_columns_a4_portrait_30mm() {
        // 190mm available / 34mm per cell = 5 columns.
        assert_eq!(
            calculate_max_columns(30.0, PageSize::A4, Orientation::Portrait),
            5
        );
    }

    #[test]
    fn max_columns_zero_when_cell_exceeds_page() {
        assert_eq!(
            calculate_max_columns(200.0, PageSize::A4, Orientation::Portrait),
            0
        );
    }

    #[test]
    fn max_rows_accounts_for_labels_and_header() {
        // 277mm available; 34mm cells without labels, 40mm with.
        assert_eq!(
            calculate_max_rows(30.0, PageSize::A4, Orientation::Portrait, false, false),
            8
        );
        assert_eq!(
            calculate_max_rows(30.0, PageSize::A4, Orientation::Portrait, true, false),
            6
        );
        // Header takes another 40mm off the top: 237 / 40 = 5.
        assert_eq!(
            calculate_max_rows(30.0, PageSize::A4, Orientation::Portrait, true, true),
            5
        );
    }

    #[test]
    fn resolve_rejects_zero_columns() {
        let mut config = SheetConfig::default();
        config.columns = 0;
        assert!(matches!(
            SheetLayout::resolve(&config),
            Err(QrSheetError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn resolve_rejects_oversized_cell() {
        let mut config = SheetConfig::default();
        config.qr_cell_size_mm = 250.0;
        assert!(matches!(
            SheetLayout::resolve(&config),
            Err(QrSheetError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn max_helpers_feed_back_into_a_valid_config() {
        // Property: a config assembled from the max-columns/max-rows helpers
        // must resolve without a configuration error.
        for &(page, orientation, cell, labels) in &[
            (PageSize::A4, Orientation::Portrait, 30.0, true),
            (PageSize::A4, Orientation::Landscape, 25.0, false),
            (PageSize::A3, Orientation::Portrait, 50.0, true),
            (PageSize::Letter, Orientation::Landscape, 40.0, true),
            (PageSize::A5, Orientation::Portrait, 20.0, false),
        ] {
            let mut config = SheetConfig::default();
            config.page_size = page;
            config.orientation = orientation;
            config.qr_cell_size_mm = cell;
            config.show_labels = labels;
            config.columns = calculate_max_columns(cell, page, orientation);
            config.rows = Some(calculate_max_rows(cell, page, orientation, labels, false));
            let layout = SheetLayout::resolve(&config).expect("helpers produced a valid grid");
            assert!(layout.columns >= 1);
            assert!(layout.normal_rows >= 1);
            assert!(layout.first_rows >= 1);
        }
    }

    #[test]
    fn resolved_cell_width_divides_available_width() {
        let config = SheetConfig::default();
        let layout = SheetLayout::resolve(&config).unwrap();
        assert_eq!(
            layout.cell_width * layout.columns as i32,
            layout.avail_width
        );
    }

    #[test]
    fn header_shrinks_first_page_only() {
        let mut config = SheetConfig::default();
        config.header = Some(crate::CompanyHeaderInfo::for_tests());
        let layout = SheetLayout::resolve(&config).unwrap();
        assert!(layout.first_rows < layout.normal_rows);
        assert!(layout.header_height > Pt::ZERO);

        config.header = None;
        let layout = SheetLayout::resolve(&config).unwrap();
        assert_eq!(layout.first_rows, layout.normal_rows);
        assert_eq!(layout.header_height, Pt::ZERO);
    }
}
