//! Deterministic single-pass partition of the entry list into pages.
//!
//! The first page is shorter whenever a header is configured; every later
//! page holds `columns * normal_rows` entries. Concatenating the returned
//! slices in order reproduces the input exactly.

use crate::QrCodeEntry;
use crate::layout::SheetLayout;

/// Split `entries` into per-page slices. An empty input still yields one
/// (empty) page: a document must have at least one page to be valid
/// output, and the header is drawn even with nothing to print.
pub fn paginate<'a>(entries: &'a [QrCodeEntry], layout: &SheetLayout) -> Vec<&'a [QrCodeEntry]> {
    let first_capacity = layout.first_page_capacity();
    let normal_capacity = layout.normal_page_capacity();

    let split = first_capacity.min(entries.len());
    let mut pages = vec![&entries[..split]];
    for chunk in entries[split..].chunks(normal_capacity) {
        pages.push(chunk);
    }
    pages
}

/// Closed-form page count for `n` entries: `1` when everything fits the
/// first page, otherwise `1 + ceil(remaining / normal_capacity)`.
pub fn page_count(n: usize, layout: &SheetLayout) -> usize {
    let first_capacity = layout.first_page_capacity();
    if n <= first_capacity {
        return 1;
    }
    let remaining = n - first_capacity;
    1 + remaining.div_ceil(layout.normal_page_capacity())
}
