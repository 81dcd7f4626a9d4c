//! Locate table cells of the template from its word layout.
//!
//! The value column is found from header anchor words, each row from its
//! label word; a cell is the column's horizontal extent crossed with the
//! row's vertical extent.

use crate::config::schema::{GeometryConfig, RowDef};
use crate::error::ReportError;
use crate::extraction::{BBox, DocumentLayout, PageLayout};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Horizontal extent of the value column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColumnBounds {
    pub x_min: f32,
    pub x_max: f32,
    pub source: ColumnSource,
}

/// Which anchors established the column bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnSource {
    /// Between the preceding header's words and the following header.
    Fragments,
    /// Around the column's own header word.
    Header,
}

/// Region a semantic (row, column) cell occupies on the overlay page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellRegion {
    pub row_label: String,
    pub column: String,
    pub bbox: BBox,
}

/// Resolved cell layout of the overlay page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateGeometry {
    pub page_number: usize,
    pub page_width: f32,
    pub page_height: f32,
    pub column: ColumnBounds,
    /// In configured row order; rows without an anchor are absent.
    pub cells: Vec<CellRegion>,
}

impl TemplateGeometry {
    pub fn cell(&self, row_label: &str) -> Option<&CellRegion> {
        self.cells.iter().find(|c| c.row_label == row_label)
    }
}

/// Resolve the value column and every labelled row on the overlay page.
///
/// Fails with `TemplateGeometry` when the page or the column bounds cannot be
/// established. Rows whose label is not on the page are skipped.
pub fn resolve(
    layout: &DocumentLayout,
    config: &GeometryConfig,
    rows: &[RowDef],
) -> Result<TemplateGeometry, ReportError> {
    let page = layout.page(config.page).ok_or_else(|| {
        ReportError::TemplateGeometry(format!(
            "template has {} page(s), overlay page {} is missing",
            layout.pages.len(),
            config.page
        ))
    })?;

    let column = column_bounds(page, config)?;
    debug!(
        x_min = column.x_min,
        x_max = column.x_max,
        source = ?column.source,
        "resolved value column"
    );

    let mut cells = Vec::new();
    for row in rows {
        match row_extent(page, &row.label, config.line_tolerance) {
            Some((y_min, y_max)) => cells.push(CellRegion {
                row_label: row.label.clone(),
                column: config.column_name.clone(),
                bbox: BBox {
                    x_min: column.x_min,
                    y_min,
                    x_max: column.x_max,
                    y_max,
                },
            }),
            None => warn!(label = %row.label, page = config.page, "row label not found in template"),
        }
    }

    Ok(TemplateGeometry {
        page_number: page.page_number,
        page_width: page.width,
        page_height: page.height,
        column,
        cells,
    })
}

/// Horizontal bounds of the value column.
///
/// Prefers the span between the preceding header (all of its fragment words)
/// and the following boundary header; otherwise pads the column's own header.
pub fn column_bounds(page: &PageLayout, config: &GeometryConfig) -> Result<ColumnBounds, ReportError> {
    let bounds = fragment_bounds(page, config).or_else(|| header_bounds(page, config));

    match bounds {
        Some(b) if b.x_max > b.x_min => Ok(b),
        Some(b) => Err(ReportError::TemplateGeometry(format!(
            "value column bounds are empty ({:.1}..{:.1})",
            b.x_min, b.x_max
        ))),
        None => Err(ReportError::TemplateGeometry(format!(
            "cannot determine value column bounds: neither '{}' nor '{}' + '{}' found on page {}",
            config.header,
            config.fragments.join(" "),
            config.boundary,
            page.page_number
        ))),
    }
}

fn fragment_bounds(page: &PageLayout, config: &GeometryConfig) -> Option<ColumnBounds> {
    if config.fragments.is_empty() || config.boundary.is_empty() {
        return None;
    }
    let fragments = config
        .fragments
        .iter()
        .map(|t| page.find_word(t))
        .collect::<Option<Vec<_>>>()?;
    let boundary = page.find_word(&config.boundary)?;

    let right_edge = fragments
        .iter()
        .map(|w| w.bbox.x_max)
        .fold(f32::NEG_INFINITY, f32::max);

    Some(ColumnBounds {
        x_min: right_edge + config.boundary_gap,
        x_max: boundary.bbox.x_min - config.boundary_gap,
        source: ColumnSource::Fragments,
    })
}

fn header_bounds(page: &PageLayout, config: &GeometryConfig) -> Option<ColumnBounds> {
    if config.header.is_empty() {
        return None;
    }
    let header = page.find_word(&config.header)?;
    Some(ColumnBounds {
        x_min: header.bbox.x_min - config.header_margin_left,
        x_max: header.bbox.x_max + config.header_margin_right,
        source: ColumnSource::Header,
    })
}

/// Vertical extent of the rendered line carrying `label`.
pub fn row_extent(page: &PageLayout, label: &str, tolerance: f32) -> Option<(f32, f32)> {
    let anchor = page.find_word(label)?;
    let line = page.line_words(anchor.bbox.y_min, tolerance);
    let union = BBox::union(line.iter().map(|w| &w.bbox))?;
    Some((union.y_min, union.y_max))
}
