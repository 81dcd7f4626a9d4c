//! Produce the report PDF: every template page as a full-page raster, with the
//! computed values drawn as text over the resolved cells of the overlay page.

pub mod font;

use crate::aggregate::RowTotal;
use crate::config::schema::RenderConfig;
use crate::error::ReportError;
use crate::extraction::{BBox, DocumentLayout, PageRaster};
use crate::geometry::TemplateGeometry;
use crate::parsing::values::format_gb;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use font::{OverlayFont, FONT_RESOURCE};
use pdf_writer::{Content, Filter, Finish, Name, Pdf, Rect, Ref, Str};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::io::Write;
use tracing::{debug, info};

const BACKGROUND: Name<'static> = Name(b"Bg");

/// One cell to paint on the overlay page.
#[derive(Debug, Clone, PartialEq)]
pub struct CellPaint {
    pub row_label: String,
    /// Cell box in PDF user space (origin bottom-left).
    pub rect: Rect,
    pub text: Option<PlacedText>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlacedText {
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub size: f32,
}

/// Decide what to paint in each resolved cell.
///
/// Cells whose row has no value are left untouched unless
/// `blank_missing_cells` is set, in which case they are only blanked.
pub fn plan_overlay(
    geometry: &TemplateGeometry,
    totals: &[RowTotal],
    config: &RenderConfig,
) -> Vec<CellPaint> {
    let values: HashMap<&str, Decimal> = totals
        .iter()
        .filter_map(|r| Some((r.label.as_str(), r.total.as_ref()?.total_gb)))
        .collect();

    geometry
        .cells
        .iter()
        .filter_map(|cell| {
            let value = values.get(cell.row_label.as_str()).copied();
            if value.is_none() && !config.blank_missing_cells {
                return None;
            }
            let rect = to_user_space(&cell.bbox, geometry.page_height);
            let text = value.map(|v| PlacedText {
                text: format_gb(v),
                x: rect.x1 + config.text_inset,
                y: rect.y1 + config.baseline_offset,
                size: (cell.bbox.height() * config.font_scale).max(config.min_font_size),
            });
            Some(CellPaint {
                row_label: cell.row_label.clone(),
                rect,
                text,
            })
        })
        .collect()
}

/// Flip a top-left origin box into PDF user space.
fn to_user_space(bbox: &BBox, page_height: f32) -> Rect {
    Rect::new(
        bbox.x_min,
        page_height - bbox.y_max,
        bbox.x_max,
        page_height - bbox.y_min,
    )
}

/// Assembles the output PDF from template rasters and overlay paints.
pub struct OverlayRenderer {
    font: OverlayFont,
    config: RenderConfig,
}

impl OverlayRenderer {
    pub fn new(config: &RenderConfig) -> Result<Self, ReportError> {
        Ok(OverlayRenderer {
            font: OverlayFont::load(config.font_path.as_deref())?,
            config: config.clone(),
        })
    }

    /// Render every template page, painting `totals` onto the overlay page.
    pub fn render(
        &self,
        rasters: &[PageRaster],
        layout: &DocumentLayout,
        geometry: &TemplateGeometry,
        totals: &[RowTotal],
    ) -> Result<Vec<u8>, ReportError> {
        if rasters.len() != layout.pages.len() {
            return Err(ReportError::Render(format!(
                "rasterizer produced {} page(s) but the template layout has {}",
                rasters.len(),
                layout.pages.len()
            )));
        }

        let paints = plan_overlay(geometry, totals, &self.config);
        let texts: Vec<String> = paints
            .iter()
            .filter_map(|p| p.text.as_ref().map(|t| t.text.clone()))
            .collect();

        let mut alloc = Ref::new(1);
        let catalog_id = alloc.bump();
        let tree_id = alloc.bump();
        let mut pdf = Pdf::new();
        let font_id = self.font.write(&mut pdf, &mut alloc, &texts)?;

        let mut page_ids = Vec::with_capacity(rasters.len());
        for raster in rasters {
            let page = layout.page(raster.page_number).ok_or_else(|| {
                ReportError::Render(format!(
                    "no layout for rasterized page {}",
                    raster.page_number
                ))
            })?;

            let page_id = alloc.bump();
            let image_id = alloc.bump();
            let content_id = alloc.bump();
            page_ids.push(page_id);

            write_image(&mut pdf, image_id, &raster.image)?;

            let mut content = Content::new();
            content
                .save_state()
                .transform([page.width, 0.0, 0.0, page.height, 0.0, 0.0])
                .x_object(BACKGROUND)
                .restore_state();

            let is_overlay = page.page_number == geometry.page_number;
            if is_overlay {
                self.paint_cells(&mut content, &paints);
            }
            pdf.stream(content_id, &content.finish());

            let mut page_writer = pdf.page(page_id);
            page_writer
                .media_box(Rect::new(0.0, 0.0, page.width, page.height))
                .parent(tree_id)
                .contents(content_id);
            let mut resources = page_writer.resources();
            resources.x_objects().pair(BACKGROUND, image_id);
            if is_overlay {
                resources.fonts().pair(FONT_RESOURCE, font_id);
            }
            resources.finish();
            page_writer.finish();
        }

        pdf.catalog(catalog_id).pages(tree_id);
        pdf.pages(tree_id)
            .kids(page_ids.iter().copied())
            .count(page_ids.len() as i32);

        info!(
            pages = page_ids.len(),
            cells = paints.len(),
            values = texts.len(),
            "rendered report"
        );
        Ok(pdf.finish())
    }

    fn paint_cells(&self, content: &mut Content, paints: &[CellPaint]) {
        for paint in paints {
            let r = paint.rect;
            content
                .set_fill_gray(self.config.background_gray)
                .rect(r.x1, r.y1, r.x2 - r.x1, r.y2 - r.y1)
                .fill_nonzero();

            let Some(text) = &paint.text else {
                debug!(label = %paint.row_label, "blanked cell without value");
                continue;
            };
            debug!(label = %paint.row_label, value = %text.text, size = text.size, "drawing value");
            content
                .set_fill_gray(0.0)
                .begin_text()
                .set_font(FONT_RESOURCE, text.size)
                .next_line(text.x, text.y)
                .show(Str(&self.font.encode(&text.text)))
                .end_text();
        }
    }
}

fn write_image(pdf: &mut Pdf, id: Ref, image: &image::RgbImage) -> Result<(), ReportError> {
    let data = deflate(image.as_raw())?;
    let mut xobject = pdf.image_xobject(id, &data);
    xobject
        .width(image.width() as i32)
        .height(image.height() as i32)
        .bits_per_component(8);
    xobject.color_space().device_rgb();
    xobject.filter(Filter::FlateDecode);
    xobject.finish();
    Ok(())
}

pub(crate) fn deflate(data: &[u8]) -> Result<Vec<u8>, ReportError> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}
