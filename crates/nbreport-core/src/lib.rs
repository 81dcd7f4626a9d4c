pub mod aggregate;
pub mod config;
pub mod error;
pub mod extraction;
pub mod geometry;
pub mod model;
pub mod parsing;
pub mod render;
pub mod summary;

use aggregate::RowTotal;
use config::schema::ReportConfig;
use error::ReportError;
use extraction::{LayoutExtractor, Rasterizer};
use geometry::TemplateGeometry;
use model::{CategoryKey, CategoryTotal};
use parsing::recovery::CapacityRecovery;
use parsing::ParsedJobs;
use render::OverlayRenderer;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;
use summary::ReportSummary;
use tracing::{debug, info};

/// Job records and per-row totals of one export.
#[derive(Debug, Clone)]
pub struct Totals {
    pub parsed: ParsedJobs,
    pub rows: Vec<RowTotal>,
    /// Totals per exact category key, after splitting.
    pub by_key: BTreeMap<CategoryKey, CategoryTotal>,
}

/// Everything a full run produces. Nothing is written to disk here.
#[derive(Debug, Clone)]
pub struct Report {
    pub pdf: Vec<u8>,
    pub totals: Totals,
    pub geometry: TemplateGeometry,
    pub summary: ReportSummary,
}

/// Parse a job export and total it per configured report row.
///
/// Split rules are applied before matching records to rows.
pub fn compute_totals(
    raw: &[u8],
    config: &ReportConfig,
    recovery: &dyn CapacityRecovery,
) -> Result<Totals, ReportError> {
    let parsed = parsing::parse_jobs(raw, config, recovery)?;
    let records = aggregate::split::reclassify(&parsed.jobs, &config.splits);
    let rows = aggregate::row_totals(&records, &config.rows);
    let by_key = aggregate::totals_by_key(&records);

    info!(
        jobs = parsed.jobs.len(),
        skipped = parsed.skipped_lines.len(),
        rows_with_value = rows.iter().filter(|r| r.total.is_some()).count(),
        rows = rows.len(),
        "computed row totals"
    );
    Ok(Totals {
        parsed,
        rows,
        by_key,
    })
}

/// Main API entry point: build the report PDF from an export and a template.
///
/// Runs extraction, aggregation, template geometry and rendering in that
/// order; the first failure aborts the run.
pub fn build_report(
    raw: &[u8],
    template_pdf: &[u8],
    config: &ReportConfig,
    recovery: &dyn CapacityRecovery,
    extractor: &dyn LayoutExtractor,
    rasterizer: &dyn Rasterizer,
) -> Result<Report, ReportError> {
    let totals = compute_totals(raw, config, recovery)?;

    let layout = extractor.extract_layout(template_pdf)?;
    let geometry = geometry::resolve(&layout, &config.geometry, &config.rows)?;
    info!(
        backend = extractor.backend_name(),
        page = geometry.page_number,
        cells = geometry.cells.len(),
        "resolved template geometry"
    );

    // Load the font before rasterizing so a bad font path fails fast.
    let renderer = OverlayRenderer::new(&config.render)?;
    let rasters = rasterizer.rasterize(template_pdf)?;
    debug!(backend = rasterizer.backend_name(), pages = rasters.len(), "rasterized template");
    let pdf = renderer.render(&rasters, &layout, &geometry, &totals.rows)?;

    let summary = ReportSummary::from_totals(&config.name, &totals.rows);
    Ok(Report {
        pdf,
        totals,
        geometry,
        summary,
    })
}

/// Write `bytes` to `path` through a temporary file in the same directory,
/// so the destination is either untouched or complete.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), ReportError> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| ReportError::Io(e.error))?;
    Ok(())
}
