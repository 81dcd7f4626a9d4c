use nbreport_core::error::ReportError;
use nbreport_core::extraction::pdftotext::PdftotextExtractor;
use nbreport_core::extraction::LayoutExtractor;
use nbreport_core::geometry;
use std::path::{Path, PathBuf};

use crate::output;

pub fn run(config_path: Option<&Path>, pdf_file: PathBuf, page: Option<usize>) -> Result<(), ReportError> {
    let config = super::load_config(config_path)?;
    let pdf_bytes = std::fs::read(&pdf_file)?;
    let layout = PdftotextExtractor::new().extract_layout(&pdf_bytes)?;

    for p in &layout.pages {
        if page.is_some_and(|n| n != p.page_number) {
            continue;
        }
        println!("{}", output::table::format_page(p));
    }

    // Show what the configured anchors resolve to; a failure here is only
    // informational.
    match geometry::resolve(&layout, &config.geometry, &config.rows) {
        Ok(geometry) => println!("{}", output::table::format_geometry(&geometry)),
        Err(e) => eprintln!("  geometry: {e}"),
    }

    Ok(())
}
