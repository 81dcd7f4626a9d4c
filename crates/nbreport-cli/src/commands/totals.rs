use nbreport_core::error::ReportError;
use nbreport_core::model::CategoryTotal;
use nbreport_core::summary::{self, ReportSummary};
use std::path::{Path, PathBuf};

use crate::output;

pub fn run(
    config_path: Option<&Path>,
    input_file: PathBuf,
    output_format: &str,
    previous: Option<PathBuf>,
    by_key: bool,
    strict_columns: bool,
) -> Result<(), ReportError> {
    let config = super::load_config(config_path)?;
    let raw = std::fs::read(&input_file)?;
    let recovery = super::recovery(strict_columns);
    let totals = nbreport_core::compute_totals(&raw, &config, recovery.as_ref())?;

    if by_key {
        let groups: Vec<&CategoryTotal> = totals.by_key.values().collect();
        match output_format {
            "json" => output::json::print(&groups)?,
            _ => println!("{}", output::table::format_key_totals(&groups)),
        }
        return Ok(());
    }

    let mut report = ReportSummary::from_totals(&config.name, &totals.rows);
    if let Some(previous) = previous {
        let remarks = summary::compare_with_file(&report, &previous, &config.compare)?;
        report = report.with_remarks(&remarks);
    }

    match output_format {
        "json" => output::json::print(&report)?,
        _ => println!("{}", output::table::format_summary(&report)),
    }

    Ok(())
}
