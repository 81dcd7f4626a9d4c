use nbreport_core::error::ReportError;
use std::path::{Path, PathBuf};

use crate::output;

pub fn run(
    config_path: Option<&Path>,
    input_file: PathBuf,
    output_format: &str,
    output_file: Option<PathBuf>,
    strict_columns: bool,
) -> Result<(), ReportError> {
    let config = super::load_config(config_path)?;
    let raw = std::fs::read(&input_file)?;
    let recovery = super::recovery(strict_columns);
    let parsed = nbreport_core::parsing::parse_jobs(&raw, &config, recovery.as_ref())?;

    match output_file {
        Some(path) => {
            // Always write JSON when saving to file
            let json = serde_json::to_string_pretty(&parsed)?;
            nbreport_core::write_atomic(&path, json.as_bytes())?;
            eprintln!(
                "Parsed {} job(s), written to {}",
                parsed.jobs.len(),
                path.display()
            );
            if !parsed.skipped_lines.is_empty() {
                eprintln!(
                    "  {} line(s) skipped during parsing",
                    parsed.skipped_lines.len()
                );
            }
        }
        None => match output_format {
            "json" => output::json::print(&parsed)?,
            _ => println!("{}", output::table::format_jobs(&parsed)),
        },
    }

    Ok(())
}
