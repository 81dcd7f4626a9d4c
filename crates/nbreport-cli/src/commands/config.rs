use nbreport_core::config::builtin;
use nbreport_core::error::ReportError;
use std::path::Path;

use crate::output;

pub fn show(config_path: Option<&Path>) -> Result<(), ReportError> {
    let config = super::load_config(config_path)?;
    output::json::print(&config)
}

pub fn list() -> Result<(), ReportError> {
    println!("Available presets:\n");
    for name in builtin::PRESETS {
        let config = builtin::load_preset(name)?;
        println!("  {:<10} {} ({} rows)", name, config.name, config.rows.len());
        if let Some(ref desc) = config.description {
            println!("             {}", desc);
        }
        println!();
    }
    Ok(())
}

pub fn validate(file: &Path) -> Result<(), ReportError> {
    let config = nbreport_core::config::load_config(file)?;
    println!(
        "Configuration '{}' is valid: {} columns, {} rows, {} split rule(s)",
        config.name,
        config.columns.len(),
        config.rows.len(),
        config.splits.len()
    );
    Ok(())
}
