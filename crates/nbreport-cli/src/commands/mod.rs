pub mod config;
pub mod layout;
pub mod parse;
pub mod render;
pub mod totals;

use nbreport_core::config::builtin;
use nbreport_core::config::schema::ReportConfig;
use nbreport_core::error::ReportError;
use nbreport_core::parsing::recovery::{CapacityRecovery, LargestNumericToken, StrictColumn};
use std::path::Path;
use tracing::debug;

/// The `--config` file, or the built-in preset.
pub fn load_config(path: Option<&Path>) -> Result<ReportConfig, ReportError> {
    match path {
        Some(path) => {
            debug!(path = %path.display(), "loading configuration");
            nbreport_core::config::load_config(path)
        }
        None => {
            debug!("using built-in netbackup preset");
            builtin::default_config()
        }
    }
}

pub fn recovery(strict_columns: bool) -> Box<dyn CapacityRecovery> {
    if strict_columns {
        Box::new(StrictColumn)
    } else {
        Box::new(LargestNumericToken)
    }
}
