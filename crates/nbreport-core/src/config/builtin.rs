use crate::config::schema::ReportConfig;
use crate::error::ReportError;

const NETBACKUP_JSON: &str = include_str!("../../../../presets/netbackup.json");

/// Available predefined configurations.
pub const PRESETS: &[&str] = &["netbackup"];

/// Load a predefined configuration by name.
pub fn load_preset(name: &str) -> Result<ReportConfig, ReportError> {
    match name {
        "netbackup" => {
            let config: ReportConfig = serde_json::from_str(NETBACKUP_JSON)?;
            Ok(config)
        }
        _ => Err(ReportError::ConfigInvalid(format!(
            "unknown preset '{}'. Available: {}",
            name,
            PRESETS.join(", ")
        ))),
    }
}

/// The configuration used when no `--config` is given.
pub fn default_config() -> Result<ReportConfig, ReportError> {
    load_preset("netbackup")
}
