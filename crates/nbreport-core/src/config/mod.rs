pub mod builtin;
pub mod schema;

use crate::error::ReportError;
use schema::ReportConfig;
use std::path::Path;

/// Load a configuration from a JSON file.
pub fn load_config(path: &Path) -> Result<ReportConfig, ReportError> {
    let content = std::fs::read_to_string(path).map_err(|e| ReportError::ConfigLoad {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    parse_config(&content, path)
}

/// Parse a configuration from a JSON string.
pub fn parse_config(json: &str, source: &Path) -> Result<ReportConfig, ReportError> {
    let config: ReportConfig = serde_json::from_str(json).map_err(|e| ReportError::ConfigLoad {
        path: source.to_path_buf(),
        reason: e.to_string(),
    })?;
    validate_config(&config)?;
    Ok(config)
}

/// Parse a configuration from a JSON string (no file path context).
pub fn parse_config_str(json: &str) -> Result<ReportConfig, ReportError> {
    let config: ReportConfig = serde_json::from_str(json).map_err(ReportError::Json)?;
    validate_config(&config)?;
    Ok(config)
}

/// Validate that a configuration is well-formed.
pub fn validate_config(config: &ReportConfig) -> Result<(), ReportError> {
    if config.columns.is_empty() {
        return Err(ReportError::ConfigInvalid("columns must not be empty".into()));
    }

    for field in config.fields.all() {
        if !config.columns.iter().any(|c| c == field) {
            return Err(ReportError::ConfigInvalid(format!(
                "field column '{}' is not listed in columns",
                field
            )));
        }
    }

    if config.rows.is_empty() {
        return Err(ReportError::ConfigInvalid("rows must not be empty".into()));
    }

    for row in &config.rows {
        if row.label.trim().is_empty() || row.policy.trim().is_empty() {
            return Err(ReportError::ConfigInvalid(
                "row label and policy must not be empty".into(),
            ));
        }
    }

    for split in &config.splits {
        for range in &split.ranges {
            if range.min >= range.max {
                return Err(ReportError::ConfigInvalid(format!(
                    "split range for '{}' -> '{}' is empty ({}..{})",
                    split.policy, range.instance, range.min, range.max
                )));
            }
        }
    }

    let geometry = &config.geometry;
    if geometry.page == 0 {
        return Err(ReportError::ConfigInvalid("geometry.page is 1-based".into()));
    }
    if geometry.header.is_empty() && (geometry.fragments.is_empty() || geometry.boundary.is_empty())
    {
        return Err(ReportError::ConfigInvalid(
            "geometry needs a header anchor or fragments plus a boundary anchor".into(),
        ));
    }
    if geometry.line_tolerance < 0.0 {
        return Err(ReportError::ConfigInvalid(
            "geometry.line_tolerance must not be negative".into(),
        ));
    }

    if config.render.dpi == 0 {
        return Err(ReportError::ConfigInvalid("render.dpi must be positive".into()));
    }
    if !(0.0..=1.0).contains(&config.render.background_gray) {
        return Err(ReportError::ConfigInvalid(
            "render.background_gray must be within 0.0..=1.0".into(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"{
        "name": "Test",
        "columns": ["Job Id", "Job Policy", "Client", "Start Time", "End Time", "Kilobytes", "Pathname", "Instance or Database"],
        "fields": {
            "id": "Job Id", "category": "Job Policy", "start_time": "Start Time",
            "end_time": "End Time", "capacity": "Kilobytes", "client": "Client",
            "instance": "Instance or Database", "path": "Pathname"
        },
        "rows": [ { "label": "ERP", "policy": "ERP" } ]
    }"#;

    #[test]
    fn test_parse_minimal_config_applies_defaults() {
        let config = parse_config_str(MINIMAL).unwrap();
        assert_eq!(config.name, "Test");
        assert_eq!(config.geometry.page, 2);
        assert_eq!(config.render.dpi, 150);
        assert_eq!(config.render.min_font_size, 9.0);
        assert!(config.splits.is_empty());
    }

    #[test]
    fn test_field_outside_columns_rejected() {
        let json = MINIMAL.replace("\"capacity\": \"Kilobytes\"", "\"capacity\": \"Bytes\"");
        assert!(matches!(
            parse_config_str(&json),
            Err(ReportError::ConfigInvalid(_))
        ));
    }

    #[test]
    fn test_empty_split_range_rejected() {
        let json = MINIMAL.replace(
            "\"rows\"",
            r#""splits": [ { "policy": "ERP", "default_instance": "X",
                "ranges": [ { "min": 10, "max": 10, "instance": "Y" } ] } ],
            "rows""#,
        );
        assert!(parse_config_str(&json).is_err());
    }

    #[test]
    fn test_load_config_missing_file() {
        let err = load_config(Path::new("/nonexistent/nbreport.json")).unwrap_err();
        assert_eq!(err.code(), "CONFIG_ERROR");
    }
}
