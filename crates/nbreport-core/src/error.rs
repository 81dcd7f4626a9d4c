use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("job table format not recognized: {0}")]
    TableFormat(String),

    #[error("template layout cannot be resolved: {0}")]
    TemplateGeometry(String),

    #[error("layout extraction failed: {0}")]
    Extraction(String),

    #[error("{tool} not found. Install poppler: brew install poppler (macOS) or apt install poppler-utils (Linux)")]
    ToolNotFound { tool: &'static str },

    #[error("{tool} failed with exit code {code}: {stderr}")]
    ToolFailed {
        tool: &'static str,
        code: i32,
        stderr: String,
    },

    #[error("rasterization failed: {0}")]
    Raster(String),

    #[error("failed to load font from {path}: {reason}")]
    Font { path: PathBuf, reason: String },

    #[error("failed to render report: {0}")]
    Render(String),

    #[error("failed to load config from {path}: {reason}")]
    ConfigLoad { path: PathBuf, reason: String },

    #[error("invalid config: {0}")]
    ConfigInvalid(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
}

impl ReportError {
    /// Stable, machine-readable code for the failure class.
    pub fn code(&self) -> &'static str {
        match self {
            ReportError::TableFormat(_) => "TABLE_FORMAT_ERROR",
            ReportError::TemplateGeometry(_) => "TEMPLATE_GEOMETRY_ERROR",
            ReportError::Extraction(_)
            | ReportError::ToolNotFound { .. }
            | ReportError::ToolFailed { .. }
            | ReportError::Raster(_) => "TOOL_ERROR",
            ReportError::ConfigLoad { .. } | ReportError::ConfigInvalid(_) => "CONFIG_ERROR",
            ReportError::Font { .. } | ReportError::Render(_) | ReportError::Image(_) => {
                "RENDER_ERROR"
            }
            ReportError::Io(_) | ReportError::Json(_) => "IO_ERROR",
        }
    }
}
