use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Everything a run needs besides its two inputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Header column names, left to right, exactly as they appear in the export.
    pub columns: Vec<String>,
    pub fields: FieldNames,
    /// Report rows in template order.
    pub rows: Vec<RowDef>,
    #[serde(default)]
    pub splits: Vec<SplitRule>,
    #[serde(default)]
    pub geometry: GeometryConfig,
    #[serde(default)]
    pub render: RenderConfig,
    #[serde(default)]
    pub compare: CompareConfig,
}

/// Which of `columns` play which role in a job record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldNames {
    pub id: String,
    pub category: String,
    pub start_time: String,
    pub end_time: String,
    pub capacity: String,
    pub client: String,
    pub instance: String,
    pub path: String,
}

impl FieldNames {
    pub fn all(&self) -> [&str; 8] {
        [
            &self.id,
            &self.category,
            &self.start_time,
            &self.end_time,
            &self.capacity,
            &self.client,
            &self.instance,
            &self.path,
        ]
    }
}

/// A labelled row of the template table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RowDef {
    /// Text of the row's anchor word in the template.
    pub label: String,
    pub policy: String,
    #[serde(default)]
    pub instance: Option<String>,
}

/// Splits one policy into sub-instances by the raw kilobyte value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitRule {
    pub policy: String,
    pub ranges: Vec<SplitRange>,
    pub default_instance: String,
}

/// Half-open range `[min, max)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitRange {
    pub min: u64,
    pub max: u64,
    pub instance: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeometryConfig {
    /// 1-based page carrying the value column.
    pub page: usize,
    pub column_name: String,
    /// Single-word column header.
    pub header: String,
    pub header_margin_left: f32,
    pub header_margin_right: f32,
    /// Words of the preceding header; the column starts after the rightmost one.
    pub fragments: Vec<String>,
    /// Header of the following column; the column ends before it.
    pub boundary: String,
    pub boundary_gap: f32,
    pub line_tolerance: f32,
}

impl Default for GeometryConfig {
    fn default() -> Self {
        GeometryConfig {
            page: 2,
            column_name: "백업용량".into(),
            header: "백업용량".into(),
            header_margin_left: 2.0,
            header_margin_right: 18.0,
            fragments: vec!["백업".into(), "대상".into(), "및".into(), "경로".into()],
            boundary: "백업결과".into(),
            boundary_gap: 2.0,
            line_tolerance: 0.7,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// TrueType font to embed. Helvetica is used when unset.
    pub font_path: Option<PathBuf>,
    pub dpi: u32,
    pub font_scale: f32,
    pub min_font_size: f32,
    pub text_inset: f32,
    pub baseline_offset: f32,
    /// 0.0 black .. 1.0 white.
    pub background_gray: f32,
    /// Also blank cells whose row has no computed value.
    pub blank_missing_cells: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        RenderConfig {
            font_path: None,
            dpi: 150,
            font_scale: 0.95,
            min_font_size: 9.0,
            text_inset: 2.0,
            baseline_offset: 1.0,
            background_gray: 1.0,
            blank_missing_cells: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompareConfig {
    /// Minimum absolute change (GB) worth a remark.
    pub threshold_gb: rust_decimal::Decimal,
    /// Row labels that never get a remark.
    pub exclude: Vec<String>,
}

impl Default for CompareConfig {
    fn default() -> Self {
        CompareConfig {
            threshold_gb: rust_decimal::Decimal::from(10),
            exclude: vec!["ERP-APP".into()],
        }
    }
}
