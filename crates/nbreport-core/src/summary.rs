use crate::aggregate::RowTotal;
use crate::config::schema::CompareConfig;
use crate::error::ReportError;
use crate::model::CategoryKey;
use crate::parsing::values::format_gb;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

/// Persisted outcome of a run, used as the baseline of the next one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub config: String,
    pub rows: Vec<SummaryRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryRow {
    pub label: String,
    pub key: CategoryKey,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub total_gb: Option<Decimal>,
    #[serde(default)]
    pub job_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remark: Option<String>,
}

/// A period-over-period change large enough to call out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Remark {
    pub label: String,
    pub previous_gb: Decimal,
    pub current_gb: Decimal,
    pub text: String,
}

impl ReportSummary {
    pub fn from_totals(config_name: &str, totals: &[RowTotal]) -> Self {
        ReportSummary {
            config: config_name.to_string(),
            rows: totals
                .iter()
                .map(|row| SummaryRow {
                    label: row.label.clone(),
                    key: row.key.clone(),
                    date: row.total.as_ref().map(|t| t.date),
                    total_gb: row.total.as_ref().map(|t| t.total_gb),
                    job_count: row.total.as_ref().map_or(0, |t| t.job_count),
                    remark: None,
                })
                .collect(),
        }
    }

    pub fn load(path: &Path) -> Result<Self, ReportError> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Attach `remarks` to their rows.
    pub fn with_remarks(mut self, remarks: &[Remark]) -> Self {
        for row in &mut self.rows {
            row.remark = remarks
                .iter()
                .find(|r| r.label == row.label)
                .map(|r| r.text.clone());
        }
        self
    }
}

/// Remarks for rows whose total moved by at least the configured threshold.
///
/// Rows without a total in either period, and excluded labels, never get one.
pub fn compare(current: &ReportSummary, previous: &ReportSummary, config: &CompareConfig) -> Vec<Remark> {
    let previous_totals: HashMap<&str, Decimal> = previous
        .rows
        .iter()
        .filter_map(|r| Some((r.label.as_str(), r.total_gb?)))
        .collect();

    current
        .rows
        .iter()
        .filter(|row| !config.exclude.iter().any(|e| e == &row.label))
        .filter_map(|row| {
            let cur = row.total_gb?;
            let prev = *previous_totals.get(row.label.as_str())?;
            let diff = cur - prev;
            if diff.abs() < config.threshold_gb {
                return None;
            }
            let trend = if diff > Decimal::ZERO { "증가" } else { "감소" };
            let text = format!(
                "{}GB -> {}GB ({}GB{})",
                format_gb(prev),
                format_gb(cur),
                format_gb(diff.abs()),
                trend
            );
            debug!(label = %row.label, remark = %text, "change remark");
            Some(Remark {
                label: row.label.clone(),
                previous_gb: prev,
                current_gb: cur,
                text,
            })
        })
        .collect()
}

/// Remarks against `previous`, if it exists; a missing file means no baseline.
pub fn compare_with_file(
    current: &ReportSummary,
    previous: &Path,
    config: &CompareConfig,
) -> Result<Vec<Remark>, ReportError> {
    if !previous.exists() {
        debug!(path = %previous.display(), "no previous summary");
        return Ok(Vec::new());
    }
    let previous = ReportSummary::load(previous)?;
    Ok(compare(current, &previous, config))
}
