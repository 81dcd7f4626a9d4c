pub mod datetime;
pub mod fixed_width;
pub mod recovery;
pub mod values;

use crate::config::schema::ReportConfig;
use crate::error::ReportError;
use crate::model::{CategoryKey, ColumnSpan, JobRecord};
use datetime::parse_job_datetime;
use fixed_width::{
    column_spans, data_start, decode_field, find_header, is_blank, is_separator, slice_field,
    split_lines,
};
use recovery::CapacityRecovery;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use values::{kb_to_gb, parse_kilobytes};

/// Result of extracting job records from an export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedJobs {
    pub jobs: Vec<JobRecord>,
    pub columns: Vec<ColumnSpan>,
    /// 1-based line number of the header.
    pub header_line: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped_lines: Vec<SkippedLine>,
}

/// A non-blank line after the header that did not become a job record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkippedLine {
    pub line_number: usize,
    pub line_text: String,
    pub reason: String,
}

/// Column positions of the fields a job record is built from.
struct FieldIndex {
    id: usize,
    category: usize,
    start_time: usize,
    end_time: usize,
    capacity: usize,
    client: usize,
    instance: usize,
    path: usize,
}

impl FieldIndex {
    fn resolve(config: &ReportConfig) -> Result<Self, ReportError> {
        let idx = |name: &str| {
            config
                .columns
                .iter()
                .position(|c| c == name)
                .ok_or_else(|| {
                    ReportError::ConfigInvalid(format!(
                        "field column '{}' is not listed in columns",
                        name
                    ))
                })
        };
        let f = &config.fields;
        Ok(FieldIndex {
            id: idx(&f.id)?,
            category: idx(&f.category)?,
            start_time: idx(&f.start_time)?,
            end_time: idx(&f.end_time)?,
            capacity: idx(&f.capacity)?,
            client: idx(&f.client)?,
            instance: idx(&f.instance)?,
            path: idx(&f.path)?,
        })
    }
}

/// Extract job records from a fixed-width job export.
///
/// Fails with `TableFormat` when the header or one of its columns cannot be
/// located, or when no data line yields a job.
pub fn parse_jobs(
    raw: &[u8],
    config: &ReportConfig,
    recovery: &dyn CapacityRecovery,
) -> Result<ParsedJobs, ReportError> {
    let fields = FieldIndex::resolve(config)?;
    let first_column = config
        .columns
        .first()
        .ok_or_else(|| ReportError::ConfigInvalid("columns must not be empty".into()))?;

    let lines = split_lines(raw);
    let header_idx = find_header(
        &lines,
        &[
            first_column.as_str(),
            config.fields.category.as_str(),
            config.fields.start_time.as_str(),
        ],
    )?;
    let spans = column_spans(lines[header_idx], &config.columns)?;
    let start = data_start(&lines, header_idx);
    debug!(
        header_line = header_idx + 1,
        data_start = start + 1,
        columns = spans.len(),
        "located job table header"
    );

    let mut jobs = Vec::new();
    let mut skipped_lines = Vec::new();

    for (offset, line) in lines[start..].iter().enumerate() {
        let line_number = start + offset + 1;
        if is_blank(line) || is_separator(line) {
            continue;
        }
        if line.starts_with(first_column.as_bytes()) {
            skipped_lines.push(SkippedLine {
                line_number,
                line_text: decode_field(line),
                reason: "repeated header".into(),
            });
            continue;
        }

        match parse_job_line(line, line_number, &spans, &fields, recovery) {
            Some(job) => jobs.push(job),
            None => {
                debug!(line_number, "skipping line without numeric job id");
                skipped_lines.push(SkippedLine {
                    line_number,
                    line_text: decode_field(line),
                    reason: "job id is not numeric".into(),
                });
            }
        }
    }

    if jobs.is_empty() {
        return Err(ReportError::TableFormat(
            "no job rows parsed after the header".into(),
        ));
    }

    info!(
        jobs = jobs.len(),
        skipped = skipped_lines.len(),
        recovery = recovery.name(),
        "parsed job export"
    );

    Ok(ParsedJobs {
        jobs,
        columns: spans,
        header_line: header_idx + 1,
        skipped_lines,
    })
}

/// Build one job record, or `None` when the id field is not purely numeric.
fn parse_job_line(
    line: &[u8],
    line_number: usize,
    spans: &[ColumnSpan],
    fields: &FieldIndex,
    recovery: &dyn CapacityRecovery,
) -> Option<JobRecord> {
    let field = |index: usize| decode_field(slice_field(line, spans, index));

    let job_id = field(fields.id);
    if job_id.is_empty() || !job_id.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    let kb_text = recovery.recover(line, &field(fields.capacity));
    let instance = field(fields.instance);

    Some(JobRecord {
        job_id,
        key: CategoryKey {
            policy: field(fields.category),
            instance: if instance.is_empty() {
                None
            } else {
                Some(instance)
            },
        },
        client: field(fields.client),
        start: parse_job_datetime(&field(fields.start_time)),
        end: parse_job_datetime(&field(fields.end_time)),
        kilobytes: parse_kilobytes(&kb_text),
        capacity_gb: kb_to_gb(&kb_text),
        pathname: field(fields.path),
        line_number,
    })
}
