//! Integration tests for the compute_totals() / build_report() pipeline.
//!
//! Uses mock layout and raster backends so these tests run without
//! poppler-utils.

use nbreport_core::config::parse_config_str;
use nbreport_core::config::schema::ReportConfig;
use nbreport_core::error::ReportError;
use nbreport_core::extraction::{
    BBox, DocumentLayout, LayoutExtractor, PageLayout, PageRaster, Rasterizer, Word,
};
use nbreport_core::geometry::ColumnSource;
use nbreport_core::parsing::recovery::LargestNumericToken;
use nbreport_core::{build_report, compute_totals};
use rust_decimal_macros::dec;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

struct MockLayout {
    layout: DocumentLayout,
}

impl LayoutExtractor for MockLayout {
    fn extract_layout(&self, _pdf_bytes: &[u8]) -> Result<DocumentLayout, ReportError> {
        Ok(self.layout.clone())
    }

    fn backend_name(&self) -> &str {
        "mock"
    }
}

#[derive(Default)]
struct MockRasterizer {
    calls: AtomicUsize,
}

impl Rasterizer for MockRasterizer {
    fn rasterize(&self, _pdf_bytes: &[u8]) -> Result<Vec<PageRaster>, ReportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok((1..=2)
            .map(|page_number| PageRaster {
                page_number,
                image: image::RgbImage::from_pixel(8, 6, image::Rgb([255, 255, 255])),
            })
            .collect())
    }

    fn backend_name(&self) -> &str {
        "mock"
    }
}

fn config() -> ReportConfig {
    parse_config_str(
        r#"{
        "name": "test",
        "columns": ["Job Id", "Job Policy", "Client", "Start Time", "End Time", "Kilobytes", "Pathname", "Instance or Database"],
        "fields": {
            "id": "Job Id", "category": "Job Policy", "start_time": "Start Time",
            "end_time": "End Time", "capacity": "Kilobytes", "client": "Client",
            "instance": "Instance or Database", "path": "Pathname"
        },
        "rows": [
            { "label": "ERP", "policy": "ERP" },
            { "label": "HR", "policy": "HR" },
            { "label": "ReportServer", "policy": "HZDB_MSSQL", "instance": "ReportServer" },
            { "label": "SMS", "policy": "HZDB_MSSQL", "instance": "SMS" },
            { "label": "NEOE", "policy": "HZDB_MSSQL", "instance": "NEOE" }
        ],
        "splits": [
            {
                "policy": "HZDB_MSSQL",
                "ranges": [
                    { "min": 8000, "max": 10000, "instance": "ReportServer" },
                    { "min": 1000000, "max": 2000000, "instance": "SMS" }
                ],
                "default_instance": "NEOE"
            }
        ]
    }"#,
    )
    .unwrap()
}

fn line(fields: [&str; 8]) -> String {
    format!(
        "{:<8}{:<12}{:<8}{:<24}{:<24}{:<13}{:<10}{}",
        fields[0], fields[1], fields[2], fields[3], fields[4], fields[5], fields[6], fields[7]
    )
}

fn export(jobs: &[[&str; 8]]) -> Vec<u8> {
    let mut lines = vec![
        line([
            "Job Id",
            "Job Policy",
            "Client",
            "Start Time",
            "End Time",
            "Kilobytes",
            "Pathname",
            "Instance or Database",
        ]),
        "-".repeat(112),
    ];
    lines.extend(jobs.iter().map(|j| line(*j)));
    (lines.join("\n") + "\n").into_bytes()
}

const MAR4: &str = "2024. 3. 4 PM 11:00:00";
const MAR5: &str = "2024. 3. 5 PM 11:10:02";
const MAR5_LATE: &str = "2024. 3. 5 PM 11:55:00";

fn two_batches() -> Vec<u8> {
    export(&[
        ["101", "ERP", "erp01", MAR4, MAR4, "104,857,600", "/u01", ""],
        ["102", "HR", "hr01", MAR4, MAR4, "52,428,800", "/hr", ""],
        ["201", "ERP", "erp01", MAR5, MAR5, "1,048,576", "/u01", ""],
        ["202", "ERP", "erp02", MAR5, MAR5_LATE, "2,097,152", "/u02", ""],
        ["203", "HR", "hr01", MAR5, MAR5, "5,242,880", "/hr", ""],
    ])
}

fn word(text: &str, x_min: f32, y_min: f32, x_max: f32, y_max: f32) -> Word {
    Word {
        text: text.into(),
        bbox: BBox { x_min, y_min, x_max, y_max },
    }
}

fn template(with_header: bool) -> DocumentLayout {
    let mut words = vec![
        word("백업", 200.0, 80.0, 220.0, 90.0),
        word("대상", 222.0, 80.0, 242.0, 90.0),
        word("및", 244.0, 80.0, 252.0, 90.0),
        word("경로", 254.0, 80.0, 274.0, 90.0),
        word("백업결과", 400.0, 80.0, 440.0, 90.0),
        word("ERP", 40.0, 120.0, 70.0, 130.0),
        word("/u01", 210.0, 120.2, 240.0, 131.0),
        word("HR", 40.0, 140.0, 60.0, 150.0),
    ];
    if with_header {
        words.push(word("백업용량", 300.0, 80.0, 340.0, 90.0));
    }
    DocumentLayout {
        pages: vec![
            PageLayout { page_number: 1, width: 842.0, height: 595.0, words: vec![] },
            PageLayout { page_number: 2, width: 842.0, height: 595.0, words },
        ],
    }
}

// ---------------------------------------------------------------------------
// Totals: only the most recent batch of each category counts
// ---------------------------------------------------------------------------
#[test]
fn latest_batch_per_category() {
    let totals = compute_totals(&two_batches(), &config(), &LargestNumericToken).unwrap();
    assert_eq!(totals.parsed.jobs.len(), 5);

    let erp = totals.rows[0].total.as_ref().unwrap();
    assert_eq!(erp.date.to_string(), "2024-03-05");
    assert_eq!(erp.total_gb, dec!(3.00));
    assert_eq!(erp.job_count, 2);

    let hr = totals.rows[1].total.as_ref().unwrap();
    assert_eq!(hr.total_gb, dec!(5.00));
    assert_eq!(hr.job_count, 1);
}

// ---------------------------------------------------------------------------
// Split rule reclassifies one policy by its kilobyte figure
// ---------------------------------------------------------------------------
#[test]
fn split_policy_into_instances() {
    let raw = export(&[
        ["301", "HZDB_MSSQL", "db01", MAR5, MAR5, "8,500", "/a", "MSSQLSERVER"],
        ["302", "HZDB_MSSQL", "db01", MAR5, MAR5, "1,500,000", "/b", "MSSQLSERVER"],
        ["303", "HZDB_MSSQL", "db01", MAR5, MAR5, "3,000,000", "/c", "MSSQLSERVER"],
    ]);
    let totals = compute_totals(&raw, &config(), &LargestNumericToken).unwrap();

    let by_label = |label: &str| {
        totals
            .rows
            .iter()
            .find(|r| r.label == label)
            .and_then(|r| r.total.as_ref())
            .map(|t| t.job_count)
    };
    assert_eq!(by_label("ReportServer"), Some(1));
    assert_eq!(by_label("SMS"), Some(1));
    assert_eq!(by_label("NEOE"), Some(1));
    assert_eq!(by_label("ERP"), None);
}

// ---------------------------------------------------------------------------
// Full pipeline with a template whose value header is split into fragments
// ---------------------------------------------------------------------------
#[test]
fn build_report_end_to_end() {
    let extractor = MockLayout { layout: template(false) };
    let rasterizer = MockRasterizer::default();

    let report = build_report(
        &two_batches(),
        b"%PDF-template",
        &config(),
        &LargestNumericToken,
        &extractor,
        &rasterizer,
    )
    .unwrap();

    assert!(report.pdf.starts_with(b"%PDF-"));
    assert_eq!(report.geometry.column.source, ColumnSource::Fragments);
    assert_eq!(report.geometry.column.x_min, 276.0);
    assert_eq!(report.geometry.column.x_max, 398.0);

    // ERP and HR are on the template; the split rows are not.
    let labels: Vec<&str> = report.geometry.cells.iter().map(|c| c.row_label.as_str()).collect();
    assert_eq!(labels, vec!["ERP", "HR"]);
    assert_eq!(report.geometry.cells[0].bbox.y_max, 131.0);

    let contains = |needle: &[u8]| report.pdf.windows(needle.len()).any(|w| w == needle);
    assert!(contains(b"(3) Tj"));
    assert!(contains(b"(5) Tj"));

    assert_eq!(report.summary.rows.len(), 5);
    assert_eq!(report.summary.rows[0].total_gb, Some(dec!(3.00)));
    assert_eq!(rasterizer.calls.load(Ordering::SeqCst), 1);
}

#[test]
fn build_report_embeds_configured_font() {
    let mut config = config();
    config.render.font_path = Some(PathBuf::from(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/tests/fixtures/digits.ttf"
    )));

    let report = build_report(
        &two_batches(),
        b"%PDF-template",
        &config,
        &LargestNumericToken,
        &MockLayout { layout: template(false) },
        &MockRasterizer::default(),
    )
    .unwrap();

    let contains = |needle: &[u8]| report.pdf.windows(needle.len()).any(|w| w == needle);
    assert!(contains(b"/Subtype /Type0"));
    assert!(contains(b"/Encoding /Identity-H"));
    assert!(contains(b"/FontFile2"));
    assert!(!contains(b"/Helvetica"));
    // glyph ids, two bytes each: '3' is 6 and '5' is 8 in the fixture
    assert!(contains(br"(\000\006) Tj"));
    assert!(contains(br"(\000\010) Tj"));
}

#[test]
fn header_anchor_used_when_fragments_incomplete() {
    let mut layout = template(true);
    layout.pages[1].words.retain(|w| w.text != "및");
    let report = build_report(
        &two_batches(),
        b"%PDF-template",
        &config(),
        &LargestNumericToken,
        &MockLayout { layout },
        &MockRasterizer::default(),
    )
    .unwrap();
    assert_eq!(report.geometry.column.source, ColumnSource::Header);
    assert_eq!(report.geometry.column.x_min, 298.0);
    assert_eq!(report.geometry.column.x_max, 358.0);
}

// ---------------------------------------------------------------------------
// Fatal errors: nothing is rendered
// ---------------------------------------------------------------------------
#[test]
fn export_without_header_is_table_format_error() {
    let rasterizer = MockRasterizer::default();
    let err = build_report(
        b"this is not a job export\n",
        b"%PDF-template",
        &config(),
        &LargestNumericToken,
        &MockLayout { layout: template(true) },
        &rasterizer,
    )
    .unwrap_err();
    assert_eq!(err.code(), "TABLE_FORMAT_ERROR");
    assert_eq!(rasterizer.calls.load(Ordering::SeqCst), 0);
}

#[test]
fn template_without_anchors_is_geometry_error() {
    let rasterizer = MockRasterizer::default();
    let layout = DocumentLayout {
        pages: vec![
            PageLayout { page_number: 1, width: 842.0, height: 595.0, words: vec![] },
            PageLayout {
                page_number: 2,
                width: 842.0,
                height: 595.0,
                words: vec![word("ERP", 40.0, 120.0, 70.0, 130.0)],
            },
        ],
    };
    let err = build_report(
        &two_batches(),
        b"%PDF-template",
        &config(),
        &LargestNumericToken,
        &MockLayout { layout },
        &rasterizer,
    )
    .unwrap_err();
    assert!(matches!(err, ReportError::TemplateGeometry(_)));
    assert_eq!(err.code(), "TEMPLATE_GEOMETRY_ERROR");
    assert_eq!(rasterizer.calls.load(Ordering::SeqCst), 0);
}
