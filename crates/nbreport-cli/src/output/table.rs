use nbreport_core::extraction::PageLayout;
use nbreport_core::geometry::TemplateGeometry;
use nbreport_core::model::CategoryTotal;
use nbreport_core::parsing::values::format_gb;
use nbreport_core::parsing::ParsedJobs;
use nbreport_core::summary::ReportSummary;
use std::fmt::Write;

fn or_dash<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".into())
}

pub fn format_jobs(parsed: &ParsedJobs) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Header at line {}, {} column(s), {} job(s)\n",
        parsed.header_line,
        parsed.columns.len(),
        parsed.jobs.len()
    );

    let key_width = parsed
        .jobs
        .iter()
        .map(|j| j.key.to_string().chars().count())
        .max()
        .unwrap_or(8)
        .max(8);

    let _ = writeln!(
        out,
        "  {:>8}  {:<kw$}  {:<19}  {:>12}  {:>10}",
        "Job Id",
        "Category",
        "End",
        "KB",
        "GB",
        kw = key_width
    );
    for job in &parsed.jobs {
        let key = job.key.to_string();
        let pad = key_width.saturating_sub(key.chars().count());
        let _ = writeln!(
            out,
            "  {:>8}  {}{}  {:<19}  {:>12}  {:>10}",
            job.job_id,
            key,
            " ".repeat(pad),
            or_dash(job.end),
            or_dash(job.kilobytes),
            or_dash(job.capacity_gb.map(format_gb)),
        );
    }

    if !parsed.skipped_lines.is_empty() {
        let _ = writeln!(out, "\nSkipped lines:");
        for skipped in &parsed.skipped_lines {
            let _ = writeln!(out, "  {:>5}: {}", skipped.line_number, skipped.reason);
        }
    }
    out
}

pub fn format_summary(summary: &ReportSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "=== {} ===\n", summary.config);

    let label_width = summary
        .rows
        .iter()
        .map(|r| r.label.chars().count())
        .max()
        .unwrap_or(10);

    for row in &summary.rows {
        let pad = label_width.saturating_sub(row.label.chars().count());
        let _ = write!(
            out,
            "  {}{}  {:<10}  {:>10}  {:>3} job(s)",
            row.label,
            " ".repeat(pad),
            or_dash(row.date),
            or_dash(row.total_gb.map(|gb| format!("{}GB", format_gb(gb)))),
            row.job_count
        );
        if let Some(remark) = &row.remark {
            let _ = write!(out, "  {remark}");
        }
        out.push('\n');
    }
    out
}

pub fn format_key_totals(totals: &[&CategoryTotal]) -> String {
    let mut out = String::new();
    let key_width = totals
        .iter()
        .map(|t| t.key.to_string().chars().count())
        .max()
        .unwrap_or(10);

    for total in totals {
        let key = total.key.to_string();
        let pad = key_width.saturating_sub(key.chars().count());
        let _ = writeln!(
            out,
            "  {}{}  {}  {:>10}  {:>3} job(s)",
            key,
            " ".repeat(pad),
            total.date,
            format!("{}GB", format_gb(total.total_gb)),
            total.job_count
        );
    }
    out
}

pub fn format_page(page: &PageLayout) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "--- Page {} ({:.2} x {:.2} pt, {} words) ---",
        page.page_number,
        page.width,
        page.height,
        page.words.len()
    );
    for word in &page.words {
        let b = &word.bbox;
        let _ = writeln!(
            out,
            "  {:>8.2} {:>8.2} {:>8.2} {:>8.2}  {}",
            b.x_min, b.y_min, b.x_max, b.y_max, word.text
        );
    }
    out
}

pub fn format_geometry(geometry: &TemplateGeometry) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Value column on page {}: x {:.2}..{:.2} ({:?})",
        geometry.page_number, geometry.column.x_min, geometry.column.x_max, geometry.column.source
    );
    for cell in &geometry.cells {
        let _ = writeln!(
            out,
            "  {:<20} y {:.2}..{:.2}",
            cell.row_label, cell.bbox.y_min, cell.bbox.y_max
        );
    }
    out
}
