use clap::Args;
use nbreport_core::error::ReportError;
use nbreport_core::extraction::pdftoppm::PdftoppmRasterizer;
use nbreport_core::extraction::pdftotext::PdftotextExtractor;
use nbreport_core::summary;
use std::path::{Path, PathBuf};

#[derive(Args)]
pub struct RenderArgs {
    /// Path to the job export text file
    #[arg(long = "in", value_name = "FILE")]
    input: PathBuf,

    /// Where to write the report PDF
    #[arg(long = "out", value_name = "FILE")]
    out: PathBuf,

    /// Template PDF the values are drawn onto
    #[arg(long, value_name = "FILE")]
    template_pdf: PathBuf,

    /// TrueType font for the values (default: Helvetica)
    #[arg(long, value_name = "FILE")]
    font: Option<PathBuf>,

    /// Rasterization resolution of the template pages
    #[arg(long)]
    dpi: Option<u32>,

    /// Directory for cached template page images
    #[arg(long, value_name = "DIR")]
    cache_dir: Option<PathBuf>,

    /// Also write the run summary JSON here
    #[arg(long, value_name = "FILE")]
    summary: Option<PathBuf>,

    /// Previous run's summary JSON, for change remarks
    #[arg(long, value_name = "FILE")]
    previous: Option<PathBuf>,

    /// Read the capacity strictly from its column
    #[arg(long)]
    strict_columns: bool,
}

pub fn run(config_path: Option<&Path>, args: RenderArgs) -> Result<(), ReportError> {
    let mut config = super::load_config(config_path)?;
    if let Some(font) = args.font {
        config.render.font_path = Some(font);
    }
    if let Some(dpi) = args.dpi {
        config.render.dpi = dpi;
    }
    nbreport_core::config::validate_config(&config)?;

    let raw = std::fs::read(&args.input)?;
    let template = std::fs::read(&args.template_pdf)?;
    let recovery = super::recovery(args.strict_columns);
    let extractor = PdftotextExtractor::new();
    let rasterizer = PdftoppmRasterizer::new(
        args.cache_dir
            .unwrap_or_else(PdftoppmRasterizer::default_cache_root),
        config.render.dpi,
    );

    let report = nbreport_core::build_report(
        &raw,
        &template,
        &config,
        recovery.as_ref(),
        &extractor,
        &rasterizer,
    )?;

    let mut run_summary = report.summary;
    if let Some(previous) = &args.previous {
        let remarks = summary::compare_with_file(&run_summary, previous, &config.compare)?;
        for remark in &remarks {
            eprintln!("  {}: {}", remark.label, remark.text);
        }
        run_summary = run_summary.with_remarks(&remarks);
    }

    nbreport_core::write_atomic(&args.out, &report.pdf)?;
    if let Some(path) = &args.summary {
        let json = serde_json::to_string_pretty(&run_summary)?;
        nbreport_core::write_atomic(path, json.as_bytes())?;
    }

    let filled = report.totals.rows.iter().filter(|r| r.total.is_some()).count();
    eprintln!(
        "Rendered {} ({} of {} rows with a value, {} cell(s) located)",
        args.out.display(),
        filled,
        report.totals.rows.len(),
        report.geometry.cells.len()
    );

    Ok(())
}
