mod commands;
mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "nbreport",
    version,
    about = "Backup status reports from NetBackup job exports"
)]
struct Cli {
    /// Report configuration JSON (default: built-in NetBackup preset)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log decisions at debug level (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract job records from a fixed-width job export
    Parse {
        /// Path to the job export text file
        input_file: PathBuf,

        /// Output format: table (default) or json
        #[arg(short, long, default_value = "table")]
        output: String,

        /// Write parsed records to a JSON file
        #[arg(short = 'O', long = "out", value_name = "FILE")]
        out: Option<PathBuf>,

        /// Read the capacity strictly from its column
        #[arg(long)]
        strict_columns: bool,
    },
    /// Show the per-row totals of the latest backup day
    Totals {
        /// Path to the job export text file
        input_file: PathBuf,

        /// Output format: table (default) or json
        #[arg(short, long, default_value = "table")]
        output: String,

        /// Previous run's summary JSON, for change remarks
        #[arg(long, value_name = "FILE")]
        previous: Option<PathBuf>,

        /// Total every exact policy/instance key instead of the report rows
        #[arg(long)]
        by_key: bool,

        /// Read the capacity strictly from its column
        #[arg(long)]
        strict_columns: bool,
    },
    /// Render the report PDF over a template
    Render(commands::render::RenderArgs),
    /// Dump the words and boxes of a template PDF
    Layout {
        /// Path to the template PDF
        pdf_file: PathBuf,

        /// Only this page (1-based)
        #[arg(long)]
        page: Option<usize>,
    },
    /// Inspect and validate report configurations
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration as JSON
    Show,
    /// List built-in presets
    List,
    /// Validate a configuration file
    Validate {
        /// Path to JSON configuration file
        file: PathBuf,
    },
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let config = cli.config.as_deref();

    let result = match cli.command {
        Commands::Parse {
            input_file,
            output,
            out,
            strict_columns,
        } => commands::parse::run(config, input_file, &output, out, strict_columns),
        Commands::Totals {
            input_file,
            output,
            previous,
            by_key,
            strict_columns,
        } => commands::totals::run(
            config,
            input_file,
            &output,
            previous,
            by_key,
            strict_columns,
        ),
        Commands::Render(args) => commands::render::run(config, args),
        Commands::Layout { pdf_file, page } => commands::layout::run(config, pdf_file, page),
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config::show(config),
            ConfigAction::List => commands::config::list(),
            ConfigAction::Validate { file } => commands::config::validate(&file),
        },
    };

    if let Err(e) = result {
        eprintln!("Error [{}]: {e}", e.code());
        std::process::exit(1);
    }
}
