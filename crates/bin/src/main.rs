//! Everywhere CLI binary.
//!
//! Reads a monthly return panel from CSV and prints volatility-weighted
//! quarterly returns, the average correlation matrix, or principal components.

mod settings;

use clap::{Args, Parser, Subcommand};
use everywhere::data::{ColumnSelection, ReturnPanel};
use everywhere::output::{
    ExportFormat, Exporter, QuarterlyExport, component_table, correlation_table, quarterly_table,
};
use everywhere::risk::{PcaBasis, PcaConfig, PcaReducer};
use everywhere::{Analysis, VERSION};
use settings::LayoutArgs;
use std::path::{Path, PathBuf};
use std::process;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "everywhere")]
#[command(about = "Volatility-weighted portfolio correlation and PCA", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct OutputArgs {
    /// Output format (text, markdown, json, pretty-json or csv)
    #[arg(long, default_value = "text")]
    format: String,

    /// Write to a file instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Average correlation matrix across portfolios
    Correlate {
        #[command(flatten)]
        layout: LayoutArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Volatility-weighted quarterly returns per portfolio
    Quarterly {
        #[command(flatten)]
        layout: LayoutArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Principal components of a column group
    Pca {
        /// Monthly return panel (CSV)
        #[arg(long)]
        panel: PathBuf,

        /// Name of the date column
        #[arg(long, default_value = "date")]
        date_column: String,

        /// Position of the first column
        #[arg(long)]
        start: usize,

        /// Number of columns in the group
        #[arg(long)]
        group_size: usize,

        /// Distance between columns
        #[arg(long, default_value = "1")]
        stride: usize,

        /// Decomposition basis (covariance-rows or covariance)
        #[arg(long, default_value = "covariance-rows")]
        basis: String,

        /// Print every component, not only the first
        #[arg(long)]
        all: bool,

        #[command(flatten)]
        output: OutputArgs,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("everywhere=debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("everywhere=warn"))
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    debug!(version = VERSION, "everywhere");

    match cli.command {
        Commands::Correlate { layout, output } => {
            let panel = layout.read_panel()?;
            let analysis = Analysis::new(layout.into_config()?)?;
            let report = analysis.run(&panel)?;

            let content = match output.format.as_str() {
                "text" => correlation_table(&report.correlation, false),
                "markdown" => correlation_table(&report.correlation, true),
                "json" => report.to_report("correlate")?.to_json(false)?,
                "pretty-json" => report.to_report("correlate")?.to_json(true)?,
                format => report
                    .correlation
                    .export_to_string(format.parse::<ExportFormat>()?)?,
            };
            emit(&content, output.output.as_deref())?;
        }
        Commands::Quarterly { layout, output } => {
            let panel = layout.read_panel()?;
            let analysis = Analysis::new(layout.into_config()?)?;
            let series = analysis.quarterly(&panel)?;
            let export = QuarterlyExport::new(analysis.labels().to_vec(), series)?;

            let content = match output.format.as_str() {
                "text" | "markdown" => quarterly_table(&export),
                format => export.export_to_string(format.parse::<ExportFormat>()?)?,
            };
            emit(&content, output.output.as_deref())?;
        }
        Commands::Pca {
            panel,
            date_column,
            start,
            group_size,
            stride,
            basis,
            all,
            output,
        } => {
            let panel = ReturnPanel::read_csv(&panel, &date_column)?;
            let basis = match basis.as_str() {
                "covariance-rows" | "covariance_rows" => PcaBasis::CovarianceRows,
                "covariance" => PcaBasis::Covariance,
                other => return Err(format!("unknown PCA basis: {other}").into()),
            };
            let reducer = PcaReducer::new(PcaConfig {
                basis,
                ..Default::default()
            })?;
            let selection = ColumnSelection::strided(start, group_size, stride);
            let mut components = reducer.components(&panel, &selection)?;
            if !all {
                components.truncate(1);
            }

            let content = match output.format.as_str() {
                "text" | "markdown" => components.iter().map(component_table).collect(),
                format => components.export_to_string(format.parse::<ExportFormat>()?)?,
            };
            emit(&content, output.output.as_deref())?;
        }
    }

    Ok(())
}

fn emit(content: &str, path: Option<&Path>) -> std::io::Result<()> {
    match path {
        Some(path) => {
            std::fs::write(path, content)?;
            info!(path = %path.display(), "wrote output");
        }
        None => println!("{content}"),
    }
    Ok(())
}
