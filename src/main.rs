//! graphfmt CLI entry point

use clap::{Args, Parser, Subcommand};
use graphfmt_decoder::DecoderKind;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;
mod config;
mod coordinator;
mod files;

/// Environment variable overriding the log filter.
const LOG_ENV: &str = "GRAPHFMT_LOG";

#[derive(Parser)]
#[command(name = "graphfmt")]
#[command(about = "Convert XML graph documents to text with %-directive templates", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (defaults to ./graphfmt.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert graph documents
    Convert(ConvertArgs),
    /// Compile a format string and list its directives
    Check {
        /// Format string to compile
        format: String,
    },
    /// Show version
    Version,
}

#[derive(Args)]
struct ConvertArgs {
    /// Input documents; take priority over --glob
    files: Vec<PathBuf>,

    /// Output format string
    #[arg(short, long)]
    format: Option<String>,

    /// Directory receiving the converted files
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Shell-style pattern selecting input documents
    #[arg(short, long)]
    glob: Option<String>,

    /// Extension of converted files
    #[arg(short, long)]
    extension: Option<String>,

    /// Decoding strategy: token or streaming
    #[arg(long)]
    decoder: Option<DecoderKind>,

    /// Number of worker threads
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Serve progress as JSON on this address while converting
    #[arg(long)]
    diagnostics: Option<SocketAddr>,

    /// Show a progress bar
    #[arg(long)]
    progress: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(format!("graphfmt={}", log_level)));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Commands::Convert(args) => {
            tracing::debug!("graphfmt v{}", env!("CARGO_PKG_VERSION"));
            let file_config = config::FileConfig::discover(cli.config.as_deref())?;
            let inputs = files::resolve_inputs(args.files, args.glob.as_deref())?;
            let settings = config::ConvertSettings::resolve(
                file_config,
                config::ConvertOverrides {
                    format: args.format,
                    output_dir: args.output_dir,
                    extension: args.extension,
                    decoder: args.decoder,
                    jobs: args.jobs,
                    diagnostics: args.diagnostics,
                    progress: args.progress || cli.verbose,
                },
            );
            commands::convert(settings, inputs).await
        }
        Commands::Check { format } => commands::check(&format),
        Commands::Version => {
            println!("graphfmt v{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
