use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use refpin::commands::{self, OutputFormat, ResolveOptions};
use refpin::diagnostics;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter directive.
const LOG_ENV: &str = "REFPIN_LOG";

/// Drift-tolerant references into code and docs
#[derive(Parser)]
#[command(name = "refpin", version)]
struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Print every search hint for each ref
    Hints {
        /// Refs in `name:key=value,...` form
        #[arg(required = true)]
        refs: Vec<String>,
    },
    /// Validate refs and print them as normalized JSON
    Parse {
        /// Refs in `name:key=value,...` form
        #[arg(required = true)]
        refs: Vec<String>,
    },
    /// Resolve refs against a project tree (exit 1 if any are unresolved)
    Resolve {
        /// Report format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
        /// Hints shown per unresolved ref (overrides .refpin.toml)
        #[arg(long = "hints", value_name = "N")]
        hint_limit: Option<usize>,
        /// Refs in `name:key=value,...` form
        refs: Vec<String>,
        /// JSON file with an array of DSL strings and/or ref objects
        #[arg(long = "refs", value_name = "FILE")]
        refs_file: Option<PathBuf>,
        /// Project root
        #[arg(long, default_value = ".")]
        root: PathBuf,
    },
}

/// Log to stderr, filtered by `REFPIN_LOG` (default `warn`).
fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_err| return EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
    return;
}

fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Hints { refs } => commands::hints(&refs).map(|()| return ExitCode::SUCCESS),
        Commands::Parse { refs } => commands::parse(&refs).map(|()| return ExitCode::SUCCESS),
        Commands::Resolve { format, hint_limit, refs, refs_file, root } => commands::resolve(
            &ResolveOptions { format, hint_limit, inline: refs, refs_file, root },
        ),
    };

    match result {
        Ok(code) => return code,
        Err(e) => {
            diagnostics::print_error(&e);
            return ExitCode::from(2);
        },
    }
}
