//! Testgen CLI - generate Go test scaffolds.
//!
//! # Usage
//!
//! ```bash
//! # Preview a test for the function at line 12, column 6 of add.go
//! testgen add-test mathx/add.go --line 12 --column 6
//!
//! # Write it to mathx/add_test.go
//! testgen add-test mathx/add.go --line 12 --column 6 --write
//!
//! # Show the effective configuration
//! testgen config show
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::process;
use testgen_cli::commands::{self, AddTestArgs};
use testgen_cli::{output, OutputFormat};
use testgen_core::config::CONFIG_FILE_NAME;
use testgen_core::TestgenConfig;

#[derive(Parser)]
#[command(name = "testgen")]
#[command(about = "Testgen - table-driven test scaffolds for Go", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Output format (human, json)
    #[arg(long, global = true, default_value = "human")]
    format: OutputFormatArg,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormatArg {
    Human,
    Json,
}

impl From<OutputFormatArg> for OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Human => OutputFormat::Human,
            OutputFormatArg::Json => OutputFormat::Json,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Add a test for the function or method at a position
    AddTest {
        /// Go source file
        file: PathBuf,

        /// Line of the selection (one-based)
        #[arg(short, long)]
        line: usize,

        /// Column of the selection in bytes (one-based)
        #[arg(long)]
        column: usize,

        /// End line of the selection (one-based)
        #[arg(long, requires = "end_column")]
        end_line: Option<usize>,

        /// End column of the selection (one-based)
        #[arg(long, requires = "end_line")]
        end_column: Option<usize>,

        /// Apply the changes instead of printing them
        #[arg(short, long)]
        write: bool,
    },

    /// Configuration management
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show the effective configuration
    Show,

    /// Write a default configuration file
    Init {
        /// Target path
        #[arg(default_value = CONFIG_FILE_NAME)]
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}

fn main() {
    if let Err(e) = run() {
        output::error(format!("{:#}", e));
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let config = TestgenConfig::load(cli.config.as_deref())?;

    // Initialize logging
    init_logging(cli.verbose, &config.general.log_level);

    let format = OutputFormat::from(cli.format);

    match cli.command {
        Commands::AddTest {
            file,
            line,
            column,
            end_line,
            end_column,
            write,
        } => {
            let args = AddTestArgs {
                file,
                line,
                column,
                end_line,
                end_column,
                write,
            };
            commands::add_test(config, &args, format)?;
        }

        Commands::Config(config_cmd) => match config_cmd {
            ConfigCommands::Show => {
                commands::config_show(&config, format)?;
            }
            ConfigCommands::Init { path, force } => {
                commands::config_init(&path, force)?;
            }
        },
    }

    Ok(())
}

/// Initialize logging based on verbosity and the configured level
fn init_logging(verbose: bool, level: &str) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = if verbose {
        EnvFilter::new("testgen_golang=debug,testgen_core=debug,testgen_cli=debug,info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();
}
