//! rpcgen: generate HTTP clients and servers from TypeScript schema files.
//!
//! Run with: `rpcgen <command>`

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use facet::Facet;
use facet_args as args;
use rpcgen::{DriverError, ResolvedConfig, config::DEFAULT_CONFIG};
use rpcgen_codegen::{Builder, BuilderRegistry};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Generate TypeScript, Go and Rust HTTP clients and servers
#[derive(Facet)]
struct Cli {
    #[facet(args::subcommand)]
    command: Command,
}

#[derive(Facet)]
#[repr(u8)]
enum Command {
    /// Parse and validate the schemas, printing every problem found
    Check {
        /// Path to the config file (default: rpcgen.json)
        #[facet(args::named, default)]
        config: Option<String>,
    },
    /// Validate, then run every configured builder and write its files
    Gen {
        /// Path to the config file (default: rpcgen.json)
        #[facet(args::named, default)]
        config: Option<String>,
    },
    /// List the available builders
    Builders,
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn config_path(config: Option<String>) -> PathBuf {
    PathBuf::from(config.unwrap_or_else(|| DEFAULT_CONFIG.to_string()))
}

fn run() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli: Cli = args::from_std_args()?;

    match cli.command {
        Command::Check { config } => check(&config_path(config)),
        Command::Gen { config } => match rpcgen::run(&config_path(config)) {
            Ok(summary) => {
                println!(
                    "generated {} files for {} targets",
                    summary.files, summary.targets
                );
                Ok(ExitCode::SUCCESS)
            }
            Err(DriverError::Invalid { diagnostics }) => {
                for d in &diagnostics {
                    eprintln!("{d}");
                }
                eprintln!("{} errors, nothing generated", diagnostics.len());
                Ok(ExitCode::FAILURE)
            }
            Err(e) => Err(e.into()),
        },
        Command::Builders => {
            for builder in BuilderRegistry::with_defaults().iter() {
                let target = builder.target();
                println!(
                    "{:<22}{:<12}{:<10}{}",
                    builder.name(),
                    target.language,
                    target.framework,
                    target.direction
                );
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn check(config: &Path) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let config = ResolvedConfig::load(config)?;
    let project = rpcgen::load_project(&config.schemas)?;
    let diagnostics = rpcgen::check(&project);
    for d in &diagnostics {
        eprintln!("{d}");
    }
    if diagnostics.is_empty() {
        println!("{} schema files ok", project.files().count());
        Ok(ExitCode::SUCCESS)
    } else {
        eprintln!("{} errors", diagnostics.len());
        Ok(ExitCode::FAILURE)
    }
}
