//! xtask: Development tasks for rpcgen
//!
//! Run with: `cargo xtask <command>`

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use facet::Facet;
use facet_args as args;
use xshell::{Shell, cmd};

/// Development tasks for rpcgen
#[derive(Facet)]
struct Cli {
    #[facet(args::subcommand)]
    command: Commands,
}

#[derive(Facet)]
#[repr(u8)]
enum Commands {
    /// Run all CI checks locally (test, clippy, fmt, demo)
    Ci,
    /// Run all tests (workspace)
    Test,
    /// Run clippy on all code
    Clippy,
    /// Check formatting
    Fmt {
        /// Fix formatting issues instead of just checking
        #[facet(args::named, default)]
        fix: bool,
    },
    /// Regenerate every target configured in `demos/rpcgen.json`
    Demo,
}

fn main() -> ExitCode {
    if let Err(e) = run() {
        eprintln!("Error: {e}");
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn workspace_root() -> Result<PathBuf, Box<dyn std::error::Error>> {
    let manifest_dir = match std::env::var("CARGO_MANIFEST_DIR") {
        Ok(dir) => PathBuf::from(dir),
        Err(_) => std::env::current_dir()?.join("xtask"),
    };
    let root = manifest_dir
        .parent()
        .ok_or("xtask has no parent directory")?;
    Ok(root.to_path_buf())
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli: Cli = args::from_std_args()?;
    let sh = Shell::new()?;

    let workspace_root = workspace_root()?;
    sh.change_dir(&workspace_root);

    match cli.command {
        Commands::Test => {
            println!("\n=== Running workspace tests ===");

            // Try nextest first, fall back to cargo test
            if cmd!(sh, "cargo nextest --version").quiet().run().is_ok() {
                println!("Using cargo-nextest");
                cmd!(sh, "cargo nextest run --workspace").run()?;
            } else {
                println!("cargo-nextest not found, using cargo test");
                cmd!(sh, "cargo test --workspace").run()?;
            }

            println!("\n=== All tests passed ===");
        }
        Commands::Clippy => {
            println!("=== Running clippy ===");
            cmd!(sh, "cargo clippy --workspace --all-targets -- -D warnings").run()?;
        }
        Commands::Fmt { fix } => {
            if fix {
                println!("=== Fixing formatting ===");
                cmd!(sh, "cargo fmt --all").run()?;
            } else {
                println!("=== Checking formatting ===");
                cmd!(sh, "cargo fmt --all -- --check").run()?;
            }
        }
        Commands::Demo => demo(&workspace_root)?,
        Commands::Ci => {
            println!("=== Running all CI checks ===\n");

            println!(">>> cargo xtask test");
            cmd!(sh, "cargo xtask test").run()?;

            println!("\n>>> cargo xtask clippy");
            cmd!(sh, "cargo xtask clippy").run()?;

            println!("\n>>> cargo xtask fmt");
            cmd!(sh, "cargo xtask fmt").run()?;

            println!("\n>>> cargo xtask demo");
            cmd!(sh, "cargo xtask demo").run()?;

            println!("\n=== All CI checks passed ===");
        }
    }

    Ok(())
}

fn demo(workspace_root: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let config = workspace_root.join("demos").join("rpcgen.json");
    println!("=== Generating demo targets from {} ===", config.display());

    match rpcgen::run(&config) {
        Ok(summary) => {
            println!(
                "Wrote {} files for {} targets",
                summary.files, summary.targets
            );
            Ok(())
        }
        Err(rpcgen::DriverError::Invalid { diagnostics }) => {
            for d in &diagnostics {
                eprintln!("{d}");
            }
            Err(format!("demo schemas have {} errors", diagnostics.len()).into())
        }
        Err(e) => Err(e.into()),
    }
}
