#![deny(unsafe_code)]

//! The rpcgen driver.
//!
//! Ties the other crates together: read `rpcgen.json`, load every schema
//! file below the configured directory, validate, and when the project is
//! clean, run each configured builder and write its files.
//!
//! ```text
//! rpcgen.json ─▶ load_project ─▶ check ─▶ lower ─▶ Builder::build ─▶ write ─▶ format
//!                                  │                  (rayon, one job per target)
//!                                  └─▶ Diagnostic[] (stops here when non-empty)
//! ```
//!
//! The `rpcgen` binary is a thin CLI over [`pipeline`].

pub mod config;
mod error;
pub mod format;
pub mod pipeline;
mod project;
pub mod writer;

pub use config::{Config, ResolvedConfig, ResolvedTarget, TargetConfig};
pub use error::DriverError;
pub use pipeline::{Generated, Summary, check, generate, run};
pub use project::load_project;
