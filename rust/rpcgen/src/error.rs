use std::path::PathBuf;

use rpcgen_codegen::CodegenError;
use rpcgen_validate::Diagnostic;

#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    #[error("invalid config {}: {message}", path.display())]
    Config { path: PathBuf, message: String },

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("bad schema glob: {0}")]
    Glob(#[from] glob::PatternError),

    #[error("unknown builder `{name}` (known: {})", known.join(", "))]
    UnknownBuilder {
        name: String,
        known: Vec<&'static str>,
    },

    #[error("builder `{builder}` failed: {source}")]
    Codegen {
        builder: String,
        #[source]
        source: CodegenError,
    },

    /// Validation found problems; nothing was generated.
    #[error("{} validation error{}", diagnostics.len(), if diagnostics.len() == 1 { "" } else { "s" })]
    Invalid { diagnostics: Vec<Diagnostic> },
}

impl DriverError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        DriverError::Io {
            path: path.into(),
            source,
        }
    }
}
