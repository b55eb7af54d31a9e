#![deny(unsafe_code)]

//! Static checks for rpcgen schema files.
//!
//! The validator walks the same parsed files the IR builder lowers, but never
//! touches the IR. Every rule violation becomes one [`Diagnostic`]; nothing
//! short-circuits, so a single run reports everything wrong with a project.
//! Code generation must only proceed when [`validate`] returns no diagnostics.

use std::fmt;

use rpcgen_parse::{ParseError, Project, SourceFile, Span};

mod declarations;
mod exports;
mod file_names;
mod imports;
mod statements;
mod types;

/// One rule violation.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Diagnostic {
    pub file: String,
    pub span: Span,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}: {}",
            self.file, self.span.line, self.span.column, self.message
        )
    }
}

impl From<&ParseError> for Diagnostic {
    fn from(err: &ParseError) -> Self {
        Diagnostic {
            file: err.path.clone(),
            span: Span::new(err.line, err.column),
            message: format!("syntax error: {}", err.message),
        }
    }
}

/// Check every file of `project`.
///
/// Files that failed to parse contribute their parse error; the remaining
/// files are still checked. Diagnostics are ordered by file, then position.
pub fn validate(project: &Project) -> Vec<Diagnostic> {
    let mut diagnostics: Vec<Diagnostic> = project.failures().iter().map(Into::into).collect();

    for file in project.files() {
        let before = diagnostics.len();
        validate_file(project, file, &mut diagnostics);
        tracing::debug!(
            file = %file.path,
            errors = diagnostics.len() - before,
            "validated schema file"
        );
    }

    file_names::check(project, &mut diagnostics);

    diagnostics.sort_by(|a, b| a.file.cmp(&b.file).then(a.span.cmp(&b.span)));
    diagnostics
}

fn validate_file(project: &Project, file: &SourceFile, out: &mut Vec<Diagnostic>) {
    let mut cx = FileCx { project, file, out };
    statements::check(&mut cx);
    imports::check(&mut cx);
    exports::check(&mut cx);
    declarations::check(&mut cx);
}

/// Per-file state shared by the rule modules.
pub(crate) struct FileCx<'a> {
    pub project: &'a Project,
    pub file: &'a SourceFile,
    out: &'a mut Vec<Diagnostic>,
}

impl FileCx<'_> {
    pub fn error(&mut self, span: Span, message: impl Into<String>) {
        self.out.push(Diagnostic {
            file: self.file.path.clone(),
            span,
            message: message.into(),
        });
    }

    /// Number of diagnostics emitted so far; used to tell whether a nested
    /// check added any.
    pub fn error_count(&self) -> usize {
        self.out.len()
    }
}

#[cfg(test)]
pub(crate) mod test_util {
    use super::*;

    pub fn check(source: &str) -> Vec<Diagnostic> {
        validate(&Project::parse([("test.ts", source)]))
    }

    pub fn messages(source: &str) -> Vec<String> {
        check(source).into_iter().map(|d| d.message).collect()
    }

    pub const PRELUDE: &str = "import { t, Msg, QuerySvc, MutationSvc, Union } from '@rpcgen/types'\n";
}
