use pest::error::{Error as PestError, LineColLocation};

use crate::parser::Rule;

/// A schema file that the grammar could not accept at all.
///
/// Only truly unparseable text ends up here. Constructs the DSL forbids but
/// the grammar recognizes are kept as nodes and reported by the validator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{path}:{line}:{column}: {message}")]
pub struct ParseError {
    pub path: String,
    pub line: usize,
    pub column: usize,
    pub message: String,
}

impl ParseError {
    pub(crate) fn from_pest(path: &str, err: PestError<Rule>) -> Self {
        let (line, column) = match err.line_col {
            LineColLocation::Pos(pos) => pos,
            LineColLocation::Span(start, _) => start,
        };
        let err = err.renamed_rules(describe_rule);
        Self {
            path: path.to_string(),
            line,
            column,
            message: err.variant.message().into_owned(),
        }
    }
}

fn describe_rule(rule: &Rule) -> String {
    match rule {
        Rule::EOI => "end of file".into(),
        Rule::ident => "identifier".into(),
        Rule::string_lit => "string literal".into(),
        Rule::statement => "statement".into(),
        Rule::type_expr => "type".into(),
        Rule::member => "property or method".into(),
        Rule::param => "parameter".into(),
        Rule::import_spec => "import name".into(),
        other => format!("{other:?}"),
    }
}
