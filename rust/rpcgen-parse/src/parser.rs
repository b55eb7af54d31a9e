//! pest grammar and the pair → AST conversion.

use pest::Parser;
use pest::iterators::Pair;
use pest_derive::Parser;

use crate::ast::*;
use crate::error::ParseError;

#[derive(Parser)]
#[grammar = "grammar.pest"]
pub(crate) struct SchemaParser;

/// Parse one schema file.
///
/// `path` is only used for error reporting and is stored on the result.
pub fn parse_file(path: &str, source: &str) -> Result<SourceFile, ParseError> {
    let mut pairs = SchemaParser::parse(Rule::file, source)
        .map_err(|err| ParseError::from_pest(path, err))?;

    let mut statements = Vec::new();
    if let Some(file) = pairs.next() {
        for pair in file.into_inner() {
            if pair.as_rule() == Rule::statement {
                statements.push(convert_statement(pair));
            }
        }
    }

    tracing::trace!(path, statements = statements.len(), "parsed schema file");

    Ok(SourceFile {
        path: path.to_string(),
        statements,
    })
}

fn span_of(pair: &Pair<'_, Rule>) -> Span {
    let (line, column) = pair.as_span().start_pos().line_col();
    Span::new(line, column)
}

fn docs_of(pair: &Pair<'_, Rule>) -> Docs {
    Docs::parse(pair.as_str(), span_of(pair))
}

fn unquote(s: &str) -> String {
    let inner = if s.len() >= 2 { &s[1..s.len() - 1] } else { s };
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some(other) => out.push(other),
                None => {}
            }
        } else {
            out.push(c);
        }
    }
    out
}

fn convert_statement(pair: Pair<'_, Rule>) -> Statement {
    let span = span_of(&pair);
    let mut docs = None;
    for inner in pair.into_inner() {
        match inner.as_rule() {
            // When several doc comments precede a statement the closest one applies.
            Rule::doc_comment => docs = Some(docs_of(&inner)),
            Rule::import_decl => return Statement::Import(convert_import(inner)),
            Rule::export_default => return export(&inner, ExportKind::Default),
            Rule::export_assign => return export(&inner, ExportKind::Assignment),
            Rule::export_list => return export(&inner, ExportKind::List),
            Rule::type_alias => return Statement::TypeAlias(convert_type_alias(inner, docs)),
            Rule::other_stmt => return Statement::Other(convert_other(inner)),
            _ => {}
        }
    }
    // Only reachable for a statement made of doc comments alone, which the
    // grammar does not produce.
    Statement::Other(OtherStmt {
        span,
        kind: StatementKind::Expression,
        exported: false,
        constructs: Vec::new(),
    })
}

fn export(pair: &Pair<'_, Rule>, kind: ExportKind) -> Statement {
    Statement::Export(ExportStmt {
        span: span_of(pair),
        kind,
    })
}

fn convert_import(pair: Pair<'_, Rule>) -> ImportDecl {
    let mut decl = ImportDecl {
        span: span_of(&pair),
        module: String::new(),
        type_only: false,
        default: None,
        namespace: None,
        named: Vec::new(),
        side_effect: true,
    };

    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::type_only => decl.type_only = true,
            Rule::default_import => {
                decl.side_effect = false;
                decl.default = Some(inner.as_str().trim().to_string());
            }
            Rule::namespace_import => {
                decl.side_effect = false;
                decl.namespace = inner
                    .into_inner()
                    .find(|p| p.as_rule() == Rule::ident)
                    .map(|p| p.as_str().to_string());
            }
            Rule::named_imports => {
                decl.side_effect = false;
                for spec in inner.into_inner() {
                    decl.named.push(convert_import_spec(spec));
                }
            }
            Rule::string_lit => decl.module = unquote(inner.as_str()),
            _ => {}
        }
    }

    decl
}

fn convert_import_spec(pair: Pair<'_, Rule>) -> ImportSpec {
    let span = span_of(&pair);
    let mut idents = pair
        .into_inner()
        .filter(|p| p.as_rule() == Rule::ident)
        .map(|p| p.as_str().to_string());
    ImportSpec {
        span,
        name: idents.next().unwrap_or_default(),
        alias: idents.next(),
    }
}

fn convert_type_alias(pair: Pair<'_, Rule>, docs: Option<Docs>) -> TypeAlias {
    let span = span_of(&pair);
    let mut exported = false;
    let mut name = String::new();
    let mut generics = Vec::new();
    let mut value = None;

    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::export_kw => exported = true,
            Rule::ident => name = inner.as_str().to_string(),
            Rule::type_params => generics = convert_type_params(inner),
            Rule::type_expr => value = Some(convert_type_expr(inner)),
            _ => {}
        }
    }

    TypeAlias {
        span,
        name,
        exported,
        generics,
        value: value.unwrap_or(TypeNode::Unsupported {
            span,
            text: String::new(),
        }),
        docs,
    }
}

fn convert_type_params(pair: Pair<'_, Rule>) -> Vec<String> {
    pair.into_inner()
        .filter(|p| p.as_rule() == Rule::type_param)
        .filter_map(|p| {
            p.into_inner()
                .find(|i| i.as_rule() == Rule::ident)
                .map(|i| i.as_str().to_string())
        })
        .collect()
}

fn convert_other(pair: Pair<'_, Rule>) -> OtherStmt {
    let span = span_of(&pair);
    let mut exported = false;
    let mut kind = StatementKind::Expression;
    let mut constructs = Vec::new();

    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::export_kw => exported = true,
            Rule::fn_head => kind = StatementKind::Function,
            Rule::class_head => kind = StatementKind::Class,
            Rule::interface_head => kind = StatementKind::Interface,
            Rule::enum_head => kind = StatementKind::Enum,
            Rule::namespace_head => kind = StatementKind::Namespace,
            Rule::var_head => kind = StatementKind::Variable,
            Rule::for_head | Rule::while_head | Rule::do_head => kind = StatementKind::Loop,
            Rule::switch_head => kind = StatementKind::Switch,
            Rule::if_head => kind = StatementKind::If,
            _ => {}
        }
        collect_constructs(inner, &mut constructs);
    }

    OtherStmt {
        span,
        kind,
        exported,
        constructs,
    }
}

fn collect_constructs(pair: Pair<'_, Rule>, out: &mut Vec<Construct>) {
    let kind = match pair.as_rule() {
        Rule::loop_kw => Some(ConstructKind::Loop),
        Rule::switch_kw => Some(ConstructKind::Switch),
        Rule::await_expr => Some(ConstructKind::Await),
        Rule::arrow => Some(ConstructKind::Arrow),
        Rule::spread => Some(ConstructKind::Spread),
        Rule::tagged_template => Some(ConstructKind::TaggedTemplate),
        _ => None,
    };
    if let Some(kind) = kind {
        out.push(Construct {
            kind,
            span: span_of(&pair),
        });
        return;
    }
    for inner in pair.into_inner() {
        collect_constructs(inner, out);
    }
}

fn unsupported(pair: &Pair<'_, Rule>) -> TypeNode {
    TypeNode::Unsupported {
        span: span_of(pair),
        text: pair.as_str().trim().to_string(),
    }
}

fn convert_type_expr(pair: Pair<'_, Rule>) -> TypeNode {
    let operands: Vec<_> = pair
        .clone()
        .into_inner()
        .filter(|p| p.as_rule() != Rule::type_op)
        .collect();

    match <[_; 1]>::try_from(operands) {
        Ok([operand]) => convert_type_operand(operand),
        // `A | B` and `A & B` are not part of the DSL.
        Err(_) => unsupported(&pair),
    }
}

fn convert_type_operand(pair: Pair<'_, Rule>) -> TypeNode {
    match pair.as_rule() {
        Rule::type_ref => convert_type_ref(pair),
        Rule::record_lit => TypeNode::Record(convert_record(pair)),
        Rule::tuple_lit => TypeNode::Tuple(TupleLit {
            span: span_of(&pair),
            elements: pair
                .into_inner()
                .filter(|p| p.as_rule() == Rule::type_expr)
                .map(convert_type_expr)
                .collect(),
        }),
        Rule::paren_type => match pair
            .clone()
            .into_inner()
            .find(|p| p.as_rule() == Rule::type_expr)
        {
            Some(inner) => convert_type_expr(inner),
            None => unsupported(&pair),
        },
        _ => unsupported(&pair),
    }
}

fn convert_type_ref(pair: Pair<'_, Rule>) -> TypeNode {
    let span = span_of(&pair);
    let mut name = String::new();
    let mut args = Vec::new();

    for inner in pair.clone().into_inner() {
        match inner.as_rule() {
            Rule::qualified_name => name = inner.as_str().to_string(),
            Rule::type_args => {
                args = inner
                    .into_inner()
                    .filter(|p| p.as_rule() == Rule::type_expr)
                    .map(convert_type_expr)
                    .collect();
            }
            // `T[]` is spelled `t.List<T>` in schemas.
            Rule::array_suffix => return unsupported(&pair),
            _ => {}
        }
    }

    TypeNode::Reference(TypeRef { span, name, args })
}

fn convert_record(pair: Pair<'_, Rule>) -> RecordLit {
    let span = span_of(&pair);
    let members = pair
        .into_inner()
        .filter(|p| p.as_rule() == Rule::member)
        .filter_map(convert_member)
        .collect();
    RecordLit { span, members }
}

fn convert_member(pair: Pair<'_, Rule>) -> Option<Member> {
    let mut docs = None;
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::doc_comment => docs = Some(docs_of(&inner)),
            Rule::property_sig => return Some(Member::Property(convert_property(inner, docs))),
            Rule::method_sig => return Some(Member::Method(convert_method(inner, docs))),
            _ => {}
        }
    }
    None
}

fn member_name(pair: Pair<'_, Rule>) -> String {
    match pair.into_inner().next() {
        Some(p) if p.as_rule() == Rule::string_lit => unquote(p.as_str()),
        Some(p) => p.as_str().to_string(),
        None => String::new(),
    }
}

fn convert_property(pair: Pair<'_, Rule>, docs: Option<Docs>) -> PropertySig {
    let span = span_of(&pair);
    let mut name = String::new();
    let mut optional = false;
    let mut ty = None;

    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::member_name => name = member_name(inner),
            Rule::optional_mark => optional = true,
            Rule::type_expr => ty = Some(convert_type_expr(inner)),
            _ => {}
        }
    }

    PropertySig {
        span,
        name,
        optional,
        ty: ty.unwrap_or(TypeNode::Unsupported {
            span,
            text: String::new(),
        }),
        docs,
    }
}

fn convert_method(pair: Pair<'_, Rule>, docs: Option<Docs>) -> MethodSig {
    let mut method = MethodSig {
        span: span_of(&pair),
        name: String::new(),
        optional: false,
        generics: Vec::new(),
        params: Vec::new(),
        return_type: None,
        docs,
    };

    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::member_name => method.name = member_name(inner),
            Rule::optional_mark => method.optional = true,
            Rule::type_params => method.generics = convert_type_params(inner),
            Rule::param_list => {
                method.params = inner
                    .into_inner()
                    .filter(|p| p.as_rule() == Rule::param)
                    .map(convert_param)
                    .collect();
            }
            Rule::type_expr => method.return_type = Some(convert_type_expr(inner)),
            _ => {}
        }
    }

    method
}

fn convert_param(pair: Pair<'_, Rule>) -> ParamNode {
    let mut param = ParamNode {
        span: span_of(&pair),
        name: String::new(),
        optional: false,
        ty: None,
    };
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::ident => param.name = inner.as_str().to_string(),
            Rule::optional_mark => param.optional = true,
            Rule::type_expr => param.ty = Some(convert_type_expr(inner)),
            _ => {}
        }
    }
    param
}
