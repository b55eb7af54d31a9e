//! Raw syntax nodes produced by the grammar.
//!
//! Nodes are deliberately unclassified: a `t.List<User>` is a [`TypeRef`]
//! named `t.List` with one argument, not a list type. Deciding what a node
//! *means* is left to the validator and the IR builder.

/// 1-based source position of a node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Span {
    pub line: usize,
    pub column: usize,
}

impl Span {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl std::fmt::Display for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// One parsed schema file.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceFile {
    /// Project-relative path, `/`-separated, including the `.ts` extension.
    pub path: String,
    pub statements: Vec<Statement>,
}

/// A top-level statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Import(ImportDecl),
    TypeAlias(TypeAlias),
    Export(ExportStmt),
    Other(OtherStmt),
}

impl Statement {
    pub fn span(&self) -> Span {
        match self {
            Statement::Import(i) => i.span,
            Statement::TypeAlias(t) => t.span,
            Statement::Export(e) => e.span,
            Statement::Other(o) => o.span,
        }
    }
}

/// `import ... from '...'` in any of its forms.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportDecl {
    pub span: Span,
    /// Module specifier with quotes removed.
    pub module: String,
    /// `import type { .. }`
    pub type_only: bool,
    /// `import Foo from '..'`
    pub default: Option<String>,
    /// `import * as ns from '..'`
    pub namespace: Option<String>,
    /// `import { a, b as c } from '..'`
    pub named: Vec<ImportSpec>,
    /// `import '..'` with no clause at all.
    pub side_effect: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportSpec {
    pub span: Span,
    pub name: String,
    pub alias: Option<String>,
}

/// `[export] type Name<..> = value`
#[derive(Debug, Clone, PartialEq)]
pub struct TypeAlias {
    pub span: Span,
    pub name: String,
    pub exported: bool,
    /// Names of declared type parameters, if any.
    pub generics: Vec<String>,
    pub value: TypeNode,
    pub docs: Option<Docs>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportKind {
    /// `export default ...`
    Default,
    /// `export = ...`
    Assignment,
    /// `export { a, b }` / `export * from '..'`
    List,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExportStmt {
    pub span: Span,
    pub kind: ExportKind,
}

/// Head keyword of a statement that is not part of the DSL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatementKind {
    Function,
    Variable,
    Class,
    Interface,
    Enum,
    Namespace,
    Loop,
    Switch,
    If,
    Expression,
}

impl StatementKind {
    pub fn describe(self) -> &'static str {
        match self {
            StatementKind::Function => "function declaration",
            StatementKind::Variable => "variable declaration",
            StatementKind::Class => "class declaration",
            StatementKind::Interface => "interface declaration",
            StatementKind::Enum => "enum declaration",
            StatementKind::Namespace => "namespace declaration",
            StatementKind::Loop => "loop statement",
            StatementKind::Switch => "switch statement",
            StatementKind::If => "if statement",
            StatementKind::Expression => "expression statement",
        }
    }
}

/// Constructs found anywhere inside a non-DSL statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstructKind {
    Loop,
    Switch,
    Await,
    Arrow,
    Spread,
    TaggedTemplate,
}

impl ConstructKind {
    pub fn describe(self) -> &'static str {
        match self {
            ConstructKind::Loop => "loop",
            ConstructKind::Switch => "switch statement",
            ConstructKind::Await => "await expression",
            ConstructKind::Arrow => "arrow function",
            ConstructKind::Spread => "spread operator",
            ConstructKind::TaggedTemplate => "tagged template",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Construct {
    pub kind: ConstructKind,
    pub span: Span,
}

/// A statement kept only so it can be reported.
#[derive(Debug, Clone, PartialEq)]
pub struct OtherStmt {
    pub span: Span,
    pub kind: StatementKind,
    pub exported: bool,
    pub constructs: Vec<Construct>,
}

/// A type expression.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeNode {
    /// `Name` or `ns.Name`, optionally with `<args>`.
    Reference(TypeRef),
    /// `{ a: T; m(x: U): V }`
    Record(RecordLit),
    /// `[A, B]`
    Tuple(TupleLit),
    /// Anything else the grammar accepts in type position: arrays, `A | B`,
    /// literal types, function types.
    Unsupported { span: Span, text: String },
}

impl TypeNode {
    pub fn span(&self) -> Span {
        match self {
            TypeNode::Reference(r) => r.span,
            TypeNode::Record(r) => r.span,
            TypeNode::Tuple(t) => t.span,
            TypeNode::Unsupported { span, .. } => *span,
        }
    }

    pub fn as_reference(&self) -> Option<&TypeRef> {
        match self {
            TypeNode::Reference(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&RecordLit> {
        match self {
            TypeNode::Record(r) => Some(r),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeRef {
    pub span: Span,
    /// Dotted name exactly as written, e.g. `t.Dict` or `User`.
    pub name: String,
    pub args: Vec<TypeNode>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordLit {
    pub span: Span,
    pub members: Vec<Member>,
}

impl RecordLit {
    pub fn properties(&self) -> impl Iterator<Item = &PropertySig> {
        self.members.iter().filter_map(|m| match m {
            Member::Property(p) => Some(p),
            Member::Method(_) => None,
        })
    }

    pub fn methods(&self) -> impl Iterator<Item = &MethodSig> {
        self.members.iter().filter_map(|m| match m {
            Member::Method(m) => Some(m),
            Member::Property(_) => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TupleLit {
    pub span: Span,
    pub elements: Vec<TypeNode>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Member {
    Property(PropertySig),
    Method(MethodSig),
}

impl Member {
    pub fn span(&self) -> Span {
        match self {
            Member::Property(p) => p.span,
            Member::Method(m) => m.span,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Member::Property(p) => &p.name,
            Member::Method(m) => &m.name,
        }
    }
}

/// `name?: T`
#[derive(Debug, Clone, PartialEq)]
pub struct PropertySig {
    pub span: Span,
    pub name: String,
    pub optional: bool,
    pub ty: TypeNode,
    pub docs: Option<Docs>,
}

/// `name<G>(a: A, b?: B): R`
#[derive(Debug, Clone, PartialEq)]
pub struct MethodSig {
    pub span: Span,
    pub name: String,
    pub optional: bool,
    pub generics: Vec<String>,
    pub params: Vec<ParamNode>,
    pub return_type: Option<TypeNode>,
    pub docs: Option<Docs>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParamNode {
    pub span: Span,
    pub name: String,
    pub optional: bool,
    pub ty: Option<TypeNode>,
}

/// A `/** ... */` comment split into free text and `@tag value` lines.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Docs {
    pub text: String,
    pub tags: Vec<DocTag>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DocTag {
    pub span: Span,
    pub name: String,
    pub value: String,
}

impl Docs {
    /// Value of the last tag called `name`.
    pub fn tag(&self, name: &str) -> Option<&DocTag> {
        self.tags.iter().rev().find(|t| t.name == name)
    }

    /// Splits the raw comment text (delimiters included).
    pub fn parse(raw: &str, span: Span) -> Docs {
        let body = raw.strip_prefix("/**").unwrap_or(raw);
        let body = body.strip_suffix("*/").unwrap_or(body);

        let mut text_lines = Vec::new();
        let mut tags = Vec::new();

        for (offset, line) in body.lines().enumerate() {
            let line = line.trim();
            let line = line.strip_prefix('*').unwrap_or(line).trim();
            if let Some(tag) = line.strip_prefix('@') {
                let (name, value) = match tag.split_once(char::is_whitespace) {
                    Some((name, value)) => (name, value.trim()),
                    None => (tag, ""),
                };
                if name.is_empty() {
                    continue;
                }
                tags.push(DocTag {
                    span: Span::new(span.line + offset, span.column),
                    name: name.to_string(),
                    value: value.to_string(),
                });
            } else {
                text_lines.push(line);
            }
        }

        // Drop leading/trailing blank lines but keep paragraph breaks.
        while text_lines.first().is_some_and(|l| l.is_empty()) {
            text_lines.remove(0);
        }
        while text_lines.last().is_some_and(|l| l.is_empty()) {
            text_lines.pop();
        }

        Docs {
            text: text_lines.join("\n"),
            tags,
        }
    }
}
