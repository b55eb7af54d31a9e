//! Rust spellings of schema types.
//!
//! Rust has no anonymous records or untagged unions, so inline object types
//! and unions are hoisted into named items. The name comes from where the
//! type appears: field `meta` of `User` becomes `UserMeta`, the return type
//! of `Users.getUser` becomes `UsersGetUserOutput`.
//!
//! A message that contains itself without a `Vec` or `HashMap` in between
//! would have infinite size, so such references are boxed.

use std::collections::{BTreeMap, BTreeSet};

use heck::{ToSnakeCase, ToUpperCamelCase};
use rpcgen_schema::{DataType, Message, Property, Scalar};

use crate::code_writer::CodeWriter;
use crate::render::quoted;
use crate::{CodegenError, Language, cw_writeln};

pub fn rust_scalar(scalar: Scalar) -> &'static str {
    match scalar {
        Scalar::Bool => "bool",
        Scalar::Int8 => "i8",
        Scalar::Uint8 => "u8",
        Scalar::Int16 => "i16",
        Scalar::Uint16 => "u16",
        Scalar::Int32 => "i32",
        Scalar::Uint32 => "u32",
        Scalar::Int64 => "i64",
        Scalar::Uint64 => "u64",
        Scalar::Float32 => "f32",
        Scalar::Float64 => "f64",
        Scalar::String => "String",
        Scalar::Blob => "Blob",
        Scalar::Timestamp => "Timestamp",
        Scalar::Dynamic => "serde_json::Value",
        Scalar::Unit | Scalar::Null => "()",
    }
}

const KEYWORDS: &[&str] = &[
    "as", "async", "await", "break", "const", "continue", "dyn", "else", "enum", "extern",
    "false", "fn", "for", "gen", "if", "impl", "in", "let", "loop", "match", "mod", "move",
    "mut", "pub", "ref", "return", "static", "struct", "trait", "true", "type", "unsafe", "use",
    "where", "while", "abstract", "become", "box", "do", "final", "macro", "override", "priv",
    "try", "typeof", "unsized", "virtual", "yield",
];

/// Cannot be raw identifiers.
const PATH_KEYWORDS: &[&str] = &["self", "Self", "super", "crate"];

/// snake_case identifier, raw when it collides with a keyword.
pub fn rust_ident(name: &str) -> String {
    let ident = name.to_snake_case();
    if PATH_KEYWORDS.contains(&ident.as_str()) {
        format!("{ident}_")
    } else if KEYWORDS.contains(&ident.as_str()) {
        format!("r#{ident}")
    } else {
        ident
    }
}

/// Locals of generated method bodies.
const LOCALS: &[&str] = &[
    "ctx", "service", "headers", "raw_query", "query", "body", "params", "out", "err",
];

pub fn rust_param_ident(name: &str) -> String {
    let ident = rust_ident(name);
    if LOCALS.contains(&ident.as_str()) {
        format!("{ident}_arg")
    } else {
        ident
    }
}

/// Messages `ty` stores inline, i.e. not behind a `Vec` or `HashMap`.
fn inline_refs<'a>(ty: &'a DataType, out: &mut Vec<&'a str>) {
    match ty {
        DataType::Scalar(_) | DataType::List(_) | DataType::Map { .. } => {}
        DataType::Struct { name, .. } => out.push(name),
        DataType::StructLiteral(props) => {
            for p in props {
                inline_refs(&p.ty, out);
            }
        }
        DataType::Union(variants) => {
            for v in variants {
                inline_refs(v, out);
            }
        }
        DataType::Tuple2 { .. }
        | DataType::Tuple3 { .. }
        | DataType::Tuple4 { .. }
        | DataType::Tuple5 { .. } => {
            for item in ty.tuple_items().into_iter().flatten() {
                inline_refs(item, out);
            }
        }
    }
}

/// For each message, every message of the same file it holds inline,
/// directly or transitively.
fn inline_reach(messages: &[Message]) -> BTreeMap<String, BTreeSet<String>> {
    let direct: BTreeMap<&str, Vec<&str>> = messages
        .iter()
        .map(|m| {
            let mut refs = Vec::new();
            for p in &m.properties {
                inline_refs(&p.ty, &mut refs);
            }
            (m.name.as_str(), refs)
        })
        .collect();

    let mut reach = BTreeMap::new();
    for start in direct.keys() {
        let mut seen = BTreeSet::new();
        let mut stack: Vec<&str> = direct[start].clone();
        while let Some(name) = stack.pop() {
            if seen.insert(name.to_string())
                && let Some(next) = direct.get(name)
            {
                stack.extend(next);
            }
        }
        reach.insert(start.to_string(), seen);
    }
    reach
}

/// Collects the named items a schema file needs besides its messages.
#[derive(Default)]
pub struct RustTypes {
    items: Vec<String>,
    names: BTreeSet<String>,
    reach: BTreeMap<String, BTreeSet<String>>,
    /// Message whose fields are being resolved.
    current: Option<String>,
}

impl RustTypes {
    pub fn new<'a>(reserved: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            names: reserved.into_iter().map(str::to_string).collect(),
            ..Self::default()
        }
    }

    /// Must see every message of the file before any of them is rendered.
    pub fn box_cycles(&mut self, messages: &[Message]) {
        self.reach = inline_reach(messages);
    }

    /// Whether a field of the current message that holds `name` inline
    /// leads back to the current message.
    fn needs_box(&self, name: &str) -> bool {
        let Some(current) = &self.current else {
            return false;
        };
        name == current || self.reach.get(name).is_some_and(|r| r.contains(current))
    }

    /// `hint` names any item hoisted out of `ty`.
    pub fn rust_type(&mut self, ty: &DataType, hint: &str) -> Result<String, CodegenError> {
        let out = match ty {
            DataType::Scalar(s) => rust_scalar(*s).to_string(),
            DataType::Struct { name, .. } if self.needs_box(name) => format!("Box<{name}>"),
            DataType::Struct { name, .. } => name.clone(),
            DataType::StructLiteral(props) => {
                let name = self.claim(hint);
                let fields = self.fields(&name, props)?;
                self.items.push(render_struct(&name, None, &fields)?);
                name
            }
            DataType::Union(variants) => {
                let name = self.claim(hint);
                let item = self.render_union(&name, variants)?;
                self.items.push(item);
                name
            }
            DataType::Map { key, value } => {
                if !key.is_comparable() {
                    return Err(CodegenError::unsupported(Language::Rust, ty, "a map key"));
                }
                let value = self.behind_pointer(|t| t.rust_type(value, &format!("{hint}Value")))?;
                format!("HashMap<{}, {value}>", rust_scalar(*key))
            }
            DataType::List(inner) => {
                let item = self.behind_pointer(|t| t.rust_type(inner, &format!("{hint}Item")))?;
                format!("Vec<{item}>")
            }
            DataType::Tuple2 { .. }
            | DataType::Tuple3 { .. }
            | DataType::Tuple4 { .. }
            | DataType::Tuple5 { .. } => {
                let mut items = Vec::new();
                for (i, item) in ty.tuple_items().into_iter().flatten().enumerate() {
                    items.push(self.rust_type(item, &format!("{hint}{}", i + 1))?);
                }
                format!("({})", items.join(", "))
            }
        };
        Ok(out)
    }

    /// Like [`Self::rust_type`], wrapped in `Option` when optional.
    pub fn property_type(&mut self, p: &Property, owner: &str) -> Result<String, CodegenError> {
        let ty = self.rust_type(&p.ty, &format!("{owner}{}", p.name.to_upper_camel_case()))?;
        Ok(if p.optional { format!("Option<{ty}>") } else { ty })
    }

    pub fn message(&mut self, message: &Message) -> Result<String, CodegenError> {
        self.names.insert(message.name.clone());
        self.current = Some(message.name.clone());
        let fields = self.fields(&message.name, &message.properties);
        self.current = None;
        render_struct(&message.name, message.doc.as_deref(), &fields?)
    }

    /// Resolve a type stored on the heap, where recursion needs no box.
    fn behind_pointer<T>(&mut self, f: impl FnOnce(&mut Self) -> T) -> T {
        let current = self.current.take();
        let out = f(self);
        self.current = current;
        out
    }

    /// A struct over already-resolved fields, such as a POST body. Returns
    /// the name it was given.
    pub fn named_struct(
        &mut self,
        name: &str,
        doc: &str,
        fields: &[(&Property, String)],
    ) -> Result<String, CodegenError> {
        let name = self.claim(name);
        self.items.push(render_struct(&name, Some(doc), fields)?);
        Ok(name)
    }

    /// Hoisted items collected so far.
    pub fn take_items(&mut self) -> Vec<String> {
        std::mem::take(&mut self.items)
    }

    fn fields<'p>(&mut self, owner: &str, props: &'p [Property]) -> Result<Vec<(&'p Property, String)>, CodegenError> {
        props
            .iter()
            .map(|p| Ok((p, self.property_type(p, owner)?)))
            .collect()
    }

    fn claim(&mut self, hint: &str) -> String {
        let mut name = hint.to_string();
        let mut n = 2;
        while self.names.contains(&name) {
            name = format!("{hint}{n}");
            n += 1;
        }
        self.names.insert(name.clone());
        name
    }

    fn render_union(&mut self, name: &str, variants: &[DataType]) -> Result<String, CodegenError> {
        let mut types = Vec::new();
        for (i, variant) in variants.iter().enumerate() {
            types.push(self.rust_type(variant, &format!("{name}V{i}"))?);
        }

        let mut w = CodeWriter::with_indent_spaces(4);
        w.writeln("#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]")?;
        w.writeln("#[serde(untagged)]")?;
        w.block(&format!("pub enum {name}"), |w| {
            for (i, ty) in types.iter().enumerate() {
                cw_writeln!(w, "V{i}({ty}),")?;
            }
            Ok(())
        })?;
        Ok(w.finish())
    }
}

fn render_struct(name: &str, doc: Option<&str>, fields: &[(&Property, String)]) -> Result<String, CodegenError> {
    let mut w = CodeWriter::with_indent_spaces(4);
    if let Some(doc) = doc {
        w.doc_comment("///", doc)?;
    }
    w.writeln("#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]")?;
    w.block(&format!("pub struct {name}"), |w| {
        for (p, ty) in fields {
            let ident = rust_ident(&p.name);
            let mut attrs = Vec::new();
            if ident.trim_start_matches("r#") != p.name {
                attrs.push(format!("rename = {}", quoted(&p.name)));
            }
            if p.optional {
                attrs.push("default".to_string());
                attrs.push("skip_serializing_if = \"Option::is_none\"".to_string());
            }
            if !attrs.is_empty() {
                cw_writeln!(w, "#[serde({})]", attrs.join(", "))?;
            }
            cw_writeln!(w, "pub {ident}: {ty},")?;
        }
        Ok(())
    })?;
    Ok(w.finish())
}
