use rpcgen_schema::{DataType, Schema};

use crate::code_writer::CodeWriter;

pub const GENERATED_NOTICE: &str = "Code generated by rpcgen. DO NOT EDIT.";

/// First line of every generated file.
pub fn header_line(comment: &str, schema: Option<&Schema>) -> String {
    match schema {
        Some(schema) => format!(
            "{comment} Code generated by rpcgen from {}.ts. DO NOT EDIT.",
            schema.file_name
        ),
        None => format!("{comment} {GENERATED_NOTICE}"),
    }
}

/// Schema-language spelling of a type, for error messages.
pub fn describe(ty: &DataType) -> String {
    match ty {
        DataType::Scalar(s) => format!("t.{s}"),
        DataType::Struct { name, .. } => name.clone(),
        DataType::StructLiteral(props) => {
            let fields: Vec<String> = props
                .iter()
                .map(|p| {
                    let q = if p.optional { "?" } else { "" };
                    format!("{}{q}: {}", p.name, describe(&p.ty))
                })
                .collect();
            format!("{{ {} }}", fields.join("; "))
        }
        DataType::Union(variants) => {
            let items: Vec<String> = variants.iter().map(describe).collect();
            format!("[{}]", items.join(", "))
        }
        DataType::Map { key, value } => format!("t.Dict<t.{key}, {}>", describe(value)),
        DataType::List(inner) => format!("t.List<{}>", describe(inner)),
        DataType::Tuple2 { .. }
        | DataType::Tuple3 { .. }
        | DataType::Tuple4 { .. }
        | DataType::Tuple5 { .. } => {
            let items: Vec<String> = ty
                .tuple_items()
                .into_iter()
                .flatten()
                .map(describe)
                .collect();
            format!("t.Tuple{}<{}>", items.len(), items.join(", "))
        }
    }
}

/// Does any type the schema mentions, at any depth, satisfy `pred`?
pub fn any_type(schema: &Schema, pred: impl Fn(&DataType) -> bool) -> bool {
    let mut roots: Vec<&DataType> = schema
        .messages
        .iter()
        .flat_map(|m| m.properties.iter().map(|p| &p.ty))
        .collect();
    for method in schema.services().flat_map(|s| &s.methods) {
        roots.extend(method.params.iter().map(|p| &p.ty));
        roots.push(&method.return_type);
    }
    let mut hit = false;
    for root in roots {
        root.walk(&mut |ty| hit |= pred(ty));
    }
    hit
}

/// `/** .. */` block, single-line when the text is.
pub fn jsdoc(w: &mut CodeWriter, doc: Option<&str>) -> std::fmt::Result {
    let Some(doc) = doc else { return Ok(()) };
    let lines: Vec<&str> = doc.lines().collect();
    if let [line] = lines.as_slice() {
        return w.writeln(&format!("/** {line} */"));
    }
    w.writeln("/**")?;
    w.doc_comment(" *", doc)?;
    w.writeln(" */")
}

/// Single-quoted TypeScript string literal.
pub fn ts_string(value: &str) -> String {
    format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'"))
}

/// Double-quoted Go or Rust string literal.
pub fn quoted(value: &str) -> String {
    format!("{value:?}")
}

#[cfg(test)]
mod tests {
    use rpcgen_schema::Scalar;

    use super::*;

    #[test]
    fn describe_uses_schema_spelling() {
        let ty = DataType::map(
            Scalar::String,
            DataType::tuple(vec![
                DataType::Scalar(Scalar::Int8),
                DataType::list(DataType::Struct {
                    name: "User".into(),
                    use_cbor: false,
                }),
            ])
            .unwrap(),
        );
        assert_eq!(describe(&ty), "t.Dict<t.string, t.Tuple2<t.int8, t.List<User>>>");
    }

    #[test]
    fn jsdoc_shapes() {
        let mut w = CodeWriter::with_indent_spaces(2);
        jsdoc(&mut w, Some("one")).unwrap();
        jsdoc(&mut w, Some("two\nlines")).unwrap();
        jsdoc(&mut w, None).unwrap();
        assert_eq!(w.finish(), "/** one */\n/**\n * two\n * lines\n */\n");
    }

    #[test]
    fn string_literals() {
        assert_eq!(ts_string("it's"), r"'it\'s'");
        assert_eq!(quoted("/Users/get"), "\"/Users/get\"");
    }
}
