//! Go spellings of schema types, and message structs.

use heck::{ToLowerCamelCase, ToUpperCamelCase};
use rpcgen_schema::{DataType, Property, Scalar, Schema};

use crate::code_writer::CodeWriter;
use crate::{CodegenError, Language, cw_writeln};

/// `None` for `unit`, which Go can only express as a missing return value.
pub fn go_scalar(scalar: Scalar) -> Option<&'static str> {
    Some(match scalar {
        Scalar::Bool => "bool",
        Scalar::Int8 => "int8",
        Scalar::Uint8 => "uint8",
        Scalar::Int16 => "int16",
        Scalar::Uint16 => "uint16",
        Scalar::Int32 => "int32",
        Scalar::Uint32 => "uint32",
        Scalar::Int64 => "int64",
        Scalar::Uint64 => "uint64",
        Scalar::Float32 => "float32",
        Scalar::Float64 => "float64",
        Scalar::String => "string",
        Scalar::Blob => "[]byte",
        Scalar::Timestamp => "Timestamp",
        Scalar::Dynamic => "any",
        Scalar::Null => "*struct{}",
        Scalar::Unit => return None,
    })
}

/// `position` only feeds the error message.
pub fn go_type(ty: &DataType, position: &str) -> Result<String, CodegenError> {
    let unsupported = || CodegenError::unsupported(Language::Go, ty, position);
    let out = match ty {
        DataType::Scalar(s) => go_scalar(*s).ok_or_else(unsupported)?.to_string(),
        DataType::Struct { name, .. } => name.clone(),
        DataType::StructLiteral(props) => {
            let fields = props
                .iter()
                .map(|p| go_field(p, position))
                .collect::<Result<Vec<_>, _>>()?;
            format!("struct {{ {} }}", fields.join("; "))
        }
        DataType::Union(_) => "any".to_string(),
        DataType::Map { key, value } => {
            let key = go_scalar(*key)
                .filter(|_| key.is_comparable())
                .ok_or_else(unsupported)?;
            format!("map[{key}]{}", go_type(value, position)?)
        }
        DataType::List(inner) => format!("[]{}", go_type(inner, position)?),
        DataType::Tuple2 { .. }
        | DataType::Tuple3 { .. }
        | DataType::Tuple4 { .. }
        | DataType::Tuple5 { .. } => {
            let items = ty
                .tuple_items()
                .into_iter()
                .flatten()
                .map(|item| go_type(item, position))
                .collect::<Result<Vec<_>, _>>()?;
            format!("Tuple{}[{}]", items.len(), items.join(", "))
        }
    };
    Ok(out)
}

/// Optional values become pointers unless the type already has a nil.
pub fn go_optional(ty: String, optional: bool) -> String {
    let nilable = ty.starts_with("[]") || ty.starts_with("map[") || ty.starts_with('*') || ty == "any";
    if optional && !nilable {
        format!("*{ty}")
    } else {
        ty
    }
}

pub fn go_field_name(name: &str) -> String {
    name.to_upper_camel_case()
}

/// `Name Type `json:".." cbor:".."`` for a struct body.
pub fn go_field(p: &Property, position: &str) -> Result<String, CodegenError> {
    let ty = go_optional(go_type(&p.ty, position)?, p.optional);
    let omit = if p.optional { ",omitempty" } else { "" };
    Ok(format!(
        "{} {ty} `json:\"{name}{omit}\" cbor:\"{name}{omit}\"`",
        go_field_name(&p.name),
        name = p.name,
    ))
}

const RESERVED: &[&str] = &[
    "break", "case", "chan", "const", "continue", "default", "defer", "else", "fallthrough",
    "for", "func", "go", "goto", "if", "import", "interface", "map", "package", "range",
    "return", "select", "struct", "switch", "type", "var",
    // locals used by generated method bodies
    "ctx", "x", "q", "body", "w", "req", "srv", "out", "err",
];

/// Function parameter name for a schema parameter.
pub fn go_param_name(name: &str) -> String {
    let ident = name.to_lower_camel_case();
    if RESERVED.contains(&ident.as_str()) {
        format!("{ident}Arg")
    } else {
        ident
    }
}

pub fn write_messages(w: &mut CodeWriter, schema: &Schema) -> Result<(), CodegenError> {
    for message in &schema.messages {
        let position = format!("a field of `{}`", message.name);
        let fields = message
            .properties
            .iter()
            .map(|p| go_field(p, &position))
            .collect::<Result<Vec<_>, _>>()?;

        w.blank_line()?;
        if let Some(doc) = &message.doc {
            w.doc_comment("//", doc)?;
        }
        w.block(&format!("type {} struct", message.name), |w| {
            for field in &fields {
                cw_writeln!(w, "{field}")?;
            }
            Ok(())
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_mapping_is_stable() {
        for s in Scalar::ALL {
            assert_eq!(go_scalar(s), go_scalar(s));
        }
        assert_eq!(go_scalar(Scalar::Blob), Some("[]byte"));
        assert_eq!(go_scalar(Scalar::Unit), None);
    }

    #[test]
    fn composite_types() {
        let ty = DataType::map(
            Scalar::Uint8,
            DataType::tuple(vec![
                DataType::Scalar(Scalar::Timestamp),
                DataType::list(DataType::Struct {
                    name: "User".into(),
                    use_cbor: false,
                }),
            ])
            .unwrap(),
        );
        assert_eq!(go_type(&ty, "x").unwrap(), "map[uint8]Tuple2[Timestamp, []User]");
        assert_eq!(
            go_type(&DataType::Union(vec![DataType::Scalar(Scalar::Int8), DataType::Scalar(Scalar::Null)]), "x")
                .unwrap(),
            "any"
        );
    }

    #[test]
    fn unit_outside_returns_is_unsupported() {
        let err = go_type(&DataType::list(DataType::Scalar(Scalar::Unit)), "a field of `A`").unwrap_err();
        assert_eq!(err.to_string(), "go: cannot represent `t.unit` as a field of `A`");
    }

    #[test]
    fn optional_fields_are_pointers_unless_nilable() {
        let field = |ty: DataType| {
            go_field(
                &Property {
                    name: "nick_name".into(),
                    ty,
                    optional: true,
                },
                "x",
            )
            .unwrap()
        };
        assert_eq!(
            field(DataType::Scalar(Scalar::String)),
            "NickName *string `json:\"nick_name,omitempty\" cbor:\"nick_name,omitempty\"`"
        );
        assert!(field(DataType::list(DataType::Scalar(Scalar::Int8))).starts_with("NickName []int8 "));
        assert!(field(DataType::DYNAMIC).starts_with("NickName any "));
    }

    #[test]
    fn param_names_avoid_keywords_and_locals() {
        assert_eq!(go_param_name("user_id"), "userId");
        assert_eq!(go_param_name("type"), "typeArg");
        assert_eq!(go_param_name("ctx"), "ctxArg");
    }
}
