//! TypeScript spellings of schema types, and message interfaces.

use rpcgen_schema::{DataType, Param, Scalar, Schema};

use crate::code_writer::CodeWriter;
use crate::render::jsdoc;
use crate::{CodegenError, Language, cw_writeln};

pub fn ts_scalar(scalar: Scalar) -> &'static str {
    match scalar {
        Scalar::Bool => "boolean",
        Scalar::Int8
        | Scalar::Uint8
        | Scalar::Int16
        | Scalar::Uint16
        | Scalar::Int32
        | Scalar::Uint32
        | Scalar::Int64
        | Scalar::Uint64
        | Scalar::Float32
        | Scalar::Float64
        | Scalar::Timestamp => "number",
        Scalar::String => "string",
        // Declared in rpc.ts: base64 text over JSON, raw bytes over CBOR.
        Scalar::Blob => "Bytes",
        Scalar::Dynamic => "unknown",
        Scalar::Unit | Scalar::Null => "null",
    }
}

pub fn ts_type(ty: &DataType) -> Result<String, CodegenError> {
    let out = match ty {
        DataType::Scalar(s) => ts_scalar(*s).to_string(),
        DataType::Struct { name, .. } => name.clone(),
        DataType::StructLiteral(props) => {
            let fields = props
                .iter()
                .map(|p| {
                    let q = if p.optional { "?" } else { "" };
                    Ok(format!("{}{q}: {}", ts_key(&p.name), ts_type(&p.ty)?))
                })
                .collect::<Result<Vec<_>, CodegenError>>()?;
            format!("{{ {} }}", fields.join("; "))
        }
        DataType::Union(variants) => variants
            .iter()
            .map(ts_type)
            .collect::<Result<Vec<_>, _>>()?
            .join(" | "),
        DataType::Map { key, value } => {
            if !key.is_comparable() {
                return Err(CodegenError::unsupported(Language::TypeScript, ty, "a map"));
            }
            format!("Record<{}, {}>", ts_scalar(*key), ts_type(value)?)
        }
        DataType::List(inner) => {
            let item = ts_type(inner)?;
            if matches!(**inner, DataType::Union(_)) {
                format!("({item})[]")
            } else {
                format!("{item}[]")
            }
        }
        DataType::Tuple2 { .. }
        | DataType::Tuple3 { .. }
        | DataType::Tuple4 { .. }
        | DataType::Tuple5 { .. } => {
            let items = ty
                .tuple_items()
                .into_iter()
                .flatten()
                .map(ts_type)
                .collect::<Result<Vec<_>, _>>()?;
            format!("[{}]", items.join(", "))
        }
    };
    Ok(out)
}

/// `void` for unit returns.
pub fn ts_return_type(ty: &DataType) -> Result<String, CodegenError> {
    if ty.is_void() {
        Ok("void".to_string())
    } else {
        ts_type(ty)
    }
}

pub fn is_ts_ident(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

/// Property key, quoted when it isn't an identifier.
pub fn ts_key(name: &str) -> String {
    if is_ts_ident(name) {
        name.to_string()
    } else {
        crate::render::ts_string(name)
    }
}

pub fn ts_member(expr: &str, name: &str) -> String {
    if is_ts_ident(name) {
        format!("{expr}.{name}")
    } else {
        format!("{expr}[{}]", crate::render::ts_string(name))
    }
}

/// Parameter declarations. An optional parameter followed by a required one
/// is spelled `x: T | undefined`, since TypeScript forbids `x?` there.
pub fn ts_params(params: &[Param]) -> Result<Vec<String>, CodegenError> {
    params
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let ty = ts_type(&p.ty)?;
            let required_after = params[i + 1..].iter().any(|q| !q.optional);
            Ok(match (p.optional, required_after) {
                (false, _) => format!("{}: {ty}", p.name),
                (true, false) => format!("{}?: {ty}", p.name),
                (true, true) => format!("{}: {ty} | undefined", p.name),
            })
        })
        .collect()
}

pub fn write_messages(w: &mut CodeWriter, schema: &Schema) -> Result<(), CodegenError> {
    for message in &schema.messages {
        w.blank_line()?;
        jsdoc(w, message.doc.as_deref())?;
        let mut fields = Vec::with_capacity(message.properties.len());
        for p in &message.properties {
            let q = if p.optional { "?" } else { "" };
            fields.push(format!("{}{q}: {}", ts_key(&p.name), ts_type(&p.ty)?));
        }
        w.block(&format!("export interface {}", message.name), |w| {
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
    use rpcgen_schema::Property;

    use super::*;

    fn scalar(s: Scalar) -> DataType {
        DataType::Scalar(s)
    }

    #[test]
    fn scalar_mapping_is_stable() {
        for s in Scalar::ALL {
            assert_eq!(ts_scalar(s), ts_scalar(s));
        }
        assert_eq!(ts_scalar(Scalar::Uint64), "number");
        assert_eq!(ts_scalar(Scalar::Dynamic), "unknown");
    }

    #[test]
    fn composite_types() {
        let list_of_union = DataType::list(DataType::Union(vec![
            scalar(Scalar::Int8),
            scalar(Scalar::Null),
        ]));
        assert_eq!(ts_type(&list_of_union).unwrap(), "(number | null)[]");

        let record = DataType::StructLiteral(vec![
            Property {
                name: "x".into(),
                ty: scalar(Scalar::Bool),
                optional: false,
            },
            Property {
                name: "content-type".into(),
                ty: scalar(Scalar::String),
                optional: true,
            },
        ]);
        assert_eq!(
            ts_type(&record).unwrap(),
            "{ x: boolean; 'content-type'?: string }"
        );

        let map = DataType::map(
            Scalar::Uint32,
            DataType::tuple(vec![scalar(Scalar::String), scalar(Scalar::Blob)]).unwrap(),
        );
        assert_eq!(ts_type(&map).unwrap(), "Record<number, [string, Bytes]>");
    }

    #[test]
    fn non_comparable_map_key_is_unsupported() {
        let map = DataType::map(Scalar::Float64, scalar(Scalar::Int8));
        assert!(matches!(
            ts_type(&map),
            Err(CodegenError::Unsupported {
                language: Language::TypeScript,
                ..
            })
        ));
    }

    #[test]
    fn optional_params_before_required_ones() {
        let params = vec![
            Property {
                name: "a".into(),
                ty: scalar(Scalar::Int8),
                optional: true,
            },
            Property {
                name: "b".into(),
                ty: scalar(Scalar::String),
                optional: false,
            },
            Property {
                name: "c".into(),
                ty: scalar(Scalar::Bool),
                optional: true,
            },
        ];
        assert_eq!(
            ts_params(&params).unwrap(),
            ["a: number | undefined", "b: string", "c?: boolean"]
        );
    }

    #[test]
    fn member_access() {
        assert_eq!(ts_member("args", "id"), "args.id");
        assert_eq!(ts_member("args", "x-y"), "args['x-y']");
    }
}
