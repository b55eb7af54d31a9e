//! Recursive checks for type expressions in fields, parameters and returns.

use rpcgen_parse::{
    ContainerKind, DeclTag, RecordLit, TypeNode, TypeRef, is_namespaced, strip_types_namespace,
};
use rpcgen_schema::Scalar;

use crate::FileCx;

/// Scalar named by a bare reference, if any.
fn scalar_of(node: &TypeNode) -> Option<Scalar> {
    let reference = node.as_reference()?;
    if !reference.args.is_empty() {
        return None;
    }
    Scalar::from_keyword(strip_types_namespace(&reference.name))
}

/// Short human-readable rendering of a node for messages.
pub(crate) fn describe(node: &TypeNode) -> String {
    match node {
        TypeNode::Reference(r) if r.args.is_empty() => r.name.clone(),
        TypeNode::Reference(r) => format!("{}<..>", r.name),
        TypeNode::Record(_) => "{ .. }".to_string(),
        TypeNode::Tuple(_) => "[ .. ]".to_string(),
        TypeNode::Unsupported { text, .. } => text.clone(),
    }
}

/// A scalar in the query-paramable set, or `t.List` of one.
pub(crate) fn is_query_paramable(node: &TypeNode) -> bool {
    if let Some(scalar) = scalar_of(node) {
        return scalar.is_query_paramable();
    }
    match node.as_reference() {
        Some(r) if ContainerKind::from_reference_name(&r.name) == Some(ContainerKind::List) => {
            matches!(r.args.as_slice(), [inner] if scalar_of(inner).is_some_and(Scalar::is_query_paramable))
        }
        _ => false,
    }
}

impl FileCx<'_> {
    /// Check one type expression; returns `true` if it produced no errors.
    pub fn check_type(&mut self, node: &TypeNode) -> bool {
        let before = self.error_count();
        match node {
            TypeNode::Reference(reference) => self.check_reference(node, reference),
            TypeNode::Record(record) => self.check_inline_record(record),
            TypeNode::Tuple(tuple) => self.check_union(node.span(), &tuple.elements),
            TypeNode::Unsupported { span, text } => self.error(
                *span,
                format!(
                    "unsupported type `{text}`; use `t.List<T>` for arrays and `[A, B]` for unions"
                ),
            ),
        }
        self.error_count() == before
    }

    fn check_reference(&mut self, node: &TypeNode, reference: &TypeRef) {
        let span = reference.span;
        let name = reference.name.as_str();

        if let Some(scalar) = Scalar::from_keyword(strip_types_namespace(name)) {
            if !reference.args.is_empty() {
                self.error(span, format!("`{scalar}` takes no type arguments"));
            }
            return;
        }

        if let Some(tag) = DeclTag::from_name(name) {
            if tag != DeclTag::Union {
                self.error(
                    span,
                    format!("`{name}` is only valid as the outer wrapper of a declaration"),
                );
                return;
            }
            match node.union_variants() {
                Some(variants) => self.check_union(span, variants),
                None => self.error(span, "`Union` takes a single tuple of types: `Union<[A, B]>`"),
            }
            return;
        }

        if let Some(container) = ContainerKind::from_reference_name(name) {
            let arity = container.arity();
            if reference.args.len() != arity {
                let plural = if arity == 1 { "" } else { "s" };
                self.error(
                    span,
                    format!(
                        "`{name}` takes {arity} type argument{plural}, found {}",
                        reference.args.len()
                    ),
                );
                return;
            }
            if container == ContainerKind::Dict {
                let key = &reference.args[0];
                if !scalar_of(key).is_some_and(Scalar::is_comparable) {
                    self.error(
                        key.span(),
                        format!(
                            "map key must be `string` or an integer type, found `{}`",
                            describe(key)
                        ),
                    );
                }
                self.check_type(&reference.args[1]);
            } else {
                for arg in &reference.args {
                    self.check_type(arg);
                }
            }
            return;
        }

        if is_namespaced(name) {
            self.error(span, format!("unknown built-in type `{name}`"));
            return;
        }

        if !reference.args.is_empty() {
            self.error(span, format!("`{name}` takes no type arguments"));
        }
        self.check_struct_ref(span, name);
    }

    fn check_struct_ref(&mut self, span: rpcgen_parse::Span, name: &str) {
        let file = self.file;
        if file.message(name).is_some() {
            return;
        }
        if file.imported_names().any(|(_, spec)| spec.name == name) {
            // Whether the import itself resolves is reported on the import.
            return;
        }
        if file.services().any(|d| d.name() == name) {
            self.error(span, format!("`{name}` is a service, not a message"));
        } else {
            self.error(span, format!("unknown type `{name}`"));
        }
    }

    fn check_union(&mut self, span: rpcgen_parse::Span, variants: &[TypeNode]) {
        if variants.len() < 2 {
            self.error(span, "a union must list at least two types");
        }
        for variant in variants {
            self.check_type(variant);
        }
    }

    fn check_inline_record(&mut self, record: &RecordLit) {
        self.check_properties(record, "inline record");
    }
}

#[cfg(test)]
mod tests {
    use crate::test_util::*;

    fn field_errors(ty: &str) -> Vec<String> {
        messages(&format!("{PRELUDE}export type A = Msg<{{ f: {ty} }}>\n"))
    }

    #[test]
    fn valid_field_types() {
        for ty in [
            "t.int8",
            "uint64",
            "t.timestamp",
            "t.List<t.blob>",
            "t.Dict<t.string, A>",
            "t.Dict<uint16, t.List<A>>",
            "t.Tuple2<int8, string>",
            "t.Tuple5<int8, int8, int8, int8, int8>",
            "[int8, string]",
            "Union<[A, null]>",
            "{ x: int8; y?: string }",
            "t.dynamic",
            "A",
        ] {
            assert!(field_errors(ty).is_empty(), "{ty}: {:?}", field_errors(ty));
        }
    }

    #[test]
    fn container_arity() {
        assert_eq!(
            field_errors("t.List<int8, int8>"),
            ["`t.List` takes 1 type argument, found 2"]
        );
        assert_eq!(
            field_errors("t.Dict<string>"),
            ["`t.Dict` takes 2 type arguments, found 1"]
        );
        assert_eq!(
            field_errors("t.Tuple3<int8, int8>"),
            ["`t.Tuple3` takes 3 type arguments, found 2"]
        );
    }

    #[test]
    fn map_keys_must_be_comparable() {
        assert_eq!(
            field_errors("t.Dict<float64, int8>"),
            ["map key must be `string` or an integer type, found `float64`"]
        );
        assert_eq!(
            field_errors("t.Dict<A, int8>"),
            ["map key must be `string` or an integer type, found `A`"]
        );
    }

    #[test]
    fn nested_errors_are_found() {
        assert_eq!(
            field_errors("t.List<t.Dict<string, Nope>>"),
            ["unknown type `Nope`"]
        );
        assert_eq!(field_errors("{ x: t.Bogus }"), ["unknown built-in type `t.Bogus`"]);
    }

    #[test]
    fn unions_need_two_variants() {
        assert_eq!(field_errors("[int8]"), ["a union must list at least two types"]);
        assert_eq!(
            field_errors("Union<A>"),
            ["`Union` takes a single tuple of types: `Union<[A, B]>`"]
        );
    }

    #[test]
    fn unsupported_syntax() {
        assert_eq!(
            field_errors("string[]"),
            ["unsupported type `string[]`; use `t.List<T>` for arrays and `[A, B]` for unions"]
        );
        assert_eq!(field_errors("A | string").len(), 1);
    }

    #[test]
    fn scalars_and_wrappers_misused() {
        assert_eq!(field_errors("int8<string>"), ["`int8` takes no type arguments"]);
        assert_eq!(
            field_errors("Msg<{ a: int8 }>"),
            ["`Msg` is only valid as the outer wrapper of a declaration"]
        );
        assert_eq!(field_errors("List<int8>"), ["`List` takes no type arguments", "unknown type `List`"]);
    }

    #[test]
    fn services_are_not_types() {
        let msgs = messages(&format!(
            "{PRELUDE}type S = QuerySvc<{{ f(): int8 }}>\nexport type A = Msg<{{ s: S }}>\n"
        ));
        assert_eq!(msgs, ["`S` is a service, not a message"]);
    }
}
