//! Narrow read-only views over a parsed file.
//!
//! These helpers recognize the DSL's declaration shapes (`Msg<{..}>`,
//! `QuerySvc<{..}>`, `MutationSvc<{..}>`, `Union<[..]>`) and its container
//! references (`t.List`, `t.Dict`, `t.TupleN`). They never decide whether a
//! node is *valid*; that is the validator's job.

use crate::ast::*;

/// Namespace prefix for built-in types: `t.int8`, `t.List<..>`.
pub const TYPES_NAMESPACE: &str = "t";

/// Module the built-in names are imported from.
pub const BUILTIN_MODULE: &str = "@rpcgen/types";

/// Generic wrapper naming what a declaration declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeclTag {
    Msg,
    QuerySvc,
    MutationSvc,
    Union,
}

impl DeclTag {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "Msg" => Some(DeclTag::Msg),
            "QuerySvc" => Some(DeclTag::QuerySvc),
            "MutationSvc" => Some(DeclTag::MutationSvc),
            "Union" => Some(DeclTag::Union),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            DeclTag::Msg => "Msg",
            DeclTag::QuerySvc => "QuerySvc",
            DeclTag::MutationSvc => "MutationSvc",
            DeclTag::Union => "Union",
        }
    }

    pub fn is_service(self) -> bool {
        matches!(self, DeclTag::QuerySvc | DeclTag::MutationSvc)
    }
}

/// Built-in generic container, recognized only with the `t.` prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerKind {
    List,
    Dict,
    /// `t.Tuple2` .. `t.Tuple5`
    Tuple(usize),
}

impl ContainerKind {
    pub fn from_reference_name(name: &str) -> Option<Self> {
        let bare = name.strip_prefix(TYPES_NAMESPACE)?.strip_prefix('.')?;
        match bare {
            "List" => Some(ContainerKind::List),
            "Dict" => Some(ContainerKind::Dict),
            "Tuple2" => Some(ContainerKind::Tuple(2)),
            "Tuple3" => Some(ContainerKind::Tuple(3)),
            "Tuple4" => Some(ContainerKind::Tuple(4)),
            "Tuple5" => Some(ContainerKind::Tuple(5)),
            _ => None,
        }
    }

    /// Number of type arguments the container takes.
    pub fn arity(self) -> usize {
        match self {
            ContainerKind::List => 1,
            ContainerKind::Dict => 2,
            ContainerKind::Tuple(n) => n,
        }
    }
}

/// `t.int8` → `int8`; names without the prefix are returned unchanged.
pub fn strip_types_namespace(name: &str) -> &str {
    name.strip_prefix(TYPES_NAMESPACE)
        .and_then(|rest| rest.strip_prefix('.'))
        .unwrap_or(name)
}

/// True for `t.<anything>`.
pub fn is_namespaced(name: &str) -> bool {
    strip_types_namespace(name).len() != name.len()
}

/// A `type X = Msg|QuerySvc|MutationSvc<{ .. }>` declaration.
#[derive(Debug, Clone, Copy)]
pub struct Declaration<'a> {
    pub alias: &'a TypeAlias,
    pub tag: DeclTag,
    pub body: &'a RecordLit,
}

impl<'a> Declaration<'a> {
    pub fn name(&self) -> &'a str {
        &self.alias.name
    }

    pub fn docs(&self) -> Option<&'a Docs> {
        self.alias.docs.as_ref()
    }
}

impl TypeAlias {
    /// The wrapper tag, if the value is a reference to one.
    pub fn tag(&self) -> Option<DeclTag> {
        self.value
            .as_reference()
            .and_then(|r| DeclTag::from_name(&r.name))
    }

    /// The alias as a declaration, if it has the exact `Tag<{ .. }>` shape.
    pub fn declaration(&self) -> Option<Declaration<'_>> {
        let tag = self.tag()?;
        if tag == DeclTag::Union {
            return None;
        }
        let reference = self.value.as_reference()?;
        let [body] = reference.args.as_slice() else {
            return None;
        };
        Some(Declaration {
            alias: self,
            tag,
            body: body.as_record()?,
        })
    }
}

impl TypeNode {
    /// Variants of `[A, B]` or `Union<[A, B]>`.
    pub fn union_variants(&self) -> Option<&[TypeNode]> {
        match self {
            TypeNode::Tuple(t) => Some(&t.elements),
            TypeNode::Reference(r) if r.name == DeclTag::Union.name() => match r.args.as_slice() {
                [TypeNode::Tuple(t)] => Some(&t.elements),
                _ => None,
            },
            _ => None,
        }
    }
}

impl SourceFile {
    pub fn imports(&self) -> impl Iterator<Item = &ImportDecl> {
        self.statements.iter().filter_map(|s| match s {
            Statement::Import(i) => Some(i),
            _ => None,
        })
    }

    pub fn type_aliases(&self) -> impl Iterator<Item = &TypeAlias> {
        self.statements.iter().filter_map(|s| match s {
            Statement::TypeAlias(t) => Some(t),
            _ => None,
        })
    }

    /// Every alias with a well-formed declaration shape, in source order.
    pub fn declarations(&self) -> impl Iterator<Item = Declaration<'_>> {
        self.type_aliases().filter_map(TypeAlias::declaration)
    }

    pub fn messages(&self) -> impl Iterator<Item = Declaration<'_>> {
        self.declarations().filter(|d| d.tag == DeclTag::Msg)
    }

    pub fn services(&self) -> impl Iterator<Item = Declaration<'_>> {
        self.declarations().filter(|d| d.tag.is_service())
    }

    /// First message declared under `name`.
    pub fn message(&self, name: &str) -> Option<Declaration<'_>> {
        self.messages().find(|d| d.name() == name)
    }

    /// Names brought into scope by plain named imports from project files.
    pub fn imported_names(&self) -> impl Iterator<Item = (&ImportDecl, &ImportSpec)> {
        self.imports()
            .filter(|i| i.module != BUILTIN_MODULE)
            .flat_map(|i| i.named.iter().map(move |spec| (i, spec)))
    }

    /// Parent directory of the file, `""` at the project root.
    pub fn dir(&self) -> &str {
        match self.path.rsplit_once('/') {
            Some((dir, _)) => dir,
            None => "",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_file;

    #[test]
    fn container_requires_namespace() {
        assert_eq!(
            ContainerKind::from_reference_name("t.List"),
            Some(ContainerKind::List)
        );
        assert_eq!(ContainerKind::from_reference_name("List"), None);
        assert_eq!(
            ContainerKind::from_reference_name("t.Tuple4").map(ContainerKind::arity),
            Some(4)
        );
        assert_eq!(ContainerKind::from_reference_name("t.Tuple6"), None);
    }

    #[test]
    fn scalar_prefix_is_optional() {
        assert_eq!(strip_types_namespace("t.int8"), "int8");
        assert_eq!(strip_types_namespace("int8"), "int8");
        assert_eq!(strip_types_namespace("tx.int8"), "tx.int8");
        assert!(is_namespaced("t.Foo"));
        assert!(!is_namespaced("Foo"));
    }

    #[test]
    fn declarations_in_source_order() {
        let file = parse_file(
            "svc.ts",
            "type A = Msg<{ a: int8 }>\ntype B = QuerySvc<{ f(): A }>\ntype C = Union<[A, A]>\ntype D = Msg<string>\n",
        )
        .unwrap();
        let decls: Vec<_> = file
            .declarations()
            .map(|d| (d.name().to_string(), d.tag))
            .collect();
        assert_eq!(
            decls,
            [
                ("A".to_string(), DeclTag::Msg),
                ("B".to_string(), DeclTag::QuerySvc)
            ]
        );
        assert_eq!(file.messages().count(), 1);
        assert_eq!(file.services().count(), 1);
        assert!(file.message("A").is_some());
    }

    #[test]
    fn union_variants_from_both_spellings() {
        let file =
            parse_file("u.ts", "type A = Msg<{ a: [int8, string]; b: Union<[A, bool, string]> }>")
                .unwrap();
        let msg = file.message("A").unwrap();
        let props: Vec<_> = msg.body.properties().collect();
        assert_eq!(props[0].ty.union_variants().map(<[_]>::len), Some(2));
        assert_eq!(props[1].ty.union_variants().map(<[_]>::len), Some(3));
    }

    #[test]
    fn dir_of_nested_file() {
        let file = parse_file("a/b/c.ts", "").unwrap();
        assert_eq!(file.dir(), "a/b");
        let root = parse_file("c.ts", "").unwrap();
        assert_eq!(root.dir(), "");
    }
}
