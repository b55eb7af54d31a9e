//! Declaration shape, message and service rules.

use std::collections::HashSet;

use rpcgen_parse::{DeclTag, Declaration, Docs, Member, MethodSig, RecordLit, TypeAlias};
use rpcgen_schema::{Access, Encoding};

use crate::FileCx;
use crate::types::{describe, is_query_paramable};

pub(crate) fn check(cx: &mut FileCx<'_>) {
    let file = cx.file;

    let imported: HashSet<&str> = file
        .imported_names()
        .map(|(_, spec)| spec.name.as_str())
        .collect();
    let mut seen = HashSet::new();

    for alias in file.type_aliases() {
        if !seen.insert(alias.name.as_str()) {
            cx.error(alias.span, format!("duplicate declaration `{}`", alias.name));
        } else if imported.contains(alias.name.as_str()) {
            cx.error(
                alias.span,
                format!("`{}` is already imported from another file", alias.name),
            );
        }
        check_alias(cx, alias);
    }
}

fn check_alias(cx: &mut FileCx<'_>, alias: &TypeAlias) {
    let name = &alias.name;
    let Some(tag) = alias.tag() else {
        cx.error(
            alias.span,
            format!("`{name}` must be declared as `Msg<{{..}}>`, `QuerySvc<{{..}}>` or `MutationSvc<{{..}}>`"),
        );
        return;
    };
    if tag == DeclTag::Union {
        cx.error(
            alias.span,
            format!("`Union` is only valid inside a type; `{name}` cannot be declared as a union"),
        );
        return;
    }
    if !alias.generics.is_empty() {
        cx.error(alias.span, format!("`{name}` must not be generic"));
    }
    let Some(decl) = alias.declaration() else {
        cx.error(
            alias.value.span(),
            format!(
                "`{name}` must wrap a record literal: `{}<{{ .. }}>`",
                tag.name()
            ),
        );
        return;
    };

    check_tags(cx, decl.docs(), false);
    match tag {
        DeclTag::Msg => check_message(cx, &decl),
        _ => check_service(cx, &decl),
    }
}

fn check_tags(cx: &mut FileCx<'_>, docs: Option<&Docs>, method: bool) {
    let Some(docs) = docs else { return };
    for tag in &docs.tags {
        match tag.name.as_str() {
            "kind" if Encoding::from_tag(&tag.value).is_none() => cx.error(
                tag.span,
                format!("`@kind` must be `cbor` or `json`, found `{}`", tag.value),
            ),
            "access" if !method => cx.error(tag.span, "`@access` only applies to methods"),
            "access" if Access::from_tag(&tag.value).is_none() => cx.error(
                tag.span,
                format!("`@access` must be `public` or `internal`, found `{}`", tag.value),
            ),
            _ => {}
        }
    }
}

fn check_message(cx: &mut FileCx<'_>, decl: &Declaration<'_>) {
    if decl.body.members.is_empty() {
        cx.error(
            decl.body.span,
            format!("message `{}` must declare at least one property", decl.name()),
        );
        return;
    }
    cx.check_properties(decl.body, "message");
}

impl FileCx<'_> {
    /// Properties-only record body: messages and inline records.
    pub fn check_properties(&mut self, record: &RecordLit, what: &str) {
        if record.members.is_empty() {
            self.error(record.span, format!("{what} must declare at least one property"));
            return;
        }
        let mut names = HashSet::new();
        for member in &record.members {
            match member {
                Member::Method(method) => self.error(
                    method.span,
                    format!("{what} may only declare properties; `{}` is a method", method.name),
                ),
                Member::Property(property) => {
                    if !names.insert(property.name.as_str()) {
                        self.error(
                            property.span,
                            format!("duplicate property `{}`", property.name),
                        );
                    }
                    self.check_type(&property.ty);
                }
            }
        }
    }
}

fn check_service(cx: &mut FileCx<'_>, decl: &Declaration<'_>) {
    let query = decl.tag == DeclTag::QuerySvc;
    let mut names = HashSet::new();

    for member in &decl.body.members {
        match member {
            Member::Property(property) => cx.error(
                property.span,
                format!(
                    "services may only declare methods; `{}` is a property",
                    property.name
                ),
            ),
            Member::Method(method) => {
                if !names.insert(method.name.as_str()) {
                    cx.error(
                        method.span,
                        format!(
                            "duplicate method `{}` in service `{}`",
                            method.name,
                            decl.name()
                        ),
                    );
                }
                check_method(cx, method, query);
            }
        }
    }
}

fn check_method(cx: &mut FileCx<'_>, method: &MethodSig, query: bool) {
    let name = &method.name;
    if method.optional {
        cx.error(method.span, format!("method `{name}` must not be optional"));
    }
    if !method.generics.is_empty() {
        cx.error(method.span, format!("method `{name}` must not be generic"));
    }
    check_tags(cx, method.docs.as_ref(), true);

    let mut params = HashSet::new();
    for param in &method.params {
        if !params.insert(param.name.as_str()) {
            cx.error(
                param.span,
                format!("duplicate parameter `{}` in `{name}`", param.name),
            );
        }
        let Some(ty) = &param.ty else {
            cx.error(
                param.span,
                format!("parameter `{}` of `{name}` needs a type", param.name),
            );
            continue;
        };
        // Only well-formed types are checked for paramability, so that each
        // offending parameter yields a single error.
        if cx.check_type(ty) && query && !is_query_paramable(ty) {
            cx.error(
                ty.span(),
                format!(
                    "parameter `{}` of query method `{name}` has type `{}`; query parameters must be bool, timestamp, a number, string, or a t.List of these",
                    param.name,
                    describe(ty)
                ),
            );
        }
    }

    match &method.return_type {
        Some(ty) => {
            cx.check_type(ty);
        }
        None => cx.error(method.span, format!("method `{name}` needs a return type")),
    }
}
