//! Client structs wrapping the shared `*Client`.

use rpcgen_schema::{HttpMethod, Method, Param, Schema, Service};

use super::types::go_param_name;
use super::{content_type_const, method_signature};
use crate::code_writer::CodeWriter;
use crate::render::quoted;
use crate::wire::{
    QueryDecode, QueryParam, request_content_type, response_content_type, route_path,
};
use crate::{CodegenError, Language, cw_writeln};

fn public_methods(schema: &Schema) -> impl Iterator<Item = &Method> {
    schema.services().flat_map(Service::public_methods)
}

pub fn imports(schema: &Schema) -> Vec<&'static str> {
    let mut imports = Vec::new();
    if public_methods(schema).next().is_some() {
        imports.push("context");
    }
    if public_methods(schema).any(|m| m.http_method == HttpMethod::Get && m.has_params) {
        imports.push("net/url");
    }
    imports
}

fn fmt_fn(decode: QueryDecode) -> &'static str {
    match decode {
        QueryDecode::Bool => "fmtBool",
        QueryDecode::Int { signed: true, .. } => "fmtInt",
        QueryDecode::Int { signed: false, .. } => "fmtUint",
        QueryDecode::Float { bits: 32 } => "fmtFloat32",
        QueryDecode::Float { .. } => "fmtFloat64",
        QueryDecode::Timestamp => "fmtTimestamp",
        QueryDecode::String => "fmtString",
    }
}

pub fn write_services(w: &mut CodeWriter, schema: &Schema) -> Result<(), CodegenError> {
    for service in schema.services() {
        if service.public_methods().next().is_none() {
            continue;
        }
        let name = format!("{}Client", service.name);

        w.blank_line()?;
        match &service.doc {
            Some(doc) => w.doc_comment("//", &format!("{name} calls the {} service.\n\n{doc}", service.name))?,
            None => cw_writeln!(w, "// {name} calls the {} service.", service.name)?,
        }
        w.block(&format!("type {name} struct"), |w| w.writeln("c *Client"))?;
        w.blank_line()?;
        w.block(&format!("func New{name}(c *Client) *{name}"), |w| {
            cw_writeln!(w, "return &{name}{{c: c}}")
        })?;

        for method in service.public_methods() {
            w.blank_line()?;
            write_method(w, service, method)?;
        }
    }
    Ok(())
}

fn write_method(w: &mut CodeWriter, service: &Service, method: &Method) -> Result<(), CodegenError> {
    let query = match method.http_method {
        HttpMethod::Get => method
            .params
            .iter()
            .map(|p| query_param(service, method, p).map(|q| (p, q)))
            .collect::<Result<Vec<_>, _>>()?,
        HttpMethod::Post => Vec::new(),
    };
    let signature = method_signature(service, method)?;

    let call = if method.is_void_return {
        "callVoid".to_string()
    } else {
        let position = format!("the return type of `{}.{}`", service.name, method.name);
        format!("call[{}]", super::go_type(&method.return_type, &position)?)
    };
    let query_arg = if query.is_empty() { "nil" } else { "q" };
    let body_arg = if method.http_method == HttpMethod::Post && method.has_params {
        "body"
    } else {
        "nil"
    };

    if let Some(doc) = &method.doc {
        w.doc_comment("//", doc)?;
    }
    let recv = format!("func (x *{}Client) {signature}", service.name);
    w.block(&recv, |w| {
        if !query.is_empty() {
            w.writeln("q := url.Values{}")?;
            for (p, q) in &query {
                write_query_set(w, p, q)?;
            }
        }
        if body_arg == "body" {
            let required: Vec<String> = method
                .params
                .iter()
                .filter(|p| !p.optional)
                .map(|p| format!("{}: {}", quoted(&p.name), go_param_name(&p.name)))
                .collect();
            cw_writeln!(w, "body := map[string]any{{{}}}", required.join(", "))?;
            for p in method.params.iter().filter(|p| p.optional) {
                let ident = go_param_name(&p.name);
                w.block(&format!("if {ident} != nil"), |w| {
                    cw_writeln!(w, "body[{}] = {ident}", quoted(&p.name))
                })?;
            }
        }
        cw_writeln!(
            w,
            "return {call}(ctx, x.c, {}, {}, {query_arg}, {body_arg}, {}, {})",
            quoted(method.http_method.as_str()),
            quoted(&route_path(service, method)),
            content_type_const(request_content_type(method)),
            content_type_const(response_content_type(method)),
        )
    })?;
    Ok(())
}

fn query_param(service: &Service, method: &Method, p: &Param) -> Result<QueryParam, CodegenError> {
    QueryParam::classify(&p.ty).ok_or_else(|| {
        CodegenError::unsupported(
            Language::Go,
            &p.ty,
            format!("query parameter `{}` of `{}.{}`", p.name, service.name, method.name),
        )
    })
}

fn write_query_set(w: &mut CodeWriter, p: &Param, q: &QueryParam) -> std::fmt::Result {
    let ident = go_param_name(&p.name);
    let key = quoted(&p.name);
    let fmt = fmt_fn(q.decode);
    if q.list {
        w.block(&format!("for _, v := range {ident}"), |w| {
            cw_writeln!(w, "q.Add({key}, {fmt}(v))")
        })
    } else if p.optional {
        w.block(&format!("if {ident} != nil"), |w| {
            cw_writeln!(w, "q.Set({key}, {fmt}(*{ident}))")
        })
    } else {
        cw_writeln!(w, "q.Set({key}, {fmt}({ident}))")
    }
}

#[cfg(test)]
mod tests {
    use crate::Builder;
    use crate::targets::go::HttpClient;
    use crate::test_util::{file, schemas, users};

    fn users_client() -> String {
        let codes = HttpClient.build(&users()).unwrap();
        file(&codes, "users.go").to_string()
    }

    #[test]
    fn imports_follow_usage() {
        let source = users_client();
        assert!(source.contains("import (\n\t\"context\"\n\t\"net/url\"\n)\n"));
    }

    #[test]
    fn query_method_sets_values() {
        let source = users_client();
        let expected = "\
// Look up one user.
func (x *UsersClient) GetUser(ctx context.Context, id int64) (User, error) {
\tq := url.Values{}
\tq.Set(\"id\", fmtInt(id))
\treturn call[User](ctx, x.c, \"GET\", \"/Users/getUser\", q, nil, ContentTypeJSON, ContentTypeJSON)
}
";
        assert!(source.contains(expected), "{source}");
        assert!(source.contains("\tfor _, v := range ids {\n\t\tq.Add(\"ids\", fmtInt(v))\n\t}\n"));
        assert!(source.contains("\tif active != nil {\n\t\tq.Set(\"active\", fmtBool(*active))\n\t}\n"));
        assert!(source.contains("q.Set(\"since\", fmtTimestamp(*since))"));
    }

    #[test]
    fn internal_methods_are_left_out() {
        assert!(!users_client().contains("Count("));
    }

    #[test]
    fn mutation_builds_body() {
        let source = users_client();
        assert!(source.contains(
            "func (x *UserWritesClient) Create(ctx context.Context, name string, nick *string) (User, error) {\n\tbody := map[string]any{\"name\": name}\n\tif nick != nil {\n\t\tbody[\"nick\"] = nick\n\t}\n"
        ));
        assert!(source.contains(
            "func (x *UserWritesClient) Purge(ctx context.Context) error {\n\treturn callVoid(ctx, x.c, \"POST\", \"/UserWrites/purge\", nil, nil, ContentTypeCBOR, ContentTypeCBOR)\n}\n"
        ));
    }

    #[test]
    fn struct_query_param_is_rejected() {
        let schemas = schemas(&[(
            "a.ts",
            "type A = Msg<{ a: t.int8 }>\ntype S = QuerySvc<{ f(a: A): A }>\n",
        )]);
        let err = HttpClient.build(&schemas).unwrap_err();
        assert_eq!(err.to_string(), "go: cannot represent `A` as query parameter `a` of `S.f`");
    }
}
