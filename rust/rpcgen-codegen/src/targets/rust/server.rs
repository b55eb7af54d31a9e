//! Service traits and `axum` routers.

use codegen::{Function, Scope};
use heck::ToSnakeCase;
use rpcgen_schema::HttpMethod;

use super::{MethodSig, ServiceSig, content_type_const};
use crate::render::quoted;
use crate::wire::{
    QueryDecode, request_content_type, response_content_type, route_path, status_error_name,
};

pub fn generate(scope: &mut Scope, services: &[ServiceSig<'_>]) {
    for sig in services {
        if sig.methods.is_empty() {
            continue;
        }
        generate_trait(scope, sig);
        for method in &sig.methods {
            generate_handler(scope, sig, method);
        }
        generate_router(scope, sig);
    }
}

fn generate_trait(scope: &mut Scope, sig: &ServiceSig<'_>) {
    let trait_def = scope.new_trait(&sig.service.name);
    trait_def.vis("pub");
    trait_def.bound("Self", "Send + Sync + 'static");
    if let Some(doc) = &sig.service.doc {
        trait_def.doc(doc);
    }

    for method in &sig.methods {
        let fn_def = trait_def.new_fn(&method.fn_name);
        if let Some(doc) = &method.method.doc {
            fn_def.doc(doc);
        }
        fn_def.arg_ref_self();
        fn_def.arg("ctx", "RequestContext");
        for p in &method.params {
            fn_def.arg(&p.ident, &p.ty);
        }
        fn_def.ret(format!(
            "impl std::future::Future<Output = Result<{}, RpcError>> + Send",
            method.ret
        ));
    }
}

fn handler_name(sig: &ServiceSig<'_>, method: &MethodSig<'_>) -> String {
    format!(
        "{}_{}",
        sig.service.name.to_snake_case(),
        method.fn_name.trim_start_matches("r#")
    )
}

fn conv_fn(decode: QueryDecode, ty: &str) -> String {
    match decode {
        QueryDecode::Bool => "conv_bool".to_string(),
        QueryDecode::Int { .. } => format!("conv_int::<{ty}>"),
        QueryDecode::Float { .. } => format!("conv_float::<{ty}>"),
        QueryDecode::Timestamp => "conv_timestamp".to_string(),
        QueryDecode::String => "conv_string".to_string(),
    }
}

fn generate_handler(scope: &mut Scope, sig: &ServiceSig<'_>, method: &MethodSig<'_>) {
    let m = method.method;
    let response = content_type_const(response_content_type(m));

    let f = scope.new_fn(&handler_name(sig, method));
    f.set_async(true);
    f.generic("H");
    f.bound("H", sig.service.name.as_str());
    f.arg("State(service)", "State<Arc<H>>");
    f.arg("headers", "HeaderMap");

    let mut args = vec!["ctx".to_string()];
    match (m.http_method, &method.body) {
        (HttpMethod::Get, _) if m.has_params => {
            f.arg("RawQuery(raw_query)", "RawQuery");
            f.ret("Response");
            f.line("let query = Query::parse(raw_query.as_deref());");
            for p in &method.params {
                let Some(q) = p.query else { continue };
                let lookup = match (p.param.optional, q.list) {
                    (false, false) => "one",
                    (true, false) => "opt",
                    (false, true) => "list",
                    (true, true) => "opt_list",
                };
                let item_ty = super::rust_scalar(q.scalar);
                write_decode(
                    f,
                    &p.ident,
                    &format!(
                        "query.{lookup}({}, {})",
                        quoted(&p.param.name),
                        conv_fn(q.decode, item_ty)
                    ),
                    response,
                );
                args.push(p.ident.clone());
            }
        }
        (HttpMethod::Post, Some(params)) => {
            f.arg("body", "Bytes");
            f.ret("Response");
            write_decode(
                f,
                &format!("params: {params}"),
                &format!(
                    "decode_body({}, &body)",
                    content_type_const(request_content_type(m))
                ),
                response,
            );
            args.extend(method.params.iter().map(|p| format!("params.{}", p.field)));
        }
        _ => {
            f.ret("Response");
        }
    }

    let error_code = m.error_code;
    f.line("let ctx = RequestContext { headers };");
    f.line(format!(
        "match service.{}({}).await {{",
        method.fn_name,
        args.join(", ")
    ));
    f.line(format!(
        "    Ok(out) => data_response({}, {response}, &out),",
        m.response_code
    ));
    f.line(format!(
        "    Err(err) => error_response({error_code}, {}, {response}, err),",
        quoted(status_error_name(error_code))
    ));
    f.line("}");
}

/// `let binding = match expr { Ok(v) => v, Err(err) => return bad_request(..) };`
fn write_decode(f: &mut Function, binding: &str, expr: &str, response: &str) {
    f.line(format!("let {binding} = match {expr} {{"));
    f.line("    Ok(v) => v,");
    f.line(format!("    Err(err) => return bad_request({response}, err),"));
    f.line("};");
}

fn generate_router(scope: &mut Scope, sig: &ServiceSig<'_>) {
    let name = &sig.service.name;
    let f = scope.new_fn(&format!("{}_router", name.to_snake_case()));
    f.vis("pub");
    f.doc(&format!("Mounts every `{name}` route."));
    f.generic("H");
    f.bound("H", name.as_str());
    f.arg("service", "Arc<H>");
    f.ret("Router");
    f.line("Router::new()");
    for method in &sig.methods {
        let verb = match method.method.http_method {
            HttpMethod::Get => "get",
            HttpMethod::Post => "post",
        };
        f.line(format!(
            "    .route({}, {verb}({}::<H>))",
            quoted(&route_path(sig.service, method.method)),
            handler_name(sig, method)
        ));
    }
    f.line("    .with_state(service)");
}

#[cfg(test)]
mod tests {
    use crate::Builder;
    use crate::targets::rust::AxumServer;
    use crate::test_util::{file, users};

    fn users_server() -> String {
        let codes = AxumServer.build(&users()).unwrap();
        file(&codes, "users.rs").to_string()
    }

    #[test]
    fn service_trait_takes_context_first() {
        let source = users_server();
        assert!(source.contains("pub trait Users"));
        assert!(source.contains(
            "fn get_user(&self, ctx: RequestContext, id: i64) -> impl std::future::Future<Output = Result<User, RpcError>> + Send;"
        ));
        assert!(source.contains(
            "fn count(&self, ctx: RequestContext) -> impl std::future::Future<Output = Result<u32, RpcError>> + Send;"
        ));
        assert!(source.contains(
            "fn purge(&self, ctx: RequestContext) -> impl std::future::Future<Output = Result<(), RpcError>> + Send;"
        ));
    }

    #[test]
    fn query_handler_decodes_each_param() {
        let source = users_server();
        assert!(source.contains("async fn users_get_user<H>(State(service): State<Arc<H>>, headers: HeaderMap, RawQuery(raw_query): RawQuery) -> Response"));
        assert!(source.contains("let id = match query.one(\"id\", conv_int::<i64>) {\n"));
        assert!(source.contains("let ids = match query.list(\"ids\", conv_int::<i64>) {\n"));
        assert!(source.contains("let active = match query.opt(\"active\", conv_bool) {\n"));
        assert!(source.contains("let since = match query.opt(\"since\", conv_timestamp) {\n"));
        assert!(source.contains("Err(err) => return bad_request(JSON_CONTENT_TYPE, err),\n"));
        assert!(source.contains("Err(err) => error_response(404, \"NotFound\", JSON_CONTENT_TYPE, err),\n"));
    }

    #[test]
    fn mutation_handler_decodes_the_body() {
        let source = users_server();
        assert!(source.contains("let params: UserWritesCreateParams = match decode_body(CBOR_CONTENT_TYPE, &body) {\n"));
        assert!(source.contains("match service.create(ctx, params.name, params.nick).await {\n"));
        assert!(source.contains("Ok(out) => data_response(201, CBOR_CONTENT_TYPE, &out),\n"));
        assert!(source.contains("match service.purge(ctx).await {\n"));
    }

    #[test]
    fn optional_list_param_decodes_to_option() {
        let schemas = crate::test_util::schemas(&[(
            "tags.ts",
            "type Tags = QuerySvc<{ find(tags?: t.List<t.string>, ids: t.List<t.int32>): t.uint32 }>\n",
        )]);
        let codes = AxumServer.build(&schemas).unwrap();
        let source = file(&codes, "tags.rs");
        assert!(source.contains(
            "fn find(&self, ctx: RequestContext, tags: Option<Vec<String>>, ids: Vec<i32>)"
        ));
        assert!(source.contains("let tags = match query.opt_list(\"tags\", conv_string) {\n"));
        assert!(source.contains("let ids = match query.list(\"ids\", conv_int::<i32>) {\n"));
        assert!(file(&codes, "rpc_server.rs").contains("pub fn opt_list<T>("));
    }

    #[test]
    fn router_mounts_every_method() {
        let source = users_server();
        assert!(source.contains("pub fn users_router<H>(service: Arc<H>) -> Router"));
        assert!(source.contains(".route(\"/Users/count\", get(users_count::<H>))\n"));
        assert!(source.contains(".route(\"/UserWrites/create\", post(user_writes_create::<H>))\n"));
        assert!(source.contains(".with_state(service)\n"));
    }
}
