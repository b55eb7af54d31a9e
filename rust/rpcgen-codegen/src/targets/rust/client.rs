//! `reqwest` client structs, one per service.

use codegen::{Function, Scope};
use rpcgen_schema::HttpMethod;

use super::{MethodSig, ServiceSig, content_type_const};
use crate::render::quoted;
use crate::wire::{request_content_type, response_content_type, route_path};

pub fn generate(scope: &mut Scope, services: &[ServiceSig<'_>]) {
    for sig in services {
        if sig.public_methods().next().is_none() {
            continue;
        }
        let name = format!("{}Client", sig.service.name);

        let mut doc = format!("/// Calls the `{}` service.", sig.service.name);
        if let Some(service_doc) = &sig.service.doc {
            doc.push_str("\n///");
            for line in service_doc.lines() {
                doc.push_str("\n///");
                if !line.trim().is_empty() {
                    doc.push(' ');
                    doc.push_str(line);
                }
            }
        }
        scope.raw(format!(
            "{doc}\n#[derive(Debug, Clone)]\npub struct {name} {{\n    client: Client,\n}}"
        ));

        let imp = scope.new_impl(&name);
        let new_fn = imp.new_fn("new");
        new_fn.vis("pub");
        new_fn.arg("client", "Client");
        new_fn.ret("Self");
        new_fn.line("Self { client }");

        for method in sig.public_methods() {
            let f = imp.new_fn(&method.fn_name);
            f.vis("pub");
            f.set_async(true);
            if let Some(doc) = &method.method.doc {
                f.doc(doc);
            }
            f.arg_ref_self();
            for p in &method.params {
                f.arg(&p.ident, &p.ty);
            }
            f.ret(format!("Result<{}, RpcError>", method.ret));
            write_body(f, sig, method);
        }
    }
}

fn write_body(f: &mut Function, sig: &ServiceSig<'_>, method: &MethodSig<'_>) {
    let m = method.method;
    let mut query = "&[]";
    let mut body = "None";

    match (m.http_method, &method.body) {
        (HttpMethod::Get, _) if m.has_params => {
            query = "&query";
            f.line("let mut query: Vec<(&str, String)> = Vec::new();");
            for p in &method.params {
                let key = quoted(&p.param.name);
                let ident = &p.ident;
                let list = p.query.is_some_and(|q| q.list);
                match (p.param.optional, list) {
                    (false, false) => f.line(format!("query.push(({key}, {ident}.to_string()));")),
                    (true, false) => {
                        f.line(format!("if let Some(v) = &{ident} {{"));
                        f.line(format!("    query.push(({key}, v.to_string()));"));
                        f.line("}")
                    }
                    (false, true) => {
                        f.line(format!("for v in &{ident} {{"));
                        f.line(format!("    query.push(({key}, v.to_string()));"));
                        f.line("}")
                    }
                    (true, true) => {
                        f.line(format!("for v in {ident}.iter().flatten() {{"));
                        f.line(format!("    query.push(({key}, v.to_string()));"));
                        f.line("}")
                    }
                };
            }
        }
        (HttpMethod::Post, Some(params)) => {
            body = "Some(body)";
            let fields: Vec<String> = method
                .params
                .iter()
                .map(|p| {
                    if p.field == p.ident {
                        p.field.clone()
                    } else {
                        format!("{}: {}", p.field, p.ident)
                    }
                })
                .collect();
            f.line(format!(
                "let body = encode({}, &{params} {{ {} }})?;",
                content_type_const(request_content_type(m)),
                fields.join(", ")
            ));
        }
        _ => {}
    }

    let call = if m.is_void_return { "call_void" } else { "call" };
    f.line(format!(
        "self.client.{call}(Method::{}, {}, {query}, {body}, {}, {}).await",
        m.http_method.as_str(),
        quoted(&route_path(sig.service, m)),
        content_type_const(request_content_type(m)),
        content_type_const(response_content_type(m)),
    ));
}

#[cfg(test)]
mod tests {
    use crate::Builder;
    use crate::targets::rust::ReqwestClient;
    use crate::test_util::{file, users};

    fn users_client() -> String {
        let codes = ReqwestClient.build(&users()).unwrap();
        file(&codes, "users.rs").to_string()
    }

    #[test]
    fn client_struct_per_service() {
        let source = users_client();
        assert!(source.contains("/// Calls the `Users` service.\n#[derive(Debug, Clone)]\npub struct UsersClient {\n    client: Client,\n}\n"));
        assert!(source.contains("impl UsersClient {\n"));
        assert!(source.contains("pub fn new(client: Client) -> Self {\n"));
    }

    #[test]
    fn query_params_become_pairs() {
        let source = users_client();
        assert!(source.contains("pub async fn get_user(&self, id: i64) -> Result<User, RpcError> {\n"));
        assert!(source.contains("query.push((\"id\", id.to_string()));\n"));
        assert!(source.contains("for v in &ids {\n"));
        assert!(source.contains("if let Some(v) = &active {\n"));
        assert!(source.contains(
            "self.client.call(Method::GET, \"/Users/getUser\", &query, None, JSON_CONTENT_TYPE, JSON_CONTENT_TYPE).await\n"
        ));
    }

    #[test]
    fn internal_methods_are_left_out() {
        assert!(!users_client().contains("async fn count("));
    }

    #[test]
    fn mutation_encodes_a_body() {
        let source = users_client();
        assert!(source.contains(
            "let body = encode(CBOR_CONTENT_TYPE, &UserWritesCreateParams { name, nick })?;\n"
        ));
        assert!(source.contains(
            "self.client.call(Method::POST, \"/UserWrites/create\", &[], Some(body), CBOR_CONTENT_TYPE, CBOR_CONTENT_TYPE).await\n"
        ));
        assert!(source.contains(
            "self.client.call_void(Method::POST, \"/UserWrites/purge\", &[], None, CBOR_CONTENT_TYPE, CBOR_CONTENT_TYPE).await\n"
        ));
    }
}
