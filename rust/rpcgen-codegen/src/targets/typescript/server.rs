//! `express` handler interfaces and route registration.

use std::collections::BTreeSet;

use rpcgen_schema::{HttpMethod, Method, Param, Schema, Service};

use super::content_type_const;
use super::types::{ts_member, ts_params, ts_return_type, ts_type};
use crate::code_writer::CodeWriter;
use crate::render::{jsdoc, ts_string};
use crate::wire::{
    QueryDecode, QueryParam, request_content_type, response_content_type, route_path,
    status_error_name,
};
use crate::{CodegenError, Language, cw_writeln};

fn methods(schema: &Schema) -> impl Iterator<Item = &Method> {
    schema.services().flat_map(|s| &s.methods)
}

fn query_param(service: &Service, method: &Method, p: &Param) -> Result<QueryParam, CodegenError> {
    QueryParam::classify(&p.ty).ok_or_else(|| {
        CodegenError::unsupported(
            Language::TypeScript,
            &p.ty,
            format!("query parameter `{}` of `{}.{}`", p.name, service.name, method.name),
        )
    })
}

fn conv_expr(decode: QueryDecode) -> String {
    match decode {
        QueryDecode::Bool => "convBool".to_string(),
        QueryDecode::Int { bits, signed } => format!("convInt({bits}, {signed})"),
        QueryDecode::Float { .. } => "convFloat".to_string(),
        QueryDecode::Timestamp => "convTimestamp".to_string(),
        QueryDecode::String => "convString".to_string(),
    }
}

fn conv_name(decode: QueryDecode) -> &'static str {
    match decode {
        QueryDecode::Bool => "convBool",
        QueryDecode::Int { .. } => "convInt",
        QueryDecode::Float { .. } => "convFloat",
        QueryDecode::Timestamp => "convTimestamp",
        QueryDecode::String => "convString",
    }
}

fn query_fn(p: &Param, q: &QueryParam) -> &'static str {
    if q.list {
        "queryList"
    } else if p.optional {
        "queryOpt"
    } else {
        "queryOne"
    }
}

pub fn write_imports(w: &mut CodeWriter, schema: &Schema) -> Result<(), CodegenError> {
    if methods(schema).next().is_none() {
        return Ok(());
    }

    let mut helpers = BTreeSet::from(["sendData", "sendError"]);
    let mut consts = BTreeSet::new();
    for service in schema.services() {
        for method in &service.methods {
            consts.insert(content_type_const(response_content_type(method)));
            if !method.has_params {
                continue;
            }
            match method.http_method {
                HttpMethod::Get => {
                    helpers.insert("decodeQuery");
                    for p in &method.params {
                        let q = query_param(service, method, p)?;
                        helpers.insert(query_fn(p, &q));
                        helpers.insert(conv_name(q.decode));
                    }
                }
                HttpMethod::Post => {
                    helpers.insert("rawBody");
                    helpers.insert("readRequest");
                    consts.insert(content_type_const(request_content_type(method)));
                }
            }
        }
    }

    w.writeln("import type { Router } from 'express'")?;
    w.blank_line()?;
    let helpers: Vec<&str> = helpers.into_iter().collect();
    cw_writeln!(
        w,
        "import {{ type RpcContext, {} }} from './rpc_server'",
        helpers.join(", ")
    )?;
    let consts: Vec<&str> = consts.into_iter().collect();
    cw_writeln!(w, "import {{ {} }} from './rpc'", consts.join(", "))?;
    Ok(())
}

pub fn write_services(w: &mut CodeWriter, schema: &Schema) -> Result<(), CodegenError> {
    for service in schema.services() {
        w.blank_line()?;
        write_handler_interface(w, service)?;
        w.blank_line()?;
        write_register_fn(w, service)?;
    }
    Ok(())
}

fn write_handler_interface(w: &mut CodeWriter, service: &Service) -> Result<(), CodegenError> {
    jsdoc(w, service.doc.as_deref())?;
    cw_writeln!(w, "export interface {}Handler {{", service.name)?;
    {
        let _indent = w.indent();
        for method in &service.methods {
            let mut params = vec!["ctx: RpcContext".to_string()];
            params.extend(ts_params(&method.params)?);
            jsdoc(w, method.doc.as_deref())?;
            cw_writeln!(
                w,
                "{}({}): Promise<{}>",
                method.name,
                params.join(", "),
                ts_return_type(&method.return_type)?
            )?;
        }
    }
    w.writeln("}")?;
    Ok(())
}

fn write_register_fn(w: &mut CodeWriter, service: &Service) -> Result<(), CodegenError> {
    cw_writeln!(w, "/** Mounts every `{}` route on `router`. */", service.name)?;
    cw_writeln!(
        w,
        "export function register{0}(router: Router, handler: {0}Handler): void {{",
        service.name
    )?;
    {
        let _indent = w.indent();
        for method in &service.methods {
            write_route(w, service, method)?;
        }
    }
    w.writeln("}")?;
    Ok(())
}

fn write_route(w: &mut CodeWriter, service: &Service, method: &Method) -> Result<(), CodegenError> {
    let path = ts_string(&route_path(service, method));
    let response = content_type_const(response_content_type(method));
    let post_body = method.http_method == HttpMethod::Post && method.has_params;

    let open = match method.http_method {
        HttpMethod::Get => format!("router.get({path}, async (req, res) => {{"),
        HttpMethod::Post if post_body => {
            format!("router.post({path}, rawBody, async (req, res) => {{")
        }
        HttpMethod::Post => format!("router.post({path}, async (req, res) => {{"),
    };

    let mut args = vec!["{ req, res }".to_string()];
    let mut decoders = Vec::new();
    for p in &method.params {
        match method.http_method {
            HttpMethod::Get => {
                let q = query_param(service, method, p)?;
                decoders.push(format!(
                    "{}: {}(req, {}, {}),",
                    super::types::ts_key(&p.name),
                    query_fn(p, &q),
                    ts_string(&p.name),
                    conv_expr(q.decode)
                ));
                args.push(ts_member("args", &p.name));
            }
            HttpMethod::Post => {
                let ty = ts_type(&p.ty)?;
                let ty = if p.optional { format!("{ty} | undefined") } else { ty };
                args.push(format!("body[{}] as {ty}", ts_string(&p.name)));
            }
        }
    }

    let call = format!("handler.{}({})", method.name, args.join(", "));
    let error_code = method.error_code;
    let error_name = status_error_name(error_code);

    w.block_with(&open, "})", |w| {
        if !decoders.is_empty() {
            cw_writeln!(w, "const args = decodeQuery(res, {response}, () => ({{")?;
            {
                let _indent = w.indent();
                for decoder in &decoders {
                    w.writeln(decoder)?;
                }
            }
            w.writeln("}))")?;
            w.writeln("if (args === undefined) return")?;
        }
        if post_body {
            cw_writeln!(
                w,
                "const body = readRequest(req, res, {}, {response})",
                content_type_const(request_content_type(method))
            )?;
            w.writeln("if (body === undefined) return")?;
        }
        w.block("try", |w| {
            if method.is_void_return {
                cw_writeln!(w, "await {call}")?;
                cw_writeln!(w, "sendData(res, {}, {response}, null)", method.response_code)
            } else {
                cw_writeln!(w, "const data = await {call}")?;
                cw_writeln!(w, "sendData(res, {}, {response}, data)", method.response_code)
            }
        })?;
        w.block("catch (err)", |w| {
            cw_writeln!(
                w,
                "sendError(res, {error_code}, '{error_name}', {response}, err)"
            )
        })
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::Builder;
    use crate::targets::typescript::ExpressServer;
    use crate::test_util::{file, schemas, users};

    fn users_server() -> String {
        let codes = ExpressServer.build(&users()).unwrap();
        file(&codes, "users.ts").to_string()
    }

    #[test]
    fn imports_cover_used_helpers() {
        let source = users_server();
        assert!(source.contains("import type { Router } from 'express'\n"));
        assert!(source.contains(
            "import { type RpcContext, convBool, convInt, convTimestamp, decodeQuery, queryList, queryOne, queryOpt, rawBody, readRequest, sendData, sendError } from './rpc_server'\n"
        ));
    }

    #[test]
    fn handler_interface_takes_context_first() {
        let source = users_server();
        assert!(source.contains("export interface UsersHandler {\n"));
        assert!(source.contains("  getUser(ctx: RpcContext, id: number): Promise<User>\n"));
        assert!(!source.contains("@access"));
        assert!(source.contains("  count(ctx: RpcContext): Promise<number>\n"));
        assert!(source.contains("  purge(ctx: RpcContext): Promise<void>\n"));
    }

    #[test]
    fn query_route_decodes_and_maps_status_codes() {
        let source = users_server();
        let expected = "\
  router.get('/Users/getUser', async (req, res) => {
    const args = decodeQuery(res, JSON_CONTENT_TYPE, () => ({
      id: queryOne(req, 'id', convInt(64, true)),
    }))
    if (args === undefined) return
    try {
      const data = await handler.getUser({ req, res }, args.id)
      sendData(res, 200, JSON_CONTENT_TYPE, data)
    } catch (err) {
      sendError(res, 404, 'NotFound', JSON_CONTENT_TYPE, err)
    }
  })
";
        assert!(source.contains(expected), "{source}");
        assert!(source.contains("      ids: queryList(req, 'ids', convInt(64, true)),\n"));
        assert!(source.contains("      active: queryOpt(req, 'active', convBool),\n"));
        assert!(source.contains("      since: queryOpt(req, 'since', convTimestamp),\n"));
    }

    #[test]
    fn mutation_route_reads_body() {
        let source = users_server();
        assert!(source.contains("  router.post('/UserWrites/create', rawBody, async (req, res) => {\n"));
        assert!(source.contains(
            "      const data = await handler.create({ req, res }, body['name'] as string, body['nick'] as string | undefined)\n      sendData(res, 201, CBOR_CONTENT_TYPE, data)\n"
        ));
        assert!(source.contains(
            "  router.post('/UserWrites/purge', async (req, res) => {\n    try {\n      await handler.purge({ req, res })\n      sendData(res, 200, CBOR_CONTENT_TYPE, null)\n"
        ));
    }

    #[test]
    fn unsupported_query_param_is_an_error() {
        let schemas = schemas(&[(
            "a.ts",
            "type A = Msg<{ a: t.int8 }>\ntype S = QuerySvc<{ f(a: A): A }>\n",
        )]);
        let err = ExpressServer.build(&schemas).unwrap_err();
        assert_eq!(
            err.to_string(),
            "typescript: cannot represent `A` as query parameter `a` of `S.f`"
        );
    }
}
