//! Server interfaces and `chi` route registration.

use rpcgen_schema::{HttpMethod, Method, Param, Schema, Service};

use super::types::{go_field, go_field_name};
use super::{content_type_const, method_name, method_signature};
use crate::code_writer::CodeWriter;
use crate::render::quoted;
use crate::wire::{
    QueryDecode, QueryParam, request_content_type, response_content_type, route_path,
    status_error_name,
};
use crate::{CodegenError, Language, cw_writeln};

pub fn imports(schema: &Schema) -> Vec<&'static str> {
    if schema.services().all(|s| s.methods.is_empty()) {
        return Vec::new();
    }
    vec!["context", "net/http", "github.com/go-chi/chi/v5"]
}

fn conv_fn(decode: QueryDecode) -> String {
    match decode {
        QueryDecode::Bool => "convBool".to_string(),
        QueryDecode::Int { bits, signed: true } => format!("convInt{bits}"),
        QueryDecode::Int { bits, signed: false } => format!("convUint{bits}"),
        QueryDecode::Float { bits } => format!("convFloat{bits}"),
        QueryDecode::Timestamp => "convTimestamp".to_string(),
        QueryDecode::String => "convString".to_string(),
    }
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

pub fn write_services(w: &mut CodeWriter, schema: &Schema) -> Result<(), CodegenError> {
    for service in schema.services() {
        if service.methods.is_empty() {
            continue;
        }
        w.blank_line()?;
        write_interface(w, service)?;
        w.blank_line()?;
        write_register_fn(w, service)?;
    }
    Ok(())
}

fn write_interface(w: &mut CodeWriter, service: &Service) -> Result<(), CodegenError> {
    let name = format!("{}Server", service.name);
    match &service.doc {
        Some(doc) => w.doc_comment("//", &format!("{name} implements the {} service.\n\n{doc}", service.name))?,
        None => cw_writeln!(w, "// {name} implements the {} service.", service.name)?,
    }
    let signatures = service
        .methods
        .iter()
        .map(|m| method_signature(service, m).map(|sig| (m, sig)))
        .collect::<Result<Vec<_>, _>>()?;
    w.block(&format!("type {name} interface"), |w| {
        for (method, signature) in &signatures {
            if let Some(doc) = &method.doc {
                w.doc_comment("//", doc)?;
            }
            w.writeln(signature)?;
        }
        Ok(())
    })?;
    Ok(())
}

fn write_register_fn(w: &mut CodeWriter, service: &Service) -> Result<(), CodegenError> {
    cw_writeln!(w, "// Register{0} mounts every {0} route on r.", service.name)?;
    cw_writeln!(
        w,
        "func Register{0}(r chi.Router, srv {0}Server) {{",
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
    let response = content_type_const(response_content_type(method));
    let register = match method.http_method {
        HttpMethod::Get => "r.Get",
        HttpMethod::Post => "r.Post",
    };
    let open = format!(
        "{register}({}, func(w http.ResponseWriter, req *http.Request) {{",
        quoted(&route_path(service, method))
    );

    let mut decoders = Vec::new();
    let mut body_fields = Vec::new();
    let mut args = vec!["req.Context()".to_string()];
    for p in &method.params {
        match method.http_method {
            HttpMethod::Get => {
                let q = query_param(service, method, p)?;
                let query_fn = if q.list {
                    "queryList"
                } else if p.optional {
                    "queryOpt"
                } else {
                    "queryOne"
                };
                let local = format!("arg{}", go_field_name(&p.name));
                decoders.push(format!(
                    "{local}, err := {query_fn}(req, {}, {})",
                    quoted(&p.name),
                    conv_fn(q.decode)
                ));
                args.push(local);
            }
            HttpMethod::Post => {
                let position = format!("parameter `{}` of `{}.{}`", p.name, service.name, method.name);
                body_fields.push(go_field(p, &position)?);
                args.push(format!("body.{}", go_field_name(&p.name)));
            }
        }
    }

    let call = format!("srv.{}({})", method_name(method), args.join(", "));
    let error_code = method.error_code;
    let error_name = status_error_name(error_code);
    let bad_request = |w: &mut CodeWriter| {
        w.block("if err != nil", |w| {
            cw_writeln!(w, "badRequest(w, {response}, err)")?;
            w.writeln("return")
        })
    };

    w.block_with(&open, "})", |w| {
        for decoder in &decoders {
            w.writeln(decoder)?;
            bad_request(w)?;
        }
        if !body_fields.is_empty() {
            w.block("var body struct", |w| {
                for field in &body_fields {
                    w.writeln(field)?;
                }
                Ok(())
            })?;
            w.block(
                &format!(
                    "if err := decodeRequest(req, {}, &body); err != nil",
                    content_type_const(request_content_type(method))
                ),
                |w| {
                    cw_writeln!(w, "badRequest(w, {response}, err)")?;
                    w.writeln("return")
                },
            )?;
        }
        let write_failure = |w: &mut CodeWriter| {
            cw_writeln!(w, "writeError(w, {error_code}, {}, {response}, err)", quoted(error_name))?;
            w.writeln("return")
        };
        if method.is_void_return {
            w.block(&format!("if err := {call}; err != nil"), write_failure)?;
            cw_writeln!(w, "writeData(w, {}, {response}, nil)", method.response_code)
        } else {
            cw_writeln!(w, "out, err := {call}")?;
            w.block("if err != nil", write_failure)?;
            cw_writeln!(w, "writeData(w, {}, {response}, out)", method.response_code)
        }
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::Builder;
    use crate::targets::go::ChiServer;
    use crate::test_util::{file, users};

    fn users_server() -> String {
        let codes = ChiServer.build(&users()).unwrap();
        file(&codes, "users.go").to_string()
    }

    #[test]
    fn interface_lists_every_method() {
        let source = users_server();
        assert!(source.contains("type UsersServer interface {\n"));
        assert!(source.contains("\tGetUser(ctx context.Context, id int64) (User, error)\n"));
        assert!(source.contains(
            "\tListUsers(ctx context.Context, ids []int64, active *bool, since *Timestamp) ([]User, error)\n"
        ));
        assert!(source.contains("\tCount(ctx context.Context) (uint32, error)\n"));
        assert!(source.contains("\tPurge(ctx context.Context) error\n"));
    }

    #[test]
    fn query_route_decodes_each_param() {
        let source = users_server();
        let expected = "\
\tr.Get(\"/Users/getUser\", func(w http.ResponseWriter, req *http.Request) {
\t\targId, err := queryOne(req, \"id\", convInt64)
\t\tif err != nil {
\t\t\tbadRequest(w, ContentTypeJSON, err)
\t\t\treturn
\t\t}
\t\tout, err := srv.GetUser(req.Context(), argId)
\t\tif err != nil {
\t\t\twriteError(w, 404, \"NotFound\", ContentTypeJSON, err)
\t\t\treturn
\t\t}
\t\twriteData(w, 200, ContentTypeJSON, out)
\t})
";
        assert!(source.contains(expected), "{source}");
        assert!(source.contains("argIds, err := queryList(req, \"ids\", convInt64)"));
        assert!(source.contains("argSince, err := queryOpt(req, \"since\", convTimestamp)"));
    }

    #[test]
    fn mutation_route_decodes_body() {
        let source = users_server();
        assert!(source.contains(
            "\t\tvar body struct {\n\t\t\tName string `json:\"name\" cbor:\"name\"`\n\t\t\tNick *string `json:\"nick,omitempty\" cbor:\"nick,omitempty\"`\n\t\t}\n"
        ));
        assert!(source.contains("out, err := srv.Create(req.Context(), body.Name, body.Nick)"));
        assert!(source.contains("writeData(w, 201, ContentTypeCBOR, out)"));
        assert!(source.contains(
            "\t\tif err := srv.Purge(req.Context()); err != nil {\n\t\t\twriteError(w, 500, \"InternalServerError\", ContentTypeCBOR, err)\n\t\t\treturn\n\t\t}\n\t\twriteData(w, 200, ContentTypeCBOR, nil)\n"
        ));
    }
}
