//! `fetch` client classes, one per service.

use std::collections::BTreeSet;

use rpcgen_schema::{HttpMethod, Method, Schema, Service};

use super::content_type_const;
use super::types::{ts_params, ts_return_type};
use crate::code_writer::CodeWriter;
use crate::render::{jsdoc, ts_string};
use crate::wire::{QueryParam, request_content_type, response_content_type, route_path};
use crate::{CodegenError, Language, cw_writeln};

fn public_methods(schema: &Schema) -> impl Iterator<Item = &Method> {
    schema.services().flat_map(Service::public_methods)
}

pub fn write_imports(w: &mut CodeWriter, schema: &Schema) -> Result<(), CodegenError> {
    if public_methods(schema).next().is_none() {
        return Ok(());
    }
    let needs_query =
        public_methods(schema).any(|m| m.http_method == HttpMethod::Get && m.has_params);
    let runtime = if needs_query {
        "type ClientOptions, appendQuery, rpcCall"
    } else {
        "type ClientOptions, rpcCall"
    };
    cw_writeln!(w, "import {{ {runtime} }} from './rpc_client'")?;

    let mut consts = BTreeSet::new();
    for method in public_methods(schema) {
        consts.insert(content_type_const(request_content_type(method)));
        consts.insert(content_type_const(response_content_type(method)));
    }
    let consts: Vec<&str> = consts.into_iter().collect();
    cw_writeln!(w, "import {{ {} }} from './rpc'", consts.join(", "))?;
    Ok(())
}

pub fn write_services(w: &mut CodeWriter, schema: &Schema) -> Result<(), CodegenError> {
    for service in schema.services() {
        if service.public_methods().next().is_none() {
            continue;
        }
        w.blank_line()?;
        write_client_class(w, service)?;
    }
    Ok(())
}

fn write_client_class(w: &mut CodeWriter, service: &Service) -> Result<(), CodegenError> {
    jsdoc(w, service.doc.as_deref())?;
    cw_writeln!(w, "export class {}Client {{", service.name)?;
    {
        let _indent = w.indent();
        w.writeln("constructor(private readonly options: ClientOptions) {}")?;
        for method in service.public_methods() {
            w.blank_line()?;
            write_method(w, service, method)?;
        }
    }
    w.writeln("}")?;
    Ok(())
}

fn write_method(w: &mut CodeWriter, service: &Service, method: &Method) -> Result<(), CodegenError> {
    if method.http_method == HttpMethod::Get {
        for p in &method.params {
            if QueryParam::classify(&p.ty).is_none() {
                return Err(CodegenError::unsupported(
                    Language::TypeScript,
                    &p.ty,
                    format!("query parameter `{}` of `{}.{}`", p.name, service.name, method.name),
                ));
            }
        }
    }
    let params = ts_params(&method.params)?;
    let ret = ts_return_type(&method.return_type)?;
    let route = format!(
        "{{ method: '{}', path: {}, requestType: {}, responseType: {} }}",
        method.http_method.as_str(),
        ts_string(&route_path(service, method)),
        content_type_const(request_content_type(method)),
        content_type_const(response_content_type(method)),
    );

    jsdoc(w, method.doc.as_deref())?;
    let header = format!(
        "async {}({}): Promise<{ret}>",
        method.name,
        params.join(", ")
    );
    w.block(&header, |w| {
        if !method.has_params {
            return cw_writeln!(w, "return rpcCall<{ret}>(this.options, {route})");
        }
        match method.http_method {
            HttpMethod::Get => {
                w.writeln("const query = new URLSearchParams()")?;
                for p in &method.params {
                    cw_writeln!(w, "appendQuery(query, {}, {})", ts_string(&p.name), p.name)?;
                }
                cw_writeln!(w, "return rpcCall<{ret}>(this.options, {route}, query)")
            }
            HttpMethod::Post => {
                let names: Vec<String> = method
                    .params
                    .iter()
                    .map(|p| format!("{}: {}", ts_string(&p.name), p.name))
                    .collect();
                cw_writeln!(
                    w,
                    "return rpcCall<{ret}>(this.options, {route}, undefined, {{ {} }})",
                    names.join(", ")
                )
            }
        }
    })?;
    Ok(())
}
