//! Rust: a `reqwest` client and an `axum` server.
//!
//! Output is a module tree: `mod.rs` declares `rpc` (wire types), the side's
//! runtime module, and one module per schema file. Messages derive serde's
//! `Serialize`/`Deserialize` so one set of types serves both codecs.

mod client;
mod runtime;
mod server;
mod types;

use codegen::Scope;
use heck::{ToSnakeCase, ToUpperCamelCase};
use rpcgen_schema::{Access, HttpMethod, Method, Param, Schema, Service};

use crate::render::header_line;
use crate::wire::{CBOR_CONTENT_TYPE, QueryParam};
use crate::{Builder, Code, CodegenError, Direction, Language, Target};

pub use types::{rust_ident, rust_scalar};
use types::{RustTypes, rust_param_ident};

pub struct ReqwestClient;

impl Builder for ReqwestClient {
    fn name(&self) -> &'static str {
        "rust.reqwest-client"
    }

    fn target(&self) -> Target {
        Target {
            language: Language::Rust,
            framework: "reqwest",
            direction: Direction::Client,
        }
    }

    fn build(&self, schemas: &[Schema]) -> Result<Vec<Code>, CodegenError> {
        build(schemas, Direction::Client)
    }
}

pub struct AxumServer;

impl Builder for AxumServer {
    fn name(&self) -> &'static str {
        "rust.axum-server"
    }

    fn target(&self) -> Target {
        Target {
            language: Language::Rust,
            framework: "axum",
            direction: Direction::Server,
        }
    }

    fn build(&self, schemas: &[Schema]) -> Result<Vec<Code>, CodegenError> {
        build(schemas, Direction::Server)
    }
}

fn build(schemas: &[Schema], direction: Direction) -> Result<Vec<Code>, CodegenError> {
    let side = match direction {
        Direction::Client => runtime::client(),
        Direction::Server => runtime::server(),
    };
    let mut codes = vec![runtime::rpc(), side];
    for schema in schemas {
        let source = RustGenerator::new(schema, direction).generate()?;
        tracing::trace!(schema = %schema.file_name, %direction, "rendered rust module");
        codes.push(Code {
            file_name: format!("{}.rs", module_name(&schema.file_name)),
            source,
        });
    }
    codes.push(mod_file(&codes));
    Ok(codes)
}

const RUNTIME_MODULES: &[&str] = &["mod", "rpc", "rpc_client", "rpc_server"];

/// Module for a schema file, kept clear of keywords and runtime modules.
fn module_name(file_name: &str) -> String {
    let snake = file_name.to_snake_case();
    if rust_ident(&snake) != snake || RUNTIME_MODULES.contains(&snake.as_str()) {
        format!("{snake}_schema")
    } else {
        snake
    }
}

fn mod_file(codes: &[Code]) -> Code {
    let mut source = header_line("//", None);
    source.push_str("\n\n");
    for code in codes {
        if let Some(module) = code.file_name.strip_suffix(".rs") {
            source.push_str(&format!("pub mod {module};\n"));
        }
    }
    Code {
        file_name: "mod.rs".to_string(),
        source,
    }
}

fn content_type_const(content_type: &str) -> &'static str {
    if content_type == CBOR_CONTENT_TYPE {
        "CBOR_CONTENT_TYPE"
    } else {
        "JSON_CONTENT_TYPE"
    }
}

/// A method with every type resolved to its Rust spelling.
struct MethodSig<'a> {
    method: &'a Method,
    fn_name: String,
    params: Vec<ParamSig<'a>>,
    /// `()` for void methods.
    ret: String,
    /// POST body struct, for mutations that take parameters.
    body: Option<String>,
}

struct ParamSig<'a> {
    param: &'a Param,
    /// Function argument.
    ident: String,
    /// Field of the body struct.
    field: String,
    ty: String,
    /// Set for GET parameters.
    query: Option<QueryParam>,
}

struct ServiceSig<'a> {
    service: &'a Service,
    methods: Vec<MethodSig<'a>>,
}

impl ServiceSig<'_> {
    fn public_methods(&self) -> impl Iterator<Item = &MethodSig<'_>> {
        self.methods.iter().filter(|m| m.method.access == Access::Public)
    }
}

struct RustGenerator<'a> {
    schema: &'a Schema,
    direction: Direction,
    scope: Scope,
    types: RustTypes,
}

impl<'a> RustGenerator<'a> {
    fn new(schema: &'a Schema, direction: Direction) -> Self {
        let imported = schema
            .imports
            .iter()
            .flat_map(|i| i.message_names.iter().map(String::as_str));
        let services = schema.services().map(|s| s.name.as_str());
        Self {
            schema,
            direction,
            scope: Scope::new(),
            types: RustTypes::new(imported.chain(services)),
        }
    }

    fn generate(mut self) -> Result<String, CodegenError> {
        let schema = self.schema;
        self.types.box_cycles(&schema.messages);
        let mut messages = Vec::new();
        for message in &schema.messages {
            messages.push(self.types.message(message)?);
        }
        let mut services = Vec::new();
        for service in schema.services() {
            services.push(self.resolve_service(service)?);
        }

        self.scope.raw(format!(
            "{}\n#![allow(dead_code, unused_imports, clippy::all)]",
            header_line("//", Some(self.schema))
        ));
        self.write_imports();
        let hoisted = self.types.take_items();
        for item in messages.iter().chain(&hoisted) {
            self.scope.raw(item.trim_end());
        }
        match self.direction {
            Direction::Client => client::generate(&mut self.scope, &services),
            Direction::Server => server::generate(&mut self.scope, &services),
        }
        let mut source = self.scope.to_string();
        source.push('\n');
        Ok(source)
    }

    fn write_imports(&mut self) {
        let has_methods = self.schema.services().any(|s| !s.methods.is_empty());
        let server = has_methods && self.direction == Direction::Server;
        let client = has_methods && self.direction == Direction::Client;

        let mut lines = vec!["use std::collections::HashMap;"];
        if server {
            lines.push("use std::sync::Arc;");
        }
        lines.push("");
        if server {
            lines.extend([
                "use axum::Router;",
                "use axum::body::Bytes;",
                "use axum::extract::{RawQuery, State};",
                "use axum::http::HeaderMap;",
                "use axum::response::Response;",
                "use axum::routing::{get, post};",
            ]);
        }
        if client {
            lines.push("use reqwest::Method;");
        }
        lines.push("use serde::{Deserialize, Serialize};");
        lines.push("");
        lines.push("use super::rpc::*;");
        if client {
            lines.push("use super::rpc_client::Client;");
        }
        if server {
            lines.push("use super::rpc_server::*;");
        }

        let mut source = lines.join("\n");
        for import in &self.schema.imports {
            let names: Vec<&str> = import.message_names.iter().map(String::as_str).collect();
            source.push_str(&format!(
                "\nuse super::{}::{{{}}};",
                module_name(&import.file_name),
                names.join(", ")
            ));
        }
        self.scope.raw(source);
    }

    fn resolve_service<'s>(&mut self, service: &'s Service) -> Result<ServiceSig<'s>, CodegenError> {
        let mut methods = Vec::new();
        for method in &service.methods {
            let owner = format!("{}{}", service.name, method.name.to_upper_camel_case());
            let mut params = Vec::new();
            for param in &method.params {
                let query = match method.http_method {
                    HttpMethod::Get => Some(QueryParam::classify(&param.ty).ok_or_else(|| {
                        CodegenError::unsupported(
                            Language::Rust,
                            &param.ty,
                            format!("query parameter `{}` of `{}.{}`", param.name, service.name, method.name),
                        )
                    })?),
                    HttpMethod::Post => None,
                };
                params.push(ParamSig {
                    param,
                    ident: rust_param_ident(&param.name),
                    field: rust_ident(&param.name),
                    ty: self.types.property_type(param, &owner)?,
                    query,
                });
            }
            let ret = if method.is_void_return {
                "()".to_string()
            } else {
                self.types.rust_type(&method.return_type, &format!("{owner}Output"))?
            };
            let body = if method.http_method == HttpMethod::Post && method.has_params {
                let name = format!("{owner}Params");
                let doc = format!("Request body of `{}.{}`.", service.name, method.name);
                let fields: Vec<(&Param, String)> =
                    params.iter().map(|p| (p.param, p.ty.clone())).collect();
                Some(self.types.named_struct(&name, &doc, &fields)?)
            } else {
                None
            };
            methods.push(MethodSig {
                method,
                fn_name: rust_ident(&method.name),
                params,
                ret,
                body,
            });
        }
        Ok(ServiceSig { service, methods })
    }
}
