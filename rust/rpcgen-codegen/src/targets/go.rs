//! Go: a `net/http` client and a `chi` server.
//!
//! Every file lands in one package named after the project's package name.
//! Go rejects unused imports, so each file's import list is computed from
//! what its body actually references.

mod client;
mod runtime;
mod server;
mod types;

use heck::ToUpperCamelCase;
use rpcgen_schema::{Method, Schema, Service};

use crate::code_writer::CodeWriter;
use crate::render::header_line;
use crate::wire::CBOR_CONTENT_TYPE;
use crate::{Builder, Code, CodegenError, Direction, Language, Target, cw_writeln};

pub use types::{go_scalar, go_type};

pub struct HttpClient;

impl Builder for HttpClient {
    fn name(&self) -> &'static str {
        "go.http-client"
    }

    fn target(&self) -> Target {
        Target {
            language: Language::Go,
            framework: "net/http",
            direction: Direction::Client,
        }
    }

    fn build(&self, schemas: &[Schema]) -> Result<Vec<Code>, CodegenError> {
        let Some(package) = package_name(schemas) else {
            return Ok(Vec::new());
        };
        let mut codes = vec![runtime::rpc(package), runtime::client(package)];
        for schema in schemas {
            codes.push(schema_file(schema, Direction::Client)?);
        }
        Ok(codes)
    }
}

pub struct ChiServer;

impl Builder for ChiServer {
    fn name(&self) -> &'static str {
        "go.chi-server"
    }

    fn target(&self) -> Target {
        Target {
            language: Language::Go,
            framework: "chi",
            direction: Direction::Server,
        }
    }

    fn build(&self, schemas: &[Schema]) -> Result<Vec<Code>, CodegenError> {
        let Some(package) = package_name(schemas) else {
            return Ok(Vec::new());
        };
        let mut codes = vec![runtime::rpc(package), runtime::server(package)];
        for schema in schemas {
            codes.push(schema_file(schema, Direction::Server)?);
        }
        Ok(codes)
    }
}

fn package_name(schemas: &[Schema]) -> Option<&str> {
    schemas.first().map(|s| s.package_name.as_str())
}

/// Name of the `rpc.go` constant holding a content type.
fn content_type_const(content_type: &str) -> &'static str {
    if content_type == CBOR_CONTENT_TYPE {
        "ContentTypeCBOR"
    } else {
        "ContentTypeJSON"
    }
}

fn method_name(method: &Method) -> String {
    method.name.to_upper_camel_case()
}

/// `Name(ctx context.Context, ..) (T, error)`, shared by the server
/// interface and the client methods.
fn method_signature(service: &Service, method: &Method) -> Result<String, CodegenError> {
    let mut params = vec!["ctx context.Context".to_string()];
    for p in &method.params {
        let position = format!("parameter `{}` of `{}.{}`", p.name, service.name, method.name);
        let ty = types::go_optional(go_type(&p.ty, &position)?, p.optional);
        params.push(format!("{} {ty}", types::go_param_name(&p.name)));
    }
    let ret = if method.is_void_return {
        "error".to_string()
    } else {
        let position = format!("the return type of `{}.{}`", service.name, method.name);
        format!("({}, error)", go_type(&method.return_type, &position)?)
    };
    Ok(format!("{}({}) {ret}", method_name(method), params.join(", ")))
}

/// Standard library first, then modules, gofmt style.
fn write_imports(w: &mut CodeWriter, imports: &[&str]) -> std::fmt::Result {
    if imports.is_empty() {
        return Ok(());
    }
    let (std, modules): (Vec<&str>, Vec<&str>) = imports
        .iter()
        .copied()
        .partition(|path| !path.split('/').next().is_some_and(|first| first.contains('.')));
    w.blank_line()?;
    w.block_with("import (", ")", |w| {
        for path in &std {
            cw_writeln!(w, "\"{path}\"")?;
        }
        if !std.is_empty() && !modules.is_empty() {
            w.blank_line()?;
        }
        for path in &modules {
            cw_writeln!(w, "\"{path}\"")?;
        }
        Ok(())
    })
}

fn schema_file(schema: &Schema, direction: Direction) -> Result<Code, CodegenError> {
    let mut w = CodeWriter::with_tabs();
    w.writeln(&header_line("//", Some(schema)))?;
    w.blank_line()?;
    cw_writeln!(w, "package {}", schema.package_name)?;

    let imports = match direction {
        Direction::Client => client::imports(schema),
        Direction::Server => server::imports(schema),
    };
    write_imports(&mut w, &imports)?;

    types::write_messages(&mut w, schema)?;
    match direction {
        Direction::Client => client::write_services(&mut w, schema)?,
        Direction::Server => server::write_services(&mut w, schema)?,
    }

    tracing::trace!(schema = %schema.file_name, %direction, "rendered go file");
    Ok(Code {
        file_name: format!("{}.go", schema.file_name),
        source: w.finish(),
    })
}
