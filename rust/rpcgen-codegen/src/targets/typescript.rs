//! TypeScript: a `fetch` client and an `express` server.
//!
//! Each builder writes `rpc.ts` (wire types), its side's runtime helpers,
//! and one module per schema file holding the message interfaces plus the
//! client classes or handler interfaces for that file's services.

mod client;
mod runtime;
mod server;
mod types;

use rpcgen_schema::{DataType, Scalar, Schema};

use crate::code_writer::CodeWriter;
use crate::render::{any_type, header_line};
use crate::wire::{CBOR_CONTENT_TYPE, JSON_CONTENT_TYPE};
use crate::{Builder, Code, CodegenError, Direction, Language, Target, cw_writeln};

pub use types::{ts_scalar, ts_type};

pub struct FetchClient;

impl Builder for FetchClient {
    fn name(&self) -> &'static str {
        "ts.fetch-client"
    }

    fn target(&self) -> Target {
        Target {
            language: Language::TypeScript,
            framework: "fetch",
            direction: Direction::Client,
        }
    }

    fn build(&self, schemas: &[Schema]) -> Result<Vec<Code>, CodegenError> {
        let mut codes = vec![runtime::rpc(schemas), runtime::client()];
        for schema in schemas {
            codes.push(schema_module(schema, Direction::Client)?);
        }
        Ok(codes)
    }
}

pub struct ExpressServer;

impl Builder for ExpressServer {
    fn name(&self) -> &'static str {
        "ts.express-server"
    }

    fn target(&self) -> Target {
        Target {
            language: Language::TypeScript,
            framework: "express",
            direction: Direction::Server,
        }
    }

    fn build(&self, schemas: &[Schema]) -> Result<Vec<Code>, CodegenError> {
        let mut codes = vec![runtime::rpc(schemas), runtime::server()];
        for schema in schemas {
            codes.push(schema_module(schema, Direction::Server)?);
        }
        Ok(codes)
    }
}

/// Name of the `rpc.ts` constant holding a content type.
fn content_type_const(content_type: &str) -> &'static str {
    if content_type == CBOR_CONTENT_TYPE {
        "CBOR_CONTENT_TYPE"
    } else {
        debug_assert_eq!(content_type, JSON_CONTENT_TYPE);
        "JSON_CONTENT_TYPE"
    }
}

fn schema_module(schema: &Schema, direction: Direction) -> Result<Code, CodegenError> {
    let mut w = CodeWriter::with_indent_spaces(2);
    w.writeln(&header_line("//", Some(schema)))?;
    w.blank_line()?;

    match direction {
        Direction::Client => client::write_imports(&mut w, schema)?,
        Direction::Server => server::write_imports(&mut w, schema)?,
    }
    if any_type(schema, |ty| *ty == DataType::Scalar(Scalar::Blob)) {
        w.writeln("import type { Bytes } from './rpc'")?;
    }
    for import in &schema.imports {
        let names: Vec<&str> = import.message_names.iter().map(String::as_str).collect();
        cw_writeln!(
            w,
            "import type {{ {} }} from './{}'",
            names.join(", "),
            import.file_name
        )?;
    }

    types::write_messages(&mut w, schema)?;
    match direction {
        Direction::Client => client::write_services(&mut w, schema)?,
        Direction::Server => server::write_services(&mut w, schema)?,
    }

    tracing::trace!(schema = %schema.file_name, %direction, "rendered typescript module");
    Ok(Code {
        file_name: format!("{}.ts", schema.file_name),
        source: w.finish(),
    })
}
