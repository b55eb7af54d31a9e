//! Messages, services and the per-file schema.

use std::collections::BTreeSet;

use crate::data_type::{DataType, Property};

/// Method parameters share the shape of message properties.
pub type Param = Property;

/// A named record declared with `Msg<{ .. }>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Message {
    pub name: String,
    pub is_exported: bool,
    pub properties: Vec<Property>,
    pub doc: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
        }
    }
}

/// Whether client builders expose a method.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Access {
    #[default]
    Public,
    /// Served, but left out of generated clients.
    Internal,
}

impl Access {
    pub fn from_tag(value: &str) -> Option<Self> {
        match value {
            "public" => Some(Access::Public),
            "internal" => Some(Access::Internal),
            _ => None,
        }
    }
}

/// Payload encoding selected by `@kind`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Encoding {
    Json,
    Cbor,
}

impl Encoding {
    pub fn from_tag(value: &str) -> Option<Self> {
        match value {
            "json" => Some(Encoding::Json),
            "cbor" => Some(Encoding::Cbor),
            _ => None,
        }
    }
}

pub const DEFAULT_RESPONSE_CODE: u16 = 200;
pub const DEFAULT_ERROR_CODE: u16 = 500;

/// HTTP status codes a `@returns` / `@throws` tag may name.
pub const VALID_STATUS_CODES: &[u16] = &[
    100, 101, 102, 103, //
    200, 201, 202, 203, 204, 205, 206, 207, 208, 226, //
    300, 301, 302, 303, 304, 305, 307, 308, //
    400, 401, 402, 403, 404, 405, 406, 407, 408, 409, 410, 411, 412, 413, 414, 415, 416, 417,
    418, 421, 422, 423, 424, 425, 426, 428, 429, 431, 451, //
    500, 501, 502, 503, 504, 505, 506, 507, 508, 510, 511,
];

pub fn is_valid_status_code(code: u16) -> bool {
    VALID_STATUS_CODES.contains(&code)
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Method {
    pub name: String,
    pub params: Vec<Param>,
    pub return_type: DataType,
    pub http_method: HttpMethod,
    pub response_code: u16,
    pub error_code: u16,
    pub has_cbor_params: bool,
    pub has_cbor_return: bool,
    pub has_params: bool,
    pub is_void_return: bool,
    pub access: Access,
    pub doc: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceKind {
    Query,
    Mutation,
}

impl ServiceKind {
    pub fn http_method(self) -> HttpMethod {
        match self {
            ServiceKind::Query => HttpMethod::Get,
            ServiceKind::Mutation => HttpMethod::Post,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Service {
    pub kind: ServiceKind,
    pub name: String,
    pub methods: Vec<Method>,
    pub use_cbor: bool,
    pub doc: Option<String>,
}

impl Service {
    /// Methods a generated client exposes.
    pub fn public_methods(&self) -> impl Iterator<Item = &Method> {
        self.methods.iter().filter(|m| m.access == Access::Public)
    }
}

/// Messages a file pulls in from another file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Import {
    pub message_names: BTreeSet<String>,
    /// [`Schema::file_name`] of the file imported from.
    pub file_name: String,
}

/// Everything declared in one schema file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Schema {
    pub package_name: String,
    /// Source path without `.ts`, with `/` replaced by `_`: `shared/geo.ts`
    /// becomes `shared_geo`.
    pub file_name: String,
    pub imports: Vec<Import>,
    pub messages: Vec<Message>,
    pub query_services: Vec<Service>,
    pub mutation_services: Vec<Service>,
    /// Any method in the file uses CBOR for params or return.
    pub has_cbor: bool,
}

impl Schema {
    pub fn services(&self) -> impl Iterator<Item = &Service> {
        self.query_services.iter().chain(&self.mutation_services)
    }

    pub fn message(&self, name: &str) -> Option<&Message> {
        self.messages.iter().find(|m| m.name == name)
    }

    pub fn has_services(&self) -> bool {
        !self.query_services.is_empty() || !self.mutation_services.is_empty()
    }
}

/// Names every builder uses for its fixed support files.
pub const RUNTIME_FILE_NAMES: &[&str] = &["rpc", "rpc_client", "rpc_server"];

/// Schema file name for a project path. Flattening is lossy: `shared/geo.ts`
/// and `shared_geo.ts` share a name, which the validator reports.
pub fn schema_file_name(path: &str) -> String {
    path.strip_suffix(".ts").unwrap_or(path).replace('/', "_")
}
