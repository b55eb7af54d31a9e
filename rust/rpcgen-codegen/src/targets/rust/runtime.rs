//! Fixed support modules: `rpc.rs`, `rpc_client.rs` and `rpc_server.rs`.
//!
//! Generated crates depend on `serde`, `serde_json`, `ciborium` and `base64`,
//! plus `reqwest` for clients or `axum` and `form_urlencoded` for servers.

use crate::Code;
use crate::render::header_line;

const RPC_RS: &str = r#"
use std::fmt;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::de::{self, DeserializeOwned, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub const JSON_CONTENT_TYPE: &str = "application/json";
pub const CBOR_CONTENT_TYPE: &str = "application/cbor";

/// Unix seconds.
pub type Timestamp = i64;

/// Raw bytes: a byte string in CBOR, base64 text in JSON.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Blob(pub Vec<u8>);

impl From<Vec<u8>> for Blob {
    fn from(bytes: Vec<u8>) -> Self {
        Blob(bytes)
    }
}

impl Serialize for Blob {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.serialize_str(&BASE64.encode(&self.0))
        } else {
            serializer.serialize_bytes(&self.0)
        }
    }
}

struct BlobVisitor;

impl<'de> Visitor<'de> for BlobVisitor {
    type Value = Blob;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("bytes or base64 text")
    }

    fn visit_bytes<E: de::Error>(self, v: &[u8]) -> Result<Blob, E> {
        Ok(Blob(v.to_vec()))
    }

    fn visit_byte_buf<E: de::Error>(self, v: Vec<u8>) -> Result<Blob, E> {
        Ok(Blob(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Blob, E> {
        BASE64.decode(v).map(Blob).map_err(E::custom)
    }
}

impl<'de> Deserialize<'de> for Blob {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            deserializer.deserialize_str(BlobVisitor)
        } else {
            deserializer.deserialize_bytes(BlobVisitor)
        }
    }
}

/// Success envelope.
#[derive(Debug, Serialize, Deserialize)]
pub struct Data<T> {
    pub data: T,
}

/// Body of every failed call. Services return it; clients receive it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcError {
    pub code: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cause: Option<String>,
    pub msg: String,
    pub error: String,
}

impl RpcError {
    /// The route fills in `code` and `error` from the method's failure status.
    pub fn new(msg: impl Into<String>) -> Self {
        RpcError {
            code: 0,
            cause: None,
            msg: msg.into(),
            error: String::new(),
        }
    }

    pub fn with_cause(mut self, cause: impl fmt::Display) -> Self {
        self.cause = Some(cause.to_string());
        self
    }
}

impl fmt::Display for RpcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.error, self.code, self.msg)?;
        if let Some(cause) = &self.cause {
            write!(f, ": {cause}")?;
        }
        Ok(())
    }
}

impl std::error::Error for RpcError {}

#[derive(Debug)]
pub struct CodecError(pub String);

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "codec error: {}", self.0)
    }
}

impl std::error::Error for CodecError {}

impl From<CodecError> for RpcError {
    fn from(err: CodecError) -> Self {
        RpcError {
            code: 0,
            cause: None,
            msg: err.0,
            error: "CodecError".to_string(),
        }
    }
}

pub fn encode<T: Serialize>(content_type: &str, value: &T) -> Result<Vec<u8>, CodecError> {
    if content_type == CBOR_CONTENT_TYPE {
        let mut out = Vec::new();
        ciborium::into_writer(value, &mut out).map_err(|e| CodecError(e.to_string()))?;
        Ok(out)
    } else {
        serde_json::to_vec(value).map_err(|e| CodecError(e.to_string()))
    }
}

pub fn decode<T: DeserializeOwned>(content_type: &str, data: &[u8]) -> Result<T, CodecError> {
    if content_type == CBOR_CONTENT_TYPE {
        ciborium::from_reader(data).map_err(|e| CodecError(e.to_string()))
    } else {
        serde_json::from_slice(data).map_err(|e| CodecError(e.to_string()))
    }
}
"#;

const RPC_CLIENT_RS: &str = r#"
use reqwest::Method;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::de::DeserializeOwned;

use super::rpc::{Data, RpcError, decode};

/// Shared by every generated service client.
#[derive(Debug, Clone)]
pub struct Client {
    base_url: String,
    http: reqwest::Client,
}

impl Client {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_http(base_url, reqwest::Client::new())
    }

    pub fn with_http(base_url: impl Into<String>, http: reqwest::Client) -> Self {
        Client {
            base_url: base_url.into(),
            http,
        }
    }

    pub async fn call<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<Vec<u8>>,
        request_type: &str,
        response_type: &str,
    ) -> Result<T, RpcError> {
        let bytes = self.send(method, path, query, body, request_type, response_type).await?;
        let envelope: Data<T> = decode(response_type, &bytes)?;
        Ok(envelope.data)
    }

    /// Void methods ignore the response body.
    pub async fn call_void(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<Vec<u8>>,
        request_type: &str,
        response_type: &str,
    ) -> Result<(), RpcError> {
        self.send(method, path, query, body, request_type, response_type).await?;
        Ok(())
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<Vec<u8>>,
        request_type: &str,
        response_type: &str,
    ) -> Result<Vec<u8>, RpcError> {
        let url = format!("{}{path}", self.base_url.trim_end_matches('/'));
        let mut request = self.http.request(method, url).header(ACCEPT, response_type);
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.header(CONTENT_TYPE, request_type).body(body);
        }

        let response = request.send().await.map_err(transport_error)?;
        let status = response.status();
        let bytes = response.bytes().await.map_err(transport_error)?;
        if status.is_client_error() || status.is_server_error() {
            return Err(decode::<RpcError>(response_type, &bytes).unwrap_or_else(|_| RpcError {
                code: status.as_u16(),
                cause: None,
                msg: String::from_utf8_lossy(&bytes).trim().to_string(),
                error: status.canonical_reason().unwrap_or("Error").to_string(),
            }));
        }
        Ok(bytes.to_vec())
    }
}

fn transport_error(err: reqwest::Error) -> RpcError {
    RpcError {
        code: err.status().map_or(0, |s| s.as_u16()),
        cause: None,
        msg: err.to_string(),
        error: "TransportError".to_string(),
    }
}
"#;

const RPC_SERVER_RS: &str = r#"
use std::fmt;
use std::str::FromStr;

use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::rpc::{CodecError, Data, JSON_CONTENT_TYPE, RpcError, decode, encode};

/// Handed to every service method.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub headers: HeaderMap,
}

#[derive(Debug)]
pub struct QueryError(String);

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Decoded `?key=value` pairs, in order.
pub struct Query {
    pairs: Vec<(String, String)>,
}

impl Query {
    pub fn parse(raw: Option<&str>) -> Self {
        let pairs = form_urlencoded::parse(raw.unwrap_or_default().as_bytes())
            .into_owned()
            .collect();
        Query { pairs }
    }

    fn values<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.pairs.iter().filter(move |(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    pub fn one<T>(&self, key: &str, conv: fn(&str) -> Result<T, String>) -> Result<T, QueryError> {
        let mut values = self.values(key);
        match (values.next(), values.next()) {
            (None, _) => Err(QueryError(format!("missing query parameter {key:?}"))),
            (Some(raw), None) => {
                conv(raw).map_err(|e| QueryError(format!("query parameter {key:?}: {e}")))
            }
            (Some(_), Some(_)) => Err(QueryError(format!("query parameter {key:?} given more than once"))),
        }
    }

    pub fn opt<T>(&self, key: &str, conv: fn(&str) -> Result<T, String>) -> Result<Option<T>, QueryError> {
        if self.values(key).next().is_none() {
            return Ok(None);
        }
        self.one(key, conv).map(Some)
    }

    pub fn list<T>(&self, key: &str, conv: fn(&str) -> Result<T, String>) -> Result<Vec<T>, QueryError> {
        self.values(key)
            .map(|raw| conv(raw).map_err(|e| QueryError(format!("query parameter {key:?}: {e}"))))
            .collect()
    }

    /// `None` when the key is absent. An empty list is never sent, so it
    /// reads back as `None` too.
    pub fn opt_list<T>(&self, key: &str, conv: fn(&str) -> Result<T, String>) -> Result<Option<Vec<T>>, QueryError> {
        if self.values(key).next().is_none() {
            return Ok(None);
        }
        self.list(key, conv).map(Some)
    }
}

pub fn conv_bool(raw: &str) -> Result<bool, String> {
    match raw {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(format!("invalid bool {raw:?}")),
    }
}

/// Decimal or `0x` hex, with an optional leading minus. A leading 0 stays decimal.
pub fn conv_int<T: TryFrom<i128>>(raw: &str) -> Result<T, String> {
    let (negative, body) = match raw.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, raw),
    };
    let (radix, digits) = match body.strip_prefix("0x").or_else(|| body.strip_prefix("0X")) {
        Some(hex) => (16, hex),
        None => (10, body),
    };
    if digits.is_empty() || digits.starts_with(['+', '-']) {
        return Err(format!("invalid integer {raw:?}"));
    }
    let magnitude = i128::from_str_radix(digits, radix).map_err(|_| format!("invalid integer {raw:?}"))?;
    let value = if negative { -magnitude } else { magnitude };
    T::try_from(value).map_err(|_| format!("integer {raw:?} out of range"))
}

pub fn conv_float<T: FromStr>(raw: &str) -> Result<T, String> {
    raw.parse().map_err(|_| format!("invalid number {raw:?}"))
}

pub fn conv_timestamp(raw: &str) -> Result<i64, String> {
    conv_int(raw)
}

pub fn conv_string(raw: &str) -> Result<String, String> {
    Ok(raw.to_string())
}

fn body_response(status: u16, content_type: &'static str, body: Vec<u8>) -> Response {
    let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, [(CONTENT_TYPE, HeaderValue::from_static(content_type))], body).into_response()
}

pub fn data_response<T: Serialize>(status: u16, content_type: &'static str, data: &T) -> Response {
    match encode(content_type, &Data { data }) {
        Ok(body) => body_response(status, content_type, body),
        Err(err) => body_response(500, JSON_CONTENT_TYPE, err.to_string().into_bytes()),
    }
}

/// `status` and `kind` come from the method unless `err` already names a kind.
pub fn error_response(status: u16, kind: &str, content_type: &'static str, mut err: RpcError) -> Response {
    err.code = status;
    if err.error.is_empty() {
        err.error = kind.to_string();
    }
    match encode(content_type, &err) {
        Ok(body) => body_response(status, content_type, body),
        Err(err) => body_response(500, JSON_CONTENT_TYPE, err.to_string().into_bytes()),
    }
}

pub fn bad_request(content_type: &'static str, err: impl fmt::Display) -> Response {
    error_response(400, "BadRequest", content_type, RpcError::new(err.to_string()))
}

/// An empty body decodes like `{}`.
pub fn decode_body<T: DeserializeOwned>(content_type: &str, body: &[u8]) -> Result<T, CodecError> {
    if body.is_empty() {
        return decode(JSON_CONTENT_TYPE, b"{}");
    }
    decode(content_type, body)
}
"#;

fn preamble() -> String {
    format!("{}\n#![allow(dead_code)]\n", header_line("//", None))
}

pub fn rpc() -> Code {
    Code {
        file_name: "rpc.rs".to_string(),
        source: format!("{}{RPC_RS}", preamble()),
    }
}

pub fn client() -> Code {
    Code {
        file_name: "rpc_client.rs".to_string(),
        source: format!("{}{RPC_CLIENT_RS}", preamble()),
    }
}

pub fn server() -> Code {
    Code {
        file_name: "rpc_server.rs".to_string(),
        source: format!("{}{RPC_SERVER_RS}", preamble()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::{BAD_REQUEST_ERROR, BAD_REQUEST_STATUS, CBOR_CONTENT_TYPE, JSON_CONTENT_TYPE};

    #[test]
    fn wire_constants_match() {
        let source = rpc().source;
        assert!(source.contains(&format!("pub const JSON_CONTENT_TYPE: &str = \"{JSON_CONTENT_TYPE}\";")));
        assert!(source.contains(&format!("pub const CBOR_CONTENT_TYPE: &str = \"{CBOR_CONTENT_TYPE}\";")));
        assert!(server().source.contains(&format!(
            "error_response({BAD_REQUEST_STATUS}, \"{BAD_REQUEST_ERROR}\", content_type"
        )));
    }

    #[test]
    fn files_start_with_the_notice() {
        for code in [rpc(), client(), server()] {
            assert!(code.source.starts_with("// Code generated by rpcgen. DO NOT EDIT.\n#![allow(dead_code)]\n"));
        }
    }
}
