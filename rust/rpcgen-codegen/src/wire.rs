//! The HTTP contract every generated client and server agrees on.
//!
//! - Route: `/{Service}/{method}`; query services use `GET`, mutation
//!   services `POST`.
//! - `GET` parameters travel in the query string. Lists repeat the key.
//!   Integers also accept a `0x` hex spelling.
//! - `POST` parameters travel as one body object keyed by parameter name.
//! - Success: the method's response code and body `{ "data": <value> }`.
//! - Failure: the method's error code and body
//!   `{ "code", "cause"?, "msg", "error" }`.
//! - Malformed requests: 400 with `error = "BadRequest"`.

use rpcgen_schema::{DataType, Method, Scalar, Service};

pub const JSON_CONTENT_TYPE: &str = "application/json";
pub const CBOR_CONTENT_TYPE: &str = "application/cbor";

pub const BAD_REQUEST_STATUS: u16 = 400;
pub const BAD_REQUEST_ERROR: &str = "BadRequest";

pub fn content_type(cbor: bool) -> &'static str {
    if cbor { CBOR_CONTENT_TYPE } else { JSON_CONTENT_TYPE }
}

/// Content type of a `POST` body; clients encode and servers decode with it.
pub fn request_content_type(method: &Method) -> &'static str {
    content_type(method.has_cbor_params)
}

pub fn response_content_type(method: &Method) -> &'static str {
    content_type(method.has_cbor_return)
}

pub fn route_path(service: &Service, method: &Method) -> String {
    format!("/{}/{}", service.name, method.name)
}

/// Value of the `error` field for a status code.
pub fn status_error_name(code: u16) -> &'static str {
    match code {
        400 => "BadRequest",
        401 => "Unauthorized",
        402 => "PaymentRequired",
        403 => "Forbidden",
        404 => "NotFound",
        405 => "MethodNotAllowed",
        406 => "NotAcceptable",
        408 => "RequestTimeout",
        409 => "Conflict",
        410 => "Gone",
        412 => "PreconditionFailed",
        413 => "PayloadTooLarge",
        415 => "UnsupportedMediaType",
        418 => "ImATeapot",
        422 => "UnprocessableEntity",
        423 => "Locked",
        429 => "TooManyRequests",
        451 => "UnavailableForLegalReasons",
        500 => "InternalServerError",
        501 => "NotImplemented",
        502 => "BadGateway",
        503 => "ServiceUnavailable",
        504 => "GatewayTimeout",
        400..=499 => "ClientError",
        500..=599 => "ServerError",
        _ => "Error",
    }
}

/// How a query-string value is parsed back into a scalar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryDecode {
    Bool,
    /// Decimal or `0x` hex, range-checked against the width.
    Int { bits: u32, signed: bool },
    Float { bits: u32 },
    /// Unix seconds.
    Timestamp,
    String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryParam {
    pub scalar: Scalar,
    pub decode: QueryDecode,
    /// `t.List<scalar>`: the key repeats, absent means empty.
    pub list: bool,
}

impl QueryParam {
    /// `None` for types that cannot travel in a query string.
    pub fn classify(ty: &DataType) -> Option<Self> {
        let (scalar, list) = match ty {
            DataType::Scalar(s) => (*s, false),
            DataType::List(inner) => (inner.as_scalar()?, true),
            _ => return None,
        };
        let decode = match scalar {
            Scalar::Bool => QueryDecode::Bool,
            Scalar::Timestamp => QueryDecode::Timestamp,
            Scalar::String => QueryDecode::String,
            Scalar::Float32 => QueryDecode::Float { bits: 32 },
            Scalar::Float64 => QueryDecode::Float { bits: 64 },
            _ => {
                let (bits, signed) = scalar.integer_bits()?;
                QueryDecode::Int { bits, signed }
            }
        };
        Some(QueryParam {
            scalar,
            decode,
            list,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::users;

    #[test]
    fn routes_and_content_types() {
        let schemas = users();
        let users = schemas.iter().find(|s| s.file_name == "users").unwrap();
        let query = &users.query_services[0];
        let mutation = &users.mutation_services[0];

        assert_eq!(route_path(query, &query.methods[0]), "/Users/getUser");
        assert_eq!(route_path(mutation, &mutation.methods[0]), "/UserWrites/create");
        assert_eq!(request_content_type(&query.methods[0]), JSON_CONTENT_TYPE);
        assert_eq!(request_content_type(&mutation.methods[0]), CBOR_CONTENT_TYPE);
        assert_eq!(response_content_type(&mutation.methods[0]), CBOR_CONTENT_TYPE);
    }

    #[test]
    fn classify_query_params() {
        let int = QueryParam::classify(&DataType::Scalar(Scalar::Uint16)).unwrap();
        assert_eq!(int.decode, QueryDecode::Int { bits: 16, signed: false });
        assert!(!int.list);

        let list = QueryParam::classify(&DataType::list(DataType::Scalar(Scalar::Timestamp))).unwrap();
        assert_eq!(list.decode, QueryDecode::Timestamp);
        assert!(list.list);

        assert_eq!(QueryParam::classify(&DataType::Scalar(Scalar::Blob)), None);
        assert_eq!(QueryParam::classify(&DataType::DYNAMIC), None);
        assert_eq!(
            QueryParam::classify(&DataType::list(DataType::list(DataType::Scalar(Scalar::Int8)))),
            None
        );
    }

    #[test]
    fn error_names() {
        assert_eq!(status_error_name(404), "NotFound");
        assert_eq!(status_error_name(500), "InternalServerError");
        assert_eq!(status_error_name(507), "ServerError");
        assert_eq!(status_error_name(BAD_REQUEST_STATUS), BAD_REQUEST_ERROR);
    }
}
