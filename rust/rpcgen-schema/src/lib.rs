#![deny(unsafe_code)]

//! Intermediate representation for rpcgen schemas.
//!
//! # Design Philosophy
//!
//! The IR is a small, closed set of plain data types:
//!
//! - **[`DataType`]**: every type a field, parameter or return value can have
//! - **[`Message`], [`Service`], [`Method`]**: the declarations of a file
//! - **[`Schema`]**: one per source file, what code generators consume
//!
//! Everything is computed eagerly by [`lower`]: derived flags such as
//! [`Method::has_cbor_params`] or the HTTP status codes are plain fields, not
//! methods. IR values are never mutated after construction; each compiler run
//! builds a fresh set.
//!
//! Messages are referenced by name ([`DataType::Struct`]), never owned, so a
//! schema can describe recursive and cross-file types without cycles.

mod data_type;
pub mod lower;
mod schema;

pub use data_type::{DataType, Property, Scalar};
pub use lower::{lower_file, lower_project};
pub use schema::*;
