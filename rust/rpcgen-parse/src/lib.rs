#![deny(unsafe_code)]

//! Grammar and declaration extractor for rpcgen schema files.
//!
//! # This Is Just a Grammar
//!
//! This crate contains **only** the [pest] grammar for the TypeScript subset
//! that rpcgen schemas are written in, plus a few read-only helpers for
//! finding the declarations in a parsed file. It does not:
//!
//! - Decide what a type *means* (that is `rpcgen-schema`'s IR builder)
//! - Enforce the DSL's rules (that is `rpcgen-validate`)
//! - Generate any code
//!
//! It simply parses files like:
//!
//! ```ts
//! import { t, Msg, QuerySvc } from '@rpcgen/types'
//!
//! export type User = Msg<{ id: t.int64; nick?: t.string }>
//!
//! type Users = QuerySvc<{
//!   /** @throws 404 */
//!   getUser(id: t.int64): User
//! }>
//! ```
//!
//! ...and produces a [`SourceFile`] that downstream crates inspect.
//!
//! Statements the DSL forbids (functions, classes, loops, default exports,
//! and so on) are still accepted by the grammar and kept as nodes, so the
//! validator can point at them. Only text the grammar cannot make sense of at
//! all is a [`ParseError`].
//!
//! # The Bigger Picture
//!
//! ```text
//! rpcgen-parse        rpcgen-validate          rpcgen-schema          rpcgen-codegen
//! ┌────────────┐     ┌──────────────┐         ┌──────────────┐       ┌──────────────┐
//! │  pest      │────▶│  diagnostics │         │  IR + lower  │──────▶│  builders    │
//! │  grammar   │──┬─▶│              │         │              │       │  TS, Go, Rust│
//! └────────────┘  │  └──────────────┘         └──────────────┘       └──────────────┘
//!                 └──────────────────────────────────▲
//! ```
//!
//! [pest]: https://docs.rs/pest

pub mod ast;
mod error;
pub mod extract;
mod parser;
mod project;

pub use ast::*;
pub use error::ParseError;
pub use extract::{
    BUILTIN_MODULE, ContainerKind, DeclTag, Declaration, TYPES_NAMESPACE, is_namespaced,
    strip_types_namespace,
};
pub use parser::parse_file;
pub use project::{ModuleResolution, Project};
