#![deny(unsafe_code)]

//! Code generation for rpcgen schemas.
//!
//! # Where the Output Comes From
//!
//! `rpcgen-schema` turns validated schema files into [`Schema`] values. This
//! crate renders those into HTTP routing code for:
//!
//! - **TypeScript**: a `fetch` client and an `express` server
//! - **Go**: a `net/http` client and a `chi` server
//! - **Rust**: a `reqwest` client and an `axum` server
//!
//! Every target is a [`Builder`]: a pure function from `&[Schema]` to a list
//! of [`Code`] files. Builders hold no state, so the driver can run any number
//! of them in parallel over the same schemas.
//!
//! # The Wire Contract
//!
//! Clients and servers of every language interoperate. The contract they
//! share lives in [`wire`]: route paths, content types, the `{ data }`
//! success envelope, the `{ code, cause, msg, error }` error body, and how
//! query parameters are spelled.
//!
//! ```text
//! Schema[]  →  Builder::build  →  Code { file_name, source }[]
//!              ├── <schema>.ts / .go / .rs   (one per schema file)
//!              ├── rpc.*                     (wire types shared by both sides)
//!              └── rpc_client.* | rpc_server.*
//! ```

use std::fmt;

pub use rpcgen_schema::Schema;

pub mod code_writer;
mod registry;
mod render;
pub mod targets;
pub mod wire;

pub use registry::BuilderRegistry;

/// Output language of a builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    TypeScript,
    Go,
    Rust,
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Language::TypeScript => "typescript",
            Language::Go => "go",
            Language::Rust => "rust",
        })
    }
}

/// Which side of a call the generated code sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Client,
    Server,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Direction::Client => "client",
            Direction::Server => "server",
        })
    }
}

/// What a builder produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Target {
    pub language: Language,
    pub framework: &'static str,
    pub direction: Direction,
}

/// One generated file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Code {
    /// Path relative to the output directory.
    pub file_name: String,
    pub source: String,
}

#[derive(Debug, thiserror::Error)]
pub enum CodegenError {
    /// The target has no representation for a type in this position.
    #[error("{language}: cannot represent `{ty}` as {position}")]
    Unsupported {
        language: Language,
        ty: String,
        position: String,
    },

    #[error("failed to write generated code")]
    Fmt(#[from] fmt::Error),
}

impl CodegenError {
    pub(crate) fn unsupported(
        language: Language,
        ty: &rpcgen_schema::DataType,
        position: impl Into<String>,
    ) -> Self {
        CodegenError::Unsupported {
            language,
            ty: render::describe(ty),
            position: position.into(),
        }
    }
}

/// A code generator for one target.
pub trait Builder: Send + Sync {
    /// Name used to select the builder in configuration, e.g. `ts.fetch-client`.
    fn name(&self) -> &'static str;

    fn target(&self) -> Target;

    /// Render every schema. Fails only if a type has no mapping in this target.
    fn build(&self, schemas: &[Schema]) -> Result<Vec<Code>, CodegenError>;
}

#[cfg(test)]
pub(crate) mod test_util {
    use rpcgen_parse::Project;
    use rpcgen_schema::{Schema, lower_project};

    pub fn schemas(sources: &[(&str, &str)]) -> Vec<Schema> {
        let project = Project::parse(sources.iter().copied());
        assert!(project.failures().is_empty(), "{:?}", project.failures());
        lower_project(&project, "api")
    }

    pub fn file<'a>(codes: &'a [crate::Code], name: &str) -> &'a str {
        codes
            .iter()
            .find(|c| c.file_name == name)
            .map(|c| c.source.as_str())
            .unwrap_or_else(|| panic!("no generated file named {name}"))
    }

    pub const USERS: &str = r#"
import { t, Msg, QuerySvc, MutationSvc } from '@rpcgen/types'
import { Address } from './address'

/** A registered user. */
export type User = Msg<{
  id: t.int64
  name: t.string
  nick?: t.string
  tags: t.List<t.string>
  scores: t.Dict<t.string, t.float64>
  pair: t.Tuple2<t.int8, t.bool>
  home: Address
  meta: { created: t.timestamp; note?: t.string }
  either: [t.int32, t.string]
  avatar?: t.blob
}>

type Users = QuerySvc<{
  /**
   * Look up one user.
   * @throws 404
   */
  getUser(id: t.int64): User
  listUsers(ids: t.List<t.int64>, active?: t.bool, since?: t.timestamp): t.List<User>
  /** @access internal */
  count(): t.uint32
}>

/** @kind cbor */
type UserWrites = MutationSvc<{
  /** @returns 201 */
  create(name: t.string, nick?: t.string): User
  purge(): t.unit
}>
"#;

    pub const ADDRESS: &str = r#"
export type Address = Msg<{ street: t.string; zip?: t.string }>
"#;

    pub fn users() -> Vec<Schema> {
        schemas(&[("users.ts", USERS), ("address.ts", ADDRESS)])
    }
}
