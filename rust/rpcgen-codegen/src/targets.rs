//! One module per output language, each with a client and a server builder.

pub mod go;
pub mod rust;
pub mod typescript;
