//! Tabular input: the shared in-memory table and the delimited-file loader.

mod parser;
mod source;

pub use parser::{Parser, ParserConfig};
pub use source::{DataTable, SourceMetadata};
