//! Delimited-text layer: tokenizing and emitting rows, independent of field
//! semantics, plus the fixed single-byte file encoding.

mod dialect;
pub mod encoding;
mod reader;
mod writer;

pub use dialect::Dialect;
pub use reader::{Row, RowReader, read_rows};
pub use writer::{needs_quotes, write_field, write_row};
