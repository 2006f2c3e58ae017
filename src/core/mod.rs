//! Field schema, type codecs and the error taxonomy.
//!
//! This module knows the version-9 column layouts and how each semantic type
//! is spelled in the file, but nothing about rows or documents.

pub mod codec;
mod error;
mod schema;

pub use codec::FieldValue;
pub use error::*;
pub use schema::*;
