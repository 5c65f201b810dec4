use std::io;
use thiserror::Error;

use crate::codec::CodecError;
use crate::schema::SchemaError;
use crate::section::SectionError;

/// Crate-level error for container operations (row/table/database
/// save and load, by-name field access).
#[derive(Error, Debug)]
pub enum FormatError {
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),
    #[error("Section error: {0}")]
    Section(#[from] SectionError),
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("No field named '{0}'")]
    UnknownField(String),
    #[error("End-of-database sentinel mismatch: expected {expected}, found {found}")]
    SentinelMismatch { expected: String, found: String },
}
