//! Declarative schema documents.
//!
//! A schema document is plain data: it names a database, its tables,
//! each table's row fields, and any custom composite types, and it
//! drives both encoding and decoding without per-format parser code.
//! Documents are serde types and can be loaded from JSON with
//! [`SchemaSet::from_json`].
//!
//! [`SchemaSet`] is the registry: an immutable, ordered collection of
//! database documents built once at startup and consulted by name at
//! [`Database`] construction.  Nothing here performs I/O or owns codecs;
//! resolution into runnable codecs lives in [`crate::composite`].
//!
//! [`Database`]: crate::database::Database

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("No schema registered for database '{0}'")]
    UnknownDatabase(String),
    #[error("Unknown custom type '{0}'")]
    UnknownType(String),
    #[error("Malformed type name '{0}'")]
    BadTypeSuffix(String),
    #[error("Duplicate field id {id} in '{owner}'")]
    DuplicateFieldId { owner: String, id: i32 },
    #[error("Duplicate field name '{name}' in '{owner}'")]
    DuplicateFieldName { owner: String, name: String },
    #[error("Duplicate table id {id} in database '{database}'")]
    DuplicateTableId { database: String, id: i32 },
    #[error("Custom type cycle through '{0}'")]
    RecursiveType(String),
    #[error("Bit array count {0} is outside 1..=32")]
    BadBitCount(usize),
    #[error("Schema document error: {0}")]
    Document(#[from] serde_json::Error),
}

// ── Document types ───────────────────────────────────────────────────────────

/// A field's declared codec.  `Named` refers to a custom composite type
/// registered in the owning database document and may carry a repeat
/// suffix (`"Gear"`, `"Gear[]"`, `"Gear[3]"`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeSpec {
    Float,
    SignedLong,
    UnsignedLong,
    Byte,
    Text,
    ShortText,
    Bits {
        count: usize,
    },
    List {
        elem: Box<TypeSpec>,
        #[serde(default)]
        count: Option<usize>,
    },
    Named {
        name: String,
    },
}

/// Ordered field descriptor: name, wire id, codec.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    pub id: i32,
    #[serde(rename = "type")]
    pub ty: TypeSpec,
}

/// The two composite layouts.  `Fields` frames every sub-field in its
/// own section; `Grouped` hands all named sub-values to one base codec
/// in a single call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutSpec {
    Fields(Vec<FieldSpec>),
    Grouped { names: Vec<String>, base: TypeSpec },
}

/// A custom composite type document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeSpec {
    pub name: String,
    pub layout: LayoutSpec,
}

/// A table document: row layout plus the numeric id used as the
/// table's outer section tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSpec {
    pub name: String,
    pub id: i32,
    pub fields: Vec<FieldSpec>,
}

/// A database document: the registered custom-type table and the fixed,
/// ordered table list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseSpec {
    pub name: String,
    #[serde(default)]
    pub types: Vec<CompositeSpec>,
    pub tables: Vec<TableSpec>,
}

impl DatabaseSpec {
    /// Look up a custom composite type by its bare name (no suffix).
    pub fn composite(&self, name: &str) -> Option<&CompositeSpec> {
        self.types.iter().find(|t| t.name == name)
    }
}

// ── Registry ─────────────────────────────────────────────────────────────────

/// Immutable, ordered collection of database documents.  Built once at
/// startup; lookups never mutate it.
#[derive(Debug, Clone, Default)]
pub struct SchemaSet {
    databases: Vec<Arc<DatabaseSpec>>,
}

impl SchemaSet {
    pub fn new(databases: impl IntoIterator<Item = DatabaseSpec>) -> Self {
        Self {
            databases: databases.into_iter().map(Arc::new).collect(),
        }
    }

    /// Load a registry from a JSON array of database documents.
    pub fn from_json(json: &str) -> Result<Self, SchemaError> {
        let databases: Vec<DatabaseSpec> = serde_json::from_str(json)?;
        Ok(Self::new(databases))
    }

    pub fn database(&self, name: &str) -> Result<&Arc<DatabaseSpec>, SchemaError> {
        self.databases
            .iter()
            .find(|d| d.name == name)
            .ok_or_else(|| SchemaError::UnknownDatabase(name.to_owned()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<DatabaseSpec>> {
        self.databases.iter()
    }
}

// ── Type-name suffix syntax ──────────────────────────────────────────────────

/// Repeat marker parsed from a named type's suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Repeat {
    /// `"Gear"` — a single value.
    Single,
    /// `"Gear[]"` — a list of any length.
    Many,
    /// `"Gear[3]"` — a list of exactly N elements.
    Exactly(usize),
}

/// Split a named type reference into its bare name and repeat marker.
pub fn parse_type_name(spec: &str) -> Result<(&str, Repeat), SchemaError> {
    let malformed = || SchemaError::BadTypeSuffix(spec.to_owned());
    match spec.find('[') {
        None => {
            if spec.is_empty() {
                return Err(malformed());
            }
            Ok((spec, Repeat::Single))
        }
        Some(open) => {
            let name = &spec[..open];
            let rest = &spec[open + 1..];
            let inner = rest.strip_suffix(']').ok_or_else(malformed)?;
            if name.is_empty() || inner.contains('[') {
                return Err(malformed());
            }
            if inner.is_empty() {
                return Ok((name, Repeat::Many));
            }
            let count: usize = inner.parse().map_err(|_| malformed())?;
            Ok((name, Repeat::Exactly(count)))
        }
    }
}
