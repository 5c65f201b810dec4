//! The root container: a schema-declared sequence of tables framed in
//! one outer section and terminated by a fixed sentinel.
//!
//! A [`Database`] is constructed against a resolved [`DatabaseType`] —
//! every declared table exists from construction on, and the table set
//! never changes for the object's lifetime.  `save` and `load` are
//! whole-file, single-pass operations; there is no partial
//! materialization and no recovery from a malformed file.

use std::io::{Read, Seek, Write};
use std::sync::Arc;

use crate::composite::{resolve_composite_type, resolve_field_slots, CompositeType};
use crate::error::FormatError;
use crate::row::RowType;
use crate::schema::{DatabaseSpec, SchemaError, SchemaSet};
use crate::section::{read_exactly, write_section, SectionScope};
use crate::table::{Table, TableType};

/// Outer section tag of every database file.
pub const DATABASE_SECTION_ID: i32 = 1;

/// Trailing end-of-database marker, written unframed after the outer
/// section and compared exactly on load.
pub const END_SENTINEL: [u8; 10] = *b"SECTAB-END";

/// A resolved database declaration: the fixed, ordered table list with
/// every field codec already constructed.
#[derive(Debug)]
pub struct DatabaseType {
    name: String,
    composites: Vec<Arc<CompositeType>>,
    tables: Vec<Arc<TableType>>,
}

impl DatabaseType {
    /// Resolve a schema document into runnable table types.  All schema
    /// validation happens here; a type that resolves can always encode.
    pub fn resolve(spec: &DatabaseSpec) -> Result<Arc<Self>, SchemaError> {
        let mut composites = Vec::with_capacity(spec.types.len());
        for ty in &spec.types {
            composites.push(resolve_composite_type(&ty.name, &spec.types)?);
        }
        let mut tables = Vec::with_capacity(spec.tables.len());
        for (i, table) in spec.tables.iter().enumerate() {
            if spec.tables[..i].iter().any(|t| t.id == table.id) {
                return Err(SchemaError::DuplicateTableId {
                    database: spec.name.clone(),
                    id: table.id,
                });
            }
            let slots = resolve_field_slots(&table.name, &table.fields, &spec.types)?;
            tables.push(Arc::new(TableType {
                name: table.name.clone(),
                id: table.id,
                row: Arc::new(RowType::new(table.name.clone(), slots)),
            }));
        }
        Ok(Arc::new(Self {
            name: spec.name.clone(),
            composites,
            tables,
        }))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tables(&self) -> &[Arc<TableType>] {
        &self.tables
    }

    /// A registered custom composite type, for building field values.
    pub fn composite(&self, name: &str) -> Option<&Arc<CompositeType>> {
        self.composites.iter().find(|c| c.name() == name)
    }
}

/// One database instance.
#[derive(Debug)]
pub struct Database {
    ty: Arc<DatabaseType>,
    tables: Vec<Table>,
}

impl Database {
    /// Construct with every declared table present and empty.
    pub fn new(ty: Arc<DatabaseType>) -> Self {
        let tables = ty.tables.iter().map(|t| Table::new(Arc::clone(t))).collect();
        Self { ty, tables }
    }

    /// Look the database name up in the registry, resolve its schema
    /// document, and construct.  A name with no document fails here and
    /// the object never exists.
    pub fn from_registry(set: &SchemaSet, name: &str) -> Result<Self, SchemaError> {
        let spec = set.database(name)?;
        Ok(Self::new(DatabaseType::resolve(spec)?))
    }

    pub fn ty(&self) -> &Arc<DatabaseType> {
        &self.ty
    }

    pub fn name(&self) -> &str {
        &self.ty.name
    }

    /// Declared tables in schema order.
    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    pub fn tables_mut(&mut self) -> &mut [Table] {
        &mut self.tables
    }

    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name() == name)
    }

    pub fn table_mut(&mut self, name: &str) -> Option<&mut Table> {
        self.tables.iter_mut().find(|t| t.name() == name)
    }

    /// Serialize the whole database: outer section, each table in
    /// declared order, then the unframed sentinel.
    pub fn save<W: Write>(&self, writer: &mut W) -> Result<(), FormatError> {
        let mut payload = Vec::new();
        for table in &self.tables {
            table.save(&mut payload)?;
        }
        write_section(writer, DATABASE_SECTION_ID, &payload)?;
        writer.write_all(&END_SENTINEL)?;
        Ok(())
    }

    /// Serialize into a fresh buffer.
    pub fn save_to_vec(&self) -> Result<Vec<u8>, FormatError> {
        let mut buf = Vec::new();
        self.save(&mut buf)?;
        Ok(buf)
    }

    /// Populate the whole object graph from a stream in one pass.
    /// The trailing sentinel must match exactly; anything else is
    /// surfaced as file corruption.
    pub fn load<R: Read + Seek>(&mut self, reader: &mut R) -> Result<(), FormatError> {
        let mut scope = SectionScope::open(reader, DATABASE_SECTION_ID)?;
        for table in &mut self.tables {
            table.load(scope.stream())?;
        }
        scope.close()?;

        let tail = read_exactly(reader, END_SENTINEL.len())?;
        if tail != END_SENTINEL {
            return Err(FormatError::SentinelMismatch {
                expected: hex::encode(END_SENTINEL),
                found: hex::encode(&tail),
            });
        }
        Ok(())
    }

    /// Populate from an in-memory buffer.
    pub fn load_from_slice(&mut self, bytes: &[u8]) -> Result<(), FormatError> {
        let mut cur = std::io::Cursor::new(bytes);
        self.load(&mut cur)
    }
}

/// Pairwise table equality over the declared order.
impl PartialEq for Database {
    fn eq(&self, other: &Self) -> bool {
        self.tables.len() == other.tables.len()
            && self.tables.iter().zip(&other.tables).all(|(a, b)| a == b)
    }
}
