//! Tables: ordered, appendable sequences of rows of one declared type.

use std::io::{Read, Seek, Write};
use std::sync::Arc;

use crate::error::FormatError;
use crate::row::{Row, RowType};
use crate::section::{write_section, SectionScope};

/// Section tag wrapping each row inside a table section.  Constant and
/// identical for every row; distinct from field ids only by nesting
/// level.
pub const ROW_SECTION_ID: i32 = 1;

/// Resolved table declaration: name, outer section id, row layout.
#[derive(Debug)]
pub struct TableType {
    pub(crate) name: String,
    pub(crate) id: i32,
    pub(crate) row: Arc<RowType>,
}

impl TableType {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn id(&self) -> i32 {
        self.id
    }

    pub fn row_type(&self) -> &Arc<RowType> {
        &self.row
    }
}

/// One table instance.  Rows are appended by callers before save or
/// materialized by load; the table never inspects row content beyond
/// delegating encode/decode.
#[derive(Debug)]
pub struct Table {
    ty: Arc<TableType>,
    rows: Vec<Row>,
}

impl Table {
    pub(crate) fn new(ty: Arc<TableType>) -> Self {
        Self {
            ty,
            rows: Vec::new(),
        }
    }

    pub fn ty(&self) -> &Arc<TableType> {
        &self.ty
    }

    pub fn name(&self) -> &str {
        &self.ty.name
    }

    /// An empty row of this table's declared row type.
    pub fn new_row(&self) -> Row {
        Row::new(Arc::clone(&self.ty.row))
    }

    pub fn push(&mut self, row: Row) {
        self.rows.push(row);
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn rows_mut(&mut self) -> &mut [Row] {
        &mut self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Row> {
        self.rows.iter()
    }

    /// Write the table as one outer section tagged with its schema id,
    /// each row wrapped in its own [`ROW_SECTION_ID`] sub-section.
    pub fn save<W: Write>(&self, writer: &mut W) -> Result<(), FormatError> {
        let mut payload = Vec::new();
        for row in &self.rows {
            let body = row.encode()?;
            write_section(&mut payload, ROW_SECTION_ID, &body)?;
        }
        write_section(writer, self.ty.id, &payload)?;
        Ok(())
    }

    /// Replace this table's rows with the next table section of the
    /// stream.  Reads row sub-sections until the outer scope is
    /// exhausted.
    pub fn load<R: Read + Seek>(&mut self, reader: &mut R) -> Result<(), FormatError> {
        let mut scope = SectionScope::open(reader, self.ty.id)?;
        self.rows.clear();
        while scope.remaining()? > 0 {
            let mut row_scope = SectionScope::open(scope.stream(), ROW_SECTION_ID)?;
            let body = row_scope.read_payload()?;
            row_scope.close()?;
            self.rows
                .push(Row::decode(Arc::clone(&self.ty.row), &body)?);
        }
        scope.close()?;
        Ok(())
    }
}

/// Tables of different lengths are unequal by definition; equal-length
/// tables compare rows pairwise.
impl PartialEq for Table {
    fn eq(&self, other: &Self) -> bool {
        self.rows.len() == other.rows.len()
            && self.rows.iter().zip(&other.rows).all(|(a, b)| a == b)
    }
}
