//! Schema-bound table rows.
//!
//! A [`Row`] is a record with one slot per field descriptor in its
//! table's row schema, in declared order.  On the wire a row body is a
//! field list: one section per field, tagged with the field's declared
//! id — identical to the field-list composite layout.

use std::io::Cursor;
use std::sync::Arc;

use crate::codec::{CodecError, Value};
use crate::composite::{decode_field_list, encode_field_list, FieldSlot};
use crate::error::FormatError;

/// Resolved row layout of one table, shared by all its rows.
#[derive(Debug)]
pub struct RowType {
    table: String,
    slots: Vec<FieldSlot>,
}

impl RowType {
    pub(crate) fn new(table: String, slots: Vec<FieldSlot>) -> Self {
        Self { table, slots }
    }

    /// Name of the table this row layout belongs to.
    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn slots(&self) -> &[FieldSlot] {
        &self.slots
    }
}

/// One record.  Slots start `Null` and must all be set before save.
#[derive(Clone)]
pub struct Row {
    ty: Arc<RowType>,
    values: Vec<Value>,
}

impl Row {
    pub fn new(ty: Arc<RowType>) -> Self {
        let values = vec![Value::Null; ty.slots.len()];
        Self { ty, values }
    }

    pub fn ty(&self) -> &Arc<RowType> {
        &self.ty
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        let index = self.ty.slots.iter().position(|s| s.name == field)?;
        Some(&self.values[index])
    }

    pub fn set(&mut self, field: &str, value: impl Into<Value>) -> Result<(), FormatError> {
        let index = self
            .ty
            .slots
            .iter()
            .position(|s| s.name == field)
            .ok_or_else(|| FormatError::UnknownField(field.to_owned()))?;
        self.values[index] = value.into();
        Ok(())
    }

    /// Encode the row body: every field section in declared order.
    pub(crate) fn encode(&self) -> Result<Vec<u8>, CodecError> {
        encode_field_list(&self.ty.slots, &self.values)
    }

    /// Decode a row body produced by [`Row::encode`].
    pub(crate) fn decode(ty: Arc<RowType>, bytes: &[u8]) -> Result<Self, CodecError> {
        let mut cur = Cursor::new(bytes);
        let values = decode_field_list(&ty.slots, &mut cur)?;
        Ok(Self { ty, values })
    }
}

impl std::fmt::Debug for Row {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut s = f.debug_struct("Row");
        for (slot, value) in self.ty.slots.iter().zip(&self.values) {
            s.field(&slot.name, value);
        }
        s.finish()
    }
}

/// Pairwise NaN-tolerant field equality.
impl PartialEq for Row {
    fn eq(&self, other: &Self) -> bool {
        self.values == other.values
    }
}
