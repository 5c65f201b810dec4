//! Custom composite types and schema resolution.
//!
//! Resolution turns the plain-data documents of [`crate::schema`] into
//! runnable codecs exactly once, at database construction.  A resolved
//! composite is one of two closed layouts:
//!
//! - [`ResolvedLayout::FieldList`] — every sub-field independently
//!   section-framed under its declared id, in declared order.
//! - [`ResolvedLayout::Grouped`] — all named sub-values handed to one
//!   shared base codec in a single call (the packed bit-array case).
//!
//! [`CompositeValue`] is the instance: named slots over a shared
//! [`CompositeType`], `Null` until assigned.

use std::fmt;
use std::io::{Cursor, Read, Seek};
use std::sync::Arc;

use crate::codec::{
    BitArrayCodec, ByteCodec, Codec, CodecError, FloatCodec, ListCodec, ShortTextCodec,
    SignedLongCodec, TextCodec, UnsignedLongCodec, Value,
};
use crate::error::FormatError;
use crate::schema::{
    parse_type_name, CompositeSpec, FieldSpec, Repeat, SchemaError, TypeSpec,
};
use crate::section::{write_section, SectionScope};

// ── Resolved model ───────────────────────────────────────────────────────────

/// One resolved field: the statically-known slot a decoded value lands in.
pub struct FieldSlot {
    pub name: String,
    pub id: i32,
    pub codec: Arc<dyn Codec>,
}

impl fmt::Debug for FieldSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldSlot")
            .field("name", &self.name)
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

pub enum ResolvedLayout {
    FieldList(Vec<FieldSlot>),
    Grouped {
        names: Vec<String>,
        base: Arc<dyn Codec>,
    },
}

impl fmt::Debug for ResolvedLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolvedLayout::FieldList(slots) => {
                f.debug_tuple("FieldList").field(slots).finish()
            }
            ResolvedLayout::Grouped { names, .. } => f
                .debug_struct("Grouped")
                .field("names", names)
                .finish_non_exhaustive(),
        }
    }
}

/// A resolved custom composite type, shared by every instance.
#[derive(Debug)]
pub struct CompositeType {
    name: String,
    layout: ResolvedLayout,
}

impl CompositeType {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn layout(&self) -> &ResolvedLayout {
        &self.layout
    }

    /// Field names in declared order, for either layout.
    pub fn field_names(&self) -> Vec<&str> {
        match &self.layout {
            ResolvedLayout::FieldList(slots) => slots.iter().map(|s| s.name.as_str()).collect(),
            ResolvedLayout::Grouped { names, .. } => names.iter().map(String::as_str).collect(),
        }
    }

    fn slot_count(&self) -> usize {
        match &self.layout {
            ResolvedLayout::FieldList(slots) => slots.len(),
            ResolvedLayout::Grouped { names, .. } => names.len(),
        }
    }

    fn slot_index(&self, field: &str) -> Option<usize> {
        match &self.layout {
            ResolvedLayout::FieldList(slots) => slots.iter().position(|s| s.name == field),
            ResolvedLayout::Grouped { names, .. } => names.iter().position(|n| n == field),
        }
    }
}

// ── Composite instances ──────────────────────────────────────────────────────

/// One value of a custom composite type: named slots, `Null` until set.
#[derive(Clone)]
pub struct CompositeValue {
    ty: Arc<CompositeType>,
    values: Vec<Value>,
}

impl CompositeValue {
    pub fn new(ty: &Arc<CompositeType>) -> Self {
        Self {
            ty: Arc::clone(ty),
            values: vec![Value::Null; ty.slot_count()],
        }
    }

    pub(crate) fn from_values(ty: Arc<CompositeType>, values: Vec<Value>) -> Self {
        Self { ty, values }
    }

    pub fn ty(&self) -> &Arc<CompositeType> {
        &self.ty
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.ty.slot_index(field).map(|i| &self.values[i])
    }

    pub fn set(&mut self, field: &str, value: impl Into<Value>) -> Result<(), FormatError> {
        let index = self
            .ty
            .slot_index(field)
            .ok_or_else(|| FormatError::UnknownField(field.to_owned()))?;
        self.values[index] = value.into();
        Ok(())
    }
}

impl std::fmt::Debug for CompositeValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut s = f.debug_struct(&self.ty.name);
        for (name, value) in self.ty.field_names().iter().zip(&self.values) {
            s.field(name, value);
        }
        s.finish()
    }
}

/// Same declared type, pairwise NaN-tolerant field equality.
impl PartialEq for CompositeValue {
    fn eq(&self, other: &Self) -> bool {
        self.ty.name == other.ty.name && self.values == other.values
    }
}

// ── Composite codec ──────────────────────────────────────────────────────────

/// [`Codec`] implementation over a resolved composite type.
pub struct CompositeCodec {
    ty: Arc<CompositeType>,
}

impl CompositeCodec {
    pub fn new(ty: Arc<CompositeType>) -> Self {
        Self { ty }
    }

    pub fn ty(&self) -> &Arc<CompositeType> {
        &self.ty
    }
}

impl Codec for CompositeCodec {
    fn encode(&self, value: &Value) -> Result<Vec<u8>, CodecError> {
        let cv = value.as_composite().ok_or(CodecError::WrongType {
            expected: "composite",
            found: value.kind(),
        })?;
        if cv.ty.name != self.ty.name {
            return Err(CodecError::WrongComposite {
                expected: self.ty.name.clone(),
                found: cv.ty.name.clone(),
            });
        }
        match &self.ty.layout {
            ResolvedLayout::FieldList(slots) => encode_field_list(slots, &cv.values),
            ResolvedLayout::Grouped { names, base } => {
                for (name, value) in names.iter().zip(&cv.values) {
                    if matches!(value, Value::Null) {
                        return Err(CodecError::MissingField(name.clone()));
                    }
                }
                base.encode(&Value::List(cv.values.clone()))
            }
        }
    }

    fn decode(&self, bytes: &[u8]) -> Result<Value, CodecError> {
        let values = match &self.ty.layout {
            ResolvedLayout::FieldList(slots) => {
                let mut cur = Cursor::new(bytes);
                decode_field_list(slots, &mut cur)?
            }
            ResolvedLayout::Grouped { names, base } => {
                let decoded = base.decode(bytes)?;
                let items = match decoded {
                    Value::List(items) => items,
                    other => {
                        return Err(CodecError::WrongType {
                            expected: "list",
                            found: other.kind(),
                        })
                    }
                };
                if items.len() != names.len() {
                    return Err(CodecError::WrongCount {
                        expected: names.len(),
                        found: items.len(),
                    });
                }
                items
            }
        };
        Ok(Value::Composite(CompositeValue::from_values(
            Arc::clone(&self.ty),
            values,
        )))
    }

    fn fixed_width(&self) -> Option<usize> {
        match &self.ty.layout {
            ResolvedLayout::FieldList(_) => None,
            ResolvedLayout::Grouped { base, .. } => base.fixed_width(),
        }
    }
}

// ── Field-list wire helpers (shared with rows) ───────────────────────────────

/// One section per slot, tagged with the slot's id, in declared order.
pub(crate) fn encode_field_list(
    slots: &[FieldSlot],
    values: &[Value],
) -> Result<Vec<u8>, CodecError> {
    let mut out = Vec::new();
    for (slot, value) in slots.iter().zip(values) {
        if matches!(value, Value::Null) {
            return Err(CodecError::MissingField(slot.name.clone()));
        }
        let payload = slot.codec.encode(value)?;
        write_section(&mut out, slot.id, &payload)?;
    }
    Ok(out)
}

/// Open and validate one scope per slot, in declared order.
pub(crate) fn decode_field_list<R: Read + Seek>(
    slots: &[FieldSlot],
    stream: &mut R,
) -> Result<Vec<Value>, CodecError> {
    let mut values = Vec::with_capacity(slots.len());
    for slot in slots {
        let mut scope = SectionScope::open(stream, slot.id)?;
        let payload = scope.read_payload()?;
        scope.close()?;
        values.push(slot.codec.decode(&payload)?);
    }
    Ok(values)
}

// ── Resolution ───────────────────────────────────────────────────────────────

struct Resolver<'a> {
    types: &'a [CompositeSpec],
}

impl Resolver<'_> {
    fn resolve_type(
        &self,
        spec: &TypeSpec,
        stack: &mut Vec<String>,
    ) -> Result<Arc<dyn Codec>, SchemaError> {
        let codec: Arc<dyn Codec> = match spec {
            TypeSpec::Float => Arc::new(FloatCodec),
            TypeSpec::SignedLong => Arc::new(SignedLongCodec),
            TypeSpec::UnsignedLong => Arc::new(UnsignedLongCodec),
            TypeSpec::Byte => Arc::new(ByteCodec),
            TypeSpec::Text => Arc::new(TextCodec),
            TypeSpec::ShortText => Arc::new(ShortTextCodec),
            TypeSpec::Bits { count } => {
                if !(1..=32).contains(count) {
                    return Err(SchemaError::BadBitCount(*count));
                }
                Arc::new(BitArrayCodec::new(*count))
            }
            TypeSpec::List { elem, count } => {
                let elem = self.resolve_type(elem, stack)?;
                match count {
                    Some(n) => Arc::new(ListCodec::with_count(elem, *n)),
                    None => Arc::new(ListCodec::new(elem)),
                }
            }
            TypeSpec::Named { name } => {
                let (bare, repeat) = parse_type_name(name)?;
                let ty = self.resolve_composite(bare, stack)?;
                let codec: Arc<dyn Codec> = Arc::new(CompositeCodec::new(ty));
                match repeat {
                    Repeat::Single => codec,
                    Repeat::Many => Arc::new(ListCodec::new(codec)),
                    Repeat::Exactly(n) => Arc::new(ListCodec::with_count(codec, n)),
                }
            }
        };
        Ok(codec)
    }

    fn resolve_composite(
        &self,
        name: &str,
        stack: &mut Vec<String>,
    ) -> Result<Arc<CompositeType>, SchemaError> {
        if stack.iter().any(|n| n == name) {
            return Err(SchemaError::RecursiveType(name.to_owned()));
        }
        let spec = self
            .types
            .iter()
            .find(|t| t.name == name)
            .ok_or_else(|| SchemaError::UnknownType(name.to_owned()))?;

        stack.push(name.to_owned());
        let layout = match &spec.layout {
            crate::schema::LayoutSpec::Fields(fields) => {
                ResolvedLayout::FieldList(self.resolve_slots(name, fields, stack)?)
            }
            crate::schema::LayoutSpec::Grouped { names, base } => ResolvedLayout::Grouped {
                names: names.clone(),
                base: self.resolve_type(base, stack)?,
            },
        };
        stack.pop();

        Ok(Arc::new(CompositeType {
            name: name.to_owned(),
            layout,
        }))
    }

    fn resolve_slots(
        &self,
        owner: &str,
        fields: &[FieldSpec],
        stack: &mut Vec<String>,
    ) -> Result<Vec<FieldSlot>, SchemaError> {
        for (i, field) in fields.iter().enumerate() {
            if fields[..i].iter().any(|f| f.id == field.id) {
                return Err(SchemaError::DuplicateFieldId {
                    owner: owner.to_owned(),
                    id: field.id,
                });
            }
            if fields[..i].iter().any(|f| f.name == field.name) {
                return Err(SchemaError::DuplicateFieldName {
                    owner: owner.to_owned(),
                    name: field.name.clone(),
                });
            }
        }
        fields
            .iter()
            .map(|field| {
                Ok(FieldSlot {
                    name: field.name.clone(),
                    id: field.id,
                    codec: self.resolve_type(&field.ty, stack)?,
                })
            })
            .collect()
    }
}

/// Resolve an ordered field list against a document's custom-type table.
pub(crate) fn resolve_field_slots(
    owner: &str,
    fields: &[FieldSpec],
    types: &[CompositeSpec],
) -> Result<Vec<FieldSlot>, SchemaError> {
    Resolver { types }.resolve_slots(owner, fields, &mut Vec::new())
}

/// Resolve one custom composite type by bare name.
pub fn resolve_composite_type(
    name: &str,
    types: &[CompositeSpec],
) -> Result<Arc<CompositeType>, SchemaError> {
    Resolver { types }.resolve_composite(name, &mut Vec::new())
}
