pub mod codec;
pub mod composite;
pub mod database;
pub mod error;
pub mod row;
pub mod schema;
pub mod section;
pub mod table;

pub use codec::{
    BitArrayCodec, ByteCodec, Codec, CodecError, FloatCodec, ListCodec, ShortTextCodec,
    SignedLongCodec, TextCodec, UnsignedLongCodec, Value,
};
pub use composite::{
    resolve_composite_type, CompositeCodec, CompositeType, CompositeValue, FieldSlot,
    ResolvedLayout,
};
pub use database::{Database, DatabaseType, DATABASE_SECTION_ID, END_SENTINEL};
pub use error::FormatError;
pub use row::{Row, RowType};
pub use schema::{
    CompositeSpec, DatabaseSpec, FieldSpec, LayoutSpec, SchemaError, SchemaSet, TableSpec, TypeSpec,
};
pub use section::{read_exactly, write_section, write_section_header, SectionError, SectionScope};
pub use table::{Table, TableType, ROW_SECTION_ID};
