//! Section framing — the TLV envelope every structured chunk lives in.
//!
//! A section is an 8-byte little-endian header (`id: i32`, `length: u32`)
//! followed by exactly `length` payload bytes.  Sections nest: a table
//! section contains row sections, a row section contains field sections.
//!
//! [`SectionScope`] is the bounded reader for one section.  It validates
//! the header id, remembers where the payload ends, and on [`close`]
//! seeks the stream to that end offset no matter how much the body
//! consumer actually read.  Siblings therefore always start from a
//! deterministic position.
//!
//! [`close`]: SectionScope::close

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{self, Read, Seek, SeekFrom, Write};
use thiserror::Error;

/// Size of the section header on the wire (id + length).
pub const SECTION_HEADER_SIZE: usize = 8;

#[derive(Error, Debug)]
pub enum SectionError {
    #[error("Unexpected section id: expected {expected}, found {found}")]
    UnexpectedId { expected: i32, found: i32 },
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Write a section header: `id` then payload `length`, both little-endian.
pub fn write_section_header<W: Write>(writer: &mut W, id: i32, length: u32) -> io::Result<()> {
    writer.write_i32::<LittleEndian>(id)?;
    writer.write_u32::<LittleEndian>(length)?;
    Ok(())
}

/// Write a complete section: header plus payload.
pub fn write_section<W: Write>(writer: &mut W, id: i32, payload: &[u8]) -> io::Result<()> {
    write_section_header(writer, id, payload.len() as u32)?;
    writer.write_all(payload)?;
    Ok(())
}

/// Read exactly `n` bytes. Short input surfaces as `UnexpectedEof`;
/// no partial buffer is ever returned.
pub fn read_exactly<R: Read>(reader: &mut R, n: usize) -> io::Result<Vec<u8>> {
    let mut buf = vec![0u8; n];
    reader.read_exact(&mut buf)?;
    Ok(buf)
}

/// Bounded-read scope over one section.
///
/// Opening a scope consumes the header and pins the payload's absolute
/// end offset.  Nested scopes borrow the same stream via [`stream`];
/// when this scope is [`close`]d the cursor lands exactly on `end_pos`,
/// skipping any unconsumed payload bytes.
///
/// [`stream`]: SectionScope::stream
/// [`close`]: SectionScope::close
pub struct SectionScope<'a, R: Read + Seek> {
    stream: &'a mut R,
    size: u32,
    end_pos: u64,
}

impl<'a, R: Read + Seek> SectionScope<'a, R> {
    /// Read the next section header and validate its id.
    pub fn open(stream: &'a mut R, expected_id: i32) -> Result<Self, SectionError> {
        let id = stream.read_i32::<LittleEndian>()?;
        let size = stream.read_u32::<LittleEndian>()?;
        if id != expected_id {
            return Err(SectionError::UnexpectedId {
                expected: expected_id,
                found: id,
            });
        }
        let end_pos = stream.stream_position()? + size as u64;
        Ok(Self {
            stream,
            size,
            end_pos,
        })
    }

    /// Declared payload length in bytes.
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Absolute stream offset of the first byte after this section.
    pub fn end_pos(&self) -> u64 {
        self.end_pos
    }

    /// Unread payload bytes between the cursor and `end_pos`.
    pub fn remaining(&mut self) -> Result<u64, SectionError> {
        let pos = self.stream.stream_position()?;
        Ok(self.end_pos.saturating_sub(pos))
    }

    /// Read all payload bytes from the cursor to the section end.
    pub fn read_payload(&mut self) -> Result<Vec<u8>, SectionError> {
        let n = self.remaining()? as usize;
        Ok(read_exactly(self.stream, n)?)
    }

    /// The underlying stream, for opening nested scopes.
    pub fn stream(&mut self) -> &mut R {
        self.stream
    }

    /// Leave the scope, seeking the stream to the section's end offset
    /// regardless of how much of the payload was consumed.
    pub fn close(self) -> Result<(), SectionError> {
        self.stream.seek(SeekFrom::Start(self.end_pos))?;
        Ok(())
    }
}
