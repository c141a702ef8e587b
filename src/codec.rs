//! Record Codec
//!
//! Binary encoding shared by the WAL, data, index and sparse-index files.
//!
//! ## Record Format
//! ```text
//! ┌──────────────────┬───────┬────────────────────┬─────────┐
//! │ KeyLen: u64 (BE) │  Key  │ ValueLen: u64 (BE) │  Value  │
//! └──────────────────┴───────┴────────────────────┴─────────┘
//! ```
//!
//! `ValueLen = 0` marks a tombstone. An empty value is therefore
//! indistinguishable from a deletion once written.

use std::io::{ErrorKind, Read, Write};

use bytes::{BufMut, BytesMut};

use crate::error::{LsmError, Result};

/// Size of a length prefix
pub const LEN_SIZE: usize = 8;

/// A decoded record; `value == None` is a tombstone
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub key: Vec<u8>,
    pub value: Option<Vec<u8>>,
}

impl Record {
    /// Bytes this record occupies once encoded
    pub fn encoded_len(&self) -> u64 {
        let value_len = self.value.as_ref().map_or(0, Vec::len);
        (2 * LEN_SIZE + self.key.len() + value_len) as u64
    }

    /// Interpret the value as a big-endian file offset (index files)
    pub fn offset(&self) -> Result<u64> {
        let value = self.value.as_deref().unwrap_or_default();
        let bytes: [u8; LEN_SIZE] = value.try_into().map_err(|_| {
            LsmError::Corruption(format!(
                "offset record for key {:?} has {} value bytes, expected {}",
                String::from_utf8_lossy(&self.key),
                value.len(),
                LEN_SIZE
            ))
        })?;
        Ok(u64::from_be_bytes(bytes))
    }
}

/// Encode one record and return the number of bytes written.
pub fn encode<W: Write>(writer: &mut W, key: &[u8], value: Option<&[u8]>) -> Result<u64> {
    let value = value.unwrap_or_default();
    let mut buf = BytesMut::with_capacity(2 * LEN_SIZE + key.len() + value.len());
    buf.put_u64(key.len() as u64);
    buf.put_slice(key);
    buf.put_u64(value.len() as u64);
    buf.put_slice(value);

    writer.write_all(&buf)?;
    Ok(buf.len() as u64)
}

/// Encode a key whose value is a file offset.
pub fn encode_offset<W: Write>(writer: &mut W, key: &[u8], offset: u64) -> Result<u64> {
    encode(writer, key, Some(&offset.to_be_bytes()[..]))
}

/// Decode the next record.
///
/// Returns:
/// - `Ok(Some(record))`: a complete record
/// - `Ok(None)`: clean end of sequence (no bytes where a key length starts)
/// - `Err(Truncated)`: the stream ended inside a record
pub fn decode<R: Read>(reader: &mut R) -> Result<Option<Record>> {
    let mut len_buf = [0u8; LEN_SIZE];
    let read = read_full(reader, &mut len_buf)?;
    if read == 0 {
        return Ok(None);
    }
    if read < LEN_SIZE {
        return Err(LsmError::Truncated {
            expected: LEN_SIZE as u64,
            actual: read as u64,
        });
    }

    let key = read_field(reader, u64::from_be_bytes(len_buf))?;

    read_exact_or_truncated(reader, &mut len_buf)?;
    let value = read_field(reader, u64::from_be_bytes(len_buf))?;

    Ok(Some(Record {
        key,
        value: if value.is_empty() { None } else { Some(value) },
    }))
}

/// Read a field of `len` bytes without trusting `len` for the allocation.
fn read_field<R: Read>(reader: &mut R, len: u64) -> Result<Vec<u8>> {
    let mut field = Vec::new();
    let actual = reader.by_ref().take(len).read_to_end(&mut field)? as u64;
    if actual < len {
        return Err(LsmError::Truncated {
            expected: len,
            actual,
        });
    }
    Ok(field)
}

fn read_exact_or_truncated<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<()> {
    let read = read_full(reader, buf)?;
    if read < buf.len() {
        return Err(LsmError::Truncated {
            expected: buf.len() as u64,
            actual: read as u64,
        });
    }
    Ok(())
}

/// Fill `buf` as far as the stream allows, returning the byte count.
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(filled)
}
