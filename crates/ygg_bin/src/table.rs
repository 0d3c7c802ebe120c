//! Encoding and decoding of the metadata blob: the flat record array plus its string table.

use std::borrow::Cow;
use std::io::Cursor;

use binrw::{BinRead, BinWrite};
use byteorder::{ByteOrder, LittleEndian};

use crate::error::{Error, Result};
use crate::types::{TableRecord, RECORD_SIZE};

/// The decoded metadata blob: every entry record and the name bytes they point into.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct FileTable {
    /// Entry records in flat array order.
    pub records: Vec<TableRecord>,
    /// Consecutive NUL-terminated entry names.
    pub strings: Vec<u8>,
}

impl FileTable {
    /// Parse a decrypted, decompressed metadata blob.
    pub fn decode(blob: &[u8]) -> Result<FileTable> {
        if blob.len() < 8 {
            return Err(Error::TruncatedMetadata {
                expected: 8,
                actual: blob.len(),
            });
        }

        let records_len = LittleEndian::read_u32(&blob[0..4]) as usize;
        let strings_len = LittleEndian::read_u32(&blob[4..8]) as usize;

        if records_len % RECORD_SIZE != 0 {
            return Err(Error::MisalignedRecords(records_len));
        }

        let expected = 8 + records_len + strings_len;
        if blob.len() < expected {
            return Err(Error::TruncatedMetadata {
                expected,
                actual: blob.len(),
            });
        }

        let mut cursor = Cursor::new(&blob[8..8 + records_len]);
        let records = (0..records_len / RECORD_SIZE)
            .map(|_| TableRecord::read(&mut cursor).map_err(Error::from))
            .collect::<Result<Vec<_>>>()?;

        Ok(FileTable {
            records,
            strings: blob[8 + records_len..expected].to_vec(),
        })
    }

    /// Serialize the table back into a metadata blob.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let records_len = self.records.len() * RECORD_SIZE;
        let records_len32 = u32::try_from(records_len)
            .map_err(|_| Error::capacity("file table too big", records_len as u64, u32::MAX as u64))?;
        let strings_len32 = u32::try_from(self.strings.len()).map_err(|_| {
            Error::capacity("string table too big", self.strings.len() as u64, u32::MAX as u64)
        })?;

        let mut blob = Vec::with_capacity(8 + records_len + self.strings.len());
        blob.extend_from_slice(&records_len32.to_le_bytes());
        blob.extend_from_slice(&strings_len32.to_le_bytes());

        let mut cursor = Cursor::new(&mut blob);
        cursor.set_position(8);
        for record in &self.records {
            record.write(&mut cursor)?;
        }

        blob.extend_from_slice(&self.strings);
        Ok(blob)
    }

    /// Append a name to the string table, returning its offset.
    ///
    /// Names are appended unconditionally, matching the game's own packer; entries never share
    /// string table slots.
    pub fn push_name(&mut self, name: &str) -> Result<u32> {
        let offset = u32::try_from(self.strings.len()).map_err(|_| {
            Error::capacity("string table too big", self.strings.len() as u64, u32::MAX as u64)
        })?;

        self.strings.extend_from_slice(name.as_bytes());
        self.strings.push(0);
        Ok(offset)
    }

    /// Resolve a record's name: scan from `offset` to the next NUL byte.
    pub fn name_at(&self, offset: u32) -> Result<Cow<'_, str>> {
        let start = offset as usize;
        if start > self.strings.len() {
            return Err(Error::NameOutOfBounds(offset));
        }

        let rest = &self.strings[start..];
        let end = rest.iter().position(|&b| b == 0).unwrap_or(rest.len());
        Ok(String::from_utf8_lossy(&rest[..end]))
    }
}
