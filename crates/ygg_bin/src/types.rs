//! Base types for the on-disk structure of a BIN container.

use binrw::{BinRead, BinWrite};

/// Flag bit marking an entry as a folder.
pub const FLAG_FOLDER: u32 = 0x8000_0000;

/// Flag bit marking a file's payload as compressed. Meaningless on folders.
pub const FLAG_COMPRESSED: u32 = 0x4000_0000;

/// Mask selecting the payload size from [`TableRecord::packed_length`].
pub const SIZE_MASK: u32 = 0x3FFF_FFFF;

/// Byte size of one serialized [`TableRecord`].
pub const RECORD_SIZE: usize = 12;

/// BIN container header
///
/// All data is stored in little endian format.
#[derive(BinRead, BinWrite, Debug, Default, Copy, Clone, PartialEq)]
#[brw(little)]
pub struct ArchiveHeader {
    /// The size in the file of the compressed, encrypted metadata blob
    pub metadata_size: u32,

    /// The total size of the content region following the metadata blob
    pub content_size: u32,
}

/// BIN container entry record
///
/// Describes one file or folder of the stored tree. Records form one flat array; folders address
/// their children as a contiguous run of records within the same array.
#[derive(BinRead, BinWrite, Debug, Default, Copy, Clone, PartialEq)]
#[brw(little)]
pub struct TableRecord {
    /// The offset of this entry's name within the string table
    pub name_offset: u32,

    /// The two highest bits are flags; the rest is the payload size
    ///
    /// For a folder the size is its child count, for a file the byte length of the stored data
    /// before alignment padding.
    pub packed_length: u32,

    /// For a folder, a byte offset into the record array locating its first child; for a file, a
    /// byte offset into the content region
    pub data_offset: u32,
}

impl TableRecord {
    /// Whether this record describes a folder.
    pub const fn is_folder(&self) -> bool {
        self.packed_length & FLAG_FOLDER != 0
    }

    /// Whether this record's payload is compressed. Only meaningful for files.
    pub const fn is_compressed(&self) -> bool {
        self.packed_length & FLAG_COMPRESSED != 0
    }

    /// The payload size: child count for a folder, pre-padding byte length for a file.
    pub const fn size(&self) -> u32 {
        self.packed_length & SIZE_MASK
    }
}

#[cfg(test)]
mod test {
    use std::io::Cursor;

    use binrw::{BinRead, BinWrite};
    use pretty_assertions::assert_eq;

    use super::{ArchiveHeader, TableRecord, FLAG_COMPRESSED, FLAG_FOLDER};
    use crate::error::Result;

    #[test]
    fn read_header() -> Result<()> {
        let mut input = Cursor::new(vec![0x34, 0x12, 0x00, 0x00, 0x78, 0x56, 0x00, 0x00]);

        let expected = ArchiveHeader {
            metadata_size: 0x1234,
            content_size: 0x5678,
        };

        assert_eq!(ArchiveHeader::read(&mut input)?, expected);

        Ok(())
    }

    #[test]
    fn write_header() -> Result<()> {
        let expected = vec![0x34, 0x12, 0x00, 0x00, 0x78, 0x56, 0x00, 0x00];

        let header = ArchiveHeader {
            metadata_size: 0x1234,
            content_size: 0x5678,
        };

        let mut actual = Vec::new();
        header.write(&mut Cursor::new(&mut actual))?;

        assert_eq!(actual, expected);

        Ok(())
    }

    #[test]
    fn read_record() -> Result<()> {
        #[rustfmt::skip]
        let mut input = Cursor::new(vec![
            0x0A, 0x00, 0x00, 0x00,
            0x0B, 0x00, 0x00, 0x40,
            0x24, 0x00, 0x00, 0x00,
        ]);

        let expected = TableRecord {
            name_offset: 10,
            packed_length: FLAG_COMPRESSED | 11,
            data_offset: 36,
        };

        assert_eq!(TableRecord::read(&mut input)?, expected);

        Ok(())
    }

    #[test]
    fn write_record() -> Result<()> {
        #[rustfmt::skip]
        let expected = vec![
            0x0A, 0x00, 0x00, 0x00,
            0x02, 0x00, 0x00, 0x80,
            0x18, 0x00, 0x00, 0x00,
        ];

        let record = TableRecord {
            name_offset: 10,
            packed_length: FLAG_FOLDER | 2,
            data_offset: 24,
        };

        let mut actual = Vec::new();
        record.write(&mut Cursor::new(&mut actual))?;

        assert_eq!(actual, expected);

        Ok(())
    }

    #[test]
    fn folder_flags_ignore_compressed_bit() {
        // A folder record keeps its child count even with the compressed bit spuriously set.
        let record = TableRecord {
            name_offset: 0,
            packed_length: FLAG_FOLDER | FLAG_COMPRESSED | 3,
            data_offset: 0,
        };

        assert!(record.is_folder());
        assert_eq!(record.size(), 3);
    }

    #[test]
    fn file_size_independent_of_compressed_bit() {
        for flags in [0, FLAG_COMPRESSED] {
            let record = TableRecord {
                name_offset: 0,
                packed_length: flags | 4099,
                data_offset: 0,
            };
            assert!(!record.is_folder());
            assert_eq!(record.size(), 4099);
        }
    }
}
