//! This library handles extracting from and creating the encrypted **BIN** asset containers used by *Yggdra*.
//!
//! # BIN Container Format Documentation
//!
//! This crate provides utilities to read and create the proprietary BIN container format used by the
//! game *Yggdra*. A BIN container stores a whole folder/file tree within a single file; every stored
//! blob is individually XOR-encrypted and optionally zlib-compressed.
//!
//! ## File Structure
//!
//! A BIN container consists of an 8 byte header, followed by the encrypted metadata blob and the
//! content region.
//!
//! | Offset (bytes) | Field              | Description                                                  |
//! |----------------|--------------------|--------------------------------------------------------------|
//! | 0x0000         | Metadata Size      | 4 bytes: Size of the encrypted, compressed metadata blob     |
//! | 0x0004         | Content Size       | 4 bytes: Total size of the content region                    |
//! | 0x0008         | Metadata Blob      | Compressed then encrypted with the fixed name `"InfoData"`   |
//! | 0x0008 + meta  | Content Region     | Concatenated, individually encrypted file payloads           |
//!
//! ### Metadata Blob
//!
//! Once decrypted and decompressed, the metadata blob has this layout:
//!
//! | Offset (bytes) | Field              | Description                                                  |
//! |----------------|--------------------|--------------------------------------------------------------|
//! | 0x0000         | Records Length     | 4 bytes: Byte length of the record array (multiple of 12)    |
//! | 0x0004         | Strings Length     | 4 bytes: Byte length of the string table                     |
//! | 0x0008         | Records            | Flat array of 12 byte entry records                          |
//! | 0x0008 + recs  | String Table       | Consecutive NUL-terminated entry names                       |
//!
//! Each 12 byte record describes one file or folder:
//!
//! | Offset (bytes) | Field              | Description                                                  |
//! |----------------|--------------------|--------------------------------------------------------------|
//! | 0x0000         | Name Offset        | 4 bytes: Offset of the entry name within the string table    |
//! | 0x0004         | Packed Length      | 4 bytes: Flags in the two high bits, payload size below      |
//! | 0x0008         | Data Offset        | 4 bytes: Location of the entry's data                        |
//!
//! - **Packed Length**: bit 31 marks a folder, bit 30 marks a compressed file (meaningless for
//!   folders), bits 0-29 hold the payload size. For a folder the size is its child count; for a file
//!   it is the byte length of the stored data before alignment padding.
//! - **Data Offset**: for a folder, a byte offset into the record array itself (`offset / 12` is the
//!   index of the folder's first child; the children occupy a contiguous run of records). For a
//!   file, a byte offset into the content region.
//!
//! ### Content Region
//!
//! File payloads are concatenated in record order, each padded with zero bytes to a 4 byte boundary
//! and XOR-encrypted with a keystream derived from the entry's bare name. Compressed payloads carry
//! a 4 byte little-endian uncompressed-size prefix in front of the zlib stream.
//!
//! ### Encryption
//!
//! The keystream for a named blob is `MD5(rot13(name))` interpreted as four little-endian 32 bit
//! words, XORed word-by-word over the 4 byte aligned data. The cipher is its own inverse.
//!
//! ## Additional Information
//!
//! - **File Extension**: `.bin`
//! - **Endianness**: Little-endian for all multi-byte integers
//! - **Compression**: zlib (level 9) with an uncompressed-size prefix, applied per file unless the
//!   file's extension marks it as already compressed
//!

pub mod compression;
pub mod crypt;
pub mod error;
pub mod read;
pub mod table;
pub mod types;
pub mod write;

pub use read::BinArchive;
pub use write::{pack_directory, PackOptions};

/// Round `value` up to the next multiple of 4.
///
/// The cipher operates on whole 32 bit words, so every stored blob is padded to this boundary.
pub(crate) const fn align_up(value: u64) -> u64 {
    (value + 3) & !3
}
