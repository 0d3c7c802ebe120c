//! Types for reading BIN containers
//!

use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use binrw::BinRead;
use indexmap::IndexMap;
use tracing::{debug, instrument};

use crate::compression;
use crate::crypt::{self, METADATA_NAME};
use crate::error::{Error, Result};
use crate::table::FileTable;
use crate::types::{ArchiveHeader, TableRecord, RECORD_SIZE};

/// BIN container reader
///
/// ```no_run
/// use std::io::prelude::*;
///
/// fn list_bin_contents(reader: impl Read + Seek) -> ygg_bin::error::Result<()> {
///     let bin = ygg_bin::BinArchive::new(reader)?;
///
///     for name in bin.file_names() {
///         println!("Filename: {}", name);
///     }
///
///     Ok(())
/// }
/// ```
pub struct BinArchive<R> {
    reader: R,
    header: ArchiveHeader,
    table: FileTable,
    files: IndexMap<Box<str>, usize>,
}

impl<R> BinArchive<R> {
    /// Number of entries (files and folders) contained in this archive.
    pub fn len(&self) -> usize {
        self.table.records.len()
    }

    /// Whether this archive contains no entries
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns an iterator over the relative paths of all files in this archive.
    pub fn file_names(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(|s| s.as_ref())
    }

    /// Get the record index of a file entry by relative path, if it's present.
    #[inline(always)]
    pub fn index_for_name(&self, name: &str) -> Option<usize> {
        self.files.get(name).copied()
    }

    /// Get a record by index, if it's present.
    pub fn record(&self, index: usize) -> Option<&TableRecord> {
        self.table.records.get(index)
    }

    /// Total byte size of the content region, as declared by the header.
    pub fn content_size(&self) -> u64 {
        self.header.content_size as u64
    }

    /// Byte offset of the content region within the backing store.
    fn content_base(&self) -> u64 {
        8 + self.header.metadata_size as u64
    }

    /// Unwrap and return the inner reader object
    ///
    /// The position of the reader is undefined.
    pub fn into_inner(self) -> R {
        self.reader
    }
}

impl<R: Read + Seek> BinArchive<R> {
    /// Read a BIN container, collecting the entries it describes.
    pub fn new(mut reader: R) -> Result<BinArchive<R>> {
        reader.seek(SeekFrom::Start(0))?;
        let header = ArchiveHeader::read(&mut reader).map_err(|_| Error::InvalidArchive)?;

        let mut metadata = vec![0u8; header.metadata_size as usize];
        reader
            .read_exact(&mut metadata)
            .map_err(|_| Error::InvalidArchive)?;
        crypt::apply_keystream(&mut metadata, &crypt::derive_key(METADATA_NAME))?;

        let table = FileTable::decode(&compression::decompress(&metadata)?)?;
        let files = Self::collect_paths(&table)?;

        Ok(BinArchive {
            reader,
            header,
            table,
            files,
        })
    }

    /// Read and decode one file entry's payload.
    ///
    /// The stored bytes are decrypted with the entry's name key, then either inflated (compressed
    /// entries, whose embedded size is authoritative) or truncated back to the entry's pre-padding
    /// size.
    pub fn read_file(&mut self, index: usize) -> Result<Vec<u8>> {
        let record = *self
            .table
            .records
            .get(index)
            .ok_or_else(|| Error::FileNotFound(format!("record {index}")))?;
        let name = self.table.name_at(record.name_offset)?.into_owned();
        if record.is_folder() {
            return Err(Error::FileNotFound(name));
        }

        let size = record.size() as u64;
        let aligned = crate::align_up(size);
        let offset = record.data_offset as u64;
        if offset + aligned > self.content_size() {
            return Err(Error::EntryOutOfBounds {
                name,
                offset,
                length: aligned,
            });
        }

        let start = self.content_base() + offset;
        let mut data = vec![0u8; aligned as usize];
        self.reader.seek(SeekFrom::Start(start))?;
        self.reader.read_exact(&mut data)?;
        crypt::apply_keystream(&mut data, &crypt::derive_key(&name))?;

        if record.is_compressed() {
            compression::decompress(&data)
        } else {
            data.truncate(size as usize);
            Ok(data)
        }
    }

    /// Read and decode a file entry by its relative path.
    pub fn by_name(&mut self, name: &str) -> Result<Vec<u8>> {
        let index = self
            .index_for_name(name)
            .ok_or_else(|| Error::FileNotFound(name.to_owned()))?;
        self.read_file(index)
    }

    /// Materialize the stored tree under `dir`.
    ///
    /// Any failing entry aborts the whole extraction; a partially written tree may remain.
    #[instrument(skip(self), err)]
    pub fn extract_to(&mut self, dir: &Path) -> Result<()> {
        std::fs::create_dir_all(dir)?;

        let mut visited = vec![false; self.table.records.len()];
        for index in 0..self.table.records.len() {
            self.visit(index, dir, &mut visited)?;
        }
        Ok(())
    }

    /// Process one record of the flat array during extraction.
    ///
    /// Out-of-range and already-visited indices are a no-op; the first visit wins. This guards
    /// against malformed tables whose folder offsets alias or cycle.
    fn visit(&mut self, index: usize, dir: &Path, visited: &mut [bool]) -> Result<()> {
        let Some(record) = self.table.records.get(index).copied() else {
            return Ok(());
        };
        if visited[index] {
            return Ok(());
        }
        visited[index] = true;

        let name = self.table.name_at(record.name_offset)?.into_owned();
        let path = dir.join(&name);

        if record.is_folder() {
            debug!("creating folder {}", path.display());
            std::fs::create_dir_all(&path)?;

            let child_start = record.data_offset as usize / RECORD_SIZE;
            for child in 0..record.size() as usize {
                self.visit(child_start + child, &path, visited)?;
            }
        } else {
            debug!("writing {}", path.display());
            let data = self.read_file(index)?;
            std::fs::write(&path, data)?;
        }
        Ok(())
    }

    fn collect_paths(table: &FileTable) -> Result<IndexMap<Box<str>, usize>> {
        let mut files = IndexMap::new();
        let mut visited = vec![false; table.records.len()];
        for index in 0..table.records.len() {
            Self::collect_path(table, index, "", &mut files, &mut visited)?;
        }
        Ok(files)
    }

    fn collect_path(
        table: &FileTable,
        index: usize,
        prefix: &str,
        files: &mut IndexMap<Box<str>, usize>,
        visited: &mut [bool],
    ) -> Result<()> {
        let Some(record) = table.records.get(index) else {
            return Ok(());
        };
        if visited[index] {
            return Ok(());
        }
        visited[index] = true;

        let name = table.name_at(record.name_offset)?;
        let path = if prefix.is_empty() {
            name.into_owned()
        } else {
            format!("{prefix}/{name}")
        };

        if record.is_folder() {
            let child_start = record.data_offset as usize / RECORD_SIZE;
            for child in 0..record.size() as usize {
                Self::collect_path(table, child_start + child, &path, files, visited)?;
            }
        } else {
            files.insert(path.into_boxed_str(), index);
        }
        Ok(())
    }
}
