//! Types for creating BIN containers
//!

use std::fs;
use std::io::{Seek, Write};
use std::path::{Path, PathBuf};

use binrw::BinWrite;
use bon::Builder;
use tracing::{debug, instrument};

use crate::align_up;
use crate::compression;
use crate::crypt::{self, METADATA_NAME};
use crate::error::{Error, Result};
use crate::table::FileTable;
use crate::types::{ArchiveHeader, TableRecord, FLAG_COMPRESSED, FLAG_FOLDER, RECORD_SIZE, SIZE_MASK};

/// Extensions whose files are stored without compression, assumed to be compressed formats already.
pub const STORED_EXTENSIONS: &[&str] = &[".pck", ".webp", ".webm", ".png", ".ogg", ".opus"];

/// Options for how the BIN container should be written
#[derive(Debug, Clone, Copy, Builder)]
pub struct PackOptions {
    /// The zlib level used for file payloads and the metadata blob
    #[builder(default = compression::DEFAULT_LEVEL)]
    pub level: u32,
}

impl Default for PackOptions {
    fn default() -> Self {
        PackOptions::builder().build()
    }
}

/// Case-insensitive suffix check with the game packer's quirk: a name shorter than the
/// suffix counts as a match. Short filenames therefore skip compression. Kept as-is so packed
/// output stays byte-identical with archives the game already ships.
fn ends_with_ignore_case(name: &str, ending: &str) -> bool {
    if name.len() < ending.len() {
        return true;
    }
    name.as_bytes()[name.len() - ending.len()..]
        .iter()
        .zip(ending.as_bytes())
        .all(|(a, b)| a.eq_ignore_ascii_case(b))
}

/// Whether a file with this name is stored raw rather than compressed.
pub(crate) fn is_stored_extension(name: &str) -> bool {
    STORED_EXTENSIONS
        .iter()
        .any(|ending| ends_with_ignore_case(name, ending))
}

struct TreeNode {
    path: PathBuf,
    name: String,
    is_folder: bool,
    children: Vec<TreeNode>,
}

/// One entry of the level-order flattened tree.
///
/// For folders `length` is the child count and `offset` the flat-array index of the first child;
/// for files `length` is the pre-padding byte size and `offset` the byte position in the content
/// region. Both stay 64 bit until the final narrowing into a [`TableRecord`].
#[derive(Default)]
struct FlatEntry {
    path: PathBuf,
    name: String,
    is_folder: bool,
    length: u64,
    offset: u64,
    compressed: bool,
    data: Vec<u8>,
}

/// Enumerate one directory level, children stable-sorted by name in descending byte order.
///
/// The sort order is part of the wire format: it decides which contiguous record run each folder's
/// children occupy.
fn collect_children(dir: &Path) -> Result<Vec<TreeNode>> {
    let mut nodes = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let file_type = entry.file_type()?;
        let name = entry.file_name().to_string_lossy().into_owned();

        if file_type.is_file() {
            nodes.push(TreeNode {
                path: entry.path(),
                name,
                is_folder: false,
                children: Vec::new(),
            });
        } else if file_type.is_dir() {
            let children = collect_children(&entry.path())?;
            nodes.push(TreeNode {
                path: entry.path(),
                name,
                is_folder: true,
                children,
            });
        }
    }

    nodes.sort_by(|a, b| b.name.cmp(&a.name));
    Ok(nodes)
}

/// Level-order flattening: append every node of this level as one contiguous block, then assign
/// each folder its first-child index and flatten that folder's subtree.
fn flatten(flat: &mut Vec<FlatEntry>, nodes: Vec<TreeNode>) {
    let start = flat.len();

    let mut pending = Vec::with_capacity(nodes.len());
    for node in nodes {
        flat.push(FlatEntry {
            path: node.path,
            name: node.name,
            is_folder: node.is_folder,
            ..Default::default()
        });
        pending.push(node.children);
    }

    for (i, children) in pending.into_iter().enumerate() {
        if flat[start + i].is_folder {
            flat[start + i].length = children.len() as u64;
            flat[start + i].offset = flat.len() as u64;
            flatten(flat, children);
        }
    }
}

/// Compress (when eligible and profitable), pad, and encrypt one file's bytes.
///
/// Returns the ciphered padded payload, the pre-padding length, and whether the compressed form
/// was kept.
fn prepare_payload(name: &str, mut data: Vec<u8>, level: u32) -> Result<(Vec<u8>, u64, bool)> {
    let mut compressed = false;
    if !is_stored_extension(name) {
        let framed = compression::compress(&data, level)?;
        if framed.len() < data.len() {
            data = framed;
            compressed = true;
        }
    }

    let length = data.len() as u64;
    data.resize(align_up(length) as usize, 0);
    crypt::apply_keystream(&mut data, &crypt::derive_key(name))?;
    Ok((data, length, compressed))
}

/// Narrow the flattened entries into their 12 byte records.
///
/// Every narrowing is checked; a value that does not fit its field fails the pack rather than
/// truncating.
fn build_table(entries: &[FlatEntry]) -> Result<FileTable> {
    let mut table = FileTable::default();

    for entry in entries {
        let name_offset = table.push_name(&entry.name)?;

        let (packed_length, data_offset) = if entry.is_folder {
            if entry.length > SIZE_MASK as u64 {
                return Err(Error::capacity(
                    "too many files in folder",
                    entry.length,
                    SIZE_MASK as u64,
                ));
            }
            let byte_offset = entry.offset * RECORD_SIZE as u64;
            let offset32 = u32::try_from(byte_offset).map_err(|_| {
                Error::capacity("file table too big", byte_offset, u32::MAX as u64)
            })?;
            (entry.length as u32 | FLAG_FOLDER, offset32)
        } else {
            if entry.length > SIZE_MASK as u64 {
                return Err(Error::capacity(
                    "single file too big",
                    entry.length,
                    SIZE_MASK as u64,
                ));
            }
            let mut packed = entry.length as u32;
            if entry.compressed {
                packed |= FLAG_COMPRESSED;
            }
            let offset32 = u32::try_from(entry.offset).map_err(|_| {
                Error::capacity("combined files too big", entry.offset, u32::MAX as u64)
            })?;
            (packed, offset32)
        };

        table.records.push(TableRecord {
            name_offset,
            packed_length,
            data_offset,
        });
    }

    Ok(table)
}

/// Pack a directory tree into a BIN container.
///
/// The scan, flattening, and offset assignment are one strictly sequential pass, so the byte
/// range each entry claims in the content region is deterministic.
#[instrument(skip(writer, options), err)]
pub fn pack_directory<W: Write + Seek>(
    dir: &Path,
    mut writer: W,
    options: &PackOptions,
) -> Result<()> {
    let mut entries = Vec::new();
    flatten(&mut entries, collect_children(dir)?);

    let mut total: u64 = 0;
    for entry in entries.iter_mut().filter(|e| !e.is_folder) {
        debug!("adding {}", entry.path.display());

        let raw = fs::read(&entry.path)?;
        let (data, length, compressed) = prepare_payload(&entry.name, raw, options.level)?;
        entry.data = data;
        entry.length = length;
        entry.compressed = compressed;

        entry.offset = total;
        total += align_up(length);
    }

    let content_size = u32::try_from(total)
        .map_err(|_| Error::capacity("combined files too big", total, u32::MAX as u64))?;

    let blob = build_table(&entries)?.encode()?;
    let mut metadata = compression::compress(&blob, options.level)?;
    metadata.resize(align_up(metadata.len() as u64) as usize, 0);
    crypt::apply_keystream(&mut metadata, &crypt::derive_key(METADATA_NAME))?;
    let metadata_size = u32::try_from(metadata.len()).map_err(|_| {
        Error::capacity("metadata blob too big", metadata.len() as u64, u32::MAX as u64)
    })?;

    let header = ArchiveHeader {
        metadata_size,
        content_size,
    };
    header.write(&mut writer)?;
    writer.write_all(&metadata)?;
    for entry in entries.iter().filter(|e| !e.is_folder) {
        writer.write_all(&entry.data)?;
    }

    Ok(())
}
