//! Error types that can be emitted from this library

use miette::Diagnostic;
use thiserror::Error;

/// Error type for library
#[derive(Error, Diagnostic, Debug)]
pub enum Error {
    /// Transparent wrapper for [`std::io::Error`]
    #[error(transparent)]
    IOError(#[from] std::io::Error),

    /// Transparent wrapper for [`binrw::Error`]
    #[error(transparent)]
    BinRWError(#[from] binrw::Error),

    /// file is an invalid bin container
    #[error("file is an invalid bin container")]
    InvalidArchive,

    /// buffer length not usable by the word cipher
    #[error("length must be divisible by 4 (got {0})")]
    MisalignedBuffer(usize),

    /// the metadata blob ended before its declared contents
    #[error("truncated metadata: need {expected} bytes, have {actual}")]
    TruncatedMetadata {
        /// how many bytes the declared lengths require
        expected: usize,
        /// how many bytes were present
        actual: usize,
    },

    /// the record array length is not a whole number of records
    #[error("record array length {0} is not a multiple of 12")]
    MisalignedRecords(usize),

    /// a name offset pointed outside the string table
    #[error("name offset {0} is outside the string table")]
    NameOutOfBounds(u32),

    /// a value did not fit the on-disk field that must hold it
    #[error("{what} ({value} exceeds {limit})")]
    CapacityExceeded {
        /// which field overflowed, in the wire format's terms
        what: &'static str,
        /// the offending value
        value: u64,
        /// the largest value the field can hold
        limit: u64,
    },

    /// input too large for a 32 bit length field
    #[error("input of {0} bytes cannot be framed with a 32 bit length")]
    UnsupportedSize(u64),

    /// an entry's data lied outside the archive
    #[error("entry {name:?} points outside the archive (offset {offset}, {length} bytes)")]
    EntryOutOfBounds {
        /// name of the offending entry
        name: String,
        /// claimed offset into the content region
        offset: u64,
        /// claimed byte length
        length: u64,
    },

    /// unable to find requested file
    #[error("no entry named {0:?} in the archive")]
    FileNotFound(String),
}

impl Error {
    pub(crate) fn capacity(what: &'static str, value: u64, limit: u64) -> Self {
        Error::CapacityExceeded { what, value, limit }
    }
}

/// Generic result type with crate's Error as its error variant
pub type Result<T> = core::result::Result<T, Error>;
