//! Size-prefixed zlib framing for stored blobs.
//!
//! Compressed blobs in a BIN container carry their uncompressed size as a 4 byte little-endian
//! prefix in front of the zlib stream. The embedded size is authoritative on the way back out;
//! nothing cross-checks it against the record that referenced the blob.

use std::io::{Read, Write};

use byteorder::{ByteOrder, LittleEndian};
use flate2::{read::ZlibDecoder, write::ZlibEncoder, Compression};

use crate::error::{Error, Result};

/// The zlib level the game's own packer uses.
pub const DEFAULT_LEVEL: u32 = 9;

/// Compress `data`, prefixing the output with its uncompressed size.
///
/// Fails with [`Error::UnsupportedSize`] if the input does not fit a 32 bit length field.
pub fn compress(data: &[u8], level: u32) -> Result<Vec<u8>> {
    let size = u32::try_from(data.len()).map_err(|_| Error::UnsupportedSize(data.len() as u64))?;

    let mut framed = Vec::with_capacity(data.len() / 2 + 8);
    framed.extend_from_slice(&size.to_le_bytes());

    let mut encoder = ZlibEncoder::new(framed, Compression::new(level));
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

/// Inflate a size-prefixed blob into a buffer of exactly the embedded length.
pub fn decompress(framed: &[u8]) -> Result<Vec<u8>> {
    if framed.len() < 4 {
        return Err(Error::TruncatedMetadata {
            expected: 4,
            actual: framed.len(),
        });
    }

    let size = LittleEndian::read_u32(&framed[..4]) as usize;
    let mut data = vec![0u8; size];
    ZlibDecoder::new(&framed[4..]).read_exact(&mut data)?;
    Ok(data)
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::{compress, decompress, DEFAULT_LEVEL};
    use crate::error::Error;

    #[test]
    fn compress_known_stream() {
        // 4 byte size prefix, then the level 9 zlib stream for "Hello World"
        let expected = [
            0x0B, 0x00, 0x00, 0x00, 0x78, 0xDA, 0xF3, 0x48, 0xCD, 0xC9, 0xC9, 0x57, 0x08, 0xCF,
            0x2F, 0xCA, 0x49, 0x01, 0x00, 0x18, 0x0B, 0x04, 0x1D,
        ];
        assert_eq!(compress(b"Hello World", DEFAULT_LEVEL).unwrap(), expected);
    }

    #[test]
    fn round_trip() {
        let data: Vec<u8> = (0..4099u32).map(|i| (i * 7) as u8).collect();
        let framed = compress(&data, DEFAULT_LEVEL).unwrap();
        assert!(framed.len() >= 4);
        assert_eq!(decompress(&framed).unwrap(), data);
    }

    #[test]
    fn round_trip_empty() {
        let framed = compress(b"", DEFAULT_LEVEL).unwrap();
        assert_eq!(&framed[..4], &[0, 0, 0, 0]);
        assert_eq!(decompress(&framed).unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn decompress_rejects_missing_prefix() {
        assert!(matches!(
            decompress(&[0x0B, 0x00, 0x00]),
            Err(Error::TruncatedMetadata {
                expected: 4,
                actual: 3
            })
        ));
    }

    #[test]
    fn decompress_trusts_embedded_size() {
        // Shrink the declared size; the remainder of the stream is simply unread.
        let mut framed = compress(b"Hello World", DEFAULT_LEVEL).unwrap();
        framed[0] = 5;
        assert_eq!(decompress(&framed).unwrap(), b"Hello");
    }

    #[test]
    fn decompress_fails_when_stream_falls_short() {
        let mut framed = compress(b"Hello World", DEFAULT_LEVEL).unwrap();
        framed[0] = 200;
        assert!(decompress(&framed).is_err());
    }
}
