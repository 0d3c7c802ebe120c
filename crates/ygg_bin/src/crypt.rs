//! Per-entry XOR keystream derivation and application.
//!
//! Every stored blob in a BIN container is ciphered with a 128 bit keystream derived from its
//! entry name: `MD5(rot13(name))`, read as four little-endian 32 bit words. The XOR is applied
//! word-by-word, so ciphered buffers must be a multiple of 4 bytes long.

use md5::{Digest, Md5};

use crate::error::{Error, Result};

/// The fixed keystream name used for the metadata blob.
pub const METADATA_NAME: &str = "InfoData";

/// Rotate ASCII letters by 13 positions within their case range; other bytes pass through.
pub fn rot13(input: &str) -> String {
    input
        .chars()
        .map(|c| match c {
            'A'..='M' | 'a'..='m' => ((c as u8) + 13) as char,
            'N'..='Z' | 'n'..='z' => ((c as u8) - 13) as char,
            _ => c,
        })
        .collect()
}

/// Derive the four-word keystream for a named blob.
pub fn derive_key(name: &str) -> [u32; 4] {
    let mut hasher = Md5::new();
    hasher.update(rot13(name).as_bytes());
    let digest = hasher.finalize();

    let mut key = [0u32; 4];
    for (word, bytes) in key.iter_mut().zip(digest.chunks_exact(4)) {
        *word = u32::from_le_bytes(bytes.try_into().expect("md5 digest is 16 bytes"));
    }
    key
}

/// XOR `data` in place with the keystream.
///
/// The cipher is an involution: applying it twice with the same key restores the input.
/// Fails with [`Error::MisalignedBuffer`] unless the length is a multiple of 4.
pub fn apply_keystream(data: &mut [u8], key: &[u32; 4]) -> Result<()> {
    if data.len() % 4 != 0 {
        return Err(Error::MisalignedBuffer(data.len()));
    }

    for (i, chunk) in data.chunks_exact_mut(4).enumerate() {
        let word = u32::from_le_bytes(chunk.try_into().expect("chunks are 4 bytes"));
        chunk.copy_from_slice(&(word ^ key[i % 4]).to_le_bytes());
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::{apply_keystream, derive_key, rot13};
    use crate::error::Error;

    #[test]
    fn rot13_letters_and_passthrough() {
        assert_eq!(rot13("InfoData"), "VasbQngn");
        assert_eq!(rot13("hello.txt"), "uryyb.gkg");
        assert_eq!(rot13("NOP nop 123_"), "ABC abc 123_");
    }

    #[test]
    fn derive_key_known_vectors() {
        // MD5("VasbQngn") = d86f8725db0de9152cd2ca7e4ab17898
        assert_eq!(
            derive_key("InfoData"),
            [0x25876FD8, 0x15E90DDB, 0x7ECAD22C, 0x9878B14A]
        );
        // MD5("uryyb.gkg") = 8cbd836c0d049e0f9f65ec9a8cacfa6a
        assert_eq!(
            derive_key("hello.txt"),
            [0x6C83BD8C, 0x0F9E040D, 0x9AEC659F, 0x6AFAAC8C]
        );
    }

    #[test]
    fn keystream_known_ciphertext() {
        let key = derive_key("hello.txt");
        let mut data = *b"Hello World!";
        apply_keystream(&mut data, &key).unwrap();
        assert_eq!(
            data,
            [0xC4, 0xD8, 0xEF, 0x00, 0x62, 0x24, 0xC9, 0x60, 0xED, 0x09, 0x88, 0xBB]
        );
    }

    #[test]
    fn keystream_is_involution() {
        let key = derive_key("some/deeply/nested name.dat");
        let original: Vec<u8> = (0u16..256).map(|b| b as u8).collect();

        let mut data = original.clone();
        apply_keystream(&mut data, &key).unwrap();
        assert_ne!(data, original);
        apply_keystream(&mut data, &key).unwrap();
        assert_eq!(data, original);
    }

    #[test]
    fn keystream_rejects_misaligned_buffers() {
        let key = derive_key("x");
        for len in [1usize, 2, 3, 5, 4097] {
            let mut data = vec![0u8; len];
            assert!(matches!(
                apply_keystream(&mut data, &key),
                Err(Error::MisalignedBuffer(l)) if l == len
            ));
        }
    }

    #[test]
    fn empty_buffer_is_aligned() {
        let key = derive_key("x");
        apply_keystream(&mut [], &key).unwrap();
    }
}
