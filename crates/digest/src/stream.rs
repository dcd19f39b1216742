use std::io::Read;
use std::path::Path;

use md5::{Digest, Md5};

use crate::DigestError;

/// Streaming MD5 accumulator.
///
/// Consumes byte ranges in strictly increasing, contiguous order; the
/// digest is defined only once [`finish`](Self::finish) consumes the
/// accumulator, which makes an early read impossible by construction.
#[derive(Default)]
pub struct StreamingMd5 {
    hasher: Md5,
}

impl StreamingMd5 {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends the next slice to the running digest.
    pub fn append(&mut self, data: &[u8]) {
        self.hasher.update(data);
    }

    /// Finalizes and returns the hex-encoded digest.
    pub fn finish(self) -> String {
        hex::encode(self.hasher.finalize())
    }
}

/// Computes MD5 of `data` and returns the hex-encoded digest.
pub fn md5_bytes(data: &[u8]) -> String {
    let mut hasher = Md5::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Computes MD5 of an entire file and returns the hex-encoded digest.
pub fn md5_file(path: &Path) -> Result<String, DigestError> {
    let mut file = std::fs::File::open(path)?;
    let mut hasher = Md5::new();
    let mut buf = [0u8; 8192];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const EMPTY_MD5: &str = "d41d8cd98f00b204e9800998ecf8427e";

    #[test]
    fn empty_input_digest() {
        assert_eq!(md5_bytes(b""), EMPTY_MD5);
        assert_eq!(StreamingMd5::new().finish(), EMPTY_MD5);
    }

    #[test]
    fn md5_bytes_deterministic() {
        let c1 = md5_bytes(b"hello world");
        let c2 = md5_bytes(b"hello world");
        assert_eq!(c1, c2);
        assert_eq!(c1.len(), 32); // MD5 = 32 hex chars.
    }

    #[test]
    fn md5_bytes_different_data() {
        assert_ne!(md5_bytes(b"hello"), md5_bytes(b"world"));
    }

    #[test]
    fn streaming_equals_whole_input() {
        let data: Vec<u8> = (0..1000u32).map(|i| (i % 251) as u8).collect();
        for slice_size in [1usize, 7, 64, 250, 999, 1000, 4096] {
            let mut acc = StreamingMd5::new();
            for part in data.chunks(slice_size) {
                acc.append(part);
            }
            assert_eq!(acc.finish(), md5_bytes(&data), "slice size {slice_size}");
        }
    }

    #[test]
    fn md5_file_matches_bytes() {
        let dir = tempfile::TempDir::new().unwrap();
        let data = b"test content for digest";
        let path = dir.path().join("test.bin");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(data).unwrap();

        assert_eq!(md5_file(&path).unwrap(), md5_bytes(data));
    }
}
