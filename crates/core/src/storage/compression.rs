//! Payload inflation for the `resources` table.

use std::io::Read;

use flate2::read::{GzDecoder, ZlibDecoder};

use crate::Error;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Inflate a stored payload. Accepts both gzip and zlib streams.
pub fn decompress(data: &[u8]) -> Result<Vec<u8>, Error> {
    let mut out = Vec::with_capacity(data.len() * 2);
    let result = if data.starts_with(&GZIP_MAGIC) {
        GzDecoder::new(data).read_to_end(&mut out)
    } else {
        ZlibDecoder::new(data).read_to_end(&mut out)
    };

    result.map_err(|e| Error::DecompressionFailure(e.to_string()))?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::{GzEncoder, ZlibEncoder};
    use std::io::Write;

    #[test]
    fn test_decompress_gzip() {
        let mut enc = GzEncoder::new(Vec::new(), Compression::default());
        enc.write_all(b"hello").unwrap();
        let compressed = enc.finish().unwrap();

        assert_eq!(decompress(&compressed).unwrap(), b"hello");
    }

    #[test]
    fn test_decompress_zlib() {
        let mut enc = ZlibEncoder::new(Vec::new(), Compression::default());
        enc.write_all(b"{\"version\":8}").unwrap();
        let compressed = enc.finish().unwrap();

        assert_eq!(decompress(&compressed).unwrap(), b"{\"version\":8}");
    }

    #[test]
    fn test_decompress_garbage() {
        let result = decompress(b"not compressed at all");
        assert!(matches!(result, Err(Error::DecompressionFailure(_))));
    }

    #[test]
    fn test_decompress_truncated_gzip() {
        let mut enc = GzEncoder::new(Vec::new(), Compression::default());
        enc.write_all(b"hello hello hello").unwrap();
        let compressed = enc.finish().unwrap();

        let result = decompress(&compressed[..compressed.len() / 2]);
        assert!(matches!(result, Err(Error::DecompressionFailure(_))));
    }
}
