//! Request body compression.

use std::io::{self, Write};
use std::sync::Arc;

use flate2::Compression;
use flate2::write::GzEncoder;

type CompressFn = dyn Fn(&[u8]) -> io::Result<Vec<u8>> + Send + Sync;

/// The function used to compress a request body when gzip is requested.
///
/// Defaults to gzip via `flate2`. Any function producing a gzip stream can be
/// substituted with [`Compressor::new`].
#[derive(Clone)]
pub struct Compressor {
    inner: Arc<CompressFn>,
}

impl Compressor {
    /// Wrap a custom compression function.
    pub fn new<F>(compress: F) -> Self
    where
        F: Fn(&[u8]) -> io::Result<Vec<u8>> + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(compress),
        }
    }

    /// The default gzip compressor.
    pub fn gzip() -> Self {
        Self::new(gzip)
    }

    /// Compress `data`.
    pub fn compress(&self, data: &[u8]) -> io::Result<Vec<u8>> {
        (self.inner)(data)
    }
}

impl Default for Compressor {
    fn default() -> Self {
        Self::gzip()
    }
}

impl std::fmt::Debug for Compressor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Compressor").finish_non_exhaustive()
    }
}

fn gzip(data: &[u8]) -> io::Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::with_capacity(data.len() / 2), Compression::default());
    encoder.write_all(data)?;
    encoder.finish()
}

#[cfg(test)]
mod tests {
    use std::io::Read;

    use flate2::read::GzDecoder;

    use super::*;

    #[test]
    fn test_gzip_output_decodes() {
        let data = b"hello hello hello hello".repeat(20);
        let compressed = Compressor::gzip().compress(&data).unwrap();
        assert_eq!(&compressed[..2], &[0x1f, 0x8b]);

        let mut decoded = Vec::new();
        GzDecoder::new(&compressed[..])
            .read_to_end(&mut decoded)
            .unwrap();
        assert_eq!(decoded, data);
    }

    #[test]
    fn test_custom_compressor() {
        let compressor = Compressor::new(|data| Ok(data.iter().rev().copied().collect()));
        assert_eq!(compressor.compress(b"abc").unwrap(), b"cba");
    }
}
