//! Compression Operations

use crate::Compression;
use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use flate2::{Compression as GzCompression, write::GzEncoder};
use std::io::Write;
use tracing::instrument;

// Same level the page cache uses when it writes the sibling.
const GZIP_LEVEL: GzCompression = GzCompression::new(3);

impl Compression {
    /// Compress a byte slice in memory.
    ///
    /// # Examples
    ///
    /// ```
    /// use cachepress_compress::Compression;
    ///
    /// let data = b"<!DOCTYPE html><html><body></body></html>";
    /// let compressed = Compression::Gzip.compress(data).unwrap();
    /// assert!(compressed.starts_with(&[0x1F, 0x8B]));
    /// assert_eq!(Compression::None.compress(data).unwrap(), data);
    /// ```
    #[instrument(skip(input), fields(
        format = %self,
        input_size = input.len(),
        output_size
    ))]
    pub fn compress(&self, input: &[u8]) -> Result<Vec<u8>> {
        let output = match self {
            Compression::None => input.to_vec(),
            Compression::Gzip => {
                let mut encoder = GzEncoder::new(Vec::new(), GZIP_LEVEL);
                encoder.write_all(input).or_raise(|| ErrorKind::Io)?;
                encoder.finish().or_raise(|| ErrorKind::Io)?
            },
        };
        tracing::Span::current().record("output_size", output.len());
        Ok(output)
    }
}
