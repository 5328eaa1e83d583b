use crate::Compression;
use std::ffi::OsString;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::{Path, PathBuf};

impl Display for Compression {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

impl Compression {
    /// Returns the suffix the page cache appends to a plain file name for
    /// this variant.
    #[inline]
    #[must_use]
    pub fn suffix(&self) -> &'static str {
        match self {
            Compression::None => "",
            Compression::Gzip => "_gzip",
        }
    }

    /// Short name used in logs.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Compression::None => "none",
            Compression::Gzip => "gzip",
        }
    }

    /// Path of this variant's sibling for a plain cache file.
    ///
    /// ```
    /// use std::path::Path;
    /// use cachepress_compress::Compression;
    ///
    /// let plain = Path::new("/cache/example.com/index-https.html");
    /// assert_eq!(
    ///     Compression::Gzip.variant_path(plain),
    ///     Path::new("/cache/example.com/index-https.html_gzip")
    /// );
    /// assert_eq!(Compression::None.variant_path(plain), plain);
    /// ```
    #[must_use]
    pub fn variant_path(&self, plain: impl AsRef<Path>) -> PathBuf {
        let mut name = OsString::from(plain.as_ref().as_os_str());
        name.push(self.suffix());
        PathBuf::from(name)
    }
}

#[cfg(test)]
mod tests {
    use crate::Compression;
    use rstest::rstest;
    use std::path::Path;

    #[rstest]
    #[case(Compression::None, "")]
    #[case(Compression::Gzip, "_gzip")]
    fn test_suffix(#[case] format: Compression, #[case] expected: &str) {
        assert_eq!(format.suffix(), expected);
    }

    #[test]
    fn variant_path_is_detected_as_variant() {
        let sibling = Compression::Gzip.variant_path(Path::new("a/index-https.html"));
        assert_eq!(Compression::from_path(&sibling), Compression::Gzip);
    }
}
