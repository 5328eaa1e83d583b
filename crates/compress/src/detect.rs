use crate::Compression;
use std::path::Path;

impl Compression {
    /// Detect a compressed variant from its file name.
    ///
    /// The page cache names its siblings `index-https.html_gzip`; plain
    /// `.gz` extensions are recognised too.
    #[must_use]
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let Some(name) = path.as_ref().file_name().and_then(|n| n.to_str()) else {
            return Compression::None;
        };
        let name = name.to_lowercase();
        if name.ends_with(Compression::Gzip.suffix()) {
            return Compression::Gzip;
        }
        // `.gz` alone is a dotfile, not an extension.
        match Path::new(&name).extension().and_then(|ext| ext.to_str()) {
            Some("gz") => Compression::Gzip,
            _ => Compression::None,
        }
    }
}
