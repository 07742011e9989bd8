use crate::error::MetadataError;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Separates the codepoints of a multi-codepoint identifier, e.g. `1F1FA-1F1F8`
pub const IDENTIFIER_DELIMITER: char = '-';

// Asset is a source image named by the codepoint(s) of the symbol it depicts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    pub identifier: String,
    pub source: PathBuf,
    pub extension: String,
}

impl Asset {
    /// Build an asset from a file path; the file stem becomes the identifier
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, MetadataError> {
        let path = path.as_ref();
        let identifier = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .filter(|stem| !stem.is_empty())
            .ok_or_else(|| {
                MetadataError::InvalidAsset(format!("no identifier in {}", path.display()))
            })?;
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default();

        Ok(Self {
            identifier: identifier.to_string(),
            source: path.to_path_buf(),
            extension: extension.to_string(),
        })
    }

    /// File name of the source asset, used for the initial lexical ordering
    pub fn file_name(&self) -> String {
        if self.extension.is_empty() {
            self.identifier.clone()
        } else {
            format!("{}.{}", self.identifier, self.extension)
        }
    }
}

/// List every asset with the given extension in `dir`, sorted lexically by file name
///
/// # Parameters
/// * `dir` - The directory to scan
/// * `extension` - Extension (without the dot) an asset file must carry
///
/// # Returns
/// The assets in a stable order, or `NotFound` if the directory is missing
pub fn discover_assets(dir: &Path, extension: &str) -> Result<Vec<Asset>, MetadataError> {
    if !dir.is_dir() {
        return Err(MetadataError::NotFound(dir.to_path_buf()));
    }

    let mut assets = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        if path.extension().and_then(|ext| ext.to_str()) != Some(extension) {
            debug!("Ignoring non-asset file {}", path.display());
            continue;
        }
        match Asset::from_path(&path) {
            Ok(asset) => assets.push(asset),
            Err(e) => warn!("Skipping {}: {}", path.display(), e),
        }
    }

    assets.sort_by_cached_key(Asset::file_name);
    Ok(assets)
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use tempfile::tempdir;

    /// Build an in-memory asset without touching the filesystem
    pub fn asset(identifier: &str) -> Asset {
        Asset {
            identifier: identifier.to_string(),
            source: PathBuf::from(format!("/assets/{identifier}.png")),
            extension: "png".to_string(),
        }
    }

    #[test]
    fn test_from_path() {
        let asset = Asset::from_path("/tmp/emojis/1F1FA-1F1F8.png").unwrap();
        assert_eq!(asset.identifier, "1F1FA-1F1F8");
        assert_eq!(asset.extension, "png");
        assert_eq!(asset.file_name(), "1F1FA-1F1F8.png");
    }

    #[test]
    fn test_from_path_without_stem() {
        let result = Asset::from_path("/tmp/emojis/");
        assert!(matches!(result, Err(MetadataError::InvalidAsset(_))));
    }

    #[cfg(unix)]
    #[test]
    fn test_discover_skips_undecodable_names() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let temp_dir = tempdir().unwrap();
        fs::write(temp_dir.path().join("1F600.png"), b"img").unwrap();
        fs::write(temp_dir.path().join(OsStr::from_bytes(b"\xff\xfe.png")), b"img").unwrap();

        let assets = discover_assets(temp_dir.path(), "png").unwrap();
        let ids: Vec<_> = assets.iter().map(|a| a.identifier.as_str()).collect();
        assert_eq!(ids, vec!["1F600"]);
    }

    #[test]
    fn test_discover_sorts_and_filters() {
        let temp_dir = tempdir().unwrap();
        for name in ["1F601.png", "1F1FA-1F1F8.png", "1F600.png", "notes.txt"] {
            fs::write(temp_dir.path().join(name), b"img").unwrap();
        }
        fs::create_dir(temp_dir.path().join("nested.png")).unwrap();

        let assets = discover_assets(temp_dir.path(), "png").unwrap();
        let ids: Vec<_> = assets.iter().map(|a| a.identifier.as_str()).collect();
        assert_eq!(ids, vec!["1F1FA-1F1F8", "1F600", "1F601"]);
    }

    #[test]
    fn test_discover_missing_dir() {
        let temp_dir = tempdir().unwrap();
        let result = discover_assets(&temp_dir.path().join("missing"), "png");
        assert!(matches!(result, Err(MetadataError::NotFound(_))));
    }
}
