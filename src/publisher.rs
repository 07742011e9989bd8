use crate::error::MetadataError;
use log::info;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;

/// Content-addressed storage that pins a directory under a single address
pub trait ContentPublisher {
    /// Publish every file in `dir` and return the address covering the directory
    fn publish_directory(&self, dir: &Path) -> Result<String, MetadataError>;
}

/// Offline publisher deriving a stable address from the directory contents
///
/// Useful for dry runs: the same files always produce the same address.
#[derive(Debug, Clone)]
pub struct LocalDigestPublisher {
    prefix: String,
}

impl Default for LocalDigestPublisher {
    fn default() -> Self {
        Self {
            prefix: "local-".to_string(),
        }
    }
}

impl LocalDigestPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_prefix(prefix: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
        }
    }
}

impl ContentPublisher for LocalDigestPublisher {
    fn publish_directory(&self, dir: &Path) -> Result<String, MetadataError> {
        if !dir.is_dir() {
            return Err(MetadataError::NotFound(dir.to_path_buf()));
        }

        let mut files = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.is_file() {
                files.push(path);
            }
        }
        files.sort();

        let mut hasher = Sha256::new();
        for path in &files {
            let contents = fs::read(path)?;
            let name = path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
            hasher.update(name.as_bytes());
            hasher.update([0u8]);
            hasher.update((contents.len() as u64).to_le_bytes());
            hasher.update(&contents);
        }

        let address = format!("{}{}", self.prefix, hex::encode(hasher.finalize()));
        info!("Published {} files from {} as {}", files.len(), dir.display(), address);
        Ok(address)
    }
}
