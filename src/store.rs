use crate::asset::Asset;
use crate::config::PipelineConfig;
use crate::error::MetadataError;
use crate::metadata::MetadataRecord;
use log::{info, warn};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

const RECORD_EXTENSION: &str = "json";

/// Persistence for per-token records and their renamed assets
pub trait MetadataStore {
    /// Store the record for a token, replacing any previous one
    ///
    /// # Parameters
    /// * `token_id` - The token the record belongs to
    /// * `record` - The record to persist
    fn put_record(&self, token_id: u64, record: &MetadataRecord) -> Result<(), MetadataError>;

    /// Get the record for a token
    ///
    /// # Returns
    /// Some(record) if stored, None otherwise
    fn get_record(&self, token_id: u64) -> Result<Option<MetadataRecord>, MetadataError>;

    /// IDs of all stored records, sorted numerically
    fn record_ids(&self) -> Result<Vec<u64>, MetadataError>;

    /// Copy a token's asset into the store under `<tokenId>.<ext>`
    fn put_image(&self, token_id: u64, asset: &Asset) -> Result<(), MetadataError>;
}

/// Directory-backed store: `<metadata_dir>/<id>.json` and `<images_dir>/<id>.<ext>`
#[derive(Debug, Clone)]
pub struct FileMetadataStore {
    metadata_dir: PathBuf,
    images_dir: Option<PathBuf>,
}

impl FileMetadataStore {
    /// Create a store for generation, creating both output directories
    pub fn create<P: AsRef<Path>, Q: AsRef<Path>>(
        metadata_dir: P,
        images_dir: Q,
    ) -> Result<Self, MetadataError> {
        let metadata_dir = metadata_dir.as_ref().to_path_buf();
        let images_dir = images_dir.as_ref().to_path_buf();
        for dir in [&metadata_dir, &images_dir] {
            if !dir.exists() {
                fs::create_dir_all(dir)?;
                info!("Created output directory {}", dir.display());
            }
        }
        Ok(Self {
            metadata_dir,
            images_dir: Some(images_dir),
        })
    }

    /// Open an existing metadata directory for patching; images are not accessible
    pub fn open<P: AsRef<Path>>(metadata_dir: P) -> Result<Self, MetadataError> {
        let metadata_dir = metadata_dir.as_ref().to_path_buf();
        if !metadata_dir.is_dir() {
            return Err(MetadataError::NotFound(metadata_dir));
        }
        Ok(Self {
            metadata_dir,
            images_dir: None,
        })
    }

    /// Generation store laid out by the configuration
    pub fn from_config(config: &PipelineConfig) -> Result<Self, MetadataError> {
        Self::create(&config.metadata_dir, &config.images_dir)
    }

    pub fn metadata_dir(&self) -> &Path {
        &self.metadata_dir
    }

    pub fn images_dir(&self) -> Option<&Path> {
        self.images_dir.as_deref()
    }

    fn record_path(&self, token_id: u64) -> PathBuf {
        self.metadata_dir
            .join(format!("{token_id}.{RECORD_EXTENSION}"))
    }
}

impl MetadataStore for FileMetadataStore {
    fn put_record(&self, token_id: u64, record: &MetadataRecord) -> Result<(), MetadataError> {
        fs::write(self.record_path(token_id), record.to_json_pretty()?)?;
        Ok(())
    }

    fn get_record(&self, token_id: u64) -> Result<Option<MetadataRecord>, MetadataError> {
        let path = self.record_path(token_id);
        if !path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(path)?;
        MetadataRecord::from_json(&raw).map(Some)
    }

    fn record_ids(&self) -> Result<Vec<u64>, MetadataError> {
        let mut ids = Vec::new();
        for entry in fs::read_dir(&self.metadata_dir)? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(RECORD_EXTENSION) {
                continue;
            }
            match path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .and_then(|stem| {
                    // Only the canonical spelling maps to a token; `01` or `+1` would alias `1`
                    stem.parse::<u64>().ok().filter(|id| id.to_string() == stem)
                })
            {
                Some(id) => ids.push(id),
                None => warn!("Ignoring {} - not named by token ID", path.display()),
            }
        }
        ids.sort_unstable();
        Ok(ids)
    }

    fn put_image(&self, token_id: u64, asset: &Asset) -> Result<(), MetadataError> {
        let images_dir = self.images_dir.as_ref().ok_or_else(|| {
            MetadataError::Other("store was opened without an images directory".to_string())
        })?;
        let mut file_name = token_id.to_string();
        if !asset.extension.is_empty() {
            file_name = format!("{file_name}.{}", asset.extension);
        }
        fs::copy(&asset.source, images_dir.join(file_name))?;
        Ok(())
    }
}

/// In-memory store, mainly for tests and dry runs
#[derive(Debug, Default)]
pub struct MemoryMetadataStore {
    records: Mutex<BTreeMap<u64, MetadataRecord>>,
    images: Mutex<BTreeMap<u64, PathBuf>>,
}

impl MemoryMetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Source path of the asset stored for a token
    pub fn image_source(&self, token_id: u64) -> Option<PathBuf> {
        lock(&self.images).ok()?.get(&token_id).cloned()
    }

    pub fn len(&self) -> usize {
        lock(&self.records).map(|records| records.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, MetadataError> {
    mutex
        .lock()
        .map_err(|e| MetadataError::Other(format!("Failed to acquire lock: {}", e)))
}

impl MetadataStore for MemoryMetadataStore {
    fn put_record(&self, token_id: u64, record: &MetadataRecord) -> Result<(), MetadataError> {
        lock(&self.records)?.insert(token_id, record.clone());
        Ok(())
    }

    fn get_record(&self, token_id: u64) -> Result<Option<MetadataRecord>, MetadataError> {
        Ok(lock(&self.records)?.get(&token_id).cloned())
    }

    fn record_ids(&self) -> Result<Vec<u64>, MetadataError> {
        Ok(lock(&self.records)?.keys().copied().collect())
    }

    fn put_image(&self, token_id: u64, asset: &Asset) -> Result<(), MetadataError> {
        lock(&self.images)?.insert(token_id, asset.source.clone());
        Ok(())
    }
}
