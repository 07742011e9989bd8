//! Generation phase: assets in, one record and one renamed asset per token out.

use crate::asset::{discover_assets, Asset};
use crate::config::PipelineConfig;
use crate::error::MetadataError;
use crate::metadata::MetadataTemplate;
use crate::naming::{derive_name, NAMING_RULES_VERSION};
use crate::outcome::{BatchSummary, ItemOutcome};
use crate::shuffle::{assign, assignment_digest, SHUFFLE_PROTOCOL_VERSION};
use crate::store::{FileMetadataStore, MetadataStore};
use chrono::{DateTime, Utc};
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

const PROGRESS_INTERVAL: u64 = 100;

/// Which asset a token received, and under what name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentEntry {
    pub token_id: u64,
    pub identifier: String,
    pub name: String,
}

/// Record of one generation run, for comparing assignments across runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignmentManifest {
    pub protocol_version: u32,
    pub naming_version: u32,
    pub seed: i64,
    pub asset_count: usize,
    /// SHA-256 over the identifiers in token order
    pub digest: String,
    pub generated_at: DateTime<Utc>,
    pub entries: Vec<AssignmentEntry>,
}

impl AssignmentManifest {
    pub fn new(seed: i64, entries: Vec<AssignmentEntry>) -> Self {
        let digest = assignment_digest(entries.iter().map(|entry| entry.identifier.as_str()));
        Self {
            protocol_version: SHUFFLE_PROTOCOL_VERSION,
            naming_version: NAMING_RULES_VERSION,
            seed,
            asset_count: entries.len(),
            digest,
            generated_at: Utc::now(),
            entries,
        }
    }

    /// Whether two runs produced the same assignment, ignoring when they ran
    pub fn same_assignment(&self, other: &AssignmentManifest) -> bool {
        self.protocol_version == other.protocol_version
            && self.naming_version == other.naming_version
            && self.seed == other.seed
            && self.digest == other.digest
    }

    pub fn write<P: AsRef<Path>>(&self, path: P) -> Result<(), MetadataError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, MetadataError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }
}

/// Outcome of a generation run
#[derive(Debug, Clone)]
pub struct GenerationReport {
    pub summary: BatchSummary,
    pub manifest: AssignmentManifest,
}

/// Load the template and discover the assets; either failing aborts the run
pub fn prepare(config: &PipelineConfig) -> Result<(MetadataTemplate, Vec<Asset>), MetadataError> {
    let template = MetadataTemplate::load(&config.template_path)?;
    let assets = discover_assets(&config.assets_dir, &config.asset_extension)?;
    info!(
        "Found {} asset files in {}",
        assets.len(),
        config.assets_dir.display()
    );
    Ok((template, assets))
}

/// Run the generation phase against the configured output directories
///
/// Setup errors are reported before any output directory is created.
pub fn generate_to_disk(config: &PipelineConfig) -> Result<GenerationReport, MetadataError> {
    let (template, assets) = prepare(config)?;
    let store = FileMetadataStore::from_config(config)?;
    generate_with(config, &template, &assets, &store)
}

/// Run the generation phase into an arbitrary store
pub fn generate<S: MetadataStore + ?Sized>(
    config: &PipelineConfig,
    store: &S,
) -> Result<GenerationReport, MetadataError> {
    let (template, assets) = prepare(config)?;
    generate_with(config, &template, &assets, store)
}

/// Generate from an already discovered asset list
///
/// # Parameters
/// * `config` - Seed, URI scheme and placeholder, overwrite policy, manifest path
/// * `template` - Template every record is cloned from
/// * `assets` - Assets in canonical (lexical) order
/// * `store` - Destination for records and renamed assets
///
/// # Returns
/// The per-token summary and the assignment manifest; per-token failures do
/// not make this an error
pub fn generate_with<S: MetadataStore + ?Sized>(
    config: &PipelineConfig,
    template: &MetadataTemplate,
    assets: &[Asset],
    store: &S,
) -> Result<GenerationReport, MetadataError> {
    if !config.allow_overwrite {
        let existing = store.record_ids()?.len();
        if existing > 0 {
            return Err(MetadataError::OutputNotEmpty(
                config.metadata_dir.clone(),
                existing,
            ));
        }
    }

    let assigned = assign(assets, config.seed);
    info!(
        "Assigned {} assets to token IDs with seed {}",
        assigned.len(),
        config.seed
    );

    let total = assigned.len() as u64;
    let mut summary = BatchSummary::new();
    let mut entries = Vec::with_capacity(assigned.len());

    for (token_id, asset) in (0u64..).zip(assigned.iter()) {
        let name = derive_name(&asset.identifier);
        debug!("Token {} -> {} ({})", token_id, asset.file_name(), name);

        let outcome = match write_token(config, template, store, token_id, asset, &name) {
            Ok(()) => ItemOutcome::Success,
            Err(e) => {
                error!("Error processing token {}: {}", token_id, e);
                ItemOutcome::Failed(e.to_string())
            }
        };
        summary.record(token_id, outcome);
        entries.push(AssignmentEntry {
            token_id,
            identifier: asset.identifier.clone(),
            name,
        });

        if (token_id + 1) % PROGRESS_INTERVAL == 0 {
            info!("Progress: {}/{} tokens processed", token_id + 1, total);
        }
    }

    info!("Metadata generation complete: {}", summary);

    let manifest = AssignmentManifest::new(config.seed, entries);
    if let Some(path) = &config.manifest_path {
        match manifest.write(path) {
            Ok(()) => info!("Wrote assignment manifest to {}", path.display()),
            Err(e) => warn!("Could not write manifest {}: {}", path.display(), e),
        }
    }

    Ok(GenerationReport { summary, manifest })
}

fn write_token<S: MetadataStore + ?Sized>(
    config: &PipelineConfig,
    template: &MetadataTemplate,
    store: &S,
    token_id: u64,
    asset: &Asset,
    name: &str,
) -> Result<(), MetadataError> {
    store.put_image(token_id, asset)?;
    let record = template.build_record(token_id, asset, name, config.placeholder_uri(token_id));
    store.put_record(token_id, &record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{MetadataRecord, CODEPOINT_TRAIT, TOKEN_ID_TRAIT};
    use crate::store::MemoryMetadataStore;
    use serde_json::json;
    use std::path::PathBuf;
    use tempfile::{tempdir, TempDir};

    const TEMPLATE: &str = r#"{
  "name": "",
  "description": "A collection of emoji.",
  "image": "",
  "attributes": [
    { "trait_type": "Collection", "value": "Emoji" }
  ]
}"#;

    // Lay out emojis/ and NFTData/json_template.json under a temp root
    fn setup_project(assets: &[&str]) -> (TempDir, PipelineConfig) {
        let temp_dir = tempdir().unwrap();
        let config = PipelineConfig::with_root(temp_dir.path());
        fs::create_dir_all(&config.assets_dir).unwrap();
        for identifier in assets {
            fs::write(
                config.assets_dir.join(format!("{identifier}.png")),
                identifier.as_bytes(),
            )
            .unwrap();
        }
        fs::create_dir_all(config.template_path.parent().unwrap()).unwrap();
        fs::write(&config.template_path, TEMPLATE).unwrap();
        (temp_dir, config)
    }

    /// Store that refuses to copy images for selected tokens
    struct FlakyStore {
        inner: MemoryMetadataStore,
        failing: Vec<u64>,
    }

    impl MetadataStore for FlakyStore {
        fn put_record(&self, token_id: u64, record: &MetadataRecord) -> Result<(), MetadataError> {
            self.inner.put_record(token_id, record)
        }

        fn get_record(&self, token_id: u64) -> Result<Option<MetadataRecord>, MetadataError> {
            self.inner.get_record(token_id)
        }

        fn record_ids(&self) -> Result<Vec<u64>, MetadataError> {
            self.inner.record_ids()
        }

        fn put_image(&self, token_id: u64, asset: &Asset) -> Result<(), MetadataError> {
            if self.failing.contains(&token_id) {
                return Err(MetadataError::Other(format!("cannot copy {}", asset.file_name())));
            }
            self.inner.put_image(token_id, asset)
        }
    }

    #[test]
    fn test_generate_two_assets() {
        let (_temp_dir, config) = setup_project(&["1F600", "1F601"]);
        let report = generate_to_disk(&config).unwrap();

        assert_eq!(report.summary.succeeded, 2);
        assert!(report.summary.is_clean());

        let store = FileMetadataStore::open(&config.metadata_dir).unwrap();
        let token0 = store.get_record(0).unwrap().unwrap();
        assert_eq!(token0.name(), Some(derive_name("1F601").as_str()));
        assert_eq!(token0.name(), Some("GRINNING FACE WITH SMILING EYES"));
        assert_eq!(token0.image(), Some(&json!("ipfs://<ipfs_hash>/0.png")));
        assert_eq!(token0.attribute(TOKEN_ID_TRAIT), Some(json!("0")));
        assert_eq!(token0.attribute(CODEPOINT_TRAIT), Some(json!("1F601")));

        let token1 = store.get_record(1).unwrap().unwrap();
        assert_eq!(token1.name(), Some("GRINNING FACE"));
        assert_eq!(token1.image(), Some(&json!("ipfs://<ipfs_hash>/1.png")));

        let image0 = fs::read(config.images_dir.join("0.png")).unwrap();
        assert_eq!(image0, b"1F601");
        let image1 = fs::read(config.images_dir.join("1.png")).unwrap();
        assert_eq!(image1, b"1F600");
    }

    #[test]
    fn test_assignment_is_bijective() {
        let ids = ["1F600", "1F601", "1F602", "1F603", "1F1FA-1F1F8", "0023-FE0F-20E3"];
        let (_temp_dir, config) = setup_project(&ids);
        let store = MemoryMetadataStore::new();
        let report = generate(&config, &store).unwrap();

        assert_eq!(store.record_ids().unwrap(), (0..ids.len() as u64).collect::<Vec<_>>());
        let mut assigned: Vec<_> = report
            .manifest
            .entries
            .iter()
            .map(|entry| entry.identifier.clone())
            .collect();
        assigned.sort();
        let mut expected: Vec<_> = ids.iter().map(|id| id.to_string()).collect();
        expected.sort();
        assert_eq!(assigned, expected);

        for entry in &report.manifest.entries {
            let record = store.get_record(entry.token_id).unwrap().unwrap();
            assert_eq!(record.attribute(CODEPOINT_TRAIT), Some(json!(entry.identifier)));
            assert_eq!(
                store.image_source(entry.token_id),
                Some(config.assets_dir.join(format!("{}.png", entry.identifier)))
            );
        }
    }

    #[test]
    fn test_rerun_is_idempotent() {
        let (_temp_dir, config) = setup_project(&["1F600", "1F601", "1F602"]);
        let first = generate_to_disk(&config).unwrap();
        let before = fs::read_to_string(config.metadata_dir.join("2.json")).unwrap();

        let second = generate_to_disk(&config).unwrap();
        let after = fs::read_to_string(config.metadata_dir.join("2.json")).unwrap();

        assert_eq!(before, after);
        assert!(first.manifest.same_assignment(&second.manifest));
    }

    #[test]
    fn test_missing_template_is_fatal() {
        let (_temp_dir, config) = setup_project(&["1F600"]);
        fs::remove_file(&config.template_path).unwrap();

        let result = generate_to_disk(&config);
        assert!(matches!(result, Err(MetadataError::NotFound(ref p)) if *p == config.template_path));
        assert!(!config.metadata_dir.exists());
        assert!(!config.images_dir.exists());
    }

    #[test]
    fn test_missing_assets_dir_is_fatal() {
        let (_temp_dir, config) = setup_project(&[]);
        fs::remove_dir(&config.assets_dir).unwrap();

        let result = generate_to_disk(&config);
        assert!(matches!(result, Err(MetadataError::NotFound(ref p)) if *p == config.assets_dir));
        assert!(!config.metadata_dir.exists());
    }

    #[test]
    fn test_overwrite_guard() {
        let (_temp_dir, mut config) = setup_project(&["1F600", "1F601"]);
        generate_to_disk(&config).unwrap();

        config.allow_overwrite = false;
        config.seed = 7;
        let result = generate_to_disk(&config);
        assert!(matches!(result, Err(MetadataError::OutputNotEmpty(_, 2))));
    }

    #[test]
    fn test_per_token_failures_do_not_stop_batch() {
        let (_temp_dir, config) = setup_project(&["1F600", "1F601", "1F602", "1F603"]);
        let store = FlakyStore {
            inner: MemoryMetadataStore::new(),
            failing: vec![1, 2],
        };

        let report = generate(&config, &store).unwrap();
        assert_eq!(report.summary.succeeded, 2);
        assert_eq!(report.summary.failed.len(), 2);
        assert_eq!(report.summary.failed[0].0, 1);
        assert_eq!(report.summary.failed[1].0, 2);
        assert_eq!(store.record_ids().unwrap(), vec![0, 3]);
        // The manifest still covers every token
        assert_eq!(report.manifest.asset_count, 4);
    }

    #[test]
    fn test_manifest_written() {
        let (temp_dir, mut config) = setup_project(&["1F600", "1F601"]);
        let manifest_path: PathBuf = temp_dir.path().join("NFTData").join("manifest.json");
        config.manifest_path = Some(manifest_path.clone());

        let report = generate_to_disk(&config).unwrap();
        let loaded = AssignmentManifest::load(&manifest_path).unwrap();

        assert!(loaded.same_assignment(&report.manifest));
        assert_eq!(loaded.entries, report.manifest.entries);
        assert_eq!(loaded.seed, 42);
        assert_eq!(loaded.protocol_version, SHUFFLE_PROTOCOL_VERSION);
        assert_eq!(loaded.naming_version, NAMING_RULES_VERSION);
        assert_eq!(loaded.digest, assignment_digest(["1F601", "1F600"]));
        assert_eq!(loaded.entries[0].name, "GRINNING FACE WITH SMILING EYES");
    }

    #[test]
    fn test_empty_asset_dir() {
        let (_temp_dir, config) = setup_project(&[]);
        let report = generate_to_disk(&config).unwrap();
        assert_eq!(report.summary.total(), 0);
        assert!(report.manifest.entries.is_empty());
    }

    #[test]
    fn test_seed_changes_assignment() {
        let ids = ["1F600", "1F601", "1F602", "1F603", "1F604", "1F605", "1F606", "1F607"];
        let (_temp_dir, mut config) = setup_project(&ids);
        let first = generate(&config, &MemoryMetadataStore::new()).unwrap();
        config.seed = 43;
        let second = generate(&config, &MemoryMetadataStore::new()).unwrap();
        assert!(!first.manifest.same_assignment(&second.manifest));
        assert_ne!(first.manifest.digest, second.manifest.digest);
    }

    #[test]
    fn test_naming_version_changes_assignment() {
        let (_temp_dir, config) = setup_project(&["1F600", "1F601"]);
        let report = generate(&config, &MemoryMetadataStore::new()).unwrap();

        let mut renamed = report.manifest.clone();
        renamed.naming_version += 1;
        assert_eq!(renamed.digest, report.manifest.digest);
        assert!(!renamed.same_assignment(&report.manifest));
    }
}
