//! Pipeline configuration.
//!
//! Every operation takes its settings from an explicit [`PipelineConfig`]
//! value; nothing is read from process-wide state.

use crate::error::MetadataError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Configuration shared by the generation and patch phases
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Directory holding the source assets, named by codepoint
    #[serde(default = "defaults::assets_dir")]
    pub assets_dir: PathBuf,

    /// Metadata template every record is built from
    #[serde(default = "defaults::template_path")]
    pub template_path: PathBuf,

    /// Output directory for `<tokenId>.json` records
    #[serde(default = "defaults::metadata_dir")]
    pub metadata_dir: PathBuf,

    /// Output directory for renamed asset copies
    #[serde(default = "defaults::images_dir")]
    pub images_dir: PathBuf,

    /// Seed for the deterministic token assignment
    #[serde(default = "defaults::seed")]
    pub seed: i64,

    /// Only files with this extension are treated as assets
    #[serde(default = "defaults::asset_extension")]
    pub asset_extension: String,

    /// URI scheme of the image reference, e.g. `ipfs`
    #[serde(default = "defaults::uri_scheme")]
    pub uri_scheme: String,

    /// Stand-in for the content address until the images are pinned
    #[serde(default = "defaults::placeholder")]
    pub placeholder: String,

    /// Where to write the assignment manifest, if anywhere
    #[serde(default)]
    pub manifest_path: Option<PathBuf>,

    /// Whether generation may overwrite records left by a previous run
    #[serde(default = "defaults::allow_overwrite")]
    pub allow_overwrite: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            assets_dir: defaults::assets_dir(),
            template_path: defaults::template_path(),
            metadata_dir: defaults::metadata_dir(),
            images_dir: defaults::images_dir(),
            seed: defaults::seed(),
            asset_extension: defaults::asset_extension(),
            uri_scheme: defaults::uri_scheme(),
            placeholder: defaults::placeholder(),
            manifest_path: None,
            allow_overwrite: defaults::allow_overwrite(),
        }
    }
}

impl PipelineConfig {
    /// Lay out the conventional project tree below `root`
    pub fn with_root<P: AsRef<Path>>(root: P) -> Self {
        let root = root.as_ref();
        let defaults = Self::default();
        Self {
            assets_dir: root.join(defaults.assets_dir),
            template_path: root.join(defaults.template_path),
            metadata_dir: root.join(defaults.metadata_dir),
            images_dir: root.join(defaults.images_dir),
            ..Self::default()
        }
    }

    /// Load a configuration from a JSON file; missing fields take their defaults
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, MetadataError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(MetadataError::NotFound(path.to_path_buf()));
        }
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// The placeholder image reference for a token, before patching
    pub fn placeholder_uri(&self, token_id: u64) -> String {
        format!(
            "{}://{}/{}.{}",
            self.uri_scheme, self.placeholder, token_id, self.asset_extension
        )
    }
}

mod defaults {
    use std::path::PathBuf;

    pub fn assets_dir() -> PathBuf {
        PathBuf::from("emojis")
    }

    pub fn template_path() -> PathBuf {
        PathBuf::from("NFTData").join("json_template.json")
    }

    pub fn metadata_dir() -> PathBuf {
        PathBuf::from("NFTData").join("metadata_json")
    }

    pub fn images_dir() -> PathBuf {
        PathBuf::from("NFTData").join("images")
    }

    pub fn seed() -> i64 {
        42
    }

    pub fn asset_extension() -> String {
        "png".into()
    }

    pub fn uri_scheme() -> String {
        "ipfs".into()
    }

    pub fn placeholder() -> String {
        "<ipfs_hash>".into()
    }

    pub fn allow_overwrite() -> bool {
        true
    }
}
