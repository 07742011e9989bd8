pub mod asset;
pub mod config;
pub mod contract;
pub mod error;
pub mod generate;
pub mod metadata;
pub mod naming;
pub mod outcome;
pub mod patch;
pub mod publisher;
pub mod shuffle;
pub mod store;

// Re-export the main types for convenience
pub use asset::{discover_assets, Asset};
pub use config::PipelineConfig;
pub use contract::{check_base_uri, CollectionContract, DeploymentParams, MockCollection};
pub use error::MetadataError;
pub use generate::{
    generate, generate_to_disk, generate_with, AssignmentEntry, AssignmentManifest,
    GenerationReport,
};
pub use metadata::{Attribute, MetadataRecord, MetadataTemplate};
pub use naming::{derive_name, NAMING_RULES_VERSION};
pub use outcome::{BatchSummary, ItemOutcome};
pub use patch::{patch_content_address, pending_placeholders};
pub use publisher::{ContentPublisher, LocalDigestPublisher};
pub use shuffle::{assign, deterministic_shuffle, seeded_random};
pub use store::{FileMetadataStore, MemoryMetadataStore, MetadataStore};
