//! Command-line entry point for the metadata pipeline.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use mint_metadata::{
    generate_to_disk, patch_content_address, pending_placeholders, FileMetadataStore,
    MetadataStore, PipelineConfig,
};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "mint-metadata", version, about = "Generate and patch NFT metadata")]
struct Cli {
    /// JSON configuration file; unset fields take their defaults
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Project root holding `emojis/` and `NFTData/`, used when no config file is given
    #[arg(long, global = true, default_value = ".")]
    root: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Assign assets to token IDs and write metadata with placeholder image URIs
    Generate {
        /// Override the assignment seed
        #[arg(long)]
        seed: Option<i64>,

        /// Refuse to run if metadata from a previous run exists
        #[arg(long)]
        no_overwrite: bool,

        /// Write the assignment manifest to this path
        #[arg(long)]
        manifest: Option<PathBuf>,
    },
    /// Replace the placeholder in every record with the published content address
    Patch {
        /// Content address of the pinned image directory
        address: String,
    },
    /// Report how many records still carry the placeholder
    Status,
}

fn load_config(cli: &Cli) -> Result<PipelineConfig> {
    match &cli.config {
        Some(path) => PipelineConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display())),
        None => Ok(PipelineConfig::with_root(&cli.root)),
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let mut config = load_config(&cli)?;

    match cli.command {
        Command::Generate {
            seed,
            no_overwrite,
            manifest,
        } => {
            if let Some(seed) = seed {
                config.seed = seed;
            }
            if no_overwrite {
                config.allow_overwrite = false;
            }
            if manifest.is_some() {
                config.manifest_path = manifest;
            }

            info!("Assets: {}", config.assets_dir.display());
            info!("Template: {}", config.template_path.display());
            info!(
                "Output: {}, {}",
                config.metadata_dir.display(),
                config.images_dir.display()
            );

            let report = generate_to_disk(&config).context("metadata generation failed")?;
            info!("Assignment digest: {}", report.manifest.digest);
            if !report.summary.is_clean() {
                bail!("{} tokens failed", report.summary.failed.len());
            }
        }
        Command::Patch { address } => {
            let store = FileMetadataStore::open(&config.metadata_dir)
                .context("run `generate` before patching")?;
            let summary = patch_content_address(&store, &config.placeholder, &address)?;
            if summary.succeeded > 0 {
                info!(
                    "Example image URI: {}://{}/0.{}",
                    config.uri_scheme, address, config.asset_extension
                );
            }
            if !summary.is_clean() {
                bail!("{} records failed", summary.failed.len());
            }
        }
        Command::Status => {
            let store = FileMetadataStore::open(&config.metadata_dir)?;
            let total = store.record_ids()?.len();
            let pending = pending_placeholders(&store, &config.placeholder)?;
            info!(
                "{} of {} records still use the placeholder {}",
                pending.len(),
                total,
                config.placeholder
            );
        }
    }

    Ok(())
}
