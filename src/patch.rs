//! Publish phase: swap the placeholder in every record's `image` for the
//! content address the pinned image directory received.

use crate::error::MetadataError;
use crate::outcome::{BatchSummary, ItemOutcome};
use crate::store::MetadataStore;
use log::{debug, error, info, warn};
use serde_json::Value;

const PROGRESS_INTERVAL: usize = 500;

/// Reason reported for records that no longer carry the placeholder
pub const ALREADY_PATCHED: &str = "already has a content address";

/// Reason reported for records without a usable `image` field
pub const NO_IMAGE: &str = "no image field";

/// Replace `placeholder` with `address` in the `image` field of every stored record
///
/// Records are visited in numeric token order. Running this twice with the
/// same address leaves the second run with nothing but skips.
///
/// # Parameters
/// * `store` - The store holding the generated records
/// * `placeholder` - The stand-in written during generation
/// * `address` - The real content address
///
/// # Returns
/// The per-record summary, or an error if the inputs or the record listing are unusable
pub fn patch_content_address<S: MetadataStore + ?Sized>(
    store: &S,
    placeholder: &str,
    address: &str,
) -> Result<BatchSummary, MetadataError> {
    if placeholder.is_empty() {
        return Err(MetadataError::InvalidContentAddress(
            "placeholder must not be empty".to_string(),
        ));
    }
    let address = address.trim();
    if address.is_empty() {
        return Err(MetadataError::InvalidContentAddress(
            "content address must not be empty".to_string(),
        ));
    }
    if address.contains(placeholder) {
        return Err(MetadataError::InvalidContentAddress(format!(
            "'{address}' still contains the placeholder"
        )));
    }

    let ids = store.record_ids()?;
    info!("Found {} metadata records to update", ids.len());

    let mut summary = BatchSummary::new();
    for token_id in ids {
        let outcome = patch_record(store, token_id, placeholder, address);
        match &outcome {
            ItemOutcome::Success => {
                if (summary.succeeded + 1) % PROGRESS_INTERVAL == 0 {
                    info!("Progress: updated {} records", summary.succeeded + 1);
                }
            }
            ItemOutcome::Skipped(reason) => debug!("Skipping token {} - {}", token_id, reason),
            ItemOutcome::Failed(e) => error!("Error processing token {}: {}", token_id, e),
        }
        summary.record(token_id, outcome);
    }

    info!("Content address update complete: {}", summary);
    Ok(summary)
}

/// Patch a single record in place
pub fn patch_record<S: MetadataStore + ?Sized>(
    store: &S,
    token_id: u64,
    placeholder: &str,
    address: &str,
) -> ItemOutcome {
    let mut record = match store.get_record(token_id) {
        Ok(Some(record)) => record,
        Ok(None) => return ItemOutcome::Failed("record not found".to_string()),
        Err(e) => return ItemOutcome::Failed(e.to_string()),
    };

    let patched = match record.image() {
        Some(Value::String(image)) if image.contains(placeholder) => {
            image.replacen(placeholder, address, 1)
        }
        Some(Value::String(image)) if !image.is_empty() => {
            return ItemOutcome::Skipped(ALREADY_PATCHED.to_string());
        }
        None | Some(Value::Null) | Some(Value::String(_)) => {
            warn!("Token {} has no image field", token_id);
            return ItemOutcome::Skipped(NO_IMAGE.to_string());
        }
        Some(other) => {
            return ItemOutcome::Failed(format!("image field is not a string: {other}"));
        }
    };

    record.set_image(patched);
    match store.put_record(token_id, &record) {
        Ok(()) => ItemOutcome::Success,
        Err(e) => ItemOutcome::Failed(e.to_string()),
    }
}

/// Token IDs whose records still carry the placeholder
///
/// Unreadable records are logged and left out.
pub fn pending_placeholders<S: MetadataStore + ?Sized>(
    store: &S,
    placeholder: &str,
) -> Result<Vec<u64>, MetadataError> {
    let mut pending = Vec::new();
    for token_id in store.record_ids()? {
        match store.get_record(token_id) {
            Ok(Some(record)) => {
                if let Some(Value::String(image)) = record.image() {
                    if image.contains(placeholder) {
                        pending.push(token_id);
                    }
                }
            }
            Ok(None) => {}
            Err(e) => warn!("Could not read record {}: {}", token_id, e),
        }
    }
    Ok(pending)
}
