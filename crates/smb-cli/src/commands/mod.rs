//! Subcommand implementations.

pub mod assign;
pub mod check;
pub mod inspect;
pub mod new;
pub mod plan;

use anyhow::{Context, Result};
use std::path::Path;

use smb_core::BucketMetadata;

/// Reads and decodes a descriptor file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or does not hold a valid descriptor.
pub fn load_descriptor(path: &Path) -> Result<BucketMetadata> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    BucketMetadata::from_canonical_str(text.trim())
        .with_context(|| format!("invalid descriptor in {}", path.display()))
}

/// Reads and decodes several descriptor files, in order.
///
/// # Errors
///
/// Returns the first load failure.
pub fn load_descriptors(paths: &[std::path::PathBuf]) -> Result<Vec<BucketMetadata>> {
    paths.iter().map(|p| load_descriptor(p)).collect()
}
