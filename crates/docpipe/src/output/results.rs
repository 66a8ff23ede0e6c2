//! Raw extraction result persistence.
//!
//! Every successful extraction is dumped as pretty-printed JSON next to the
//! CSV output so runs can be audited or re-structured later without hitting
//! the API again. A failed dump is logged by the caller and never fails the
//! document.

use crate::types::ExtractionResult;
use crate::Result;
use std::path::{Path, PathBuf};

/// Replace path-hostile characters in a file stem.
///
/// Keeps ASCII alphanumerics plus `.`, `_`, and `-`; everything else
/// becomes `_`. Last write wins if two inputs sanitize to the same stem.
pub fn sanitize_stem(file_name: &str) -> String {
    file_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Write one extraction result as `<results_dir>/<stem>.json`.
///
/// The directory is created if missing and an existing file for the same
/// document is overwritten.
///
/// # Errors
///
/// Returns `DocpipeError::Io` for filesystem errors and
/// `DocpipeError::Serialization` if the result cannot be encoded.
pub async fn persist_result(
    results_dir: &Path,
    file_name: &str,
    result: &ExtractionResult,
) -> Result<PathBuf> {
    tokio::fs::create_dir_all(results_dir).await?;

    let stem = sanitize_stem(file_name);
    let path = results_dir.join(format!("{stem}.json"));

    let encoded = serde_json::to_vec_pretty(result)?;
    tokio::fs::write(&path, encoded).await?;

    tracing::debug!(path = %path.display(), "persisted extraction result");
    Ok(path)
}
