//! Fallback row derivation.
//!
//! When structuring is disabled, or the model reply fails validation, each
//! document still contributes a CSV row built from raw extraction metadata.
//! The row carries fixed columns so fallback-only runs have a stable schema.

use crate::types::{ExtractionResult, StructuredRow};
use std::path::Path;

/// Maximum characters of markdown carried in the `content_preview` column.
const PREVIEW_LIMIT: usize = 200;

/// Build the metadata row for a document from its raw extraction.
///
/// `result_path` is the persisted JSON dump, if persisting succeeded.
pub fn fallback_row(
    file_name: &str,
    result: &ExtractionResult,
    result_path: Option<&Path>,
) -> StructuredRow {
    let mut row = StructuredRow::new();
    row.insert("file_name".to_string(), file_name.to_string());
    row.insert("processing_status".to_string(), "succeeded".to_string());
    row.insert(
        "content_length".to_string(),
        result.markdown.chars().count().to_string(),
    );
    row.insert("chunks_count".to_string(), result.chunks.len().to_string());
    row.insert(
        "entities_count".to_string(),
        result.entity_count().to_string(),
    );
    row.insert("tables_count".to_string(), result.table_count().to_string());

    for (entity, column) in [
        ("name", "names"),
        ("date", "dates"),
        ("amount", "amounts"),
        ("address", "addresses"),
    ] {
        let joined = result
            .entities
            .get(entity)
            .map(|values| values.join("; "))
            .unwrap_or_default();
        row.insert(column.to_string(), joined);
    }

    row.insert("first_line".to_string(), first_line(&result.markdown));
    row.insert(
        "content_preview".to_string(),
        content_preview(&result.markdown),
    );
    row.insert(
        "result_file".to_string(),
        result_path
            .map(|p| p.display().to_string())
            .unwrap_or_default(),
    );
    row
}

/// First non-empty line that is not a markdown heading.
fn first_line(markdown: &str) -> String {
    body_lines(markdown).next().unwrap_or_default().to_string()
}

/// Up to the first three body lines, joined and capped at [`PREVIEW_LIMIT`].
fn content_preview(markdown: &str) -> String {
    let joined = body_lines(markdown).take(3).collect::<Vec<_>>().join(" ");
    match joined.char_indices().nth(PREVIEW_LIMIT) {
        Some((offset, _)) => joined[..offset].to_string(),
        None => joined,
    }
}

fn body_lines(markdown: &str) -> impl Iterator<Item = &str> {
    markdown
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
}
