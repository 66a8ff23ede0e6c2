//! CSV output.
//!
//! The header is the union of all row keys in first-seen order; absent keys
//! are filled with the caller's placeholder. Output is byte-deterministic
//! for identical input order.

use crate::types::StructuredRow;
use crate::Result;
use std::path::Path;

/// Union of row keys across all rows, preserving first-seen order.
pub fn union_columns(rows: &[StructuredRow]) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();
    for row in rows {
        for key in row.keys() {
            if !columns.iter().any(|c| c == key) {
                columns.push(key.clone());
            }
        }
    }
    columns
}

/// Write rows to `path` with a header computed by [`union_columns`].
///
/// With no rows an empty file is still created so the output path always
/// exists after a run. Parent directories are created as needed.
///
/// # Errors
///
/// Returns `DocpipeError::Io` for filesystem errors and
/// `DocpipeError::Serialization` for CSV encoding errors.
pub fn write_csv(path: impl AsRef<Path>, rows: &[StructuredRow], placeholder: &str) -> Result<()> {
    let columns = union_columns(rows);
    write_records(path.as_ref(), &columns, rows, placeholder)
}

/// Write rows to `path` with a fixed column set.
///
/// Used by multi-CSV profiles, where the schema is pinned up front and row
/// keys outside it are dropped.
///
/// # Errors
///
/// Same as [`write_csv`].
pub fn write_csv_with_columns(
    path: impl AsRef<Path>,
    columns: &[String],
    rows: &[StructuredRow],
    placeholder: &str,
) -> Result<()> {
    write_records(path.as_ref(), columns, rows, placeholder)
}

fn write_records(
    path: &Path,
    columns: &[String],
    rows: &[StructuredRow],
    placeholder: &str,
) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }

    let mut writer = csv::Writer::from_path(path)?;

    if !columns.is_empty() {
        writer.write_record(columns)?;
        for row in rows {
            let record = columns
                .iter()
                .map(|column| row.get(column).map(String::as_str).unwrap_or(placeholder));
            writer.write_record(record)?;
        }
    }

    writer.flush()?;
    tracing::info!(
        path = %path.display(),
        rows = rows.len(),
        columns = columns.len(),
        "wrote CSV"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn row(pairs: &[(&str, &str)]) -> StructuredRow {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_union_columns_first_seen_order() {
        let rows = vec![
            row(&[("b", "1"), ("a", "2")]),
            row(&[("a", "3"), ("c", "4")]),
        ];
        assert_eq!(union_columns(&rows), ["b", "a", "c"]);
    }

    #[test]
    fn test_write_csv_fills_placeholder() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.csv");

        let rows = vec![row(&[("name", "Ada")]), row(&[("name", "Alan"), ("age", "41")])];
        write_csv(&path, &rows, "n/a").unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "name,age\nAda,n/a\nAlan,41\n");
    }

    #[test]
    fn test_write_csv_deterministic() {
        let dir = tempdir().unwrap();
        let first = dir.path().join("a.csv");
        let second = dir.path().join("b.csv");

        let rows = vec![
            row(&[("x", "1"), ("y", "2")]),
            row(&[("y", "3"), ("z", "4")]),
        ];
        write_csv(&first, &rows, "").unwrap();
        write_csv(&second, &rows, "").unwrap();

        assert_eq!(
            std::fs::read(&first).unwrap(),
            std::fs::read(&second).unwrap()
        );
    }

    #[test]
    fn test_write_csv_empty_rows_creates_empty_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.csv");

        write_csv(&path, &[], "").unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"");
    }

    #[test]
    fn test_write_csv_creates_parent_dirs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("deep/nested/out.csv");

        write_csv(&path, &[row(&[("a", "1")])], "").unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_write_csv_with_fixed_columns_drops_extras() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("fixed.csv");

        let columns = vec!["a".to_string(), "b".to_string()];
        let rows = vec![row(&[("a", "1"), ("unknown", "x")])];
        write_csv_with_columns(&path, &columns, &rows, "Not specified").unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "a,b\n1,Not specified\n");
    }

    #[test]
    fn test_write_csv_quotes_embedded_commas() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("quoted.csv");

        let rows = vec![row(&[("note", "one, two"), ("plain", "three")])];
        write_csv(&path, &rows, "").unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "note,plain\n\"one, two\",three\n");
    }
}
