//! Document enumeration.
//!
//! Lists regular files in the documents folder (non-recursive), classifies
//! them by extension, and sorts by file name so row order is deterministic
//! for a given input set.

use crate::types::{Document, DocumentFormat};
use crate::{DocpipeError, Result};
use std::path::Path;

/// Outcome of scanning the documents folder.
#[derive(Debug)]
pub struct Enumeration {
    /// Supported documents, sorted by file name.
    pub documents: Vec<Document>,
    /// Number of files skipped for having an unsupported extension.
    pub skipped: usize,
}

/// Enumerate supported documents in `dir`.
///
/// Files with unsupported extensions are skipped with a warning and
/// counted; subdirectories are not descended into.
///
/// # Errors
///
/// Returns `DocpipeError::Validation` if `dir` does not exist or is not a
/// directory, and `DocpipeError::Io` for read errors.
pub fn enumerate_documents(dir: impl AsRef<Path>) -> Result<Enumeration> {
    let dir = dir.as_ref();

    if !dir.is_dir() {
        return Err(DocpipeError::validation(format!(
            "documents folder not found: {}",
            dir.display()
        )));
    }

    let mut documents = Vec::new();
    let mut skipped = 0;

    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        match DocumentFormat::from_path(&path) {
            Some(format) => documents.push(Document::new(path, format)),
            None => {
                tracing::warn!(file = %path.display(), "skipping unsupported file");
                skipped += 1;
            }
        }
    }

    documents.sort_by(|a, b| a.path.cmp(&b.path));

    tracing::info!(
        count = documents.len(),
        skipped,
        folder = %dir.display(),
        "enumerated documents"
    );

    Ok(Enumeration { documents, skipped })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use tempfile::tempdir;

    #[test]
    fn test_enumerate_sorted_and_filtered() {
        let dir = tempdir().unwrap();
        File::create(dir.path().join("b.pdf")).unwrap();
        File::create(dir.path().join("a.docx")).unwrap();
        File::create(dir.path().join("notes.txt")).unwrap();
        File::create(dir.path().join("archive.zip")).unwrap();
        File::create(dir.path().join("README")).unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        File::create(dir.path().join("nested").join("deep.pdf")).unwrap();

        let result = enumerate_documents(dir.path()).unwrap();

        let names: Vec<String> = result.documents.iter().map(Document::file_name).collect();
        assert_eq!(names, ["a.docx", "b.pdf", "notes.txt"]);
        assert_eq!(result.skipped, 2);
    }

    #[test]
    fn test_enumerate_formats() {
        let dir = tempdir().unwrap();
        File::create(dir.path().join("scan.TIFF")).unwrap();

        let result = enumerate_documents(dir.path()).unwrap();
        assert_eq!(result.documents.len(), 1);
        assert_eq!(result.documents[0].format, DocumentFormat::Image);
    }

    #[test]
    fn test_enumerate_missing_folder() {
        let result = enumerate_documents("/nonexistent/documents");
        assert!(matches!(
            result.unwrap_err(),
            DocpipeError::Validation { .. }
        ));
    }

    #[test]
    fn test_enumerate_empty_folder() {
        let dir = tempdir().unwrap();
        let result = enumerate_documents(dir.path()).unwrap();
        assert!(result.documents.is_empty());
        assert_eq!(result.skipped, 0);
    }
}
