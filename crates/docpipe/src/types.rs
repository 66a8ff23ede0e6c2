use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// One flattened record destined for one CSV line.
///
/// Insertion order is preserved so the CSV column set can be computed as
/// the union of keys in first-seen order across a run.
pub type StructuredRow = IndexMap<String, String>;

/// File extensions accepted by the document enumerator, without the dot.
pub const SUPPORTED_EXTENSIONS: &[&str] = &[
    "pdf", "jpg", "jpeg", "png", "tif", "tiff", "gif", "bmp", "doc", "docx", "xls", "xlsx", "ppt",
    "pptx", "txt",
];

/// Coarse format classification for an input document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentFormat {
    Pdf,
    Image,
    Office,
    Text,
}

impl DocumentFormat {
    /// Classify a path by its extension (case-insensitive).
    ///
    /// Returns `None` for unsupported extensions or paths without one.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "pdf" => Some(Self::Pdf),
            "jpg" | "jpeg" | "png" | "tif" | "tiff" | "gif" | "bmp" => Some(Self::Image),
            "doc" | "docx" | "xls" | "xlsx" | "ppt" | "pptx" => Some(Self::Office),
            "txt" => Some(Self::Text),
            _ => None,
        }
    }
}

/// Per-document processing state within one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingStatus {
    Pending,
    Succeeded,
    Failed,
    Skipped,
}

/// An input document discovered by the enumerator.
///
/// Exists only for the duration of one run; nothing is persisted beyond
/// the CSV output and the optional raw JSON dump.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub path: PathBuf,
    pub format: DocumentFormat,
    pub status: ProcessingStatus,
}

impl Document {
    pub fn new(path: PathBuf, format: DocumentFormat) -> Self {
        Self {
            path,
            format,
            status: ProcessingStatus::Pending,
        }
    }

    /// File name component of the document path, lossy-decoded.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Type tag carried by each content chunk returned by the extraction API.
///
/// Entity-like kinds (name, date, amount, address) are collected into the
/// entity map on [`ExtractionResult`]; unknown tags deserialize as `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkKind {
    Title,
    PageHeader,
    PageFooter,
    Text,
    Table,
    Figure,
    Marginalia,
    Name,
    Date,
    Amount,
    Address,
    #[serde(other)]
    Other,
}

impl ChunkKind {
    /// Stable snake_case name, used as the entity map key.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::PageHeader => "page_header",
            Self::PageFooter => "page_footer",
            Self::Text => "text",
            Self::Table => "table",
            Self::Figure => "figure",
            Self::Marginalia => "marginalia",
            Self::Name => "name",
            Self::Date => "date",
            Self::Amount => "amount",
            Self::Address => "address",
            Self::Other => "other",
        }
    }

    /// Whether this chunk carries a recognized entity value.
    pub fn is_entity(&self) -> bool {
        matches!(self, Self::Name | Self::Date | Self::Amount | Self::Address)
    }
}

/// A single content segment from the extraction API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    #[serde(rename = "chunk_type")]
    pub kind: ChunkKind,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

/// Per-document extraction output.
///
/// `entities` maps entity type (e.g. "date") to the extracted values in
/// chunk order. It is derived from entity-like chunks at construction time
/// so downstream consumers never re-scan the chunk list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub markdown: String,
    pub chunks: Vec<Chunk>,
    #[serde(default)]
    pub entities: IndexMap<String, Vec<String>>,
}

impl ExtractionResult {
    /// Build a result from the raw API payload, deriving the entity map.
    pub fn from_parts(markdown: String, chunks: Vec<Chunk>) -> Self {
        let mut entities: IndexMap<String, Vec<String>> = IndexMap::new();
        for chunk in &chunks {
            if chunk.kind.is_entity() {
                entities
                    .entry(chunk.kind.as_str().to_string())
                    .or_default()
                    .push(chunk.text.clone());
            }
        }
        Self {
            markdown,
            chunks,
            entities,
        }
    }

    /// Number of table chunks in the document.
    pub fn table_count(&self) -> usize {
        self.chunks
            .iter()
            .filter(|c| c.kind == ChunkKind::Table)
            .count()
    }

    /// Total number of extracted entity values across all types.
    pub fn entity_count(&self) -> usize {
        self.entities.values().map(Vec::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_path() {
        assert_eq!(
            DocumentFormat::from_path(Path::new("a/b/report.PDF")),
            Some(DocumentFormat::Pdf)
        );
        assert_eq!(
            DocumentFormat::from_path(Path::new("scan.jpeg")),
            Some(DocumentFormat::Image)
        );
        assert_eq!(
            DocumentFormat::from_path(Path::new("deck.pptx")),
            Some(DocumentFormat::Office)
        );
        assert_eq!(
            DocumentFormat::from_path(Path::new("notes.txt")),
            Some(DocumentFormat::Text)
        );
        assert_eq!(DocumentFormat::from_path(Path::new("archive.zip")), None);
        assert_eq!(DocumentFormat::from_path(Path::new("no_extension")), None);
    }

    #[test]
    fn test_supported_extensions_classify() {
        for ext in SUPPORTED_EXTENSIONS {
            let path = PathBuf::from(format!("doc.{ext}"));
            assert!(
                DocumentFormat::from_path(&path).is_some(),
                "extension {ext} must classify"
            );
        }
    }

    #[test]
    fn test_chunk_kind_unknown_deserializes_as_other() {
        let chunk: Chunk =
            serde_json::from_str(r#"{"chunk_type":"hologram","text":"x"}"#).unwrap();
        assert_eq!(chunk.kind, ChunkKind::Other);
    }

    #[test]
    fn test_chunk_kind_known_tags() {
        let chunk: Chunk =
            serde_json::from_str(r#"{"chunk_type":"table","text":"a|b","confidence":0.9}"#)
                .unwrap();
        assert_eq!(chunk.kind, ChunkKind::Table);
        assert_eq!(chunk.confidence, Some(0.9));
    }

    #[test]
    fn test_from_parts_derives_entities_in_order() {
        let chunks = vec![
            Chunk {
                kind: ChunkKind::Date,
                text: "01/02/2024".to_string(),
                confidence: None,
            },
            Chunk {
                kind: ChunkKind::Text,
                text: "body".to_string(),
                confidence: None,
            },
            Chunk {
                kind: ChunkKind::Name,
                text: "Ada Lovelace".to_string(),
                confidence: None,
            },
            Chunk {
                kind: ChunkKind::Date,
                text: "03/04/2024".to_string(),
                confidence: None,
            },
        ];
        let result = ExtractionResult::from_parts("# Doc".to_string(), chunks);

        let keys: Vec<&String> = result.entities.keys().collect();
        assert_eq!(keys, ["date", "name"]);
        assert_eq!(result.entities["date"], ["01/02/2024", "03/04/2024"]);
        assert_eq!(result.entity_count(), 3);
        assert_eq!(result.table_count(), 0);
    }

    #[test]
    fn test_document_file_name() {
        let doc = Document::new(PathBuf::from("documents/invoice.pdf"), DocumentFormat::Pdf);
        assert_eq!(doc.file_name(), "invoice.pdf");
        assert_eq!(doc.status, ProcessingStatus::Pending);
    }
}
