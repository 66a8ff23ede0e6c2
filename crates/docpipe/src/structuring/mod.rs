//! Optional language-model structuring step.
//!
//! Given extracted document text and a prompt, the structurer returns a
//! strictly validated JSON array of flat objects, each becoming one CSV
//! row. A reply that fails validation yields `DocpipeError::Parse` and the
//! pipeline falls back to the raw extraction row for that document; the
//! document is never dropped silently.

pub mod client;
pub mod parse;
pub mod profiles;

pub use client::GeminiClient;
pub use parse::parse_rows;
pub use profiles::{CsvProfile, MULTI_CSV_PLACEHOLDER, PROFILES};

use crate::types::StructuredRow;
use crate::Result;
use async_trait::async_trait;

/// Prompt used when the caller supplies no custom prompt.
pub const DEFAULT_PROMPT: &str = "\
You are an expert data analyst. Analyze the extracted document text and \
produce one structured record describing the document.

Return ONLY a JSON array containing a single flat object. Use concise \
snake_case keys, scalar values only, and include the most relevant fields: \
document title or subject, key names, dates, amounts, and addresses. Use an \
empty string for information that is not present. Do not wrap the JSON in \
markdown fences or add any commentary.";

/// Reshapes extracted text into flat CSV rows.
#[async_trait]
pub trait RowStructurer: Send + Sync {
    /// Produce rows for one document's extracted text.
    ///
    /// # Errors
    ///
    /// Returns `DocpipeError::Parse` when the model reply is not a JSON
    /// array of flat objects, and `Auth`/`RateLimited`/`Transient` for API
    /// failures.
    async fn structure(&self, text: &str, prompt: &str) -> Result<Vec<StructuredRow>>;
}
