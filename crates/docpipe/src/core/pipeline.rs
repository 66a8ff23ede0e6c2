//! Pipeline orchestration.
//!
//! One [`Pipeline::run`] call enumerates the documents folder, processes
//! each document under a concurrency bound, and writes the combined CSV.
//! Per-document failures are recorded in the [`RunReport`] and never abort
//! the batch; only configuration and enumeration errors do.

use crate::core::config::RunConfig;
use crate::core::documents::enumerate_documents;
use crate::extraction::{DocumentParser, LandingAiClient};
use crate::output::results::{persist_result, sanitize_stem};
use crate::output::rows::fallback_row;
use crate::output::writer::{write_csv, write_csv_with_columns};
use crate::structuring::{DEFAULT_PROMPT, GeminiClient, MULTI_CSV_PLACEHOLDER, PROFILES, RowStructurer};
use crate::types::{Document, StructuredRow};
use crate::{DocpipeError, Result};
use once_cell::sync::Lazy;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Shared runtime for the blocking entry points.
static GLOBAL_RUNTIME: Lazy<tokio::runtime::Runtime> = Lazy::new(|| {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("failed to create global tokio runtime")
});

/// One document that could not produce a row.
#[derive(Debug, Clone)]
pub struct DocumentFailure {
    pub file_name: String,
    pub error: String,
}

/// Summary of one pipeline run.
#[derive(Debug, Default)]
pub struct RunReport {
    /// Documents that contributed at least one row or CSV.
    pub succeeded: usize,
    /// Documents that failed outright.
    pub failed: usize,
    /// Files skipped for unsupported extensions.
    pub skipped: usize,
    /// Failure detail, in document order.
    pub failures: Vec<DocumentFailure>,
    /// Path of the CSV written by a single-CSV run.
    pub output_csv: Option<PathBuf>,
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} succeeded, {} failed, {} skipped",
            self.succeeded, self.failed, self.skipped
        )?;
        if let Some(path) = &self.output_csv {
            write!(f, " -> {}", path.display())?;
        }
        for failure in &self.failures {
            write!(f, "\n  {}: {}", failure.file_name, failure.error)?;
        }
        Ok(())
    }
}

enum DocOutcome {
    Row(StructuredRow),
    Failed(String),
}

/// Batch document-to-CSV pipeline.
pub struct Pipeline {
    config: RunConfig,
    parser: Arc<dyn DocumentParser>,
    structurer: Option<Arc<dyn RowStructurer>>,
}

impl Pipeline {
    /// Build a pipeline with production API clients.
    ///
    /// # Errors
    ///
    /// Returns `DocpipeError::Config` if the configuration is inconsistent
    /// or an HTTP client cannot be constructed.
    pub fn new(config: RunConfig) -> Result<Self> {
        config.validate()?;

        let parser: Arc<dyn DocumentParser> = Arc::new(LandingAiClient::new(
            config.extraction_api_key.clone(),
            config.timeout_secs,
        )?);

        let structurer: Option<Arc<dyn RowStructurer>> = match &config.structuring_api_key {
            Some(key) if config.use_structuring => Some(Arc::new(GeminiClient::new(
                key.clone(),
                config.timeout_secs,
            )?)),
            _ => None,
        };

        Ok(Self {
            config,
            parser,
            structurer,
        })
    }

    /// Build a pipeline with caller-supplied clients (used by tests).
    ///
    /// # Errors
    ///
    /// Returns `DocpipeError::Config` if the configuration is inconsistent.
    pub fn with_clients(
        config: RunConfig,
        parser: Arc<dyn DocumentParser>,
        structurer: Option<Arc<dyn RowStructurer>>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            parser,
            structurer,
        })
    }

    /// Process every document and write the combined CSV.
    ///
    /// Rows appear in file-name order regardless of completion order, so
    /// two runs over the same inputs produce byte-identical CSV output.
    ///
    /// # Errors
    ///
    /// Returns an error if the documents folder cannot be read or the CSV
    /// cannot be written. Per-document failures are reported, not raised.
    pub async fn run(&self) -> Result<RunReport> {
        let enumeration = enumerate_documents(&self.config.documents_dir)?;
        let prompt = self
            .config
            .custom_prompt
            .clone()
            .unwrap_or_else(|| DEFAULT_PROMPT.to_string());

        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent));
        let mut tasks = JoinSet::new();

        for (index, document) in enumeration.documents.into_iter().enumerate() {
            let semaphore = Arc::clone(&semaphore);
            let parser = Arc::clone(&self.parser);
            let structurer = self.structurer.clone();
            let results_dir = self.config.results_dir.clone();
            let prompt = prompt.clone();

            tasks.spawn(async move {
                let _permit = semaphore.acquire().await;
                let file_name = document.file_name();
                let outcome =
                    process_document(&*parser, structurer.as_deref(), &results_dir, &prompt, &document)
                        .await;
                (index, file_name, outcome)
            });
        }

        let mut completed: Vec<(usize, String, DocOutcome)> = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            let item = joined
                .map_err(|e| DocpipeError::Other(format!("document task panicked: {e}")))?;
            completed.push(item);
        }
        completed.sort_by_key(|(index, _, _)| *index);

        let mut report = RunReport {
            skipped: enumeration.skipped,
            ..RunReport::default()
        };
        let mut rows = Vec::new();

        for (_, file_name, outcome) in completed {
            match outcome {
                DocOutcome::Row(row) => {
                    report.succeeded += 1;
                    rows.push(row);
                }
                DocOutcome::Failed(error) => {
                    tracing::error!(file = %file_name, error = %error, "document failed");
                    report.failed += 1;
                    report.failures.push(DocumentFailure { file_name, error });
                }
            }
        }

        write_csv(&self.config.output_csv, &rows, &self.config.placeholder)?;
        report.output_csv = Some(self.config.output_csv.clone());

        tracing::info!(%report, "run complete");
        Ok(report)
    }

    /// Blocking wrapper around [`Pipeline::run`].
    ///
    /// # Errors
    ///
    /// Same as [`Pipeline::run`].
    pub fn run_sync(&self) -> Result<RunReport> {
        GLOBAL_RUNTIME.block_on(self.run())
    }

    /// Process every document into one CSV per profile under `output_dir`.
    ///
    /// Each document gets a subdirectory named after its sanitized file
    /// stem holding one CSV per profile. A document counts as succeeded if
    /// at least one of its profile CSVs was written.
    ///
    /// # Errors
    ///
    /// Returns `DocpipeError::Config` if no structurer is configured, plus
    /// enumeration errors. Per-document failures are reported, not raised.
    pub async fn run_multi_csv(&self, output_dir: &Path) -> Result<RunReport> {
        let structurer = self.structurer.clone().ok_or_else(|| {
            DocpipeError::config("multi-CSV mode requires a structuring API key")
        })?;

        let enumeration = enumerate_documents(&self.config.documents_dir)?;
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent));
        let mut tasks = JoinSet::new();

        for (index, document) in enumeration.documents.into_iter().enumerate() {
            let semaphore = Arc::clone(&semaphore);
            let parser = Arc::clone(&self.parser);
            let structurer = Arc::clone(&structurer);
            let results_dir = self.config.results_dir.clone();
            let output_dir = output_dir.to_path_buf();

            tasks.spawn(async move {
                let _permit = semaphore.acquire().await;
                let file_name = document.file_name();
                let outcome = process_document_profiles(
                    &*parser,
                    &*structurer,
                    &results_dir,
                    &output_dir,
                    &document,
                )
                .await;
                (index, file_name, outcome)
            });
        }

        let mut completed: Vec<(usize, String, std::result::Result<usize, String>)> = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            let item = joined
                .map_err(|e| DocpipeError::Other(format!("document task panicked: {e}")))?;
            completed.push(item);
        }
        completed.sort_by_key(|(index, _, _)| *index);

        let mut report = RunReport {
            skipped: enumeration.skipped,
            ..RunReport::default()
        };
        for (_, file_name, outcome) in completed {
            match outcome {
                Ok(written) => {
                    tracing::info!(file = %file_name, csvs = written, "document complete");
                    report.succeeded += 1;
                }
                Err(error) => {
                    tracing::error!(file = %file_name, error = %error, "document failed");
                    report.failed += 1;
                    report.failures.push(DocumentFailure { file_name, error });
                }
            }
        }

        tracing::info!(%report, "multi-CSV run complete");
        Ok(report)
    }

    /// Blocking wrapper around [`Pipeline::run_multi_csv`].
    ///
    /// # Errors
    ///
    /// Same as [`Pipeline::run_multi_csv`].
    pub fn run_multi_csv_sync(&self, output_dir: &Path) -> Result<RunReport> {
        GLOBAL_RUNTIME.block_on(self.run_multi_csv(output_dir))
    }
}

/// Extract one document and derive its CSV row.
async fn process_document(
    parser: &dyn DocumentParser,
    structurer: Option<&dyn RowStructurer>,
    results_dir: &Path,
    prompt: &str,
    document: &Document,
) -> DocOutcome {
    let file_name = document.file_name();

    let result = match parser.parse(&document.path).await {
        Ok(result) => result,
        Err(e) => return DocOutcome::Failed(e.to_string()),
    };

    let result_path = match persist_result(results_dir, &file_name, &result).await {
        Ok(path) => Some(path),
        Err(e) => {
            tracing::warn!(file = %file_name, error = %e, "failed to persist raw result");
            None
        }
    };

    let Some(structurer) = structurer else {
        return DocOutcome::Row(fallback_row(&file_name, &result, result_path.as_deref()));
    };

    match structurer.structure(&result.markdown, prompt).await {
        Ok(rows) => {
            // Key-less objects pass JSON validation but carry no cells, so
            // they count as no reply at all.
            let mut rows: Vec<StructuredRow> =
                rows.into_iter().filter(|row| !row.is_empty()).collect();
            if rows.is_empty() {
                tracing::warn!(file = %file_name, "structurer returned no rows, using fallback");
                return DocOutcome::Row(fallback_row(&file_name, &result, result_path.as_deref()));
            }
            if rows.len() > 1 {
                tracing::warn!(
                    file = %file_name,
                    extra = rows.len() - 1,
                    "structurer returned multiple rows, keeping the first"
                );
            }
            DocOutcome::Row(rows.swap_remove(0))
        }
        Err(e @ DocpipeError::Parse { .. }) => {
            tracing::warn!(file = %file_name, error = %e, "structuring reply invalid, using fallback");
            DocOutcome::Row(fallback_row(&file_name, &result, result_path.as_deref()))
        }
        Err(e) => DocOutcome::Failed(e.to_string()),
    }
}

/// Extract one document and write its per-profile CSVs.
///
/// Returns the number of profile CSVs written, or an error string when the
/// extraction failed or no profile produced output.
async fn process_document_profiles(
    parser: &dyn DocumentParser,
    structurer: &dyn RowStructurer,
    results_dir: &Path,
    output_dir: &Path,
    document: &Document,
) -> std::result::Result<usize, String> {
    let file_name = document.file_name();

    let result = parser
        .parse(&document.path)
        .await
        .map_err(|e| e.to_string())?;

    if let Err(e) = persist_result(results_dir, &file_name, &result).await {
        tracing::warn!(file = %file_name, error = %e, "failed to persist raw result");
    }

    let stem = sanitize_stem(
        document
            .path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| file_name.clone())
            .as_str(),
    );
    let document_dir = output_dir.join(stem);

    let mut written = 0;
    let mut last_error = None;
    for profile in PROFILES {
        match structurer.structure(&result.markdown, &profile.prompt()).await {
            Ok(rows) => {
                let columns: Vec<String> =
                    profile.columns.iter().map(|c| c.to_string()).collect();
                let path = document_dir.join(format!("{}.csv", profile.name));
                match write_csv_with_columns(&path, &columns, &rows, MULTI_CSV_PLACEHOLDER) {
                    Ok(()) => written += 1,
                    Err(e) => {
                        tracing::warn!(
                            file = %file_name,
                            profile = profile.name,
                            error = %e,
                            "failed to write profile CSV"
                        );
                        last_error = Some(e.to_string());
                    }
                }
            }
            Err(e) => {
                tracing::warn!(
                    file = %file_name,
                    profile = profile.name,
                    error = %e,
                    "profile structuring failed"
                );
                last_error = Some(e.to_string());
            }
        }
    }

    if written == 0 {
        Err(last_error.unwrap_or_else(|| "no profile produced output".to_string()))
    } else {
        Ok(written)
    }
}
