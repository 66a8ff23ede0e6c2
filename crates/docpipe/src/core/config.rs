//! Run configuration.
//!
//! A [`RunConfig`] is constructed once per invocation from environment
//! variables plus CLI overrides and passed explicitly to every component.
//! There is no global configuration singleton.

use crate::{DocpipeError, Result};
use std::path::PathBuf;

/// Environment variable holding the extraction API key (required).
pub const EXTRACTION_API_KEY_VAR: &str = "VISION_AGENT_API_KEY";

/// Environment variable holding the structuring API key (optional).
pub const STRUCTURING_API_KEY_VAR: &str = "GOOGLE_AI_STUDIO_API_KEY";

/// Environment variable overriding the documents folder.
pub const DOCUMENTS_FOLDER_VAR: &str = "DOCUMENTS_FOLDER";

/// Environment variable overriding the output CSV path.
pub const OUTPUT_CSV_VAR: &str = "OUTPUT_CSV_FILE";

/// Environment variable overriding the results directory.
pub const RESULTS_DIR_VAR: &str = "RESULTS_SAVE_DIR";

/// Environment variable bounding concurrent in-flight API calls.
pub const MAX_CONCURRENT_VAR: &str = "DOCPIPE_MAX_CONCURRENT";

/// Environment variable for the per-call network timeout in seconds.
pub const TIMEOUT_SECS_VAR: &str = "DOCPIPE_TIMEOUT_SECS";

pub const DEFAULT_DOCUMENTS_FOLDER: &str = "documents";
pub const DEFAULT_OUTPUT_CSV: &str = "extracted_data.csv";
pub const DEFAULT_RESULTS_DIR: &str = "extraction_results";

const DEFAULT_MAX_CONCURRENT: usize = 4;
const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Configuration for one pipeline run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// API key for the document extraction service.
    pub extraction_api_key: String,

    /// API key for the structuring service (None = structuring unavailable).
    pub structuring_api_key: Option<String>,

    /// Folder scanned for input documents.
    pub documents_dir: PathBuf,

    /// Path of the CSV file written at the end of the run.
    pub output_csv: PathBuf,

    /// Directory receiving one raw JSON result per document.
    pub results_dir: PathBuf,

    /// Custom prompt for the structuring step (None = default prompt).
    pub custom_prompt: Option<String>,

    /// Whether to run the structuring step for each document.
    pub use_structuring: bool,

    /// Value written for CSV cells whose column is absent from a row.
    pub placeholder: String,

    /// Upper bound on concurrent in-flight extraction calls.
    pub max_concurrent: usize,

    /// Per-call network timeout in seconds.
    pub timeout_secs: u64,
}

impl RunConfig {
    /// Load configuration from process environment variables.
    ///
    /// # Errors
    ///
    /// Returns `DocpipeError::Config` if the extraction API key is missing
    /// or empty, or if a numeric override does not parse. This is checked
    /// before any document is touched.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration from an arbitrary variable lookup.
    ///
    /// `from_env` delegates here; tests inject a closure instead of
    /// mutating the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let extraction_api_key = lookup(EXTRACTION_API_KEY_VAR)
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| {
                DocpipeError::config(format!(
                    "missing {EXTRACTION_API_KEY_VAR}; set it in the environment before running"
                ))
            })?;

        let structuring_api_key = lookup(STRUCTURING_API_KEY_VAR).filter(|v| !v.trim().is_empty());

        let max_concurrent = parse_var(
            &lookup,
            MAX_CONCURRENT_VAR,
            DEFAULT_MAX_CONCURRENT,
        )?;
        if max_concurrent == 0 {
            return Err(DocpipeError::config(format!(
                "{MAX_CONCURRENT_VAR} must be at least 1"
            )));
        }
        let timeout_secs = parse_var(&lookup, TIMEOUT_SECS_VAR, DEFAULT_TIMEOUT_SECS)?;

        Ok(Self {
            extraction_api_key,
            structuring_api_key,
            documents_dir: PathBuf::from(
                lookup(DOCUMENTS_FOLDER_VAR).unwrap_or_else(|| DEFAULT_DOCUMENTS_FOLDER.into()),
            ),
            output_csv: PathBuf::from(
                lookup(OUTPUT_CSV_VAR).unwrap_or_else(|| DEFAULT_OUTPUT_CSV.into()),
            ),
            results_dir: PathBuf::from(
                lookup(RESULTS_DIR_VAR).unwrap_or_else(|| DEFAULT_RESULTS_DIR.into()),
            ),
            custom_prompt: None,
            use_structuring: false,
            placeholder: String::new(),
            max_concurrent,
            timeout_secs,
        })
    }

    /// Check cross-field consistency.
    ///
    /// # Errors
    ///
    /// Returns `DocpipeError::Config` when structuring is requested but no
    /// structuring API key is configured.
    pub fn validate(&self) -> Result<()> {
        if self.use_structuring && self.structuring_api_key.is_none() {
            return Err(DocpipeError::config(format!(
                "structuring requested but {STRUCTURING_API_KEY_VAR} is not set"
            )));
        }
        Ok(())
    }
}

fn parse_var<F, T>(lookup: &F, name: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| DocpipeError::config(format!("invalid value for {name}: {raw:?}"))),
        None => Ok(default),
    }
}
