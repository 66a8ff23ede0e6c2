//! Docpipe - Batch Document Extraction to CSV
//!
//! Docpipe enumerates documents in a folder, sends each one to a vendor
//! document-understanding API, optionally reshapes the extracted text into
//! fixed-schema rows with a language-model API, and writes the combined
//! output to a CSV file plus one raw JSON result per document for audit.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use docpipe::{Pipeline, RunConfig};
//!
//! # async fn example() -> docpipe::Result<()> {
//! let config = RunConfig::from_env()?;
//! let pipeline = Pipeline::new(config)?;
//! let report = pipeline.run().await?;
//! println!("{}", report);
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! - **Core Module** (`core`): run configuration, document enumeration, and
//!   pipeline orchestration
//! - **Extraction** (`extraction`): vendor document-analysis API client
//! - **Structuring** (`structuring`): optional language-model client that
//!   reshapes extracted text into CSV rows
//! - **Output** (`output`): CSV writer, fallback row derivation, and raw
//!   result persistence
//!
//! Per-document failures never abort a batch; configuration errors abort
//! before any API call is made.

#![deny(unsafe_code)]

pub mod core;
pub mod error;
pub mod extraction;
pub mod output;
pub mod structuring;
pub mod types;

pub use error::{DocpipeError, Result};
pub use types::*;

pub use core::config::RunConfig;
pub use core::documents::enumerate_documents;
pub use core::pipeline::{DocumentFailure, Pipeline, RunReport};

pub use extraction::{DocumentParser, LandingAiClient};
pub use structuring::{DEFAULT_PROMPT, GeminiClient, RowStructurer};

pub use output::results::persist_result;
pub use output::rows::fallback_row;
pub use output::writer::{union_columns, write_csv, write_csv_with_columns};
