//! Vendor document-extraction API client.
//!
//! The pipeline talks to the extraction service through the
//! [`DocumentParser`] trait so orchestration can be tested without network
//! access. [`LandingAiClient`] is the production implementation.

pub mod client;

pub use client::LandingAiClient;

use crate::types::ExtractionResult;
use crate::Result;
use async_trait::async_trait;
use std::path::Path;

/// Converts one document into markdown, chunks, and entities.
#[async_trait]
pub trait DocumentParser: Send + Sync {
    /// Parse a single document.
    ///
    /// # Errors
    ///
    /// Implementations classify failures as `Auth`, `RateLimited`,
    /// `UnsupportedFormat`, or `Transient`; the pipeline marks the document
    /// failed and continues the batch.
    async fn parse(&self, path: &Path) -> Result<ExtractionResult>;
}
