//! Landing AI agentic document analysis client.
//!
//! One multipart POST per document. HTTP failures are classified into the
//! docpipe error taxonomy; transient failures (network errors and 5xx
//! responses) are retried a bounded number of times with linear backoff
//! before the document is given up on.

use crate::extraction::DocumentParser;
use crate::types::{Chunk, DocumentFormat, ExtractionResult};
use crate::{DocpipeError, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::path::Path;
use tokio::time::{Duration, sleep};

/// Default extraction endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://api.va.landing.ai/v1/tools/agentic-document-analysis";

/// Maximum attempts per document for transient failures.
const MAX_RETRIES: usize = 3;

/// Extraction API response envelope.
#[derive(Debug, Deserialize)]
struct ParseResponse {
    data: ParseData,
}

#[derive(Debug, Deserialize)]
struct ParseData {
    #[serde(default)]
    markdown: String,
    #[serde(default)]
    chunks: Vec<Chunk>,
}

/// HTTP client for the document extraction service.
#[derive(Debug, Clone)]
pub struct LandingAiClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl LandingAiClient {
    /// Create a client with the given API key and per-call timeout.
    ///
    /// # Errors
    ///
    /// Returns `DocpipeError::Config` if the underlying HTTP client cannot
    /// be constructed.
    pub fn new(api_key: impl Into<String>, timeout_secs: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| DocpipeError::config(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key: api_key.into(),
        })
    }

    /// Override the endpoint URL (used by tests).
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Round-trip a tiny plain-text document to confirm the API key and
    /// endpoint are usable.
    pub async fn health_check(&self) -> Result<()> {
        let payload = b"Connectivity check for the document extraction pipeline.".to_vec();
        self.post_document("connectivity_check.txt", "pdf", payload)
            .await
            .map(|_| ())
    }

    /// Upload one document and decode the response.
    async fn post_document(
        &self,
        file_name: &str,
        field: &str,
        bytes: Vec<u8>,
    ) -> Result<ExtractionResult> {
        for attempt in 0..MAX_RETRIES {
            // Multipart forms are consumed by send, so rebuild per attempt.
            let part = Part::bytes(bytes.clone()).file_name(file_name.to_string());
            let form = Form::new().part(field.to_string(), part);

            let response = self
                .client
                .post(&self.endpoint)
                .header("Authorization", format!("Basic {}", self.api_key))
                .multipart(form)
                .send()
                .await;

            match response {
                Ok(resp) => {
                    let status = resp.status();
                    if status.is_success() {
                        let parsed: ParseResponse = resp.json().await.map_err(|e| {
                            DocpipeError::parse_with_source(
                                format!("extraction API returned undecodable body for {file_name}"),
                                e,
                            )
                        })?;
                        return Ok(ExtractionResult::from_parts(
                            parsed.data.markdown,
                            parsed.data.chunks,
                        ));
                    }

                    let body = resp.text().await.unwrap_or_default();
                    let classified = classify_status(status, file_name, &body);
                    if classified.is_retryable() && attempt < MAX_RETRIES - 1 {
                        tracing::warn!(
                            file = file_name,
                            status = %status,
                            attempt = attempt + 1,
                            "extraction request failed, retrying"
                        );
                        sleep(Duration::from_millis(100 * (attempt as u64 + 1))).await;
                        continue;
                    }
                    return Err(classified);
                }
                Err(e) => {
                    if attempt < MAX_RETRIES - 1 {
                        tracing::warn!(
                            file = file_name,
                            error = %e,
                            attempt = attempt + 1,
                            "extraction request errored, retrying"
                        );
                        sleep(Duration::from_millis(100 * (attempt as u64 + 1))).await;
                        continue;
                    }
                    return Err(DocpipeError::transient_with_source(
                        format!("extraction request failed after {MAX_RETRIES} attempts"),
                        e,
                    ));
                }
            }
        }

        Err(DocpipeError::transient(format!(
            "extraction retries exhausted for {file_name}"
        )))
    }
}

#[async_trait]
impl DocumentParser for LandingAiClient {
    async fn parse(&self, path: &Path) -> Result<ExtractionResult> {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let field = match DocumentFormat::from_path(path) {
            Some(DocumentFormat::Image) => "image",
            Some(_) => "pdf",
            None => {
                return Err(DocpipeError::UnsupportedFormat(format!(
                    "no supported extension: {}",
                    path.display()
                )));
            }
        };

        let bytes = tokio::fs::read(path).await?;
        tracing::info!(file = %file_name, size = bytes.len(), "extracting document");
        self.post_document(&file_name, field, bytes).await
    }
}

/// Map a non-success HTTP status to the error taxonomy.
fn classify_status(status: StatusCode, file_name: &str, body: &str) -> DocpipeError {
    let detail = body.chars().take(200).collect::<String>();
    match status.as_u16() {
        401 | 403 => DocpipeError::Auth(format!(
            "extraction API rejected credentials ({status}): {detail}"
        )),
        429 => DocpipeError::RateLimited(format!("extraction API throttled {file_name}: {detail}")),
        415 | 422 => DocpipeError::UnsupportedFormat(format!(
            "extraction API cannot process {file_name} ({status}): {detail}"
        )),
        _ => DocpipeError::transient(format!(
            "extraction API returned {status} for {file_name}: {detail}"
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ChunkKind;
    use std::io::Write;

    fn client_for(server: &mockito::Server) -> LandingAiClient {
        LandingAiClient::new("test-key", 5)
            .unwrap()
            .with_endpoint(format!("{}/parse", server.url()))
    }

    fn write_temp_pdf(dir: &tempfile::TempDir) -> std::path::PathBuf {
        let path = dir.path().join("doc.pdf");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(b"%PDF-1.4 fake").unwrap();
        path
    }

    #[tokio::test]
    async fn test_parse_success() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/parse")
            .match_header("authorization", "Basic test-key")
            .with_status(200)
            .with_body(
                r##"{"data":{"markdown":"# Invoice","chunks":[
                    {"chunk_type":"title","text":"Invoice"},
                    {"chunk_type":"date","text":"01/02/2024"},
                    {"chunk_type":"table","text":"a|b"}
                ]}}"##,
            )
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let path = write_temp_pdf(&dir);

        let result = client_for(&server).parse(&path).await.unwrap();
        assert_eq!(result.markdown, "# Invoice");
        assert_eq!(result.chunks.len(), 3);
        assert_eq!(result.chunks[0].kind, ChunkKind::Title);
        assert_eq!(result.entities["date"], ["01/02/2024"]);
        assert_eq!(result.table_count(), 1);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_auth_error_not_retried() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/parse")
            .with_status(401)
            .with_body("invalid key")
            .expect(1)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let path = write_temp_pdf(&dir);

        let err = client_for(&server).parse(&path).await.unwrap_err();
        assert!(matches!(err, DocpipeError::Auth(_)));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_rate_limit_classified() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/parse")
            .with_status(429)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let path = write_temp_pdf(&dir);

        let err = client_for(&server).parse(&path).await.unwrap_err();
        assert!(matches!(err, DocpipeError::RateLimited(_)));
    }

    #[tokio::test]
    async fn test_unsupported_format_classified() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/parse")
            .with_status(422)
            .with_body("cannot process")
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let path = write_temp_pdf(&dir);

        let err = client_for(&server).parse(&path).await.unwrap_err();
        assert!(matches!(err, DocpipeError::UnsupportedFormat(_)));
    }

    #[tokio::test]
    async fn test_server_error_retried_then_fails() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/parse")
            .with_status(503)
            .expect(3)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let path = write_temp_pdf(&dir);

        let err = client_for(&server).parse(&path).await.unwrap_err();
        assert!(matches!(err, DocpipeError::Transient { .. }));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_server_error_then_success() {
        let mut server = mockito::Server::new_async().await;
        let failing = server
            .mock("POST", "/parse")
            .with_status(500)
            .expect(1)
            .create_async()
            .await;
        let succeeding = server
            .mock("POST", "/parse")
            .with_status(200)
            .with_body(r#"{"data":{"markdown":"ok","chunks":[]}}"#)
            .expect(1)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let path = write_temp_pdf(&dir);

        let result = client_for(&server).parse(&path).await.unwrap();
        assert_eq!(result.markdown, "ok");
        failing.assert_async().await;
        succeeding.assert_async().await;
    }

    #[tokio::test]
    async fn test_undecodable_body_is_parse_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/parse")
            .with_status(200)
            .with_body("not json")
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let path = write_temp_pdf(&dir);

        let err = client_for(&server).parse(&path).await.unwrap_err();
        assert!(matches!(err, DocpipeError::Parse { .. }));
    }

    #[tokio::test]
    async fn test_missing_file_is_io_error() {
        let server = mockito::Server::new_async().await;
        let err = client_for(&server)
            .parse(Path::new("/nonexistent/doc.pdf"))
            .await
            .unwrap_err();
        assert!(matches!(err, DocpipeError::Io(_)));
    }

    #[tokio::test]
    async fn test_health_check() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/parse")
            .with_status(200)
            .with_body(r#"{"data":{"markdown":"check","chunks":[]}}"#)
            .create_async()
            .await;

        client_for(&server).health_check().await.unwrap();
        mock.assert_async().await;
    }
}
