//! Google AI Studio (Gemini) client for the structuring step.
//!
//! One `generateContent` POST per document. Document text is truncated
//! before prompting so oversized documents cannot oversize the request;
//! the reply goes through strict row validation in [`super::parse`].

use crate::structuring::{RowStructurer, parse::parse_rows};
use crate::types::StructuredRow;
use crate::{DocpipeError, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tokio::time::{Duration, sleep};

/// Default API base URL.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default model identifier.
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

/// Maximum document characters forwarded to the model.
const MAX_DOCUMENT_CHARS: usize = 15_000;

/// Maximum attempts per call for transient failures.
const MAX_RETRIES: usize = 3;

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<TextPart>,
}

#[derive(Debug, Serialize)]
struct TextPart {
    text: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

/// HTTP client for the structuring service.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl GeminiClient {
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
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key: api_key.into(),
        })
    }

    /// Override the API base URL (used by tests).
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn request_url(&self) -> String {
        format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        )
    }

    /// Send one prompt and return the first candidate's text.
    async fn generate(&self, prompt: String) -> Result<String> {
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![TextPart { text: prompt }],
            }],
        };
        let url = self.request_url();

        for attempt in 0..MAX_RETRIES {
            let response = self.client.post(&url).json(&request).send().await;

            match response {
                Ok(resp) => {
                    let status = resp.status();
                    if status.is_success() {
                        let decoded: GenerateResponse = resp.json().await.map_err(|e| {
                            DocpipeError::parse_with_source(
                                "structuring API returned undecodable body",
                                e,
                            )
                        })?;
                        let text = decoded
                            .candidates
                            .into_iter()
                            .next()
                            .map(|c| {
                                c.content
                                    .parts
                                    .into_iter()
                                    .map(|p| p.text)
                                    .collect::<String>()
                            })
                            .unwrap_or_default();
                        if text.is_empty() {
                            return Err(DocpipeError::parse(
                                "structuring API returned no candidates",
                            ));
                        }
                        return Ok(text);
                    }

                    let body = resp.text().await.unwrap_or_default();
                    let classified = classify_status(status, &body);
                    if classified.is_retryable() && attempt < MAX_RETRIES - 1 {
                        tracing::warn!(
                            status = %status,
                            attempt = attempt + 1,
                            "structuring request failed, retrying"
                        );
                        sleep(Duration::from_millis(100 * (attempt as u64 + 1))).await;
                        continue;
                    }
                    return Err(classified);
                }
                Err(e) => {
                    if attempt < MAX_RETRIES - 1 {
                        sleep(Duration::from_millis(100 * (attempt as u64 + 1))).await;
                        continue;
                    }
                    return Err(DocpipeError::transient_with_source(
                        format!("structuring request failed after {MAX_RETRIES} attempts"),
                        e,
                    ));
                }
            }
        }

        Err(DocpipeError::transient("structuring retries exhausted"))
    }
}

#[async_trait]
impl RowStructurer for GeminiClient {
    async fn structure(&self, text: &str, prompt: &str) -> Result<Vec<StructuredRow>> {
        let truncated = truncate_chars(text, MAX_DOCUMENT_CHARS);
        let full_prompt = format!("{prompt}\n\nDocument content to analyze:\n{truncated}");

        let reply = self.generate(full_prompt).await?;
        parse_rows(&reply)
    }
}

/// Map a non-success HTTP status to the error taxonomy.
fn classify_status(status: StatusCode, body: &str) -> DocpipeError {
    let detail = body.chars().take(200).collect::<String>();
    match status.as_u16() {
        401 | 403 => DocpipeError::Auth(format!(
            "structuring API rejected credentials ({status}): {detail}"
        )),
        429 => DocpipeError::RateLimited(format!("structuring API throttled: {detail}")),
        _ => DocpipeError::transient(format!("structuring API returned {status}: {detail}")),
    }
}

/// Truncate on a character boundary without splitting a code point.
fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((offset, _)) => &text[..offset],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client_for(server: &mockito::Server) -> GeminiClient {
        GeminiClient::new("gem-key", 5)
            .unwrap()
            .with_base_url(server.url())
    }

    fn reply_body(text: &str) -> String {
        serde_json::json!({
            "candidates": [{"content": {"parts": [{"text": text}]}}]
        })
        .to_string()
    }

    const GENERATE_PATH: &str = "/models/gemini-1.5-flash:generateContent";

    #[tokio::test]
    async fn test_structure_success() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", GENERATE_PATH)
            .match_query(mockito::Matcher::UrlEncoded("key".into(), "gem-key".into()))
            .with_status(200)
            .with_body(reply_body(r#"[{"title":"Invoice 7","total":"120.50"}]"#))
            .create_async()
            .await;

        let rows = client_for(&server)
            .structure("# Invoice 7\nTotal: 120.50", "extract fields")
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["title"], "Invoice 7");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_structure_fenced_reply() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", GENERATE_PATH)
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body(reply_body("```json\n[{\"a\":\"1\"}]\n```"))
            .create_async()
            .await;

        let rows = client_for(&server).structure("text", "prompt").await.unwrap();
        assert_eq!(rows[0]["a"], "1");
    }

    #[tokio::test]
    async fn test_structure_prose_reply_is_parse_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", GENERATE_PATH)
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body(reply_body("I cannot find any structured data here."))
            .create_async()
            .await;

        let err = client_for(&server)
            .structure("text", "prompt")
            .await
            .unwrap_err();
        assert!(matches!(err, DocpipeError::Parse { .. }));
    }

    #[tokio::test]
    async fn test_auth_error_classified() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", GENERATE_PATH)
            .match_query(mockito::Matcher::Any)
            .with_status(403)
            .with_body("key invalid")
            .create_async()
            .await;

        let err = client_for(&server)
            .structure("text", "prompt")
            .await
            .unwrap_err();
        assert!(matches!(err, DocpipeError::Auth(_)));
    }

    #[tokio::test]
    async fn test_server_error_retried() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", GENERATE_PATH)
            .match_query(mockito::Matcher::Any)
            .with_status(500)
            .expect(3)
            .create_async()
            .await;

        let err = client_for(&server)
            .structure("text", "prompt")
            .await
            .unwrap_err();
        assert!(matches!(err, DocpipeError::Transient { .. }));
        mock.assert_async().await;
    }

    #[test]
    fn test_truncate_chars_multibyte() {
        let text = "ééééé";
        assert_eq!(truncate_chars(text, 3), "ééé");
        assert_eq!(truncate_chars(text, 10), text);
    }
}
