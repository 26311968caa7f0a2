//! HTTP client for the PDF text-extraction sidecar.
//!
//! Contract: multipart upload with a single `file` field; `200 {"text": ...}`
//! on success, non-2xx with `{"error": ..., "details": ...}` otherwise.

use reqwest::{multipart, Client, Url};
use serde::Deserialize;
use tracing::{info, warn};

use crate::extraction::{Document, ExtractionError};

#[derive(Debug, Deserialize)]
struct SidecarResponse {
    text: String,
}

#[derive(Debug, Deserialize)]
struct SidecarErrorBody {
    error: String,
    #[serde(default)]
    details: Option<String>,
}

#[derive(Clone)]
pub struct SidecarClient {
    client: Client,
    url: String,
}

impl SidecarClient {
    pub fn new(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub async fn extract(&self, document: &Document) -> Result<String, ExtractionError> {
        let file_name = document
            .file_name
            .clone()
            .unwrap_or_else(|| "resume.pdf".to_string());
        let part = multipart::Part::bytes(document.bytes.to_vec())
            .file_name(file_name)
            .mime_str("application/pdf")
            .map_err(|e| ExtractionError::Unreadable(format!("invalid upload part: {e}")))?;
        let form = multipart::Form::new().part("file", part);

        info!("Sending PDF to extraction service at {}", self.url);
        let response = self
            .client
            .post(&self.url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                warn!("PDF extraction service unreachable: {e}");
                ExtractionError::ServiceUnreachable {
                    url: self.url.clone(),
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("PDF extraction service returned {}: {}", status, body);
            return Err(ExtractionError::ServiceRejected {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        let parsed: SidecarResponse = response.json().await.map_err(|e| {
            ExtractionError::Unreadable(format!("unexpected extraction service response: {e}"))
        })?;
        Ok(parsed.text)
    }

    /// Pings the sidecar root. Used by `/health`.
    pub async fn health(&self) -> bool {
        let Some(root) = sidecar_root(&self.url) else {
            warn!("PDF extraction service URL is invalid: {}", self.url);
            return false;
        };
        match self.client.get(root).send().await {
            Ok(r) => r.status().is_success(),
            Err(_) => false,
        }
    }
}

/// Prefers the sidecar's structured `{error, details}` body, else the raw text.
fn error_message(body: &str) -> String {
    match serde_json::from_str::<SidecarErrorBody>(body) {
        Ok(SidecarErrorBody {
            error,
            details: Some(details),
        }) => format!("{error}: {details}"),
        Ok(SidecarErrorBody { error, .. }) => error,
        Err(_) if body.trim().is_empty() => "no response body".to_string(),
        Err(_) => body.trim().to_string(),
    }
}

/// Root of the sidecar's origin (path and query dropped). `None` for an
/// unparseable URL.
fn sidecar_root(url: &str) -> Option<Url> {
    Url::parse(url).and_then(|u| u.join("/")).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::MediaType;

    #[test]
    fn test_error_message_uses_structured_body() {
        let body = r#"{"error": "Failed to process PDF", "details": "EOF marker not found"}"#;
        assert_eq!(error_message(body), "Failed to process PDF: EOF marker not found");
    }

    #[test]
    fn test_error_message_without_details() {
        assert_eq!(error_message(r#"{"error": "No file uploaded"}"#), "No file uploaded");
    }

    #[test]
    fn test_error_message_falls_back_to_raw_text() {
        assert_eq!(error_message("Bad Gateway\n"), "Bad Gateway");
        assert_eq!(error_message(""), "no response body");
    }

    #[test]
    fn test_sidecar_root() {
        let root = |url: &str| sidecar_root(url).map(String::from);
        assert_eq!(
            root("http://127.0.0.1:5000/extract-text").as_deref(),
            Some("http://127.0.0.1:5000/")
        );
        assert_eq!(root("http://pdf:5000").as_deref(), Some("http://pdf:5000/"));
        assert_eq!(root("http://h:5000?x=1").as_deref(), Some("http://h:5000/"));
        assert_eq!(
            root("https://pdf.internal/api/v1/extract?token=abc#frag").as_deref(),
            Some("https://pdf.internal/")
        );
        assert_eq!(root("not a url"), None);
    }

    #[tokio::test]
    async fn test_unreachable_sidecar_is_reported() {
        // Port 1 is never bound in test environments; the connect fails fast.
        let client = SidecarClient::new(Client::new(), "http://127.0.0.1:1/extract-text");
        let doc = Document::new(&b"%PDF-1.4"[..], MediaType::Pdf);
        let err = client.extract(&doc).await.unwrap_err();
        assert!(matches!(err, ExtractionError::ServiceUnreachable { .. }));
        assert!(!client.health().await);
    }
}
