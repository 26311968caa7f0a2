//! Text extraction — turns an uploaded document into plain text for prompting.
//!
//! PDFs go through either the in-process `pdf-extract` parser or the HTTP
//! sidecar (see `sidecar.rs`), chosen once at startup. Everything else is
//! decoded as UTF-8. No retries happen here; callers decide.

pub mod sidecar;

use bytes::Bytes;
use thiserror::Error;
use tracing::{debug, info};

use crate::extraction::sidecar::SidecarClient;

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("No document was provided")]
    MissingDocument,

    #[error("The document appears to be empty")]
    EmptyDocument,

    #[error("The document could not be read: {0}")]
    Unreadable(String),

    #[error("Could not reach the PDF extraction service at {url}. Please check that it is running.")]
    ServiceUnreachable { url: String },

    #[error("PDF extraction service returned status {status}: {message}")]
    ServiceRejected { status: u16, message: String },
}

/// Declared media type of an uploaded document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaType {
    Pdf,
    PlainText,
    Other(String),
}

impl MediaType {
    /// Resolves the media type from a declared content type, falling back to
    /// the file extension when the client sent a generic type.
    pub fn detect(content_type: Option<&str>, file_name: Option<&str>) -> Self {
        let declared = content_type
            .map(|ct| ct.split(';').next().unwrap_or(ct).trim().to_ascii_lowercase())
            .unwrap_or_default();

        match declared.as_str() {
            "application/pdf" => return MediaType::Pdf,
            ct if ct.starts_with("text/") => return MediaType::PlainText,
            _ => {}
        }

        let extension = file_name
            .and_then(|name| name.rsplit_once('.'))
            .map(|(_, ext)| ext.to_ascii_lowercase());

        match extension.as_deref() {
            Some("pdf") => MediaType::Pdf,
            Some("txt") | Some("md") => MediaType::PlainText,
            _ if declared.is_empty() => MediaType::Other("application/octet-stream".to_string()),
            _ => MediaType::Other(declared),
        }
    }
}

/// Raw upload. Lives for the duration of one extraction call.
#[derive(Debug, Clone)]
pub struct Document {
    pub bytes: Bytes,
    pub media_type: MediaType,
    pub file_name: Option<String>,
}

impl Document {
    pub fn new(bytes: impl Into<Bytes>, media_type: MediaType) -> Self {
        Self {
            bytes: bytes.into(),
            media_type,
            file_name: None,
        }
    }

    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }
}

/// Trimmed, never-blank text pulled out of a `Document`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedText(String);

impl ExtractedText {
    pub fn new(raw: &str) -> Result<Self, ExtractionError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ExtractionError::EmptyDocument);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

/// Where PDF bytes are turned into text.
#[derive(Clone)]
pub enum PdfBackend {
    /// In-process `pdf-extract`, run on the blocking pool.
    Local,
    Sidecar(SidecarClient),
}

impl PdfBackend {
    pub fn describe(&self) -> String {
        match self {
            PdfBackend::Local => "local".to_string(),
            PdfBackend::Sidecar(client) => format!("sidecar ({})", client.url()),
        }
    }
}

#[derive(Clone)]
pub struct TextExtractor {
    pdf: PdfBackend,
}

impl TextExtractor {
    pub fn new(pdf: PdfBackend) -> Self {
        Self { pdf }
    }

    pub fn backend(&self) -> &PdfBackend {
        &self.pdf
    }

    pub async fn extract(
        &self,
        document: Option<&Document>,
    ) -> Result<ExtractedText, ExtractionError> {
        let document = document.ok_or(ExtractionError::MissingDocument)?;
        if document.bytes.is_empty() {
            return Err(ExtractionError::EmptyDocument);
        }

        let text = match document.media_type {
            MediaType::Pdf => {
                info!(
                    "Extracting text from PDF ({} bytes) via {}",
                    document.bytes.len(),
                    self.pdf.describe()
                );
                match &self.pdf {
                    PdfBackend::Local => extract_pdf_locally(document.bytes.clone()).await?,
                    PdfBackend::Sidecar(client) => client.extract(document).await?,
                }
            }
            MediaType::PlainText | MediaType::Other(_) => decode_utf8(&document.bytes)?,
        };

        let extracted = ExtractedText::new(&text)?;
        debug!("Extracted {} characters of text", extracted.as_str().len());
        Ok(extracted)
    }
}

async fn extract_pdf_locally(bytes: Bytes) -> Result<String, ExtractionError> {
    // pdf-extract is CPU-bound and synchronous
    tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes))
        .await
        .map_err(|e| ExtractionError::Unreadable(format!("PDF parser task failed: {e}")))?
        .map_err(|e| ExtractionError::Unreadable(format!("failed to parse PDF: {e}")))
}

fn decode_utf8(bytes: &[u8]) -> Result<String, ExtractionError> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    std::str::from_utf8(bytes)
        .map(str::to_string)
        .map_err(|_| ExtractionError::Unreadable("document is not valid UTF-8 text".to_string()))
}
