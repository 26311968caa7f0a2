//! Pipeline — composition root for one generation request.
//!
//! Flow: (extract document) → build_prompt → TextGenerator → normalize.
//! Each call is a single sequential chain; the pipeline itself holds no
//! mutable state and is shared behind an `Arc`.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::errors::AppError;
use crate::extraction::TextExtractor;
use crate::generation::models::{present, GenerationContext, GenerationResult, TaskKind};
use crate::generation::normalizer::{normalize, Normalized};
use crate::generation::prompts::build_prompt;
use crate::llm_client::{SessionConfig, TextGenerator};

const JSON_MIME: &str = "application/json";
const TEXT_MIME: &str = "text/plain";

pub struct Pipeline {
    generator: Arc<dyn TextGenerator>,
    extractor: TextExtractor,
    defaults: SessionConfig,
}

impl Pipeline {
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        extractor: TextExtractor,
        defaults: SessionConfig,
    ) -> Self {
        Self {
            generator,
            extractor,
            defaults,
        }
    }

    pub fn extractor(&self) -> &TextExtractor {
        &self.extractor
    }

    pub fn model(&self) -> &str {
        self.generator.model()
    }

    /// Session knobs for a task: structured kinds ask for JSON, reports for prose.
    pub fn session_for(&self, kind: TaskKind) -> SessionConfig {
        if kind.is_report() {
            self.defaults.with_mime_type(TEXT_MIME)
        } else {
            self.defaults.with_mime_type(JSON_MIME)
        }
    }

    /// Runs one request end to end.
    ///
    /// Errors: `Extraction` and `Llm` are propagated as-is. Unusable suggestion
    /// output is replaced by canned suggestions (logged, not an error); unusable
    /// quiz output becomes `MalformedResponse`.
    pub async fn generate(
        &self,
        kind: TaskKind,
        mut ctx: GenerationContext,
    ) -> Result<GenerationResult, AppError> {
        if kind.accepts_document() && present(&ctx.resume_text).is_none() {
            let document = ctx.document.take();
            let text = self.extractor.extract(document.as_ref()).await?;
            ctx.resume_text = Some(text.into_inner());
        }

        let prompt = build_prompt(kind, &ctx);
        let session = self.session_for(kind);
        debug!("Built {} prompt ({} chars)", kind.as_str(), prompt.len());

        info!("Requesting {} from {}", kind.as_str(), self.generator.model());
        let raw = if kind.is_report() {
            self.generator.send_in_session(&prompt, &session).await?
        } else {
            self.generator.send(&prompt, &session).await?
        };

        match normalize(kind, &raw) {
            Normalized::Recovered(result) => Ok(result),
            Normalized::Fallback { result, reason } => {
                warn!(
                    "Unusable {} response ({}), serving canned suggestions",
                    kind.as_str(),
                    reason
                );
                Ok(result)
            }
            Normalized::Rejected { reason } => Err(AppError::MalformedResponse(format!(
                "{} response rejected: {reason}",
                kind.as_str()
            ))),
        }
    }
}
