use std::sync::Arc;

use crate::config::Config;
use crate::generation::pipeline::Pipeline;
use crate::generation::slots::SlotBoard;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Prompt → model → normalizer chain. Holds the model client and the text extractor.
    pub pipeline: Arc<Pipeline>,
    /// In-flight and selection tracking for slot-targeted requests.
    pub slots: Arc<SlotBoard>,
    pub config: Config,
}
