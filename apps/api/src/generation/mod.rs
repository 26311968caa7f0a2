// Generation engine: prompt building, model call, response normalization,
// and the slot guard for requests that target a form entry.
// All model calls go through llm_client; all document reads go through extraction.

pub mod fallback;
pub mod handlers;
pub mod models;
pub mod normalizer;
pub mod pipeline;
pub mod prompts;
pub mod quiz;
pub mod slots;
