//! Multi-turn chat session on top of `GeminiClient`.

use tracing::debug;

use crate::llm_client::{Content, GeminiClient, LlmError, SessionConfig};

pub struct ChatSession<'a> {
    client: &'a GeminiClient,
    config: SessionConfig,
    history: Vec<Content>,
}

impl<'a> ChatSession<'a> {
    pub(crate) fn new(
        client: &'a GeminiClient,
        config: SessionConfig,
        history: Vec<Content>,
    ) -> Self {
        Self {
            client,
            config,
            history,
        }
    }

    pub fn history(&self) -> &[Content] {
        &self.history
    }

    /// Sends `message` with the full history and records both turns on success.
    /// A failed call leaves the history untouched.
    pub async fn send_message(&mut self, message: &str) -> Result<String, LlmError> {
        self.history.push(Content::user(message));
        debug!("Sending chat message (turn {})", self.history.len());

        match self.client.generate_content(&self.history, &self.config).await {
            Ok(reply) => {
                self.history.push(Content::model(&reply));
                Ok(reply)
            }
            Err(e) => {
                self.history.pop();
                Err(e)
            }
        }
    }
}
