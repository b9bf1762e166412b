//! Merging of chunk answers into one final answer.

use std::sync::Arc;

use tracing::{error, info};

use crate::models::{ChunkAnswer, Question};
use crate::openai::{ChatClientTrait, ChatError, ChatRequest};

use super::prompts::{
    SYNTHESIS_FAILED, SYNTHESIS_SYSTEM_PROMPT, SYNTHESIS_TEMPERATURE, synthesis_prompt,
};

/// Reconciles several chunk answers with a single deterministic chat call.
pub struct Synthesizer {
    client: Arc<dyn ChatClientTrait>,
    model: String,
}

impl Synthesizer {
    pub fn new(client: Arc<dyn ChatClientTrait>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

    /// Merges `answers` into one answer to `question`.
    ///
    /// If the request gets no response or a non-200 status, the fixed
    /// [`SYNTHESIS_FAILED`] text is returned instead; there is no retry at
    /// this level.
    ///
    /// # Errors
    ///
    /// Returns `ChatError` only if a 200 response has no usable content.
    pub fn synthesize(
        &self,
        answers: &[ChunkAnswer],
        question: &Question,
        context: &str,
    ) -> Result<String, ChatError> {
        let prompt = synthesis_prompt(context, answers, question);
        let request = ChatRequest::new(
            &self.model,
            SYNTHESIS_SYSTEM_PROMPT,
            prompt,
            SYNTHESIS_TEMPERATURE,
        );

        match self.client.chat(&request) {
            Ok(completion) => {
                let text = completion.first_content().ok_or_else(|| ChatError::Api {
                    message: "no message content in synthesis response".to_string(),
                })?;
                info!(%question, fragments = answers.len(), "Synthesized final answer");
                Ok(text.trim().to_string())
            }
            Err(e) if e.is_transport() || matches!(e, ChatError::Http { .. }) => {
                error!(%question, error = %e, "Failed to synthesize answer");
                Ok(SYNTHESIS_FAILED.to_string())
            }
            Err(e) => Err(e),
        }
    }
}
