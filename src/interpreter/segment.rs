//! Per-chunk question answering.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::chunker::{DEFAULT_CHUNK_SIZE, split_into_chunks};
use crate::models::{ChunkAnswer, Question};
use crate::openai::{ChatClientTrait, ChatError, ChatRequest};

use super::prompts::{CHUNK_SYSTEM_PROMPT, CHUNK_TEMPERATURE, chunk_prompt};

const PREVIEW_CHARS: usize = 120;

/// Asks one question against every chunk of a document.
pub struct SegmentInterpreter {
    client: Arc<dyn ChatClientTrait>,
    model: String,
    chunk_size: usize,
    pause: Duration,
}

impl SegmentInterpreter {
    /// Creates an interpreter with the default chunk size and a one second pause.
    pub fn new(client: Arc<dyn ChatClientTrait>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            pause: Duration::from_secs(1),
        }
    }

    /// Sets the maximum chunk length, in characters.
    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Sets the pause taken after each chunk request.
    #[must_use]
    pub fn with_pause(mut self, pause: Duration) -> Self {
        self.pause = pause;
        self
    }

    /// Asks `question` against each chunk of `content`, in document order.
    ///
    /// Returns one `ChunkAnswer` per chunk. Transport failures and non-200
    /// responses become placeholder answers; only a 200 response whose body
    /// has no usable content is returned as an error. The pause follows every
    /// request, including the one that ends the question with an error.
    ///
    /// # Errors
    ///
    /// Returns `ChatError` if a successful response cannot be used.
    pub fn interpret(
        &self,
        content: &str,
        question: &Question,
        context: &str,
    ) -> Result<Vec<ChunkAnswer>, ChatError> {
        let chunks = split_into_chunks(content, self.chunk_size);
        let total = chunks.len();
        let mut answers = Vec::with_capacity(total);

        for (idx, chunk) in chunks.into_iter().enumerate() {
            let index = idx + 1;
            let prompt = chunk_prompt(context, index, total, chunk, question);
            let request =
                ChatRequest::new(&self.model, CHUNK_SYSTEM_PROMPT, prompt, CHUNK_TEMPERATURE);

            let answer = match self.client.chat(&request) {
                Ok(completion) => match completion.first_content() {
                    Some(text) => {
                        let text = text.trim().to_string();
                        info!(chunk = index, total, %question, "Chunk answered");
                        debug!(chunk = index, preview = %preview(&text), "Chunk answer preview");
                        Ok(ChunkAnswer::Answered(text))
                    }
                    None => Err(ChatError::Api {
                        message: format!("no message content for chunk {}/{}", index, total),
                    }),
                },
                Err(e) if e.is_transport() => {
                    warn!(chunk = index, total, %question, error = %e, "No response for chunk");
                    Ok(ChunkAnswer::TransportFailed)
                }
                Err(ChatError::Http { status }) => {
                    error!(chunk = index, total, status, %question, "Chat API error for chunk");
                    Ok(ChunkAnswer::ApiFailed { status })
                }
                Err(e) => Err(e),
            };

            thread::sleep(self.pause);
            answers.push(answer?);
        }

        Ok(answers)
    }
}

fn preview(text: &str) -> String {
    text.chars()
        .take(PREVIEW_CHARS)
        .map(|c| if c == '\n' { ' ' } else { c })
        .collect()
}
