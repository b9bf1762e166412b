/// OpenAI-compatible chat completions client module.
///
/// This module provides a blocking HTTP client for the chat completions API,
/// including error handling, retry logic, usage logging, and the wire types.
mod client;
mod types;

pub use client::{
    ChatClientTrait, ChatError, OpenAiClient, OpenAiClientBuilder, retry_with_backoff,
    retry_with_delays,
};
pub use types::{ChatCompletion, ChatMessage, ChatRequest, Choice, ResponseMessage, Role, Usage};
