/// Chat completions HTTP client implementation.
///
/// This module provides `OpenAiClient` for making synchronous requests to an
/// OpenAI-compatible chat completions API, along with error types, the retry
/// policy, and the builder used for configuration.
use std::thread;
use std::time::Duration;

use reqwest::StatusCode;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::types::{ChatCompletion, ChatRequest, Usage};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Backoff delays between attempts: one initial try plus three retries.
const DEFAULT_DELAYS: [Duration; 3] = [
    Duration::from_secs(1),
    Duration::from_secs(2),
    Duration::from_secs(4),
];

/// Errors that can occur when calling the chat completions API.
#[derive(Debug, Error)]
pub enum ChatError {
    /// Network-related errors (connection failures, DNS resolution, etc.)
    #[error("Network error: {0}")]
    Network(#[source] reqwest::Error),

    /// Request or response timeout errors
    #[error("Request timed out")]
    Timeout(#[source] reqwest::Error),

    /// The API answered with a status other than 200
    #[error("HTTP error: status {status}")]
    Http { status: u16 },

    /// The response body could not be decoded
    #[error("Serialization error: {0}")]
    Serialization(#[source] serde_json::Error),

    /// The API answered 200 but the body was unusable
    #[error("Chat API error: {message}")]
    Api { message: String },

    /// Invalid URL configuration error
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// No API key was configured
    #[error("OPENAI_API_KEY is not set")]
    MissingApiKey,
}

impl ChatError {
    /// True when no response object was obtained at all.
    pub fn is_transport(&self) -> bool {
        matches!(self, ChatError::Network(_) | ChatError::Timeout(_))
    }

    fn from_reqwest(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            ChatError::Timeout(error)
        } else {
            ChatError::Network(error)
        }
    }
}

/// Builder for constructing `OpenAiClient` instances.
///
/// # Examples
///
/// ```
/// use chunkwise::openai::OpenAiClientBuilder;
///
/// let client = OpenAiClientBuilder::new()
///     .base_url("https://api.openai.com/v1")
///     .api_key("sk-test")
///     .build()
///     .expect("Failed to create client");
/// ```
#[derive(Debug, Default)]
pub struct OpenAiClientBuilder {
    base_url: Option<String>,
    api_key: Option<String>,
    timeout: Option<Duration>,
}

impl OpenAiClientBuilder {
    /// Creates a new `OpenAiClientBuilder` with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the API base URL (everything before `/chat/completions`).
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sets the bearer token sent with every request.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the per-request timeout. Defaults to 30 seconds.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Builds the `OpenAiClient` with the configured settings.
    ///
    /// # Environment Variables
    ///
    /// If `base_url()` was not called, `OPENAI_BASE_URL` is used, falling back to
    /// `https://api.openai.com/v1`. If `api_key()` was not called, `OPENAI_API_KEY`
    /// is used; a missing or empty key is an error.
    pub fn build(self) -> Result<OpenAiClient, ChatError> {
        let base_url = match self.base_url {
            Some(url) => url,
            None => std::env::var("OPENAI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
        };
        let base_url = base_url.trim_end_matches('/').to_string();

        let api_key = match self.api_key {
            Some(key) => key,
            None => std::env::var("OPENAI_API_KEY").unwrap_or_default(),
        };
        if api_key.trim().is_empty() {
            return Err(ChatError::MissingApiKey);
        }

        reqwest::Url::parse(&base_url)
            .map_err(|e| ChatError::InvalidUrl(format!("{}: {}", base_url, e)))?;

        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout.unwrap_or(Duration::from_secs(30)))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(ChatError::Network)?;

        Ok(OpenAiClient {
            client,
            base_url,
            api_key,
        })
    }
}

/// Synchronous client for an OpenAI-compatible chat completions API.
///
/// Transport-level retries are applied inside `chat`, so callers see either a
/// decoded completion or the final error after backoff is exhausted.
pub struct OpenAiClient {
    client: reqwest::blocking::Client,
    base_url: String,
    api_key: String,
}

/// Trait for chat completion operations.
///
/// This is the seam the interpretation pipeline depends on; tests substitute
/// a recording mock.
pub trait ChatClientTrait: Send + Sync {
    /// Sends one chat request and returns the decoded completion.
    ///
    /// A transport failure (`ChatError::is_transport`) means no response was
    /// obtained; `ChatError::Http` carries the status of a non-200 response.
    fn chat(&self, request: &ChatRequest) -> Result<ChatCompletion, ChatError>;
}

impl OpenAiClient {
    /// Returns the base URL configured for this client.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    fn send_once(&self, url: &str, request: &ChatRequest) -> Result<ChatCompletion, ChatError> {
        let response = self
            .client
            .post(url)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .map_err(ChatError::from_reqwest)?;

        let status = response.status();
        if status != StatusCode::OK {
            debug!(%url, status = status.as_u16(), "chat request returned non-200 status");
            return Err(ChatError::Http {
                status: status.as_u16(),
            });
        }

        let body = response.text().map_err(ChatError::from_reqwest)?;
        serde_json::from_str(&body).map_err(ChatError::Serialization)
    }
}

impl ChatClientTrait for OpenAiClient {
    fn chat(&self, request: &ChatRequest) -> Result<ChatCompletion, ChatError> {
        let url = self.completions_url();
        let completion = retry_with_backoff(|| self.send_once(&url, request))?;

        debug!(%url, "chat request succeeded");
        if let Some(usage) = &completion.usage {
            log_usage(usage);
        }
        Ok(completion)
    }
}

fn log_usage(usage: &Usage) {
    info!(
        prompt_tokens = usage.prompt_tokens,
        completion_tokens = usage.completion_tokens,
        total_tokens = usage.total_tokens,
        "API usage, estimated cost ${:.4}",
        usage.estimated_cost()
    );
}

/// Retries an operation with exponential backoff.
///
/// The operation is tried once and then retried up to 3 times with delays of
/// 1s, 2s, and 4s. Only transient errors are retried (see `should_retry`).
pub fn retry_with_backoff<F, T>(f: F) -> Result<T, ChatError>
where
    F: FnMut() -> Result<T, ChatError>,
{
    retry_with_delays(&DEFAULT_DELAYS, f)
}

/// Retries an operation, sleeping for each entry of `delays` before the next attempt.
///
/// Returns the first success, the first non-retryable error, or the last error
/// once `delays` is exhausted.
pub fn retry_with_delays<F, T>(delays: &[Duration], mut f: F) -> Result<T, ChatError>
where
    F: FnMut() -> Result<T, ChatError>,
{
    let max_attempts = delays.len() + 1;

    let mut last_error = match f() {
        Ok(result) => return Ok(result),
        Err(e) if !should_retry(&e) => return Err(e),
        Err(e) => e,
    };

    for (retry, delay) in delays.iter().enumerate() {
        warn!(
            attempt = retry + 1,
            max_attempts,
            error = %last_error,
            "chat request failed, retrying in {:?}",
            delay
        );
        thread::sleep(*delay);

        match f() {
            Ok(result) => return Ok(result),
            Err(e) if !should_retry(&e) => return Err(e),
            Err(e) => last_error = e,
        }
    }

    Err(last_error)
}

/// Determines if an error should be retried.
///
/// Returns `true` for network errors, timeouts, rate limiting (429) and the
/// gateway-style server errors 500/502/503/504.
fn should_retry(error: &ChatError) -> bool {
    match error {
        ChatError::Network(_) | ChatError::Timeout(_) => true,
        ChatError::Http { status } => matches!(status, 429 | 500 | 502 | 503 | 504),
        ChatError::Serialization(_)
        | ChatError::Api { .. }
        | ChatError::InvalidUrl(_)
        | ChatError::MissingApiKey => false,
    }
}
