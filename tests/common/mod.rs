#![allow(dead_code)]

//! Shared test doubles for the interpretation pipeline.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chunkwise::openai::{ChatCompletion, ChatRequest};
use chunkwise::{ChatClientTrait, ChatError, Interpreter, InterpreterBuilder};

type Responder = Box<dyn Fn(&ChatRequest) -> Result<ChatCompletion, ChatError> + Send + Sync>;

/// Chat client that answers through a closure and records every request.
pub struct RecordingClient {
    respond: Responder,
    requests: Mutex<Vec<ChatRequest>>,
}

impl RecordingClient {
    pub fn new<F>(respond: F) -> Arc<Self>
    where
        F: Fn(&ChatRequest) -> Result<ChatCompletion, ChatError> + Send + Sync + 'static,
    {
        Arc::new(Self {
            respond: Box::new(respond),
            requests: Mutex::new(Vec::new()),
        })
    }

    /// Replies with a fixed answer to every request.
    pub fn answering(answer: &'static str) -> Arc<Self> {
        Self::new(move |_| Ok(ChatCompletion::from_content(answer)))
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl ChatClientTrait for RecordingClient {
    fn chat(&self, request: &ChatRequest) -> Result<ChatCompletion, ChatError> {
        self.requests.lock().unwrap().push(request.clone());
        (self.respond)(request)
    }
}

/// Builds an interpreter over `client` with no inter-chunk pause.
pub fn interpreter(client: Arc<RecordingClient>, chunk_size: usize) -> Interpreter {
    InterpreterBuilder::new()
        .client(client)
        .model("test-model")
        .chunk_size(chunk_size)
        .chunk_pause(Duration::ZERO)
        .build()
}

/// A reqwest error produced without any network I/O.
pub fn network_error() -> ChatError {
    ChatError::Network(
        reqwest::blocking::Client::new()
            .get("not-a-valid-url")
            .build()
            .unwrap_err(),
    )
}
