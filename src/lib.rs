pub mod chunker;
pub mod config;
pub mod document;
pub mod interpreter;
pub mod models;
pub mod openai;
pub mod store;

pub use chunker::{DEFAULT_CHUNK_SIZE, split_into_chunks};
pub use config::{ConfigError, Settings};
pub use document::{Document, DocumentError};
pub use interpreter::{Interpreter, InterpreterBuilder, SegmentInterpreter, Synthesizer};
pub use models::{ChunkAnswer, Question};
pub use openai::{ChatClientTrait, ChatError, OpenAiClient, OpenAiClientBuilder};
pub use store::AnswerStore;
