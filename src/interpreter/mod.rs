//! Chunk-and-synthesize document interpretation.
//!
//! This module asks questions about a long document by querying the chat
//! model once per chunk, merging multi-chunk answers with one more call, and
//! recording the results in the append-only answer store.

mod orchestrator;
mod prompts;
mod segment;
mod synthesizer;

pub use orchestrator::{DEFAULT_MODEL, Interpreter, InterpreterBuilder};
pub use prompts::{QUESTION_FAILED, SYNTHESIS_FAILED};
pub use segment::SegmentInterpreter;
pub use synthesizer::Synthesizer;
