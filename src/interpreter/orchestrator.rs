//! Question-by-question interpretation with incremental persistence.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};

use crate::chunker::DEFAULT_CHUNK_SIZE;
use crate::document::Document;
use crate::models::Question;
use crate::openai::{ChatClientTrait, ChatError};
use crate::store::{self, AnswerStore, render_section};

use super::prompts::QUESTION_FAILED;
use super::segment::SegmentInterpreter;
use super::synthesizer::Synthesizer;

/// Chat model used when none is configured.
pub const DEFAULT_MODEL: &str = "gpt-4-turbo-preview";

/// Builder for constructing `Interpreter` instances.
///
/// # Examples
///
/// ```no_run
/// use std::path::Path;
/// use std::sync::Arc;
/// use std::time::Duration;
/// use chunkwise::{Document, InterpreterBuilder, OpenAiClientBuilder, Question};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = OpenAiClientBuilder::new().build()?;
///
/// let interpreter = InterpreterBuilder::new()
///     .client(Arc::new(client))
///     .model("gpt-4o-mini")
///     .chunk_pause(Duration::from_secs(1))
///     .build();
///
/// let document = Document::read(Path::new("paper.md"))?;
/// let questions = [Question::from("What problem does the paper study?")];
/// let sections = interpreter.interpret(
///     Some(&document),
///     &questions,
///     Path::new("interpretation_results.md"),
/// );
/// println!("{}", sections);
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct InterpreterBuilder {
    client: Option<Arc<dyn ChatClientTrait>>,
    model: Option<String>,
    chunk_size: Option<usize>,
    chunk_pause: Option<Duration>,
}

impl InterpreterBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the chat client to use.
    pub fn client(mut self, client: Arc<dyn ChatClientTrait>) -> Self {
        self.client = Some(client);
        self
    }

    /// Sets the chat model. Defaults to [`DEFAULT_MODEL`].
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Sets the maximum chunk length, in characters.
    pub fn chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = Some(chunk_size);
        self
    }

    /// Sets the pause taken after every chunk request. Defaults to one second.
    pub fn chunk_pause(mut self, pause: Duration) -> Self {
        self.chunk_pause = Some(pause);
        self
    }

    /// Builds the `Interpreter`.
    ///
    /// # Panics
    ///
    /// Panics if `client()` was not called.
    #[must_use]
    pub fn build(self) -> Interpreter {
        let client = self.client.expect("client must be set via client() method");
        let model = self.model.unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let segments = SegmentInterpreter::new(client.clone(), model.clone())
            .with_chunk_size(self.chunk_size.unwrap_or(DEFAULT_CHUNK_SIZE))
            .with_pause(self.chunk_pause.unwrap_or(Duration::from_secs(1)));

        Interpreter {
            segments,
            synthesizer: Synthesizer::new(client, model),
        }
    }
}

/// Answers a list of questions about a document, persisting new answers.
///
/// Questions already recorded in the answer file are never asked again, so
/// repeated runs only do the outstanding work.
pub struct Interpreter {
    segments: SegmentInterpreter,
    synthesizer: Synthesizer,
}

impl Interpreter {
    /// Interprets `document` for each question, in order.
    ///
    /// Loads the answer store at `output_path`, skips questions it already
    /// holds, and appends one markdown section per newly answered question.
    /// Questions are first brought into the form their heading reads back as
    /// (see [`store::normalize_question`]); blank ones are skipped.
    /// A question that fails is recorded with a placeholder answer and the
    /// run continues. Returns the newly produced sections, or an empty string
    /// if there was nothing new. A missing or empty document returns an empty
    /// string without touching the store or the API.
    pub fn interpret(
        &self,
        document: Option<&Document>,
        questions: &[Question],
        output_path: &Path,
    ) -> String {
        let Some(document) = document.filter(|d| !d.is_empty()) else {
            info!("No content to interpret");
            return String::new();
        };

        if let Some(path) = document.path() {
            info!(document = %path.display(), questions = questions.len(), "Interpreting document");
        }

        let mut answers = AnswerStore::load(output_path);
        let mut new_sections = String::new();

        for question in questions {
            // Keyed by the heading form so a reload recognizes the question.
            let question = &store::normalize_question(question.as_str());
            if question.is_empty() {
                warn!("Skipping question with no text");
                continue;
            }
            if answers.contains(question) {
                info!(%question, "Skipping interpretation for question (already present)");
                continue;
            }

            // Rebuilt per question so answers from earlier in this run are included.
            let context = answers.render_context();
            let final_answer = match self.answer(document.content(), question, &context) {
                Ok(answer) => answer,
                Err(e) => {
                    let detail = format!("{:#}", anyhow::Error::from(e));
                    error!(%question, error = %detail, "Error processing question");
                    QUESTION_FAILED.to_string()
                }
            };

            let final_answer = store::demote_section_headings(&final_answer);
            new_sections.push_str(&render_section(question, &final_answer));
            answers.insert(question.clone(), final_answer);
        }

        if new_sections.is_empty() {
            info!("No new interpretation sections to write (all questions handled)");
        } else {
            store::append(output_path, &new_sections);
        }

        new_sections
    }

    fn answer(&self, content: &str, question: &Question, context: &str) -> Result<String, ChatError> {
        let chunk_answers = self.segments.interpret(content, question, context)?;

        if let [only] = chunk_answers.as_slice() {
            return Ok(only.text());
        }
        self.synthesizer.synthesize(&chunk_answers, question, context)
    }
}
