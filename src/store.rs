//! Markdown-backed, append-only answer store.
//!
//! The answer file is a markdown document: a title line followed by one
//! level-2 section per question. It is the only persisted state, and existing
//! bytes are never rewritten once flushed.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use tracing::{debug, error, info, warn};

use crate::models::Question;

/// Title written at the top of a newly created answer file.
pub const DOCUMENT_TITLE: &str = "# 文档解读";

/// File name of the answer store, created next to the interpreted document.
pub const OUTPUT_FILE_NAME: &str = "interpretation_results.md";

/// Heading marker of an answer section.
const SECTION_PREFIX: &str = "## ";

/// Lead-in for the context block injected into prompts.
pub const CONTEXT_LEAD_IN: &str = "以下是之前的问题与回答，可作为上下文：";

/// Insertion-ordered mapping of questions to their final answers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnswerStore {
    answers: IndexMap<Question, String>,
}

impl AnswerStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads the answers recorded in the markdown file at `path`.
    ///
    /// Never fails: a missing file gives an empty store, an unreadable file is
    /// logged and also gives an empty store, and malformed content is parsed
    /// on a best-effort basis.
    pub fn load(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(markdown) => {
                let store = Self::parse(&markdown);
                debug!(path = %path.display(), answers = store.len(), "Loaded answer store");
                store
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No answer file yet");
                Self::new()
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Could not read answer file, starting empty");
                Self::new()
            }
        }
    }

    /// Parses answer sections out of a markdown document.
    ///
    /// A section starts at a line beginning with `"## "`. The heading text,
    /// normalized by [`normalize_question`], is the question; the lines up to the
    /// next section are the answer, with surrounding blank lines removed.
    /// Anything before the first section is ignored. When a question appears
    /// more than once, the first answer is kept.
    pub fn parse(markdown: &str) -> Self {
        let mut store = Self::new();
        let mut current: Option<(Question, Vec<&str>)> = None;

        for line in markdown.lines() {
            if let Some(heading) = line.strip_prefix(SECTION_PREFIX) {
                if let Some((question, body)) = current.take() {
                    store.insert_parsed(question, &body);
                }
                let question = normalize_question(heading);
                current = (!question.is_empty()).then(|| (question, Vec::new()));
            } else if let Some((_, body)) = current.as_mut() {
                body.push(line);
            }
        }
        if let Some((question, body)) = current {
            store.insert_parsed(question, &body);
        }

        store
    }

    fn insert_parsed(&mut self, question: Question, body: &[&str]) {
        if self.answers.contains_key(&question) {
            debug!(%question, "Duplicate section in answer file, keeping the first");
            return;
        }
        self.answers.insert(question, trim_blank_lines(body));
    }

    /// Returns true if `question` already has an answer.
    pub fn contains(&self, question: &Question) -> bool {
        self.answers.contains_key(question)
    }

    /// Returns the recorded answer for `question`.
    pub fn get(&self, question: &Question) -> Option<&str> {
        self.answers.get(question).map(String::as_str)
    }

    /// Records an answer, replacing any previous one for the same question.
    pub fn insert(&mut self, question: Question, answer: impl Into<String>) {
        self.answers.insert(question, answer.into());
    }

    /// Iterates over entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&Question, &str)> {
        self.answers.iter().map(|(q, a)| (q, a.as_str()))
    }

    pub fn len(&self) -> usize {
        self.answers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }

    /// Renders the entries as markdown subsections for use as prompt context.
    ///
    /// Entries with an empty question or answer are skipped. An empty store
    /// renders as an empty string.
    pub fn render_context(&self) -> String {
        self.iter()
            .filter(|(question, answer)| !question.is_empty() && !answer.is_empty())
            .map(|(question, answer)| format!("### {}\n{}", question, answer))
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// Returns the answer file path for the markdown document at `md_path`.
pub fn output_path_for(md_path: &Path) -> PathBuf {
    md_path
        .parent()
        .unwrap_or_else(|| Path::new(""))
        .join(OUTPUT_FILE_NAME)
}

/// Renders one answer section in the persisted layout.
///
/// Answer lines that would read back as a section heading are demoted one
/// level (see [`demote_section_headings`]).
pub fn render_section(question: &Question, answer: &str) -> String {
    format!(
        "{}{}\n\n{}\n\n",
        SECTION_PREFIX,
        question,
        demote_section_headings(answer)
    )
}

/// Returns the form `text` takes after a round trip through a section heading.
///
/// Line breaks collapse to single spaces, surrounding whitespace is trimmed
/// and leading `Q:` markers are stripped. The result is a fixed point: a
/// normalized question renders and parses back to itself.
pub fn normalize_question(text: &str) -> Question {
    let joined = text
        .split(['\n', '\r'])
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    let mut text = joined.as_str();
    while let Some(rest) = text.strip_prefix("Q:") {
        text = rest.trim_start();
    }
    Question::new(text)
}

/// Turns answer lines starting with `"## "` into level-3 headings.
///
/// An answer body must never contain a section start, or it would split into
/// a truncated answer and a phantom question on reload.
pub fn demote_section_headings(answer: &str) -> String {
    if !answer.lines().any(|line| line.starts_with(SECTION_PREFIX)) {
        return answer.to_string();
    }
    answer
        .lines()
        .map(|line| {
            if line.starts_with(SECTION_PREFIX) {
                format!("#{}", line)
            } else {
                line.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Appends rendered sections to the answer file at `path`.
///
/// Creates parent directories as needed. A new file starts with the document
/// title; an existing file is only appended to. Failures are logged, not
/// returned; the result reports whether the sections were persisted.
pub fn append(path: &Path, sections: &str) -> bool {
    match try_append(path, sections) {
        Ok(()) => {
            info!(path = %path.display(), "Interpretation answers appended");
            true
        }
        Err(e) => {
            error!(path = %path.display(), error = %e, "Error saving interpretation");
            false
        }
    }
}

/// Fallible form of [`append`].
pub fn try_append(path: &Path, sections: &str) -> io::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }

    match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(mut file) => {
            write!(file, "{}\n\n{}", DOCUMENT_TITLE, sections)?;
            file.flush()
        }
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
            let mut file = OpenOptions::new().append(true).open(path)?;
            file.write_all(sections.as_bytes())?;
            file.flush()
        }
        Err(e) => Err(e),
    }
}

fn trim_blank_lines(lines: &[&str]) -> String {
    let is_blank = |line: &&str| line.trim().is_empty();
    let start = lines.iter().position(|l| !is_blank(l)).unwrap_or(lines.len());
    let end = lines.iter().rposition(|l| !is_blank(l)).map_or(start, |i| i + 1);
    lines[start..end].join("\n")
}
