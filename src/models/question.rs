use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// A question asked about a document.
///
/// The literal text is the identity key in the answer store, so two questions
/// are the same only if their text is byte-identical.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Question(String);

impl Question {
    /// Creates a new question.
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    /// Returns the question text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if the question text is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Question {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Question {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<String> for Question {
    fn from(text: String) -> Self {
        Self(text)
    }
}

impl Borrow<str> for Question {
    fn borrow(&self) -> &str {
        &self.0
    }
}
