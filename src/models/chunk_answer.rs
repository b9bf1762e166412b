use std::fmt;

/// Placeholder recorded when no response was obtained for a chunk.
pub const TRANSPORT_FAILED_PLACEHOLDER: &str = "[请求失败，未获得该片段回答]";

/// The outcome of asking one question against one chunk.
///
/// Every chunk yields exactly one `ChunkAnswer`, failures included, so the
/// answers line up one-to-one with the chunks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChunkAnswer {
    /// The model answered; the text is already trimmed.
    Answered(String),
    /// The transport gave up without a response.
    TransportFailed,
    /// The API responded with a non-200 status.
    ApiFailed { status: u16 },
}

impl ChunkAnswer {
    /// Returns true if the model produced an answer for this chunk.
    pub fn is_answered(&self) -> bool {
        matches!(self, ChunkAnswer::Answered(_))
    }

    /// Returns the answer text, or the localized placeholder for a failure.
    pub fn text(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ChunkAnswer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChunkAnswer::Answered(text) => f.write_str(text),
            ChunkAnswer::TransportFailed => f.write_str(TRANSPORT_FAILED_PLACEHOLDER),
            ChunkAnswer::ApiFailed { status } => write!(f, "[片段调用失败：{}]", status),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn answered_text_is_verbatim() {
        let answer = ChunkAnswer::Answered("第一段\n\n第二段".to_string());
        assert!(answer.is_answered());
        assert_eq!(answer.text(), "第一段\n\n第二段");
    }

    #[test]
    fn failures_render_placeholders() {
        assert_eq!(
            ChunkAnswer::TransportFailed.text(),
            "[请求失败，未获得该片段回答]"
        );
        assert_eq!(
            ChunkAnswer::ApiFailed { status: 429 }.text(),
            "[片段调用失败：429]"
        );
        assert!(!ChunkAnswer::TransportFailed.is_answered());
    }
}
