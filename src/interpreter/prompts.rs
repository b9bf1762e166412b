//! Prompt text for chunk questions and answer synthesis.

use crate::models::{ChunkAnswer, Question};
use crate::store::CONTEXT_LEAD_IN;

pub(crate) const CHUNK_SYSTEM_PROMPT: &str =
    "你是一个学术文献分析专家，请基于提供的文档内容回答问题，请注意对专业名词做出解释。";

pub(crate) const SYNTHESIS_SYSTEM_PROMPT: &str = "你负责把分片回答合并成最终答案。";

const SYNTHESIS_INSTRUCTION: &str = "请基于下面各片段回答，综合出一个简洁、连贯且基于文档的最终回答；若文档未提供信息请明确说明。";

const FRAGMENT_SEPARATOR: &str = "\n\n---\n\n";

pub(crate) const CHUNK_TEMPERATURE: f32 = 0.7;
pub(crate) const SYNTHESIS_TEMPERATURE: f32 = 0.0;

/// Final answer recorded when synthesis could not reach the API.
pub const SYNTHESIS_FAILED: &str = "无法获取答案，API调用失败。";

/// Final answer recorded when a question could not be processed at all.
pub const QUESTION_FAILED: &str = "处理此问题时发生错误。";

/// Builds the user prompt for chunk `index` of `total` (1-based).
pub(crate) fn chunk_prompt(
    context: &str,
    index: usize,
    total: usize,
    chunk: &str,
    question: &Question,
) -> String {
    let mut sections = Vec::with_capacity(3);
    if !context.is_empty() {
        sections.push(format!("{}\n\n{}", CONTEXT_LEAD_IN, context));
    }
    sections.push(format!("文档片段 {}/{}：\n\n{}", index, total, chunk));
    sections.push(format!("问题：{}", question));
    sections.join("\n\n")
}

/// Builds the user prompt asking the model to merge chunk answers.
pub(crate) fn synthesis_prompt(
    context: &str,
    answers: &[ChunkAnswer],
    question: &Question,
) -> String {
    let context_block = if context.is_empty() {
        String::new()
    } else {
        format!("{}\n\n{}\n\n", CONTEXT_LEAD_IN, context)
    };
    let fragments = answers
        .iter()
        .map(ChunkAnswer::text)
        .collect::<Vec<_>>()
        .join(FRAGMENT_SEPARATOR);

    format!(
        "{}{}\n\n{}\n\n问题：{}",
        context_block, SYNTHESIS_INSTRUCTION, fragments, question
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_prompt_without_context() {
        let prompt = chunk_prompt("", 2, 3, "chunk text", &Question::from("Why?"));
        assert_eq!(prompt, "文档片段 2/3：\n\nchunk text\n\n问题：Why?");
    }

    #[test]
    fn chunk_prompt_with_context_leads_with_it() {
        let prompt = chunk_prompt("### Q1\nA1", 1, 1, "text", &Question::from("Q2"));
        assert!(prompt.starts_with("以下是之前的问题与回答，可作为上下文：\n\n### Q1\nA1\n\n"));
        assert!(prompt.contains("文档片段 1/1：\n\ntext"));
        assert!(prompt.ends_with("问题：Q2"));
    }

    #[test]
    fn synthesis_prompt_joins_fragments_and_repeats_question() {
        let answers = vec![
            ChunkAnswer::Answered("part one".to_string()),
            ChunkAnswer::ApiFailed { status: 500 },
        ];
        let prompt = synthesis_prompt("", &answers, &Question::from("Q"));

        assert!(prompt.starts_with(SYNTHESIS_INSTRUCTION));
        assert!(prompt.contains("part one\n\n---\n\n[片段调用失败：500]"));
        assert!(prompt.ends_with("\n\n问题：Q"));
    }

    #[test]
    fn synthesis_prompt_with_context() {
        let answers = vec![
            ChunkAnswer::Answered("a".to_string()),
            ChunkAnswer::Answered("b".to_string()),
        ];
        let prompt = synthesis_prompt("### Prior\nanswer", &answers, &Question::from("Q"));
        assert!(prompt.starts_with(
            "以下是之前的问题与回答，可作为上下文：\n\n### Prior\nanswer\n\n请基于下面各片段回答"
        ));
    }
}
