//! Prose-polishing text transforms.
//!
//! # Responsibility
//! - Assemble the instruction prompt sent to the external language model.
//! - Provide a deterministic offline fallback when no model is configured.
//! - Split polished output into char-safe chunks for streaming callers.
//!
//! # Invariants
//! - `split_into_chunks` never cuts inside a UTF-8 character.
//! - The offline transform is pure: same input, same output.

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Closing review note the offline polisher appends to every essay.
const REVIEW_NOTE: &str =
    "\n\n【AI点评】这篇作文结构清晰，内容生动。可以适当增加一些细节描写，让文章更加丰富多彩。";

/// Wording upgrades applied by the offline polisher, in order.
const SUBSTITUTIONS: &[(&str, &str)] = &[("很好", "非常棒"), ("看到", "目睹"), ("说", "表达")];

/// Failure reported by a polisher implementation.
#[derive(Debug)]
pub enum PolishError {
    /// The upstream model rejected or failed the request.
    Upstream(String),
}

impl Display for PolishError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Upstream(detail) => write!(f, "polish upstream failure: {detail}"),
        }
    }
}

impl Error for PolishError {}

/// Capability that turns a draft essay into polished prose.
///
/// Outer layers plug a real model client here; the core ships the offline
/// implementation.
pub trait Polisher: Send + Sync {
    fn polish(&self, title: &str, content: &str) -> Result<String, PolishError>;
}

/// Deterministic polisher used when no language model is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflinePolisher;

impl Polisher for OfflinePolisher {
    fn polish(&self, _title: &str, content: &str) -> Result<String, PolishError> {
        let mut polished = content.to_string();
        for (from, to) in SUBSTITUTIONS {
            polished = polished.replace(from, to);
        }
        polished.push_str(REVIEW_NOTE);
        Ok(polished)
    }
}

/// Builds the instruction prompt for the polishing model.
pub fn polish_prompt(title: &str, content: &str) -> String {
    format!(
        "你是一位专业的中文作文润色专家，尤其擅长帮助小学生改进作文。\n\n\
         请帮我润色以下作文，使其更加生动、有表现力、结构合理。\
         保持原文的主要意思和结构，但可以改进语言表达、修正语法错误、\
         丰富词汇和优化段落结构。\n\n\
         作文标题：{title}\n\n\
         作文正文：\n{content}\n\n\
         请直接返回润色后的完整作文，不需要其他解释。"
    )
}

/// Splits `text` into chunks of at most `chunk_size` characters, preserving
/// character boundaries. A zero size is treated as one.
pub fn split_into_chunks(text: &str, chunk_size: usize) -> Vec<String> {
    let chunk_size = chunk_size.max(1);
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(chunk_size)
        .map(|chunk| chunk.iter().collect())
        .collect()
}
