//! Grounding Prompt Builder
//!
//! Builds the synthesis prompt: a role that restricts the model to the
//! retrieved log entries, the entries themselves in a `<logs>` block, and the
//! question in a `<question>` block.

use crate::constants::synthesis::CANNOT_ANSWER;

/// Prompt section types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptSection {
    /// Plain paragraph
    Text(String),
    /// Content wrapped in `<tag>...</tag>`, preceded by a lead-in line
    Tagged {
        lead: String,
        tag: String,
        content: String,
    },
}

/// Prompt builder for consistent prompt construction
#[derive(Debug, Clone, Default)]
pub struct PromptBuilder {
    sections: Vec<PromptSection>,
}

impl PromptBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, content: &str) -> Self {
        self.sections.push(PromptSection::Text(content.to_string()));
        self
    }

    pub fn tagged(mut self, lead: &str, tag: &str, content: &str) -> Self {
        self.sections.push(PromptSection::Tagged {
            lead: lead.to_string(),
            tag: tag.to_string(),
            content: content.to_string(),
        });
        self
    }

    pub fn build(&self) -> String {
        self.sections
            .iter()
            .map(|section| match section {
                PromptSection::Text(content) => content.clone(),
                PromptSection::Tagged { lead, tag, content } => {
                    format!("{lead}\n<{tag}>\n{content}\n</{tag}>")
                }
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// Prompt asking for an answer drawn only from `logs`
pub fn grounding_prompt(question: &str, logs: &[String]) -> String {
    let role = format!(
        "You are an expert AIOps assistant. Your task is to answer questions about \
         application behavior based *only* on the provided log entries. Do not use any \
         prior knowledge. If the answer cannot be found in the logs, you must state \
         '{CANNOT_ANSWER}'"
    );

    PromptBuilder::new()
        .text(&role)
        .tagged(
            "Here are the relevant log entries retrieved:",
            "logs",
            &logs.join("\n"),
        )
        .tagged(
            "Based on the logs above, please answer the following question:",
            "question",
            question,
        )
        .build()
}
