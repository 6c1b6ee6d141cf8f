//! Transcript summarization into slide sections.
//!
//! Asks an LLM to condense a transcript into titled, bulleted sections
//! suitable for a slide deck.

use crate::config::Prompts;
use crate::error::{LysarkError, Result};
use crate::openai::{create_client, with_retry};
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info, instrument, warn};

/// A titled group of bullet points destined for one slide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlideSection {
    pub title: String,
    pub bullets: Vec<String>,
}

/// Outcome of a summarization call.
///
/// Transport failures are errors; a model response that cannot be parsed
/// is a degraded outcome the caller can surface without failing the request.
#[derive(Debug, Clone)]
pub enum SummaryOutcome {
    /// The model returned well-formed sections.
    Complete(Vec<SlideSection>),
    /// The model responded, but its output did not parse.
    Degraded { reason: String, raw_output: String },
}

/// LLM-backed transcript summarizer.
pub struct Summarizer {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    max_transcript_chars: usize,
    prompts: Prompts,
}

impl Summarizer {
    pub fn new(model: &str, max_transcript_chars: usize) -> Self {
        Self {
            client: create_client(),
            model: model.to_string(),
            max_transcript_chars,
            prompts: Prompts::default(),
        }
    }

    /// Set custom prompts (with user-defined variables).
    pub fn with_prompts(mut self, prompts: Prompts) -> Self {
        self.prompts = prompts;
        self
    }

    /// Summarize a transcript into slide sections.
    #[instrument(skip(self, transcript), fields(chars = transcript.len()))]
    pub async fn summarize(&self, transcript: &str) -> Result<SummaryOutcome> {
        if transcript.trim().is_empty() {
            return Err(LysarkError::InvalidInput(
                "Transcript is empty".to_string(),
            ));
        }

        info!("Summarizing transcript");

        let truncated = truncate_chars(transcript, self.max_transcript_chars);

        let mut vars = HashMap::new();
        vars.insert("transcript".to_string(), truncated.to_string());

        let system_message = self
            .prompts
            .render_with_custom(&self.prompts.summary.system, &vars);
        let user_message = self
            .prompts
            .render_with_custom(&self.prompts.summary.user, &vars);

        let content = complete_chat(&self.client, &self.model, system_message, user_message)
            .await?;

        debug!("Summary response: {}", truncate_chars(&content, 500));

        match parse_sections(&content) {
            Ok(sections) => {
                info!("Parsed {} sections", sections.len());
                Ok(SummaryOutcome::Complete(sections))
            }
            Err(LysarkError::ResponseMalformed { reason, raw_output }) => {
                warn!("Summary output did not parse: {}", reason);
                Ok(SummaryOutcome::Degraded { reason, raw_output })
            }
            Err(e) => Err(e),
        }
    }
}

/// Run a single chat completion and return the assistant text.
///
/// Shared by the summarizer and the deck builder, which differ only in
/// their prompts. Transient failures are retried.
pub(crate) async fn complete_chat(
    client: &async_openai::Client<async_openai::config::OpenAIConfig>,
    model: &str,
    system_message: String,
    user_message: String,
) -> Result<String> {
    let messages: Vec<ChatCompletionRequestMessage> = vec![
        ChatCompletionRequestSystemMessageArgs::default()
            .content(system_message)
            .build()
            .map_err(|e| LysarkError::ModelCall(e.to_string()))?
            .into(),
        ChatCompletionRequestUserMessageArgs::default()
            .content(user_message)
            .build()
            .map_err(|e| LysarkError::ModelCall(e.to_string()))?
            .into(),
    ];

    let request = CreateChatCompletionRequestArgs::default()
        .model(model)
        .messages(messages)
        .temperature(0.3)
        .build()
        .map_err(|e| LysarkError::ModelCall(e.to_string()))?;

    let response = with_retry(|| async {
        client
            .chat()
            .create(request.clone())
            .await
            .map_err(|e| LysarkError::ModelCall(format!("Chat completion failed: {}", e)))
    })
    .await?;

    response
        .choices
        .first()
        .and_then(|c| c.message.content.as_ref())
        .cloned()
        .ok_or_else(|| LysarkError::ModelCall("Empty response from LLM".to_string()))
}

/// Truncate to a character limit without splitting a codepoint.
pub(crate) fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

/// Strip surrounding markdown code fences from a model response.
pub(crate) fn strip_code_fences(response: &str) -> &str {
    let trimmed = response.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };

    // Drop the language tag on the opening fence, if any
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    let rest = rest.strip_suffix("```").unwrap_or(rest);
    rest.trim()
}

/// Parse a model response into slide sections.
///
/// Tolerates prose around the JSON by extracting the outermost array.
pub(crate) fn parse_sections(response: &str) -> Result<Vec<SlideSection>> {
    let cleaned = strip_code_fences(response);

    let json_start = cleaned.find('[');
    let json_end = cleaned.rfind(']');

    let json_str = match (json_start, json_end) {
        (Some(start), Some(end)) if end > start => &cleaned[start..=end],
        _ => cleaned,
    };

    let sections: Vec<SlideSection> =
        serde_json::from_str(json_str).map_err(|e| LysarkError::ResponseMalformed {
            reason: e.to_string(),
            raw_output: response.to_string(),
        })?;

    if sections.is_empty() {
        return Err(LysarkError::ResponseMalformed {
            reason: "Model returned an empty section list".to_string(),
            raw_output: response.to_string(),
        });
    }

    Ok(sections)
}

#[cfg(test)]
mod tests {
    use super::*;

    const WELL_FORMED: &str = r#"[
        {"title": "Introduction", "bullets": ["What the video covers.", "Who it is for.", "Why it matters."]},
        {"title": "Core Ideas", "bullets": ["First idea.", "Second idea.", "Third idea.", "Fourth idea."]}
    ]"#;

    #[test]
    fn test_parse_sections() {
        let sections = parse_sections(WELL_FORMED).unwrap();
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].title, "Introduction");
        assert_eq!(sections[1].bullets.len(), 4);
    }

    #[test]
    fn test_parse_sections_with_fences() {
        let fenced = format!("```json\n{}\n```", WELL_FORMED);
        let sections = parse_sections(&fenced).unwrap();
        assert_eq!(sections.len(), 2);
    }

    #[test]
    fn test_parse_sections_with_surrounding_prose() {
        let chatty = format!("Here is your summary:\n\n{}\n\nHope this helps!", WELL_FORMED);
        let sections = parse_sections(&chatty).unwrap();
        assert_eq!(sections.len(), 2);
    }

    #[test]
    fn test_parse_sections_rejects_malformed() {
        let err = parse_sections("I'm sorry, I can't do that.").unwrap_err();
        match err {
            LysarkError::ResponseMalformed { raw_output, .. } => {
                assert!(raw_output.contains("sorry"));
            }
            other => panic!("expected ResponseMalformed, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_sections_rejects_empty_array() {
        assert!(matches!(
            parse_sections("[]"),
            Err(LysarkError::ResponseMalformed { .. })
        ));
    }

    #[test]
    fn test_parse_full_format_contract() {
        // A compliant response: 6-9 sections, 3-7 bullets each
        let mut sections = Vec::new();
        for i in 0..7 {
            sections.push(SlideSection {
                title: format!("Section {}", i + 1),
                bullets: (0..4).map(|b| format!("Bullet {}", b + 1)).collect(),
            });
        }
        let json = serde_json::to_string(&sections).unwrap();

        let parsed = parse_sections(&json).unwrap();
        assert!((6..=9).contains(&parsed.len()));
        for section in &parsed {
            assert!((3..=7).contains(&section.bullets.len()));
        }
    }

    #[test]
    fn test_truncate_chars_multibyte_safe() {
        let text = "héllo wörld";
        let truncated = truncate_chars(text, 4);
        assert_eq!(truncated, "héll");
        assert_eq!(truncate_chars("short", 100), "short");
    }

    #[test]
    fn test_strip_code_fences_variants() {
        assert_eq!(strip_code_fences("```json\n[1]\n```"), "[1]");
        assert_eq!(strip_code_fences("```\n[1]\n```"), "[1]");
        assert_eq!(strip_code_fences("[1]"), "[1]");
    }
}
