//! Presentation generation.
//!
//! Two phases: ask an LLM for slide sections, then render them into a
//! `.pptx` document with a title slide, one slide per section, and a recap
//! slide listing the section titles.

mod pptx;

pub use pptx::Presentation;

use crate::config::Prompts;
use crate::error::{LysarkError, Result};
use crate::openai::create_client;
use crate::summarize::{complete_chat, parse_sections, truncate_chars, SlideSection};
use std::collections::HashMap;
use std::path::Path;
use tracing::{info, instrument, warn};

/// Title of the final recap slide.
const RECAP_TITLE: &str = "Recap of Topics";

/// A generated deck.
#[derive(Debug, Clone)]
pub struct DeckResult {
    /// The rendered `.pptx` document.
    pub bytes: Vec<u8>,
    /// The sections the deck was rendered from.
    pub sections: Vec<SlideSection>,
    /// Set when the model output did not parse and a diagnostic
    /// single-section deck was produced instead.
    pub degraded: Option<String>,
}

/// Builds presentation documents from transcripts.
pub struct DeckBuilder {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    max_transcript_chars: usize,
    title: String,
    subtitle: String,
    prompts: Prompts,
}

impl DeckBuilder {
    pub fn new(model: &str, max_transcript_chars: usize, title: &str, subtitle: &str) -> Self {
        Self {
            client: create_client(),
            model: model.to_string(),
            max_transcript_chars,
            title: title.to_string(),
            subtitle: subtitle.to_string(),
            prompts: Prompts::default(),
        }
    }

    /// Set custom prompts (with user-defined variables).
    pub fn with_prompts(mut self, prompts: Prompts) -> Self {
        self.prompts = prompts;
        self
    }

    /// Ask the model for slide sections.
    ///
    /// A response that does not parse yields a single diagnostic section
    /// and a degraded reason rather than an error.
    #[instrument(skip(self, transcript), fields(chars = transcript.len()))]
    async fn generate_sections(
        &self,
        transcript: &str,
    ) -> Result<(Vec<SlideSection>, Option<String>)> {
        let truncated = truncate_chars(transcript, self.max_transcript_chars);

        let mut vars = HashMap::new();
        vars.insert("transcript".to_string(), truncated.to_string());

        let system_message = self
            .prompts
            .render_with_custom(&self.prompts.deck.system, &vars);
        let user_message = self
            .prompts
            .render_with_custom(&self.prompts.deck.user, &vars);

        let content =
            complete_chat(&self.client, &self.model, system_message, user_message).await?;

        match parse_sections(&content) {
            Ok(sections) => Ok((sections, None)),
            Err(LysarkError::ResponseMalformed { reason, raw_output }) => {
                warn!("Slide content did not parse, producing diagnostic deck: {}", reason);
                let diagnostic = SlideSection {
                    title: "Error Slide".to_string(),
                    bullets: vec![
                        format!("Failed to parse model response: {}", reason),
                        format!("Raw output: {}", truncate_chars(&raw_output, 300)),
                    ],
                };
                Ok((vec![diagnostic], Some(reason)))
            }
            Err(e) => Err(e),
        }
    }

    /// Render sections into a presentation document.
    ///
    /// Produces exactly `sections.len() + 2` slides.
    pub fn render(&self, sections: &[SlideSection]) -> Result<Vec<u8>> {
        let mut prs = Presentation::new();

        prs.add_title_slide(&self.title, &self.subtitle);

        for section in sections {
            prs.add_bullet_slide(&section.title, &section.bullets);
        }

        let recap: Vec<String> = sections.iter().map(|s| s.title.clone()).collect();
        prs.add_bullet_slide(RECAP_TITLE, &recap);

        prs.to_bytes()
    }

    /// Build a deck from a transcript, optionally writing it to disk.
    #[instrument(skip(self, transcript, save_path))]
    pub async fn build(
        &self,
        transcript: &str,
        save_path: Option<&Path>,
    ) -> Result<DeckResult> {
        if transcript.trim().is_empty() {
            return Err(LysarkError::InvalidInput(
                "Transcript is empty".to_string(),
            ));
        }

        let (sections, degraded) = self.generate_sections(transcript).await?;
        let bytes = self.render(&sections)?;

        if let Some(path) = save_path {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, &bytes)?;
            info!("Wrote {} slide deck to {:?}", sections.len() + 2, path);
        }

        Ok(DeckResult {
            bytes,
            sections,
            degraded,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Read};
    use zip::ZipArchive;

    fn builder() -> DeckBuilder {
        DeckBuilder::new("gpt-4o-mini", 12_000, "Lysark", "Auto-generated Presentation")
    }

    fn sections(n: usize) -> Vec<SlideSection> {
        (0..n)
            .map(|i| SlideSection {
                title: format!("Topic {}", i + 1),
                bullets: vec!["A point.".to_string(), "Another point.".to_string()],
            })
            .collect()
    }

    fn slide_texts(bytes: &[u8]) -> Vec<String> {
        let mut archive = ZipArchive::new(Cursor::new(bytes.to_vec())).unwrap();
        let mut names: Vec<String> = archive
            .file_names()
            .filter(|n| n.starts_with("ppt/slides/slide") && n.ends_with(".xml"))
            .map(|n| n.to_string())
            .collect();
        // slide2 sorts after slide10 lexicographically; order numerically
        names.sort_by_key(|n| {
            n.trim_start_matches("ppt/slides/slide")
                .trim_end_matches(".xml")
                .parse::<usize>()
                .unwrap()
        });

        names
            .iter()
            .map(|name| {
                let mut content = String::new();
                archive.by_name(name).unwrap().read_to_string(&mut content).unwrap();
                content
            })
            .collect()
    }

    #[test]
    fn test_render_slide_count_is_sections_plus_two() {
        let secs = sections(5);
        let bytes = builder().render(&secs).unwrap();
        assert_eq!(slide_texts(&bytes).len(), secs.len() + 2);
    }

    #[test]
    fn test_recap_lists_section_titles_in_order() {
        let secs = sections(3);
        let bytes = builder().render(&secs).unwrap();
        let slides = slide_texts(&bytes);

        let recap = slides.last().unwrap();
        assert!(recap.contains(RECAP_TITLE));

        let positions: Vec<usize> = secs
            .iter()
            .map(|s| recap.find(&s.title).expect("recap bullet missing"))
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_title_slide_comes_first() {
        let bytes = builder().render(&sections(2)).unwrap();
        let slides = slide_texts(&bytes);
        assert!(slides[0].contains("Lysark"));
        assert!(slides[0].contains("Auto-generated Presentation"));
    }

    #[tokio::test]
    async fn test_build_rejects_empty_transcript() {
        let err = builder().build("   ", None).await.unwrap_err();
        assert!(matches!(err, LysarkError::InvalidInput(_)));
    }
}
