//! Prompt templates for Lysark.
//!
//! Prompts can be customized by placing TOML files in the custom prompts directory.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Prompts {
    pub summary: SummaryPrompts,
    pub deck: DeckPrompts,
    pub rag: RagPrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: std::collections::HashMap<String, String>,
}


/// Prompts for transcript summarization.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryPrompts {
    pub system: String,
    pub user: String,
}

impl Default for SummaryPrompts {
    fn default() -> Self {
        Self {
            system: r#"You are a presentation assistant. You turn video transcripts into concise, well-structured slide outlines.

Output rules:
- Respond with valid JSON only. No prose, no markdown fences.
- The JSON is an array of section objects, each with a "title" string and a "bullets" array of strings."#.to_string(),

            user: r#"Summarize the video transcript below into 6-9 sections. Each section must include:
- A "title" (string)
- 3-7 bullet points as a list of strings under "bullets"

Respond with valid JSON only, in this format:

[
  {
    "title": "Section Title",
    "bullets": [
      "First bullet point.",
      "Second bullet point.",
      "Third bullet point."
    ]
  }
]

Transcript:
"""{{transcript}}""""#.to_string(),
        }
    }
}

/// Prompts for slide deck content generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeckPrompts {
    pub system: String,
    pub user: String,
}

impl Default for DeckPrompts {
    fn default() -> Self {
        Self {
            system: r#"You are a presentation expert. You design clear, informative slide decks from video transcripts.

Output rules:
- Respond with valid JSON only. No prose, no markdown fences.
- The JSON is an array of slide objects, each with a "title" string and a "bullets" array of strings."#.to_string(),

            user: r#"Using the full transcript below, generate a detailed slide deck structure.
Break it into 5-7 slides. Each slide should have:
- A relevant title
- 3-5 bullet points (clear, informative)

Return ONLY JSON like:
[
  {
    "title": "Slide Title",
    "bullets": ["Bullet 1", "Bullet 2"]
  }
]

TRANSCRIPT:
"""{{transcript}}""""#.to_string(),
        }
    }
}

/// Prompts for RAG answer generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RagPrompts {
    pub system: String,
    pub user: String,
}

impl Default for RagPrompts {
    fn default() -> Self {
        Self {
            system: r#"You are a helpful assistant that answers questions about a video based on excerpts from its transcript.

Guidelines:
- Answer using only the provided transcript excerpts
- If the excerpts don't contain relevant information, say so clearly
- Be concise but complete
- When multiple excerpts are relevant, synthesize information across them"#.to_string(),

            user: r#"Question: {{question}}

Relevant transcript excerpts:

{{context}}

Please answer the question based on the above excerpts."#.to_string(),
        }
    }
}

impl Prompts {
    /// Load prompts from the default location, with optional custom directory and variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&std::collections::HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        // Store custom variables
        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            // Load summary prompts if file exists
            let summary_path = custom_path.join("summary.toml");
            if summary_path.exists() {
                let content = std::fs::read_to_string(&summary_path)?;
                prompts.summary = toml::from_str(&content)?;
            }

            // Load deck prompts if file exists
            let deck_path = custom_path.join("deck.toml");
            if deck_path.exists() {
                let content = std::fs::read_to_string(&deck_path)?;
                prompts.deck = toml::from_str(&content)?;
            }

            // Load RAG prompts if file exists
            let rag_path = custom_path.join("rag.toml");
            if rag_path.exists() {
                let content = std::fs::read_to_string(&rag_path)?;
                prompts.rag = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    pub fn render(template: &str, vars: &std::collections::HashMap<String, String>) -> String {
        let mut result = template.to_string();
        for (key, value) in vars {
            result = result.replace(&format!("{{{{{}}}}}", key), value);
        }
        result
    }

    /// Render a prompt template with both provided variables and custom config variables.
    /// Provided variables take precedence over custom config variables.
    pub fn render_with_custom(
        &self,
        template: &str,
        vars: &std::collections::HashMap<String, String>,
    ) -> String {
        // Start with custom variables, then override with provided vars
        let mut merged = self.variables.clone();
        for (key, value) in vars {
            merged.insert(key.clone(), value.clone());
        }
        Self::render(template, &merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_prompts() {
        let prompts = Prompts::default();
        assert!(prompts.summary.user.contains("6-9 sections"));
        assert!(prompts.deck.user.contains("5-7 slides"));
        assert!(!prompts.rag.system.is_empty());
    }

    #[test]
    fn test_render_template() {
        let template = "Q: {{question}}\nContext: {{context}}";
        let mut vars = std::collections::HashMap::new();
        vars.insert("question".to_string(), "What are cats?".to_string());
        vars.insert("context".to_string(), "Cats are mammals.".to_string());

        let result = Prompts::render(template, &vars);
        assert_eq!(result, "Q: What are cats?\nContext: Cats are mammals.");
    }

    #[test]
    fn test_custom_dir_override() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("rag.toml"),
            "system = \"Answer tersely.\"\nuser = \"{{question}}\"\n",
        )
        .unwrap();

        let prompts = Prompts::load(dir.path().to_str(), None).unwrap();
        assert_eq!(prompts.rag.system, "Answer tersely.");
        // Other prompt groups keep their defaults
        assert!(prompts.summary.user.contains("6-9 sections"));
    }
}
