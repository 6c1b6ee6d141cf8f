//! Configuration module for Lysark.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{DeckPrompts, Prompts, RagPrompts, SummaryPrompts};
pub use settings::{
    DeckSettings, EmbeddingSettings, GeneralSettings, IndexSettings, PromptSettings, RagSettings,
    Settings, SummarizerSettings, TranscriptSettings, WindowSettings,
};
