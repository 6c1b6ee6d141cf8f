//! Lysark - YouTube videos to slide decks, with transcript chat
//!
//! A web service that turns a YouTube video into a presentation and a
//! question-answering interface over its transcript.
//!
//! The name "Lysark" comes from the Norwegian word for a presentation slide.
//!
//! # Overview
//!
//! Lysark allows you to:
//! - Fetch the caption transcript of a YouTube video
//! - Summarize the transcript into titled, bulleted slide sections
//! - Render those sections into a downloadable `.pptx` deck
//! - Ask questions about the video, answered with retrieval-augmented
//!   generation over the transcript
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Configuration management
//! - `transcript` - YouTube caption fetching
//! - `summarize` - Transcript summarization into slide sections
//! - `deck` - Presentation generation and rendering
//! - `embedding` - Embedding generation
//! - `index` - Session-keyed retrieval index
//! - `qa` - Retrieval-augmented question answering
//! - `server` - HTTP API surface
//!
//! # Example
//!
//! ```rust,no_run
//! use lysark::config::Settings;
//! use lysark::server;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     server::run_server("0.0.0.0", 5000, settings).await
//! }
//! ```

pub mod config;
pub mod deck;
pub mod embedding;
pub mod error;
pub mod index;
pub mod openai;
pub mod output;
pub mod qa;
pub mod server;
pub mod summarize;
pub mod transcript;

pub use error::{LysarkError, Result};
