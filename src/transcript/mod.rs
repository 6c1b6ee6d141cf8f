//! YouTube caption transcript fetching.
//!
//! Resolves a video locator (URL or bare ID) to the video's caption
//! transcript as plain text.

use crate::error::{LysarkError, Result};
use regex::Regex;
use tracing::{debug, instrument};
use yt_transcript_rs::api::YouTubeTranscriptApi;

/// A fetched video transcript.
#[derive(Debug, Clone)]
pub struct VideoTranscript {
    /// The resolved 11-character video ID.
    pub video_id: String,
    /// Language code of the caption track that was used.
    pub language: String,
    /// Full transcript text.
    pub text: String,
}

/// Fetches caption transcripts from YouTube.
pub struct TranscriptFetcher {
    video_id_regex: Regex,
    languages: Vec<String>,
}

impl TranscriptFetcher {
    /// Create a fetcher with a caption language preference list.
    pub fn new(languages: &[String]) -> Self {
        // Matches various YouTube URL formats and bare video IDs
        let video_id_regex = Regex::new(
            r"(?x)
            (?:
                # Full YouTube URLs
                (?:https?://)?
                (?:www\.)?
                (?:youtube\.com/watch\?v=|youtu\.be/|youtube\.com/embed/|youtube\.com/v/)
                ([a-zA-Z0-9_-]{11})
            )
            |
            # Bare video ID (11 characters)
            ^([a-zA-Z0-9_-]{11})$
        ",
        )
        .expect("Invalid regex");

        Self {
            video_id_regex,
            languages: languages.to_vec(),
        }
    }

    /// Extract video ID from a YouTube URL or bare ID.
    pub fn extract_video_id(&self, input: &str) -> Option<String> {
        let caps = self.video_id_regex.captures(input.trim())?;

        // Try group 1 (URL format) then group 2 (bare ID)
        caps.get(1)
            .or_else(|| caps.get(2))
            .map(|m| m.as_str().to_string())
    }

    /// Fetch the caption transcript for a video locator.
    ///
    /// Returns `InvalidInput` for an unparseable locator and
    /// `TranscriptFetch` when the provider fails or no captions exist.
    #[instrument(skip(self))]
    pub async fn fetch(&self, locator: &str) -> Result<VideoTranscript> {
        let video_id = self.extract_video_id(locator).ok_or_else(|| {
            LysarkError::InvalidInput(format!("Invalid YouTube video ID or URL: {}", locator))
        })?;

        let api = YouTubeTranscriptApi::new(None, None, None)
            .map_err(|e| LysarkError::TranscriptFetch(format!("Failed to create client: {}", e)))?;

        let languages: Vec<&str> = self.languages.iter().map(|s| s.as_str()).collect();

        let fetched = api
            .fetch_transcript(&video_id, &languages, false)
            .await
            .map_err(|e| {
                LysarkError::TranscriptFetch(format!(
                    "No transcript available for {}: {}",
                    video_id, e
                ))
            })?;

        debug!(
            "Fetched {} caption snippets in '{}' for {}",
            fetched.snippets.len(),
            fetched.language_code,
            video_id
        );

        let text = fetched.text();
        if text.trim().is_empty() {
            return Err(LysarkError::TranscriptFetch(format!(
                "Transcript for {} is empty",
                video_id
            )));
        }

        Ok(VideoTranscript {
            video_id,
            language: fetched.language_code.clone(),
            text,
        })
    }
}
