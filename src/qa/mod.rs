//! Retrieval-augmented question answering over an indexed transcript.

use crate::config::Prompts;
use crate::embedding::Embedder;
use crate::error::{LysarkError, Result};
use crate::index::{IndexStore, ScoredWindow};
use crate::openai::{create_client, with_retry};
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument};
use uuid::Uuid;

/// Answers questions against a session's retrieval index.
///
/// Each call is independent: there is no conversation memory across turns.
pub struct QaEngine {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    store: Arc<dyn IndexStore>,
    embedder: Arc<dyn Embedder>,
    max_windows: usize,
    min_score: f32,
    prompts: Prompts,
}

impl QaEngine {
    pub fn new(
        store: Arc<dyn IndexStore>,
        embedder: Arc<dyn Embedder>,
        model: &str,
        max_windows: usize,
        min_score: f32,
    ) -> Self {
        Self {
            client: create_client(),
            model: model.to_string(),
            store,
            embedder,
            max_windows,
            min_score,
            prompts: Prompts::default(),
        }
    }

    /// Set custom prompts (with user-defined variables).
    pub fn with_prompts(mut self, prompts: Prompts) -> Self {
        self.prompts = prompts;
        self
    }

    /// Retrieve the most relevant windows for a question.
    async fn retrieve(&self, session_id: Uuid, question: &str) -> Result<Vec<ScoredWindow>> {
        if !self.store.session_exists(session_id).await? {
            return Err(LysarkError::IndexMissing(session_id.to_string()));
        }

        let query_embedding = self.embedder.embed(question).await?;
        self.store
            .search(session_id, &query_embedding, self.max_windows, self.min_score)
            .await
    }

    /// Answer a question against a session's index.
    #[instrument(skip(self, question), fields(session = %session_id))]
    pub async fn answer(&self, session_id: Uuid, question: &str) -> Result<String> {
        if question.trim().is_empty() {
            return Err(LysarkError::InvalidInput("Question is empty".to_string()));
        }

        info!("Answering question");

        let windows = self.retrieve(session_id, question).await?;
        if windows.is_empty() {
            return Ok(
                "I couldn't find anything relevant to that question in the transcript."
                    .to_string(),
            );
        }

        let context = format_context(&windows);
        debug!("Retrieved {} context windows", windows.len());

        let mut vars = HashMap::new();
        vars.insert("question".to_string(), question.to_string());
        vars.insert("context".to_string(), context);

        let system_message = self.prompts.rag.system.clone();
        let user_message = self.prompts.render_with_custom(&self.prompts.rag.user, &vars);

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
            .model(&self.model)
            .messages(messages)
            .temperature(0.2)
            .build()
            .map_err(|e| LysarkError::ModelCall(e.to_string()))?;

        let response = with_retry(|| async {
            self.client
                .chat()
                .create(request.clone())
                .await
                .map_err(|e| LysarkError::ModelCall(format!("Failed to generate answer: {}", e)))
        })
        .await?;

        response
            .choices
            .first()
            .and_then(|c| c.message.content.as_ref())
            .cloned()
            .ok_or_else(|| LysarkError::ModelCall("Empty response from LLM".to_string()))
    }
}

/// Format retrieved windows for inclusion in a prompt.
pub fn format_context(windows: &[ScoredWindow]) -> String {
    windows
        .iter()
        .enumerate()
        .map(|(i, w)| format!("---\n[{}]\n{}\n---", i + 1, w.window.content))
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::{MemoryIndexStore, Window};

    struct FixedEmbedder;

    #[async_trait::async_trait]
    impl Embedder for FixedEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(vec![1.0, 0.0])
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|_| vec![1.0, 0.0]).collect())
        }

        fn dimensions(&self) -> usize {
            2
        }
    }

    fn engine(store: Arc<dyn IndexStore>) -> QaEngine {
        QaEngine::new(store, Arc::new(FixedEmbedder), "gpt-4o-mini", 4, 0.0)
    }

    #[tokio::test]
    async fn test_answer_before_index_is_index_missing() {
        let qa = engine(Arc::new(MemoryIndexStore::new()));
        let err = qa.answer(Uuid::new_v4(), "anything?").await.unwrap_err();
        assert!(matches!(err, LysarkError::IndexMissing(_)));
    }

    #[tokio::test]
    async fn test_empty_question_is_invalid_input() {
        let qa = engine(Arc::new(MemoryIndexStore::new()));
        let err = qa.answer(Uuid::new_v4(), "  ").await.unwrap_err();
        assert!(matches!(err, LysarkError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_retrieve_is_session_scoped() {
        let store = Arc::new(MemoryIndexStore::new());
        let mine = Uuid::new_v4();
        let theirs = Uuid::new_v4();
        store
            .insert_batch(&[
                Window::new(mine, 0, "my transcript".to_string(), vec![1.0, 0.0]),
                Window::new(theirs, 0, "their transcript".to_string(), vec![1.0, 0.0]),
            ])
            .await
            .unwrap();

        let qa = engine(store);
        let windows = qa.retrieve(mine, "question").await.unwrap();
        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0].window.content, "my transcript");
    }

    #[test]
    fn test_format_context_numbers_windows() {
        let session = Uuid::new_v4();
        let windows = vec![
            ScoredWindow {
                window: Window::new(session, 0, "first".to_string(), vec![]),
                score: 0.9,
            },
            ScoredWindow {
                window: Window::new(session, 1, "second".to_string(), vec![]),
                score: 0.8,
            },
        ];

        let context = format_context(&windows);
        assert!(context.contains("[1]\nfirst"));
        assert!(context.contains("[2]\nsecond"));
    }
}
