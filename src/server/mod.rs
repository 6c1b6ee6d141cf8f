//! HTTP API server.
//!
//! Exposes the summarize, presentation and chat endpoints, and serves
//! generated decks as static assets.

use crate::config::{Prompts, Settings};
use crate::deck::DeckBuilder;
use crate::embedding::{Embedder, OpenAIEmbedder};
use crate::error::LysarkError;
use crate::index::{IndexBuilder, IndexStore, SqliteIndexStore};
use crate::output::Output;
use crate::qa::QaEngine;
use crate::summarize::{SlideSection, Summarizer, SummaryOutcome};
use crate::transcript::TranscriptFetcher;
use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tracing::{error, info};
use uuid::Uuid;

/// Embedded home page.
const INDEX_HTML: &str = include_str!("../../assets/index.html");

/// Shared application state.
struct AppState {
    settings: Settings,
    fetcher: TranscriptFetcher,
    summarizer: Summarizer,
    deck_builder: DeckBuilder,
    index_builder: IndexBuilder,
    qa: QaEngine,
    store: Arc<dyn IndexStore>,
}

/// Run the HTTP API server.
pub async fn run_server(host: &str, port: u16, settings: Settings) -> anyhow::Result<()> {
    let prompts = Prompts::load(
        settings.prompts.custom_dir.as_deref(),
        Some(&settings.prompts.variables),
    )?;

    let embedder: Arc<dyn Embedder> = Arc::new(OpenAIEmbedder::with_config(
        &settings.embedding.model,
        settings.embedding.dimensions as usize,
    ));
    let store: Arc<dyn IndexStore> = Arc::new(SqliteIndexStore::new(&settings.sqlite_path())?);

    let generated_dir = settings.generated_dir();
    std::fs::create_dir_all(&generated_dir)?;

    let state = Arc::new(AppState {
        fetcher: TranscriptFetcher::new(&settings.transcript.languages),
        summarizer: Summarizer::new(
            &settings.summarizer.model,
            settings.summarizer.max_transcript_chars,
        )
        .with_prompts(prompts.clone()),
        deck_builder: DeckBuilder::new(
            &settings.deck.model,
            settings.deck.max_transcript_chars,
            &settings.deck.title,
            &settings.deck.subtitle,
        )
        .with_prompts(prompts.clone()),
        index_builder: IndexBuilder::new(
            embedder.clone(),
            store.clone(),
            settings.windowing.size_chars,
            settings.windowing.overlap_chars,
        ),
        qa: QaEngine::new(
            store.clone(),
            embedder,
            &settings.rag.model,
            settings.rag.max_context_windows as usize,
            settings.rag.min_score,
        )
        .with_prompts(prompts),
        store,
        settings,
    });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/", get(home))
        .route("/health", get(health))
        .route("/summarize", post(summarize))
        .route("/generate_ppt", post(generate_ppt))
        .route("/chat", post(chat))
        .nest_service("/static/generated", ServeDir::new(generated_dir))
        .layer(cors)
        .with_state(state);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("Lysark Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Home", "GET  /");
    Output::kv("Health", "GET  /health");
    Output::kv("Summarize", "POST /summarize");
    Output::kv("Generate deck", "POST /generate_ppt");
    Output::kv("Chat", "POST /chat");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app).await?;

    Ok(())
}

// === Request/Response Types ===

#[derive(Deserialize)]
struct SummarizeRequest {
    #[serde(default)]
    url: String,
}

#[derive(Serialize)]
struct SummarizeResponse {
    transcript: String,
    slides: Vec<SlideSection>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    degraded: bool,
}

#[derive(Deserialize)]
struct GeneratePptRequest {
    #[serde(default)]
    transcript: String,
}

#[derive(Serialize)]
struct GeneratePptResponse {
    ppt_url: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    degraded: bool,
}

#[derive(Deserialize)]
struct ChatRequest {
    #[serde(default)]
    question: String,
    #[serde(default)]
    transcript: String,
}

#[derive(Serialize)]
struct ChatResponse {
    answer: String,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

/// Map an error kind to its client-visible status code.
fn error_status(err: &LysarkError) -> StatusCode {
    match err {
        LysarkError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        LysarkError::IndexMissing(_) => StatusCode::CONFLICT,
        LysarkError::TranscriptFetch(_)
        | LysarkError::ModelCall(_)
        | LysarkError::Embedding(_)
        | LysarkError::ResponseMalformed { .. }
        | LysarkError::Http(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(err: &LysarkError) -> Response {
    error!("Request failed: {}", err);
    (
        error_status(err),
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
        .into_response()
}

/// Diagnostic slide substituted when the model output does not parse.
fn diagnostic_slide(reason: &str, raw_output: &str) -> SlideSection {
    SlideSection {
        title: "Error Parsing Summary".to_string(),
        bullets: vec![
            reason.to_string(),
            "Raw output:".to_string(),
            raw_output.to_string(),
        ],
    }
}

// === Handlers ===

async fn home() -> impl IntoResponse {
    Html(INDEX_HTML)
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn summarize(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SummarizeRequest>,
) -> Response {
    let transcript = match state.fetcher.fetch(&req.url).await {
        Ok(t) => t,
        Err(e) => return error_response(&e),
    };

    match state.summarizer.summarize(&transcript.text).await {
        Ok(SummaryOutcome::Complete(slides)) => Json(SummarizeResponse {
            transcript: transcript.text,
            slides,
            degraded: false,
        })
        .into_response(),
        Ok(SummaryOutcome::Degraded { reason, raw_output }) => Json(SummarizeResponse {
            transcript: transcript.text,
            slides: vec![diagnostic_slide(&reason, &raw_output)],
            degraded: true,
        })
        .into_response(),
        Err(e) => error_response(&e),
    }
}

async fn generate_ppt(
    State(state): State<Arc<AppState>>,
    Json(req): Json<GeneratePptRequest>,
) -> Response {
    if req.transcript.trim().is_empty() {
        return error_response(&LysarkError::InvalidInput(
            "Transcript is empty".to_string(),
        ));
    }

    let filename = format!(
        "presentation_{}.pptx",
        chrono::Local::now().format("%Y%m%d%H%M%S")
    );
    let filepath = state.settings.generated_dir().join(&filename);

    match state
        .deck_builder
        .build(&req.transcript, Some(&filepath))
        .await
    {
        Ok(result) => {
            info!("Generated deck {} ({} bytes)", filename, result.bytes.len());
            Json(GeneratePptResponse {
                ppt_url: format!("/static/generated/{}", filename),
                degraded: result.degraded.is_some(),
            })
            .into_response()
        }
        Err(e) => error_response(&e),
    }
}

async fn chat(State(state): State<Arc<AppState>>, Json(req): Json<ChatRequest>) -> Response {
    let question = req.question.trim();
    let transcript = req.transcript.trim();

    if question.is_empty() || transcript.is_empty() {
        return error_response(&LysarkError::InvalidInput(
            "Missing question or transcript".to_string(),
        ));
    }

    // Every request gets its own index; no state is shared across chats
    let session_id = Uuid::new_v4();

    if let Err(e) = state.index_builder.build(session_id, transcript).await {
        return error_response(&e);
    }

    let answer = state.qa.answer(session_id, question).await;

    // The session is request-scoped; drop its rows either way
    if let Err(e) = state.store.delete_session(session_id).await {
        error!("Failed to clean up session {}: {}", session_id, e);
    }

    match answer {
        Ok(answer) => Json(ChatResponse { answer }).into_response(),
        Err(e) => error_response(&e),
    }
}
