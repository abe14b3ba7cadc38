//! HTTP API
//!
//! JSON endpoints over the retrieval pipeline. Handlers receive every
//! collaborator through [`AppState`].

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::TravelAdviserError;
use crate::llm::{GenerationRequest, LanguageModel};
use crate::models::{AggregatedAttraction, ChatMessage, ConversationState, TripIntent};
use crate::retrieval::{RetrievalOrchestrator, RetrievalOutcome};
use crate::session::generate_session_id;
use crate::store::CatalogStore;

mod error;

pub use error::ApiError;

const TOKEN_BUFFER: usize = 64;

/// Shared collaborators for all handlers
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<RetrievalOrchestrator>,
    pub llm: Arc<dyn LanguageModel>,
    pub store: Arc<dyn CatalogStore>,
}

impl AppState {
    #[must_use]
    pub fn new(
        orchestrator: Arc<RetrievalOrchestrator>,
        llm: Arc<dyn LanguageModel>,
        store: Arc<dyn CatalogStore>,
    ) -> Self {
        Self {
            orchestrator,
            llm,
            store,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct QuestionRequest {
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub session_id: String,
    #[serde(default)]
    pub history: Vec<ChatMessage>,
}

impl QuestionRequest {
    fn validate(self) -> Result<(String, ConversationState), TravelAdviserError> {
        let question = self.question.trim();
        if question.is_empty() {
            return Err(TravelAdviserError::validation("question must not be empty"));
        }
        if self.session_id.trim().is_empty() {
            return Err(TravelAdviserError::validation("session_id must not be empty"));
        }

        let conversation = ConversationState::new(self.session_id).with_history(self.history);
        Ok((question.to_string(), conversation))
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SimilarsResponse {
    pub intent: TripIntent,
    pub neighbor_cities: Vec<String>,
    pub similars: Vec<AggregatedAttraction>,
    pub generated_at: DateTime<Utc>,
}

impl From<RetrievalOutcome> for SimilarsResponse {
    fn from(outcome: RetrievalOutcome) -> Self {
        Self {
            intent: outcome.intent,
            neighbor_cities: outcome.neighbor_cities,
            similars: outcome.attractions,
            generated_at: outcome.generated_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AnswerResponse {
    #[serde(flatten)]
    pub retrieval: SimilarsResponse,
    pub output: String,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/ready", get(ready))
        .route("/generate_session_id", post(new_session))
        .route("/similars", post(similars))
        .route("/answer", post(answer))
        .with_state(state)
}

async fn root() -> Json<Value> {
    Json(json!({ "message": "Hello from Travel Adviser project!" }))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn ready(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    state
        .store
        .health_check()
        .await
        .map_err(|e| ApiError::ServiceUnavailable(e.user_message()))?;
    Ok(Json(json!({ "status": "ready" })))
}

async fn new_session() -> Json<Value> {
    Json(json!({ "session_id": generate_session_id() }))
}

async fn similars(
    State(state): State<AppState>,
    request: Result<Json<QuestionRequest>, JsonRejection>,
) -> Result<Json<SimilarsResponse>, ApiError> {
    let Json(request) = request?;
    let (question, conversation) = request.validate()?;
    let outcome = state.orchestrator.run(&question, &conversation).await?;
    Ok(Json(outcome.into()))
}

/// Retrieval followed by generation.
///
/// The response is not streamed. Tokens are only counted as they arrive and
/// then discarded; the body carries the full generated text. The receiver
/// stays open until generation ends since a closed sink stops the model early.
async fn answer(
    State(state): State<AppState>,
    request: Result<Json<QuestionRequest>, JsonRejection>,
) -> Result<Json<AnswerResponse>, ApiError> {
    let Json(request) = request?;
    let (question, conversation) = request.validate()?;
    let outcome = state.orchestrator.run(&question, &conversation).await?;

    let (tokens, mut receiver) = mpsc::channel::<String>(TOKEN_BUFFER);
    let generation = state.llm.generate_streaming(
        GenerationRequest {
            question: &question,
            conversation: &conversation,
            intent: &outcome.intent,
            attractions: &outcome.attractions,
        },
        tokens,
    );
    let drain = async {
        let mut count = 0usize;
        while receiver.recv().await.is_some() {
            count += 1;
        }
        count
    };

    let (output, token_count) = tokio::join!(generation, drain);
    let output = output?;
    debug!("Generation streamed {} tokens", token_count);
    info!(
        "Answered session {} with {} attractions",
        conversation.session_id,
        outcome.attractions.len()
    );

    Ok(Json(AnswerResponse {
        retrieval: outcome.into(),
        output,
    }))
}
