use crate::config::Provider;
use crate::error::GatewayError;
use crate::models::{CanonicalResult, Completion, GeminiReply, PromptRequest};
use crate::reactions::{self, ReactionKind, ReactionRecord, empty_record};
use crate::request_id::{self, RequestId};
use crate::state::AppState;
use axum::{
    extract::{Path, State, rejection::JsonRejection},
    response::sse::{Event, KeepAlive, Sse},
    routing::{get, post},
    Extension, Json, Router,
};
use futures::{stream, Stream, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tracing::{debug, info, warn};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health))
        .route("/ping", get(ping))
        .route("/api/gemini", post(gemini_chat))
        .route("/api/groq", post(groq_chat))
        .route("/api/openai", post(openai_chat))
        .route("/api/all", post(fan_out_chat))
        .route("/api/all/stream", post(fan_out_stream))
        .route("/api/reactions/{provider}", get(get_reactions))
        .route("/api/reactions/{provider}/events", get(reaction_events))
        .route("/api/reactions/{provider}/{kind}", post(add_reaction))
        .layer(axum::middleware::from_fn(request_id::inject_request_id))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> &'static str {
    "OK"
}

async fn ping() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

// Rejections become `{error}` bodies like every other failure
fn prompt_from(body: Result<Json<PromptRequest>, JsonRejection>) -> Result<PromptRequest, GatewayError> {
    let Json(request) = body.map_err(|e| GatewayError::InvalidRequest(e.body_text()))?;
    request.validate()?;
    Ok(request)
}

async fn dispatch_single(
    state: &AppState,
    provider: Provider,
    request_id: RequestId,
    body: Result<Json<PromptRequest>, JsonRejection>,
) -> Result<Completion, GatewayError> {
    let request = prompt_from(body)?;
    debug!("{} prompt received ({} chars)", provider, request.prompt.chars().count());
    let outcome = state
        .dispatcher
        .dispatch(provider, Arc::new(request), Some(request_id))
        .await;
    outcome
        .result
        .inspect_err(|e| warn!("{} request failed: {}", provider, e))
}

#[axum_macros::debug_handler]
pub async fn gemini_chat(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    body: Result<Json<PromptRequest>, JsonRejection>,
) -> Result<Json<GeminiReply>, GatewayError> {
    let completion = dispatch_single(&state, Provider::Gemini, request_id, body).await?;
    Ok(Json(GeminiReply::from(completion)))
}

/// Returns Groq's chat-completion body untouched.
#[axum_macros::debug_handler]
pub async fn groq_chat(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    body: Result<Json<PromptRequest>, JsonRejection>,
) -> Result<Json<Value>, GatewayError> {
    let completion = dispatch_single(&state, Provider::Groq, request_id, body).await?;
    Ok(Json(completion.raw))
}

/// Returns OpenAI's chat-completion body untouched.
#[axum_macros::debug_handler]
pub async fn openai_chat(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    body: Result<Json<PromptRequest>, JsonRejection>,
) -> Result<Json<Value>, GatewayError> {
    let completion = dispatch_single(&state, Provider::OpenAI, request_id, body).await?;
    Ok(Json(completion.raw))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FanOutResponse {
    pub results: BTreeMap<String, CanonicalResult>,
}

/// Every provider in one call. Always 200 once the prompt is valid; failures
/// are reported per provider.
#[axum_macros::debug_handler]
pub async fn fan_out_chat(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    body: Result<Json<PromptRequest>, JsonRejection>,
) -> Result<Json<FanOutResponse>, GatewayError> {
    let request = prompt_from(body)?;
    let outcomes = state.dispatcher.fan_out(request, Some(request_id)).await;
    let results = outcomes
        .iter()
        .map(|o| (o.provider.as_str().to_string(), o.to_canonical()))
        .collect();
    Ok(Json(FanOutResponse { results }))
}

fn json_event<T: Serialize>(name: &str, data: &T) -> Event {
    Event::default()
        .event(name)
        .json_data(data)
        .unwrap_or_else(|e| Event::default().event("error").data(e.to_string()))
}

/// One `result` event per provider as soon as it settles, then `done`.
pub async fn fan_out_stream(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    body: Result<Json<PromptRequest>, JsonRejection>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, GatewayError> {
    let request = prompt_from(body)?;
    info!("Streaming fan-out to {} providers", state.dispatcher.providers().len());
    let events = state
        .dispatcher
        .fan_out_unordered(request, Some(request_id))
        .map(|outcome| Ok::<_, Infallible>(json_event("result", &outcome.to_canonical())))
        .chain(stream::once(async {
            Ok(Event::default().event("done").data("[DONE]"))
        }));
    Ok(Sse::new(events).keep_alive(KeepAlive::new().interval(Duration::from_secs(1))))
}

fn parse_provider(name: &str) -> Result<Provider, GatewayError> {
    Provider::from_name(name).ok_or_else(|| GatewayError::UnknownProvider(name.to_string()))
}

pub async fn get_reactions(
    State(state): State<AppState>,
    Path(provider): Path<String>,
) -> Result<Json<ReactionRecord>, GatewayError> {
    let provider = parse_provider(&provider)?;
    let record = state
        .reactions
        .get(provider.as_str())
        .await
        .unwrap_or_else(empty_record);
    Ok(Json(record))
}

pub async fn add_reaction(
    State(state): State<AppState>,
    Path((provider, kind)): Path<(String, String)>,
) -> Result<Json<ReactionRecord>, GatewayError> {
    let provider = parse_provider(&provider)?;
    let kind = ReactionKind::from_name(&kind)
        .ok_or_else(|| GatewayError::InvalidRequest(format!("unknown reaction: {}", kind)))?;
    let record = reactions::add_reaction(state.reactions.as_ref(), provider.as_str(), kind).await;
    Ok(Json(record))
}

/// Current tally first, then one event per change.
pub async fn reaction_events(
    State(state): State<AppState>,
    Path(provider): Path<String>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, GatewayError> {
    let provider = parse_provider(&provider)?;
    let rx = state.reactions.subscribe(provider.as_str()).await;
    let updates = stream::unfold((rx, true), |(mut rx, first)| async move {
        if !first && rx.changed().await.is_err() {
            return None;
        }
        let record = rx.borrow_and_update().clone().unwrap_or_else(empty_record);
        Some((record, (rx, false)))
    });
    let events = updates.map(|record| Ok::<_, Infallible>(json_event("reactions", &record)));
    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}
