use std::convert::Infallible;
use std::future::Future;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse,
    },
    Json,
};
use futures::stream::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio_stream::wrappers::{errors::BroadcastStreamRecvError, BroadcastStream};

use crate::editor::{self, ServiceEditor};
use crate::errors::AppError;
use crate::harness::{response_filename, PreparedRequest, TestInput};
use crate::middleware::access::{self, AccessDecision};
use crate::models::notification::Notice;
use crate::models::service::{ServiceDraft, ServiceRecord};
use crate::state::AppState;
use crate::store::{ServiceFilter, StoreResult};
use crate::validation::ValidationErrors;

// ── Request / Response DTOs ──────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateServiceRequest {
    #[serde(flatten)]
    pub draft: ServiceDraft,
    pub expected_version: Option<u64>,
}

#[derive(Deserialize, Default)]
pub struct ConfirmParams {
    #[serde(default)]
    pub confirm: bool,
}

#[derive(Deserialize)]
pub struct EndpointRequest {
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Deserialize)]
pub struct AccessRequest {
    #[serde(default)]
    pub roles: Vec<i64>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResponse {
    pub request: PreparedRequest,
    pub response_filename: String,
}

// ── Helpers ──────────────────────────────────────────────────

/// Run a store call under the configured save timeout.
pub(crate) async fn with_timeout<T, F>(state: &AppState, fut: F) -> Result<T, AppError>
where
    F: Future<Output = StoreResult<T>>,
{
    match tokio::time::timeout(state.config.save_timeout(), fut).await {
        Ok(res) => res.map_err(AppError::from),
        Err(_) => {
            tracing::error!(
                timeout_ms = state.config.save_timeout_ms,
                "store call timed out"
            );
            Err(AppError::Timeout)
        }
    }
}

/// Publish a failure notice for a rejected draft and hand back the error.
pub(crate) fn reject(state: &AppState, action: &str, errors: ValidationErrors) -> AppError {
    let summary = errors
        .iter()
        .next()
        .map(|(_, msg)| msg.to_string())
        .unwrap_or_default();
    tracing::warn!(action, fields = errors.len(), "draft rejected");
    state.notifier.publish(Notice::rejected(action, summary));
    AppError::Validation(errors)
}

// ── Handlers ─────────────────────────────────────────────────

/// GET /api/v1/services: list services, optionally filtered
pub async fn list_services(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<ServiceFilter>,
) -> Result<Json<Vec<ServiceRecord>>, AppError> {
    let rows = with_timeout(&state, state.services.list_services(&filter)).await?;
    Ok(Json(rows))
}

/// POST /api/v1/services: validate and create
pub async fn create_service(
    State(state): State<Arc<AppState>>,
    Json(draft): Json<ServiceDraft>,
) -> Result<impl IntoResponse, AppError> {
    let def = ServiceEditor::from_draft(draft)
        .submit(&state.config.validation_policy())
        .map_err(|e| reject(&state, "Create service", e))?;

    let record = with_timeout(&state, state.services.create_service(def)).await?;
    tracing::info!(id = record.id, endpoint = %record.definition.endpoint, "service created");
    state
        .notifier
        .publish(Notice::service_created(&record.definition.name));

    Ok((StatusCode::CREATED, Json(record)))
}

/// GET /api/v1/services/:id
pub async fn get_service(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<ServiceRecord>, AppError> {
    let record = with_timeout(&state, state.services.get_service(id)).await?;
    Ok(Json(record))
}

/// PUT /api/v1/services/:id: validate and replace the whole definition
pub async fn update_service(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateServiceRequest>,
) -> Result<Json<ServiceRecord>, AppError> {
    let current = with_timeout(&state, state.services.get_service(id)).await?;
    let mut editor = ServiceEditor::edit(&current);
    editor.replace_draft(payload.draft);
    let def = editor
        .submit(&state.config.validation_policy())
        .map_err(|e| reject(&state, "Update service", e))?;

    let record = with_timeout(
        &state,
        state
            .services
            .update_service(id, def, payload.expected_version),
    )
    .await?;
    tracing::info!(id, version = record.version, "service updated");
    state
        .notifier
        .publish(Notice::service_updated(&record.definition.name));

    Ok(Json(record))
}

/// DELETE /api/v1/services/:id?confirm=true
pub async fn delete_service(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Query(params): Query<ConfirmParams>,
) -> Result<Json<serde_json::Value>, AppError> {
    if !params.confirm {
        let record = with_timeout(&state, state.services.get_service(id)).await?;
        return Err(AppError::ConfirmationRequired {
            prompt: format!(
                "Delete service '{}'? This action cannot be undone.",
                record.definition.name
            ),
        });
    }

    let removed = with_timeout(&state, state.services.delete_service(id)).await?;
    tracing::info!(id, "service deleted");
    state
        .notifier
        .publish(Notice::service_deleted(&removed.definition.name));

    Ok(Json(json!({ "id": id, "deleted": true })))
}

/// POST /api/v1/services/validate: check a draft without committing
pub async fn validate_service(
    State(state): State<Arc<AppState>>,
    Json(draft): Json<ServiceDraft>,
) -> Result<impl IntoResponse, AppError> {
    let def = ServiceEditor::from_draft(draft).submit(&state.config.validation_policy())?;
    Ok(Json(def))
}

/// POST /api/v1/services/endpoint: derive `/api/{category}/{name}`
pub async fn derive_endpoint(Json(req): Json<EndpointRequest>) -> Json<serde_json::Value> {
    Json(json!({ "endpoint": editor::derive_endpoint(&req.category, &req.name) }))
}

/// POST /api/v1/services/:id/access: would a caller with these roles be admitted?
pub async fn check_access(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(req): Json<AccessRequest>,
) -> Result<Json<AccessDecision>, AppError> {
    let record = with_timeout(&state, state.services.get_service(id)).await?;
    Ok(Json(access::evaluate(&record.definition, &req.roles)))
}

/// POST /api/v1/services/:id/test: build the request a client would send
pub async fn prepare_test(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(input): Json<TestInput>,
) -> Result<Json<TestResponse>, AppError> {
    let record = with_timeout(&state, state.services.get_service(id)).await?;
    let base_url = state.config.test_base_url()?;
    let request = PreparedRequest::build(&record.definition, &input, &base_url)?;

    Ok(Json(TestResponse {
        request,
        response_filename: response_filename(&record.definition.name),
    }))
}

// ── Notice Stream (SSE) ──────────────────────────────────────

/// GET /api/v1/notifications/stream: Server-Sent Events of notices
pub async fn stream_notices(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let stream = BroadcastStream::new(state.notifier.subscribe()).filter_map(|msg| async move {
        match msg {
            Ok(notice) => Event::default().event("notice").json_data(&notice).ok().map(Ok),
            Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "notice stream lagged");
                None
            }
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}
