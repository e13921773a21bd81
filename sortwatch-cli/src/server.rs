// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! HTTP front end for sortwatch.
//!
//! Routes `POST /sort` to the benchmark orchestrator, serves the persisted
//! telemetry collections, and exposes the item store. Every request, matched
//! or not, is recorded by the telemetry middleware once its response is known.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Bytes,
    extract::{MatchedPath, Query, Request, State},
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;
use tower_http::trace::TraceLayer;

use sortwatch_core::{
    bearer_token, parse_sort_request, BenchmarkOrchestrator, BenchmarkReport, Config, HostSampler,
    InputError, Item, MemoryStore, NewItem, RecordStore, SortwatchResult, StaticTokens,
    TelemetryError, TelemetryRecorder, TelemetryResult, TokenAuthenticator,
};

use crate::metrics;

/// Shared handles, built once at startup.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: BenchmarkOrchestrator,
    pub telemetry: TelemetryRecorder,
    pub auth: Arc<dyn TokenAuthenticator>,
    pub store: Arc<dyn RecordStore>,
}

impl AppState {
    /// Build the shared handles from validated configuration.
    ///
    /// Opens both telemetry collections and seeds the in-memory item store.
    pub fn from_config(config: &Config) -> SortwatchResult<Self> {
        let sampler = HostSampler::from_strategy(
            config.sampler.strategy,
            config.sampler.command.as_deref(),
        );
        tracing::info!(probes = ?sampler.probe_names(), "Host sampler ready");

        let telemetry = TelemetryRecorder::open(
            &config.telemetry.data_dir,
            &config.telemetry.request_log,
            &config.telemetry.host_log,
            sampler.clone(),
        )?;

        let store = MemoryStore::new();
        for seed in &config.items {
            store.create(NewItem {
                name: seed.name.clone(),
                value: seed.value.clone(),
            });
        }

        Ok(Self {
            orchestrator: BenchmarkOrchestrator::new(sampler),
            telemetry,
            auth: Arc::new(StaticTokens::from_entries(&config.tokens)),
            store: Arc::new(store),
        })
    }
}

/// Errors a handler can answer with. Rendered as `{"error": "<message>"}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    InvalidInput(#[from] InputError),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(&'static str),

    #[error("Internal server error")]
    Internal,
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidInput(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        } else {
            tracing::debug!(status = status.as_u16(), error = %self, "Request rejected");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/sort", post(sort_handler))
        .route("/items", get(list_items))
        .route("/item", get(get_item))
        .route("/item/last", get(last_item))
        .route("/items/create", post(create_item))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_bearer));

    Router::new()
        .route("/metrics", get(request_metrics))
        .route("/docker_metrics", get(host_stats))
        .merge(protected)
        .fallback(not_found)
        .layer(middleware::from_fn_with_state(state.clone(), record_telemetry))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind `addr` and serve until `shutdown` resolves.
pub async fn serve<F>(
    addr: SocketAddr,
    state: AppState,
    shutdown: F,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Runs the rest of the pipeline, then records the request.
///
/// Both happen on a spawned task, so a client that disconnects mid-request
/// cannot cancel the handler or lose its telemetry. The response is held
/// until both records are acknowledged.
async fn record_telemetry(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let endpoint = req.uri().path().to_string();
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());
    let method = req.method().to_string();
    let started = Instant::now();

    let pipeline = tokio::spawn(async move {
        let response = next.run(req).await;
        let elapsed = started.elapsed();
        let status = response.status().as_u16();

        let outcome = state
            .telemetry
            .record_request(&endpoint, &method, status, elapsed)
            .await;
        metrics::observe_request(&route, status, outcome);

        response
    });

    match pipeline.await {
        Ok(response) => response,
        Err(e) => {
            tracing::error!(error = %e, "Request pipeline aborted");
            ApiError::Internal.into_response()
        }
    }
}

async fn require_bearer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let principal = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(bearer_token)
        .and_then(|token| state.auth.authenticate(token))
        .ok_or(ApiError::Unauthorized)?;

    tracing::debug!(principal = %principal, "Authenticated request");
    req.extensions_mut().insert(principal);
    Ok(next.run(req).await)
}

async fn sort_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<BenchmarkReport>, ApiError> {
    let input = parse_sort_request(&body)?;
    tracing::debug!(len = input.len(), "Running benchmark");

    let orchestrator = state.orchestrator.clone();
    let report = tokio::task::spawn_blocking(move || orchestrator.run(&input))
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Benchmark task failed");
            ApiError::Internal
        })?;

    metrics::observe_sorts(&report);
    Ok(Json(report))
}

async fn request_metrics(State(state): State<AppState>) -> Result<Json<Vec<Value>>, ApiError> {
    read_collection(
        move || state.telemetry.request_metrics(),
        "No performance metrics available",
    )
    .await
}

async fn host_stats(State(state): State<AppState>) -> Result<Json<Vec<Value>>, ApiError> {
    read_collection(
        move || state.telemetry.host_stats(),
        "No docker metrics available",
    )
    .await
}

async fn read_collection<F>(read: F, missing: &'static str) -> Result<Json<Vec<Value>>, ApiError>
where
    F: FnOnce() -> TelemetryResult<Option<Vec<Value>>> + Send + 'static,
{
    match tokio::task::spawn_blocking(read).await {
        Ok(Ok(Some(entries))) => Ok(Json(entries)),
        Ok(Ok(None)) => Err(ApiError::NotFound(missing)),
        // The next append moves a malformed collection aside and starts over.
        Ok(Err(e @ TelemetryError::Malformed { .. })) => {
            tracing::warn!(error = %e, "Telemetry collection unreadable, reporting as empty");
            Err(ApiError::NotFound(missing))
        }
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "Failed to read telemetry collection");
            Err(ApiError::Internal)
        }
        Err(e) => {
            tracing::error!(error = %e, "Telemetry read task failed");
            Err(ApiError::Internal)
        }
    }
}

#[derive(Debug, Deserialize)]
struct ItemQuery {
    id: Option<String>,
}

async fn list_items(State(state): State<AppState>) -> Json<Vec<Item>> {
    Json(state.store.list())
}

async fn get_item(
    State(state): State<AppState>,
    Query(query): Query<ItemQuery>,
) -> Result<Json<Item>, ApiError> {
    let id = query
        .id
        .as_deref()
        .and_then(|raw| raw.trim().parse::<u64>().ok())
        .ok_or_else(|| ApiError::BadRequest("Invalid ID".to_string()))?;

    state
        .store
        .get(id)
        .map(Json)
        .ok_or(ApiError::NotFound("Item not found"))
}

async fn last_item(State(state): State<AppState>) -> Result<Json<Item>, ApiError> {
    state
        .store
        .last()
        .map(Json)
        .ok_or(ApiError::NotFound("Item not found"))
}

async fn create_item(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let item: NewItem = serde_json::from_slice(&body)
        .map_err(|e| ApiError::BadRequest(format!("Invalid item: {}", e)))?;
    if item.name.trim().is_empty() {
        return Err(ApiError::BadRequest("Item name must not be empty".to_string()));
    }

    let created = state.store.create(item);
    tracing::info!(id = created.id, name = %created.name, "Item created");

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Item created", "id": created.id })),
    ))
}

async fn not_found() -> ApiError {
    ApiError::NotFound("Not Found")
}
