use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};
use serde::{Deserialize, Serialize};

use crate::business::BusinessRecord;
use crate::config::Credentials;
use crate::jobs::{Job, JobStatus, JobStore};
use crate::prefill::{PrefillClient, PrefillResponse, check_description};
use crate::workflow::WorkflowOrchestrator;

// ── Shared application state ──────────────────────────────────────────

pub struct AppState {
    pub orchestrator: WorkflowOrchestrator,
    pub prefill: PrefillClient,
    pub credentials: Credentials,
}

impl AppState {
    pub fn store(&self) -> &JobStore {
        self.orchestrator.store()
    }
}

pub type SharedState = Arc<AppState>;

// ── Request / response payloads ───────────────────────────────────────

#[derive(Deserialize)]
pub struct PrefillRequest {
    pub description: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct JobAccepted {
    pub job_id: String,
    pub status: JobStatus,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct JobList {
    pub jobs: Vec<Job>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Health {
    pub status: String,
    pub version: String,
    pub anthropic_api_configured: bool,
    pub github_token_configured: bool,
    pub vercel_token_configured: bool,
}

// ── Error handling ────────────────────────────────────────────────────

pub enum ApiError {
    NotFound(String),
    BadRequest(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
        };
        (status, Json(serde_json::json!({"error": message}))).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

// ── Router ────────────────────────────────────────────────────────────

pub fn api_router() -> Router<SharedState> {
    Router::new()
        .route("/", get(root))
        .route("/api/generate", post(generate_site))
        .route("/api/status/{job_id}", get(job_status))
        .route("/api/jobs", get(list_jobs))
        .route("/api/jobs/{job_id}", delete(delete_job))
        .route("/api/health", get(health_check))
        .route("/api/prefill", post(prefill_form))
}

// ── Handlers ──────────────────────────────────────────────────────────

async fn root() -> impl IntoResponse {
    Json(serde_json::json!({
        "service": "sitegen",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "generate": "POST /api/generate",
            "status": "GET /api/status/{job_id}",
            "jobs": "GET /api/jobs",
            "delete": "DELETE /api/jobs/{job_id}",
            "health": "GET /api/health",
            "prefill": "POST /api/prefill"
        }
    }))
}

async fn generate_site(
    State(state): State<SharedState>,
    payload: Result<Json<BusinessRecord>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(business) = payload?;
    let (job_id, _handle) = state
        .orchestrator
        .submit(business)
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;
    Ok((
        StatusCode::ACCEPTED,
        Json(JobAccepted {
            job_id,
            status: JobStatus::Pending,
            message: "Site generation started".to_string(),
        }),
    ))
}

async fn job_status(
    State(state): State<SharedState>,
    Path(job_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    match state.store().get(&job_id) {
        Some(job) => Ok(Json(job)),
        None => Err(ApiError::NotFound(format!("Job {} not found", job_id))),
    }
}

async fn list_jobs(State(state): State<SharedState>) -> impl IntoResponse {
    Json(JobList {
        jobs: state.store().list(),
    })
}

async fn delete_job(
    State(state): State<SharedState>,
    Path(job_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    match state.store().delete(&job_id) {
        true => Ok(StatusCode::NO_CONTENT),
        false => Err(ApiError::NotFound(format!("Job {} not found", job_id))),
    }
}

async fn health_check(State(state): State<SharedState>) -> impl IntoResponse {
    let credentials = &state.credentials;
    Json(Health {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        anthropic_api_configured: credentials.anthropic_api_key.is_some(),
        github_token_configured: credentials.github_token.is_some(),
        vercel_token_configured: credentials.vercel_token.is_some(),
    })
}

async fn prefill_form(
    State(state): State<SharedState>,
    payload: Result<Json<PrefillRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(req) = payload?;
    check_description(&req.description).map_err(|e| ApiError::BadRequest(e.to_string()))?;

    if !state.prefill.is_configured() {
        return Ok((
            StatusCode::SERVICE_UNAVAILABLE,
            Json(PrefillResponse::failed("ANTHROPIC_API_KEY is not set")),
        )
            .into_response());
    }

    match state.prefill.extract(&req.description).await {
        Ok(data) => Ok(Json(PrefillResponse::ok(data)).into_response()),
        Err(e) => {
            tracing::error!(error = %format!("{:#}", e), "prefill failed");
            Ok((
                StatusCode::BAD_GATEWAY,
                Json(PrefillResponse::failed(format!("{:#}", e))),
            )
                .into_response())
        }
    }
}
