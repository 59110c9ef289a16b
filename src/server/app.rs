use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{Router, http::HeaderValue};
use tower_http::cors::{Any, CorsLayer};

use super::api::{self, AppState};
use crate::agent::ClaudeCliSession;
use crate::config::Settings;
use crate::jobs::JobStore;
use crate::prefill::PrefillClient;
use crate::workflow::{WorkflowConfig, WorkflowOrchestrator};

/// Configuration for the HTTP server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub dev_mode: bool,
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            dev_mode: false,
            cors_origins: Vec::new(),
        }
    }
}

impl ServerConfig {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            host: settings.server.host.clone(),
            port: settings.server.port,
            dev_mode: settings.server.dev_mode,
            cors_origins: settings.server.cors_origins.clone(),
        }
    }

    /// Permissive in dev mode, the configured origin list otherwise, or none.
    fn cors_layer(&self) -> Option<CorsLayer> {
        if self.dev_mode {
            return Some(CorsLayer::permissive());
        }
        let origins: Vec<HeaderValue> = self
            .cors_origins
            .iter()
            .filter_map(|origin| match HeaderValue::from_str(origin) {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!(origin = %origin, "ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        if origins.is_empty() {
            return None;
        }
        Some(
            CorsLayer::new()
                .allow_origin(origins)
                .allow_methods(Any)
                .allow_headers(Any),
        )
    }
}

/// Build state backed by the real Claude CLI from resolved settings.
pub fn build_state(settings: &Settings) -> Arc<AppState> {
    let session = ClaudeCliSession::new(
        settings.agent.claude_cmd.clone(),
        Some(settings.agent.model.clone()),
    );
    let orchestrator = WorkflowOrchestrator::new(
        Arc::new(session),
        JobStore::new(),
        WorkflowConfig::from_settings(settings),
    );
    Arc::new(AppState {
        orchestrator,
        prefill: PrefillClient::new(
            settings.credentials.anthropic_api_key.clone(),
            settings.agent.model.clone(),
        ),
        credentials: settings.credentials.clone(),
    })
}

pub fn build_router(state: Arc<AppState>, config: &ServerConfig) -> Router {
    let app = api::api_router().with_state(state);
    match config.cors_layer() {
        Some(cors) => app.layer(cors),
        None => app,
    }
}

/// Serve until Ctrl+C.
pub async fn start_server(config: ServerConfig, state: Arc<AppState>) -> Result<()> {
    let app = build_router(state, &config);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    let local_addr = listener.local_addr()?;
    tracing::info!(addr = %local_addr, dev_mode = config.dev_mode, "server listening");
    println!("sitegen API running at http://{}", local_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    println!("Server shut down gracefully.");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    println!("\nShutting down...");
}
