//! HTTP API for submitting and polling generation jobs.

pub mod api;
mod app;

pub use api::{AppState, SharedState, api_router};
pub use app::{ServerConfig, build_router, build_state, start_server};
