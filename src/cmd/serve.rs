//! `sitegen serve`

use anyhow::Result;
use sitegen::config::Settings;
use sitegen::server::{ServerConfig, build_state, start_server};

pub async fn cmd_serve(
    mut settings: Settings,
    host: Option<String>,
    port: Option<u16>,
    dev: bool,
) -> Result<()> {
    if let Some(host) = host {
        settings.server.host = host;
    }
    if let Some(port) = port {
        settings.server.port = port;
    }
    settings.server.dev_mode |= dev;

    for warning in settings.validate() {
        tracing::warn!("{}", warning);
    }

    let state = build_state(&settings);
    start_server(ServerConfig::from_settings(&settings), state).await
}
