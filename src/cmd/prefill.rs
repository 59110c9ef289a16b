//! `sitegen prefill <description>`

use anyhow::Result;
use sitegen::config::Settings;
use sitegen::prefill::{PrefillClient, PrefillResponse, check_description};

pub async fn cmd_prefill(settings: &Settings, description: &str) -> Result<()> {
    check_description(description)?;
    let client = PrefillClient::new(
        settings.credentials.anthropic_api_key.clone(),
        settings.agent.model.clone(),
    );
    let data = client.extract(description).await?;
    println!(
        "{}",
        serde_json::to_string_pretty(&PrefillResponse::ok(data))?
    );
    Ok(())
}
