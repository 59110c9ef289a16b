//! `sitegen generate <business.json>` runs one job in-process.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use sitegen::agent::ClaudeCliSession;
use sitegen::business::BusinessRecord;
use sitegen::config::Settings;
use sitegen::jobs::{JobStatus, JobStore};
use sitegen::ui::JobProgressUI;
use sitegen::workflow::{WorkflowConfig, WorkflowOrchestrator};

const POLL_INTERVAL: Duration = Duration::from_millis(250);

pub async fn cmd_generate(settings: &Settings, business_path: &Path) -> Result<()> {
    let content = std::fs::read_to_string(business_path)
        .with_context(|| format!("Failed to read {}", business_path.display()))?;
    let business: BusinessRecord = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse {}", business_path.display()))?;

    let session = ClaudeCliSession::new(
        settings.agent.claude_cmd.clone(),
        Some(settings.agent.model.clone()),
    );
    let store = JobStore::new();
    let orchestrator = WorkflowOrchestrator::new(
        Arc::new(session),
        store.clone(),
        WorkflowConfig::from_settings(settings),
    );

    let (job_id, mut handle) = orchestrator.submit(business)?;
    let job = store
        .get(&job_id)
        .context("Job disappeared right after creation")?;
    let ui = JobProgressUI::new(&job.site_slug, &orchestrator.site_dir(&job.site_slug));

    loop {
        tokio::select! {
            joined = &mut handle => {
                joined.context("Generation task panicked")?;
                break;
            }
            _ = tokio::time::sleep(POLL_INTERVAL) => {
                if let Some(job) = store.get(&job_id) {
                    ui.update(&job);
                }
            }
        }
    }

    let job = store.get(&job_id).context("Job missing after completion")?;
    ui.finish(&job);
    if job.status != JobStatus::Completed {
        bail!("{}", job.message);
    }
    Ok(())
}
