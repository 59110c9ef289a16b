//! Drives one generation job from an empty directory to a deployed site.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::Datelike;
use tokio::task::JoinHandle;

use super::phase::{PhaseRunner, PhaseSpec, ProgressBand};
use super::validation::ValidationLoop;
use crate::agent::{AgentSession, ToolGrant};
use crate::business::{BusinessRecord, InvalidBusinessRecord, fallback_site_url};
use crate::config::{Credentials, GithubSettings, Settings};
use crate::errors::WorkflowError;
use crate::jobs::{JobStore, JobUpdate};
use crate::prompts::{self, PromptContext};
use crate::signals::UrlKind;

pub const SETUP_BAND: ProgressBand = ProgressBand::new(0, 8);
pub const COMPONENTS_BAND: ProgressBand = ProgressBand::new(8, 16);
pub const SECTIONS_BAND: ProgressBand = ProgressBand::new(16, 24);
pub const PAGES_BAND: ProgressBand = ProgressBand::new(24, 32);
pub const CONTENT_BAND: ProgressBand = ProgressBand::new(32, 40);
pub const VALIDATION_BAND: ProgressBand = ProgressBand::new(40, 58);
pub const PUBLISH_BAND: ProgressBand = ProgressBand::new(58, 75);
pub const DEPLOY_BAND: ProgressBand = ProgressBand::new(75, 95);

pub const COMPLETED_MESSAGE: &str = "Site generated and deployed successfully";

type PromptFn = fn(&PromptContext<'_>) -> String;

const GENERATION_PHASES: [(&str, ProgressBand, PromptFn); 5] = [
    ("Setup", SETUP_BAND, prompts::setup::prompt),
    ("Components", COMPONENTS_BAND, prompts::components::prompt),
    ("Sections", SECTIONS_BAND, prompts::sections::prompt),
    ("Pages & Layout", PAGES_BAND, prompts::pages::prompt),
    ("SEO & Content", CONTENT_BAND, prompts::content::prompt),
];

/// The subset of [`Settings`] a job needs.
#[derive(Debug, Clone)]
pub struct WorkflowConfig {
    pub output_dir: PathBuf,
    pub max_validation_attempts: u32,
    pub agent_timeout: Duration,
    pub github: GithubSettings,
    pub credentials: Credentials,
}

impl WorkflowConfig {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            output_dir: settings.workflow.output_dir.clone(),
            max_validation_attempts: settings.max_validation_attempts(),
            agent_timeout: settings.agent.timeout(),
            github: settings.github.clone(),
            credentials: settings.credentials.clone(),
        }
    }
}

/// URLs of a finished job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deployment {
    pub repo_url: String,
    pub site_url: String,
}

/// Runs generation jobs, one tokio task each, reporting into a shared
/// [`JobStore`].
#[derive(Clone)]
pub struct WorkflowOrchestrator {
    session: Arc<dyn AgentSession>,
    store: JobStore,
    config: Arc<WorkflowConfig>,
}

impl WorkflowOrchestrator {
    pub fn new(session: Arc<dyn AgentSession>, store: JobStore, config: WorkflowConfig) -> Self {
        Self {
            session,
            store,
            config: Arc::new(config),
        }
    }

    pub fn store(&self) -> &JobStore {
        &self.store
    }

    pub fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    pub fn site_dir(&self, site_slug: &str) -> PathBuf {
        self.config.output_dir.join(site_slug)
    }

    /// Validate the record, create a pending job and start it in the
    /// background. Returns the job id and the task handle.
    pub fn submit(
        &self,
        business: BusinessRecord,
    ) -> Result<(String, JoinHandle<()>), InvalidBusinessRecord> {
        business.validate()?;
        let site_slug = business.site_slug();
        let job_id = self.store.create(&site_slug);
        tracing::info!(job_id = %job_id, site_slug = %site_slug, "job accepted");
        let handle = self.start(job_id.clone(), business, site_slug);
        Ok((job_id, handle))
    }

    fn start(&self, job_id: String, business: BusinessRecord, site_slug: String) -> JoinHandle<()> {
        let this = self.clone();
        tokio::spawn(async move { this.run(&job_id, &business, &site_slug).await })
    }

    /// Run a job to a terminal status. Failures end up on the job, never here.
    async fn run(&self, job_id: &str, business: &BusinessRecord, site_slug: &str) {
        match self.execute(job_id, business, site_slug).await {
            Ok(deployment) => {
                tracing::info!(
                    job_id,
                    repo_url = %deployment.repo_url,
                    site_url = %deployment.site_url,
                    "job completed"
                );
                self.store.update(
                    job_id,
                    JobUpdate::completed(COMPLETED_MESSAGE)
                        .with_repo_url(deployment.repo_url)
                        .with_site_url(deployment.site_url),
                );
            }
            Err(e) => {
                let detail = error_detail(&e);
                tracing::error!(job_id, error = %detail, "job failed");
                self.store.update(
                    job_id,
                    JobUpdate::failed(format!("Generation failed: {}", e.headline()), detail),
                );
            }
        }
    }

    async fn execute(
        &self,
        job_id: &str,
        business: &BusinessRecord,
        site_slug: &str,
    ) -> Result<Deployment, WorkflowError> {
        let site_dir = self.site_dir(site_slug);
        tokio::fs::create_dir_all(&site_dir)
            .await
            .map_err(|source| WorkflowError::Workspace {
                path: site_dir.clone(),
                source,
            })?;

        let ctx = PromptContext::new(business, site_slug, &site_dir, chrono::Local::now().year());
        let runner = PhaseRunner::new(
            self.session.as_ref(),
            &self.store,
            job_id,
            &site_dir,
            self.config.agent_timeout,
        );

        for (label, band, prompt) in GENERATION_PHASES {
            runner
                .run(PhaseSpec::new(label, prompt(&ctx), ToolGrant::Generation, band))
                .await?;
        }

        let outcome = ValidationLoop::new(self.config.max_validation_attempts, VALIDATION_BAND)
            .run(&runner, &site_dir)
            .await?;
        tracing::info!(
            job_id,
            validations = outcome.validations,
            fixes = outcome.fixes,
            "validation done"
        );

        let publish = self.with_github_token(PhaseSpec::new(
            "GitHub Publish",
            prompts::publish::prompt(&ctx, &self.config.github),
            ToolGrant::Release,
            PUBLISH_BAND,
        ));
        let repo_url = runner
            .run(publish.expecting(UrlKind::Repository))
            .await?
            .signals
            .repo_url
            .ok_or(WorkflowError::PublishFailed)?;

        let deploy = self.with_vercel_token(PhaseSpec::new(
            "Vercel Deploy",
            prompts::deploy::prompt(&ctx, &repo_url),
            ToolGrant::Release,
            DEPLOY_BAND,
        ));
        let site_url = match runner
            .run(deploy.expecting(UrlKind::Deployment))
            .await?
            .signals
            .site_url
        {
            Some(url) => url,
            None => {
                let fallback = fallback_site_url(site_slug);
                tracing::warn!(
                    job_id,
                    fallback = %fallback,
                    "deployment reported no URL; using the default project URL"
                );
                fallback
            }
        };

        Ok(Deployment { repo_url, site_url })
    }

    fn with_github_token(&self, spec: PhaseSpec) -> PhaseSpec {
        match &self.config.credentials.github_token {
            Some(token) => spec
                .with_env("GH_TOKEN", token.as_str())
                .with_env("GITHUB_TOKEN", token.as_str()),
            None => spec,
        }
    }

    fn with_vercel_token(&self, spec: PhaseSpec) -> PhaseSpec {
        match &self.config.credentials.vercel_token {
            Some(token) => spec.with_env("VERCEL_TOKEN", token.as_str()),
            None => spec,
        }
    }
}

/// Error message followed by its source chain.
fn error_detail(err: &WorkflowError) -> String {
    let mut detail = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        let cause_text = cause.to_string();
        if !detail.contains(&cause_text) {
            detail.push_str(": ");
            detail.push_str(&cause_text);
        }
        source = cause.source();
    }
    detail
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::testing::{Script, ScriptedSession};
    use crate::business::tests::sample_record;
    use crate::jobs::JobStatus;

    fn config(output_dir: PathBuf) -> WorkflowConfig {
        WorkflowConfig {
            output_dir,
            max_validation_attempts: 3,
            agent_timeout: Duration::from_secs(5),
            github: GithubSettings::default(),
            credentials: Credentials {
                anthropic_api_key: None,
                github_token: Some("ghp_test".into()),
                vercel_token: Some("vercel_test".into()),
            },
        }
    }

    fn generation_ok() -> Vec<Script> {
        (0..5).map(|_| Script::say(&["files written"])).collect()
    }

    fn happy_scripts() -> Vec<Script> {
        let mut scripts = generation_ok();
        scripts.push(Script::say(&["Build ok", "SAFE TO DEPLOY"]));
        scripts.push(Script::say(&[
            "pushing",
            r#"{"success": true, "github_url": "https://github.com/acme/plomberie-dupont-luxembourg"}"#,
        ]));
        scripts.push(Script::say(&[
            "Production: https://plomberie-dupont-luxembourg.vercel.app",
        ]));
        scripts
    }

    struct Harness {
        store: JobStore,
        session: Arc<ScriptedSession<u8>>,
        orchestrator: WorkflowOrchestrator,
        _dir: tempfile::TempDir,
    }

    fn harness(scripts: Vec<Script>) -> Harness {
        let dir = tempfile::tempdir().unwrap();
        let store = JobStore::new();
        let probe_store = store.clone();
        let session = Arc::new(ScriptedSession::with_probe(scripts, move || {
            probe_store.list().first().map(|j| j.progress).unwrap_or(0)
        }));
        let orchestrator =
            WorkflowOrchestrator::new(session.clone(), store.clone(), config(dir.path().to_path_buf()));
        Harness {
            store,
            session,
            orchestrator,
            _dir: dir,
        }
    }

    #[tokio::test]
    async fn test_happy_path_completes_with_urls() {
        let h = harness(happy_scripts());
        let (job_id, handle) = h.orchestrator.submit(sample_record()).unwrap();
        handle.await.unwrap();

        let job = h.store.get(&job_id).unwrap();
        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.progress, 100);
        assert_eq!(job.message, COMPLETED_MESSAGE);
        assert!(job.site_slug.contains("plomberie-dupont-luxembourg"));
        assert_eq!(
            job.repo_url.as_deref(),
            Some("https://github.com/acme/plomberie-dupont-luxembourg")
        );
        assert_eq!(
            job.site_url.as_deref(),
            Some("https://plomberie-dupont-luxembourg.vercel.app")
        );
        assert!(h.orchestrator.site_dir(&job.site_slug).is_dir());

        let progress: Vec<u8> = h.session.recorded().iter().map(|(_, p)| *p).collect();
        assert_eq!(progress, vec![0, 8, 16, 24, 32, 40, 58, 75]);
    }

    #[tokio::test]
    async fn test_tokens_only_reach_release_phases() {
        let h = harness(happy_scripts());
        let (_, handle) = h.orchestrator.submit(sample_record()).unwrap();
        handle.await.unwrap();

        let recorded = h.session.recorded();
        for (request, _) in &recorded[..6] {
            assert!(request.env.is_empty());
        }
        let publish = &recorded[6].0;
        assert_eq!(publish.grant, ToolGrant::Release);
        assert_eq!(publish.env.get("GH_TOKEN").map(String::as_str), Some("ghp_test"));
        assert_eq!(publish.env.get("GITHUB_TOKEN").map(String::as_str), Some("ghp_test"));
        assert!(!publish.env.contains_key("VERCEL_TOKEN"));
        let deploy = &recorded[7].0;
        assert_eq!(deploy.env.get("VERCEL_TOKEN").map(String::as_str), Some("vercel_test"));
        assert!(!deploy.env.contains_key("GH_TOKEN"));
        assert!(deploy.prompt.contains("acme/plomberie-dupont-luxembourg"));
    }

    #[tokio::test]
    async fn test_publish_without_url_fails_and_skips_deploy() {
        let mut scripts = generation_ok();
        scripts.push(Script::say(&["PASSED"]));
        scripts.push(Script::say(&["gh: authentication required"]));
        let h = harness(scripts);
        let (job_id, handle) = h.orchestrator.submit(sample_record()).unwrap();
        handle.await.unwrap();

        let job = h.store.get(&job_id).unwrap();
        assert_eq!(job.status, JobStatus::Failed);
        assert_eq!(job.progress, 0);
        assert!(job.message.starts_with("Generation failed: "));
        assert!(job.message.contains("GitHub"));
        assert!(job.site_url.is_none());
        assert_eq!(h.session.request_count(), 7);
    }

    #[tokio::test]
    async fn test_deploy_without_url_falls_back() {
        let mut scripts = generation_ok();
        scripts.push(Script::say(&["SAFE TO DEPLOY"]));
        scripts.push(Script::say(&["https://github.com/acme/site"]));
        scripts.push(Script::say(&["deployment queued"]));
        let h = harness(scripts);
        let (job_id, handle) = h.orchestrator.submit(sample_record()).unwrap();
        handle.await.unwrap();

        let job = h.store.get(&job_id).unwrap();
        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(
            job.site_url,
            Some(format!("https://{}.vercel.app", job.site_slug))
        );
    }

    #[tokio::test]
    async fn test_validation_exhausted_fails_job_with_report() {
        let mut scripts = generation_ok();
        for _ in 0..2 {
            scripts.push(Script::say(&["CRITICAL: npm run build fails"]));
            scripts.push(Script::say(&["tried a fix"]));
        }
        scripts.push(Script::say(&["CRITICAL: still broken"]));
        let h = harness(scripts);
        let (job_id, handle) = h.orchestrator.submit(sample_record()).unwrap();
        handle.await.unwrap();

        let job = h.store.get(&job_id).unwrap();
        assert_eq!(job.status, JobStatus::Failed);
        assert_eq!(job.message, "Generation failed: Validation failed after 3 attempts");
        assert!(job.error.unwrap().contains("CRITICAL: still broken"));
        assert_eq!(h.session.request_count(), 10);
    }

    #[tokio::test]
    async fn test_missing_runtime_fails_job() {
        let h = harness(vec![Script::Missing]);
        let (job_id, handle) = h.orchestrator.submit(sample_record()).unwrap();
        handle.await.unwrap();

        let job = h.store.get(&job_id).unwrap();
        assert_eq!(job.status, JobStatus::Failed);
        assert!(job.message.contains("Setup failed"));
        assert!(job.error.unwrap().contains("not found"));
        assert_eq!(h.session.request_count(), 1);
    }

    #[tokio::test]
    async fn test_invalid_record_is_rejected_before_job_creation() {
        let h = harness(vec![]);
        let mut record = sample_record();
        record.email = "not-an-email".into();
        assert!(h.orchestrator.submit(record).is_err());
        assert!(h.store.is_empty());
    }

    #[tokio::test]
    async fn test_record_without_slug_never_reaches_agent() {
        let h = harness(happy_scripts());
        let mut record = sample_record();
        record.name = "日本料理".into();
        record.city = "東京".into();
        assert!(h.orchestrator.submit(record).is_err());
        assert!(h.store.is_empty());
        assert_eq!(h.session.request_count(), 0);
    }

    #[tokio::test]
    async fn test_each_job_runs_in_its_own_directory() {
        let h = harness(vec![]);
        let mut other = sample_record();
        other.name = "Garage Muller".into();
        other.city = "Esch-sur-Alzette".into();

        let (first, first_handle) = h.orchestrator.submit(sample_record()).unwrap();
        let (second, second_handle) = h.orchestrator.submit(other).unwrap();
        first_handle.await.unwrap();
        second_handle.await.unwrap();

        let output_dir = &h.orchestrator.config().output_dir;
        let first = h.store.get(&first).unwrap();
        let second = h.store.get(&second).unwrap();
        assert_ne!(first.site_slug, second.site_slug);
        for job in [&first, &second] {
            assert!(!job.site_slug.is_empty());
            let dir = h.orchestrator.site_dir(&job.site_slug);
            assert_ne!(&dir, output_dir);
            assert_eq!(dir.parent(), Some(output_dir.as_path()));
        }

        let cwds: std::collections::BTreeSet<PathBuf> = h
            .session
            .recorded()
            .into_iter()
            .map(|(request, _)| request.cwd)
            .collect();
        assert_eq!(cwds.len(), 2);
        assert!(cwds.iter().all(|cwd| cwd.parent() == Some(output_dir.as_path())));
    }

    #[test]
    fn test_error_detail_includes_source() {
        let err = WorkflowError::Agent {
            phase: "Setup".into(),
            source: crate::errors::AgentError::ProcessFailed {
                exit_code: 1,
                stderr: "quota exceeded".into(),
            },
        };
        let detail = error_detail(&err);
        assert!(detail.starts_with("Setup failed"));
        assert!(detail.contains("quota exceeded"));
    }
}
