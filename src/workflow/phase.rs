use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use futures::StreamExt;

use crate::agent::{AgentRequest, AgentSession, EventKind, ToolGrant};
use crate::errors::WorkflowError;
use crate::jobs::{JobStore, JobUpdate};
use crate::signals::{PhaseSignals, SignalScanner, UrlKind};
use crate::util::truncate_chars;

/// Slice of the 0-100 progress scale owned by one phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressBand {
    pub start: u8,
    pub end: u8,
}

impl ProgressBand {
    pub const fn new(start: u8, end: u8) -> Self {
        Self { start, end }
    }

    /// Part `index` (0-based) of `parts` equal sub-bands. Consecutive parts
    /// share their boundary, so walking them in order never goes backwards.
    pub fn split(&self, parts: u32, index: u32) -> ProgressBand {
        let parts = parts.max(1);
        let index = index.min(parts - 1);
        let span = u32::from(self.end.saturating_sub(self.start));
        let at = |i: u32| self.start + (span * i / parts) as u8;
        ProgressBand::new(at(index), at(index + 1))
    }
}

/// One agent session within a job.
#[derive(Debug, Clone)]
pub struct PhaseSpec {
    pub label: String,
    pub prompt: String,
    pub grant: ToolGrant,
    pub env: BTreeMap<String, String>,
    pub band: ProgressBand,
    /// URL kind recorded on the job as soon as it shows up.
    pub expect_url: Option<UrlKind>,
}

impl PhaseSpec {
    pub fn new(
        label: impl Into<String>,
        prompt: impl Into<String>,
        grant: ToolGrant,
        band: ProgressBand,
    ) -> Self {
        Self {
            label: label.into(),
            prompt: prompt.into(),
            grant,
            env: BTreeMap::new(),
            band,
            expect_url: None,
        }
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn expecting(mut self, kind: UrlKind) -> Self {
        self.expect_url = Some(kind);
        self
    }
}

/// What a finished phase produced.
#[derive(Debug, Clone, Default)]
pub struct PhaseResult {
    /// Text of every non-system event, one per line.
    pub report: String,
    pub signals: PhaseSignals,
    pub events: usize,
}

/// Runs phases of one job: opens a session, drains its events, and keeps the
/// job's progress in step. Never retries.
pub struct PhaseRunner<'a> {
    session: &'a dyn AgentSession,
    store: &'a JobStore,
    job_id: &'a str,
    cwd: &'a Path,
    timeout: Duration,
}

impl<'a> PhaseRunner<'a> {
    pub fn new(
        session: &'a dyn AgentSession,
        store: &'a JobStore,
        job_id: &'a str,
        cwd: &'a Path,
        timeout: Duration,
    ) -> Self {
        Self {
            session,
            store,
            job_id,
            cwd,
            timeout,
        }
    }

    pub fn job_id(&self) -> &str {
        self.job_id
    }

    pub fn advance(&self, progress: u8, message: impl Into<String>) {
        self.store
            .update(self.job_id, JobUpdate::processing(progress, message));
    }

    pub async fn run(&self, spec: PhaseSpec) -> Result<PhaseResult, WorkflowError> {
        tracing::info!(job_id = self.job_id, phase = %spec.label, "phase started");
        self.advance(spec.band.start, format!("{} in progress...", spec.label));

        let result = tokio::time::timeout(self.timeout, self.drain(&spec))
            .await
            .map_err(|_| WorkflowError::Timeout {
                phase: spec.label.clone(),
                after: self.timeout,
            })??;

        tracing::info!(
            job_id = self.job_id,
            phase = %spec.label,
            events = result.events,
            verdict = ?result.signals.verdict,
            "phase finished"
        );
        self.advance(spec.band.end, format!("{} completed", spec.label));
        Ok(result)
    }

    async fn drain(&self, spec: &PhaseSpec) -> Result<PhaseResult, WorkflowError> {
        let agent_error = |source| WorkflowError::Agent {
            phase: spec.label.clone(),
            source,
        };

        let mut request = AgentRequest::new(spec.prompt.clone(), spec.grant, self.cwd);
        request.env = spec.env.clone();
        let mut events = self.session.open(request).await.map_err(agent_error)?;

        let mut scanner = SignalScanner::new();
        let mut result = PhaseResult::default();
        while let Some(event) = events.next().await {
            let event = event.map_err(agent_error)?;
            result.events += 1;
            tracing::debug!(
                job_id = self.job_id,
                phase = %spec.label,
                kind = ?event.kind,
                "{}",
                truncate_chars(&event.text, 300)
            );
            if event.kind == EventKind::System {
                continue;
            }

            if !result.report.is_empty() {
                result.report.push('\n');
            }
            result.report.push_str(&event.text);

            let found = scanner.observe(&event.text);
            if let Some(kind) = spec.expect_url
                && found.contains(&kind)
            {
                self.record_url(spec, kind, scanner.signals());
            }
        }

        result.signals = scanner.finish();
        Ok(result)
    }

    fn record_url(&self, spec: &PhaseSpec, kind: UrlKind, signals: &PhaseSignals) {
        let Some(url) = signals.url(kind) else {
            return;
        };
        tracing::info!(job_id = self.job_id, phase = %spec.label, url, "URL reported");
        let update = JobUpdate::new(
            crate::jobs::JobStatus::Processing,
            format!("{}: {}", spec.label, url),
        );
        let update = match kind {
            UrlKind::Repository => update.with_repo_url(url),
            UrlKind::Deployment => update.with_site_url(url),
        };
        self.store.update(self.job_id, update);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::testing::{Script, ScriptedSession};
    use crate::errors::AgentError;
    use crate::jobs::JobStatus;

    #[test]
    fn test_split_band_is_contiguous() {
        let band = ProgressBand::new(40, 58);
        let parts: Vec<ProgressBand> = (0..6).map(|i| band.split(6, i)).collect();
        assert_eq!(parts[0].start, 40);
        assert_eq!(parts[5].end, 58);
        for pair in parts.windows(2) {
            assert_eq!(pair[0].end, pair[1].start);
            assert!(pair[0].start <= pair[0].end);
        }
    }

    #[test]
    fn test_split_single_part_is_whole_band() {
        assert_eq!(ProgressBand::new(58, 75).split(1, 0), ProgressBand::new(58, 75));
    }

    #[tokio::test]
    async fn test_run_moves_progress_across_band() {
        let store = JobStore::new();
        let job_id = store.create("site");
        let probe_store = store.clone();
        let probe_id = job_id.clone();
        let session = ScriptedSession::with_probe(
            vec![Script::say(&["writing files", "done"])],
            move || probe_store.get(&probe_id).map(|j| (j.progress, j.message)),
        );
        let dir = tempfile::tempdir().unwrap();
        let runner = PhaseRunner::new(&session, &store, &job_id, dir.path(), Duration::from_secs(5));

        let result = runner
            .run(PhaseSpec::new("Setup", "prompt", ToolGrant::Generation, ProgressBand::new(0, 8)))
            .await
            .unwrap();

        assert_eq!(result.events, 2);
        assert_eq!(result.report, "writing files\ndone");
        let (progress_at_open, message_at_open) = session.recorded()[0].1.clone().unwrap();
        assert_eq!(progress_at_open, 0);
        assert_eq!(message_at_open, "Setup in progress...");
        let job = store.get(&job_id).unwrap();
        assert_eq!(job.status, JobStatus::Processing);
        assert_eq!(job.progress, 8);
        assert_eq!(job.message, "Setup completed");
    }

    #[tokio::test]
    async fn test_run_passes_grant_env_and_cwd() {
        let store = JobStore::new();
        let job_id = store.create("site");
        let session = ScriptedSession::new(vec![]);
        let dir = tempfile::tempdir().unwrap();
        let runner = PhaseRunner::new(&session, &store, &job_id, dir.path(), Duration::from_secs(5));

        runner
            .run(
                PhaseSpec::new("Publish", "p", ToolGrant::Release, ProgressBand::new(58, 75))
                    .with_env("GH_TOKEN", "t"),
            )
            .await
            .unwrap();

        let (request, _) = &session.recorded()[0];
        assert_eq!(request.grant, ToolGrant::Release);
        assert_eq!(request.env.get("GH_TOKEN").map(String::as_str), Some("t"));
        assert_eq!(request.cwd, dir.path());
    }

    #[tokio::test]
    async fn test_expected_url_recorded_once_first_wins() {
        let store = JobStore::new();
        let job_id = store.create("site");
        let session = ScriptedSession::new(vec![Script::say(&[
            "created https://github.com/acme/first",
            "mirror at https://github.com/acme/second",
        ])]);
        let dir = tempfile::tempdir().unwrap();
        let runner = PhaseRunner::new(&session, &store, &job_id, dir.path(), Duration::from_secs(5));

        let result = runner
            .run(
                PhaseSpec::new("Publish", "p", ToolGrant::Release, ProgressBand::new(58, 75))
                    .expecting(UrlKind::Repository),
            )
            .await
            .unwrap();

        assert_eq!(
            result.signals.repo_url.as_deref(),
            Some("https://github.com/acme/first")
        );
        let job = store.get(&job_id).unwrap();
        assert_eq!(job.repo_url.as_deref(), Some("https://github.com/acme/first"));
    }

    #[tokio::test]
    async fn test_agent_failure_is_tagged_with_phase() {
        let store = JobStore::new();
        let job_id = store.create("site");
        let session = ScriptedSession::new(vec![Script::ExitFailure(2)]);
        let dir = tempfile::tempdir().unwrap();
        let runner = PhaseRunner::new(&session, &store, &job_id, dir.path(), Duration::from_secs(5));

        let err = runner
            .run(PhaseSpec::new("Sections", "p", ToolGrant::Generation, ProgressBand::new(16, 24)))
            .await
            .unwrap_err();

        match err {
            WorkflowError::Agent { phase, source } => {
                assert_eq!(phase, "Sections");
                assert!(matches!(source, AgentError::ProcessFailed { exit_code: 2, .. }));
            }
            other => panic!("Expected Agent error, got {:?}", other),
        }
        assert_eq!(store.get(&job_id).unwrap().progress, 16);
    }

    struct StalledSession;

    #[async_trait::async_trait]
    impl AgentSession for StalledSession {
        async fn open(
            &self,
            _request: AgentRequest,
        ) -> Result<crate::agent::EventStream, AgentError> {
            Ok(Box::pin(futures::stream::pending::<
                Result<crate::agent::AgentEvent, AgentError>,
            >()))
        }
    }

    #[tokio::test]
    async fn test_stalled_session_times_out() {
        let store = JobStore::new();
        let job_id = store.create("site");
        let dir = tempfile::tempdir().unwrap();
        let runner = PhaseRunner::new(
            &StalledSession,
            &store,
            &job_id,
            dir.path(),
            Duration::from_millis(50),
        );

        let err = runner
            .run(PhaseSpec::new("Deploy", "p", ToolGrant::Release, ProgressBand::new(75, 95)))
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::Timeout { ref phase, .. } if phase == "Deploy"));
    }
}
