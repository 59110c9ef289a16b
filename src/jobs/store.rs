use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use uuid::Uuid;

use super::models::{Job, JobStatus, JobUpdate};

/// In-memory registry of generation jobs.
///
/// Cloning is cheap and every clone shares the same map. All access goes
/// through one lock, so each update is atomic per job.
#[derive(Clone, Default)]
pub struct JobStore {
    inner: Arc<Mutex<StoreInner>>,
}

#[derive(Default)]
struct StoreInner {
    jobs: HashMap<String, StoredJob>,
    next_seq: u64,
}

struct StoredJob {
    seq: u64,
    job: Job,
}

impl JobStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, StoreInner> {
        // A panic while holding the lock cannot leave a job half-written:
        // every mutation is a plain field assignment.
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Register a new pending job and return its id.
    pub fn create(&self, site_slug: &str) -> String {
        let now = Utc::now();
        let id = new_job_id(now);
        let job = Job {
            id: id.clone(),
            site_slug: site_slug.to_string(),
            status: JobStatus::Pending,
            progress: 0,
            message: "Initializing...".to_string(),
            created_at: now,
            updated_at: now,
            repo_url: None,
            site_url: None,
            error: None,
        };

        let mut inner = self.lock();
        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.jobs.insert(id.clone(), StoredJob { seq, job });
        tracing::info!(job_id = %id, site_slug, "job created");
        id
    }

    /// Apply an update. Returns `false` when the job is unknown or already terminal.
    pub fn update(&self, job_id: &str, update: JobUpdate) -> bool {
        let mut inner = self.lock();
        let Some(stored) = inner.jobs.get_mut(job_id) else {
            tracing::warn!(job_id, "update for unknown job ignored");
            return false;
        };
        let job = &mut stored.job;
        if job.status.is_terminal() {
            tracing::warn!(
                job_id,
                status = %job.status,
                attempted = %update.status,
                "update for finished job ignored"
            );
            return false;
        }

        job.status = update.status;
        if let Some(progress) = update.progress {
            job.progress = progress;
        }
        job.message = update.message;
        if update.repo_url.is_some() {
            job.repo_url = update.repo_url;
        }
        if update.site_url.is_some() {
            job.site_url = update.site_url;
        }
        if update.error.is_some() {
            job.error = update.error;
        }
        job.updated_at = Utc::now();

        tracing::debug!(
            job_id,
            status = %job.status,
            progress = job.progress,
            message = %job.message,
            "job updated"
        );
        true
    }

    pub fn get(&self, job_id: &str) -> Option<Job> {
        self.lock().jobs.get(job_id).map(|s| s.job.clone())
    }

    /// All jobs, newest first.
    pub fn list(&self) -> Vec<Job> {
        let inner = self.lock();
        let mut stored: Vec<&StoredJob> = inner.jobs.values().collect();
        stored.sort_by(|a, b| b.seq.cmp(&a.seq));
        stored.into_iter().map(|s| s.job.clone()).collect()
    }

    pub fn delete(&self, job_id: &str) -> bool {
        let removed = self.lock().jobs.remove(job_id).is_some();
        if removed {
            tracing::info!(job_id, "job deleted");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.lock().jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// `job_<date>_<time>_<8 hex>`: sortable by creation second, unique within it.
fn new_job_id(now: chrono::DateTime<Utc>) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("job_{}_{}", now.format("%Y%m%d_%H%M%S"), &suffix[..8])
}
