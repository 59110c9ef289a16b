use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }

    /// Completed and failed jobs never change again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Snapshot of one generation job as exposed to pollers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    pub site_slug: String,
    pub status: JobStatus,
    pub progress: u8,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// A single mutation applied through `JobStore::update`.
///
/// `None` fields leave the stored value untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct JobUpdate {
    pub status: JobStatus,
    pub progress: Option<u8>,
    pub message: String,
    pub repo_url: Option<String>,
    pub site_url: Option<String>,
    pub error: Option<String>,
}

impl JobUpdate {
    pub fn new(status: JobStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            progress: None,
            message: message.into(),
            repo_url: None,
            site_url: None,
            error: None,
        }
    }

    pub fn processing(progress: u8, message: impl Into<String>) -> Self {
        Self::new(JobStatus::Processing, message).with_progress(progress)
    }

    pub fn completed(message: impl Into<String>) -> Self {
        Self::new(JobStatus::Completed, message).with_progress(100)
    }

    pub fn failed(message: impl Into<String>, error: impl Into<String>) -> Self {
        Self::new(JobStatus::Failed, message)
            .with_progress(0)
            .with_error(error)
    }

    pub fn with_progress(mut self, progress: u8) -> Self {
        self.progress = Some(progress.min(100));
        self
    }

    pub fn with_repo_url(mut self, url: impl Into<String>) -> Self {
        self.repo_url = Some(url.into());
        self
    }

    pub fn with_site_url(mut self, url: impl Into<String>) -> Self {
        self.site_url = Some(url.into());
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serializes_lowercase() {
        let json = serde_json::to_string(&JobStatus::Processing).unwrap();
        assert_eq!(json, "\"processing\"");
        let parsed: JobStatus = serde_json::from_str("\"failed\"").unwrap();
        assert_eq!(parsed, JobStatus::Failed);
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(!JobStatus::Pending.is_terminal());
        assert!(!JobStatus::Processing.is_terminal());
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
    }

    #[test]
    fn test_progress_is_clamped() {
        let update = JobUpdate::processing(150, "x");
        assert_eq!(update.progress, Some(100));
    }

    #[test]
    fn test_failed_update_resets_progress_and_carries_error() {
        let update = JobUpdate::failed("Generation failed: boom", "boom\ndetails");
        assert_eq!(update.status, JobStatus::Failed);
        assert_eq!(update.progress, Some(0));
        assert_eq!(update.error.as_deref(), Some("boom\ndetails"));
    }

    #[test]
    fn test_job_omits_empty_result_fields() {
        let now = Utc::now();
        let job = Job {
            id: "job_1".into(),
            site_slug: "a-b".into(),
            status: JobStatus::Pending,
            progress: 0,
            message: "Initializing...".into(),
            created_at: now,
            updated_at: now,
            repo_url: None,
            site_url: None,
            error: None,
        };
        let value = serde_json::to_value(&job).unwrap();
        assert!(value.get("repo_url").is_none());
        assert_eq!(value["status"], "pending");
    }
}
