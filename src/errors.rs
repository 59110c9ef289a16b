//! Typed error hierarchy for the site generator.
//!
//! Two top-level enums cover the two layers:
//! - `AgentError`: failures talking to the external coding agent
//! - `WorkflowError`: failures of a generation job, wrapping agent errors with the phase label

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Errors from an agent session.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("Agent runtime '{command}' not found; install the Claude CLI or set CLAUDE_CMD")]
    RuntimeMissing { command: String },

    #[error("Failed to spawn agent process: {0}")]
    SpawnFailed(#[source] std::io::Error),

    #[error("Agent exited with code {exit_code}: {stderr}")]
    ProcessFailed { exit_code: i32, stderr: String },

    #[error("Agent I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that abort a generation job.
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("{phase} failed: {source}")]
    Agent {
        phase: String,
        #[source]
        source: AgentError,
    },

    #[error("{phase} timed out after {}s", after.as_secs())]
    Timeout { phase: String, after: Duration },

    #[error("Failed to prepare site directory {path}: {source}")]
    Workspace {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Validation failed after {attempts} attempts. Report:\n{report}")]
    ValidationExhausted { attempts: u32, report: String },

    #[error("GitHub repository creation failed - no URL returned")]
    PublishFailed,
}

impl WorkflowError {
    /// First line of the error, suitable for a status message.
    pub fn headline(&self) -> String {
        match self {
            WorkflowError::ValidationExhausted { attempts, .. } => {
                format!("Validation failed after {} attempts", attempts)
            }
            other => other
                .to_string()
                .lines()
                .next()
                .unwrap_or_default()
                .to_string(),
        }
    }
}
