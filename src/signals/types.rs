//! Signal types extracted from agent output.

use serde::{Deserialize, Serialize};

/// Which kind of URL a phase is expected to report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UrlKind {
    /// `https://github.com/<owner>/<repo>`
    Repository,
    /// `https://<name>.vercel.app`
    Deployment,
}

impl UrlKind {
    /// Key a structured JSON answer uses for this URL.
    pub fn json_key(&self) -> &'static str {
        match self {
            UrlKind::Repository => "github_url",
            UrlKind::Deployment => "vercel_url",
        }
    }
}

/// Pass/fail classification of a validation report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    /// The agent declared the site deployable (`SAFE TO DEPLOY` / `PASSED`).
    Ready,
    /// The agent reported blocking problems (`CRITICAL` / `FAILED`).
    Critical,
}

/// Everything extracted from one phase's event stream.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PhaseSignals {
    pub repo_url: Option<String>,
    pub site_url: Option<String>,
    pub verdict: Option<Verdict>,
}

impl PhaseSignals {
    pub fn url(&self, kind: UrlKind) -> Option<&str> {
        match kind {
            UrlKind::Repository => self.repo_url.as_deref(),
            UrlKind::Deployment => self.site_url.as_deref(),
        }
    }
}
