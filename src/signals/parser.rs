//! Signal extraction from agent output.
//!
//! The agent reports results in free text. This is the only place that
//! sniffs that text:
//! - repository and deployment URLs, by regex or from a JSON answer
//! - validation verdicts, by keyword

use regex::Regex;
use std::sync::LazyLock;

use super::types::{PhaseSignals, UrlKind, Verdict};
use crate::util::extract_json_object;

static REPOSITORY_URL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https://github\.com/[\w-]+/[\w.-]+").unwrap());

static DEPLOYMENT_URL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https://[\w-]+\.vercel\.app").unwrap());

/// First path segments of GitHub pages that are not repository owners.
const RESERVED_GITHUB_OWNERS: [&str; 9] = [
    "settings",
    "login",
    "orgs",
    "organizations",
    "marketplace",
    "apps",
    "features",
    "sponsors",
    "notifications",
];

const READY_TOKENS: [&str; 2] = ["SAFE TO DEPLOY", "PASSED"];
const CRITICAL_TOKENS: [&str; 2] = ["CRITICAL", "FAILED"];

/// Find the first URL of `kind` in `text`.
///
/// A structured answer such as `{"success": true, "github_url": "..."}` is
/// honoured first; otherwise the first regex match in the text is used.
pub fn find_url(text: &str, kind: UrlKind) -> Option<String> {
    if let Some(url) = url_from_json_answer(text, kind) {
        return Some(url);
    }
    let regex = match kind {
        UrlKind::Repository => &*REPOSITORY_URL_REGEX,
        UrlKind::Deployment => &*DEPLOYMENT_URL_REGEX,
    };
    regex
        .find_iter(text)
        .map(|m| m.as_str().trim_end_matches('.').trim_end_matches(".git").to_string())
        .find(|url| !(matches!(kind, UrlKind::Repository) && is_reserved_github_page(url)))
}

fn is_reserved_github_page(url: &str) -> bool {
    let owner = url
        .trim_start_matches("https://github.com/")
        .split('/')
        .next()
        .unwrap_or_default();
    RESERVED_GITHUB_OWNERS.contains(&owner.to_ascii_lowercase().as_str())
}

fn url_from_json_answer(text: &str, kind: UrlKind) -> Option<String> {
    let json = extract_json_object(text)?;
    let value: serde_json::Value = serde_json::from_str(&json).ok()?;
    if !value.get("success")?.as_bool()? {
        return None;
    }
    let url = value.get(kind.json_key())?.as_str()?.trim();
    url.starts_with("https://").then(|| url.to_string())
}

/// Classify one chunk of text. A ready token beats a critical token in the same chunk.
pub fn classify_verdict(text: &str) -> Option<Verdict> {
    if READY_TOKENS.iter().any(|t| text.contains(t)) {
        Some(Verdict::Ready)
    } else if CRITICAL_TOKENS.iter().any(|t| text.contains(t)) {
        Some(Verdict::Critical)
    } else {
        None
    }
}

/// Accumulates signals over the events of one phase.
///
/// URLs: first match wins, later matches are ignored.
/// Verdict: the last event carrying a token decides.
#[derive(Debug, Default)]
pub struct SignalScanner {
    signals: PhaseSignals,
}

impl SignalScanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one event's text. Returns the URL kinds newly discovered by this call.
    pub fn observe(&mut self, text: &str) -> Vec<UrlKind> {
        let mut found = Vec::new();

        if self.signals.repo_url.is_none()
            && let Some(url) = find_url(text, UrlKind::Repository)
        {
            tracing::debug!(url = %url, "repository URL detected");
            self.signals.repo_url = Some(url);
            found.push(UrlKind::Repository);
        }
        if self.signals.site_url.is_none()
            && let Some(url) = find_url(text, UrlKind::Deployment)
        {
            tracing::debug!(url = %url, "deployment URL detected");
            self.signals.site_url = Some(url);
            found.push(UrlKind::Deployment);
        }
        if let Some(verdict) = classify_verdict(text) {
            self.signals.verdict = Some(verdict);
        }

        found
    }

    pub fn signals(&self) -> &PhaseSignals {
        &self.signals
    }

    pub fn finish(self) -> PhaseSignals {
        self.signals
    }
}
