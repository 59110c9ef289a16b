//! The external coding agent, seen as a stream of message events.
//!
//! `AgentSession` is the seam between the workflow and the agent runtime.
//! Real implementation: [`ClaudeCliSession`]. Tests use scripted doubles.

mod claude;
mod tools;

use std::collections::BTreeMap;
use std::path::PathBuf;

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::errors::AgentError;

pub use claude::ClaudeCliSession;
pub use tools::{PermissionMode, ToolGrant};

/// What an event carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// Assistant prose.
    Text,
    /// A tool invocation, described in one line.
    ToolUse,
    /// Output returned by a tool.
    ToolResult,
    /// The agent's final answer.
    FinalResult,
    /// A failed tool call or an error result.
    Error,
    /// Runtime bookkeeping (session init and similar).
    System,
    /// A stdout line that was not stream JSON.
    Raw,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentEvent {
    pub kind: EventKind,
    pub text: String,
}

impl AgentEvent {
    pub fn new(kind: EventKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::new(EventKind::Text, text)
    }
}

/// Events of one session, in order. The stream ends when the agent is done.
pub type EventStream = BoxStream<'static, Result<AgentEvent, AgentError>>;

/// One query to the agent.
#[derive(Debug, Clone)]
pub struct AgentRequest {
    pub prompt: String,
    pub grant: ToolGrant,
    pub cwd: PathBuf,
    pub permission_mode: PermissionMode,
    /// Extra environment for the agent process.
    pub env: BTreeMap<String, String>,
    /// Overrides the session's default model.
    pub model: Option<String>,
}

impl AgentRequest {
    pub fn new(prompt: impl Into<String>, grant: ToolGrant, cwd: impl Into<PathBuf>) -> Self {
        Self {
            prompt: prompt.into(),
            grant,
            cwd: cwd.into(),
            permission_mode: PermissionMode::AcceptEdits,
            env: BTreeMap::new(),
            model: None,
        }
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }
}

/// Submit a prompt and consume the agent's events until it finishes.
#[async_trait]
pub trait AgentSession: Send + Sync {
    async fn open(&self, request: AgentRequest) -> Result<EventStream, AgentError>;
}
