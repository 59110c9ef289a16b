use std::collections::VecDeque;
use std::process::Stdio;

use async_trait::async_trait;
use futures::stream;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdout, Command};
use tokio::task::JoinHandle;

use super::{AgentEvent, AgentRequest, AgentSession, EventStream};
use crate::errors::AgentError;
use crate::stream::decode_line;

/// Variables never inherited by the agent process. Publish and deploy
/// phases pass the tokens they need explicitly through the request.
const SCRUBBED_ENV: [&str; 4] = ["GH_TOKEN", "GITHUB_TOKEN", "VERCEL_TOKEN", "CLAUDECODE"];

/// Tail of stderr kept for error reports.
const STDERR_TAIL_BYTES: usize = 4096;

/// Runs each query as a `claude --print --output-format stream-json` process.
#[derive(Debug, Clone)]
pub struct ClaudeCliSession {
    command: String,
    model: Option<String>,
}

impl ClaudeCliSession {
    pub fn new(command: impl Into<String>, model: Option<String>) -> Self {
        Self {
            command: command.into(),
            model,
        }
    }

    fn build_command(&self, request: &AgentRequest) -> Command {
        let tools = request.grant.as_cli_arg();
        let mut cmd = Command::new(&self.command);
        cmd.args([
            "--print",
            "--output-format",
            "stream-json",
            "--verbose",
            "--permission-mode",
            request.permission_mode.as_cli_arg(),
            "--allowedTools",
            tools.as_str(),
        ]);
        if let Some(model) = request.model.as_ref().or(self.model.as_ref()) {
            cmd.arg("--model").arg(model);
        }
        for var in SCRUBBED_ENV {
            cmd.env_remove(var);
        }
        cmd.envs(&request.env)
            .current_dir(&request.cwd)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }
}

#[async_trait]
impl AgentSession for ClaudeCliSession {
    async fn open(&self, request: AgentRequest) -> Result<EventStream, AgentError> {
        if !request.cwd.is_dir() {
            return Err(AgentError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("working directory {} does not exist", request.cwd.display()),
            )));
        }

        let mut child = self.build_command(&request).spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AgentError::RuntimeMissing {
                    command: self.command.clone(),
                }
            } else {
                AgentError::SpawnFailed(e)
            }
        })?;
        tracing::debug!(
            command = %self.command,
            cwd = %request.cwd.display(),
            tools = %request.grant.as_cli_arg(),
            pid = ?child.id(),
            "agent process started"
        );

        // The prompt goes through stdin so its size is not bounded by argv.
        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| AgentError::Io(std::io::Error::other("agent stdin not captured")))?;
        let prompt = request.prompt;
        tokio::spawn(async move {
            if let Err(e) = stdin.write_all(prompt.as_bytes()).await {
                tracing::warn!(error = %e, "failed to send prompt to agent");
                return;
            }
            let _ = stdin.shutdown().await;
        });

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| AgentError::Io(std::io::Error::other("agent stdout not captured")))?;
        let stderr = child.stderr.take();
        let stderr_task = tokio::spawn(async move {
            let mut buf = Vec::new();
            if let Some(mut stderr) = stderr {
                let _ = stderr.read_to_end(&mut buf).await;
            }
            let start = buf.len().saturating_sub(STDERR_TAIL_BYTES);
            String::from_utf8_lossy(&buf[start..]).trim().to_string()
        });

        let state = CliStream {
            lines: BufReader::new(stdout).lines(),
            child,
            stderr: stderr_task,
            pending: VecDeque::new(),
            done: false,
        };
        Ok(Box::pin(stream::unfold(state, CliStream::next_event)))
    }
}

struct CliStream {
    lines: Lines<BufReader<ChildStdout>>,
    child: Child,
    stderr: JoinHandle<String>,
    pending: VecDeque<AgentEvent>,
    done: bool,
}

impl CliStream {
    async fn next_event(mut self) -> Option<(Result<AgentEvent, AgentError>, Self)> {
        loop {
            if let Some(event) = self.pending.pop_front() {
                return Some((Ok(event), self));
            }
            if self.done {
                return None;
            }
            match self.lines.next_line().await {
                Ok(Some(line)) => self.pending.extend(decode_line(&line)),
                Ok(None) => {
                    self.done = true;
                    return match self.child.wait().await {
                        Ok(status) if status.success() => None,
                        Ok(status) => {
                            let stderr = (&mut self.stderr).await.unwrap_or_default();
                            let exit_code = status.code().unwrap_or(-1);
                            Some((Err(AgentError::ProcessFailed { exit_code, stderr }), self))
                        }
                        Err(e) => Some((Err(AgentError::Io(e)), self)),
                    };
                }
                Err(e) => {
                    self.done = true;
                    return Some((Err(AgentError::Io(e)), self));
                }
            }
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::agent::{EventKind, ToolGrant};
    use futures::StreamExt;
    use std::os::unix::fs::PermissionsExt;
    use std::path::{Path, PathBuf};

    fn fake_claude(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("fake-claude.sh");
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    async fn collect(session: &ClaudeCliSession, request: AgentRequest) -> Vec<Result<AgentEvent, AgentError>> {
        session.open(request).await.unwrap().collect().await
    }

    #[tokio::test]
    async fn test_streams_decoded_events() {
        let dir = tempfile::tempdir().unwrap();
        let script = fake_claude(
            dir.path(),
            r#"cat > /dev/null
echo '{"type":"system","subtype":"init"}'
echo '{"type":"assistant","message":{"content":[{"type":"text","text":"Pushed to https://github.com/acme/site"}]}}'
echo 'not json'
echo '{"type":"result","subtype":"success","result":"done","is_error":false}'"#,
        );
        let session = ClaudeCliSession::new(script.to_string_lossy(), None);
        let events = collect(&session, AgentRequest::new("go", ToolGrant::Release, dir.path())).await;

        let events: Vec<AgentEvent> = events.into_iter().map(|e| e.unwrap()).collect();
        let kinds: Vec<EventKind> = events.iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![EventKind::System, EventKind::Text, EventKind::Raw, EventKind::FinalResult]
        );
        assert_eq!(events[1].text, "Pushed to https://github.com/acme/site");
    }

    #[tokio::test]
    async fn test_passes_flags_and_prompt_on_stdin() {
        let dir = tempfile::tempdir().unwrap();
        let script = fake_claude(
            dir.path(),
            r#"echo "ARGS: $*"
echo "PROMPT: $(cat)""#,
        );
        let session = ClaudeCliSession::new(script.to_string_lossy(), Some("test-model".into()));
        let events = collect(
            &session,
            AgentRequest::new("build the site", ToolGrant::Validation, dir.path()),
        )
        .await;
        let texts: Vec<String> = events.into_iter().map(|e| e.unwrap().text).collect();

        assert!(texts[0].contains("--output-format stream-json"));
        assert!(texts[0].contains("--permission-mode acceptEdits"));
        assert!(texts[0].contains("--allowedTools Read,Grep,Glob,Bash"));
        assert!(texts[0].contains("--model test-model"));
        assert_eq!(texts[1], "PROMPT: build the site");
    }

    #[tokio::test]
    async fn test_runs_in_working_directory() {
        let dir = tempfile::tempdir().unwrap();
        let site = dir.path().join("site");
        std::fs::create_dir(&site).unwrap();
        let script = fake_claude(dir.path(), "cat > /dev/null; pwd");
        let session = ClaudeCliSession::new(script.to_string_lossy(), None);
        let events = collect(&session, AgentRequest::new("x", ToolGrant::Generation, &site)).await;
        let cwd = events.into_iter().next().unwrap().unwrap().text;
        assert!(cwd.ends_with("/site"));
    }

    #[tokio::test]
    async fn test_credentials_scrubbed_unless_granted() {
        let dir = tempfile::tempdir().unwrap();
        let script = fake_claude(
            dir.path(),
            r#"cat > /dev/null
echo "gh=${GH_TOKEN:-unset} vercel=${VERCEL_TOKEN:-unset}""#,
        );
        let session = ClaudeCliSession::new(script.to_string_lossy(), None);
        let request =
            AgentRequest::new("x", ToolGrant::Release, dir.path()).with_env("GH_TOKEN", "ghp_test");
        let events = collect(&session, request).await;
        let line = events.into_iter().next().unwrap().unwrap().text;
        assert_eq!(line, "gh=ghp_test vercel=unset");
    }

    #[tokio::test]
    async fn test_non_zero_exit_yields_process_failed() {
        let dir = tempfile::tempdir().unwrap();
        let script = fake_claude(
            dir.path(),
            r#"cat > /dev/null
echo 'partial output'
echo 'rate limited' >&2
exit 3"#,
        );
        let session = ClaudeCliSession::new(script.to_string_lossy(), None);
        let events = collect(&session, AgentRequest::new("x", ToolGrant::Generation, dir.path())).await;

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].as_ref().unwrap().text, "partial output");
        match &events[1] {
            Err(AgentError::ProcessFailed { exit_code, stderr }) => {
                assert_eq!(*exit_code, 3);
                assert_eq!(stderr, "rate limited");
            }
            other => panic!("Expected ProcessFailed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_binary_is_runtime_missing() {
        let dir = tempfile::tempdir().unwrap();
        let session = ClaudeCliSession::new("/nonexistent/claude-binary", None);
        let result = session
            .open(AgentRequest::new("x", ToolGrant::Generation, dir.path()))
            .await;
        assert!(matches!(result, Err(AgentError::RuntimeMissing { .. })));
    }

    #[tokio::test]
    async fn test_missing_working_directory_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let script = fake_claude(dir.path(), "true");
        let session = ClaudeCliSession::new(script.to_string_lossy(), None);
        let result = session
            .open(AgentRequest::new("x", ToolGrant::Generation, dir.path().join("nope")))
            .await;
        assert!(matches!(result, Err(AgentError::Io(_))));
    }
}
