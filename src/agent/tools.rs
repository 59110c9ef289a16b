//! Tool allow-lists handed to the agent for each kind of phase.

use serde::{Deserialize, Serialize};

/// Which tools a session may use.
///
/// | Grant        | Used by                     | Tools                     |
/// |--------------|-----------------------------|---------------------------|
/// | `Generation` | generation phases, auto-fix | Write, Read, Edit, Bash   |
/// | `Validation` | validation                  | Read, Grep, Glob, Bash    |
/// | `Release`    | publish, deploy             | Bash, Read, Edit          |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolGrant {
    Generation,
    Validation,
    Release,
}

impl ToolGrant {
    pub fn tools(&self) -> &'static [&'static str] {
        match self {
            ToolGrant::Generation => &["Write", "Read", "Edit", "Bash"],
            ToolGrant::Validation => &["Read", "Grep", "Glob", "Bash"],
            ToolGrant::Release => &["Bash", "Read", "Edit"],
        }
    }

    /// Value for `--allowedTools`.
    pub fn as_cli_arg(&self) -> String {
        self.tools().join(",")
    }
}

/// Permission mode passed to the agent runtime. File edits inside the
/// working directory are accepted without prompting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PermissionMode {
    #[default]
    AcceptEdits,
}

impl PermissionMode {
    pub fn as_cli_arg(&self) -> &'static str {
        match self {
            PermissionMode::AcceptEdits => "acceptEdits",
        }
    }
}
