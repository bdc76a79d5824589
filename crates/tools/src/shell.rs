//! Shell tool: run a command through the platform shell.
//!
//! Supports command allowlisting and a timeout.

use async_trait::async_trait;
use jarvis_core::error::ToolError;
use jarvis_core::session::Session;
use jarvis_core::tool::{Tool, ToolArgs, ToolParameter};
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, warn};

/// Execute shell commands with an optional allowlist.
pub struct ShellTool {
    /// If non-empty, only these commands are allowed.
    allowed_commands: Vec<String>,
    timeout: Duration,
}

impl ShellTool {
    pub fn new(allowed_commands: Vec<String>) -> Self {
        Self {
            allowed_commands,
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn is_command_allowed(&self, command: &str) -> bool {
        if self.allowed_commands.is_empty() {
            return true;
        }
        let base_cmd = command.split_whitespace().next().unwrap_or("");
        self.allowed_commands.iter().any(|a| a == base_cmd)
    }

    fn shell(command: &str) -> Command {
        let mut cmd = if cfg!(target_os = "windows") {
            let mut c = Command::new("cmd");
            c.args(["/C", command]);
            c
        } else {
            let mut c = Command::new("sh");
            c.args(["-c", command]);
            c
        };
        cmd.kill_on_drop(true);
        cmd
    }
}

#[async_trait]
impl Tool for ShellTool {
    fn name(&self) -> &str {
        "run_shell_command"
    }

    fn description(&self) -> &str {
        "Executes a shell command and returns its output. WARNING: commands run with the user's permissions; use with extreme caution."
    }

    fn parameters(&self) -> Vec<ToolParameter> {
        vec![ToolParameter::string("command", "The shell command to execute")]
    }

    async fn execute(&self, _session: &mut Session, args: ToolArgs) -> Result<String, ToolError> {
        let command = args.string("command")?.trim();
        if command.is_empty() {
            return Err(ToolError::InvalidArguments("command must not be empty".into()));
        }

        if !self.is_command_allowed(command) {
            let base = command.split_whitespace().next().unwrap_or("").to_string();
            warn!(command = %command, "Blocked command outside the allowlist");
            return Err(ToolError::CommandNotAllowed(base));
        }

        debug!(command = %command, "Executing shell command");

        let output = match tokio::time::timeout(self.timeout, Self::shell(command).output()).await {
            Ok(result) => result.map_err(|e| ToolError::ExecutionFailed {
                tool_name: self.name().into(),
                reason: e.to_string(),
            })?,
            Err(_) => {
                return Err(ToolError::ExecutionFailed {
                    tool_name: self.name().into(),
                    reason: format!("timed out after {}s", self.timeout.as_secs()),
                });
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);

        let text = if output.status.success() {
            if stderr.trim().is_empty() {
                stdout.into_owned()
            } else {
                format!("{stdout}\n[stderr]: {stderr}")
            }
        } else {
            let code = output.status.code().unwrap_or(-1);
            warn!(command = %command, exit_code = code, "Command failed");
            format!("[exit code: {code}]\n{stdout}\n{stderr}")
        };

        let text = text.trim();
        if text.is_empty() {
            Ok("Command completed with no output.".to_string())
        } else {
            Ok(text.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jarvis_memory::NoopTodoStore;
    use std::sync::Arc;

    fn session() -> Session {
        Session::new(Arc::new(NoopTodoStore))
    }

    fn args(command: &str) -> ToolArgs {
        ToolArgs::from_json(serde_json::json!({ "command": command }))
    }

    #[test]
    fn allowlist_check() {
        let tool = ShellTool::new(vec!["ls".into(), "echo".into()]);
        assert!(tool.is_command_allowed("ls -la"));
        assert!(tool.is_command_allowed("echo hi"));
        assert!(!tool.is_command_allowed("rm -rf /"));
    }

    #[test]
    fn empty_allowlist_allows_all() {
        let tool = ShellTool::new(vec![]);
        assert!(tool.is_command_allowed("anything goes"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn execute_echo() {
        let tool = ShellTool::new(vec![]);
        let out = tool.execute(&mut session(), args("echo hello")).await.unwrap();
        assert_eq!(out, "hello");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn failing_command_reports_exit_code() {
        let tool = ShellTool::new(vec![]);
        let out = tool.execute(&mut session(), args("exit 3")).await.unwrap();
        assert!(out.starts_with("[exit code: 3]"));
    }

    #[tokio::test]
    async fn blocked_command() {
        let tool = ShellTool::new(vec!["ls".into()]);
        let err = tool.execute(&mut session(), args("rm -rf /")).await.unwrap_err();
        assert!(matches!(err, ToolError::CommandNotAllowed(ref c) if c == "rm"));
        assert!(err.to_string().contains("not supported"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn timeout_is_enforced() {
        let tool = ShellTool::new(vec![]).with_timeout(Duration::from_millis(100));
        let err = tool.execute(&mut session(), args("sleep 5")).await.unwrap_err();
        assert!(err.to_string().contains("timed out"));
    }
}
