use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

pub const EXEC_TIMEOUT: Duration = Duration::from_secs(30);

/// One subprocess run, immutable after creation.
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

/// Runs a command string under the configured shell with a hard timeout.
///
/// A timeout is terminal here; any retry decision belongs to the
/// orchestrator's fix pass.
pub struct Executor {
    shell: Option<String>,
    timeout: Duration,
}

impl Executor {
    pub fn new(shell: Option<String>) -> Self {
        Self::with_timeout(shell, EXEC_TIMEOUT)
    }

    pub fn with_timeout(shell: Option<String>, timeout: Duration) -> Self {
        Self { shell, timeout }
    }

    #[tracing::instrument(level = "info", skip(self))]
    pub async fn execute(&self, command: &str) -> ExecutionResult {
        let shell = self.shell.as_deref().unwrap_or("/bin/sh");
        let mut cmd = Command::new(shell);
        cmd.arg("-c")
            .arg(command)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        match tokio::time::timeout(self.timeout, cmd.output()).await {
            Ok(Ok(output)) => ExecutionResult {
                success: output.status.success(),
                stdout: String::from_utf8_lossy(&output.stdout).to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            },
            Ok(Err(e)) => ExecutionResult {
                success: false,
                stdout: String::new(),
                stderr: e.to_string(),
            },
            Err(_) => {
                tracing::warn!(timeout_secs = self.timeout.as_secs(), "command timed out");
                ExecutionResult {
                    success: false,
                    stdout: String::new(),
                    stderr: format!("Command timed out after {} seconds", self.timeout.as_secs()),
                }
            }
        }
    }
}
