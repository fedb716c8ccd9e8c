use crate::backend::{TextBackend, UsageSink};
use crate::context::SystemContext;
use crate::error::{PipelineError, Result};
use crate::rate_limit::RateLimiter;

const STRIP_PREFIXES: &[&str] = &["```bash", "```sh", "```", "$", "> ", "Command:", "command:"];

/// Primary generation pass: rate-limit gate, one backend call, normalization.
pub struct CommandGenerator<'a> {
    backend: &'a dyn TextBackend,
    context: &'a SystemContext,
}

impl<'a> CommandGenerator<'a> {
    pub fn new(backend: &'a dyn TextBackend, context: &'a SystemContext) -> Self {
        Self { backend, context }
    }

    /// Generate a command for `request`.
    ///
    /// Refuses to call the backend when the limiter denies admission; the
    /// caller sees `RateLimited` rather than blocking. Usage is recorded once
    /// per successful backend call only.
    #[tracing::instrument(level = "info", skip_all)]
    pub async fn generate(
        &self,
        limiter: &mut RateLimiter,
        usage: &mut dyn UsageSink,
        request: &str,
    ) -> Result<String> {
        if !limiter.can_make_call() {
            let wait_seconds = limiter.time_until_next_call();
            tracing::warn!(wait_seconds, "generation refused by rate limiter");
            return Err(PipelineError::RateLimited { wait_seconds });
        }

        let prompt = self.context.command_prompt(request);
        limiter.record_call();
        let raw = self.backend.complete(&prompt).await?;
        usage.record_call();

        let command = normalize_command(&raw);
        if command.is_empty() {
            return Err(PipelineError::EmptyResponse);
        }
        tracing::debug!(%command, "generated command");
        Ok(command)
    }
}

/// Strip the decoration backends wrap around a bare command: leading code
/// fences, shell-prompt glyphs, and `Command:` labels, plus trailing fence
/// closers. Idempotent: runs to a fixed point.
pub fn normalize_command(raw: &str) -> String {
    let mut out = raw.trim();
    loop {
        let before = out;
        for prefix in STRIP_PREFIXES {
            if let Some(rest) = out.strip_prefix(prefix) {
                out = rest.trim_start();
            }
        }
        while let Some(rest) = out.strip_suffix("```") {
            out = rest.trim_end();
        }
        if out == before {
            break;
        }
    }
    out.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_code_fences() {
        assert_eq!(normalize_command("```bash\nls -la\n```"), "ls -la");
        assert_eq!(normalize_command("```sh\npwd\n```"), "pwd");
        assert_eq!(normalize_command("```\necho hi\n```"), "echo hi");
    }

    #[test]
    fn strips_prompt_glyphs_and_labels() {
        assert_eq!(normalize_command("$ ls -la"), "ls -la");
        assert_eq!(normalize_command("> ls -la"), "ls -la");
        assert_eq!(normalize_command("Command: ls -la"), "ls -la");
        assert_eq!(normalize_command("command: ls -la"), "ls -la");
    }

    #[test]
    fn strips_stacked_markers() {
        assert_eq!(normalize_command("```bash\n$ du -sh *\n```"), "du -sh *");
    }

    #[test]
    fn plain_commands_pass_through() {
        assert_eq!(normalize_command("find . -name '*.rs'"), "find . -name '*.rs'");
    }

    #[test]
    fn whitespace_only_normalizes_to_empty() {
        assert_eq!(normalize_command("   \n\t"), "");
        assert_eq!(normalize_command("```\n```"), "");
    }

    #[test]
    fn normalization_is_idempotent() {
        let cases = [
            "```bash\nls -la\n```",
            "$ $ echo hi",
            "Command: ```sh\ngit status\n```",
            "df -h",
        ];
        for raw in cases {
            let once = normalize_command(raw);
            assert_eq!(normalize_command(&once), once, "not idempotent for {raw:?}");
        }
    }
}
