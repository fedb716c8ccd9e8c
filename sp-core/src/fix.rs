use crate::backend::{TextBackend, UsageSink};
use crate::context::SystemContext;
use crate::generate::normalize_command;
use crate::rate_limit::RateLimiter;

/// Single corrective regeneration pass, best-effort.
///
/// Unlike primary generation, everything here degrades silently: a denied
/// rate-limit gate, a backend error, or a useless proposal all come back as
/// `None` and are only logged.
pub struct FixAttempt<'a> {
    backend: &'a dyn TextBackend,
    context: &'a SystemContext,
}

impl<'a> FixAttempt<'a> {
    pub fn new(backend: &'a dyn TextBackend, context: &'a SystemContext) -> Self {
        Self { backend, context }
    }

    #[tracing::instrument(level = "info", skip_all)]
    pub async fn propose(
        &self,
        limiter: &mut RateLimiter,
        usage: &mut dyn UsageSink,
        original_command: &str,
        error_text: &str,
    ) -> Option<String> {
        if !limiter.can_make_call() {
            tracing::debug!("fix attempt skipped: rate limit reached");
            return None;
        }

        let prompt = self.context.fix_prompt(original_command, error_text);
        limiter.record_call();
        let raw = match self.backend.complete(&prompt).await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::debug!(error = %e, "fix attempt backend call failed");
                return None;
            }
        };
        usage.record_call();

        let fixed = normalize_command(&raw);
        if fixed.is_empty() {
            tracing::debug!("fix attempt produced an empty command");
            return None;
        }
        if fixed == original_command {
            tracing::debug!("fix attempt matched the original command");
            return None;
        }
        Some(fixed)
    }
}
