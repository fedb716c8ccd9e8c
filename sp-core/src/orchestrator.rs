use crate::backend::{TextBackend, UsageSink};
use crate::context::SystemContext;
use crate::error::PipelineError;
use crate::exec::Executor;
use crate::fix::FixAttempt;
use crate::generate::CommandGenerator;
use crate::rate_limit::RateLimiter;
use crate::safety::{RiskTier, SafetyRules};

/// User-configured gate behavior, read-only to the pipeline.
#[derive(Debug, Clone, Copy)]
pub struct Policy {
    pub auto_run: bool,
    pub confirm_risky: bool,
    pub auto_fix: bool,
}

/// What kind of confirmation the gate demands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    /// Dangerous commands need the literal word "yes", never a bare y/n.
    DangerousTyped,
    YesNo,
}

/// Confirmation collaborator. Implementations present the command and return
/// whether the user approved; any read failure counts as a decline.
pub trait Confirmation {
    /// Called once per generated command, before any gate and regardless of
    /// whether one applies, so the user sees the command ahead of execution.
    fn notify_generated(&mut self, command: &str, tier: RiskTier);
    fn confirm_execution(&mut self, command: &str, tier: RiskTier, gate: Gate) -> bool;
    fn confirm_fix(&mut self, command: &str, tier: RiskTier, gate: Gate) -> bool;
}

/// How the corrective pass ended, carried inside `Outcome::Failed`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FixOutcome {
    /// Fixing disabled by policy.
    NotAttempted,
    /// The backend had no usable replacement.
    NoneAvailable,
    /// A replacement was proposed and the user declined it.
    Declined { proposed: String },
    /// The replacement ran and also failed.
    FailedAgain { command: String, stderr: String },
}

/// Terminal state of one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Success {
        command: String,
        stdout: String,
        used_fix: bool,
    },
    Cancelled {
        command: String,
    },
    Failed {
        command: String,
        stderr: String,
        fix: FixOutcome,
    },
    RateLimited {
        wait_seconds: u64,
    },
    GenerationFailed {
        reason: String,
    },
}

/// Drives one request through generate -> classify -> gate -> execute, with a
/// single gated fix pass on failure.
pub struct Orchestrator<'a> {
    backend: &'a dyn TextBackend,
    rules: &'a SafetyRules,
    executor: &'a Executor,
    context: &'a SystemContext,
    policy: Policy,
}

impl<'a> Orchestrator<'a> {
    pub fn new(
        backend: &'a dyn TextBackend,
        rules: &'a SafetyRules,
        executor: &'a Executor,
        context: &'a SystemContext,
        policy: Policy,
    ) -> Self {
        Self {
            backend,
            rules,
            executor,
            context,
            policy,
        }
    }

    #[tracing::instrument(level = "info", skip_all)]
    pub async fn run(
        &self,
        limiter: &mut RateLimiter,
        usage: &mut dyn UsageSink,
        confirm: &mut dyn Confirmation,
        request: &str,
    ) -> Outcome {
        let generator = CommandGenerator::new(self.backend, self.context);
        let command = match generator.generate(limiter, usage, request).await {
            Ok(command) => command,
            Err(PipelineError::RateLimited { wait_seconds }) => {
                return Outcome::RateLimited { wait_seconds };
            }
            Err(e) => {
                return Outcome::GenerationFailed {
                    reason: e.to_string(),
                };
            }
        };

        let tier = self.rules.classify(&command);
        tracing::info!(%command, tier = tier.as_str(), "command classified");
        confirm.notify_generated(&command, tier);

        if let Some(gate) = self.gate_for(tier) {
            if !confirm.confirm_execution(&command, tier, gate) {
                return Outcome::Cancelled { command };
            }
        }

        let result = self.executor.execute(&command).await;
        if result.success {
            return Outcome::Success {
                command,
                stdout: result.stdout,
                used_fix: false,
            };
        }

        if !self.policy.auto_fix {
            return Outcome::Failed {
                command,
                stderr: result.stderr,
                fix: FixOutcome::NotAttempted,
            };
        }
        self.run_fix_pass(limiter, usage, confirm, command, result.stderr)
            .await
    }

    /// Confirmation needed before the first execution, if any.
    fn gate_for(&self, tier: RiskTier) -> Option<Gate> {
        match tier {
            RiskTier::Dangerous => Some(Gate::DangerousTyped),
            RiskTier::Risky if self.policy.confirm_risky => Some(Gate::YesNo),
            _ if !self.policy.auto_run => Some(Gate::YesNo),
            _ => None,
        }
    }

    async fn run_fix_pass(
        &self,
        limiter: &mut RateLimiter,
        usage: &mut dyn UsageSink,
        confirm: &mut dyn Confirmation,
        command: String,
        stderr: String,
    ) -> Outcome {
        let fixer = FixAttempt::new(self.backend, self.context);
        let Some(fixed) = fixer.propose(limiter, usage, &command, &stderr).await else {
            return Outcome::Failed {
                command,
                stderr,
                fix: FixOutcome::NoneAvailable,
            };
        };

        // The replacement is re-classified: a fix that turned dangerous still
        // needs the typed confirmation, everything else the plain y/n.
        let fixed_tier = self.rules.classify(&fixed);
        let gate = match fixed_tier {
            RiskTier::Dangerous => Gate::DangerousTyped,
            _ => Gate::YesNo,
        };
        if !confirm.confirm_fix(&fixed, fixed_tier, gate) {
            return Outcome::Failed {
                command,
                stderr,
                fix: FixOutcome::Declined { proposed: fixed },
            };
        }

        let retry = self.executor.execute(&fixed).await;
        if retry.success {
            Outcome::Success {
                command: fixed,
                stdout: retry.stdout,
                used_fix: true,
            }
        } else {
            Outcome::Failed {
                command,
                stderr,
                fix: FixOutcome::FailedAgain {
                    command: fixed,
                    stderr: retry.stderr,
                },
            }
        }
    }
}
