//! Safety-gated execution pipeline for ShellPilot.
//!
//! A user request flows generate -> classify -> gate -> execute, with one
//! corrective regeneration pass on failure. The text-generation backend, the
//! confirmation prompt, and the usage counters sit behind traits so the
//! pipeline owns no I/O beyond the subprocess run itself.

mod backend;
mod clock;
mod context;
mod error;
mod exec;
mod fix;
mod generate;
mod orchestrator;
mod rate_limit;
mod safety;

pub use backend::{TextBackend, UsageSink};
pub use clock::{Clock, SystemClock};
pub use context::SystemContext;
pub use error::{PipelineError, Result};
pub use exec::{ExecutionResult, Executor, EXEC_TIMEOUT};
pub use fix::FixAttempt;
pub use generate::{CommandGenerator, normalize_command};
pub use orchestrator::{Confirmation, FixOutcome, Gate, Orchestrator, Outcome, Policy};
pub use rate_limit::RateLimiter;
pub use safety::{RiskTier, SafetyRules};
