use sp_llm::LlmError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, PipelineError>;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("rate limit reached; wait {wait_seconds}s")]
    RateLimited { wait_seconds: u64 },

    #[error("backend unavailable: {0}")]
    Backend(#[from] LlmError),

    #[error("backend returned an empty command")]
    EmptyResponse,

    #[error("invalid safety pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}
