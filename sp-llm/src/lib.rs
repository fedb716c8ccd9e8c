//! BYO-key text-completion client for ShellPilot.
//!
//! Pure HTTP client over the OpenAI Chat Completions and Anthropic Messages
//! APIs. Single prompt in, generated text out; no streaming, no tool calling.

mod anthropic;
mod client;
mod error;
mod openai;

pub use client::{FallbackClient, LlmClient, Provider, detect_provider};
pub use error::{LlmError, Result};
