//! Subcommand handlers for the ShellPilot binary.

use crate::config::{self, AppConfig};
use crate::prompt::StdinConfirmation;
use crate::usage::UsageCounters;
use sp_core::{
    Executor, FixOutcome, Orchestrator, Outcome, RateLimiter, SafetyRules, SystemContext,
};
use sp_llm::{FallbackClient, LlmClient};
use std::io::Write;
use std::path::{Path, PathBuf};

const CONFIG_TEMPLATE: &str = include_str!("../config-templates/config.toml");
const HANDSHAKE_PROMPT: &str = "Hello, respond with just 'OK'";

/// Translate one request into a command and run it through the gate.
pub async fn run(config_path: Option<&Path>, request: &str) -> anyhow::Result<()> {
    let cfg = AppConfig::load(config_path).await?;
    if !cfg.general.enabled {
        println!("ShellPilot is disabled. Use 'shellpilot enable' to enable it.");
        return Ok(());
    }

    let rules = SafetyRules::with_extras(&cfg.safety.extra_dangerous, &cfg.safety.extra_risky)
        .map_err(|e| anyhow::anyhow!("safety configuration: {e}"))?;
    let backend = build_backend(&cfg)?;
    let executor = Executor::new(cfg.general.preferred_shell.clone());
    let context = SystemContext::detect();
    let mut limiter = RateLimiter::new(
        cfg.limits.rate_limit_calls as usize,
        cfg.limits.rate_limit_window_minutes,
    );

    let usage_path = config::usage_path_for(config_path);
    let mut usage = UsageCounters::load(&usage_path).await?;
    let mut confirm = StdinConfirmation;

    println!("Generating command for: {request}");
    let orchestrator = Orchestrator::new(&backend, &rules, &executor, &context, cfg.policy());
    let outcome = orchestrator
        .run(&mut limiter, &mut usage, &mut confirm, request)
        .await;
    usage.save(&usage_path).await?;

    report(outcome);
    Ok(())
}

fn report(outcome: Outcome) {
    match outcome {
        Outcome::Success {
            command,
            stdout,
            used_fix,
        } => {
            if used_fix {
                println!("Fixed command executed successfully: {command}");
            } else {
                println!("Command executed successfully: {command}");
            }
            if !stdout.is_empty() {
                println!("Output:\n{stdout}");
            }
        }
        Outcome::Cancelled { .. } => println!("Command cancelled"),
        Outcome::Failed {
            command,
            stderr,
            fix,
        } => {
            println!("Command failed: {command}");
            if !stderr.is_empty() {
                println!("{stderr}");
            }
            match fix {
                FixOutcome::NotAttempted => {}
                FixOutcome::NoneAvailable => println!("No fix available"),
                FixOutcome::Declined { .. } => println!("Fix declined"),
                FixOutcome::FailedAgain { command, stderr } => {
                    println!("Fixed command also failed: {command}");
                    if !stderr.is_empty() {
                        println!("{stderr}");
                    }
                }
            }
        }
        Outcome::RateLimited { wait_seconds } => {
            println!(
                "Rate limit reached. Please wait {wait_seconds} seconds before making another request."
            );
        }
        Outcome::GenerationFailed { reason } => println!("Failed to generate command: {reason}"),
    }
}

fn build_backend(cfg: &AppConfig) -> anyhow::Result<FallbackClient> {
    let mut candidates = Vec::new();
    for model in &cfg.general.models {
        match cfg.api_key_for_model(model) {
            Some(key) => candidates.push(LlmClient::new(&key, model)),
            None => tracing::warn!(%model, "skipping model candidate: no API key configured"),
        }
    }
    FallbackClient::new(candidates).map_err(|e| {
        anyhow::anyhow!(
            "{e}; set OPENAI_API_KEY or ANTHROPIC_API_KEY, or add keys to the config file"
        )
    })
}

pub async fn status(config_path: Option<&Path>) -> anyhow::Result<()> {
    let cfg = AppConfig::load(config_path).await?;
    let path = resolved_config_path(config_path);
    let has_key =
        cfg.keys.openai_api_key.is_some() || cfg.keys.anthropic_api_key.is_some();

    println!("ShellPilot status:");
    println!("  enabled: {}", cfg.general.enabled);
    println!("  models: {}", cfg.general.models.join(", "));
    println!("  api key: {}", if has_key { "configured" } else { "missing" });
    println!("  auto_run: {}", cfg.policy.auto_run);
    println!("  confirm_risky: {}", cfg.policy.confirm_risky);
    println!("  auto_fix: {}", cfg.policy.auto_fix);
    println!(
        "  rate limit: {} calls / {} min",
        cfg.limits.rate_limit_calls, cfg.limits.rate_limit_window_minutes
    );
    if let Some(shell) = &cfg.general.preferred_shell {
        println!("  shell: {shell}");
    }
    println!("  config: {}", path.display());
    Ok(())
}

pub async fn usage_stats(config_path: Option<&Path>) -> anyhow::Result<()> {
    let cfg = AppConfig::load(config_path).await?;
    let usage = UsageCounters::load(&config::usage_path_for(config_path)).await?;

    let mut limiter = RateLimiter::new(
        cfg.limits.rate_limit_calls as usize,
        cfg.limits.rate_limit_window_minutes,
    );

    println!("Usage statistics:");
    println!("  total backend calls: {}", usage.total_calls);
    println!(
        "  rate limit: {} calls / {} min",
        cfg.limits.rate_limit_calls, cfg.limits.rate_limit_window_minutes
    );
    println!("  limiter: {}", limiter_status_line(&mut limiter));
    let recent = usage.recent_days(7);
    if !recent.is_empty() {
        println!("  recent:");
        for (date, count) in recent {
            println!("    {date}: {count} calls");
        }
    }
    Ok(())
}

fn limiter_status_line(limiter: &mut RateLimiter) -> String {
    if limiter.can_make_call() {
        "ready".to_string()
    } else {
        format!(
            "rate limited - wait {} seconds",
            limiter.time_until_next_call()
        )
    }
}

pub async fn set_enabled(config_path: Option<&Path>, enabled: bool) -> anyhow::Result<()> {
    let path = resolved_config_path(config_path);
    let mut cfg = AppConfig::load_stored(&path).await?;
    cfg.general.enabled = enabled;
    cfg.save(&path).await?;
    println!(
        "ShellPilot {}",
        if enabled { "enabled" } else { "disabled" }
    );
    Ok(())
}

/// Delete config and usage data after a typed confirmation.
pub async fn reset(config_path: Option<&Path>) -> anyhow::Result<()> {
    println!("This removes all settings and usage data, including any saved API keys.");
    print!("Are you sure you want to reset everything? (type 'yes' to confirm): ");
    std::io::stdout().flush()?;
    let mut answer = String::new();
    std::io::stdin().read_line(&mut answer)?;
    if answer.trim().to_lowercase() != "yes" {
        println!("Reset cancelled");
        return Ok(());
    }

    for path in [
        resolved_config_path(config_path),
        config::usage_path_for(config_path),
    ] {
        match tokio::fs::remove_file(&path).await {
            Ok(()) => println!("removed {}", path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(anyhow::anyhow!("remove {}: {e}", path.display())),
        }
    }
    println!("Configuration and usage data reset");
    Ok(())
}

/// Write the default config template, never overwriting an existing file.
pub async fn init(config_path: Option<&Path>) -> anyhow::Result<()> {
    let path = resolved_config_path(config_path);
    match tokio::fs::metadata(&path).await {
        Ok(_) => {
            println!("already initialized: {}", path.display());
            return Ok(());
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(anyhow::anyhow!("inspect {}: {e}", path.display())),
    }

    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| anyhow::anyhow!("create config dir {}: {e}", parent.display()))?;
    }
    tokio::fs::write(&path, CONFIG_TEMPLATE)
        .await
        .map_err(|e| anyhow::anyhow!("write {}: {e}", path.display()))?;
    println!("initialized {}", path.display());
    println!("next: add API keys to the config or export OPENAI_API_KEY / ANTHROPIC_API_KEY");
    Ok(())
}

/// Validate the config and try one handshake call per model candidate.
///
/// On total failure, keys that were stored in the config file (and not
/// shadowed by environment variables) are discarded so a bad credential is
/// not silently reused next run.
pub async fn doctor(config_path: Option<&Path>) -> anyhow::Result<()> {
    let cfg = AppConfig::load(config_path).await?;
    println!("config: ok");

    let mut limiter = RateLimiter::new(
        cfg.limits.rate_limit_calls as usize,
        cfg.limits.rate_limit_window_minutes,
    );
    let usage_path = config::usage_path_for(config_path);
    let mut usage = UsageCounters::load(&usage_path).await?;

    let mut connected = false;
    for model in &cfg.general.models {
        let Some(key) = cfg.api_key_for_model(model) else {
            println!("model {model}: no API key configured");
            continue;
        };
        if !limiter.can_make_call() {
            println!(
                "rate limit reached; wait {}s before probing further models",
                limiter.time_until_next_call()
            );
            break;
        }
        limiter.record_call();
        let client = LlmClient::new(&key, model);
        match client.complete(HANDSHAKE_PROMPT).await {
            Ok(text) => {
                use sp_core::UsageSink;
                usage.record_call();
                println!("model {model}: connected ({})", text.trim());
                connected = true;
                break;
            }
            Err(e) => println!("model {model}: {e}"),
        }
    }
    usage.save(&usage_path).await?;

    if !connected {
        discard_stored_keys(config_path).await?;
        return Err(anyhow::anyhow!("no model candidate responded"));
    }
    Ok(())
}

async fn discard_stored_keys(config_path: Option<&Path>) -> anyhow::Result<()> {
    let path = resolved_config_path(config_path);
    let Ok(contents) = tokio::fs::read_to_string(&path).await else {
        return Ok(());
    };
    let mut stored: AppConfig = match toml::from_str(&contents) {
        Ok(cfg) => cfg,
        Err(_) => return Ok(()),
    };

    let env_openai = std::env::var("OPENAI_API_KEY").is_ok_and(|v| !v.trim().is_empty());
    let env_anthropic = std::env::var("ANTHROPIC_API_KEY").is_ok_and(|v| !v.trim().is_empty());

    let mut discarded = false;
    if stored.keys.openai_api_key.is_some() && !env_openai {
        stored.keys.openai_api_key = None;
        discarded = true;
    }
    if stored.keys.anthropic_api_key.is_some() && !env_anthropic {
        stored.keys.anthropic_api_key = None;
        discarded = true;
    }
    if discarded {
        stored.save(&path).await?;
        println!("stored API keys discarded; check the credentials and set them again");
    }
    Ok(())
}

fn resolved_config_path(config_path: Option<&Path>) -> PathBuf {
    config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(config::default_config_path)
}
