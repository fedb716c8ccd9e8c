use std::path::Path;

const PROBED_TOOLS: &[&str] = &[
    "git", "docker", "npm", "pip", "curl", "wget", "grep", "find",
];

/// Host facts handed to the backend so generated commands fit the machine.
/// Collected once per invocation; prompt building is deterministic over it.
#[derive(Debug, Clone)]
pub struct SystemContext {
    pub os: String,
    pub arch: String,
    pub shell: String,
    pub terminal: String,
    pub user: String,
    pub cwd: String,
    pub available_tools: Vec<String>,
}

impl SystemContext {
    pub fn detect() -> Self {
        let cwd = std::env::current_dir()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|_| ".".to_string());
        Self {
            os: std::env::consts::OS.to_string(),
            arch: std::env::consts::ARCH.to_string(),
            shell: std::env::var("SHELL").unwrap_or_else(|_| "unknown".to_string()),
            terminal: std::env::var("TERM").unwrap_or_else(|_| "unknown".to_string()),
            user: std::env::var("USER")
                .or_else(|_| std::env::var("USERNAME"))
                .unwrap_or_else(|_| "unknown".to_string()),
            cwd,
            available_tools: probe_tools(),
        }
    }

    /// Prompt for primary command generation.
    pub fn command_prompt(&self, request: &str) -> String {
        format!(
            "System Information:\n\
             - OS: {os}\n\
             - Architecture: {arch}\n\
             - Shell: {shell}\n\
             - Terminal: {terminal}\n\
             - Available tools: {tools}\n\
             - Current directory: {cwd}\n\
             \n\
             User Request: {request}\n\
             \n\
             Generate ONLY the shell command(s) needed to fulfill this request. Rules:\n\
             1. Return only the command, no explanations\n\
             2. Use commands appropriate for {os}\n\
             3. Assume the user is in their current directory: {cwd}\n\
             4. If multiple commands are needed, separate them with ' && '\n\
             5. Use safe, standard commands when possible\n\
             6. Don't use sudo unless absolutely necessary\n\
             7. For file operations, use relative paths when possible\n\
             \n\
             Command:",
            os = self.os,
            arch = self.arch,
            shell = self.shell,
            terminal = self.terminal,
            tools = self.available_tools.join(", "),
            cwd = self.cwd,
        )
    }

    /// Prompt for the single corrective regeneration pass.
    pub fn fix_prompt(&self, original_command: &str, error_text: &str) -> String {
        format!(
            "The following command failed:\n\
             Command: {original_command}\n\
             Error: {error_text}\n\
             \n\
             System: {os}\n\
             Current directory: {cwd}\n\
             \n\
             Generate a corrected version of this command that should work. \
             Return only the fixed command, no explanations.\n\
             \n\
             Fixed command:",
            os = self.os,
            cwd = self.cwd,
        )
    }
}

fn probe_tools() -> Vec<String> {
    let Ok(path) = std::env::var("PATH") else {
        return Vec::new();
    };
    let dirs: Vec<&str> = path.split(':').filter(|d| !d.is_empty()).collect();
    PROBED_TOOLS
        .iter()
        .filter(|tool| dirs.iter().any(|d| Path::new(d).join(tool).is_file()))
        .map(|t| (*t).to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_context() -> SystemContext {
        SystemContext {
            os: "linux".to_string(),
            arch: "x86_64".to_string(),
            shell: "/bin/bash".to_string(),
            terminal: "xterm-256color".to_string(),
            user: "dev".to_string(),
            cwd: "/home/dev/project".to_string(),
            available_tools: vec!["git".to_string(), "curl".to_string()],
        }
    }

    #[test]
    fn command_prompt_is_deterministic() {
        let ctx = sample_context();
        assert_eq!(ctx.command_prompt("list files"), ctx.command_prompt("list files"));
    }

    #[test]
    fn command_prompt_carries_request_and_context() {
        let prompt = sample_context().command_prompt("list files");
        assert!(prompt.contains("User Request: list files"));
        assert!(prompt.contains("- OS: linux"));
        assert!(prompt.contains("git, curl"));
        assert!(prompt.ends_with("Command:"));
    }

    #[test]
    fn fix_prompt_carries_command_and_error() {
        let prompt = sample_context().fix_prompt("ls --bogus", "unrecognized option");
        assert!(prompt.contains("Command: ls --bogus"));
        assert!(prompt.contains("Error: unrecognized option"));
        assert!(prompt.ends_with("Fixed command:"));
    }

    #[test]
    fn detect_fills_every_field() {
        let ctx = SystemContext::detect();
        assert!(!ctx.os.is_empty());
        assert!(!ctx.arch.is_empty());
        assert!(!ctx.cwd.is_empty());
    }
}
