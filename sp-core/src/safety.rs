use crate::error::Result;
use regex::Regex;

/// Command risk classification driving the confirmation gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskTier {
    Safe,
    Risky,
    Dangerous,
}

impl RiskTier {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Safe => "safe",
            Self::Risky => "risky",
            Self::Dangerous => "dangerous",
        }
    }
}

/// Never auto-executed: destructive deletion, disk formatting, fork bombs,
/// privilege escalation and account mutation, power-state control, piping
/// remote code into a shell. Entries containing `.*` compile as
/// case-insensitive regexes; the rest match as case-insensitive substrings.
const DANGEROUS_PATTERNS: &[&str] = &[
    "rm -rf",
    "rm -r /",
    "del /f",
    "del c:\\",
    "rmdir /s",
    "format",
    "fdisk",
    "mkfs",
    "dd if=",
    "shutdown",
    "reboot",
    "halt",
    "poweroff",
    "init 0",
    "init 6",
    "systemctl poweroff",
    "systemctl reboot",
    "chmod 777",
    "chown root",
    "sudo rm",
    "sudo dd",
    "sudo chmod -r 777",
    "sudo chown -r",
    "sudo su",
    "su -",
    "useradd",
    "userdel",
    "passwd",
    "net user.*add",
    "takeown /f",
    "icacls.*grant.*full",
    "pkill -9",
    "killall -9",
    ":(){ :|:& };:",
    r"curl\s.*\|.*\bsh\b",
    r"wget\s.*\|.*\bsh\b",
];

/// Side effects that require care: elevated privileges, deletion and
/// cross-root moves, ownership changes, destructive VCS operations, package
/// installation, service and mount management. All regexes.
const RISKY_PATTERNS: &[&str] = &[
    r"sudo\s+",
    r"rm\s+",
    r"del\s+",
    r"move\s+",
    r"mv\s+",
    r"cp\s+.*\s+/",
    r"copy\s+.*\s+\\",
    r"chmod\s+",
    r"chown\s+",
    r"git\s+reset\s+--hard",
    r"git\s+clean\s+-fd",
    r"npm\s+install\s+-g",
    r"pip\s+install\s+",
    r"apt\s+install",
    r"yum\s+install",
    r"systemctl\s+",
    r"service\s+",
    r"crontab\s+",
    r"mount\s+",
    r"umount\s+",
    r"fdisk\s+",
    r"parted\s+",
];

/// Compiled pattern tables. The built-in lists are data, not control flow;
/// extra entries can be appended from configuration without touching the
/// classifier.
pub struct SafetyRules {
    dangerous_literals: Vec<String>,
    dangerous_regexes: Vec<Regex>,
    risky: Vec<Regex>,
}

impl SafetyRules {
    pub fn builtin() -> Self {
        Self::with_extras(&[], &[]).unwrap_or_else(|e| {
            // Built-in tables are tested; a compile failure here is a bug.
            unreachable!("builtin safety patterns failed to compile: {e}")
        })
    }

    pub fn with_extras(extra_dangerous: &[String], extra_risky: &[String]) -> Result<Self> {
        let mut dangerous_literals = Vec::new();
        let mut dangerous_regexes = Vec::new();

        for raw in DANGEROUS_PATTERNS
            .iter()
            .map(|p| (*p).to_string())
            .chain(extra_dangerous.iter().cloned())
        {
            if raw.contains(".*") || raw.contains(r"\s") {
                dangerous_regexes.push(case_insensitive(&raw)?);
            } else {
                dangerous_literals.push(raw.to_lowercase());
            }
        }

        let mut risky = Vec::new();
        for raw in RISKY_PATTERNS
            .iter()
            .map(|p| (*p).to_string())
            .chain(extra_risky.iter().cloned())
        {
            risky.push(case_insensitive(&raw)?);
        }

        Ok(Self {
            dangerous_literals,
            dangerous_regexes,
            risky,
        })
    }

    /// Total and exclusive: every command maps to exactly one tier, and a
    /// dangerous match short-circuits risky evaluation.
    pub fn classify(&self, command: &str) -> RiskTier {
        let lowered = command.to_lowercase();
        if self.dangerous_literals.iter().any(|p| lowered.contains(p))
            || self.dangerous_regexes.iter().any(|r| r.is_match(command))
        {
            return RiskTier::Dangerous;
        }
        if self.risky.iter().any(|r| r.is_match(command)) {
            return RiskTier::Risky;
        }
        RiskTier::Safe
    }
}

fn case_insensitive(pattern: &str) -> std::result::Result<Regex, crate::error::PipelineError> {
    Ok(Regex::new(&format!("(?i){pattern}"))?)
}
