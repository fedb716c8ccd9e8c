//! Stdin confirmation prompts for the execution gate.

use sp_core::{Confirmation, Gate, RiskTier};
use std::io::Write;

pub struct StdinConfirmation;

impl StdinConfirmation {
    fn ask(&self, question: &str) -> Option<String> {
        print!("{question}");
        if std::io::stdout().flush().is_err() {
            return None;
        }
        let mut line = String::new();
        match std::io::stdin().read_line(&mut line) {
            Ok(0) => None,
            Ok(_) => Some(line.trim().to_lowercase()),
            Err(_) => None,
        }
    }

    fn gate(&self, gate: Gate) -> bool {
        match gate {
            // A mere y/n is too easy to reflex through for dangerous commands.
            Gate::DangerousTyped => {
                self.ask("Are you sure you want to run this command? (type 'yes' to confirm): ")
                    .is_some_and(|answer| answer == "yes")
            }
            Gate::YesNo => self
                .ask("Execute this command? (y/n): ")
                .is_some_and(|answer| answer == "y"),
        }
    }
}

impl Confirmation for StdinConfirmation {
    fn notify_generated(&mut self, command: &str, _tier: RiskTier) {
        println!("Generated command: {command}");
    }

    fn confirm_execution(&mut self, command: &str, tier: RiskTier, gate: Gate) -> bool {
        match tier {
            RiskTier::Dangerous => {
                println!("Command blocked: potentially dangerous operation detected");
                println!("  {command}");
            }
            RiskTier::Risky => {
                println!("Risky command detected - requires confirmation");
            }
            RiskTier::Safe => {}
        }
        self.gate(gate)
    }

    fn confirm_fix(&mut self, command: &str, tier: RiskTier, gate: Gate) -> bool {
        println!("Suggested fix ({}): {command}", tier.as_str());
        match gate {
            Gate::DangerousTyped => self.gate(gate),
            Gate::YesNo => self
                .ask("Try the fixed command? (y/n): ")
                .is_some_and(|answer| answer == "y"),
        }
    }
}
