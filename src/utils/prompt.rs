// remote2local/src/utils/prompt.rs
use std::io::{stdin, stdout, Write};

use crate::errors::{AppError, Result};

/// Source of interactive answers: passwords and other values the user types.
pub trait SecretProvider {
    /// Reads a value without echoing it.
    fn secret(&self, prompt: &str) -> Result<String>;
    /// Reads a visible line.
    fn line(&self, prompt: &str) -> Result<String>;
}

/// Reads from the controlling terminal.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalPrompt;

impl SecretProvider for TerminalPrompt {
    fn secret(&self, prompt: &str) -> Result<String> {
        rpassword::prompt_password(prompt)
            .map_err(|e| AppError::Prompt(format!("failed to read hidden input: {}", e)))
    }

    fn line(&self, prompt: &str) -> Result<String> {
        print!("{}", prompt);
        stdout()
            .flush()
            .map_err(|e| AppError::Prompt(format!("failed to flush stdout: {}", e)))?;

        let mut input = String::new();
        stdin()
            .read_line(&mut input)
            .map_err(|e| AppError::Prompt(format!("failed to read user input: {}", e)))?;
        Ok(input.trim().to_string())
    }
}
