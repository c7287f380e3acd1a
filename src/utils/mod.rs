pub mod prompt;

use std::path::PathBuf;

use which::which;

/// Looks up each tool on `PATH` and returns the ones that are missing.
pub fn missing_tools<'a>(tools: &[&'a str]) -> Vec<&'a str> {
    tools
        .iter()
        .copied()
        .filter(|tool| find_executable(tool).is_none())
        .collect()
}

pub fn find_executable(tool: &str) -> Option<PathBuf> {
    which(tool).ok()
}
