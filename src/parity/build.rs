// remote2local/src/parity/build.rs
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::info;
use which::which;

use crate::errors::{AppError, Result};

/// One invocation of the local build tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildStep {
    CleanInstall,
    /// Packaging run with the given profile, e.g. `-Pdist`.
    Package { profile: String },
}

impl BuildStep {
    pub fn args(&self) -> Vec<String> {
        match self {
            BuildStep::CleanInstall => vec!["clean".to_string(), "install".to_string()],
            BuildStep::Package { profile } => vec![format!("-P{}", profile)],
        }
    }
}

pub trait BuildTool {
    fn run(&self, step: &BuildStep) -> Result<()>;
}

/// Runs the build tool as a child process in the project directory, with the
/// terminal's stdin/stdout/stderr.
#[derive(Debug, Clone)]
pub struct CommandBuild {
    tool: String,
    project_dir: PathBuf,
}

impl CommandBuild {
    pub fn new(tool: &str, project_dir: &Path) -> Self {
        CommandBuild {
            tool: tool.to_string(),
            project_dir: project_dir.to_path_buf(),
        }
    }

    fn find_executable(&self) -> Result<PathBuf> {
        which(&self.tool).map_err(|_| {
            AppError::Build(format!(
                "{} executable not found in PATH. Please ensure the build tool is installed.",
                self.tool
            ))
        })
    }
}

impl BuildTool for CommandBuild {
    fn run(&self, step: &BuildStep) -> Result<()> {
        let executable = self.find_executable()?;
        let args = step.args();
        println!("Running {} {} in {}", self.tool, args.join(" "), self.project_dir.display());
        info!(tool = %executable.display(), ?args, "starting build step");

        let status = Command::new(&executable)
            .args(&args)
            .current_dir(&self.project_dir)
            .status()
            .map_err(|e| {
                AppError::Build(format!("failed to launch {} {}: {}", self.tool, args.join(" "), e))
            })?;

        if !status.success() {
            return Err(AppError::Build(format!(
                "{} {} exited with {}",
                self.tool,
                args.join(" "),
                status
            )));
        }
        println!("✓ {} {} finished", self.tool, args.join(" "));
        Ok(())
    }
}
