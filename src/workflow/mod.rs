// remote2local/src/workflow/mod.rs
mod logic;

use std::path::PathBuf;

use crate::config::CloneConfig;
use crate::parity::BuildTool;
use crate::restore::DatabaseClient;
use crate::utils::prompt::SecretProvider;
pub use logic::CloneWorkflow;

/// Where a clone run is. Runs move strictly forward; the only fork is after
/// `Built`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Start,
    Authenticated,
    EnvironmentResolved,
    BackupSelected,
    BackupDownloaded,
    DistributionDownloaded,
    DistributionExtracted,
    Built,
    ParityPass,
    Loading,
    ParityFail,
    ReportedDiff,
    Done,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloneOutcome {
    /// Local build matched and the backup is in the local database.
    Cloned { backup_path: PathBuf },
    /// Local build differs; nothing was loaded.
    ParityMismatch { extracted_path: PathBuf },
}

/// External collaborators of a run.
pub struct Toolchain<'a> {
    pub build: &'a dyn BuildTool,
    pub database: &'a dyn DatabaseClient,
    pub prompts: &'a dyn SecretProvider,
}

/// Tools the run shells out to that are not on `PATH`.
pub fn missing_prerequisites(config: &CloneConfig) -> Vec<String> {
    let tools = [
        config.database.client.as_str(),
        "java",
        config.build.tool.as_str(),
    ];
    crate::utils::missing_tools(&tools)
        .into_iter()
        .map(str::to_string)
        .collect()
}
