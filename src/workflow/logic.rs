// remote2local/src/workflow/logic.rs
use std::path::Path;

use tracing::info;

use super::{CloneOutcome, Stage, Toolchain};
use crate::cloud::{select, CloudApi};
use crate::config::CloneConfig;
use crate::errors::Result;
use crate::parity;
use crate::restore;
use crate::transfer;

/// One clone run: the remote calls, both downloads, the parity gate and the
/// load.
pub struct CloneWorkflow<'a> {
    config: &'a CloneConfig,
    api: CloudApi,
    tools: Toolchain<'a>,
    stages: Vec<Stage>,
}

impl<'a> CloneWorkflow<'a> {
    pub fn new(config: &'a CloneConfig, tools: Toolchain<'a>) -> Result<Self> {
        Ok(CloneWorkflow {
            config,
            api: CloudApi::new(&config.api_base_url, &config.http)?,
            tools,
            stages: Vec::new(),
        })
    }

    /// Stages reached so far, in order.
    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    fn advance(&mut self, stage: Stage) {
        info!(?stage, "clone workflow advanced");
        self.stages.push(stage);
    }

    /// Runs the whole workflow. Any failing step aborts the run; files already
    /// downloaded stay on disk.
    pub async fn run(&mut self) -> Result<CloneOutcome> {
        let config = self.config;
        let credentials = &config.credentials;
        let work_dir = config.work_dir.as_path();
        let idle_timeout = config.http.download_idle_timeout;
        self.advance(Stage::Start);

        println!(
            "🔑 Authenticating '{}' against {}",
            credentials.username, config.api_base_url
        );
        let token = self
            .api
            .authenticate(&credentials.username, &credentials.password)
            .await?;
        self.advance(Stage::Authenticated);

        let environments = self.api.list_environments(&token).await?;
        let environment = select::resolve_environment(&environments, &credentials.environment)?.clone();
        println!(
            "✓ Environment '{}' is {} (distribution {})",
            environment.name, environment.id, environment.distribution_id
        );
        self.advance(Stage::EnvironmentResolved);

        let backups = self.api.list_backups(&token).await?;
        let backup_id = select::most_recent_backup_id(&backups, &environment.id)?;
        println!("✓ Most recent backup is {}", backup_id);
        self.advance(Stage::BackupSelected);

        let backup_link = self.api.backup_download_link(&token, &backup_id).await?;
        let backup_path = transfer::download_to_file(
            self.api.client().http(),
            &backup_link,
            work_dir,
            &config.backup_file_name(),
            idle_timeout,
        )
        .await?;
        self.advance(Stage::BackupDownloaded);

        let download_token = self
            .api
            .distribution_download_token(&token, &environment.distribution_id)
            .await?;
        let distribution_path = transfer::download_to_file(
            self.api.client().http(),
            &self.api.distribution_download_url(&download_token),
            work_dir,
            &config.distribution_file_name(),
            idle_timeout,
        )
        .await?;
        self.advance(Stage::DistributionDownloaded);

        let extracted_path = transfer::extract_distribution(&distribution_path, work_dir)?;
        self.advance(Stage::DistributionExtracted);

        let parity = parity::build_and_compare(
            self.tools.build,
            &config.build,
            &config.project_dir,
            &distribution_path,
        )?;
        self.advance(Stage::Built);

        if !parity {
            self.advance(Stage::ParityFail);
            println!("Your current local distribution does not match the remote.");
            println!("Inspect {} for differences.", extracted_path.display());
            self.advance(Stage::ReportedDiff);
            self.advance(Stage::Done);
            return Ok(CloneOutcome::ParityMismatch { extracted_path });
        }

        self.advance(Stage::ParityPass);
        println!("✓ Local Distribution has parity with Remote Distribution.");

        self.advance(Stage::Loading);
        restore::load_backup(self.tools.database, self.tools.prompts, &backup_path)?;
        println!("{}", loaded_message(&backup_path));
        println!(
            "To begin 'cloned' {} environment, run '{} clean install && {} -Pcargo.run'",
            credentials.environment, config.build.tool, config.build.tool
        );
        self.advance(Stage::Done);
        Ok(CloneOutcome::Cloned { backup_path })
    }
}

fn loaded_message(backup_path: &Path) -> String {
    format!("✓ Loaded {} into local database.", backup_path.display())
}
