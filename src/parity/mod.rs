// remote2local/src/parity/mod.rs
pub(crate) mod build;
pub(crate) mod compare;

use std::path::Path;

use tracing::info;

use crate::config::BuildSettings;
use crate::errors::Result;
pub use build::{BuildStep, BuildTool, CommandBuild};

/// Builds the local project and checks its distribution archive against the
/// downloaded remote one.
///
/// Either build step failing is fatal. Returns whether the archives match.
///
/// # Arguments
/// * `tool` - Runs the build steps.
/// * `settings` - Packaging profile, output directory and comparison mode.
/// * `project_dir` - Root of the local project.
/// * `remote_distribution` - The downloaded remote distribution archive.
pub fn build_and_compare(
    tool: &dyn BuildTool,
    settings: &BuildSettings,
    project_dir: &Path,
    remote_distribution: &Path,
) -> Result<bool> {
    tool.run(&BuildStep::CleanInstall)?;
    tool.run(&BuildStep::Package {
        profile: settings.dist_profile.clone(),
    })?;

    let local_archive = compare::locate_local_archive(&project_dir.join(&settings.artifact_dir))?;
    println!(
        "Comparing {} with {} ({:?})",
        local_archive.display(),
        remote_distribution.display(),
        settings.comparison
    );
    let parity = compare::files_match(&local_archive, remote_distribution, settings.comparison)?;
    info!(parity, local = %local_archive.display(), "distribution comparison finished");
    Ok(parity)
}


#[cfg(test)]
mod tests {
    use super::fakes::FakeBuild;
    use super::*;
    use crate::config::ComparisonMode;
    use crate::errors::AppError;
    use std::path::PathBuf;

    fn settings(mode: ComparisonMode) -> BuildSettings {
        BuildSettings {
            tool: "mvn".to_string(),
            dist_profile: "dist".to_string(),
            artifact_dir: PathBuf::from("target"),
            comparison: mode,
        }
    }

    #[test]
    fn test_matching_build_has_parity() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let remote = dir.path().join("remote.tar.gz");
        std::fs::write(&remote, b"distribution-bytes")?;
        let tool = FakeBuild::producing(
            dir.path().join("target/site-distribution.tar.gz"),
            b"distribution-bytes".to_vec(),
        );

        assert!(build_and_compare(&tool, &settings(ComparisonMode::Shallow), dir.path(), &remote)?);
        assert_eq!(
            *tool.steps.borrow(),
            vec![
                BuildStep::CleanInstall,
                BuildStep::Package {
                    profile: "dist".to_string()
                }
            ]
        );
        Ok(())
    }

    #[test]
    fn test_size_mismatch_has_no_parity() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let remote = dir.path().join("remote.tar.gz");
        std::fs::write(&remote, b"remote distribution")?;
        let tool = FakeBuild::producing(
            dir.path().join("target/site-distribution.tar.gz"),
            b"local".to_vec(),
        );

        assert!(!build_and_compare(&tool, &settings(ComparisonMode::Digest), dir.path(), &remote)?);
        Ok(())
    }

    #[test]
    fn test_failed_install_stops_before_packaging() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let remote = dir.path().join("remote.tar.gz");
        std::fs::write(&remote, b"x")?;
        let tool = FakeBuild::failing_on(BuildStep::CleanInstall);

        let err = build_and_compare(&tool, &settings(ComparisonMode::Shallow), dir.path(), &remote)
            .expect_err("install fails");

        assert!(matches!(err, AppError::Build(_)));
        assert_eq!(tool.steps.borrow().len(), 1);
        Ok(())
    }

    #[test]
    fn test_build_without_archive_is_error() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let remote = dir.path().join("remote.tar.gz");
        std::fs::write(&remote, b"x")?;
        let tool = FakeBuild::producing(dir.path().join("target/site.jar"), b"jar".to_vec());

        let err = build_and_compare(&tool, &settings(ComparisonMode::Shallow), dir.path(), &remote)
            .expect_err("no tarball");
        assert!(matches!(err, AppError::Build(_)));
        Ok(())
    }
}
