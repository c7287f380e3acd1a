// remote2local/src/transfer/archive.rs
use std::fs::File;
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use tar::Archive;

use crate::config::EXTRACT_DIR_NAME;
use crate::errors::{AppError, Result};

/// Extracts a gzipped tar archive into `<destination_dir>/latestDist`.
///
/// A previous extraction at that location is removed first so stale files
/// from an older distribution never mix with the new one. Archive contents are
/// trusted as-is.
///
/// # Arguments
/// * `archive_path` - Path to the `.tar.gz` archive file.
/// * `destination_dir` - Directory that receives the `latestDist` folder.
///
/// # Returns
/// Path to the directory where files were extracted.
pub fn extract_distribution(archive_path: &Path, destination_dir: &Path) -> Result<PathBuf> {
    if !archive_path.is_file() {
        return Err(AppError::Extraction(format!(
            "archive for extraction is not a file: {}",
            archive_path.display()
        )));
    }

    let extract_to_dir = destination_dir.join(EXTRACT_DIR_NAME);
    if extract_to_dir.exists() {
        if !extract_to_dir.is_dir() {
            return Err(AppError::Extraction(format!(
                "extraction path exists but is not a directory: {}",
                extract_to_dir.display()
            )));
        }
        std::fs::remove_dir_all(&extract_to_dir)?;
    }
    std::fs::create_dir_all(&extract_to_dir)?;

    println!(
        "Extracting {} to {}",
        archive_path.display(),
        extract_to_dir.display()
    );

    let archive_file = File::open(archive_path)?;
    let mut archive = Archive::new(GzDecoder::new(archive_file));
    archive.unpack(&extract_to_dir).map_err(|e| {
        AppError::Extraction(format!(
            "failed to unpack {} to {}: {}",
            archive_path.display(),
            extract_to_dir.display(),
            e
        ))
    })?;

    println!("✓ Distribution extracted to {}", extract_to_dir.display());
    Ok(extract_to_dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;

    fn write_archive(path: &Path, files: &[(&str, &str)]) -> anyhow::Result<()> {
        let encoder = GzEncoder::new(File::create(path)?, Compression::default());
        let mut builder = tar::Builder::new(encoder);
        for (name, contents) in files {
            let mut header = tar::Header::new_gnu();
            header.set_size(contents.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder.append_data(&mut header, name, contents.as_bytes())?;
        }
        builder.into_inner()?.finish()?;
        Ok(())
    }

    #[test]
    fn test_extracts_into_latest_dist() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let archive = dir.path().join("dist.tar.gz");
        write_archive(
            &archive,
            &[
                ("webapps/cms.war", "cms"),
                ("conf/context.xml", "<Context/>"),
            ],
        )?;

        let extracted = extract_distribution(&archive, dir.path())?;

        assert_eq!(extracted, dir.path().join("latestDist"));
        assert_eq!(std::fs::read(extracted.join("webapps/cms.war"))?, b"cms");
        assert_eq!(std::fs::read(extracted.join("conf/context.xml"))?, b"<Context/>");
        Ok(())
    }

    #[test]
    fn test_reextraction_drops_stale_files() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let archive = dir.path().join("dist.tar.gz");
        write_archive(&archive, &[("webapps/site.war", "v1")])?;
        let stale = dir.path().join("latestDist/webapps/old.war");
        std::fs::create_dir_all(stale.parent().expect("has parent"))?;
        std::fs::write(&stale, b"old")?;

        let extracted = extract_distribution(&archive, dir.path())?;

        assert!(!stale.exists());
        assert_eq!(std::fs::read(extracted.join("webapps/site.war"))?, b"v1");
        Ok(())
    }

    #[test]
    fn test_malformed_archive_is_extraction_error() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let archive = dir.path().join("broken.tar.gz");
        std::fs::write(&archive, b"this is not gzip at all")?;

        let err = extract_distribution(&archive, dir.path()).expect_err("not an archive");
        assert!(matches!(err, AppError::Extraction(_)));
        Ok(())
    }

    #[test]
    fn test_missing_archive_is_extraction_error() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let err = extract_distribution(&dir.path().join("absent.tar.gz"), dir.path())
            .expect_err("no file");
        assert!(matches!(err, AppError::Extraction(_)));
        Ok(())
    }
}
