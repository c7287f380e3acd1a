// remote2local/src/parity/compare.rs
use std::fs::{self, File};
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use sha2::{Digest, Sha256};
use tracing::debug;
use walkdir::WalkDir;

use crate::config::ComparisonMode;
use crate::errors::{AppError, Result};

const ARCHIVE_SUFFIX: &str = ".tar.gz";

/// Finds the build's distribution archive: a `*.tar.gz` directly inside
/// `artifact_dir`. When several exist the most recently modified wins.
pub fn locate_local_archive(artifact_dir: &Path) -> Result<PathBuf> {
    if !artifact_dir.is_dir() {
        return Err(AppError::Build(format!(
            "build output directory not found: {}",
            artifact_dir.display()
        )));
    }

    let mut newest: Option<(SystemTime, PathBuf)> = None;
    for entry in WalkDir::new(artifact_dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|e| {
            AppError::Build(format!("failed to scan {}: {}", artifact_dir.display(), e))
        })?;
        let is_archive = entry.file_type().is_file()
            && entry.file_name().to_string_lossy().ends_with(ARCHIVE_SUFFIX);
        if !is_archive {
            continue;
        }
        let modified = entry
            .metadata()
            .map_err(|e| AppError::Build(format!("failed to stat {}: {}", entry.path().display(), e)))?
            .modified()?;
        if newest.as_ref().map_or(true, |(seen, _)| modified > *seen) {
            newest = Some((modified, entry.into_path()));
        }
    }

    newest.map(|(_, path)| path).ok_or_else(|| {
        AppError::Build(format!(
            "no *{} archive produced under {}",
            ARCHIVE_SUFFIX,
            artifact_dir.display()
        ))
    })
}

pub fn files_match(local: &Path, remote: &Path, mode: ComparisonMode) -> Result<bool> {
    match mode {
        ComparisonMode::Shallow => shallow_equal(local, remote),
        ComparisonMode::Digest => digest_equal(local, remote),
    }
}

/// Equal when both are regular files with the same size and mtime. Different
/// sizes are unequal; same size with different mtimes falls back to bytes.
pub fn shallow_equal(a: &Path, b: &Path) -> Result<bool> {
    let meta_a = fs::metadata(a)?;
    let meta_b = fs::metadata(b)?;

    if !meta_a.is_file() || !meta_b.is_file() {
        return Ok(false);
    }
    if meta_a.len() != meta_b.len() {
        debug!("size differs: {} vs {}", meta_a.len(), meta_b.len());
        return Ok(false);
    }
    if meta_a.modified()? == meta_b.modified()? {
        return Ok(true);
    }
    bytes_equal(a, b)
}

pub fn digest_equal(a: &Path, b: &Path) -> Result<bool> {
    let digest_a = sha256_hex(a)?;
    let digest_b = sha256_hex(b)?;
    debug!("sha256 {} = {}, {} = {}", a.display(), digest_a, b.display(), digest_b);
    Ok(digest_a == digest_b)
}

pub fn sha256_hex(path: &Path) -> Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    std::io::copy(&mut file, &mut hasher)?;
    Ok(hex::encode(hasher.finalize()))
}

fn bytes_equal(a: &Path, b: &Path) -> Result<bool> {
    let mut reader_a = BufReader::new(File::open(a)?);
    let mut reader_b = BufReader::new(File::open(b)?);
    let mut buf_a = [0u8; 8192];
    let mut buf_b = [0u8; 8192];
    loop {
        let n_a = fill(&mut reader_a, &mut buf_a)?;
        let n_b = fill(&mut reader_b, &mut buf_b)?;
        if n_a != n_b || buf_a[..n_a] != buf_b[..n_b] {
            return Ok(false);
        }
        if n_a == 0 {
            return Ok(true);
        }
    }
}

fn fill<R: Read>(reader: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        let n = reader.read(&mut buf[filled..])?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}
