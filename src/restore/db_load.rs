// remote2local/src/restore/db_load.rs
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use flate2::read::GzDecoder;
use tracing::{debug, warn};
use which::which;

use super::{DatabaseClient, LoadTarget};
use crate::config::DatabaseSettings;
use crate::errors::{AppError, Result};

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Drives the `mysql` command-line client.
#[derive(Debug, Clone)]
pub struct MysqlClient {
    settings: DatabaseSettings,
}

impl MysqlClient {
    pub fn new(settings: &DatabaseSettings) -> Self {
        MysqlClient {
            settings: settings.clone(),
        }
    }

    fn find_executable(&self) -> Result<PathBuf> {
        which(&self.settings.client).map_err(|_| {
            AppError::DatabaseLoad(format!(
                "{} executable not found in PATH. Please ensure the database client tools are installed and in your PATH.",
                self.settings.client
            ))
        })
    }
}

impl DatabaseClient for MysqlClient {
    /// Runs a no-op statement. Only a client that cannot be started counts as
    /// "not running"; a refused login is left for the load step to report.
    fn probe(&self) -> Result<()> {
        let executable = self.find_executable()?;
        let output = Command::new(&executable)
            .arg("-u")
            .arg(&self.settings.probe_user)
            .arg("-e")
            .arg("")
            .stdin(Stdio::null())
            .output()
            .map_err(|e| {
                AppError::DatabaseLoad(format!(
                    "local database does not appear to be running ({} could not be started: {})",
                    self.settings.client, e
                ))
            })?;

        if !output.status.success() {
            warn!(
                "{} probe as '{}' exited with {}: {}",
                self.settings.client,
                self.settings.probe_user,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(())
    }

    fn load(&self, backup_path: &Path, target: &LoadTarget) -> Result<()> {
        let executable = self.find_executable()?;
        println!(
            "Loading {} into database '{}' on {} ...",
            backup_path.display(),
            target.database,
            self.settings.host
        );

        let mut reader = BufReader::new(File::open(backup_path)?);
        let compressed = reader.fill_buf()?.starts_with(&GZIP_MAGIC);
        debug!(compressed, "backup format detected");

        let mut child = Command::new(&executable)
            .arg("-u")
            .arg(&target.user)
            .arg("-h")
            .arg(&self.settings.host)
            .arg(format!("--default-character-set={}", self.settings.charset))
            .arg(&target.database)
            .env("MYSQL_PWD", &target.password)
            .stdin(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                AppError::DatabaseLoad(format!("failed to start {}: {}", self.settings.client, e))
            })?;

        // Drained on its own thread so a chatty client cannot stall the copy.
        let stderr_reader = child.stderr.take().map(|mut stderr| {
            std::thread::spawn(move || {
                let mut captured = String::new();
                let _ = stderr.read_to_string(&mut captured);
                captured
            })
        });

        let copy_result = match child.stdin.take() {
            Some(mut stdin) => {
                if compressed {
                    std::io::copy(&mut GzDecoder::new(reader), &mut stdin)
                } else {
                    std::io::copy(&mut reader, &mut stdin)
                }
            }
            None => Err(std::io::Error::other("client stdin was not captured")),
        };

        let status = child.wait()?;
        let stderr = stderr_reader
            .and_then(|handle| handle.join().ok())
            .unwrap_or_default();

        if !status.success() {
            return Err(AppError::DatabaseLoad(format!(
                "{} exited with {}.\nStderr: {}",
                self.settings.client,
                status,
                stderr.trim()
            )));
        }
        if let Err(e) = copy_result {
            return Err(AppError::DatabaseLoad(format!(
                "failed to stream {} into {}: {}",
                backup_path.display(),
                self.settings.client,
                e
            )));
        }

        debug!(database = %target.database, "backup load finished");
        Ok(())
    }
}
