// remote2local/src/transfer/download.rs
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use reqwest::StatusCode;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::errors::{AppError, Result};

/// Streams `source_url` into `<dir>/<file_name>`.
///
/// Any earlier file of the same name is truncated first. A transfer that
/// fails part way leaves the partial file behind. Only `200 OK` counts as
/// success.
///
/// # Arguments
/// * `client` - HTTP client to issue the GET with (no auth header is added).
/// * `source_url` - Absolute URL of the artifact.
/// * `dir` - Directory the file is written into.
/// * `file_name` - Name of the local file.
/// * `idle_timeout` - Longest wait for the response head and for each chunk of the body.
///
/// # Returns
/// Path to the downloaded file.
pub async fn download_to_file(
    client: &reqwest::Client,
    source_url: &str,
    dir: &Path,
    file_name: &str,
    idle_timeout: Duration,
) -> Result<PathBuf> {
    let destination_path = dir.join(file_name);
    println!("Downloading {} to {}", file_name, destination_path.display());

    if !dir.exists() {
        tokio::fs::create_dir_all(dir).await?;
    }

    let mut response = tokio::time::timeout(idle_timeout, client.get(source_url).send())
        .await
        .map_err(|_| {
            AppError::Download(format!(
                "no response for {} within {:?}",
                file_name, idle_timeout
            ))
        })?
        .map_err(|e| AppError::Download(format!("request for {} failed: {}", file_name, e)))?;

    let status = response.status();
    if status != StatusCode::OK {
        let body = response.text().await.unwrap_or_default();
        return Err(AppError::Api {
            status: status.as_u16(),
            body,
        });
    }

    let total = response.content_length().filter(|len| *len > 0);
    debug!("{} announced {:?} bytes", file_name, total);

    let mut output_file = File::create(&destination_path).await?;
    let bar = progress_bar(total, file_name);

    let mut total_bytes_downloaded: u64 = 0;
    loop {
        let next = tokio::time::timeout(idle_timeout, response.chunk())
            .await
            .map_err(|_| {
                AppError::Download(format!(
                    "no data received for {} within {:?}",
                    file_name, idle_timeout
                ))
            })?
            .map_err(|e| AppError::Download(format!("transfer of {} interrupted: {}", file_name, e)))?;

        let Some(bytes_chunk) = next else { break };
        output_file.write_all(&bytes_chunk).await?;
        total_bytes_downloaded += bytes_chunk.len() as u64;
        bar.set_position(total_bytes_downloaded);
    }
    output_file.flush().await?;
    bar.finish_and_clear();

    if let Some(expected) = total {
        if expected != total_bytes_downloaded {
            return Err(AppError::Download(format!(
                "{} ended after {} of {} bytes",
                file_name, total_bytes_downloaded, expected
            )));
        }
    }

    println!(
        "✓ Downloaded {} bytes to {}",
        total_bytes_downloaded,
        destination_path.display()
    );
    Ok(destination_path)
}

fn progress_bar(total: Option<u64>, label: &str) -> ProgressBar {
    if !std::io::stderr().is_terminal() {
        return ProgressBar::hidden();
    }
    let bar = match total {
        Some(len) => {
            let bar = ProgressBar::new(len);
            bar.set_style(
                ProgressStyle::with_template(
                    "{prefix} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}, {eta})",
                )
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
            );
            bar
        }
        None => {
            let bar = ProgressBar::new_spinner();
            bar.set_style(
                ProgressStyle::with_template("{spinner:.cyan} {prefix} {bytes} ({bytes_per_sec})")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            bar.enable_steady_tick(Duration::from_millis(120));
            bar
        }
    };
    bar.set_prefix(label.to_string());
    bar
}
