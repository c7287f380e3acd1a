// remote2local/src/cloud/select.rs
use chrono::{DateTime, NaiveDate, NaiveDateTime};

use super::models::{Backup, Environment};
use crate::errors::{AppError, Result};

/// Finds the environment whose name equals `name`.
///
/// More than one match is refused rather than guessed at.
pub fn resolve_environment<'a>(environments: &'a [Environment], name: &str) -> Result<&'a Environment> {
    let mut matches = environments.iter().filter(|e| e.name == name);
    let first = matches
        .next()
        .ok_or_else(|| AppError::NotFound(format!("no environment named '{}'", name)))?;
    let extra = matches.count();
    if extra > 0 {
        return Err(AppError::AmbiguousEnvironment {
            name: name.to_string(),
            count: extra + 1,
        });
    }
    Ok(first)
}

/// Picks the newest backup of `environment_id`.
///
/// Recency is judged on the calendar date of `createdAt` only; backups taken
/// on the same day resolve to list order. Records without an id are skipped.
pub fn most_recent_backup_id(backups: &[Backup], environment_id: &str) -> Result<String> {
    let mut dated = Vec::new();
    for backup in backups.iter().filter(|b| b.environment_id == environment_id) {
        dated.push((created_date(&backup.created_at)?, backup));
    }

    let newest = dated
        .iter()
        .map(|(date, _)| *date)
        .max()
        .ok_or_else(|| {
            AppError::NotFound(format!("no backups for environment '{}'", environment_id))
        })?;

    dated
        .iter()
        .filter(|(date, _)| *date == newest)
        .find_map(|(_, backup)| backup.id.clone())
        .ok_or_else(|| {
            AppError::NotFound(format!(
                "newest backups of environment '{}' ({}) carry no id",
                environment_id, newest
            ))
        })
}

/// Calendar date of an API timestamp, in the offset the timestamp was written in.
pub fn created_date(raw: &str) -> Result<NaiveDate> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.date_naive());
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(ts) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(ts.date());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| AppError::InvalidRecord(format!("unrecognised createdAt timestamp '{}'", raw)))
}
