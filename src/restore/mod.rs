// remote2local/src/restore/mod.rs
pub(crate) mod db_load; // mysql client invocation

use std::fmt;
use std::path::Path;

use crate::errors::{AppError, Result};
use crate::utils::prompt::SecretProvider;
pub use db_load::MysqlClient;

/// Where the backup goes, as typed in by the user.
#[derive(Clone)]
pub struct LoadTarget {
    pub user: String,
    pub password: String,
    pub database: String,
}

impl fmt::Debug for LoadTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadTarget")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("database", &self.database)
            .finish()
    }
}

pub trait DatabaseClient {
    /// Fails when the local database cannot be reached at all.
    fn probe(&self) -> Result<()>;
    /// Feeds the backup file to the database; a nonzero client exit is an error.
    fn load(&self, backup_path: &Path, target: &LoadTarget) -> Result<()>;
}

/// Loads a downloaded backup into the local database.
///
/// Probes the database first, then asks for the destination user, password and
/// database name.
pub fn load_backup(
    client: &dyn DatabaseClient,
    prompts: &dyn SecretProvider,
    backup_path: &Path,
) -> Result<bool> {
    if !backup_path.is_file() {
        return Err(AppError::DatabaseLoad(format!(
            "backup file not found: {}",
            backup_path.display()
        )));
    }

    client.probe()?;

    let user = prompts.line("Enter destination database user: ")?;
    let password = prompts.secret("Enter destination database password (will not be visible): ")?;
    let database = prompts.line("Enter destination database name: ")?;
    if user.is_empty() || database.is_empty() {
        return Err(AppError::DatabaseLoad(
            "destination database user and name are required".to_string(),
        ));
    }

    client.load(
        backup_path,
        &LoadTarget {
            user,
            password,
            database,
        },
    )?;
    Ok(true)
}
