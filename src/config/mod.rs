// remote2local/src/config/mod.rs
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use url::Url;

use crate::errors::{AppError, Result};

const ENV_API_BASE_URL: &str = "R2L_API_BASE_URL";
const ENV_WORK_DIR: &str = "R2L_WORK_DIR";
const ENV_PROJECT_DIR: &str = "R2L_PROJECT_DIR";
const ENV_CONNECT_TIMEOUT: &str = "R2L_CONNECT_TIMEOUT_SECS";
const ENV_REQUEST_TIMEOUT: &str = "R2L_REQUEST_TIMEOUT_SECS";
const ENV_DOWNLOAD_IDLE_TIMEOUT: &str = "R2L_DOWNLOAD_IDLE_TIMEOUT_SECS";
const ENV_MAX_GET_ATTEMPTS: &str = "R2L_MAX_GET_ATTEMPTS";
const ENV_RETRY_BACKOFF: &str = "R2L_RETRY_BACKOFF_MS";
const ENV_BUILD_TOOL: &str = "R2L_BUILD_TOOL";
const ENV_DIST_PROFILE: &str = "R2L_DIST_PROFILE";
const ENV_DB_CLIENT: &str = "R2L_DB_CLIENT";
const ENV_DB_HOST: &str = "R2L_DB_HOST";
const ENV_DB_PROBE_USER: &str = "R2L_DB_PROBE_USER";
const ENV_COMPARE: &str = "R2L_COMPARE";

/// Name of the directory the remote distribution is unpacked into.
pub const EXTRACT_DIR_NAME: &str = "latestDist";

/// Account credentials and the environment to clone.
///
/// Lives for one run only; the password is never written anywhere and is
/// redacted from `Debug` output.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
    pub client_account: String,
    pub environment: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("client_account", &self.client_account)
            .field("environment", &self.environment)
            .finish()
    }
}

/// How the local build archive is compared against the remote distribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonMode {
    /// File type, size and mtime first, bytes only when those are inconclusive.
    Shallow,
    /// SHA-256 of both files.
    Digest,
}

impl FromStr for ComparisonMode {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "shallow" => Ok(ComparisonMode::Shallow),
            "digest" | "sha256" => Ok(ComparisonMode::Digest),
            other => Err(AppError::Config(format!(
                "{} must be 'shallow' or 'digest', got '{}'",
                ENV_COMPARE, other
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct HttpSettings {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    /// Longest wait for the next chunk of a download body.
    pub download_idle_timeout: Duration,
    pub max_get_attempts: u32,
    pub retry_backoff: Duration,
}

#[derive(Debug, Clone)]
pub struct BuildSettings {
    pub tool: String,
    pub dist_profile: String,
    /// Relative to the project directory.
    pub artifact_dir: PathBuf,
    pub comparison: ComparisonMode,
}

#[derive(Debug, Clone)]
pub struct DatabaseSettings {
    pub client: String,
    pub host: String,
    pub probe_user: String,
    pub charset: String,
}

/// Everything one clone run needs, resolved up front.
#[derive(Debug, Clone)]
pub struct CloneConfig {
    pub credentials: Credentials,
    pub api_base_url: String,
    pub work_dir: PathBuf,
    pub project_dir: PathBuf,
    pub http: HttpSettings,
    pub build: BuildSettings,
    pub database: DatabaseSettings,
}

impl CloneConfig {
    /// Builds the configuration from the process environment.
    pub fn from_env(credentials: Credentials) -> Result<Self> {
        Self::from_lookup(credentials, |key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup, applying defaults
    /// for anything unset or blank.
    pub fn from_lookup<F>(credentials: Credentials, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        validate_credentials(&credentials)?;
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_base_url = get(ENV_API_BASE_URL)
            .unwrap_or_else(|| default_api_base_url(&credentials.client_account));
        Url::parse(&api_base_url).map_err(|e| {
            AppError::Config(format!("Invalid API base URL '{}': {}", api_base_url, e))
        })?;
        let api_base_url = api_base_url.trim_end_matches('/').to_string();

        let current_dir = std::env::current_dir()?;
        let work_dir = get(ENV_WORK_DIR)
            .map(PathBuf::from)
            .unwrap_or_else(|| current_dir.clone());
        let project_dir = get(ENV_PROJECT_DIR)
            .map(PathBuf::from)
            .unwrap_or(current_dir);

        let max_get_attempts: u32 = parse_number(get(ENV_MAX_GET_ATTEMPTS), ENV_MAX_GET_ATTEMPTS, 3)?;
        if max_get_attempts == 0 {
            return Err(AppError::Config(format!(
                "{} must be at least 1",
                ENV_MAX_GET_ATTEMPTS
            )));
        }

        let http = HttpSettings {
            connect_timeout: Duration::from_secs(parse_number(
                get(ENV_CONNECT_TIMEOUT),
                ENV_CONNECT_TIMEOUT,
                10,
            )?),
            request_timeout: Duration::from_secs(parse_number(
                get(ENV_REQUEST_TIMEOUT),
                ENV_REQUEST_TIMEOUT,
                60,
            )?),
            download_idle_timeout: Duration::from_secs(parse_number(
                get(ENV_DOWNLOAD_IDLE_TIMEOUT),
                ENV_DOWNLOAD_IDLE_TIMEOUT,
                120,
            )?),
            max_get_attempts,
            retry_backoff: Duration::from_millis(parse_number(
                get(ENV_RETRY_BACKOFF),
                ENV_RETRY_BACKOFF,
                500,
            )?),
        };

        let comparison = match get(ENV_COMPARE) {
            Some(raw) => raw.parse()?,
            None => ComparisonMode::Shallow,
        };

        let build = BuildSettings {
            tool: get(ENV_BUILD_TOOL).unwrap_or_else(|| "mvn".to_string()),
            dist_profile: get(ENV_DIST_PROFILE).unwrap_or_else(|| "dist".to_string()),
            artifact_dir: PathBuf::from("target"),
            comparison,
        };

        let database = DatabaseSettings {
            client: get(ENV_DB_CLIENT).unwrap_or_else(|| "mysql".to_string()),
            host: get(ENV_DB_HOST).unwrap_or_else(|| "localhost".to_string()),
            probe_user: get(ENV_DB_PROBE_USER).unwrap_or_else(|| "root".to_string()),
            charset: "utf8".to_string(),
        };

        Ok(CloneConfig {
            credentials,
            api_base_url,
            work_dir,
            project_dir,
            http,
            build,
            database,
        })
    }

    pub fn backup_file_name(&self) -> String {
        format!(
            "{}-{}-LATESTBACKUP.gz",
            self.credentials.client_account, self.credentials.environment
        )
    }

    pub fn distribution_file_name(&self) -> String {
        format!(
            "{}-{}-LATESTDISTRIBUTION.tar.gz",
            self.credentials.client_account, self.credentials.environment
        )
    }
}

fn validate_credentials(credentials: &Credentials) -> Result<()> {
    let fields = [
        ("remote environment", &credentials.environment),
        ("client account", &credentials.client_account),
        ("username", &credentials.username),
    ];
    for (label, value) in fields {
        if value.trim().is_empty() {
            return Err(AppError::Config(format!("{} cannot be empty", label)));
        }
    }
    if credentials
        .client_account
        .contains(|c: char| !c.is_ascii_alphanumeric() && c != '-')
    {
        return Err(AppError::Config(format!(
            "client account '{}' may only contain letters, digits and '-'",
            credentials.client_account
        )));
    }
    Ok(())
}

fn default_api_base_url(client_account: &str) -> String {
    format!("https://api.{}.bloomreach.cloud", client_account)
}

fn parse_number<T: FromStr>(raw: Option<String>, key: &str, default: T) -> Result<T> {
    match raw {
        Some(value) => value.trim().parse::<T>().map_err(|_| {
            AppError::Config(format!("{} must be a non-negative integer, got '{}'", key, value))
        }),
        None => Ok(default),
    }
}

#[cfg(test)]
pub(crate) fn test_credentials() -> Credentials {
    Credentials {
        username: "admin".to_string(),
        password: "s3cret".to_string(),
        client_account: "acme".to_string(),
        environment: "staging".to_string(),
    }
}
