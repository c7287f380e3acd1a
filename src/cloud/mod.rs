// remote2local/src/cloud/mod.rs
pub(crate) mod client;
pub(crate) mod models;
pub(crate) mod select;

use reqwest::Method;
use serde_json::json;

use crate::config::HttpSettings;
use crate::errors::{AppError, Result};
use client::ApiClient;
use models::{AccessToken, Backup, DownloadLink, DownloadToken, Environment, Listing};

const LOGIN: &str = "/v3/authn/access_token";
const ENVIRONMENTS: &str = "/v3/environments";
const BACKUPS: &str = "/v3/backups";
const DISTRIBUTIONS: &str = "/v3/distributions";

/// Typed operations of the cloud API.
#[derive(Debug, Clone)]
pub struct CloudApi {
    client: ApiClient,
}

impl CloudApi {
    pub fn new(base_url: &str, settings: &HttpSettings) -> Result<Self> {
        Ok(CloudApi {
            client: ApiClient::new(base_url, settings)?,
        })
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    /// Exchanges username and password for a session token.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<String> {
        let body = json!({ "username": username, "password": password });
        let response = self
            .client
            .call(Method::POST, LOGIN, None, Some(&body), &[200])
            .await
            .map_err(|e| match e {
                AppError::Api { status, body } if status == 401 || status == 403 => {
                    AppError::Auth { status, body }
                }
                other => other,
            })?;
        Ok(response.json::<AccessToken>()?.access_token)
    }

    pub async fn list_environments(&self, token: &str) -> Result<Vec<Environment>> {
        let response = self
            .client
            .call(Method::GET, ENVIRONMENTS, Some(token), None, &[200])
            .await?;
        Ok(response.json::<Listing<Environment>>()?.into_items())
    }

    pub async fn list_backups(&self, token: &str) -> Result<Vec<Backup>> {
        let response = self
            .client
            .call(Method::GET, BACKUPS, Some(token), None, &[200])
            .await?;
        Ok(response.json::<Listing<Backup>>()?.into_items())
    }

    /// One-shot URL the backup can be fetched from.
    pub async fn backup_download_link(&self, token: &str, backup_id: &str) -> Result<String> {
        let path = format!("{}/{}/repositorydownloadlink", BACKUPS, backup_id);
        let response = self
            .client
            .call(Method::GET, &path, Some(token), None, &[200, 202])
            .await?;
        Ok(response.json::<DownloadLink>()?.url)
    }

    pub async fn distribution_download_token(
        &self,
        token: &str,
        distribution_id: &str,
    ) -> Result<String> {
        let path = format!("{}/{}/download-token", DISTRIBUTIONS, distribution_id);
        let response = self
            .client
            .call(Method::POST, &path, Some(token), None, &[200, 202])
            .await?;
        Ok(response.json::<DownloadToken>()?.token)
    }

    /// Download URL for a distribution token. The token is the credential, so
    /// the request carries no bearer header.
    pub fn distribution_download_url(&self, download_token: &str) -> String {
        self.client
            .endpoint(&format!("{}/download/{}", DISTRIBUTIONS, download_token))
    }
}
