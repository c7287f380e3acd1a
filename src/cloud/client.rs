// remote2local/src/cloud/client.rs
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use backoff::future::retry_notify;
use backoff::{Error as BackoffError, ExponentialBackoffBuilder};
use reqwest::Method;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::config::HttpSettings;
use crate::errors::{AppError, Result};

/// Response of a successful call: the status plus the body, parsed as JSON
/// when it is JSON and kept as text otherwise.
#[derive(Debug)]
pub struct ApiResponse {
    pub status: u16,
    pub body: ResponseBody,
}

#[derive(Debug)]
pub enum ResponseBody {
    Json(serde_json::Value),
    Text(String),
}

impl ApiResponse {
    pub fn json<T: DeserializeOwned>(self) -> Result<T> {
        match self.body {
            ResponseBody::Json(value) => serde_json::from_value(value)
                .map_err(|e| AppError::InvalidRecord(format!("unexpected response shape: {}", e))),
            ResponseBody::Text(text) => Err(AppError::Api {
                status: self.status,
                body: text,
            }),
        }
    }
}

/// Thin wrapper over `reqwest` that knows the API base URL, attaches bearer
/// tokens and turns unexpected statuses into `AppError::Api`.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    settings: HttpSettings,
}

impl ApiClient {
    pub fn new(base_url: &str, settings: &HttpSettings) -> Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .build()?;
        Ok(ApiClient {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            settings: settings.clone(),
        })
    }

    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Issues one API call.
    ///
    /// # Arguments
    /// * `method` - HTTP method; only GETs are retried.
    /// * `path` - Path below the base URL, starting with `/`.
    /// * `token` - Bearer token, if the endpoint needs one.
    /// * `body` - JSON request body.
    /// * `accepted` - Status codes that count as success for this operation.
    pub async fn call(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
        body: Option<&serde_json::Value>,
        accepted: &[u16],
    ) -> Result<ApiResponse> {
        let url = self.endpoint(path);
        let attempts = if method == Method::GET {
            self.settings.max_get_attempts.max(1)
        } else {
            1
        };

        let backoff = ExponentialBackoffBuilder::new()
            .with_initial_interval(self.settings.retry_backoff)
            .with_multiplier(2.0)
            .with_randomization_factor(0.0)
            .with_max_elapsed_time(None)
            .build();
        let attempt_counter = AtomicU32::new(0);
        let attempt_counter = &attempt_counter;
        let method = &method;
        let url = url.as_str();

        retry_notify(
            backoff,
            || async move {
                let attempt = attempt_counter.fetch_add(1, Ordering::Relaxed) + 1;
                self.send_once(method.clone(), url, token, body, accepted)
                    .await
                    .map_err(|e| {
                        if attempt < attempts && e.is_transient() {
                            BackoffError::transient(e)
                        } else {
                            BackoffError::permanent(e)
                        }
                    })
            },
            |e: AppError, delay: Duration| {
                warn!(
                    "{} {} failed (attempt {}/{}), retrying in {:?}: {}",
                    method,
                    path,
                    attempt_counter.load(Ordering::Relaxed),
                    attempts,
                    delay,
                    e
                );
            },
        )
        .await
    }

    async fn send_once(
        &self,
        method: Method,
        url: &str,
        token: Option<&str>,
        body: Option<&serde_json::Value>,
        accepted: &[u16],
    ) -> Result<ApiResponse> {
        let mut request = self
            .http
            .request(method.clone(), url)
            .timeout(self.settings.request_timeout);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        let text = response.text().await?;
        debug!("{} {} -> {}", method, url, status);

        if !accepted.contains(&status) {
            return Err(AppError::Api { status, body: text });
        }

        let body = match serde_json::from_str(&text) {
            Ok(value) => ResponseBody::Json(value),
            Err(_) => ResponseBody::Text(text),
        };
        Ok(ApiResponse { status, body })
    }
}

#[cfg(test)]
pub(crate) fn test_http_settings() -> HttpSettings {
    use std::time::Duration;

    HttpSettings {
        connect_timeout: Duration::from_secs(5),
        request_timeout: Duration::from_secs(5),
        download_idle_timeout: Duration::from_secs(5),
        max_get_attempts: 3,
        retry_backoff: Duration::from_millis(10),
    }
}
