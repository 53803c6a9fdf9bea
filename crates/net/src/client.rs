//! HTTP client with connection pooling and optional retries

use reqwest::{Client, Response, StatusCode};
use std::time::Duration;
use tap_config::NetworkConfig;
use tap_errors::{Error, NetworkError};
use tracing::{debug, warn};

/// Network client configuration
#[derive(Debug, Clone)]
pub struct NetConfig {
    pub timeout: Duration,
    pub connect_timeout: Duration,
    pub pool_idle_timeout: Duration,
    pub retry_count: u32,
    pub retry_delay: Duration,
    pub user_agent: String,
}

impl Default for NetConfig {
    fn default() -> Self {
        Self::from(&NetworkConfig::default())
    }
}

impl From<&NetworkConfig> for NetConfig {
    fn from(config: &NetworkConfig) -> Self {
        Self {
            timeout: config.timeout(),
            connect_timeout: config.connect_timeout(),
            pool_idle_timeout: Duration::from_secs(90),
            retry_count: config.retries,
            retry_delay: config.retry_delay(),
            user_agent: config
                .user_agent
                .clone()
                .unwrap_or_else(|| format!("tap/{}", env!("CARGO_PKG_VERSION"))),
        }
    }
}

/// HTTP client wrapper with retry logic
#[derive(Clone)]
pub struct NetClient {
    client: Client,
    config: NetConfig,
}

impl NetClient {
    /// Create a new network client
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying reqwest client fails to initialize.
    pub fn new(config: NetConfig) -> Result<Self, Error> {
        let client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .pool_idle_timeout(config.pool_idle_timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| NetworkError::ConnectionRefused(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// Create with default configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created with default settings.
    pub fn with_defaults() -> Result<Self, Error> {
        Self::new(NetConfig::default())
    }

    /// Execute a GET request, retrying transport failures and 5xx responses
    /// up to `retry_count` times
    ///
    /// The last 5xx response is returned as-is once retries are exhausted.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails after all attempts, or the
    /// server answers 429 with a `retry-after` header.
    pub async fn get(&self, url: &str) -> Result<Response, Error> {
        self.retry_request(url, || self.client.get(url).send()).await
    }

    async fn retry_request<F, Fut>(&self, url: &str, mut f: F) -> Result<Response, Error>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<Response, reqwest::Error>>,
    {
        let mut attempt = 0;

        loop {
            if attempt > 0 {
                tokio::time::sleep(self.config.retry_delay * attempt).await;
            }

            match f().await {
                Ok(response) => {
                    if response.status() == StatusCode::TOO_MANY_REQUESTS {
                        if let Some(retry_after) = response
                            .headers()
                            .get("retry-after")
                            .and_then(|v| v.to_str().ok())
                            .and_then(|s| s.parse::<u64>().ok())
                        {
                            return Err(NetworkError::RateLimited {
                                seconds: retry_after,
                            }
                            .into());
                        }
                    }

                    if response.status().is_server_error() && attempt < self.config.retry_count {
                        warn!(url, attempt, status = %response.status(), "server error, retrying");
                        attempt += 1;
                        continue;
                    }

                    return Ok(response);
                }
                Err(e) if attempt < self.config.retry_count && Self::should_retry(&e) => {
                    warn!(url, attempt, error = %e, "request failed, retrying");
                    attempt += 1;
                }
                Err(e) => {
                    debug!(url, attempt, error = %e, "request failed");
                    return Err(Self::convert_error(url, &e));
                }
            }
        }
    }

    fn convert_error(url: &str, e: &reqwest::Error) -> Error {
        if e.is_timeout() {
            NetworkError::Timeout {
                url: url.to_string(),
            }
            .into()
        } else if e.is_connect() {
            NetworkError::ConnectionRefused(e.to_string()).into()
        } else {
            NetworkError::DownloadFailed(e.to_string()).into()
        }
    }

    /// Determine if an error should be retried
    fn should_retry(error: &reqwest::Error) -> bool {
        error.is_timeout()
            || error.is_connect()
            || error.status().is_none_or(|s| s.is_server_error())
    }
}
