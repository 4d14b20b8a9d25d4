//! Remote source of the book list.

use std::time::Duration;

use async_trait::async_trait;
use shelf_kernel::settings::CatalogSettings;

use super::catalog::CatalogError;
use super::models::BookRecord;

/// Anything that can produce the complete, ordered book list.
#[async_trait]
pub trait BookSource: Send + Sync {
    async fn fetch(&self) -> Result<Vec<BookRecord>, CatalogError>;

    /// Human-readable location used in logs.
    fn describe(&self) -> String;
}

/// Fetches the book list as a JSON array over HTTP(S).
pub struct HttpBookSource {
    client: reqwest::Client,
    url: String,
    timeout: Duration,
}

impl HttpBookSource {
    pub fn new(settings: &CatalogSettings) -> anyhow::Result<Self> {
        let timeout = Duration::from_millis(settings.fetch_timeout_ms);
        let client = reqwest::Client::builder()
            .user_agent(&settings.user_agent)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            url: settings.source_url.clone(),
            timeout,
        })
    }

    fn unavailable(&self, err: reqwest::Error) -> CatalogError {
        let reason = if err.is_timeout() {
            format!("timed out after {}ms", self.timeout.as_millis())
        } else if err.is_decode() {
            format!("response is not a book list: {}", err)
        } else {
            err.to_string()
        };

        CatalogError::SourceUnavailable { reason }
    }
}

#[async_trait]
impl BookSource for HttpBookSource {
    async fn fetch(&self) -> Result<Vec<BookRecord>, CatalogError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| self.unavailable(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::SourceUnavailable {
                reason: format!("source answered with status {}", status),
            });
        }

        response
            .json::<Vec<BookRecord>>()
            .await
            .map_err(|e| self.unavailable(e))
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}
