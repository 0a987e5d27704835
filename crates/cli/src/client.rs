//! API client for communicating with the estimator server

use anyhow::{bail, Context, Result};
use estimator_lib::{Estimate, RawFields};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use url::Url;

/// API client for the estimator server
pub struct ApiClient {
    client: Client,
    base_url: Url,
}

impl ApiClient {
    /// Create a new API client
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        let base_url = Url::parse(base_url).context("Invalid API URL")?;

        Ok(Self { client, base_url })
    }

    /// Request an estimate for the given raw fields
    ///
    /// A rejected record surfaces the server's user-facing message.
    pub async fn estimate(&self, fields: &RawFields) -> Result<Estimate> {
        let url = self.base_url.join("api/estimate").context("Invalid path")?;

        let response = self
            .client
            .post(url)
            .json(fields)
            .send()
            .await
            .context("Failed to send request")?;

        let status = response.status();
        if status == StatusCode::UNPROCESSABLE_ENTITY {
            let body: ErrorResponse = response
                .json()
                .await
                .context("Failed to parse error response")?;
            bail!("{}", body.error);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("API error ({}): {}", status, body);
        }

        response.json().await.context("Failed to parse response")
    }
}

/// Body of a rejected `/api/estimate` request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}
