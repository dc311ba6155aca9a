//! Source-page retrieval: one HTTP GET with a browser-like User-Agent.
//!
//! No retry and no redirect policy beyond reqwest's defaults. A non-2xx
//! status or any transport failure is fatal for the request; the body is
//! never handed to the extractor in that case.

use crate::config::AppConfig;
use crate::error::ProdifyError;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

/// Validate that `input` is an absolute HTTP/HTTPS URL.
pub fn parse_page_url(input: &str) -> Result<Url, ProdifyError> {
    let invalid = || ProdifyError::InvalidUrl {
        input: input.to_string(),
    };
    let url = Url::parse(input.trim()).map_err(|_| invalid())?;
    match url.scheme() {
        "http" | "https" if url.host_str().is_some() => Ok(url),
        _ => Err(invalid()),
    }
}

/// Build the HTTP client used for page fetches.
pub fn build_client(config: &AppConfig) -> Result<reqwest::Client, ProdifyError> {
    let mut builder = reqwest::Client::builder().user_agent(config.user_agent.clone());
    if let Some(secs) = config.fetch_timeout_secs {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    builder
        .build()
        .map_err(|e| ProdifyError::Internal(format!("Failed to build HTTP client: {e}")))
}

/// Fetch `url` and return the response body as text.
pub async fn fetch_html(client: &reqwest::Client, url: &Url) -> Result<String, ProdifyError> {
    info!("Fetching page: {}", url);

    let response = client
        .get(url.clone())
        .send()
        .await
        .map_err(|e| ProdifyError::FetchFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let status = response.status();
    if !status.is_success() {
        return Err(ProdifyError::FetchStatus {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let body = response.text().await.map_err(|e| ProdifyError::FetchFailed {
        url: url.to_string(),
        reason: e.to_string(),
    })?;

    debug!("Fetched {} bytes from {}", body.len(), url);
    Ok(body)
}
