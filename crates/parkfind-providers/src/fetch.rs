//! Low-level HTTP helpers shared by the provider clients.

use reqwest::{Client, StatusCode, Url};

use crate::error::ProviderError;

/// GET `url` and return the body text.
///
/// Maps 429 to [`ProviderError::RateLimited`] and any other non-2xx status
/// to [`ProviderError::UnexpectedStatus`]. The body may be empty.
pub(crate) async fn fetch_body(client: &Client, url: &str) -> Result<String, ProviderError> {
    let parsed = Url::parse(url).map_err(|e| ProviderError::InvalidEndpoint {
        url: url.to_owned(),
        reason: e.to_string(),
    })?;

    let response = client
        .get(parsed)
        .header(reqwest::header::ACCEPT, "application/json")
        .send()
        .await?;

    let status = response.status();
    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after_secs = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok());
        return Err(ProviderError::RateLimited {
            url: url.to_owned(),
            retry_after_secs,
        });
    }
    if !status.is_success() {
        return Err(ProviderError::UnexpectedStatus {
            status: status.as_u16(),
            url: url.to_owned(),
        });
    }

    Ok(response.text().await?)
}
