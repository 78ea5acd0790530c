use thiserror::Error;

/// Errors returned while fetching or decoding a provider's inventory.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// HTTP 429; `retry_after_secs` carries the `Retry-After` header when
    /// the provider sent one in delta-seconds form.
    #[error("rate limited by {url}")]
    RateLimited {
        url: String,
        retry_after_secs: Option<u64>,
    },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    /// The response body does not match the provider's documented shape.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid provider endpoint \"{url}\": {reason}")]
    InvalidEndpoint { url: String, reason: String },
}
