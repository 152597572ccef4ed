pub mod extract;

use thiserror::Error;

/// Failure of the provider boundary call. Any of these means the search
/// produced no records.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("no API key configured for provider {0}")]
    MissingApiKey(String),

    #[error("unknown LLM provider: {0}")]
    UnknownProvider(String),

    #[error("provider request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("provider rejected credentials (HTTP {status})")]
    Auth { status: u16 },

    #[error("provider returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("malformed provider response: {0}")]
    MalformedResponse(String),

    #[error("provider returned no content")]
    EmptyResponse,
}
