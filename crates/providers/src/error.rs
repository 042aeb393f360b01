/// Errors from the external provider clients.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The provider returned a non-2xx status code.
    #[error("{provider} API error ({status}): {body}")]
    Api {
        provider: &'static str,
        status: u16,
        body: String,
    },

    /// The credential for this call is not configured.
    #[error("{0} not configured")]
    MissingCredential(&'static str),

    /// The provider answered 2xx but the body is not what we expect.
    #[error("invalid provider response: {0}")]
    InvalidResponse(String),
}
