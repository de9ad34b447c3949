//! OCI client error types.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for provider calls.
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Failure of a single provider call.
///
/// `Service` means the cloud answered and rejected the request; `Transport`
/// means we never got a classified answer (network, timeout, bad body).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    #[error("service error:{code} (http {status}, opc-request-id {request_id}): {message}")]
    Service {
        status: u16,
        code: String,
        message: String,
        request_id: String,
    },

    #[error("transport error: {0}")]
    Transport(String),
}

/// Errors building an [`OciClient`](crate::OciClient).
#[derive(Debug, Error)]
pub enum OciError {
    #[error("failed to read private key {path}: {source}")]
    KeyRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid private key: {0}")]
    InvalidKey(String),

    #[error("invalid endpoint {url}: {reason}")]
    InvalidEndpoint { url: String, reason: String },

    #[error("request signing failed: {0}")]
    Signing(String),

    #[error("failed to build http client: {0}")]
    Http(#[from] reqwest::Error),
}
