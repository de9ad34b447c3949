//! Launch attempt classification.
//!
//! The provider only reports capacity and throttling through message
//! text, so both are matched by substring. These patterns live here and
//! nowhere else.

use capgrab_core::LaunchedInstance;
use capgrab_oci::{ProviderError, ProviderResult};

/// Substring of the error text when a zone has no free hosts.
pub const OUT_OF_HOST_CAPACITY: &str = "Out of host capacity";

/// Substring of the error text when the API throttles us.
pub const TOO_MANY_REQUESTS: &str = "error:TooManyRequests";

/// Result of one launch attempt in one zone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// The instance was created. Terminal for the whole run.
    Launched(LaunchedInstance),
    /// No host capacity in this zone right now.
    CapacityExhausted { detail: String },
    /// The API asked us to slow down.
    RateLimited { detail: String },
    /// Any other error classified by the provider.
    OtherProviderError {
        status: u16,
        code: String,
        message: String,
        request_id: String,
    },
    /// The call never produced a provider answer.
    TransportError { detail: String },
}

impl AttemptOutcome {
    /// Short label, logged as the `outcome` field.
    pub fn kind(&self) -> &'static str {
        match self {
            AttemptOutcome::Launched(_) => "launched",
            AttemptOutcome::CapacityExhausted { .. } => "capacity_exhausted",
            AttemptOutcome::RateLimited { .. } => "rate_limited",
            AttemptOutcome::OtherProviderError { .. } => "provider_error",
            AttemptOutcome::TransportError { .. } => "transport_error",
        }
    }
}

/// Classify the result of a launch call.
///
/// Success is checked first and short-circuits everything else. Among
/// failures, capacity wins over throttling, then the provider/transport
/// split decides.
pub fn classify(result: ProviderResult<LaunchedInstance>) -> AttemptOutcome {
    let err = match result {
        Ok(instance) => return AttemptOutcome::Launched(instance),
        Err(err) => err,
    };

    let text = err.to_string();
    if text.contains(OUT_OF_HOST_CAPACITY) {
        return AttemptOutcome::CapacityExhausted { detail: text };
    }
    if text.contains(TOO_MANY_REQUESTS) {
        return AttemptOutcome::RateLimited { detail: text };
    }

    match err {
        ProviderError::Service {
            status,
            code,
            message,
            request_id,
        } => AttemptOutcome::OtherProviderError {
            status,
            code,
            message,
            request_id,
        },
        ProviderError::Transport(detail) => AttemptOutcome::TransportError { detail },
    }
}
