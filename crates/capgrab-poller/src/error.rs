//! Poller error types.

use capgrab_oci::ProviderError;
use thiserror::Error;

/// Errors that abort a polling cycle.
///
/// Launch failures are not errors here; they are [`AttemptOutcome`]s.
///
/// [`AttemptOutcome`]: crate::AttemptOutcome
#[derive(Debug, Error)]
pub enum PollerError {
    #[error("failed to enumerate availability zones: {0}")]
    Enumeration(#[source] ProviderError),
}

pub type PollerResult<T> = Result<T, PollerError>;
