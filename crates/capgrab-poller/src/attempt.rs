//! One launch attempt in one zone.

use tracing::{debug, error, info};

use capgrab_core::{AvailabilityZone, ProvisionRequest};
use capgrab_oci::ComputeProvider;

use crate::outcome::{AttemptOutcome, classify};
use crate::pacing::PacingState;

/// Try to launch `request` in `zone` and classify the result.
///
/// Logs the failure outcomes and grows `pacing` on rate limiting. Never
/// sleeps and never ends the run: a `Launched` outcome is handed back to
/// the caller untouched.
pub async fn attempt_zone(
    provider: &dyn ComputeProvider,
    request: &ProvisionRequest,
    zone: &AvailabilityZone,
    pacing: &mut PacingState,
) -> AttemptOutcome {
    info!(zone = %zone.name, "attempting to launch instance");

    let outcome = classify(provider.launch_instance(request.for_zone(zone)).await);
    let kind = outcome.kind();

    match &outcome {
        AttemptOutcome::Launched(_) => {}
        AttemptOutcome::CapacityExhausted { detail } => {
            debug!(zone = %zone.name, outcome = kind, %detail, "out of host capacity");
        }
        AttemptOutcome::RateLimited { detail } => {
            let before = pacing.zone_interval_secs();
            if pacing.on_rate_limited() {
                info!(
                    zone = %zone.name,
                    outcome = kind,
                    from_secs = before,
                    to_secs = pacing.zone_interval_secs(),
                    "too many requests, increasing zone interval"
                );
            } else {
                info!(
                    zone = %zone.name,
                    outcome = kind,
                    interval_secs = before,
                    max_secs = pacing.max_zone_interval_secs(),
                    "too many requests, zone interval already at cap"
                );
            }
            debug!(%detail, "too many requests error");
        }
        AttemptOutcome::OtherProviderError {
            status,
            code,
            message,
            request_id,
        } => {
            error!(
                zone = %zone.name,
                outcome = kind,
                status,
                %code,
                %message,
                %request_id,
                "provider rejected launch request"
            );
        }
        AttemptOutcome::TransportError { detail } => {
            error!(
                zone = %zone.name,
                outcome = kind,
                %detail,
                "internal/network error during launch"
            );
        }
    }

    outcome
}
