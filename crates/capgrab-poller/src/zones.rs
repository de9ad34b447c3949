//! Zone enumeration.

use tracing::debug;

use capgrab_core::AvailabilityZone;
use capgrab_oci::ComputeProvider;

use crate::error::{PollerError, PollerResult};

/// List the availability zones of a compartment, in provider order.
///
/// No retries here; the caller owns retry policy.
pub async fn enumerate_zones(
    provider: &dyn ComputeProvider,
    compartment_id: &str,
) -> PollerResult<Vec<AvailabilityZone>> {
    let zones = provider
        .list_availability_zones(compartment_id)
        .await
        .map_err(PollerError::Enumeration)?;

    debug!(
        compartment = compartment_id,
        count = zones.len(),
        "enumerated availability zones"
    );
    Ok(zones)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedProvider;
    use capgrab_oci::ProviderError;

    #[tokio::test]
    async fn returns_zones_in_provider_order() {
        let provider = ScriptedProvider::new(&["AD-3", "AD-1", "AD-2"]);
        let zones = enumerate_zones(&provider, "ocid1.tenancy.oc1..aaa").await.unwrap();
        let names: Vec<&str> = zones.iter().map(|z| z.name.as_str()).collect();
        assert_eq!(names, ["AD-3", "AD-1", "AD-2"]);
    }

    #[tokio::test]
    async fn provider_failure_is_enumeration_error() {
        let provider = ScriptedProvider::new(&["AD-1"]);
        provider.fail_next_enumeration(ProviderError::Service {
            status: 401,
            code: "NotAuthenticated".to_string(),
            message: "The required information to complete authentication was not provided".to_string(),
            request_id: "req-9".to_string(),
        });

        let err = enumerate_zones(&provider, "ocid1.tenancy.oc1..aaa")
            .await
            .unwrap_err();
        let PollerError::Enumeration(source) = err;
        assert!(matches!(source, ProviderError::Service { status: 401, .. }));
    }
}
