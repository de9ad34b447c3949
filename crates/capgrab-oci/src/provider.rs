//! Provider seam consumed by the poller.

use std::future::Future;
use std::pin::Pin;

use capgrab_core::{AvailabilityZone, LaunchRequest, LaunchedInstance};

use crate::error::ProviderResult;

/// Boxed future alias for provider calls.
pub type ProviderFuture<'a, T> = Pin<Box<dyn Future<Output = ProviderResult<T>> + Send + 'a>>;

/// A cloud that can list availability zones and launch instances.
///
/// Implementations are shared read-only across calls.
pub trait ComputeProvider: Send + Sync {
    /// List the zones of a compartment, in provider order.
    fn list_availability_zones<'a>(
        &'a self,
        compartment_id: &'a str,
    ) -> ProviderFuture<'a, Vec<AvailabilityZone>>;

    /// Issue one launch call for a zone-bound request.
    fn launch_instance<'a>(&'a self, request: LaunchRequest<'a>) -> ProviderFuture<'a, LaunchedInstance>;
}
