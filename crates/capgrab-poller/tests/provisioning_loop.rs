//! End-to-end poller behaviour against an in-memory provider.
//!
//! Drives `Poller::run` through enumeration, throttling and success, and
//! checks call order and time spent sleeping.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use capgrab_core::{AvailabilityZone, LaunchRequest, LaunchedInstance, ProvisionRequest};
use capgrab_oci::{ComputeProvider, ProviderError, ProviderFuture, ProviderResult};
use capgrab_poller::*;
use tokio::sync::watch;
use tokio::time::Instant;

struct FakeCloud {
    zones: Vec<AvailabilityZone>,
    script: Mutex<VecDeque<ProviderResult<LaunchedInstance>>>,
    calls: Mutex<Vec<String>>,
}

impl FakeCloud {
    fn new(zones: &[&str], script: Vec<ProviderResult<LaunchedInstance>>) -> Arc<Self> {
        Arc::new(Self {
            zones: zones
                .iter()
                .map(|z| AvailabilityZone::new(format!("ocid1.ad.{z}"), *z))
                .collect(),
            script: Mutex::new(script.into()),
            calls: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl ComputeProvider for FakeCloud {
    fn list_availability_zones<'a>(
        &'a self,
        _compartment_id: &'a str,
    ) -> ProviderFuture<'a, Vec<AvailabilityZone>> {
        Box::pin(async move { Ok(self.zones.clone()) })
    }

    fn launch_instance<'a>(&'a self, request: LaunchRequest<'a>) -> ProviderFuture<'a, LaunchedInstance> {
        Box::pin(async move {
            self.calls.lock().unwrap().push(request.zone.name.clone());
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(service(500, "InternalError", "Out of host capacity.")))
        })
    }
}

fn service(status: u16, code: &str, message: &str) -> ProviderError {
    ProviderError::Service {
        status,
        code: code.to_string(),
        message: message.to_string(),
        request_id: "req".to_string(),
    }
}

fn instance(id: &str) -> LaunchedInstance {
    LaunchedInstance {
        id: id.to_string(),
        display_name: None,
        lifecycle_state: Some("PROVISIONING".to_string()),
    }
}

fn request() -> ProvisionRequest {
    ProvisionRequest {
        compartment_id: "ocid1.tenancy.oc1..aaa".to_string(),
        shape: "VM.Standard.E2.1.Micro".to_string(),
        ocpus: 1.0,
        memory_gbs: None,
        boot_volume_gb: 47,
        image_id: "ocid1.image.oc1..img".to_string(),
        subnet_id: "ocid1.subnet.oc1..net".to_string(),
        display_name: "free-tier".to_string(),
        ssh_public_key: "ssh-ed25519 AAAA".to_string(),
        assign_public_ip: true,
        in_transit_encryption: true,
    }
}

#[tokio::test(start_paused = true)]
async fn three_zones_two_failures_then_success() {
    let cloud = FakeCloud::new(
        &["A", "B", "C"],
        vec![
            Err(service(500, "InternalError", "Out of host capacity.")),
            Err(service(500, "InternalError", "Out of host capacity.")),
            Ok(instance("ocid1.instance.oc1..c")),
        ],
    );
    let (_tx, rx) = watch::channel(false);
    let mut poller = Poller::new(cloud.clone(), request(), PacingState::new(4, 60, 20), rx);
    let start = Instant::now();

    let outcome = poller.run().await;

    assert_eq!(cloud.calls(), ["A", "B", "C"]);
    assert_eq!(start.elapsed(), Duration::from_secs(8));
    assert!(matches!(outcome, PollOutcome::Launched(ref l) if l.instance.id == "ocid1.instance.oc1..c"));
}

#[tokio::test(start_paused = true)]
async fn throttling_across_cycles_saturates_pacing() {
    let throttled: Vec<_> = (0..30)
        .map(|_| Err(service(429, "TooManyRequests", "Too many requests for the user")))
        .collect();
    let cloud = FakeCloud::new(&["A", "B", "C"], throttled);
    let (_tx, rx) = watch::channel(false);
    let mut poller =
        Poller::new(cloud.clone(), request(), PacingState::new(15, 10, 20), rx).with_max_cycles(Some(10));

    let outcome = poller.run().await;

    assert_eq!(outcome, PollOutcome::GaveUp { cycles: 10 });
    assert_eq!(cloud.calls().len(), 30);
    assert_eq!(poller.pacing().zone_interval_secs(), 21);
}

#[tokio::test(start_paused = true)]
async fn provider_and_transport_errors_do_not_stop_the_loop() {
    let cloud = FakeCloud::new(
        &["A", "B", "C"],
        vec![
            Err(ProviderError::Transport("connection reset by peer".to_string())),
            Err(service(400, "LimitExceeded", "service limit reached")),
            Ok(instance("ocid1.instance.oc1..c")),
        ],
    );
    let (_tx, rx) = watch::channel(false);
    let mut poller = Poller::new(cloud.clone(), request(), PacingState::new(1, 60, 20), rx);

    let outcome = poller.run().await;

    assert!(matches!(outcome, PollOutcome::Launched(_)));
    assert_eq!(cloud.calls(), ["A", "B", "C"]);
    assert_eq!(poller.pacing().zone_interval_secs(), 1);
}

#[test]
fn classification_is_exclusive() {
    let cases = [
        (service(500, "InternalError", "Out of host capacity."), "capacity_exhausted"),
        (service(429, "TooManyRequests", "slow down"), "rate_limited"),
        (service(409, "Conflict", "conflict"), "provider_error"),
        (ProviderError::Transport("timed out".to_string()), "transport_error"),
    ];
    for (err, kind) in cases {
        assert_eq!(classify(Err(err)).kind(), kind);
    }
    assert_eq!(classify(Ok(instance("x"))).kind(), "launched");
}
