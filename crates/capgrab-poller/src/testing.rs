//! Scripted provider for unit tests.

use std::collections::VecDeque;
use std::io;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use capgrab_core::{AvailabilityZone, LaunchRequest, LaunchedInstance, ProvisionRequest};
use capgrab_oci::{ComputeProvider, ProviderError, ProviderFuture, ProviderResult};

/// Replays queued launch results and records which zones were tried.
///
/// Once the launch queue is empty every call reports out of capacity.
pub(crate) struct ScriptedProvider {
    zones: Vec<AvailabilityZone>,
    enumeration_failures: Mutex<VecDeque<ProviderError>>,
    launches: Mutex<VecDeque<ProviderResult<LaunchedInstance>>>,
    launch_calls: Mutex<Vec<String>>,
    enumerations: AtomicUsize,
    hang_launches: AtomicBool,
}

impl ScriptedProvider {
    pub(crate) fn new(zone_names: &[&str]) -> Self {
        Self {
            zones: zone_names
                .iter()
                .map(|name| AvailabilityZone::new(format!("ocid1.ad.{name}"), *name))
                .collect(),
            enumeration_failures: Mutex::new(VecDeque::new()),
            launches: Mutex::new(VecDeque::new()),
            launch_calls: Mutex::new(Vec::new()),
            enumerations: AtomicUsize::new(0),
            hang_launches: AtomicBool::new(false),
        }
    }

    pub(crate) fn push_launch(&self, result: ProviderResult<LaunchedInstance>) {
        self.launches.lock().unwrap().push_back(result);
    }

    pub(crate) fn fail_next_enumeration(&self, err: ProviderError) {
        self.enumeration_failures.lock().unwrap().push_back(err);
    }

    /// Make every following launch call record its zone and never return.
    pub(crate) fn hang_launches(&self) {
        self.hang_launches.store(true, Ordering::SeqCst);
    }

    /// Zone names passed to `launch_instance`, in call order.
    pub(crate) fn launch_calls(&self) -> Vec<String> {
        self.launch_calls.lock().unwrap().clone()
    }

    pub(crate) fn enumerations(&self) -> usize {
        self.enumerations.load(Ordering::SeqCst)
    }

    pub(crate) fn zones(&self) -> Vec<AvailabilityZone> {
        self.zones.clone()
    }
}

impl ComputeProvider for ScriptedProvider {
    fn list_availability_zones<'a>(
        &'a self,
        _compartment_id: &'a str,
    ) -> ProviderFuture<'a, Vec<AvailabilityZone>> {
        Box::pin(async move {
            self.enumerations.fetch_add(1, Ordering::SeqCst);
            if let Some(err) = self.enumeration_failures.lock().unwrap().pop_front() {
                return Err(err);
            }
            Ok(self.zones.clone())
        })
    }

    fn launch_instance<'a>(&'a self, request: LaunchRequest<'a>) -> ProviderFuture<'a, LaunchedInstance> {
        Box::pin(async move {
            self.launch_calls
                .lock()
                .unwrap()
                .push(request.zone.name.clone());
            if self.hang_launches.load(Ordering::SeqCst) {
                std::future::pending::<()>().await;
            }
            self.launches
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(capacity_error()))
        })
    }
}

pub(crate) fn capacity_error() -> ProviderError {
    ProviderError::Service {
        status: 500,
        code: "InternalError".to_string(),
        message: "Out of host capacity.".to_string(),
        request_id: "req-capacity".to_string(),
    }
}

pub(crate) fn rate_limited_error() -> ProviderError {
    ProviderError::Service {
        status: 429,
        code: "TooManyRequests".to_string(),
        message: "Too many requests for the user".to_string(),
        request_id: "req-throttle".to_string(),
    }
}

pub(crate) fn launched(id: &str) -> LaunchedInstance {
    LaunchedInstance {
        id: id.to_string(),
        display_name: Some("capgrab".to_string()),
        lifecycle_state: Some("PROVISIONING".to_string()),
    }
}

pub(crate) fn provision_request() -> ProvisionRequest {
    ProvisionRequest {
        compartment_id: "ocid1.tenancy.oc1..aaa".to_string(),
        shape: "VM.Standard.A1.Flex".to_string(),
        ocpus: 4.0,
        memory_gbs: Some(24.0),
        boot_volume_gb: 50,
        image_id: "ocid1.image.oc1..img".to_string(),
        subnet_id: "ocid1.subnet.oc1..net".to_string(),
        display_name: "capgrab".to_string(),
        ssh_public_key: "ssh-ed25519 AAAA".to_string(),
        assign_public_ip: true,
        in_transit_encryption: true,
    }
}

/// In-memory log sink for asserting on emitted events.
#[derive(Clone, Default)]
pub(crate) struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    /// Every captured line, parsed as a JSON event.
    pub(crate) fn events(&self) -> Vec<serde_json::Value> {
        let bytes = self.0.lock().unwrap().clone();
        String::from_utf8(bytes)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    /// JSON subscriber writing into this sink, DEBUG and above.
    pub(crate) fn subscriber(&self) -> impl tracing::Subscriber + Send + Sync + use<> {
        tracing_subscriber::fmt()
            .json()
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(self.clone())
            .finish()
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedLogs;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}
