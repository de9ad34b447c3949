//! Shared types used across capgrab crates.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The instance we are trying to create.
///
/// Built once from configuration and never mutated. Only the target zone
/// changes between launch attempts, see [`ProvisionRequest::for_zone`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProvisionRequest {
    /// Compartment (or tenancy root) that will own the instance.
    pub compartment_id: String,
    /// Compute shape, e.g. `VM.Standard.A1.Flex`.
    pub shape: String,
    pub ocpus: f32,
    /// Memory for flexible shapes. `None` lets the provider pick its default.
    pub memory_gbs: Option<f32>,
    pub boot_volume_gb: u64,
    pub image_id: String,
    pub subnet_id: String,
    pub display_name: String,
    /// Public key material placed in `ssh_authorized_keys`.
    pub ssh_public_key: String,
    pub assign_public_ip: bool,
    pub in_transit_encryption: bool,
}

impl ProvisionRequest {
    /// Bind this request to a single availability zone.
    pub fn for_zone<'a>(&'a self, zone: &'a AvailabilityZone) -> LaunchRequest<'a> {
        LaunchRequest {
            spec: self,
            zone,
        }
    }
}

/// An availability zone (OCI "availability domain") as reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityZone {
    pub id: String,
    /// Name used when targeting the zone, e.g. `Uocm:EU-FRANKFURT-1-AD-1`.
    pub name: String,
}

impl AvailabilityZone {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for AvailabilityZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// A provision request targeted at one zone.
#[derive(Debug, Clone, Copy)]
pub struct LaunchRequest<'a> {
    pub spec: &'a ProvisionRequest,
    pub zone: &'a AvailabilityZone,
}

/// Instance returned by a successful launch call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchedInstance {
    pub id: String,
    pub display_name: Option<String>,
    pub lifecycle_state: Option<String>,
}
