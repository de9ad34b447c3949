//! JSON bodies exchanged with the OCI REST API.

use serde::{Deserialize, Serialize};

use capgrab_core::{AvailabilityZone, LaunchRequest, LaunchedInstance};

/// `LaunchInstanceDetails` request body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LaunchInstanceDetails<'a> {
    availability_domain: &'a str,
    compartment_id: &'a str,
    shape: &'a str,
    shape_config: ShapeConfig,
    display_name: &'a str,
    create_vnic_details: CreateVnicDetails<'a>,
    metadata: Metadata<'a>,
    source_details: SourceDetails<'a>,
    is_pv_encryption_in_transit_enabled: bool,
}

#[derive(Debug, Serialize)]
struct ShapeConfig {
    ocpus: f32,
    #[serde(rename = "memoryInGBs", skip_serializing_if = "Option::is_none")]
    memory_in_gbs: Option<f32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateVnicDetails<'a> {
    assign_public_ip: bool,
    subnet_id: &'a str,
}

#[derive(Debug, Serialize)]
struct Metadata<'a> {
    ssh_authorized_keys: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SourceDetails<'a> {
    source_type: &'static str,
    image_id: &'a str,
    #[serde(rename = "bootVolumeSizeInGBs")]
    boot_volume_size_in_gbs: u64,
}

impl<'a> From<LaunchRequest<'a>> for LaunchInstanceDetails<'a> {
    fn from(request: LaunchRequest<'a>) -> Self {
        let spec = request.spec;
        Self {
            availability_domain: &request.zone.name,
            compartment_id: &spec.compartment_id,
            shape: &spec.shape,
            shape_config: ShapeConfig {
                ocpus: spec.ocpus,
                memory_in_gbs: spec.memory_gbs,
            },
            display_name: &spec.display_name,
            create_vnic_details: CreateVnicDetails {
                assign_public_ip: spec.assign_public_ip,
                subnet_id: &spec.subnet_id,
            },
            metadata: Metadata {
                ssh_authorized_keys: &spec.ssh_public_key,
            },
            source_details: SourceDetails {
                source_type: "image",
                image_id: &spec.image_id,
                boot_volume_size_in_gbs: spec.boot_volume_gb,
            },
            is_pv_encryption_in_transit_enabled: spec.in_transit_encryption,
        }
    }
}

/// Element of the `ListAvailabilityDomains` response array.
#[derive(Debug, Deserialize)]
pub(crate) struct AvailabilityDomainBody {
    #[serde(default)]
    id: String,
    name: String,
}

impl From<AvailabilityDomainBody> for AvailabilityZone {
    fn from(body: AvailabilityDomainBody) -> Self {
        AvailabilityZone {
            id: body.id,
            name: body.name,
        }
    }
}

/// Subset of the `Instance` resource returned by `LaunchInstance`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct InstanceBody {
    id: String,
    display_name: Option<String>,
    lifecycle_state: Option<String>,
}

impl From<InstanceBody> for LaunchedInstance {
    fn from(body: InstanceBody) -> Self {
        LaunchedInstance {
            id: body.id,
            display_name: body.display_name,
            lifecycle_state: body.lifecycle_state,
        }
    }
}

/// Error body returned with every non-2xx response.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub code: String,
    pub message: String,
}
