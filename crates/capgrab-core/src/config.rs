//! capgrab.toml configuration parser.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, ConfigResult};
use crate::types::ProvisionRequest;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapgrabConfig {
    pub oci: OciConfig,
    pub instance: InstanceConfig,
    #[serde(default)]
    pub pacing: PacingConfig,
}

/// Credentials and endpoints for the OCI API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OciConfig {
    pub tenancy: String,
    pub user: String,
    pub fingerprint: String,
    /// PEM private key (PKCS#8 or PKCS#1) registered for `user`.
    pub key_file: PathBuf,
    pub region: String,
    /// Compartment to launch into. Defaults to the tenancy root.
    pub compartment: Option<String>,
    pub identity_endpoint: Option<String>,
    pub compute_endpoint: Option<String>,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceConfig {
    pub shape: String,
    pub ocpus: f32,
    pub memory_gbs: Option<f32>,
    pub boot_volume_gb: u64,
    pub image_id: String,
    pub subnet_id: String,
    pub display_name: String,
    pub ssh_public_key: Option<String>,
    pub ssh_public_key_file: Option<PathBuf>,
    #[serde(default = "default_true")]
    pub assign_public_ip: bool,
    #[serde(default = "default_true")]
    pub in_transit_encryption: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PacingConfig {
    /// Initial pause between zones. Grows on rate limiting.
    #[serde(default = "default_zone_interval_secs")]
    pub zone_interval_secs: u64,
    /// Pause between full passes over all zones.
    #[serde(default = "default_cycle_interval_secs")]
    pub cycle_interval_secs: u64,
    /// The zone interval stops growing once it is above this value.
    #[serde(default = "default_max_zone_interval_secs")]
    pub max_zone_interval_secs: u64,
    /// Give up after this many passes. Unbounded when unset.
    pub max_cycles: Option<u32>,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            zone_interval_secs: default_zone_interval_secs(),
            cycle_interval_secs: default_cycle_interval_secs(),
            max_zone_interval_secs: default_max_zone_interval_secs(),
            max_cycles: None,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_zone_interval_secs() -> u64 {
    1
}

fn default_cycle_interval_secs() -> u64 {
    60
}

/// Default ceiling for rate-limit growth of the zone interval.
pub const DEFAULT_MAX_ZONE_INTERVAL_SECS: u64 = 20;

fn default_max_zone_interval_secs() -> u64 {
    DEFAULT_MAX_ZONE_INTERVAL_SECS
}

impl CapgrabConfig {
    /// Read, parse and validate a config file.
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&content)?;
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        let config: CapgrabConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        let required = [
            ("oci.tenancy", &self.oci.tenancy),
            ("oci.user", &self.oci.user),
            ("oci.fingerprint", &self.oci.fingerprint),
            ("oci.region", &self.oci.region),
            ("instance.shape", &self.instance.shape),
            ("instance.image_id", &self.instance.image_id),
            ("instance.subnet_id", &self.instance.subnet_id),
            ("instance.display_name", &self.instance.display_name),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(ConfigError::Missing(field));
            }
        }

        if self.oci.key_file.as_os_str().is_empty() {
            return Err(ConfigError::Missing("oci.key_file"));
        }

        if self.instance.ocpus <= 0.0 {
            return Err(ConfigError::Invalid {
                field: "instance.ocpus",
                reason: format!("must be positive, got {}", self.instance.ocpus),
            });
        }

        if let Some(memory) = self.instance.memory_gbs
            && memory <= 0.0
        {
            return Err(ConfigError::Invalid {
                field: "instance.memory_gbs",
                reason: format!("must be positive, got {memory}"),
            });
        }

        if self.instance.boot_volume_gb == 0 {
            return Err(ConfigError::Invalid {
                field: "instance.boot_volume_gb",
                reason: "must be positive".to_string(),
            });
        }

        if self.instance.ssh_public_key.is_none() && self.instance.ssh_public_key_file.is_none() {
            return Err(ConfigError::Missing(
                "instance.ssh_public_key or instance.ssh_public_key_file",
            ));
        }

        if self.pacing.max_cycles == Some(0) {
            return Err(ConfigError::Invalid {
                field: "pacing.max_cycles",
                reason: "must be at least 1, omit it to retry forever".to_string(),
            });
        }

        if self.oci.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "oci.request_timeout_secs",
                reason: "must be positive".to_string(),
            });
        }

        Ok(())
    }

    /// Compartment that owns the instance, falling back to the tenancy.
    pub fn compartment_id(&self) -> &str {
        self.oci.compartment.as_deref().unwrap_or(&self.oci.tenancy)
    }

    /// Build the immutable request, reading the SSH key file if one is set.
    ///
    /// An inline `ssh_public_key` wins over `ssh_public_key_file`.
    pub fn provision_request(&self) -> ConfigResult<ProvisionRequest> {
        let ssh_public_key = match (
            &self.instance.ssh_public_key,
            &self.instance.ssh_public_key_file,
        ) {
            (Some(key), _) => key.trim().to_string(),
            (None, Some(path)) => std::fs::read_to_string(path)
                .map_err(|source| ConfigError::Read {
                    path: path.clone(),
                    source,
                })?
                .trim()
                .to_string(),
            (None, None) => {
                return Err(ConfigError::Missing(
                    "instance.ssh_public_key or instance.ssh_public_key_file",
                ));
            }
        };

        if ssh_public_key.is_empty() {
            return Err(ConfigError::Invalid {
                field: "instance.ssh_public_key",
                reason: "key is empty".to_string(),
            });
        }

        Ok(ProvisionRequest {
            compartment_id: self.compartment_id().to_string(),
            shape: self.instance.shape.clone(),
            ocpus: self.instance.ocpus,
            memory_gbs: self.instance.memory_gbs,
            boot_volume_gb: self.instance.boot_volume_gb,
            image_id: self.instance.image_id.clone(),
            subnet_id: self.instance.subnet_id.clone(),
            display_name: self.instance.display_name.clone(),
            ssh_public_key,
            assign_public_ip: self.instance.assign_public_ip,
            in_transit_encryption: self.instance.in_transit_encryption,
        })
    }

    /// Identity service base URL.
    pub fn identity_endpoint(&self) -> String {
        self.oci
            .identity_endpoint
            .clone()
            .unwrap_or_else(|| format!("https://identity.{}.oraclecloud.com", self.oci.region))
    }

    /// Compute (iaas) service base URL.
    pub fn compute_endpoint(&self) -> String {
        self.oci
            .compute_endpoint
            .clone()
            .unwrap_or_else(|| format!("https://iaas.{}.oraclecloud.com", self.oci.region))
    }
}
